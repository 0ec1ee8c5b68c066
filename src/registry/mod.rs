//! Narrow interfaces to the collaborators the core consults but does not own,
//! plus in-memory implementations for tooling and tests.

pub mod action;
pub mod allowlist;

pub use action::*;
pub use allowlist::*;
