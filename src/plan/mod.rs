pub mod condition;
pub mod definition;
pub mod walk;

pub use condition::*;
pub use definition::*;
pub use walk::{StepVisit, walk};
