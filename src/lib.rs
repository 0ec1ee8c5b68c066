//! # Keiro - Plan Compiler and Semantic Validator
//!
//! **Keiro** turns declarative automation plans into workflow graphs for a node-based
//! execution engine. A plan is a small JSON document: a trigger followed by filters,
//! branches and actions. Keiro checks it, flattens the step tree into nodes and
//! connections, and positions every node on a canvas.
//!
//! ## Core Workflow
//!
//! 1.  **Structural validation**: [`schema::parse_plan`] checks the untyped document
//!     against the plan grammar and yields a typed [`plan::Plan`], or every violation with its path.
//! 2.  **Semantic validation**: [`validator::SemanticValidator`] applies business rules
//!     (trigger placement, registered custom actions, allowed hosts, ...) and returns a report.
//! 3.  **Compilation**: [`compiler::Compiler`] emits one node per step, wires them
//!     together and lays the result out.
//!
//! [`pipeline::Pipeline`] chains the three stages and stops at the first that rejects the plan.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use keiro::prelude::*;
//! use serde_json::json;
//! use std::sync::Arc;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let document = json!({
//!     "version": "1",
//!     "name": "Simple",
//!     "steps": [
//!         {"type": "trigger.http", "path": "/webhook/test", "secretHmac": true},
//!         {"type": "action.slack.postMessage", "channel": "#general", "text": "Hello {{name}}"}
//!     ]
//! });
//!
//! let actions = Arc::new(StaticActionRegistry::new());
//! let hosts = Arc::new(StaticHostAllowlist::new(["api.example.com"]));
//! let pipeline = Pipeline::new(actions, hosts, KeiroConfig::default());
//!
//! let ctx = RequestContext::new("org_1");
//! let result = tokio_test::block_on(pipeline.run(&document, &ctx))?;
//! println!("{}", result.to_json()?);
//! # Ok(())
//! # }
//! ```

pub mod compiler;
pub mod config;
pub mod context;
pub mod error;
pub mod layout;
pub mod pipeline;
pub mod plan;
pub mod prelude;
pub mod registry;
pub mod schema;
pub mod url;
pub mod validator;
pub mod workflow;
