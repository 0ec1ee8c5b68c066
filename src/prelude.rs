//! Prelude module for convenient imports
//!
//! Re-exports the types needed to validate and compile a plan end to end.
//!
//! ```rust,no_run
//! use keiro::prelude::*;
//! use std::sync::Arc;
//!
//! # async fn run(document: serde_json::Value) -> Result<(), Box<dyn std::error::Error>> {
//! let actions = Arc::new(StaticActionRegistry::new());
//! let hosts = Arc::new(StaticHostAllowlist::new(["api.example.com"]));
//! let pipeline = Pipeline::new(actions, hosts, KeiroConfig::default());
//!
//! let result = pipeline.run(&document, &RequestContext::new("org_1")).await?;
//! println!("{}", result.to_json()?);
//! # Ok(())
//! # }
//! ```

// Stages
pub use crate::compiler::{Compiler, CompilerOptions, FilterRouting};
pub use crate::layout::{LayoutConfig, LayoutIssue, check_layout, layout};
pub use crate::pipeline::Pipeline;
pub use crate::schema::{parse_plan, parse_plan_str};
pub use crate::validator::{IssueCode, SemanticValidator, ValidationIssue, ValidationReport};

// Data model
pub use crate::context::RequestContext;
pub use crate::plan::{
    Branch, BranchCase, Condition, ConditionOp, CustomAction, Filter, HttpMethod, HttpRequest,
    Plan, SlackPostMessage, Step, TriggerHttp,
};
pub use crate::workflow::{CompileResult, Connection, Connections, Node, Position, Workflow};

// Collaborators
pub use crate::registry::{
    ActionDefinition, ActionRegistry, HostAllowlist, StaticActionRegistry, StaticHostAllowlist,
};

// Configuration and errors
pub use crate::config::KeiroConfig;
pub use crate::error::{
    CompilerError, CompilerErrorCode, CompilerErrorReport, ConfigError, PipelineError, StructuralError, Violation,
};
