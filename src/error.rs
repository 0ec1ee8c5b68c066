use crate::plan::Step;
use crate::validator::ValidationIssue;
use itertools::Itertools;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Machine-readable code of a [`CompilerError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CompilerErrorCode {
    UnsupportedStepType,
    UnsupportedFilterOperation,
    UnknownCustomAction,
    NoNodesGenerated,
    NestingTooDeep,
}

impl fmt::Display for CompilerErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let code = match self {
            CompilerErrorCode::UnsupportedStepType => "UNSUPPORTED_STEP_TYPE",
            CompilerErrorCode::UnsupportedFilterOperation => "UNSUPPORTED_FILTER_OPERATION",
            CompilerErrorCode::UnknownCustomAction => "UNKNOWN_CUSTOM_ACTION",
            CompilerErrorCode::NoNodesGenerated => "NO_NODES_GENERATED",
            CompilerErrorCode::NestingTooDeep => "NESTING_TOO_DEEP",
        };
        f.write_str(code)
    }
}

/// Errors that abort a compilation. There is no partial graph when one of these is returned.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum CompilerError {
    #[error("Step '{path}' of type '{step_type}' cannot be compiled in this position")]
    UnsupportedStepType {
        step_type: String,
        path: String,
        step: Box<Step>,
    },

    #[error("Filter operation '{op}' at '{path}' is not supported")]
    UnsupportedFilterOperation {
        op: String,
        path: String,
        step: Box<Step>,
    },

    #[error("Custom action '{slug}' at '{path}' could not be resolved")]
    UnknownCustomAction {
        slug: String,
        path: String,
        step: Box<Step>,
    },

    #[error("Compilation produced no nodes")]
    NoNodesGenerated,

    #[error("Branch nesting at '{path}' exceeds the maximum depth of {max_depth}")]
    NestingTooDeep { path: String, max_depth: usize },
}

impl CompilerError {
    pub fn code(&self) -> CompilerErrorCode {
        match self {
            CompilerError::UnsupportedStepType { .. } => CompilerErrorCode::UnsupportedStepType,
            CompilerError::UnsupportedFilterOperation { .. } => {
                CompilerErrorCode::UnsupportedFilterOperation
            }
            CompilerError::UnknownCustomAction { .. } => CompilerErrorCode::UnknownCustomAction,
            CompilerError::NoNodesGenerated => CompilerErrorCode::NoNodesGenerated,
            CompilerError::NestingTooDeep { .. } => CompilerErrorCode::NestingTooDeep,
        }
    }

    /// The step that caused the failure, when there is a single one to blame.
    pub fn offending_step(&self) -> Option<&Step> {
        match self {
            CompilerError::UnsupportedStepType { step, .. }
            | CompilerError::UnsupportedFilterOperation { step, .. }
            | CompilerError::UnknownCustomAction { step, .. } => Some(step),
            CompilerError::NoNodesGenerated | CompilerError::NestingTooDeep { .. } => None,
        }
    }

    pub fn report(&self) -> CompilerErrorReport {
        CompilerErrorReport {
            code: self.code(),
            message: self.to_string(),
            offending_step: self.offending_step().cloned(),
        }
    }
}

/// Wire form of a [`CompilerError`].
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CompilerErrorReport {
    pub code: CompilerErrorCode,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub offending_step: Option<Step>,
}

/// The kinds of schema violation the structural validator reports.
/// The `Display` output is the templated message shown to users.
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum Violation {
    #[error("Required field '{field}' is missing")]
    Required { field: String },

    #[error("Expected {expected}, found {found}")]
    InvalidType { expected: String, found: String },

    #[error("Value '{found}' is not one of: {}", .allowed.iter().join(", "))]
    InvalidEnum { allowed: Vec<String>, found: String },

    #[error("Expected the literal '{expected}', found '{found}'")]
    InvalidConst { expected: String, found: String },

    #[error("Array must contain between {min} and {} items, found {found}", .max.map_or("any number of".to_string(), |m| m.to_string()))]
    ArrayLength {
        min: usize,
        max: Option<usize>,
        found: usize,
    },

    #[error("String must be between {min} and {} characters long, found {found}", .max.map_or("any number of".to_string(), |m| m.to_string()))]
    StringLength {
        min: usize,
        max: Option<usize>,
        found: usize,
    },

    #[error("Value matches none of the allowed variants ({})", .variants.iter().join(", "))]
    NoUnionMatch { variants: Vec<String> },

    #[error("Document is not valid JSON: {reason}")]
    MalformedJson { reason: String },
}

/// A structural violation located inside the submitted document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StructuralError {
    pub path: String,
    pub violation: Violation,
}

impl StructuralError {
    pub fn new(path: impl Into<String>, violation: Violation) -> Self {
        Self {
            path: path.into(),
            violation,
        }
    }

    pub fn message(&self) -> String {
        self.violation.to_string()
    }
}

impl fmt::Display for StructuralError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let path = if self.path.is_empty() {
            "<root>"
        } else {
            &self.path
        };
        write!(f, "{}: {}", path, self.violation)
    }
}

impl std::error::Error for StructuralError {}

/// Internal layout failures. These never escape [`crate::layout::layout`], which
/// replaces the leveled layout with a grid when one occurs.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LayoutError {
    #[error("Connection references unknown node '{0}'")]
    UnknownNode(String),

    #[error("Connection graph contains a cycle through node '{0}'")]
    Cycle(String),
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Could not read configuration file '{path}': {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid configuration in '{path}': {source}")]
    Parse {
        path: String,
        #[source]
        source: serde_json::Error,
    },
}

/// The first stage of the [`crate::pipeline::Pipeline`] that rejected a plan.
#[derive(Error, Debug, Clone)]
pub enum PipelineError {
    #[error("Plan failed structural validation with {} error(s)", .0.len())]
    Structural(Vec<StructuralError>),

    #[error("Plan failed semantic validation with {} issue(s)", .0.len())]
    Semantic(Vec<ValidationIssue>),

    #[error(transparent)]
    Compile(#[from] CompilerError),
}
