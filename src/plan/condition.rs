use serde::{Deserialize, Serialize};
use std::fmt;

/// A single comparison evaluated against the incoming item, e.g. `status equals "open"`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Condition {
    pub field: String,
    pub op: ConditionOp,
    /// `null` when the document omits it.
    #[serde(default)]
    pub value: serde_json::Value,
}

/// Comparison operator of a [`Condition`].
///
/// Plans that come through the structural validator only ever carry the five known
/// operators. Plans built in code can still hold anything, which is why unknown
/// names are kept in [`ConditionOp::Other`] instead of failing deserialization.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum ConditionOp {
    Contains,
    Equals,
    Gt,
    Lt,
    Regex,
    Other(String),
}

impl ConditionOp {
    pub const KNOWN: [&'static str; 5] = ["contains", "equals", "gt", "lt", "regex"];

    pub fn as_str(&self) -> &str {
        match self {
            ConditionOp::Contains => "contains",
            ConditionOp::Equals => "equals",
            ConditionOp::Gt => "gt",
            ConditionOp::Lt => "lt",
            ConditionOp::Regex => "regex",
            ConditionOp::Other(name) => name,
        }
    }
}

impl From<String> for ConditionOp {
    fn from(name: String) -> Self {
        match name.as_str() {
            "contains" => ConditionOp::Contains,
            "equals" => ConditionOp::Equals,
            "gt" => ConditionOp::Gt,
            "lt" => ConditionOp::Lt,
            "regex" => ConditionOp::Regex,
            _ => ConditionOp::Other(name),
        }
    }
}

impl From<&str> for ConditionOp {
    fn from(name: &str) -> Self {
        ConditionOp::from(name.to_string())
    }
}

impl From<ConditionOp> for String {
    fn from(op: ConditionOp) -> Self {
        op.as_str().to_string()
    }
}

impl fmt::Display for ConditionOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Condition {
    pub fn new(field: &str, op: impl Into<ConditionOp>, value: serde_json::Value) -> Self {
        Self {
            field: field.to_string(),
            op: op.into(),
            value,
        }
    }
}
