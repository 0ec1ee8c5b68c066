//! Structural validation: turns an untyped JSON document into a typed [`Plan`].
//!
//! The plan grammar is declared once as a [`SchemaSet`]. `Step` is a named definition
//! that refers to itself through `Branch.cases[].steps` and `Branch.else`, so nested
//! branches are checked by the same rules as top-level steps.

mod types;

pub use types::{Property, Schema, SchemaSet};

use crate::error::{StructuralError, Violation};
use crate::plan::{ConditionOp, HttpMethod, PLAN_VERSION, Plan};
use serde_json::Value;
use std::sync::LazyLock;

pub const MAX_PLAN_NAME_LEN: usize = 100;
pub const MAX_TOP_LEVEL_STEPS: usize = 50;

static PLAN_SCHEMA: LazyLock<SchemaSet> = LazyLock::new(plan_schema);

/// The schema every submitted plan must satisfy.
pub fn plan_schema() -> SchemaSet {
    let root = Schema::Object(vec![
        Property::required("version", Schema::Const(PLAN_VERSION)),
        Property::required(
            "name",
            Schema::String {
                min_len: 1,
                max_len: Some(MAX_PLAN_NAME_LEN),
            },
        ),
        Property::required(
            "steps",
            Schema::array(Schema::Ref("Step"), 1, Some(MAX_TOP_LEVEL_STEPS)),
        ),
    ]);

    let condition = Schema::Object(vec![
        Property::required("field", Schema::non_empty_string()),
        Property::required("op", Schema::Enum(&ConditionOp::KNOWN)),
        Property::optional("value", Schema::Any),
    ]);

    let branch_case = Schema::Object(vec![
        Property::required("when", Schema::Ref("Condition")),
        Property::required("steps", Schema::array(Schema::Ref("Step"), 1, None)),
    ]);

    let step = Schema::TaggedUnion {
        tag: "type",
        variants: vec![
            (
                "trigger.http",
                variant(
                    "trigger.http",
                    vec![
                        Property::required("path", Schema::non_empty_string()),
                        Property::optional("secretHmac", Schema::Boolean),
                    ],
                ),
            ),
            (
                "filter",
                variant(
                    "filter",
                    vec![Property::required("when", Schema::Ref("Condition"))],
                ),
            ),
            (
                "branch",
                variant(
                    "branch",
                    vec![
                        Property::required(
                            "cases",
                            Schema::array(Schema::Ref("BranchCase"), 1, None),
                        ),
                        // Present-but-empty is left to the semantic validator.
                        Property::optional("else", Schema::array(Schema::Ref("Step"), 0, None)),
                    ],
                ),
            ),
            (
                "action.slack.postMessage",
                variant(
                    "action.slack.postMessage",
                    vec![
                        Property::required("channel", Schema::non_empty_string()),
                        Property::required("text", Schema::non_empty_string()),
                    ],
                ),
            ),
            (
                "action.http.request",
                variant(
                    "action.http.request",
                    vec![
                        Property::required("method", Schema::Enum(&HttpMethod::ALL)),
                        Property::required("url", Schema::non_empty_string()),
                        Property::optional("headers", Schema::record(Schema::string())),
                        Property::optional("body", Schema::Any),
                    ],
                ),
            ),
            (
                "action.custom",
                variant(
                    "action.custom",
                    vec![
                        Property::required("actionSlug", Schema::non_empty_string()),
                        Property::optional("input", Schema::record(Schema::Any)),
                    ],
                ),
            ),
        ],
    };

    SchemaSet::new(root)
        .define("Step", step)
        .define("BranchCase", branch_case)
        .define("Condition", condition)
}

fn variant(type_name: &'static str, mut properties: Vec<Property>) -> Schema {
    properties.insert(0, Property::required("type", Schema::Const(type_name)));
    Schema::Object(properties)
}

/// Checks `document` against the plan schema and converts it into a [`Plan`].
///
/// Every violation is reported; the function never panics on bad input.
pub fn parse_plan(document: &Value) -> Result<Plan, Vec<StructuralError>> {
    let errors = PLAN_SCHEMA.validate(document);
    if !errors.is_empty() {
        tracing::debug!(errors = errors.len(), "plan rejected by structural validation");
        return Err(errors);
    }

    serde_json::from_value(document.clone()).map_err(|e| {
        vec![StructuralError::new(
            "",
            Violation::InvalidType {
                expected: "plan".to_string(),
                found: e.to_string(),
            },
        )]
    })
}

/// Like [`parse_plan`], starting from JSON text.
pub fn parse_plan_str(json: &str) -> Result<Plan, Vec<StructuralError>> {
    let document: Value = serde_json::from_str(json).map_err(|e| {
        vec![StructuralError::new(
            "",
            Violation::MalformedJson {
                reason: e.to_string(),
            },
        )]
    })?;
    parse_plan(&document)
}
