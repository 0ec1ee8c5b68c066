use super::condition::Condition;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Type prefix shared by every step that starts an automation.
pub const TRIGGER_PREFIX: &str = "trigger.";

/// The only plan format version this crate understands.
pub const PLAN_VERSION: &str = "1";

/// A declarative automation: a trigger followed by a tree of filter, branch and action steps.
///
/// A `Plan` is normally produced by [`crate::schema::parse_plan`], which guarantees its shape.
/// Plans constructed in code skip that check, so the compiler re-validates what it relies on.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Plan {
    pub version: String,
    pub name: String,
    pub steps: Vec<Step>,
}

/// One unit of a [`Plan`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Step {
    #[serde(rename = "trigger.http")]
    TriggerHttp(TriggerHttp),
    #[serde(rename = "filter")]
    Filter(Filter),
    #[serde(rename = "branch")]
    Branch(Branch),
    #[serde(rename = "action.slack.postMessage")]
    SlackPostMessage(SlackPostMessage),
    #[serde(rename = "action.http.request")]
    HttpRequest(HttpRequest),
    #[serde(rename = "action.custom")]
    CustomAction(CustomAction),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TriggerHttp {
    pub path: String,
    #[serde(default)]
    pub secret_hmac: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Filter {
    pub when: Condition,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Branch {
    pub cases: Vec<BranchCase>,
    #[serde(rename = "else", default, skip_serializing_if = "Option::is_none")]
    pub otherwise: Option<Vec<Step>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BranchCase {
    pub when: Condition,
    pub steps: Vec<Step>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SlackPostMessage {
    pub channel: String,
    pub text: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum HttpMethod {
    Get,
    Post,
    Put,
    Delete,
}

impl HttpMethod {
    pub const ALL: [&'static str; 4] = ["GET", "POST", "PUT", "DELETE"];

    pub fn as_str(self) -> &'static str {
        match self {
            HttpMethod::Get => "GET",
            HttpMethod::Post => "POST",
            HttpMethod::Put => "PUT",
            HttpMethod::Delete => "DELETE",
        }
    }
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HttpRequest {
    pub method: HttpMethod,
    pub url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub headers: Option<IndexMap<String, String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub body: Option<serde_json::Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomAction {
    pub action_slug: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub input: Option<serde_json::Map<String, serde_json::Value>>,
}

impl Step {
    /// The wire-format type tag, e.g. `action.slack.postMessage`.
    pub fn type_name(&self) -> &'static str {
        match self {
            Step::TriggerHttp(_) => "trigger.http",
            Step::Filter(_) => "filter",
            Step::Branch(_) => "branch",
            Step::SlackPostMessage(_) => "action.slack.postMessage",
            Step::HttpRequest(_) => "action.http.request",
            Step::CustomAction(_) => "action.custom",
        }
    }

    pub fn is_trigger(&self) -> bool {
        self.type_name().starts_with(TRIGGER_PREFIX)
    }

    /// Number of steps in this subtree, counting the step itself.
    pub fn subtree_len(&self) -> usize {
        match self {
            Step::Branch(branch) => {
                let cases: usize = branch.cases.iter().map(|c| count_steps(&c.steps)).sum();
                let otherwise = branch.otherwise.as_deref().map_or(0, count_steps);
                1 + cases + otherwise
            }
            _ => 1,
        }
    }
}

/// Total number of steps in a sequence, including everything nested in branches.
pub fn count_steps(steps: &[Step]) -> usize {
    steps.iter().map(Step::subtree_len).sum()
}

impl Plan {
    pub fn new(name: &str, steps: Vec<Step>) -> Self {
        Self {
            version: PLAN_VERSION.to_string(),
            name: name.to_string(),
            steps,
        }
    }

    pub fn total_steps(&self) -> usize {
        count_steps(&self.steps)
    }
}
