use super::naming::display_name;
use super::template;
use crate::error::CompilerError;
use crate::plan::{
    Branch, Condition, ConditionOp, CustomAction, Filter, HttpMethod, SlackPostMessage, Step,
    TriggerHttp,
};
use crate::registry::ActionDefinition;
use crate::workflow::{Node, NodeKind};
use ahash::AHashMap;
use indexmap::IndexMap;
use serde_json::{Value, json};

/// Disabled fallback output of a switch node.
pub const NO_FALLBACK: &str = "none";

/// The engine's comparison name for a filter operator, if it has one.
pub fn engine_operation(op: &ConditionOp) -> Option<&'static str> {
    match op {
        ConditionOp::Equals => Some("equal"),
        ConditionOp::Contains => Some("contains"),
        ConditionOp::Gt => Some("larger"),
        ConditionOp::Lt => Some("smaller"),
        ConditionOp::Regex => Some("regex"),
        ConditionOp::Other(_) => None,
    }
}

/// Builds the node for a single step. Wiring is the graph builder's job.
pub(super) struct Synthesizer<'a> {
    pub(super) plan_name: &'a str,
    pub(super) name_max_len: usize,
    pub(super) actions: &'a AHashMap<String, ActionDefinition>,
}

impl Synthesizer<'_> {
    pub(super) fn synthesize(&self, step: &Step, id: String, path: &str) -> Result<Node, CompilerError> {
        let action = match step {
            Step::CustomAction(custom) => Some(self.resolve(custom, step, path)?),
            _ => None,
        };
        let name = display_name(step, action, self.name_max_len);

        let node = match step {
            Step::TriggerHttp(trigger) => self.webhook(trigger, id, name),
            Step::Filter(filter) => if_node(filter, id, name, step, path)?,
            Step::Branch(branch) => switch_node(branch, id, name, step, path)?,
            Step::SlackPostMessage(message) => slack_node(message, id, name),
            Step::HttpRequest(request) => http_node(
                request.method,
                &request.url,
                request.headers.as_ref(),
                request.body.as_ref(),
                id,
                name,
            ),
            Step::CustomAction(custom) => {
                let action = action.ok_or_else(|| unknown_action(custom, step, path))?;
                custom_action_node(custom, action, id, name)
            }
        };
        Ok(node)
    }

    fn resolve(
        &self,
        custom: &CustomAction,
        step: &Step,
        path: &str,
    ) -> Result<&ActionDefinition, CompilerError> {
        self.actions
            .get(&custom.action_slug)
            .ok_or_else(|| unknown_action(custom, step, path))
    }

    fn webhook(&self, trigger: &TriggerHttp, id: String, name: String) -> Node {
        let authentication = if trigger.secret_hmac {
            "headerAuth"
        } else {
            "none"
        };
        let mut node = Node::new(id, name, NodeKind::Webhook).with_parameters(json!({
            "path": trigger.path.trim_start_matches('/'),
            "httpMethod": "POST",
            "responseMode": "onReceived",
            "authentication": authentication,
            "options": {},
        }));
        node.webhook_id = Some(webhook_id(self.plan_name, &trigger.path));
        node
    }
}

fn unknown_action(custom: &CustomAction, step: &Step, path: &str) -> CompilerError {
    CompilerError::UnknownCustomAction {
        slug: custom.action_slug.clone(),
        path: format!("{}.actionSlug", path),
        step: Box::new(step.clone()),
    }
}

/// Stands in for a plan name with no ASCII letters or digits.
const UNNAMED_PLAN_SLUG: &str = "plan";

/// A stable webhook id, so that recompiling a plan never changes the deployed hook.
pub fn webhook_id(plan_name: &str, path: &str) -> String {
    let slug = |text: &str| {
        text.chars()
            .map(|c| {
                if c.is_ascii_alphanumeric() {
                    c.to_ascii_lowercase()
                } else {
                    '-'
                }
            })
            .collect::<String>()
            .split('-')
            .filter(|part| !part.is_empty())
            .collect::<Vec<_>>()
            .join("-")
    };
    let plan = match slug(plan_name) {
        name if name.is_empty() => UNNAMED_PLAN_SLUG.to_string(),
        name => name,
    };
    format!("{}--{}", plan, slug(path))
}

fn condition(
    when: &Condition,
    condition_id: &str,
    step: &Step,
    path: &str,
) -> Result<Value, CompilerError> {
    let operation =
        engine_operation(&when.op).ok_or_else(|| CompilerError::UnsupportedFilterOperation {
            op: when.op.to_string(),
            path: format!("{}.op", path),
            step: Box::new(step.clone()),
        })?;
    let value_type = match (&when.op, &when.value) {
        (ConditionOp::Gt | ConditionOp::Lt, _) | (_, Value::Number(_)) => "number",
        (_, Value::Bool(_)) => "boolean",
        _ => "string",
    };
    Ok(json!({
        "id": condition_id,
        "leftValue": template::field_expression(&when.field),
        "rightValue": template::rewrite_value(&when.value),
        "operator": {"type": value_type, "operation": operation},
    }))
}

fn conditions_block(entries: Vec<Value>) -> Value {
    json!({
        "options": {"caseSensitive": true, "leftValue": "", "typeValidation": "loose"},
        "conditions": entries,
        "combinator": "and",
    })
}

fn if_node(
    filter: &Filter,
    id: String,
    name: String,
    step: &Step,
    path: &str,
) -> Result<Node, CompilerError> {
    let entry = condition(&filter.when, &format!("{}-when", id), step, &format!("{}.when", path))?;
    Ok(Node::new(id, name, NodeKind::If).with_parameters(json!({
        "conditions": conditions_block(vec![entry]),
        "options": {},
    })))
}

fn switch_node(
    branch: &Branch,
    id: String,
    name: String,
    step: &Step,
    path: &str,
) -> Result<Node, CompilerError> {
    let rules = branch
        .cases
        .iter()
        .enumerate()
        .map(|(index, case)| -> Result<Value, CompilerError> {
            let entry = condition(
                &case.when,
                &format!("{}-case-{}", id, index),
                step,
                &format!("{}.cases[{}].when", path, index),
            )?;
            Ok(json!({"conditions": conditions_block(vec![entry]), "outputKey": index.to_string()}))
        })
        .collect::<Result<Vec<_>, _>>()?;

    let fallback = match &branch.otherwise {
        Some(_) => json!(branch.cases.len()),
        None => json!(NO_FALLBACK),
    };
    Ok(Node::new(id, name, NodeKind::Switch).with_parameters(json!({
        "mode": "rules",
        "rules": {"values": rules},
        "options": {"fallbackOutput": fallback},
    })))
}

fn slack_node(message: &SlackPostMessage, id: String, name: String) -> Node {
    let target = if message.channel.starts_with('@') {
        json!({"select": "user", "user": {"__rl": true, "mode": "username", "value": message.channel}})
    } else {
        json!({"select": "channel", "channelId": {"__rl": true, "mode": "name", "value": message.channel}})
    };
    let mut parameters = json!({
        "resource": "message",
        "operation": "post",
        "text": template::rewrite(&message.text),
        "otherOptions": {},
    });
    if let (Value::Object(params), Value::Object(target)) = (&mut parameters, target) {
        params.extend(target);
    }
    Node::new(id, name, NodeKind::Slack).with_parameters(parameters)
}

fn http_node(
    method: HttpMethod,
    url: &str,
    headers: Option<&IndexMap<String, String>>,
    body: Option<&Value>,
    id: String,
    name: String,
) -> Node {
    let header_parameters: Vec<Value> = headers
        .into_iter()
        .flatten()
        .map(|(key, value)| json!({"name": key, "value": template::rewrite(value)}))
        .collect();

    let mut parameters = json!({
        "method": method.as_str(),
        "url": template::rewrite(url),
        "sendHeaders": !header_parameters.is_empty(),
        "sendBody": body.is_some(),
        "options": {},
    });
    if let Value::Object(params) = &mut parameters {
        if !header_parameters.is_empty() {
            params.insert(
                "headerParameters".to_string(),
                json!({"parameters": header_parameters}),
            );
        }
        if let Some(body) = body {
            params.insert("specifyBody".to_string(), json!("json"));
            params.insert(
                "jsonBody".to_string(),
                json!(template::rewrite(&body.to_string())),
            );
        }
    }
    Node::new(id, name, NodeKind::HttpRequest).with_parameters(parameters)
}

fn custom_action_node(
    custom: &CustomAction,
    action: &ActionDefinition,
    id: String,
    name: String,
) -> Node {
    let body = custom
        .input
        .as_ref()
        .map(|input| Value::Object(input.clone()))
        .or_else(|| action.body.clone());
    http_node(
        action.method,
        &action.url,
        Some(&action.headers),
        body.as_ref(),
        id,
        name,
    )
}
