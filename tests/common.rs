//! Common test utilities: plan documents, collaborators and helpers.
use keiro::prelude::*;
use serde_json::{Value, json};
use std::sync::Arc;

pub const ORG: &str = "org_test";

/// Scenario A: a signed webhook followed by a Slack message.
#[allow(dead_code)]
pub fn simple_plan_json() -> Value {
    json!({
        "version": "1",
        "name": "Simple",
        "steps": [
            {"type": "trigger.http", "path": "/webhook/test", "secretHmac": true},
            {"type": "action.slack.postMessage", "channel": "#general", "text": "Hello {{name}}"}
        ]
    })
}

/// Scenario B: a trigger and a branch with two cases and an else arm, one action each.
#[allow(dead_code)]
pub fn branch_plan_json() -> Value {
    json!({
        "version": "1",
        "name": "Lead routing",
        "steps": [
            {"type": "trigger.http", "path": "/leads"},
            {
                "type": "branch",
                "cases": [
                    {
                        "when": {"field": "tier", "op": "equals", "value": "gold"},
                        "steps": [{"type": "action.slack.postMessage", "channel": "#vip", "text": "Gold lead {{email}}"}]
                    },
                    {
                        "when": {"field": "score", "op": "gt", "value": 50},
                        "steps": [{"type": "action.http.request", "method": "POST", "url": "https://api.example.com/leads", "body": {"email": "{{email}}"}}]
                    }
                ],
                "else": [{"type": "action.slack.postMessage", "channel": "#leads", "text": "New lead"}]
            }
        ]
    })
}

/// Trigger, filter, custom action: exercises filter routing and registry lookups.
#[allow(dead_code)]
pub fn filtered_plan_json() -> Value {
    json!({
        "version": "1",
        "name": "Filtered sync",
        "steps": [
            {"type": "trigger.http", "path": "/orders"},
            {"type": "filter", "when": {"field": "status", "op": "equals", "value": "paid"}},
            {"type": "action.custom", "actionSlug": "crm-sync", "input": {"order": "{{id}}"}}
        ]
    })
}

#[allow(dead_code)]
pub fn plan(document: Value) -> Plan {
    parse_plan(&document).expect("fixture should be structurally valid")
}

#[allow(dead_code)]
pub fn crm_sync_action() -> ActionDefinition {
    ActionDefinition {
        slug: "crm-sync".to_string(),
        name: Some("Sync to CRM".to_string()),
        method: HttpMethod::Post,
        url: "https://crm.example.com/api/sync".to_string(),
        headers: [(
            "Authorization".to_string(),
            "Bearer {{secrets.CRM_TOKEN}}".to_string(),
        )]
        .into_iter()
        .collect(),
        body: None,
    }
}

#[allow(dead_code)]
pub fn registry() -> Arc<StaticActionRegistry> {
    Arc::new(StaticActionRegistry::new().with_org_action(ORG, crm_sync_action()))
}

#[allow(dead_code)]
pub fn allowlist() -> Arc<StaticHostAllowlist> {
    Arc::new(StaticHostAllowlist::new(["api.example.com", "*.example.com"]))
}

#[allow(dead_code)]
pub fn ctx() -> RequestContext {
    RequestContext::new(ORG)
}

#[allow(dead_code)]
pub fn compiler() -> Compiler {
    Compiler::builder(registry()).build()
}

#[allow(dead_code)]
pub fn validator() -> SemanticValidator {
    SemanticValidator::new(registry(), allowlist())
}

#[allow(dead_code)]
pub fn compile(document: Value) -> Result<CompileResult, CompilerError> {
    tokio_test::block_on(compiler().compile(&plan(document), &ctx()))
}

#[allow(dead_code)]
pub fn validate(document: Value) -> ValidationReport {
    tokio_test::block_on(validator().validate(&plan(document), &ctx()))
}

/// Targets of `source` on `port`, as node ids.
#[allow(dead_code)]
pub fn targets(workflow: &Workflow, source: &str, port: &str) -> Vec<String> {
    workflow
        .connections
        .from_port(source, port)
        .iter()
        .map(|connection| connection.target.clone())
        .collect()
}
