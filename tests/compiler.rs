//! Tests for graph compilation: node synthesis, wiring and hard errors.
mod common;
use common::*;
use keiro::prelude::*;
use keiro::compiler::NO_FALLBACK;
use keiro::workflow::{FALSE_OUTPUT, MAIN_PORT, TRUE_OUTPUT, case_output};
use serde_json::json;

#[test]
fn test_simple_plan_compiles_to_two_nodes() {
    let result = compile(simple_plan_json()).expect("Failed to compile");
    let workflow = &result.workflow;

    assert_eq!(result.name, "Simple");
    assert_eq!(workflow.nodes.len(), 2);

    let trigger = &workflow.nodes[0];
    assert_eq!(trigger.id, "node_000");
    assert_eq!(trigger.node_type, "n8n-nodes-base.webhook");
    assert_eq!(trigger.parameter("authentication"), Some(&json!("headerAuth")));
    assert_eq!(trigger.parameter("path"), Some(&json!("webhook/test")));
    assert_eq!(trigger.webhook_id.as_deref(), Some("simple--webhook-test"));

    let message = &workflow.nodes[1];
    assert_eq!(message.node_type, "n8n-nodes-base.slack");
    assert_eq!(message.parameter("text"), Some(&json!("=Hello {{ $json.name }}")));

    assert_eq!(targets(workflow, "node_000", MAIN_PORT), vec!["node_001"]);
    assert_eq!(workflow.connections.len(), 1);
}

#[test]
fn test_unsigned_webhook_has_no_auth() {
    let mut document = simple_plan_json();
    document["steps"][0]["secretHmac"] = json!(false);
    let result = compile(document).unwrap();
    assert_eq!(
        result.workflow.nodes[0].parameter("authentication"),
        Some(&json!("none"))
    );
}

#[test]
fn test_branch_plan_compiles_to_switch() {
    let result = compile(branch_plan_json()).expect("Failed to compile");
    let workflow = &result.workflow;
    assert_eq!(workflow.nodes.len(), 5);

    let switch = &workflow.nodes[1];
    assert_eq!(switch.node_type, "n8n-nodes-base.switch");
    let rules = switch.parameter("rules").unwrap()["values"].as_array().unwrap();
    assert_eq!(rules.len(), 2);
    assert_eq!(
        switch.parameter("options").unwrap()["fallbackOutput"],
        json!(2)
    );

    // Pre-order ids: the branch, then case 0, case 1 and the else arm.
    assert_eq!(targets(workflow, "node_000", MAIN_PORT), vec!["node_001"]);
    assert_eq!(targets(workflow, "node_001", &case_output(0)), vec!["node_002"]);
    assert_eq!(targets(workflow, "node_001", &case_output(1)), vec!["node_003"]);
    assert_eq!(targets(workflow, "node_001", &case_output(2)), vec!["node_004"]);
    assert_eq!(workflow.nodes[3].node_type, "n8n-nodes-base.httpRequest");
}

#[test]
fn test_node_count_matches_step_count() {
    for document in [simple_plan_json(), branch_plan_json(), filtered_plan_json()] {
        let parsed = plan(document.clone());
        let result = compile(document).unwrap();
        assert_eq!(result.workflow.nodes.len(), parsed.total_steps());
    }
}

#[test]
fn test_branch_without_else_has_no_fallback() {
    let mut document = branch_plan_json();
    document["steps"][1]
        .as_object_mut()
        .unwrap()
        .remove("else");
    let result = compile(document).unwrap();
    assert_eq!(result.workflow.nodes.len(), 4);
    assert_eq!(
        result.workflow.nodes[1].parameter("options").unwrap()["fallbackOutput"],
        json!(NO_FALLBACK)
    );
    assert!(targets(&result.workflow, "node_001", &case_output(2)).is_empty());
}

#[test]
fn test_branch_arms_join_the_following_step() {
    let mut document = branch_plan_json();
    document["steps"]
        .as_array_mut()
        .unwrap()
        .push(json!({"type": "action.slack.postMessage", "channel": "#done", "text": "routed"}));
    let result = compile(document).unwrap();
    let workflow = &result.workflow;
    assert_eq!(workflow.nodes.len(), 6);

    for tail in ["node_002", "node_003", "node_004"] {
        assert_eq!(targets(workflow, tail, MAIN_PORT), vec!["node_005"]);
    }
}

#[test]
fn test_empty_else_passes_straight_through() {
    let mut document = branch_plan_json();
    document["steps"][1]["else"] = json!([]);
    document["steps"]
        .as_array_mut()
        .unwrap()
        .push(json!({"type": "action.slack.postMessage", "channel": "#done", "text": "routed"}));
    let result = compile(document).unwrap();
    assert_eq!(
        targets(&result.workflow, "node_001", &case_output(2)),
        vec!["node_004"]
    );
}

#[test]
fn test_filter_halts_on_false_by_default() {
    let result = compile(filtered_plan_json()).unwrap();
    let workflow = &result.workflow;
    assert_eq!(workflow.nodes[1].node_type, "n8n-nodes-base.if");
    assert_eq!(targets(workflow, "node_001", TRUE_OUTPUT), vec!["node_002"]);
    assert!(targets(workflow, "node_001", FALSE_OUTPUT).is_empty());
}

#[test]
fn test_filter_pass_through_routing() {
    let compiler = Compiler::builder(registry())
        .with_filter_routing(FilterRouting::PassThrough)
        .build();
    let result = tokio_test::block_on(compiler.compile(&plan(filtered_plan_json()), &ctx())).unwrap();
    let workflow = &result.workflow;
    assert_eq!(targets(workflow, "node_001", TRUE_OUTPUT), vec!["node_002"]);
    assert_eq!(targets(workflow, "node_001", FALSE_OUTPUT), vec!["node_002"]);
}

#[test]
fn test_filter_condition_parameters() {
    let result = compile(filtered_plan_json()).unwrap();
    let conditions = &result.workflow.nodes[1].parameter("conditions").unwrap()["conditions"];
    assert_eq!(conditions[0]["leftValue"], json!("={{ $json.status }}"));
    assert_eq!(conditions[0]["rightValue"], json!("paid"));
    assert_eq!(conditions[0]["operator"]["operation"], json!("equal"));
}

#[test]
fn test_custom_action_becomes_http_request() {
    let result = compile(filtered_plan_json()).unwrap();
    let node = &result.workflow.nodes[2];

    assert_eq!(node.name, "Sync to CRM");
    assert_eq!(node.node_type, "n8n-nodes-base.httpRequest");
    assert_eq!(node.parameter("method"), Some(&json!("POST")));
    assert_eq!(
        node.parameter("url"),
        Some(&json!("https://crm.example.com/api/sync"))
    );
    assert_eq!(
        node.parameter("headerParameters").unwrap()["parameters"][0]["value"],
        json!("=Bearer {{ $vars.CRM_TOKEN }}")
    );
    assert_eq!(
        node.parameter("jsonBody"),
        Some(&json!(r#"={"order":"{{ $json.id }}"}"#))
    );
}

#[test]
fn test_unknown_custom_action_reports_offending_step() {
    let parsed = plan(filtered_plan_json());
    let error = tokio_test::block_on(compiler().compile(&parsed, &RequestContext::new("stranger")))
        .expect_err("slug is not registered for this org");

    assert_eq!(error.code(), CompilerErrorCode::UnknownCustomAction);
    assert_eq!(error.offending_step(), Some(&parsed.steps[2]));
    assert!(matches!(
        &error,
        CompilerError::UnknownCustomAction { slug, path, .. }
            if slug == "crm-sync" && path == "steps[2].actionSlug"
    ));

    let report = serde_json::to_value(error.report()).unwrap();
    assert_eq!(report["code"], json!("UNKNOWN_CUSTOM_ACTION"));
    assert_eq!(report["offendingStep"]["actionSlug"], json!("crm-sync"));
    assert!(report["message"].as_str().unwrap().contains("crm-sync"));
}

#[test]
fn test_unsupported_filter_operation() {
    let parsed = Plan::new(
        "Starts with",
        vec![
            Step::TriggerHttp(TriggerHttp {
                path: "/hook".to_string(),
                secret_hmac: false,
            }),
            Step::Filter(Filter {
                when: Condition::new("email", "startsWith", json!("admin")),
            }),
        ],
    );
    let error = tokio_test::block_on(compiler().compile(&parsed, &ctx())).unwrap_err();
    assert_eq!(error.code(), CompilerErrorCode::UnsupportedFilterOperation);
    assert_eq!(error.offending_step(), Some(&parsed.steps[1]));
}

#[test]
fn test_trigger_inside_branch_is_unsupported() {
    let mut document = branch_plan_json();
    document["steps"][1]["else"] = json!([{"type": "trigger.http", "path": "/inner"}]);
    let error = compile(document).unwrap_err();
    assert_eq!(error.code(), CompilerErrorCode::UnsupportedStepType);
    assert!(matches!(
        error,
        CompilerError::UnsupportedStepType { ref path, .. } if path == "steps[1].else[0]"
    ));
}

#[test]
fn test_empty_plan_generates_no_nodes() {
    let error = tokio_test::block_on(compiler().compile(&Plan::new("Empty", Vec::new()), &ctx()))
        .unwrap_err();
    assert_eq!(error, CompilerError::NoNodesGenerated);
}

#[test]
fn test_nesting_guard() {
    let mut document = branch_plan_json();
    document["steps"][1]["else"] = json!([{
        "type": "branch",
        "cases": [{
            "when": {"field": "region", "op": "equals", "value": "eu"},
            "steps": [{"type": "action.slack.postMessage", "channel": "#eu", "text": "eu"}]
        }]
    }]);
    let parsed = plan(document);

    let shallow = Compiler::builder(registry()).with_max_depth(1).build();
    let error = tokio_test::block_on(shallow.compile(&parsed, &ctx())).unwrap_err();
    assert_eq!(
        error,
        CompilerError::NestingTooDeep {
            path: "steps[1].else[0]".to_string(),
            max_depth: 1,
        }
    );

    let result = tokio_test::block_on(compiler().compile(&parsed, &ctx())).unwrap();
    assert_eq!(result.workflow.nodes.len(), parsed.total_steps());
}

#[test]
fn test_compilation_is_deterministic() {
    let first = compile(branch_plan_json()).unwrap().to_json().unwrap();
    let second = compile(branch_plan_json()).unwrap().to_json().unwrap();
    assert_eq!(first, second);
}

#[test]
fn test_serialized_shape() {
    let result = compile(simple_plan_json()).unwrap();
    let value = serde_json::to_value(&result).unwrap();

    assert_eq!(value["name"], json!("Simple"));
    let node = &value["workflow"]["nodes"][0];
    assert_eq!(node["typeVersion"], json!(2));
    assert_eq!(node["position"], json!([250, 300]));
    assert_eq!(node["webhookId"], json!("simple--webhook-test"));
    assert_eq!(
        value["workflow"]["connections"]["node_000"]["main"][0],
        json!({"source": "node_000", "sourceOutput": "main", "target": "node_001", "targetInput": "main"})
    );
}
