//! End-to-end tests through the pipeline.
mod common;
use common::*;
use keiro::prelude::*;
use async_trait::async_trait;
use serde_json::json;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

fn pipeline() -> Pipeline {
    Pipeline::new(registry(), allowlist(), KeiroConfig::default())
}

fn run(document: serde_json::Value) -> Result<CompileResult, PipelineError> {
    tokio_test::block_on(pipeline().run(&document, &ctx()))
}

#[test]
fn test_pipeline_compiles_valid_plans() {
    let result = run(branch_plan_json()).expect("pipeline should succeed");
    assert_eq!(result.name, "Lead routing");
    assert_eq!(result.workflow.nodes.len(), 5);
    assert_eq!(result.workflow.trigger().map(|n| n.id.as_str()), Some("node_000"));
}

#[test]
fn test_empty_plan_stops_at_structural_stage() {
    // An empty plan must never reach semantic validation.
    let error = run(json!({"version": "1", "name": "Empty", "steps": []})).unwrap_err();
    let PipelineError::Structural(errors) = error else {
        panic!("expected a structural failure, got {:?}", error);
    };
    assert_eq!(errors[0].path, "steps");
}

#[test]
fn test_semantic_issues_stop_before_compilation() {
    let mut document = simple_plan_json();
    document["steps"]
        .as_array_mut()
        .unwrap()
        .push(json!({"type": "action.http.request", "method": "GET", "url": "https://evil.io/x?k=1"}));
    let error = run(document).unwrap_err();
    let PipelineError::Semantic(issues) = error else {
        panic!("expected a semantic failure, got {:?}", error);
    };
    assert_eq!(issues.len(), 1);
    assert_eq!(issues[0].code, IssueCode::ForbiddenHost);
}

/// Forgets every action after the first lookup, as a registry updated between
/// validation and compilation would.
struct ForgetfulRegistry {
    lookups: AtomicUsize,
}

#[async_trait]
impl ActionRegistry for ForgetfulRegistry {
    async fn resolve(&self, action_slug: &str, _org_id: &str) -> Option<ActionDefinition> {
        if self.lookups.fetch_add(1, Ordering::SeqCst) > 0 {
            return None;
        }
        (action_slug == "crm-sync").then(crm_sync_action)
    }
}

#[test]
fn test_compile_errors_surface_through_pipeline() {
    let registry = Arc::new(ForgetfulRegistry {
        lookups: AtomicUsize::new(0),
    });
    let pipeline = Pipeline::new(registry, allowlist(), KeiroConfig::default());
    let error = tokio_test::block_on(pipeline.run(&filtered_plan_json(), &ctx())).unwrap_err();
    let PipelineError::Compile(compile_error) = error else {
        panic!("expected a compile failure, got {:?}", error);
    };
    assert_eq!(compile_error.code(), CompilerErrorCode::UnknownCustomAction);
}

#[test]
fn test_depth_limit_applies_to_validation() {
    let config = KeiroConfig {
        compiler: CompilerOptions {
            max_depth: 0,
            ..CompilerOptions::default()
        },
        ..KeiroConfig::default()
    };
    let pipeline = Pipeline::new(registry(), allowlist(), config);
    let error = tokio_test::block_on(pipeline.run(&branch_plan_json(), &ctx())).unwrap_err();
    let PipelineError::Semantic(issues) = error else {
        panic!("expected a semantic failure, got {:?}", error);
    };
    assert_eq!(issues[0].code, IssueCode::NestingTooDeep);
    assert_eq!(issues[0].path, "steps[1]");
}

#[test]
fn test_configuration_flows_into_compiler() {
    let config = KeiroConfig::from_json_str(
        r#"{"compiler": {"filterRouting": "passThrough"}, "layout": {"startX": 0, "startY": 0}}"#,
        "inline",
    )
    .unwrap();
    let pipeline = Pipeline::new(registry(), allowlist(), config);
    let result = tokio_test::block_on(pipeline.run(&filtered_plan_json(), &ctx())).unwrap();

    assert_eq!(result.workflow.nodes[0].position, Position::new(0, 0));
    assert_eq!(
        result.workflow.connections.from_port("node_001", "false").len(),
        1
    );
}

#[test]
fn test_registry_loaded_from_json() {
    let registry = StaticActionRegistry::from_json_str(
        r#"{
            "global": [{"slug": "ping", "method": "GET", "url": "https://status.example.com/ping"}],
            "orgs": {"org_test": [{"slug": "crm-sync", "name": "CRM", "method": "POST", "url": "https://crm.example.com/sync"}]}
        }"#,
        "inline",
    )
    .unwrap();
    assert_eq!(registry.len(), 2);

    let pipeline = Pipeline::new(Arc::new(registry), allowlist(), KeiroConfig::default());
    let result = tokio_test::block_on(pipeline.run(&filtered_plan_json(), &ctx())).unwrap();
    assert_eq!(result.workflow.nodes[2].name, "CRM");
}

#[test]
fn test_pipeline_output_is_stable_json() {
    let first = run(filtered_plan_json()).unwrap().to_json().unwrap();
    let second = run(filtered_plan_json()).unwrap().to_json().unwrap();
    assert_eq!(first, second);
    assert!(first.contains("\"webhookId\": \"filtered-sync--orders\""));
}
