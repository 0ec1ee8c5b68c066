use crate::compiler::Compiler;
use crate::config::KeiroConfig;
use crate::context::RequestContext;
use crate::error::PipelineError;
use crate::registry::{ActionRegistry, HostAllowlist};
use crate::schema::parse_plan;
use crate::validator::SemanticValidator;
use crate::workflow::CompileResult;
use serde_json::Value;
use std::sync::Arc;

/// Runs a document through every stage: structural validation, semantic validation,
/// compilation and layout. Stops at the first stage that rejects the plan.
#[derive(Clone)]
pub struct Pipeline {
    validator: SemanticValidator,
    compiler: Compiler,
}

impl Pipeline {
    pub fn new(
        actions: Arc<dyn ActionRegistry>,
        hosts: Arc<dyn HostAllowlist>,
        config: KeiroConfig,
    ) -> Self {
        let validator = SemanticValidator::new(actions.clone(), hosts)
            .with_max_depth(config.compiler.max_depth);
        let compiler = Compiler::builder(actions)
            .with_options(config.compiler)
            .with_layout(config.layout)
            .build();
        Self {
            validator,
            compiler,
        }
    }

    pub fn validator(&self) -> &SemanticValidator {
        &self.validator
    }

    pub fn compiler(&self) -> &Compiler {
        &self.compiler
    }

    pub async fn run(
        &self,
        document: &Value,
        ctx: &RequestContext,
    ) -> Result<CompileResult, PipelineError> {
        let plan = parse_plan(document).map_err(PipelineError::Structural)?;

        let report = self.validator.validate(&plan, ctx).await;
        if !report.valid {
            return Err(PipelineError::Semantic(report.issues));
        }

        let result = self.compiler.compile(&plan, ctx).await?;
        tracing::info!(
            plan = %result.name,
            nodes = result.workflow.nodes.len(),
            "plan compiled"
        );
        Ok(result)
    }
}
