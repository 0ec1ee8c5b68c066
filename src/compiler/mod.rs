use crate::context::RequestContext;
use crate::error::CompilerError;
use crate::layout::{LayoutConfig, layout};
use crate::plan::{Plan, Step, walk};
use crate::registry::{ActionDefinition, ActionRegistry};
use crate::workflow::{CompileResult, Workflow};
use ahash::AHashMap;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::instrument;

mod builder;
mod naming;
mod synthesis;
pub mod template;

use builder::GraphBuilder;
use synthesis::Synthesizer;

pub use naming::{DEFAULT_NAME_MAX_LEN, sanitize as sanitize_name};
pub use synthesis::{NO_FALLBACK, engine_operation, webhook_id};

/// Deepest branch nesting accepted by default.
pub const DEFAULT_MAX_DEPTH: usize = 16;

/// Where the `false` output of a filter leads.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum FilterRouting {
    /// Only the `true` output continues; items failing the filter stop there.
    #[default]
    Halt,
    /// Both outputs continue to the next node, so the filter never stops anything.
    PassThrough,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct CompilerOptions {
    pub max_depth: usize,
    pub name_max_len: usize,
    pub filter_routing: FilterRouting,
}

impl Default for CompilerOptions {
    fn default() -> Self {
        Self {
            max_depth: DEFAULT_MAX_DEPTH,
            name_max_len: DEFAULT_NAME_MAX_LEN,
            filter_routing: FilterRouting::default(),
        }
    }
}

/// Compiles plans into laid-out workflows.
///
/// The compiler holds no per-compilation state, so one instance can serve any number
/// of concurrent requests.
#[derive(Clone)]
pub struct Compiler {
    actions: Arc<dyn ActionRegistry>,
    options: CompilerOptions,
    layout: LayoutConfig,
}

pub struct CompilerBuilder {
    actions: Arc<dyn ActionRegistry>,
    options: CompilerOptions,
    layout: LayoutConfig,
}

impl CompilerBuilder {
    pub fn new(actions: Arc<dyn ActionRegistry>) -> Self {
        Self {
            actions,
            options: CompilerOptions::default(),
            layout: LayoutConfig::default(),
        }
    }
    pub fn with_options(mut self, options: CompilerOptions) -> Self {
        self.options = options;
        self
    }
    pub fn with_filter_routing(mut self, routing: FilterRouting) -> Self {
        self.options.filter_routing = routing;
        self
    }
    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.options.max_depth = max_depth;
        self
    }
    pub fn with_layout(mut self, layout: LayoutConfig) -> Self {
        self.layout = layout;
        self
    }
    pub fn build(self) -> Compiler {
        Compiler {
            actions: self.actions,
            options: self.options,
            layout: self.layout,
        }
    }
}

impl Compiler {
    pub fn builder(actions: Arc<dyn ActionRegistry>) -> CompilerBuilder {
        CompilerBuilder::new(actions)
    }

    pub fn options(&self) -> &CompilerOptions {
        &self.options
    }

    /// Compiles `plan` for the organization in `ctx`.
    ///
    /// Custom actions are resolved up front; flattening, node synthesis and layout are
    /// then purely synchronous. The first unrecoverable problem aborts compilation.
    #[instrument(skip_all, fields(plan = %plan.name, org = %ctx.org_id))]
    pub async fn compile(
        &self,
        plan: &Plan,
        ctx: &RequestContext,
    ) -> Result<CompileResult, CompilerError> {
        let actions = self.resolve_actions(plan, ctx).await;
        let synthesizer = Synthesizer {
            plan_name: &plan.name,
            name_max_len: self.options.name_max_len,
            actions: &actions,
        };
        let (nodes, connections) = GraphBuilder::new(synthesizer, &self.options).build(&plan.steps)?;
        let nodes = layout(&nodes, &connections, &self.layout);

        tracing::debug!(
            nodes = nodes.len(),
            connections = connections.len(),
            "compiled plan"
        );
        Ok(CompileResult {
            workflow: Workflow {
                name: plan.name.clone(),
                nodes,
                connections,
            },
            name: plan.name.clone(),
        })
    }

    /// Looks up every distinct custom action slug in the plan, in document order.
    /// Unresolved slugs are simply absent; the graph builder reports them with their location.
    async fn resolve_actions(
        &self,
        plan: &Plan,
        ctx: &RequestContext,
    ) -> AHashMap<String, ActionDefinition> {
        let mut resolved = AHashMap::new();
        let mut seen = ahash::AHashSet::new();
        for visit in walk(&plan.steps, self.options.max_depth) {
            let Step::CustomAction(custom) = visit.step else {
                continue;
            };
            if !seen.insert(custom.action_slug.as_str()) {
                continue;
            }
            if let Some(action) = self.actions.resolve(&custom.action_slug, &ctx.org_id).await {
                resolved.insert(custom.action_slug.clone(), action);
            }
        }
        resolved
    }
}
