//! Semantic validation of structurally valid plans.
//!
//! Every rule runs over the whole step tree and all issues are collected. Issues
//! follow document order: plan-level rules first, then each step in pre-order.

mod issue;
mod rules;

pub use issue::{IssueCode, ValidationIssue, ValidationReport};

use crate::compiler::DEFAULT_MAX_DEPTH;
use crate::context::RequestContext;
use crate::plan::{Plan, Step, walk};
use crate::registry::{ActionRegistry, HostAllowlist};
use std::sync::Arc;
use tracing::instrument;

/// Checks business rules that the plan schema cannot express.
#[derive(Clone)]
pub struct SemanticValidator {
    actions: Arc<dyn ActionRegistry>,
    hosts: Arc<dyn HostAllowlist>,
    max_depth: usize,
}

impl SemanticValidator {
    pub fn new(actions: Arc<dyn ActionRegistry>, hosts: Arc<dyn HostAllowlist>) -> Self {
        Self {
            actions,
            hosts,
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }

    /// Maximum branch nesting accepted before `NESTING_TOO_DEEP` is reported.
    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    /// Validates `plan` for the organization in `ctx`. Never fails; an invalid plan
    /// yields a report with `valid == false`.
    #[instrument(skip_all, fields(plan = %plan.name, org = %ctx.org_id))]
    pub async fn validate(&self, plan: &Plan, ctx: &RequestContext) -> ValidationReport {
        let mut issues = Vec::new();
        rules::check_top_level(&plan.steps, &mut issues);

        for visit in walk(&plan.steps, self.max_depth) {
            rules::check_step(&visit, self.max_depth, self.hosts.as_ref(), &mut issues);

            if let Step::CustomAction(action) = visit.step {
                if self
                    .actions
                    .resolve(&action.action_slug, &ctx.org_id)
                    .await
                    .is_none()
                {
                    issues.push(ValidationIssue::new(
                        format!("{}.actionSlug", visit.path),
                        IssueCode::UnknownActionSlug,
                        format!(
                            "Custom action '{}' is not registered for this organization",
                            action.action_slug
                        ),
                    ));
                }
            }
        }

        let report = ValidationReport::from_issues(issues);
        tracing::debug!(
            valid = report.valid,
            issues = report.issues.len(),
            "semantic validation finished"
        );
        report
    }
}
