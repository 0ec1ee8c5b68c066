use super::issue::{IssueCode, ValidationIssue};
use crate::plan::walk::StepVisit;
use crate::plan::{Branch, ConditionOp, Filter, HttpRequest, SlackPostMessage, Step, TriggerHttp};
use crate::registry::HostAllowlist;
use crate::url::redact_url;
use regex::Regex;

/// Plan-level rules that only look at the top-level sequence.
pub(super) fn check_top_level(steps: &[Step], issues: &mut Vec<ValidationIssue>) {
    let Some(first) = steps.first() else {
        issues.push(ValidationIssue::new(
            "steps",
            IssueCode::NoSteps,
            "Plan must contain at least one step",
        ));
        return;
    };

    if !first.is_trigger() {
        issues.push(ValidationIssue::new(
            "steps[0].type",
            IssueCode::MustStartWithTrigger,
            format!(
                "Plan must start with a trigger step, but starts with '{}'",
                first.type_name()
            ),
        ));
    }

    let triggers: Vec<usize> = steps
        .iter()
        .enumerate()
        .filter(|(_, step)| step.is_trigger())
        .map(|(index, _)| index)
        .collect();
    if triggers.len() > 1 {
        for index in &triggers[1..] {
            issues.push(ValidationIssue::new(
                format!("steps[{}].type", index),
                IssueCode::MultipleTriggers,
                format!(
                    "Plan has {} trigger steps; only one is allowed",
                    triggers.len()
                ),
            ));
        }
    }
}

/// Rules that can be decided from a single step without consulting the action registry.
pub(super) fn check_step(
    visit: &StepVisit<'_>,
    max_depth: usize,
    hosts: &dyn HostAllowlist,
    issues: &mut Vec<ValidationIssue>,
) {
    let path = visit.path.as_str();
    match visit.step {
        Step::TriggerHttp(trigger) => {
            if visit.depth > 0 {
                issues.push(ValidationIssue::new(
                    format!("{}.type", path),
                    IssueCode::NestedTrigger,
                    "Trigger steps are only allowed at the top level of a plan",
                ));
            }
            check_webhook_path(path, trigger, issues);
        }
        Step::Filter(filter) => check_filter(path, filter, issues),
        Step::Branch(branch) => check_branch(visit, branch, max_depth, issues),
        Step::SlackPostMessage(message) => check_slack_channel(path, message, issues),
        Step::HttpRequest(request) => check_host(path, request, hosts, issues),
        // Resolved asynchronously by the validator itself.
        Step::CustomAction(_) => {}
    }
}

fn check_webhook_path(path: &str, trigger: &TriggerHttp, issues: &mut Vec<ValidationIssue>) {
    if !trigger.path.starts_with('/') {
        issues.push(ValidationIssue::new(
            format!("{}.path", path),
            IssueCode::InvalidWebhookPath,
            format!("Webhook path '{}' must start with '/'", trigger.path),
        ));
    }
    if trigger.path.contains(' ') || trigger.path.contains('?') {
        issues.push(ValidationIssue::new(
            format!("{}.path", path),
            IssueCode::InvalidWebhookPathFormat,
            format!(
                "Webhook path '{}' must not contain spaces or '?'",
                trigger.path
            ),
        ));
    }
}

fn check_filter(path: &str, filter: &Filter, issues: &mut Vec<ValidationIssue>) {
    if filter.when.op != ConditionOp::Regex {
        return;
    }
    let problem = match filter.when.value.as_str() {
        Some(pattern) => Regex::new(pattern).err().map(|e| e.to_string()),
        None => Some("the pattern must be a string".to_string()),
    };
    if let Some(problem) = problem {
        issues.push(ValidationIssue::new(
            format!("{}.when.value", path),
            IssueCode::InvalidFilterPattern,
            format!(
                "Filter on '{}' has an invalid regex pattern: {}",
                filter.when.field, problem
            ),
        ));
    }
}

fn check_branch(
    visit: &StepVisit<'_>,
    branch: &Branch,
    max_depth: usize,
    issues: &mut Vec<ValidationIssue>,
) {
    let path = visit.path.as_str();
    if visit.truncated {
        issues.push(ValidationIssue::new(
            path,
            IssueCode::NestingTooDeep,
            format!(
                "Branch nesting exceeds the maximum depth of {}",
                max_depth
            ),
        ));
    }
    for (index, case) in branch.cases.iter().enumerate() {
        if case.steps.is_empty() {
            issues.push(ValidationIssue::new(
                format!("{}.cases[{}]", path, index),
                IssueCode::EmptyBranchCase,
                format!("Branch case {} has no steps", index),
            ));
        }
    }
    if branch.otherwise.as_ref().is_some_and(|steps| steps.is_empty()) {
        issues.push(ValidationIssue::new(
            format!("{}.else", path),
            IssueCode::EmptyBranchElse,
            "Branch 'else' is present but has no steps",
        ));
    }
}

fn check_slack_channel(path: &str, message: &SlackPostMessage, issues: &mut Vec<ValidationIssue>) {
    if !(message.channel.starts_with('#') || message.channel.starts_with('@')) {
        issues.push(ValidationIssue::new(
            format!("{}.channel", path),
            IssueCode::InvalidSlackChannel,
            format!(
                "Slack channel '{}' must start with '#' or '@'",
                message.channel
            ),
        ));
    }
}

fn check_host(
    path: &str,
    request: &HttpRequest,
    hosts: &dyn HostAllowlist,
    issues: &mut Vec<ValidationIssue>,
) {
    if !hosts.is_allowed(&request.url) {
        issues.push(ValidationIssue::new(
            format!("{}.url", path),
            IssueCode::ForbiddenHost,
            format!(
                "Host of '{}' is not in the allowlist",
                redact_url(&request.url)
            ),
        ));
    }
}
