use crate::plan::Step;
use crate::registry::ActionDefinition;
use crate::url;

pub const DEFAULT_NAME_MAX_LEN: usize = 48;
const ELLIPSIS: &str = "...";

/// A display name describing `step`. Names are cosmetic and need not be unique.
pub(super) fn display_name(step: &Step, action: Option<&ActionDefinition>, max_len: usize) -> String {
    let raw = match step {
        Step::TriggerHttp(trigger) => format!("Webhook {}", trigger.path),
        Step::Filter(filter) => format!("Filter {} {}", filter.when.field, filter.when.op),
        Step::Branch(branch) => match branch.cases.first() {
            Some(case) => format!("Branch on {}", case.when.field),
            None => "Branch".to_string(),
        },
        Step::SlackPostMessage(message) => format!("Slack {}", message.channel),
        Step::HttpRequest(request) => match url::host(&request.url) {
            Some(host) => format!("HTTP {} {}", request.method, host),
            None => format!("HTTP {}", request.method),
        },
        Step::CustomAction(custom) => match action.and_then(|a| a.name.as_deref()) {
            Some(name) => name.to_string(),
            None => format!("Action {}", custom.action_slug),
        },
    };
    sanitize(&raw, max_len)
}

/// Replaces characters outside a conservative set, collapses whitespace and
/// truncates to `max_len` characters.
pub fn sanitize(raw: &str, max_len: usize) -> String {
    let escaped: String = raw
        .chars()
        .map(|c| {
            if c.is_alphanumeric() || " -_.#@/:()".contains(c) {
                c
            } else {
                '_'
            }
        })
        .collect();
    let collapsed = escaped.split_whitespace().collect::<Vec<_>>().join(" ");

    if collapsed.chars().count() <= max_len {
        return collapsed;
    }
    let keep = max_len.saturating_sub(ELLIPSIS.len());
    let mut truncated: String = collapsed.chars().take(keep).collect();
    truncated.truncate(truncated.trim_end().len());
    truncated.push_str(ELLIPSIS);
    truncated
}
