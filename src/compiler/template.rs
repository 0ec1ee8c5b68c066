//! Rewrites `{{path}}` placeholders into the engine's expression syntax.
//!
//! `{{customer.email}}` becomes `{{ $json.customer.email }}` and `{{secrets.API_KEY}}`
//! becomes `{{ $vars.API_KEY }}`. A string containing any expression gets the engine's
//! leading `=` marker, without which it would be sent literally.

use regex::{Captures, Regex};
use std::borrow::Cow;
use std::sync::LazyLock;

static PLACEHOLDER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\{\{\s*([^{}]*?)\s*\}\}").expect("placeholder regex should be valid")
});

static DATA_PATH: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*(?:\.[A-Za-z0-9_]+|\[\d+\])*$")
        .expect("data path regex should be valid")
});

static SECRET_NAME: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*$").expect("secret name regex should be valid")
});

pub const EXPRESSION_MARKER: char = '=';
const SECRETS_PREFIX: &str = "secrets.";

/// The engine expression for a single placeholder path, or `None` if the path is not
/// something this rewriter understands.
pub fn expression_for(path: &str) -> Option<String> {
    if path.starts_with('$') {
        return Some(format!("{{{{ {} }}}}", path));
    }
    if let Some(name) = path.strip_prefix(SECRETS_PREFIX) {
        return SECRET_NAME
            .is_match(name)
            .then(|| format!("{{{{ $vars.{} }}}}", name));
    }
    DATA_PATH
        .is_match(path)
        .then(|| format!("{{{{ $json.{} }}}}", path))
}

/// Rewrites every recognized placeholder in `text`. Returns the text unchanged when
/// there is nothing to rewrite.
pub fn rewrite(text: &str) -> Cow<'_, str> {
    let mut rewritten = false;
    let replaced = PLACEHOLDER.replace_all(text, |caps: &Captures| match expression_for(&caps[1]) {
        Some(expression) => {
            rewritten = true;
            expression
        }
        None => caps[0].to_string(),
    });

    if !rewritten {
        return Cow::Borrowed(text);
    }
    if replaced.starts_with(EXPRESSION_MARKER) {
        Cow::Owned(replaced.into_owned())
    } else {
        Cow::Owned(format!("{}{}", EXPRESSION_MARKER, replaced))
    }
}

/// An expression reading a field of the incoming item, as used on the left side of conditions.
pub fn field_expression(field: &str) -> String {
    match expression_for(field) {
        Some(expression) if !field.starts_with(SECRETS_PREFIX) => {
            format!("{}{}", EXPRESSION_MARKER, expression)
        }
        _ => format!("{}{{{{ $json[{}] }}}}", EXPRESSION_MARKER, quote(field)),
    }
}

/// Rewrites placeholders in string values; any other JSON value is returned as is.
pub fn rewrite_value(value: &serde_json::Value) -> serde_json::Value {
    match value {
        serde_json::Value::String(text) => serde_json::Value::String(rewrite(text).into_owned()),
        other => other.clone(),
    }
}

fn quote(field: &str) -> String {
    serde_json::Value::String(field.to_string()).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rewrites_data_and_secret_references() {
        assert_eq!(rewrite("Hello {{name}}"), "=Hello {{ $json.name }}");
        assert_eq!(
            rewrite("Bearer {{ secrets.API_TOKEN }}"),
            "=Bearer {{ $vars.API_TOKEN }}"
        );
        assert_eq!(
            rewrite("{{order.items[0].sku}} / {{user_id}}"),
            "={{ $json.order.items[0].sku }} / {{ $json.user_id }}"
        );
    }

    #[test]
    fn plain_text_is_borrowed() {
        assert!(matches!(rewrite("no placeholders"), Cow::Borrowed(_)));
    }

    #[test]
    fn unrecognized_placeholders_are_left_alone() {
        assert_eq!(rewrite("{{ a + b }}"), "{{ a + b }}");
        assert_eq!(rewrite("{{secrets.bad-name}}"), "{{secrets.bad-name}}");
    }

    #[test]
    fn existing_marker_is_not_doubled() {
        assert_eq!(rewrite("={{name}}"), "={{ $json.name }}");
    }

    #[test]
    fn field_expressions_quote_odd_names() {
        assert_eq!(field_expression("status"), "={{ $json.status }}");
        assert_eq!(field_expression("first name"), r#"={{ $json["first name"] }}"#);
    }
}
