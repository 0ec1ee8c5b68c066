//! Minimal URL inspection: enough to find a host and to redact a URL for messages.

use regex::Regex;
use std::sync::LazyLock;

// `\` ends the authority, as `/` does for http(s).
static URL_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\s*(?P<scheme>[A-Za-z][A-Za-z0-9+.\-]*)://(?:[^@/\\?#]*@)?(?P<host>\[[^\]/\\?#]*\]|[^:/\\?#\s]*)")
        .expect("URL regex should be valid")
});

/// Placeholder used when a URL cannot be parsed well enough to redact it.
pub const UNPARSEABLE_URL: &str = "<invalid url>";

/// The scheme and lowercased hostname of `url`, or `None` if either is missing.
pub fn scheme_and_host(url: &str) -> Option<(String, String)> {
    let captures = URL_PATTERN.captures(url)?;
    let host = captures.name("host")?.as_str();
    if host.is_empty() {
        return None;
    }
    Some((
        captures["scheme"].to_ascii_lowercase(),
        host.to_ascii_lowercase(),
    ))
}

pub fn host(url: &str) -> Option<String> {
    scheme_and_host(url).map(|(_, host)| host)
}

/// Reduces `url` to `scheme://hostname`, dropping credentials, port, path, query and fragment.
pub fn redact_url(url: &str) -> String {
    match scheme_and_host(url) {
        Some((scheme, host)) => format!("{}://{}", scheme, host),
        None => UNPARSEABLE_URL.to_string(),
    }
}
