use crate::url;
use ahash::AHashSet;

/// Decides whether outbound HTTP requests may target a URL's host.
pub trait HostAllowlist: Send + Sync {
    fn is_allowed(&self, url: &str) -> bool;
}

/// A fixed set of allowed hosts.
///
/// Entries are either exact hostnames (`api.example.com`) or wildcard suffixes
/// (`*.example.com`, which matches subdomains but not `example.com` itself).
/// URLs without a recognizable host are never allowed.
#[derive(Debug, Clone, Default)]
pub struct StaticHostAllowlist {
    exact: AHashSet<String>,
    suffixes: Vec<String>,
}

impl StaticHostAllowlist {
    pub fn new<I, S>(hosts: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        hosts
            .into_iter()
            .fold(Self::default(), |list, host| list.with_host(host.as_ref()))
    }

    pub fn with_host(mut self, host: &str) -> Self {
        let host = host.trim().to_ascii_lowercase();
        match host.strip_prefix("*.") {
            Some(domain) => self.suffixes.push(format!(".{}", domain)),
            None => {
                self.exact.insert(host);
            }
        }
        self
    }

    pub fn allows_host(&self, host: &str) -> bool {
        let host = host.to_ascii_lowercase();
        self.exact.contains(&host) || self.suffixes.iter().any(|suffix| host.ends_with(suffix))
    }
}

impl HostAllowlist for StaticHostAllowlist {
    fn is_allowed(&self, url: &str) -> bool {
        url::host(url).is_some_and(|host| self.allows_host(&host))
    }
}
