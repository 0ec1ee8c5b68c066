use crate::error::ConfigError;
use crate::plan::HttpMethod;
use ahash::AHashMap;
use async_trait::async_trait;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::fs;

/// An organization-specific action, expressed as the HTTP call it stands for.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActionDefinition {
    pub slug: String,
    #[serde(default)]
    pub name: Option<String>,
    pub method: HttpMethod,
    pub url: String,
    #[serde(default)]
    pub headers: IndexMap<String, String>,
    /// Payload sent when the plan step provides no `input` of its own.
    #[serde(default)]
    pub body: Option<serde_json::Value>,
}

/// Resolves custom action slugs for an organization.
#[async_trait]
pub trait ActionRegistry: Send + Sync {
    /// Returns `None` when the slug is unknown to the organization.
    async fn resolve(&self, action_slug: &str, org_id: &str) -> Option<ActionDefinition>;
}

/// An [`ActionRegistry`] backed by in-memory maps.
///
/// Organization-scoped actions shadow global ones with the same slug.
#[derive(Debug, Clone, Default)]
pub struct StaticActionRegistry {
    global: AHashMap<String, ActionDefinition>,
    per_org: AHashMap<String, AHashMap<String, ActionDefinition>>,
}

/// On-disk shape accepted by [`StaticActionRegistry::from_file`].
#[derive(Debug, Default, Deserialize)]
struct RegistryFile {
    #[serde(default)]
    global: Vec<ActionDefinition>,
    #[serde(default)]
    orgs: AHashMap<String, Vec<ActionDefinition>>,
}

impl StaticActionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_action(mut self, action: ActionDefinition) -> Self {
        self.global.insert(action.slug.clone(), action);
        self
    }

    pub fn with_org_action(mut self, org_id: &str, action: ActionDefinition) -> Self {
        self.per_org
            .entry(org_id.to_string())
            .or_default()
            .insert(action.slug.clone(), action);
        self
    }

    pub fn len(&self) -> usize {
        self.global.len() + self.per_org.values().map(|actions| actions.len()).sum::<usize>()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Parses `{"global": [...], "orgs": {"<org>": [...]}}`.
    pub fn from_json_str(json: &str, origin: &str) -> Result<Self, ConfigError> {
        let file: RegistryFile =
            serde_json::from_str(json).map_err(|source| ConfigError::Parse {
                path: origin.to_string(),
                source,
            })?;

        let registry = file
            .global
            .into_iter()
            .fold(Self::new(), |registry, action| registry.with_action(action));
        Ok(file.orgs.into_iter().fold(registry, |registry, (org, actions)| {
            actions
                .into_iter()
                .fold(registry, |registry, action| registry.with_org_action(&org, action))
        }))
    }

    pub fn from_file(path: &str) -> Result<Self, ConfigError> {
        let json = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_string(),
            source,
        })?;
        Self::from_json_str(&json, path)
    }

    fn lookup(&self, action_slug: &str, org_id: &str) -> Option<&ActionDefinition> {
        self.per_org
            .get(org_id)
            .and_then(|actions| actions.get(action_slug))
            .or_else(|| self.global.get(action_slug))
    }
}

#[async_trait]
impl ActionRegistry for StaticActionRegistry {
    async fn resolve(&self, action_slug: &str, org_id: &str) -> Option<ActionDefinition> {
        self.lookup(action_slug, org_id).cloned()
    }
}
