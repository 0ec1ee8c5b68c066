use crate::compiler::CompilerOptions;
use crate::error::ConfigError;
use crate::layout::LayoutConfig;
use serde::{Deserialize, Serialize};
use std::fs;

/// Tunables for the whole pipeline. Every field has a default, so an empty JSON
/// object is a valid configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct KeiroConfig {
    pub compiler: CompilerOptions,
    pub layout: LayoutConfig,
}

impl KeiroConfig {
    pub fn from_json_str(json: &str, origin: &str) -> Result<Self, ConfigError> {
        serde_json::from_str(json).map_err(|source| ConfigError::Parse {
            path: origin.to_string(),
            source,
        })
    }

    pub fn from_file(path: &str) -> Result<Self, ConfigError> {
        let json = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_string(),
            source,
        })?;
        Self::from_json_str(&json, path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compiler::FilterRouting;

    #[test]
    fn partial_config_keeps_defaults() {
        let config = KeiroConfig::from_json_str(
            r#"{"compiler": {"filterRouting": "passThrough"}, "layout": {"startX": 0}}"#,
            "inline",
        )
        .unwrap();
        assert_eq!(config.compiler.filter_routing, FilterRouting::PassThrough);
        assert_eq!(config.compiler.max_depth, CompilerOptions::default().max_depth);
        assert_eq!(config.layout.start_x, 0);
        assert_eq!(config.layout.start_y, LayoutConfig::default().start_y);
    }

    #[test]
    fn unknown_routing_is_rejected() {
        let err = KeiroConfig::from_json_str(r#"{"compiler": {"filterRouting": "maybe"}}"#, "cfg.json")
            .unwrap_err();
        assert!(matches!(err, ConfigError::Parse { .. }));
    }
}
