use serde::{Deserialize, Serialize};
use std::fmt;

/// Canvas coordinates, serialized as `[x, y]`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "[i32; 2]", into = "[i32; 2]")]
pub struct Position {
    pub x: i32,
    pub y: i32,
}

impl Position {
    pub fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }
}

impl From<[i32; 2]> for Position {
    fn from([x, y]: [i32; 2]) -> Self {
        Self { x, y }
    }
}

impl From<Position> for [i32; 2] {
    fn from(position: Position) -> Self {
        [position.x, position.y]
    }
}

/// The node types the compiler can emit, with the engine's type names and versions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeKind {
    Webhook,
    If,
    Switch,
    Slack,
    HttpRequest,
}

impl NodeKind {
    pub fn type_name(self) -> &'static str {
        match self {
            NodeKind::Webhook => "n8n-nodes-base.webhook",
            NodeKind::If => "n8n-nodes-base.if",
            NodeKind::Switch => "n8n-nodes-base.switch",
            NodeKind::Slack => "n8n-nodes-base.slack",
            NodeKind::HttpRequest => "n8n-nodes-base.httpRequest",
        }
    }

    pub fn type_version(self) -> u32 {
        match self {
            NodeKind::Webhook => 2,
            NodeKind::If => 2,
            NodeKind::Switch => 3,
            NodeKind::Slack => 2,
            NodeKind::HttpRequest => 4,
        }
    }
}

/// One unit of the compiled graph. Only `id` is canonical; `name` is for display.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Node {
    pub id: String,
    pub name: String,
    #[serde(rename = "type")]
    pub node_type: String,
    pub type_version: u32,
    pub position: Position,
    pub parameters: serde_json::Map<String, serde_json::Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub webhook_id: Option<String>,
}

impl Node {
    pub fn new(id: String, name: String, kind: NodeKind) -> Self {
        Self {
            id,
            name,
            node_type: kind.type_name().to_string(),
            type_version: kind.type_version(),
            position: Position::default(),
            parameters: serde_json::Map::new(),
            webhook_id: None,
        }
    }

    pub fn with_parameters(mut self, parameters: serde_json::Value) -> Self {
        if let serde_json::Value::Object(map) = parameters {
            self.parameters = map;
        }
        self
    }

    pub fn parameter(&self, key: &str) -> Option<&serde_json::Value> {
        self.parameters.get(key)
    }
}

/// Formats a node index as a canonical id, e.g. `node_007`.
pub fn node_id(index: usize) -> String {
    format!("node_{:03}", index)
}

impl fmt::Display for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} '{}' ({})", self.id, self.name, self.node_type)
    }
}
