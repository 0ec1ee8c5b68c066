//! The executable graph produced by the compiler.

pub mod connection;
pub mod node;

pub use connection::*;
pub use node::*;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Workflow {
    pub name: String,
    pub nodes: Vec<Node>,
    pub connections: Connections,
}

impl Workflow {
    pub fn node(&self, id: &str) -> Option<&Node> {
        self.nodes.iter().find(|node| node.id == id)
    }

    /// The node that starts the workflow, if the graph has one.
    pub fn trigger(&self) -> Option<&Node> {
        self.nodes.iter().find(|node| node.node_type == NodeKind::Webhook.type_name())
    }
}

/// The artifact handed to deployment: a named, laid-out workflow.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompileResult {
    pub workflow: Workflow,
    pub name: String,
}

impl CompileResult {
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}
