use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// The port sequential nodes are wired through, and the input port of every node.
pub const MAIN_PORT: &str = "main";
pub const TRUE_OUTPUT: &str = "true";
pub const FALSE_OUTPUT: &str = "false";

/// Output port `index` of a switch node. The fallback output uses the index after the last case.
pub fn case_output(index: usize) -> String {
    format!("output_{}", index)
}

/// A directed edge between an output port of one node and an input port of another.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Connection {
    pub source: String,
    pub source_output: String,
    pub target: String,
    pub target_input: String,
}

impl Connection {
    pub fn new(source: &str, source_output: &str, target: &str) -> Self {
        Self {
            source: source.to_string(),
            source_output: source_output.to_string(),
            target: target.to_string(),
            target_input: MAIN_PORT.to_string(),
        }
    }
}

/// Connections grouped as `source node id -> output port -> edges`, in insertion order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Connections(IndexMap<String, IndexMap<String, Vec<Connection>>>);

impl Connections {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, connection: Connection) {
        self.0
            .entry(connection.source.clone())
            .or_default()
            .entry(connection.source_output.clone())
            .or_default()
            .push(connection);
    }

    /// All connections, ordered by source insertion, then port, then edge.
    pub fn iter(&self) -> impl Iterator<Item = &Connection> {
        self.0.values().flat_map(|ports| ports.values().flatten())
    }

    pub fn len(&self) -> usize {
        self.iter().count()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Edges leaving `source` through `port`.
    pub fn from_port(&self, source: &str, port: &str) -> &[Connection] {
        self.0
            .get(source)
            .and_then(|ports| ports.get(port))
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub fn outputs_of(&self, source: &str) -> Option<&IndexMap<String, Vec<Connection>>> {
        self.0.get(source)
    }
}

impl FromIterator<Connection> for Connections {
    fn from_iter<T: IntoIterator<Item = Connection>>(iter: T) -> Self {
        let mut connections = Self::new();
        for connection in iter {
            connections.add(connection);
        }
        connections
    }
}
