//! Assigns canvas coordinates to compiled nodes.
//!
//! Nodes are placed in columns by their distance from the graph's roots and stacked,
//! centred, within each column. Layout cannot fail: if the connection graph is
//! malformed the nodes are placed on a fixed three-column grid instead.

mod check;

pub use check::{LayoutIssue, check_layout};

use crate::error::LayoutError;
use crate::workflow::{Connections, Node, Position};
use ahash::{AHashMap, AHashSet};
use itertools::Itertools;
use serde::{Deserialize, Serialize};

const GRID_COLUMNS: usize = 3;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct LayoutConfig {
    pub start_x: i32,
    pub start_y: i32,
    pub horizontal_spacing: i32,
    pub node_height: i32,
    pub vertical_gap: i32,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            start_x: 250,
            start_y: 300,
            horizontal_spacing: 300,
            node_height: 100,
            vertical_gap: 50,
        }
    }
}

impl LayoutConfig {
    /// Distance between the tops of two stacked nodes.
    pub fn vertical_spacing(&self) -> i32 {
        self.node_height + self.vertical_gap
    }

    pub fn origin(&self) -> Position {
        Position::new(self.start_x, self.start_y)
    }
}

/// Returns copies of `nodes` with positions assigned. Input order is preserved.
pub fn layout(nodes: &[Node], connections: &Connections, config: &LayoutConfig) -> Vec<Node> {
    match nodes {
        [] => Vec::new(),
        [single] => vec![positioned(single, config.origin())],
        _ => match leveled_positions(nodes, connections, config) {
            Ok(positions) => nodes
                .iter()
                .map(|node| positioned(node, positions[node.id.as_str()]))
                .collect(),
            Err(error) => {
                tracing::warn!(%error, "leveled layout failed, using grid layout");
                grid_layout(nodes, config)
            }
        },
    }
}

/// Places nodes row by row, three per row, in input order.
pub fn grid_layout(nodes: &[Node], config: &LayoutConfig) -> Vec<Node> {
    nodes
        .iter()
        .enumerate()
        .map(|(index, node)| {
            let column = (index % GRID_COLUMNS) as i32;
            let row = (index / GRID_COLUMNS) as i32;
            positioned(
                node,
                Position::new(
                    config.start_x + column * config.horizontal_spacing,
                    config.start_y + row * config.vertical_spacing(),
                ),
            )
        })
        .collect()
}

fn positioned(node: &Node, position: Position) -> Node {
    let mut node = node.clone();
    node.position = position;
    node
}

fn leveled_positions<'n>(
    nodes: &'n [Node],
    connections: &'n Connections,
    config: &LayoutConfig,
) -> Result<AHashMap<&'n str, Position>, LayoutError> {
    let known: AHashSet<&str> = nodes.iter().map(|node| node.id.as_str()).collect();

    // target -> sources
    let mut dependencies: AHashMap<&str, Vec<&str>> = AHashMap::new();
    for connection in connections.iter() {
        for end in [&connection.source, &connection.target] {
            if !known.contains(end.as_str()) {
                return Err(LayoutError::UnknownNode(end.clone()));
            }
        }
        dependencies
            .entry(connection.target.as_str())
            .or_default()
            .push(connection.source.as_str());
    }

    let mut levels = Levels {
        dependencies: &dependencies,
        memo: AHashMap::new(),
        in_progress: AHashSet::new(),
    };
    let by_level = nodes
        .iter()
        .map(|node| Ok((levels.level_of(&node.id)?, node)))
        .collect::<Result<Vec<_>, LayoutError>>()?
        .into_iter()
        .into_group_map();

    let mut positions = AHashMap::new();
    for (level, mut group) in by_level.into_iter().sorted_by_key(|(level, _)| *level) {
        group.sort_by(|a, b| a.name.cmp(&b.name).then_with(|| a.id.cmp(&b.id)));
        let x = config.start_x + level as i32 * config.horizontal_spacing;
        let top = config.start_y - (group.len() as i32 - 1) * config.vertical_spacing() / 2;
        for (index, node) in group.into_iter().enumerate() {
            let y = top + index as i32 * config.vertical_spacing();
            positions.insert(node.id.as_str(), Position::new(x, y));
        }
    }
    Ok(positions)
}

/// Memoized longest-path levels over the reverse dependency map.
struct Levels<'g> {
    dependencies: &'g AHashMap<&'g str, Vec<&'g str>>,
    memo: AHashMap<&'g str, usize>,
    in_progress: AHashSet<&'g str>,
}

impl<'g> Levels<'g> {
    fn level_of(&mut self, id: &'g str) -> Result<usize, LayoutError> {
        if let Some(level) = self.memo.get(id) {
            return Ok(*level);
        }
        if !self.in_progress.insert(id) {
            return Err(LayoutError::Cycle(id.to_string()));
        }

        let dependencies = self.dependencies;
        let mut level = 0;
        if let Some(sources) = dependencies.get(id) {
            for source in sources {
                level = level.max(self.level_of(source)? + 1);
            }
        }

        self.in_progress.remove(id);
        self.memo.insert(id, level);
        Ok(level)
    }
}
