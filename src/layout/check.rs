use crate::workflow::{Node, Position};
use ahash::AHashMap;
use serde::Serialize;
use std::fmt;

/// A problem found in a produced layout.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum LayoutIssue {
    /// Two nodes share exactly the same position.
    Collision {
        first: String,
        second: String,
        position: Position,
    },
    NegativeCoordinate { node: String, position: Position },
}

impl fmt::Display for LayoutIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LayoutIssue::Collision {
                first,
                second,
                position,
            } => write!(
                f,
                "{} and {} overlap at ({}, {})",
                first, second, position.x, position.y
            ),
            LayoutIssue::NegativeCoordinate { node, position } => write!(
                f,
                "{} has a negative coordinate ({}, {})",
                node, position.x, position.y
            ),
        }
    }
}

/// Diagnostics for a laid-out graph. An empty result means the layout is clean.
pub fn check_layout(nodes: &[Node]) -> Vec<LayoutIssue> {
    let mut issues = Vec::new();
    let mut occupied: AHashMap<Position, &str> = AHashMap::new();

    for node in nodes {
        if let Some(first) = occupied.get(&node.position) {
            issues.push(LayoutIssue::Collision {
                first: first.to_string(),
                second: node.id.clone(),
                position: node.position,
            });
        } else {
            occupied.insert(node.position, &node.id);
        }
        if node.position.x < 0 || node.position.y < 0 {
            issues.push(LayoutIssue::NegativeCoordinate {
                node: node.id.clone(),
                position: node.position,
            });
        }
    }
    issues
}
