//! Snapshot payload shapes and the normalised tree.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::info;

use crate::builder::TreeBuilder;
use crate::error::SnapshotError;
use crate::model::{AccessibilityNode, AccessibilityNodeRaw};
use crate::nested::NestedNode;

/// A decoded snapshot payload.
///
/// Serialises back to the shape it was read from.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Snapshot {
    /// Flat, parent-referencing records; needs the [`TreeBuilder`].
    Flat(Vec<AccessibilityNodeRaw>),
    /// Already nested root object.
    Nested(NestedNode),
}

impl Snapshot {
    pub fn from_json(json: &str) -> Result<Self, SnapshotError> {
        let value: Value = serde_json::from_str(json)?;
        Self::from_value(value)
    }

    /// Accepts a node array, a `{"nodes": [...]}` wrapper, or a nested root.
    pub fn from_value(value: Value) -> Result<Self, SnapshotError> {
        match value {
            Value::Array(_) => Ok(Snapshot::Flat(serde_json::from_value(value)?)),
            Value::Object(ref map) if map.get("nodes").is_some_and(Value::is_array) => {
                let nodes = map.get("nodes").cloned().unwrap_or_default();
                Ok(Snapshot::Flat(serde_json::from_value(nodes)?))
            }
            Value::Object(_) => Ok(Snapshot::Nested(serde_json::from_value(value)?)),
            Value::Null => Err(SnapshotError::EmptyInput),
            other => Err(SnapshotError::Parse(format!(
                "expected a node array or a root object, got {}",
                kind_of(&other)
            ))),
        }
    }

    pub fn is_flat(&self) -> bool {
        matches!(self, Snapshot::Flat(_))
    }

    pub fn to_json_pretty(&self) -> Result<String, SnapshotError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Normalise to a rooted tree plus its flat node list.
    pub fn into_tree(self, builder: &TreeBuilder) -> Result<AccessibilityTree, SnapshotError> {
        let tree = match self {
            Snapshot::Flat(nodes) => {
                let root = builder.build(&nodes)?;
                AccessibilityTree { root, nodes }
            }
            Snapshot::Nested(nested) => {
                let root = nested.into_hierarchy();
                let nodes = root.iter().map(|n| n.raw.clone()).collect();
                AccessibilityTree { root, nodes }
            }
        };
        info!(
            nodes = tree.nodes.len(),
            reachable = tree.root.count(),
            root = %tree.root.id(),
            "accessibility tree built"
        );
        Ok(tree)
    }
}

fn kind_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

/// A built hierarchy and the flat records it came from.
///
/// `nodes` keeps every record of the snapshot in input order, including
/// records unreachable from `root`; search and role discovery use it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AccessibilityTree {
    pub root: AccessibilityNode,
    pub nodes: Vec<AccessibilityNodeRaw>,
}

impl AccessibilityTree {
    pub fn from_json(json: &str, builder: &TreeBuilder) -> Result<Self, SnapshotError> {
        Snapshot::from_json(json)?.into_tree(builder)
    }

    /// Distinct non-empty lower-cased role labels in first-appearance order.
    pub fn roles(&self) -> Vec<String> {
        let mut seen = std::collections::HashSet::new();
        self.nodes
            .iter()
            .map(AccessibilityNodeRaw::role_key)
            .filter(|role| !role.is_empty() && seen.insert(role.clone()))
            .collect()
    }

    pub fn get(&self, id: &str) -> Option<&AccessibilityNodeRaw> {
        self.nodes.iter().rev().find(|n| n.id == id)
    }
}
