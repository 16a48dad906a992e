//! Nested root-form snapshots.
//!
//! Headless drivers return `{role, name, children: [...]}` objects without
//! identifiers. Each node gets a positional path id (`"0"`, `"0.1"`, ...) and
//! its remaining scalar attributes become properties.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::model::{AccessibilityNode, AccessibilityNodeRaw, LabeledValue, NodeProperty};

/// One node of a nested snapshot.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct NestedNode {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<LabeledValue>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<LabeledValue>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<NestedNode>,
    /// `value`, `description`, `level`, `focused`, `checked`, ...
    #[serde(flatten)]
    pub attributes: Map<String, Value>,
}

impl NestedNode {
    /// Convert to the hierarchical model with synthesised path ids.
    pub fn into_hierarchy(self) -> AccessibilityNode {
        self.convert("0".to_string(), None)
    }

    fn convert(self, id: String, parent: Option<String>) -> AccessibilityNode {
        let child_ids: Vec<String> = (0..self.children.len())
            .map(|i| format!("{id}.{i}"))
            .collect();

        let mut properties: Vec<NodeProperty> = self
            .attributes
            .iter()
            .filter(|(key, value)| key.as_str() != "ignored" && !value.is_object() && !value.is_array())
            .map(|(key, value)| NodeProperty {
                name: key.clone(),
                value: LabeledValue::bare(value.clone()),
            })
            .collect();
        let focused = self.attributes.get("focused") == Some(&Value::Bool(true));
        if focused && !properties.iter().any(|p| p.name == "focusable") {
            properties.push(NodeProperty {
                name: "focusable".into(),
                value: LabeledValue::bare(true),
            });
        }

        let raw = AccessibilityNodeRaw {
            id: id.clone(),
            role: self.role,
            name: self.name,
            ignored: self.attributes.get("ignored") == Some(&Value::Bool(true)),
            properties,
            parent_id: parent,
            child_ids: child_ids.clone(),
        };
        let children = self
            .children
            .into_iter()
            .zip(child_ids)
            .map(|(child, child_id)| child.convert(child_id, Some(id.clone())))
            .collect();

        AccessibilityNode { raw, children }
    }
}
