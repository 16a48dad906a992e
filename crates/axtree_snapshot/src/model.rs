//! Accessibility node records.
//!
//! Field names follow the DevTools protocol (`nodeId`, `parentId`,
//! `childIds`); `id` is accepted as an alias for hand-written fixtures.

use serde::{Deserialize, Serialize};
use serde_json::Value;

// =============================================================================
// LABELED VALUE
// =============================================================================

/// A protocol value such as `{"type": "role", "value": "link"}`.
///
/// Bare scalars (`"link"`, `7`, `true`) are accepted on input and stored with
/// no type tag.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "LabeledValueRepr")]
pub struct LabeledValue {
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
    #[serde(default)]
    pub value: Value,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum LabeledValueRepr {
    Tagged {
        #[serde(rename = "type", default)]
        kind: Option<String>,
        #[serde(default)]
        value: Value,
    },
    Bare(Value),
}

impl From<LabeledValueRepr> for LabeledValue {
    fn from(repr: LabeledValueRepr) -> Self {
        match repr {
            LabeledValueRepr::Tagged { kind, value } => Self { kind, value },
            LabeledValueRepr::Bare(value) => Self { kind: None, value },
        }
    }
}

impl LabeledValue {
    pub fn bare(value: impl Into<Value>) -> Self {
        Self {
            kind: None,
            value: value.into(),
        }
    }

    pub fn tagged(kind: impl Into<String>, value: impl Into<Value>) -> Self {
        Self {
            kind: Some(kind.into()),
            value: value.into(),
        }
    }

    /// String form of the value: strings verbatim, numbers and booleans
    /// formatted, null as the empty string.
    pub fn label(&self) -> String {
        match &self.value {
            Value::Null => String::new(),
            Value::String(s) => s.clone(),
            Value::Number(n) => n.to_string(),
            Value::Bool(b) => b.to_string(),
            other => other.to_string(),
        }
    }

    pub fn is_true(&self) -> bool {
        self.value == Value::Bool(true)
    }
}

/// One `{name, value}` entry of a node's property list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeProperty {
    pub name: String,
    pub value: LabeledValue,
}

// =============================================================================
// RAW NODE
// =============================================================================

/// One entry of a flat snapshot.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct AccessibilityNodeRaw {
    #[serde(rename = "nodeId", alias = "id", default)]
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<LabeledValue>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<LabeledValue>,
    #[serde(default)]
    pub ignored: bool,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub properties: Vec<NodeProperty>,
    #[serde(rename = "parentId", default, skip_serializing_if = "Option::is_none")]
    pub parent_id: Option<String>,
    /// Informational only; the hierarchy is rebuilt from `parent_id`.
    #[serde(rename = "childIds", default, skip_serializing_if = "Vec::is_empty")]
    pub child_ids: Vec<String>,
}

impl AccessibilityNodeRaw {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            ..Default::default()
        }
    }

    pub fn with_role(mut self, role: impl Into<Value>) -> Self {
        self.role = Some(LabeledValue::tagged("role", role));
        self
    }

    pub fn with_name(mut self, name: impl Into<Value>) -> Self {
        self.name = Some(LabeledValue::tagged("computedString", name));
        self
    }

    pub fn with_parent(mut self, parent: impl Into<String>) -> Self {
        self.parent_id = Some(parent.into());
        self
    }

    pub fn with_property(mut self, name: impl Into<String>, value: LabeledValue) -> Self {
        self.properties.push(NodeProperty {
            name: name.into(),
            value,
        });
        self
    }

    pub fn ignored(mut self) -> Self {
        self.ignored = true;
        self
    }

    /// Role label as reported, empty when the node has no role.
    pub fn role_label(&self) -> String {
        self.role.as_ref().map(LabeledValue::label).unwrap_or_default()
    }

    /// Lower-cased role label, the form used by filtering and search.
    pub fn role_key(&self) -> String {
        self.role_label().to_lowercase()
    }

    pub fn name_label(&self) -> String {
        self.name.as_ref().map(LabeledValue::label).unwrap_or_default()
    }

    /// Parent reference, treating an empty string as no parent.
    pub fn parent_ref(&self) -> Option<&str> {
        self.parent_id.as_deref().filter(|p| !p.is_empty())
    }

    pub fn property(&self, name: &str) -> Option<&LabeledValue> {
        self.properties
            .iter()
            .find(|p| p.name == name)
            .map(|p| &p.value)
    }
}

// =============================================================================
// HIERARCHICAL NODE
// =============================================================================

/// A raw node together with its ordered children.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AccessibilityNode {
    #[serde(flatten)]
    pub raw: AccessibilityNodeRaw,
    #[serde(default)]
    pub children: Vec<AccessibilityNode>,
}

impl AccessibilityNode {
    pub fn leaf(raw: AccessibilityNodeRaw) -> Self {
        Self {
            raw,
            children: Vec::new(),
        }
    }

    pub fn id(&self) -> &str {
        &self.raw.id
    }

    pub fn role_key(&self) -> String {
        self.raw.role_key()
    }

    /// Nodes in pre-order (document order), root first.
    pub fn iter(&self) -> PreOrder<'_> {
        PreOrder { stack: vec![self] }
    }

    /// Total number of nodes in this subtree.
    pub fn count(&self) -> usize {
        self.iter().count()
    }

    pub fn find(&self, id: &str) -> Option<&AccessibilityNode> {
        self.iter().find(|n| n.id() == id)
    }

    /// Maximum depth below this node (a leaf has depth 0).
    pub fn height(&self) -> usize {
        let mut max = 0;
        let mut stack = vec![(self, 0usize)];
        while let Some((node, depth)) = stack.pop() {
            max = max.max(depth);
            stack.extend(node.children.iter().map(|c| (c, depth + 1)));
        }
        max
    }
}

/// Depth-first pre-order walk that keeps sibling order.
pub struct PreOrder<'a> {
    stack: Vec<&'a AccessibilityNode>,
}

impl<'a> Iterator for PreOrder<'a> {
    type Item = &'a AccessibilityNode;

    fn next(&mut self) -> Option<Self::Item> {
        let node = self.stack.pop()?;
        self.stack.extend(node.children.iter().rev());
        Some(node)
    }
}
