//! Keyboard traversal order for links and buttons.

use crate::model::{AccessibilityNode, AccessibilityNodeRaw};

/// Roles that take part in the keyboard-flow demonstration.
const FLOW_ROLES: [&str; 2] = ["link", "button"];

/// True for a non-ignored link or button whose `focusable` property is `true`.
pub fn is_focusable(node: &AccessibilityNodeRaw) -> bool {
    !node.ignored
        && node.property("focusable").is_some_and(|v| v.is_true())
        && FLOW_ROLES.contains(&node.role_key().as_str())
}

/// Ids of focusable links and buttons in document order.
///
/// Ignored nodes are skipped but their descendants are still visited.
pub fn focusable_links_and_buttons(root: &AccessibilityNode) -> Vec<String> {
    root.iter()
        .filter(|n| is_focusable(&n.raw))
        .map(|n| n.id().to_string())
        .collect()
}
