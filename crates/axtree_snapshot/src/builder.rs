//! Flat node list to rooted hierarchy.
//!
//! Two passes over the input: the first indexes every usable record by id,
//! the second appends each record to its parent's child list in input order.
//! The first record whose parent is absent or unresolvable becomes the root;
//! later parentless records stay unattached. A snapshot in which every record
//! points at a missing parent has no structure to anchor and yields
//! [`SnapshotError::MissingRoot`].

use std::collections::hash_map::Entry;
use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::SnapshotError;
use crate::model::{AccessibilityNode, AccessibilityNodeRaw};

/// What to do when two records share an identifier.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DuplicatePolicy {
    /// Fail with [`SnapshotError::DuplicateId`].
    #[default]
    Reject,
    /// Keep the later record and drop the earlier one.
    LastWins,
}

/// Builds an [`AccessibilityNode`] hierarchy from a flat snapshot.
#[derive(Debug, Clone, Copy, Default)]
pub struct TreeBuilder {
    duplicates: DuplicatePolicy,
}

impl TreeBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_duplicate_policy(mut self, policy: DuplicatePolicy) -> Self {
        self.duplicates = policy;
        self
    }

    pub fn duplicate_policy(&self) -> DuplicatePolicy {
        self.duplicates
    }

    pub fn build(&self, nodes: &[AccessibilityNodeRaw]) -> Result<AccessibilityNode, SnapshotError> {
        if nodes.is_empty() {
            return Err(SnapshotError::EmptyInput);
        }

        // Pass 1: id -> index of the record that owns it.
        let mut slots: HashMap<&str, usize> = HashMap::with_capacity(nodes.len());
        for (index, node) in nodes.iter().enumerate() {
            if node.id.trim().is_empty() {
                warn!(index, "skipping accessibility node without an id");
                continue;
            }
            match slots.entry(node.id.as_str()) {
                Entry::Vacant(slot) => {
                    slot.insert(index);
                }
                Entry::Occupied(mut slot) => match self.duplicates {
                    DuplicatePolicy::Reject => {
                        return Err(SnapshotError::DuplicateId {
                            id: node.id.clone(),
                        })
                    }
                    DuplicatePolicy::LastWins => {
                        warn!(id = %node.id, dropped = *slot.get(), "duplicate node id, keeping later record");
                        slot.insert(index);
                    }
                },
            }
        }

        // Pass 2: attach children in input order, pick the first root.
        let mut children: Vec<Vec<usize>> = vec![Vec::new(); nodes.len()];
        let mut root = None;
        let mut linked = false;
        for (index, node) in nodes.iter().enumerate() {
            if slots.get(node.id.as_str()) != Some(&index) {
                continue;
            }
            match node.parent_ref().and_then(|p| slots.get(p)) {
                Some(&parent) => {
                    children[parent].push(index);
                    linked = true;
                }
                None if root.is_none() => root = Some(index),
                None => debug!(id = %node.id, "additional parentless node left unattached"),
            }
        }
        let root = root.ok_or(SnapshotError::MissingRoot)?;
        if nodes[root].parent_ref().is_some() && !linked {
            return Err(SnapshotError::MissingRoot);
        }

        Ok(assemble(nodes, &children, root))
    }
}

/// Build with the default policy (duplicates rejected).
pub fn build_tree(nodes: &[AccessibilityNodeRaw]) -> Result<AccessibilityNode, SnapshotError> {
    TreeBuilder::new().build(nodes)
}

/// Materialise the owned hierarchy bottom-up so deep trees never recurse.
fn assemble(nodes: &[AccessibilityNodeRaw], children: &[Vec<usize>], root: usize) -> AccessibilityNode {
    let mut order = Vec::new();
    let mut stack = vec![root];
    while let Some(index) = stack.pop() {
        order.push(index);
        stack.extend(children[index].iter().rev());
    }

    let mut built: Vec<Option<AccessibilityNode>> = vec![None; nodes.len()];
    for &index in order.iter().rev() {
        let kids = children[index]
            .iter()
            .filter_map(|&child| built[child].take())
            .collect();
        built[index] = Some(AccessibilityNode {
            raw: nodes[index].clone(),
            children: kids,
        });
    }

    built[root]
        .take()
        .unwrap_or_else(|| AccessibilityNode::leaf(nodes[root].clone()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use proptest::prelude::*;

    fn node(id: &str, parent: Option<&str>, role: &str) -> AccessibilityNodeRaw {
        let raw = AccessibilityNodeRaw::new(id).with_role(role);
        match parent {
            Some(p) => raw.with_parent(p),
            None => raw,
        }
    }

    #[test]
    fn builds_simple_hierarchy() {
        let nodes = vec![
            node("1", None, "RootWebArea"),
            node("2", Some("1"), "link"),
            node("3", Some("1"), "generic"),
        ];
        let root = build_tree(&nodes).unwrap();
        assert_eq!(root.id(), "1");
        let ids: Vec<&str> = root.children.iter().map(|c| c.id()).collect();
        assert_eq!(ids, vec!["2", "3"]);
    }

    #[test]
    fn children_follow_input_order_even_before_parent() {
        let nodes = vec![
            node("c2", Some("p"), "link"),
            node("p", None, "main"),
            node("c1", Some("p"), "button"),
        ];
        let root = build_tree(&nodes).unwrap();
        let ids: Vec<&str> = root.children.iter().map(|c| c.id()).collect();
        assert_eq!(ids, vec!["c2", "c1"]);
    }

    #[test]
    fn empty_input_is_an_error() {
        assert_eq!(build_tree(&[]), Err(SnapshotError::EmptyInput));
    }

    #[test]
    fn every_parent_missing_is_missing_root() {
        let nodes = vec![
            node("a", Some("nope"), "main"),
            node("b", Some("gone"), "link"),
        ];
        assert_eq!(build_tree(&nodes), Err(SnapshotError::MissingRoot));
    }

    #[test]
    fn cyclic_parents_have_no_root() {
        let nodes = vec![node("a", Some("b"), "x"), node("b", Some("a"), "y")];
        assert_eq!(build_tree(&nodes), Err(SnapshotError::MissingRoot));
    }

    #[test]
    fn orphaned_parent_becomes_root() {
        let nodes = vec![node("a", Some("gone"), "main"), node("b", Some("a"), "link")];
        let root = build_tree(&nodes).unwrap();
        assert_eq!(root.id(), "a");
        assert_eq!(root.count(), 2);
    }

    #[test]
    fn first_root_wins_and_later_roots_are_detached() {
        let nodes = vec![
            node("r1", None, "main"),
            node("r2", None, "main"),
            node("x", Some("r2"), "link"),
        ];
        let root = build_tree(&nodes).unwrap();
        assert_eq!(root.id(), "r1");
        assert_eq!(root.count(), 1);
    }

    #[test]
    fn duplicate_ids_rejected_by_default() {
        let nodes = vec![node("1", None, "main"), node("1", None, "link")];
        assert_eq!(
            build_tree(&nodes),
            Err(SnapshotError::DuplicateId { id: "1".into() })
        );
    }

    #[test]
    fn duplicate_ids_last_wins() {
        let nodes = vec![
            node("1", None, "main"),
            node("2", Some("1"), "link"),
            node("2", Some("1"), "button"),
        ];
        let root = TreeBuilder::new()
            .with_duplicate_policy(DuplicatePolicy::LastWins)
            .build(&nodes)
            .unwrap();
        assert_eq!(root.children.len(), 1);
        assert_eq!(root.children[0].role_key(), "button");
    }

    #[test]
    fn nodes_without_ids_are_excluded() {
        let nodes = vec![
            node("1", None, "main"),
            node("", Some("1"), "link"),
            node("2", Some("1"), "button"),
        ];
        let root = build_tree(&nodes).unwrap();
        assert_eq!(root.count(), 2);
    }

    #[test]
    fn deep_chain_does_not_recurse() {
        let mut nodes = vec![node("0", None, "main")];
        for i in 1..5_000 {
            nodes.push(node(&i.to_string(), Some(&(i - 1).to_string()), "group"));
        }
        let root = build_tree(&nodes).unwrap();
        assert_eq!(root.count(), 5_000);
        // Unwind the chain by hand so the test's drop stays shallow too.
        let mut next = Some(root);
        while let Some(mut n) = next {
            next = n.children.pop();
        }
    }

    /// Random forests: node i picks a parent among 0..i, or none.
    fn arb_nodes() -> impl Strategy<Value = Vec<AccessibilityNodeRaw>> {
        prop::collection::vec(prop::option::weighted(0.9, any::<prop::sample::Index>()), 1..60)
            .prop_map(|parents| {
                parents
                    .into_iter()
                    .enumerate()
                    .map(|(i, parent)| {
                        let raw = AccessibilityNodeRaw::new(format!("n{i}")).with_role("group");
                        match parent {
                            Some(ix) if i > 0 => raw.with_parent(format!("n{}", ix.index(i))),
                            _ => raw,
                        }
                    })
                    .collect()
            })
    }

    fn reachable_from_first_root(nodes: &[AccessibilityNodeRaw]) -> usize {
        // node 0 never has a parent, so it is always the root.
        let mut reach = vec![false; nodes.len()];
        reach[0] = true;
        for (i, n) in nodes.iter().enumerate().skip(1) {
            if let Some(p) = n.parent_ref() {
                let p: usize = p[1..].parse().unwrap();
                reach[i] = reach[p];
            }
        }
        reach.iter().filter(|r| **r).count()
    }

    proptest! {
        #[test]
        fn node_count_matches_reachable(nodes in arb_nodes()) {
            let root = build_tree(&nodes).unwrap();
            prop_assert_eq!(root.id(), "n0");
            prop_assert_eq!(root.count(), reachable_from_first_root(&nodes));
        }

        #[test]
        fn build_is_idempotent(nodes in arb_nodes()) {
            prop_assert_eq!(build_tree(&nodes).unwrap(), build_tree(&nodes).unwrap());
        }
    }
}
