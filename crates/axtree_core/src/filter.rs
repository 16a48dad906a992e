//! Role filter.
//!
//! A child is kept when its own lower-cased role is in the kept set or when
//! any node of its subtree has such a role; otherwise its whole subtree is
//! dropped. The root is always kept. An empty set keeps everything.
//!
//! The filter never copies the hierarchy: [`RoleFilter::view`] returns a
//! [`VisibleTree`], a pre-order arena of borrowed nodes that the layout
//! consumes directly.

use std::collections::HashSet;

use axtree_snapshot::AccessibilityNode;
use tracing::debug;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RoleFilter {
    roles: HashSet<String>,
}

impl RoleFilter {
    /// Keep the given roles; labels are lower-cased.
    pub fn new<I, S>(roles: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            roles: roles
                .into_iter()
                .map(|r| r.as_ref().trim().to_lowercase())
                .filter(|r| !r.is_empty())
                .collect(),
        }
    }

    /// No constraint.
    pub fn unconstrained() -> Self {
        Self::default()
    }

    pub fn is_unconstrained(&self) -> bool {
        self.roles.is_empty()
    }

    pub fn roles(&self) -> &HashSet<String> {
        &self.roles
    }

    /// The node's own role is kept.
    pub fn matches(&self, node: &AccessibilityNode) -> bool {
        self.roles.contains(&node.role_key())
    }

    /// The node or one of its descendants has a kept role.
    pub fn retains(&self, node: &AccessibilityNode) -> bool {
        self.is_unconstrained() || node.iter().any(|n| self.matches(n))
    }

    /// Children of `node` that survive the filter, in order.
    pub fn visible_children<'a>(
        &'a self,
        node: &'a AccessibilityNode,
    ) -> impl Iterator<Item = &'a AccessibilityNode> + 'a {
        node.children.iter().filter(move |c| self.retains(c))
    }

    /// Visible hierarchy under `root` in a single bottom-up pass.
    pub fn view<'a>(&self, root: &'a AccessibilityNode) -> VisibleTree<'a> {
        // Full pre-order with parent and child links.
        let mut all: Vec<(&AccessibilityNode, Option<usize>)> = Vec::new();
        let mut kids: Vec<Vec<usize>> = Vec::new();
        let mut stack = vec![(root, None)];
        while let Some((node, parent)) = stack.pop() {
            let index = all.len();
            all.push((node, parent));
            kids.push(Vec::new());
            if let Some(p) = parent {
                kids[p].push(index);
            }
            stack.extend(node.children.iter().rev().map(|c| (c, Some(index))));
        }

        let mut relevant: Vec<bool> = if self.is_unconstrained() {
            vec![true; all.len()]
        } else {
            all.iter().map(|(n, _)| self.matches(n)).collect()
        };
        for index in (1..all.len()).rev() {
            if let (true, Some(parent)) = (relevant[index], all[index].1) {
                relevant[parent] = true;
            }
        }
        relevant[0] = true;

        // Re-walk, descending only into relevant children.
        let mut tree = VisibleTree { nodes: Vec::new() };
        let mut stack = vec![(0usize, None, 0usize)];
        while let Some((source, parent, depth)) = stack.pop() {
            let index = tree.nodes.len();
            tree.nodes.push(VisibleEntry {
                node: all[source].0,
                parent,
                children: Vec::new(),
                depth,
            });
            if let Some(p) = parent {
                tree.nodes[p].children.push(index);
            }
            stack.extend(
                kids[source]
                    .iter()
                    .rev()
                    .filter(|&&k| relevant[k])
                    .map(|&k| (k, Some(index), depth + 1)),
            );
        }

        debug!(
            total = all.len(),
            visible = tree.len(),
            roles = self.roles.len(),
            "role filter applied"
        );
        tree
    }

    /// Materialised copy of the visible hierarchy.
    pub fn prune(&self, root: &AccessibilityNode) -> AccessibilityNode {
        self.view(root).to_hierarchy()
    }
}

// =============================================================================
// VISIBLE TREE
// =============================================================================

/// One visible node, its arena links and its depth (root = 0).
#[derive(Debug, Clone)]
pub struct VisibleEntry<'a> {
    pub node: &'a AccessibilityNode,
    pub parent: Option<usize>,
    pub children: Vec<usize>,
    pub depth: usize,
}

/// Filtered hierarchy as a pre-order arena; index 0 is the root.
#[derive(Debug, Clone)]
pub struct VisibleTree<'a> {
    nodes: Vec<VisibleEntry<'a>>,
}

impl<'a> VisibleTree<'a> {
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn entries(&self) -> &[VisibleEntry<'a>] {
        &self.nodes
    }

    pub fn get(&self, index: usize) -> Option<&VisibleEntry<'a>> {
        self.nodes.get(index)
    }

    pub fn ids(&self) -> impl Iterator<Item = &'a str> + '_ {
        self.nodes.iter().map(|e| e.node.id())
    }

    pub fn max_depth(&self) -> usize {
        self.nodes.iter().map(|e| e.depth).max().unwrap_or(0)
    }

    pub fn to_hierarchy(&self) -> AccessibilityNode {
        let mut built: Vec<Option<AccessibilityNode>> = vec![None; self.nodes.len()];
        for index in (0..self.nodes.len()).rev() {
            let entry = &self.nodes[index];
            let children = entry
                .children
                .iter()
                .filter_map(|&c| built[c].take())
                .collect();
            built[index] = Some(AccessibilityNode {
                raw: entry.node.raw.clone(),
                children,
            });
        }
        built
            .first_mut()
            .and_then(Option::take)
            .unwrap_or_else(|| AccessibilityNode::leaf(Default::default()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axtree_snapshot::{build_tree, AccessibilityNodeRaw};
    use pretty_assertions::assert_eq;
    use proptest::prelude::*;

    fn page() -> AccessibilityNode {
        let nodes = vec![
            AccessibilityNodeRaw::new("1").with_role("RootWebArea"),
            AccessibilityNodeRaw::new("2").with_role("link").with_name("Home").with_parent("1"),
            AccessibilityNodeRaw::new("3").with_role("generic").with_parent("1"),
            AccessibilityNodeRaw::new("4").with_role("navigation").with_parent("1"),
            AccessibilityNodeRaw::new("5").with_role("list").with_parent("4"),
            AccessibilityNodeRaw::new("6").with_role("Button").with_parent("5"),
            AccessibilityNodeRaw::new("7").with_role("StaticText").with_parent("2"),
        ];
        build_tree(&nodes).unwrap()
    }

    #[test]
    fn keeps_matches_and_their_ancestors() {
        let root = page();
        let filter = RoleFilter::new(["link"]);
        let view = filter.view(&root);
        let ids: Vec<&str> = view.ids().collect();
        assert_eq!(ids, vec!["1", "2"]);
    }

    #[test]
    fn ancestor_paths_are_kept() {
        let root = page();
        let view = RoleFilter::new(["BUTTON"]).view(&root);
        let ids: Vec<&str> = view.ids().collect();
        assert_eq!(ids, vec!["1", "4", "5", "6"]);
        assert_eq!(view.max_depth(), 3);
        assert_eq!(view.get(3).unwrap().parent, Some(2));
    }

    #[test]
    fn root_is_kept_even_without_matches() {
        let root = page();
        let view = RoleFilter::new(["slider"]).view(&root);
        assert_eq!(view.len(), 1);
        assert_eq!(view.get(0).unwrap().node.id(), "1");
    }

    #[test]
    fn empty_set_is_identity() {
        let root = page();
        assert_eq!(RoleFilter::unconstrained().prune(&root), root);
    }

    #[test]
    fn lazy_children_agree_with_view() {
        let root = page();
        let filter = RoleFilter::new(["link", "button"]);
        let lazy: Vec<&str> = filter.visible_children(&root).map(|n| n.id()).collect();
        let view = filter.view(&root);
        let eager: Vec<&str> = view.get(0).unwrap()
            .children
            .iter()
            .map(|&c| view.get(c).unwrap().node.id())
            .collect();
        assert_eq!(lazy, eager);
    }

    const ROLES: [&str; 5] = ["link", "button", "generic", "heading", "list"];

    fn arb_tree() -> impl Strategy<Value = AccessibilityNode> {
        prop::collection::vec((any::<prop::sample::Index>(), 0..ROLES.len()), 1..40).prop_map(|spec| {
            let nodes: Vec<AccessibilityNodeRaw> = spec
                .into_iter()
                .enumerate()
                .map(|(i, (parent, role))| {
                    let raw = AccessibilityNodeRaw::new(format!("n{i}")).with_role(ROLES[role]);
                    if i == 0 {
                        raw
                    } else {
                        raw.with_parent(format!("n{}", parent.index(i)))
                    }
                })
                .collect();
            build_tree(&nodes).unwrap()
        })
    }

    proptest! {
        #[test]
        fn filter_is_sound(root in arb_tree(), keep in prop::sample::subsequence(ROLES.to_vec(), 1..3)) {
            let filter = RoleFilter::new(keep);
            let view = filter.view(&root);
            let visible: HashSet<&str> = view.ids().collect();
            prop_assert!(visible.contains(root.id()));
            for node in root.iter().skip(1) {
                let relevant = node.iter().any(|n| filter.matches(n));
                prop_assert_eq!(visible.contains(node.id()), relevant, "node {}", node.id());
            }
        }

        #[test]
        fn filter_is_deterministic(root in arb_tree()) {
            let filter = RoleFilter::new(["link"]);
            prop_assert_eq!(filter.prune(&root), filter.prune(&root));
        }
    }
}
