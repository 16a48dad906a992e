//! Tidy tree layout.
//!
//! Buchheim/Walker linear-time tidy tree over a [`VisibleTree`], stretched so
//! the outermost nodes touch the canvas extents. Depth runs along the world
//! x axis (root on the left); siblings spread along the world y axis.
//!
//! ```text
//!   root ──┬── a ──┬── c        x = depth * depth_extent / max_depth
//!          │       └── d        y = (prelim + tx) * kx
//!          └── b
//! ```
//!
//! Both walks are iterative so deep accessibility trees never blow the stack.
//! The result depends only on the visible tree and the canvas size.

use std::collections::HashMap;

use axtree_snapshot::AccessibilityNodeRaw;
use serde::Serialize;
use tracing::debug;

use crate::config::LayoutConfig;
use crate::filter::VisibleTree;
use crate::geometry::{Bounds, Point, Size};

// =============================================================================
// OUTPUT
// =============================================================================

/// A visible node with its layout coordinates.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PositionedNode {
    pub node: AccessibilityNodeRaw,
    /// Root = 0.
    pub depth: usize,
    /// Coordinate along the sibling axis.
    pub order: f32,
    pub position: Point,
    /// Index of the parent in [`TreeLayout::nodes`].
    pub parent: Option<usize>,
    /// Indices of the visible children.
    pub children: Vec<usize>,
}

impl PositionedNode {
    pub fn id(&self) -> &str {
        &self.node.id
    }

    /// Controls label placement only.
    pub fn has_visible_children(&self) -> bool {
        !self.children.is_empty()
    }
}

/// Parent/child link, as indices into [`TreeLayout::nodes`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Edge {
    pub source: usize,
    pub target: usize,
}

/// Positioned nodes in pre-order plus the edge list.
#[derive(Debug, Clone, Default, Serialize)]
pub struct TreeLayout {
    nodes: Vec<PositionedNode>,
    edges: Vec<Edge>,
    #[serde(skip)]
    index: HashMap<String, usize>,
    canvas: Size,
}

impl TreeLayout {
    pub fn nodes(&self) -> &[PositionedNode] {
        &self.nodes
    }

    pub fn edges(&self) -> &[Edge] {
        &self.edges
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn canvas(&self) -> Size {
        self.canvas
    }

    pub fn index_of(&self, id: &str) -> Option<usize> {
        self.index.get(id).copied()
    }

    pub fn get(&self, id: &str) -> Option<&PositionedNode> {
        self.index_of(id).map(|i| &self.nodes[i])
    }

    pub fn position(&self, id: &str) -> Option<Point> {
        self.get(id).map(|n| n.position)
    }

    /// Bounding box of every node position.
    pub fn bounds(&self) -> Option<Bounds> {
        Bounds::from_points(self.nodes.iter().map(|n| n.position))
    }

    /// Endpoints of an edge in world space.
    pub fn edge_points(&self, edge: Edge) -> (Point, Point) {
        (
            self.nodes[edge.source].position,
            self.nodes[edge.target].position,
        )
    }
}

// =============================================================================
// ENGINE
// =============================================================================

/// Computes a [`TreeLayout`] for a canvas size.
#[derive(Debug, Clone, Copy, Default)]
pub struct LayoutEngine {
    config: LayoutConfig,
}

/// Per-node state of the Walker/Buchheim walks.
#[derive(Debug, Clone)]
struct Walk {
    prelim: f32,
    modifier: f32,
    change: f32,
    shift: f32,
    ancestor: usize,
    thread: Option<usize>,
    /// Position among siblings.
    number: usize,
    /// Default ancestor used while apportioning this node's children.
    default_ancestor: Option<usize>,
}

impl LayoutEngine {
    pub fn new(config: LayoutConfig) -> Self {
        Self { config }
    }

    /// Sibling-axis and depth-axis extents for a canvas.
    pub fn extents(&self, canvas: Size) -> (f32, f32) {
        (
            (canvas.height - self.config.breadth_margin).max(0.0),
            (canvas.width - self.config.depth_margin).max(0.0),
        )
    }

    pub fn compute(&self, tree: &VisibleTree<'_>, canvas: Size) -> TreeLayout {
        if tree.is_empty() {
            return TreeLayout {
                canvas,
                ..Default::default()
            };
        }

        let entries = tree.entries();
        let mut walks: Vec<Walk> = (0..entries.len())
            .map(|i| Walk {
                prelim: 0.0,
                modifier: 0.0,
                change: 0.0,
                shift: 0.0,
                ancestor: i,
                thread: None,
                number: 0,
                default_ancestor: None,
            })
            .collect();
        for entry in entries {
            for (number, &child) in entry.children.iter().enumerate() {
                walks[child].number = number;
            }
        }

        // First walk in post-order: reverse of a right-to-left pre-order.
        let mut mirrored = Vec::with_capacity(entries.len());
        let mut stack = vec![0usize];
        while let Some(v) = stack.pop() {
            mirrored.push(v);
            stack.extend(entries[v].children.iter().copied());
        }
        for &v in mirrored.iter().rev() {
            self.first_walk(tree, &mut walks, v);
        }

        // Second walk in pre-order; arena order is already pre-order.
        let mut breadth = vec![0.0f32; entries.len()];
        let root_modifier = -walks[0].prelim;
        for v in 0..entries.len() {
            let parent_modifier = match entries[v].parent {
                Some(p) => walks[p].modifier,
                None => root_modifier,
            };
            breadth[v] = walks[v].prelim + parent_modifier;
            walks[v].modifier += parent_modifier;
        }

        // Normalise to the canvas.
        let (breadth_extent, depth_extent) = self.extents(canvas);
        let (mut left, mut right) = (0usize, 0usize);
        for v in 0..entries.len() {
            if breadth[v] < breadth[left] {
                left = v;
            }
            if breadth[v] > breadth[right] {
                right = v;
            }
        }
        let max_depth = tree.max_depth();
        let s = if left == right {
            1.0
        } else {
            self.separation(tree, left, right) / 2.0
        };
        let tx = s - breadth[left];
        let kx = breadth_extent / (breadth[right] + s + tx);
        let ky = depth_extent / max_depth.max(1) as f32;

        let mut layout = TreeLayout {
            nodes: Vec::with_capacity(entries.len()),
            edges: Vec::with_capacity(entries.len().saturating_sub(1)),
            index: HashMap::with_capacity(entries.len()),
            canvas,
        };
        for (v, entry) in entries.iter().enumerate() {
            let order = (breadth[v] + tx) * kx;
            let position = Point::new(entry.depth as f32 * ky, order);
            layout.index.insert(entry.node.id().to_string(), v);
            layout.nodes.push(PositionedNode {
                node: entry.node.raw.clone(),
                depth: entry.depth,
                order,
                position,
                parent: entry.parent,
                children: entry.children.clone(),
            });
            if let Some(parent) = entry.parent {
                layout.edges.push(Edge {
                    source: parent,
                    target: v,
                });
            }
        }

        debug!(
            nodes = layout.len(),
            max_depth,
            width = canvas.width,
            height = canvas.height,
            "tree layout computed"
        );
        layout
    }

    fn separation(&self, tree: &VisibleTree<'_>, a: usize, b: usize) -> f32 {
        let parent = |i: usize| tree.get(i).and_then(|e| e.parent);
        if parent(a) == parent(b) {
            self.config.sibling_separation
        } else {
            self.config.cousin_separation
        }
    }

    fn first_walk(&self, tree: &VisibleTree<'_>, walks: &mut [Walk], v: usize) {
        let entries = tree.entries();
        let left_sibling = match (entries[v].parent, walks[v].number) {
            (Some(p), n) if n > 0 => Some(entries[p].children[n - 1]),
            _ => None,
        };

        let children = &entries[v].children;
        if let (Some(&first), Some(&last)) = (children.first(), children.last()) {
            execute_shifts(walks, children);
            let midpoint = (walks[first].prelim + walks[last].prelim) / 2.0;
            match left_sibling {
                Some(w) => {
                    walks[v].prelim = walks[w].prelim + self.separation(tree, v, w);
                    walks[v].modifier = walks[v].prelim - midpoint;
                }
                None => walks[v].prelim = midpoint,
            }
        } else if let Some(w) = left_sibling {
            walks[v].prelim = walks[w].prelim + self.separation(tree, v, w);
        }

        if let Some(p) = entries[v].parent {
            let fallback = entries[p].children[0];
            let ancestor = walks[p].default_ancestor.unwrap_or(fallback);
            let ancestor = self.apportion(tree, walks, v, left_sibling, ancestor);
            walks[p].default_ancestor = Some(ancestor);
        }
    }

    /// Push `v`'s subtree right until its left contour clears the right
    /// contour of everything to its left.
    fn apportion(
        &self,
        tree: &VisibleTree<'_>,
        walks: &mut [Walk],
        v: usize,
        left_sibling: Option<usize>,
        mut ancestor: usize,
    ) -> usize {
        let Some(w) = left_sibling else {
            return ancestor;
        };
        let entries = tree.entries();
        let Some(parent) = entries[v].parent else {
            return ancestor;
        };

        // i = inside, o = outside, p = right subtree (v), m = left subtrees.
        let mut vip = v;
        let mut vop = v;
        let mut vim = w;
        let mut vom = entries[parent].children[0];
        let mut sip = walks[vip].modifier;
        let mut sop = walks[vop].modifier;
        let mut sim = walks[vim].modifier;
        let mut som = walks[vom].modifier;

        loop {
            let (Some(next_im), Some(next_ip)) = (
                next_right(tree, walks, vim),
                next_left(tree, walks, vip),
            ) else {
                break;
            };
            vim = next_im;
            vip = next_ip;
            // Outer contours are at least as deep as the inner ones.
            vom = next_left(tree, walks, vom).unwrap_or(vom);
            vop = next_right(tree, walks, vop).unwrap_or(vop);
            walks[vop].ancestor = v;

            let shift = walks[vim].prelim + sim - walks[vip].prelim - sip
                + self.separation(tree, vim, vip);
            if shift > 0.0 {
                let wm = next_ancestor(tree, walks, vim, v, ancestor);
                move_subtree(walks, wm, v, shift);
                sip += shift;
                sop += shift;
            }
            sim += walks[vim].modifier;
            sip += walks[vip].modifier;
            som += walks[vom].modifier;
            sop += walks[vop].modifier;
        }

        let vim_next = next_right(tree, walks, vim);
        let vip_next = next_left(tree, walks, vip);
        if vim_next.is_some() && next_right(tree, walks, vop).is_none() {
            walks[vop].thread = vim_next;
            walks[vop].modifier += sim - sop;
        }
        if vip_next.is_some() && next_left(tree, walks, vom).is_none() {
            walks[vom].thread = vip_next;
            walks[vom].modifier += sip - som;
            ancestor = v;
        }
        ancestor
    }
}

fn next_left(tree: &VisibleTree<'_>, walks: &[Walk], v: usize) -> Option<usize> {
    tree.entries()[v].children.first().copied().or(walks[v].thread)
}

fn next_right(tree: &VisibleTree<'_>, walks: &[Walk], v: usize) -> Option<usize> {
    tree.entries()[v].children.last().copied().or(walks[v].thread)
}

fn next_ancestor(
    tree: &VisibleTree<'_>,
    walks: &[Walk],
    vim: usize,
    v: usize,
    default: usize,
) -> usize {
    let candidate = walks[vim].ancestor;
    let entries = tree.entries();
    if entries[candidate].parent == entries[v].parent {
        candidate
    } else {
        default
    }
}

fn move_subtree(walks: &mut [Walk], wm: usize, wp: usize, shift: f32) {
    let span = walks[wp].number as f32 - walks[wm].number as f32;
    let change = if span > 0.0 { shift / span } else { shift };
    walks[wp].change -= change;
    walks[wp].shift += shift;
    walks[wm].change += change;
    walks[wp].prelim += shift;
    walks[wp].modifier += shift;
}

fn execute_shifts(walks: &mut [Walk], children: &[usize]) {
    let mut shift = 0.0;
    let mut change = 0.0;
    for &w in children.iter().rev() {
        walks[w].prelim += shift;
        walks[w].modifier += shift;
        change += walks[w].change;
        shift += walks[w].shift + change;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filter::RoleFilter;
    use axtree_snapshot::{build_tree, AccessibilityNode};
    use proptest::prelude::*;

    const CANVAS: Size = Size::new(1200.0, 800.0);

    fn tree(edges: &[(&str, Option<&str>)]) -> AccessibilityNode {
        let nodes: Vec<AccessibilityNodeRaw> = edges
            .iter()
            .map(|(id, parent)| {
                let raw = AccessibilityNodeRaw::new(*id).with_role("group");
                match parent {
                    Some(p) => raw.with_parent(*p),
                    None => raw,
                }
            })
            .collect();
        build_tree(&nodes).unwrap()
    }

    fn layout_of(root: &AccessibilityNode) -> TreeLayout {
        let view = RoleFilter::unconstrained().view(root);
        LayoutEngine::default().compute(&view, CANVAS)
    }

    #[test]
    fn single_node_sits_mid_canvas() {
        let root = tree(&[("r", None)]);
        let layout = layout_of(&root);
        // breadth extent 720, s = 1, tx = 1, kx = 720 / 2.
        assert_eq!(layout.position("r"), Some(Point::new(0.0, 360.0)));
        assert!(layout.edges().is_empty());
    }

    #[test]
    fn two_children_span_the_extents() {
        let root = tree(&[("r", None), ("a", Some("r")), ("b", Some("r"))]);
        let layout = layout_of(&root);
        let r = layout.position("r").unwrap();
        let a = layout.position("a").unwrap();
        let b = layout.position("b").unwrap();
        // Depth extent 940 over one level.
        assert_eq!(r.x, 0.0);
        assert_eq!(a.x, 940.0);
        assert_eq!(b.x, 940.0);
        // prelims -0.5, 0.5; s = 0.5 so the leaves land on 1/4 and 3/4.
        assert!((a.y - 180.0).abs() < 1e-3);
        assert!((b.y - 540.0).abs() < 1e-3);
        assert!((r.y - 360.0).abs() < 1e-3);
        assert_eq!(layout.edges().len(), 2);
    }

    #[test]
    fn parent_centered_over_children() {
        let root = tree(&[
            ("r", None),
            ("a", Some("r")),
            ("a1", Some("a")),
            ("a2", Some("a")),
            ("a3", Some("a")),
            ("b", Some("r")),
        ]);
        let layout = layout_of(&root);
        let a = layout.get("a").unwrap();
        let first = layout.position("a1").unwrap();
        let last = layout.position("a3").unwrap();
        assert!((a.position.y - (first.y + last.y) / 2.0).abs() < 1e-3);
        assert!(a.has_visible_children());
        assert!(!layout.get("b").unwrap().has_visible_children());
        assert_eq!(layout.get("a2").unwrap().depth, 2);
    }

    #[test]
    fn empty_layout_for_empty_view() {
        let layout = TreeLayout::default();
        assert!(layout.is_empty());
        assert!(layout.bounds().is_none());
    }

    fn arb_tree() -> impl Strategy<Value = AccessibilityNode> {
        prop::collection::vec(any::<prop::sample::Index>(), 1..80).prop_map(|parents| {
            let nodes: Vec<AccessibilityNodeRaw> = parents
                .into_iter()
                .enumerate()
                .map(|(i, p)| {
                    let raw = AccessibilityNodeRaw::new(format!("n{i}")).with_role("group");
                    if i == 0 {
                        raw
                    } else {
                        raw.with_parent(format!("n{}", p.index(i)))
                    }
                })
                .collect();
            build_tree(&nodes).unwrap()
        })
    }

    proptest! {
        #[test]
        fn layout_is_stable(root in arb_tree()) {
            let a = layout_of(&root);
            let b = layout_of(&root);
            prop_assert_eq!(a.nodes(), b.nodes());
        }

        #[test]
        fn nodes_stay_inside_extents_without_overlap(root in arb_tree()) {
            let layout = layout_of(&root);
            prop_assert_eq!(layout.len(), root.count());
            let mut by_depth: HashMap<usize, Vec<f32>> = HashMap::new();
            for n in layout.nodes() {
                prop_assert!(n.position.x >= -1e-3 && n.position.x <= 940.0 + 1e-3);
                prop_assert!(n.position.y >= -1e-3 && n.position.y <= 720.0 + 1e-3);
                by_depth.entry(n.depth).or_default().push(n.order);
            }
            for orders in by_depth.values_mut() {
                orders.sort_by(|a, b| a.total_cmp(b));
                for pair in orders.windows(2) {
                    prop_assert!(pair[1] - pair[0] > 1e-4);
                }
            }
        }
    }
}
