//! R-tree over laid-out nodes for hit testing and culling.
//!
//! Entries live in world space; callers convert screen points with the
//! current [`ViewportTransform`](crate::viewport::ViewportTransform) first.

use rstar::{PointDistance, RTree, RTreeObject, AABB};

use crate::geometry::{Bounds, Point};
use crate::layout::TreeLayout;

/// One node disc in the index.
#[derive(Debug, Clone, PartialEq)]
pub struct NodeDisc {
    /// Index into [`TreeLayout::nodes`].
    pub index: usize,
    pub center: [f32; 2],
    pub radius: f32,
}

impl NodeDisc {
    pub fn new(index: usize, center: Point, radius: f32) -> Self {
        Self {
            index,
            center: [center.x, center.y],
            radius,
        }
    }

    /// Distance from `point` to the disc edge, zero inside.
    fn edge_distance(&self, point: [f32; 2]) -> f32 {
        let dx = point[0] - self.center[0];
        let dy = point[1] - self.center[1];
        ((dx * dx + dy * dy).sqrt() - self.radius).max(0.0)
    }
}

impl RTreeObject for NodeDisc {
    type Envelope = AABB<[f32; 2]>;

    fn envelope(&self) -> Self::Envelope {
        AABB::from_corners(
            [self.center[0] - self.radius, self.center[1] - self.radius],
            [self.center[0] + self.radius, self.center[1] + self.radius],
        )
    }
}

impl PointDistance for NodeDisc {
    fn distance_2(&self, point: &[f32; 2]) -> f32 {
        let d = self.edge_distance(*point);
        d * d
    }

    fn contains_point(&self, point: &[f32; 2]) -> bool {
        self.edge_distance(*point) <= 0.0
    }
}

#[derive(Clone, Default)]
pub struct SpatialIndex {
    tree: RTree<NodeDisc>,
}

impl std::fmt::Debug for SpatialIndex {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SpatialIndex")
            .field("count", &self.tree.size())
            .finish_non_exhaustive()
    }
}

impl SpatialIndex {
    /// Index every node of `layout` as a disc of `radius` world units.
    pub fn from_layout(layout: &TreeLayout, radius: f32) -> Self {
        let discs = layout
            .nodes()
            .iter()
            .enumerate()
            .map(|(i, n)| NodeDisc::new(i, n.position, radius))
            .collect();
        Self {
            tree: RTree::bulk_load(discs),
        }
    }

    pub fn len(&self) -> usize {
        self.tree.size()
    }

    pub fn is_empty(&self) -> bool {
        self.tree.size() == 0
    }

    /// Closest disc within `threshold` of `point`.
    pub fn hit_test(&self, point: Point, threshold: f32) -> Option<&NodeDisc> {
        let p = [point.x, point.y];
        let search = AABB::from_corners(
            [p[0] - threshold, p[1] - threshold],
            [p[0] + threshold, p[1] + threshold],
        );
        self.tree
            .locate_in_envelope_intersecting(&search)
            .map(|disc| (disc.edge_distance(p), disc))
            .filter(|(d, _)| *d <= threshold)
            .min_by(|a, b| a.0.total_cmp(&b.0).then(a.1.index.cmp(&b.1.index)))
            .map(|(_, disc)| disc)
    }

    /// Discs touching a world-space region, e.g. the visible viewport.
    pub fn query(&self, region: Bounds) -> impl Iterator<Item = &NodeDisc> {
        let envelope = AABB::from_corners([region.min.x, region.min.y], [region.max.x, region.max.y]);
        self.tree.locate_in_envelope_intersecting(&envelope)
    }

    pub fn nearest(&self, point: Point) -> Option<&NodeDisc> {
        self.tree.nearest_neighbor(&[point.x, point.y])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filter::RoleFilter;
    use crate::geometry::Size;
    use crate::layout::LayoutEngine;
    use axtree_snapshot::{build_tree, AccessibilityNodeRaw};

    fn discs() -> SpatialIndex {
        SpatialIndex {
            tree: RTree::bulk_load(vec![
                NodeDisc::new(0, Point::new(0.0, 0.0), 8.0),
                NodeDisc::new(1, Point::new(50.0, 0.0), 8.0),
                NodeDisc::new(2, Point::new(100.0, 0.0), 8.0),
            ]),
        }
    }

    #[test]
    fn empty_index_misses() {
        let index = SpatialIndex::default();
        assert!(index.is_empty());
        assert!(index.hit_test(Point::ZERO, 10.0).is_none());
    }

    #[test]
    fn hit_picks_closest_within_threshold() {
        let index = discs();
        assert_eq!(index.hit_test(Point::new(47.0, 0.0), 4.0).map(|d| d.index), Some(1));
        assert_eq!(index.hit_test(Point::new(62.0, 0.0), 4.0).map(|d| d.index), Some(1));
        assert!(index.hit_test(Point::new(75.0, 0.0), 4.0).is_none());
        assert_eq!(index.nearest(Point::new(90.0, 30.0)).map(|d| d.index), Some(2));
    }

    #[test]
    fn query_returns_region_members() {
        let index = discs();
        let region = Bounds::new(Point::new(40.0, -5.0), Point::new(120.0, 5.0));
        let mut hits: Vec<usize> = index.query(region).map(|d| d.index).collect();
        hits.sort_unstable();
        assert_eq!(hits, vec![1, 2]);
    }

    #[test]
    fn indexes_layout_nodes() {
        let nodes = vec![
            AccessibilityNodeRaw::new("r").with_role("main"),
            AccessibilityNodeRaw::new("a").with_role("link").with_parent("r"),
        ];
        let root = build_tree(&nodes).unwrap();
        let layout =
            LayoutEngine::default().compute(&RoleFilter::unconstrained().view(&root), Size::new(1200.0, 800.0));
        let index = SpatialIndex::from_layout(&layout, 8.0);
        assert_eq!(index.len(), 2);
        let a = layout.position("a").unwrap();
        let hit = index.hit_test(a, 1.0).unwrap();
        assert_eq!(layout.nodes()[hit.index].id(), "a");
    }
}
