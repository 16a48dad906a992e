//! Overview (minimap) projection.
//!
//! The overview draws the same layout at a fixed small scale and never
//! touches the viewport: activating a point yields a [`NavigateRequest`] that
//! is handed to the host's `on_navigate` callback.
//!
//! ```text
//!   local = inset + world * scale
//!   scale = min((footprint.w - 2 * inset) / max(1, max world x),
//!               (footprint.h - 2 * inset) / max(1, max world y))
//! ```
//!
//! The inset is reserved on both sides, so the deepest and widest nodes land
//! `inset` away from the far edges and their dots stay inside the footprint.

use serde::{Deserialize, Serialize};

use crate::config::MinimapConfig;
use crate::geometry::{Bounds, Point, Size};
use crate::layout::TreeLayout;
use crate::search::HighlightSet;
use crate::spatial::SpatialIndex;

/// Ask the viewport owner to focus a node.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NavigateRequest {
    pub node_id: String,
}

/// Overview footprint for a canvas: a fixed fraction clamped to a range.
pub fn footprint(canvas: Size, config: &MinimapConfig) -> Size {
    Size::new(
        (canvas.width * config.ratio).clamp(config.min_width, config.max_width),
        (canvas.height * config.ratio).clamp(config.min_height, config.max_height),
    )
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct OverviewProjection {
    pub footprint: Size,
    pub scale: f32,
    pub inset: f32,
}

impl OverviewProjection {
    pub fn for_layout(layout: &TreeLayout, canvas: Size, config: &MinimapConfig) -> Self {
        let footprint = footprint(canvas, config);
        let (max_x, max_y) = layout
            .nodes()
            .iter()
            .fold((0.0f32, 0.0f32), |(x, y), n| (x.max(n.position.x), y.max(n.position.y)));
        let usable_w = (footprint.width - 2.0 * config.inset).max(0.0);
        let usable_h = (footprint.height - 2.0 * config.inset).max(0.0);
        let scale = (usable_w / max_x.max(1.0)).min(usable_h / max_y.max(1.0));
        Self {
            footprint,
            scale,
            inset: config.inset,
        }
    }

    /// World point to overview-local point.
    pub fn project(&self, world: Point) -> Point {
        Point::new(
            self.inset + world.x * self.scale,
            self.inset + world.y * self.scale,
        )
    }

    pub fn unproject(&self, local: Point) -> Point {
        Point::new(
            (local.x - self.inset) / self.scale,
            (local.y - self.inset) / self.scale,
        )
    }

    pub fn project_bounds(&self, world: Bounds) -> Bounds {
        Bounds::new(self.project(world.min), self.project(world.max))
    }
}

/// One node as drawn on the overview.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OverviewDot {
    /// Index into [`TreeLayout::nodes`].
    pub index: usize,
    pub center: Point,
    pub radius: f32,
    pub highlighted: bool,
}

/// Overview of one layout: projection, dot geometry and hit testing.
#[derive(Debug, Clone)]
pub struct OverviewMap {
    projection: OverviewProjection,
    index: SpatialIndex,
    node_radius: f32,
    highlight_radius: f32,
    /// Extra pick tolerance in overview pixels.
    pick_slop: f32,
}

impl OverviewMap {
    pub fn new(layout: &TreeLayout, canvas: Size, config: &MinimapConfig) -> Self {
        Self {
            projection: OverviewProjection::for_layout(layout, canvas, config),
            index: SpatialIndex::from_layout(layout, 0.0),
            node_radius: config.node_radius,
            highlight_radius: config.highlight_radius,
            pick_slop: 3.0,
        }
    }

    pub fn projection(&self) -> &OverviewProjection {
        &self.projection
    }

    pub fn dots(&self, layout: &TreeLayout, highlights: &HighlightSet) -> Vec<OverviewDot> {
        layout
            .nodes()
            .iter()
            .enumerate()
            .map(|(index, n)| {
                let highlighted = highlights.contains(n.id());
                OverviewDot {
                    index,
                    center: self.projection.project(n.position),
                    radius: if highlighted {
                        self.highlight_radius
                    } else {
                        self.node_radius
                    },
                    highlighted,
                }
            })
            .collect()
    }

    /// Edge endpoints in overview space.
    pub fn edge_segments<'a>(&'a self, layout: &'a TreeLayout) -> impl Iterator<Item = (Point, Point)> + 'a {
        layout.edges().iter().map(move |&e| {
            let (a, b) = layout.edge_points(e);
            (self.projection.project(a), self.projection.project(b))
        })
    }

    /// Main-view visible region as an overview rectangle.
    pub fn viewport_indicator(&self, visible_world: Bounds) -> Bounds {
        self.projection.project_bounds(visible_world)
    }

    /// Node under an overview-local point.
    pub fn hit(&self, layout: &TreeLayout, local: Point) -> Option<NavigateRequest> {
        if self.projection.scale <= 0.0 {
            return None;
        }
        let world = self.projection.unproject(local);
        let threshold = (self.highlight_radius + self.pick_slop) / self.projection.scale;
        let disc = self.index.hit_test(world, threshold)?;
        layout.nodes().get(disc.index).map(|n| NavigateRequest {
            node_id: n.id().to_string(),
        })
    }

    /// Hit-test and, on a hit, hand the request to `on_navigate`.
    pub fn activate<F>(&self, layout: &TreeLayout, local: Point, on_navigate: F) -> bool
    where
        F: FnOnce(NavigateRequest),
    {
        match self.hit(layout, local) {
            Some(request) => {
                on_navigate(request);
                true
            }
            None => false,
        }
    }
}
