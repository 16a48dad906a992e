//! Overview (minimap) painter.
//!
//! Draws the session's [`OverviewMap`](axtree_core::OverviewMap) and reports
//! clicks through `on_navigate`; the host decides what to do with them.

use axtree_core::{NavigateRequest, Point, ViewerSession};
use egui::epaint::CubicBezierShape;
use egui::{Color32, Pos2, Rect, Rounding, Sense, Stroke, Ui, Vec2};

use crate::style;

#[derive(Debug, Clone, Copy, Default)]
pub struct OverviewPanel;

impl OverviewPanel {
    pub fn show<F>(&self, ui: &mut Ui, session: &ViewerSession, on_navigate: F)
    where
        F: FnOnce(NavigateRequest),
    {
        let overview = session.overview();
        let projection = overview.projection();
        let size = Vec2::new(projection.footprint.width, projection.footprint.height);
        let (response, painter) = ui.allocate_painter(size, Sense::click());
        let rect = response.rect;
        let to_local = |p: Point| Pos2::new(rect.min.x + p.x, rect.min.y + p.y);

        painter.rect_filled(rect, Rounding::same(6.0), Color32::WHITE);
        painter.rect_stroke(rect, Rounding::same(6.0), Stroke::new(1.0, style::OVERVIEW_EDGE));
        let painter = painter.with_clip_rect(rect);

        let layout = session.layout();
        let edge = Stroke::new(1.0 * projection.scale, style::OVERVIEW_EDGE);
        for (a, b) in overview.edge_segments(layout) {
            let (a, b) = (to_local(a), to_local(b));
            let mid = (a.x + b.x) / 2.0;
            painter.add(CubicBezierShape::from_points_stroke(
                [a, Pos2::new(mid, a.y), Pos2::new(mid, b.y), b],
                false,
                Color32::TRANSPARENT,
                edge,
            ));
        }

        for dot in overview.dots(layout, session.highlights()) {
            let node = &layout.nodes()[dot.index];
            let stroke = if dot.highlighted {
                Stroke::new(1.2, style::HIGHLIGHT)
            } else {
                Stroke::NONE
            };
            painter.circle(
                to_local(dot.center),
                dot.radius,
                style::role_color(&node.node.role_label()),
                stroke,
            );
        }

        let visible = overview.viewport_indicator(session.viewport().visible_world());
        let indicator = Rect::from_min_max(to_local(visible.min), to_local(visible.max));
        painter.rect(
            indicator.intersect(rect),
            Rounding::ZERO,
            Color32::from_rgba_unmultiplied(37, 99, 235, 24),
            Stroke::new(1.0, Color32::from_rgb(0x25, 0x63, 0xEB)),
        );

        if response.clicked() {
            if let Some(pos) = response.interact_pointer_pos() {
                let local = Point::new(pos.x - rect.min.x, pos.y - rect.min.y);
                overview.activate(layout, local, on_navigate);
            }
        }
    }
}
