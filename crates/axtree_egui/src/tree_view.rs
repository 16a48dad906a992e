//! Main tree view: edges, node markers, labels and pan/zoom input.
//!
//! Reads the session's transform every frame and forwards gestures to the
//! session's viewport controller; it never stores a transform of its own.

use axtree_core::spatial::SpatialIndex;
use axtree_core::{Point, Size, ViewerSession};
use egui::epaint::CubicBezierShape;
use egui::{Align2, Color32, FontId, Pos2, Rect, Response, Sense, Stroke, Ui, Vec2};

use crate::style;

/// Labels smaller than this many pixels are skipped.
const MIN_LABEL_PX: f32 = 4.0;

/// What happened in the view this frame.
#[derive(Debug, Default)]
pub struct TreeViewOutput {
    /// Node id clicked this frame; `Some(None)` for a click on empty canvas.
    pub clicked: Option<Option<String>>,
    pub response: Option<Response>,
}

#[derive(Debug, Clone)]
pub struct TreeView {
    show_labels: bool,
}

impl Default for TreeView {
    fn default() -> Self {
        Self::new()
    }
}

impl TreeView {
    pub fn new() -> Self {
        Self { show_labels: true }
    }

    pub fn with_labels(mut self, show: bool) -> Self {
        self.show_labels = show;
        self
    }

    pub fn show(&self, ui: &mut Ui, session: &mut ViewerSession) -> TreeViewOutput {
        let (response, painter) = ui.allocate_painter(ui.available_size(), Sense::click_and_drag());
        let rect = response.rect;
        session.set_canvas(Size::new(rect.width(), rect.height()));

        self.handle_input(ui, &response, session);

        painter.rect_filled(rect, 0.0, Color32::from_gray(250));
        self.paint(&painter, rect, session);

        let mut output = TreeViewOutput::default();
        if response.clicked() {
            if let Some(pos) = response.interact_pointer_pos() {
                output.clicked = Some(pick(session, rect, pos));
            }
        }
        output.response = Some(response);
        output
    }

    fn handle_input(&self, ui: &Ui, response: &Response, session: &mut ViewerSession) {
        if response.dragged() {
            let delta = response.drag_delta();
            session.pan_by(delta.x, delta.y);
        }
        if let Some(hover) = response.hover_pos() {
            let anchor = Point::new(hover.x - response.rect.min.x, hover.y - response.rect.min.y);
            let (scroll, pinch) = ui.input(|i| (i.smooth_scroll_delta.y, i.zoom_delta()));
            if scroll != 0.0 {
                session.wheel(anchor, scroll);
            }
            if pinch != 1.0 {
                session.zoom_at(anchor, pinch);
            }
        }
    }

    fn paint(&self, painter: &egui::Painter, rect: Rect, session: &ViewerSession) {
        let transform = session.transform();
        let to_screen = |p: Point| {
            let s = transform.apply(p);
            Pos2::new(rect.min.x + s.x, rect.min.y + s.y)
        };
        let layout = session.layout();
        let scale = transform.scale;
        let cull = rect.expand(style::NODE_RADIUS * scale + 200.0);

        // Edges: horizontal cubic links.
        let edge = Stroke::new(style::edge_stroke().width * scale, style::EDGE);
        for &e in layout.edges() {
            let (a, b) = layout.edge_points(e);
            let (a, b) = (to_screen(a), to_screen(b));
            if !cull.contains(a) && !cull.contains(b) {
                continue;
            }
            let mid = (a.x + b.x) / 2.0;
            painter.add(CubicBezierShape::from_points_stroke(
                [a, Pos2::new(mid, a.y), Pos2::new(mid, b.y), b],
                false,
                Color32::TRANSPARENT,
                edge,
            ));
        }

        // Nodes.
        let highlights = session.highlights();
        let label_px = style::LABEL_SIZE * scale;
        for node in layout.nodes() {
            let role_key = node.node.role_key();
            if !style::draws_marker(&role_key) {
                continue;
            }
            let center = to_screen(node.position);
            if !cull.contains(center) {
                continue;
            }
            let highlighted = highlights.contains(node.id());
            let ring = style::node_stroke(highlighted, node.node.ignored);
            painter.circle(
                center,
                style::NODE_RADIUS * scale,
                style::role_color(&node.node.role_label()),
                Stroke::new(ring.width * scale, ring.color),
            );
            if session.selected() == Some(node.id()) {
                painter.circle_stroke(
                    center,
                    (style::NODE_RADIUS + 4.0) * scale,
                    Stroke::new(1.5, Color32::from_rgb(0x25, 0x63, 0xEB)),
                );
            }

            if self.show_labels && label_px >= MIN_LABEL_PX {
                let text = style::node_label(&node.node.role_label(), &node.node.name_label());
                let (offset, align) = if node.has_visible_children() {
                    (-style::LABEL_OFFSET * scale, Align2::RIGHT_CENTER)
                } else {
                    (style::LABEL_OFFSET * scale, Align2::LEFT_CENTER)
                };
                painter.text(
                    center + Vec2::new(offset, 0.0),
                    align,
                    text,
                    FontId::proportional(label_px),
                    style::LABEL,
                );
            }
        }

        // Playback flash on top of everything.
        if let Some(center) = session.flashing().and_then(|id| layout.position(id)) {
            painter.circle_stroke(
                to_screen(center),
                (style::NODE_RADIUS + 6.0) * scale,
                Stroke::new(3.0, style::HIGHLIGHT),
            );
        }
    }
}

/// Marker under a screen position, if any.
fn pick(session: &ViewerSession, rect: Rect, pos: Pos2) -> Option<String> {
    let transform = session.transform();
    let world = transform.invert(Point::new(pos.x - rect.min.x, pos.y - rect.min.y));
    let layout = session.layout();
    let index = SpatialIndex::from_layout(layout, style::NODE_RADIUS);
    let hit = index.hit_test(world, 2.0 / transform.scale)?;
    let node = layout.nodes().get(hit.index)?;
    style::draws_marker(&node.node.role_key()).then(|| node.id().to_string())
}
