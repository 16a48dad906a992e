//! Viewport controller - sole owner of the pan/zoom transform.
//!
//! `screen = world * scale + translate`
//!
//! # Frame Model
//! - Programmatic moves (`fit_to_screen`, `focus_node`) start a timed tween
//! - Gestures (`pan_by`, `zoom_at`) apply immediately and cancel any tween
//! - A newer call always supersedes an in-flight tween (last writer wins)
//! - Call `update(dt)` once per frame before reading `transform()`

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::animation::{Lerp, Tween};
use crate::config::ViewportConfig;
use crate::geometry::{Bounds, Point, Size};
use crate::layout::TreeLayout;

// =============================================================================
// TRANSFORM
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ViewportTransform {
    pub translate_x: f32,
    pub translate_y: f32,
    pub scale: f32,
}

impl Default for ViewportTransform {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl ViewportTransform {
    pub const IDENTITY: Self = Self {
        translate_x: 0.0,
        translate_y: 0.0,
        scale: 1.0,
    };

    pub const fn new(translate_x: f32, translate_y: f32, scale: f32) -> Self {
        Self {
            translate_x,
            translate_y,
            scale,
        }
    }

    pub fn apply(&self, world: Point) -> Point {
        Point::new(
            world.x * self.scale + self.translate_x,
            world.y * self.scale + self.translate_y,
        )
    }

    pub fn invert(&self, screen: Point) -> Point {
        Point::new(
            (screen.x - self.translate_x) / self.scale,
            (screen.y - self.translate_y) / self.scale,
        )
    }

    /// World-space region visible on a canvas of the given size.
    pub fn visible_world(&self, canvas: Size) -> Bounds {
        Bounds::new(
            self.invert(Point::ZERO),
            self.invert(Point::new(canvas.width, canvas.height)),
        )
    }
}

impl Lerp for ViewportTransform {
    fn lerp(self, to: Self, t: f32) -> Self {
        Self {
            translate_x: self.translate_x.lerp(to.translate_x, t),
            translate_y: self.translate_y.lerp(to.translate_y, t),
            scale: self.scale.lerp(to.scale, t),
        }
    }
}

// =============================================================================
// TARGETS
// =============================================================================

/// Transform that centres `bounds` (grown by `padding` in total) on the canvas
/// without zooming past 100%.
pub fn fit_transform(bounds: Bounds, canvas: Size, config: &ViewportConfig) -> ViewportTransform {
    let (w, h) = (bounds.width(), bounds.height());
    let scale = (canvas.width / (w + config.fit_padding))
        .min(canvas.height / (h + config.fit_padding))
        .min(1.0)
        .clamp(config.min_scale, config.max_scale);
    ViewportTransform::new(
        -bounds.min.x * scale + (canvas.width - w * scale) / 2.0,
        -bounds.min.y * scale + (canvas.height - h * scale) / 2.0,
        scale,
    )
}

/// Transform that puts `world` at the canvas centre at the focus scale.
pub fn focus_transform(world: Point, canvas: Size, config: &ViewportConfig) -> ViewportTransform {
    let scale = config.focus_scale.clamp(config.min_scale, config.max_scale);
    let center = canvas.center();
    ViewportTransform::new(center.x - world.x * scale, center.y - world.y * scale, scale)
}

// =============================================================================
// CONTROLLER
// =============================================================================

#[derive(Debug, Clone)]
pub struct ViewportController {
    transform: ViewportTransform,
    transition: Option<Tween<ViewportTransform>>,
    canvas: Size,
    config: ViewportConfig,
}

impl ViewportController {
    pub fn new(canvas: Size, config: ViewportConfig) -> Self {
        Self {
            transform: ViewportTransform::IDENTITY,
            transition: None,
            canvas,
            config,
        }
    }

    /// Most recently committed transform.
    pub fn transform(&self) -> ViewportTransform {
        self.transform
    }

    /// Where the current transition will land, or the current transform.
    pub fn target(&self) -> ViewportTransform {
        self.transition
            .as_ref()
            .map(Tween::target)
            .unwrap_or(self.transform)
    }

    pub fn canvas(&self) -> Size {
        self.canvas
    }

    /// Resizing invalidates a previous fit; callers re-run `fit_to_screen`.
    pub fn set_canvas(&mut self, canvas: Size) {
        self.canvas = canvas;
    }

    pub fn config(&self) -> &ViewportConfig {
        &self.config
    }

    pub fn is_animating(&self) -> bool {
        self.transition.is_some()
    }

    pub fn visible_world(&self) -> Bounds {
        self.transform.visible_world(self.canvas)
    }

    /// Advance the in-flight transition. Returns true while still animating.
    pub fn update(&mut self, dt: f32) -> bool {
        let Some(tween) = self.transition.as_mut() else {
            return false;
        };
        self.transform = tween.update(dt);
        if tween.is_complete() {
            self.transition = None;
        }
        self.transition.is_some()
    }

    /// Jump to the end of the in-flight transition.
    pub fn finish(&mut self) {
        if let Some(tween) = self.transition.take() {
            self.transform = tween.target();
        }
    }

    // =========================================================================
    // PROGRAMMATIC
    // =========================================================================

    /// Animate to fit the whole layout. Returns the target, or `None` for an
    /// empty layout.
    pub fn fit_to_screen(&mut self, layout: &TreeLayout) -> Option<ViewportTransform> {
        let bounds = layout.bounds()?;
        let target = fit_transform(bounds, self.canvas, &self.config);
        debug!(scale = target.scale, "fit to screen");
        self.animate_to(target, self.config.fit_duration_ms);
        Some(target)
    }

    /// Fit without animation (initial placement).
    pub fn fit_immediately(&mut self, layout: &TreeLayout) -> Option<ViewportTransform> {
        let target = self.fit_to_screen(layout)?;
        self.finish();
        Some(target)
    }

    /// Animate to centre the node. Absent ids are a silent no-op (`false`).
    pub fn focus_node(&mut self, layout: &TreeLayout, id: &str) -> bool {
        let Some(world) = layout.position(id) else {
            debug!(id, "focus target not in layout");
            return false;
        };
        let target = focus_transform(world, self.canvas, &self.config);
        self.animate_to(target, self.config.focus_duration_ms);
        true
    }

    pub fn animate_to(&mut self, target: ViewportTransform, duration_ms: u64) {
        let tween = Tween::new(self.transform, target, duration_ms);
        if tween.is_complete() {
            self.transform = target;
            self.transition = None;
        } else {
            self.transition = Some(tween);
        }
    }

    // =========================================================================
    // GESTURES
    // =========================================================================

    /// Drag by a screen-space delta.
    pub fn pan_by(&mut self, dx: f32, dy: f32) {
        self.transition = None;
        self.transform.translate_x += dx;
        self.transform.translate_y += dy;
    }

    /// Multiply the scale by `factor`, keeping `anchor` (screen space) fixed.
    pub fn zoom_at(&mut self, anchor: Point, factor: f32) {
        self.transition = None;
        if !factor.is_finite() || factor <= 0.0 {
            return;
        }
        let world = self.transform.invert(anchor);
        let scale = (self.transform.scale * factor).clamp(self.config.min_scale, self.config.max_scale);
        self.transform = ViewportTransform::new(anchor.x - world.x * scale, anchor.y - world.y * scale, scale);
    }

    /// Wheel input in scroll units; positive zooms in.
    pub fn wheel(&mut self, anchor: Point, delta: f32) {
        self.zoom_at(anchor, (delta * self.config.wheel_zoom_sensitivity).exp());
    }
}
