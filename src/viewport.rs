use eframe::egui::{Pos2, Vec2, pos2, vec2};

use crate::config::ZoomBounds;

/// Smallest model-space extent used when fitting a degenerate box.
const MIN_FIT_EXTENT: f32 = 1.0;
const MIN_FIT_SCALE: f32 = 1e-4;

/// Model → screen mapping: `screen = model * scale + (x, y)`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Transform {
    pub x: f32,
    pub y: f32,
    pub scale: f32,
}

impl Default for Transform {
    fn default() -> Self {
        Self {
            x: 0.0,
            y: 0.0,
            scale: 1.0,
        }
    }
}

impl Transform {
    pub fn to_screen(&self, model: Vec2) -> Pos2 {
        pos2(model.x * self.scale + self.x, model.y * self.scale + self.y)
    }

    pub fn to_model(&self, screen: Pos2) -> Vec2 {
        vec2((screen.x - self.x) / self.scale, (screen.y - self.y) / self.scale)
    }
}

/// Converts a raw wheel delta into a bounded multiplicative zoom step.
pub fn wheel_zoom_factor(scroll: f32) -> f32 {
    (1.0 + (scroll * 0.0018)).clamp(0.85, 1.15)
}

/// Sole writer of the view transform. Every call applies immediately.
#[derive(Clone, Debug)]
pub struct Viewport {
    transform: Transform,
    zoom_bounds: ZoomBounds,
}

impl Viewport {
    pub fn new(zoom_bounds: ZoomBounds) -> Self {
        Self {
            transform: Transform::default(),
            zoom_bounds,
        }
    }

    pub fn transform(&self) -> Transform {
        self.transform
    }

    pub fn zoom_bounds(&self) -> ZoomBounds {
        self.zoom_bounds
    }

    pub fn pan(&mut self, dx: f32, dy: f32) {
        if !dx.is_finite() || !dy.is_finite() {
            return;
        }
        self.transform.x += dx;
        self.transform.y += dy;
    }

    /// Scales around the cursor: the model point under `cursor` stays there.
    pub fn zoom(&mut self, cursor: Pos2, delta_factor: f32) {
        if !(delta_factor > 0.0) || !delta_factor.is_finite() {
            return;
        }

        // A fit may leave the scale outside the configured bounds; zooming
        // further out (or in) from there must not snap back across them.
        let scale = self.transform.scale;
        let bounds = ZoomBounds {
            min: self.zoom_bounds.min.min(scale),
            max: self.zoom_bounds.max.max(scale),
        };
        let new_scale = bounds.clamp(scale * delta_factor);
        let ratio = new_scale / scale;

        self.transform.x = cursor.x - (cursor.x - self.transform.x) * ratio;
        self.transform.y = cursor.y - (cursor.y - self.transform.y) * ratio;
        self.transform.scale = new_scale;
    }

    /// Shows every position, padded by `padding` model units per side,
    /// centred in `container`. Never magnifies beyond 1:1. Returns `false`
    /// (leaving the transform alone) when there is nothing to fit.
    pub fn fit_to_view(
        &mut self,
        positions: impl IntoIterator<Item = Vec2>,
        container: Vec2,
        padding: f32,
    ) -> bool {
        let mut min = vec2(f32::INFINITY, f32::INFINITY);
        let mut max = vec2(f32::NEG_INFINITY, f32::NEG_INFINITY);
        for position in positions {
            min = min.min(position);
            max = max.max(position);
        }

        if !min.x.is_finite() || !min.y.is_finite() || !max.x.is_finite() || !max.y.is_finite() {
            return false;
        }

        let padding = padding.max(0.0);
        let width = (max.x - min.x + padding * 2.0).max(MIN_FIT_EXTENT);
        let height = (max.y - min.y + padding * 2.0).max(MIN_FIT_EXTENT);
        let container = container.max(vec2(1.0, 1.0));

        let scale = (container.x / width)
            .min(container.y / height)
            .min(1.0)
            .max(MIN_FIT_SCALE);
        let center = (min + max) * 0.5;

        self.transform = Transform {
            x: container.x * 0.5 - center.x * scale,
            y: container.y * 0.5 - center.y * scale,
            scale,
        };
        true
    }

    /// Moves the view so `model` sits at the centre of `container`, keeping
    /// the scale.
    pub fn center_on(&mut self, model: Vec2, container: Vec2) {
        let scale = self.transform.scale;
        self.transform.x = container.x * 0.5 - model.x * scale;
        self.transform.y = container.y * 0.5 - model.y * scale;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn viewport() -> Viewport {
        Viewport::new(ZoomBounds::default())
    }

    #[test]
    fn pan_translates() {
        let mut viewport = viewport();
        viewport.pan(12.0, -4.0);
        viewport.pan(3.0, 1.0);
        assert_eq!(viewport.transform().x, 15.0);
        assert_eq!(viewport.transform().y, -3.0);
    }

    #[test]
    fn zoom_keeps_cursor_anchored() {
        let mut viewport = viewport();
        viewport.pan(40.0, 25.0);
        let cursor = pos2(200.0, 120.0);
        let anchored = viewport.transform().to_model(cursor);

        viewport.zoom(cursor, 1.5);
        let after = viewport.transform().to_screen(anchored);
        assert!((after.x - cursor.x).abs() < 1e-3);
        assert!((after.y - cursor.y).abs() < 1e-3);
        assert_eq!(viewport.transform().scale, 1.5);
    }

    #[test]
    fn zoom_is_clamped_to_bounds() {
        let mut viewport = viewport();
        viewport.zoom(pos2(0.0, 0.0), 1000.0);
        assert_eq!(viewport.transform().scale, 10.0);
        viewport.zoom(pos2(0.0, 0.0), 0.00001);
        assert_eq!(viewport.transform().scale, 0.1);
    }

    #[test]
    fn zoom_ignores_invalid_factors() {
        let mut viewport = viewport();
        viewport.zoom(pos2(5.0, 5.0), 0.0);
        viewport.zoom(pos2(5.0, 5.0), f32::NAN);
        assert_eq!(viewport.transform(), Transform::default());
    }

    #[test]
    fn zoom_out_after_a_wide_fit_never_grows() {
        let mut viewport = viewport();
        viewport.fit_to_view(
            [vec2(-20000.0, 0.0), vec2(20000.0, 100.0)],
            vec2(800.0, 600.0),
            40.0,
        );
        let fitted = viewport.transform().scale;
        assert!(fitted < viewport.zoom_bounds().min);

        viewport.zoom(pos2(400.0, 300.0), 0.85);
        assert!(viewport.transform().scale <= fitted);

        viewport.zoom(pos2(400.0, 300.0), 1.15);
        assert!(viewport.transform().scale > fitted);
    }

    #[test]
    fn center_on_keeps_scale() {
        let mut viewport = viewport();
        viewport.zoom(pos2(0.0, 0.0), 2.0);
        viewport.center_on(vec2(30.0, -10.0), vec2(400.0, 200.0));
        let transform = viewport.transform();
        assert_eq!(transform.scale, 2.0);
        assert_eq!(transform.to_screen(vec2(30.0, -10.0)), pos2(200.0, 100.0));
    }

    #[test]
    fn fit_never_magnifies_small_graphs() {
        let mut viewport = viewport();
        let fitted = viewport.fit_to_view(
            [vec2(0.0, 0.0), vec2(10.0, 10.0)],
            vec2(800.0, 600.0),
            5.0,
        );
        assert!(fitted);
        let transform = viewport.transform();
        assert_eq!(transform.scale, 1.0);
        assert_eq!(transform.to_screen(vec2(5.0, 5.0)), pos2(400.0, 300.0));
    }

    #[test]
    fn fit_shrinks_large_graphs() {
        let mut viewport = viewport();
        viewport.fit_to_view(
            [vec2(-1000.0, 0.0), vec2(1000.0, 100.0)],
            vec2(500.0, 500.0),
            0.0,
        );
        assert_eq!(viewport.transform().scale, 0.25);
    }

    #[test]
    fn fit_handles_single_point_and_empty_input() {
        let mut viewport = viewport();
        assert!(!viewport.fit_to_view(Vec::new(), vec2(100.0, 100.0), 10.0));
        assert!(viewport.fit_to_view([vec2(7.0, 7.0)], vec2(100.0, 100.0), 0.0));
        assert_eq!(
            viewport.transform().to_screen(vec2(7.0, 7.0)),
            pos2(50.0, 50.0)
        );
    }
}
