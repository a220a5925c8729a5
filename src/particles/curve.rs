use eframe::egui::{Vec2, vec2};

/// Control-point offset as a fraction of edge length.
const CURVE_BOW: f32 = 0.18;
/// Edges shorter than this have no usable normal and are not drawn.
pub const MIN_CURVE_LENGTH: f32 = 0.001;

pub fn quadratic_bezier(start: Vec2, control: Vec2, end: Vec2, t: f32) -> Vec2 {
    let inverse = 1.0 - t;
    start * (inverse * inverse) + control * (2.0 * inverse * t) + end * (t * t)
}

/// Bowed quadratic path between two node positions. The bow goes to the
/// left of the travel direction, so `a -> b` and `b -> a` separate.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FlowPath {
    pub start: Vec2,
    pub control: Vec2,
    pub end: Vec2,
}

impl FlowPath {
    pub fn between(start: Vec2, end: Vec2) -> Option<Self> {
        let delta = end - start;
        let length = delta.length();
        if !length.is_finite() || length < MIN_CURVE_LENGTH {
            return None;
        }

        let normal = vec2(-delta.y, delta.x) / length;
        Some(Self {
            start,
            control: start + delta * 0.5 + normal * (length * CURVE_BOW),
            end,
        })
    }

    pub fn with_control_offset(self, offset: Vec2) -> Self {
        Self {
            control: self.control + offset,
            ..self
        }
    }

    pub fn point_at(&self, t: f32) -> Vec2 {
        quadratic_bezier(self.start, self.control, self.end, t)
    }

    /// `segments + 1` evenly spaced points from start to end.
    pub fn sample(&self, segments: usize) -> impl Iterator<Item = Vec2> + '_ {
        let segments = segments.max(1);
        (0..=segments).map(move |step| self.point_at(step as f32 / segments as f32))
    }
}
