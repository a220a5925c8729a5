use eframe::egui::{Color32, Pos2, Rect};

use crate::util::stable_hash;

const KIND_PALETTE: [Color32; 10] = [
    Color32::from_rgb(31, 119, 180),
    Color32::from_rgb(255, 127, 14),
    Color32::from_rgb(44, 160, 44),
    Color32::from_rgb(214, 39, 40),
    Color32::from_rgb(148, 103, 189),
    Color32::from_rgb(140, 86, 75),
    Color32::from_rgb(227, 119, 194),
    Color32::from_rgb(127, 127, 127),
    Color32::from_rgb(188, 189, 34),
    Color32::from_rgb(23, 190, 207),
];

pub const CONTAINMENT_COLOR: Color32 = Color32::from_rgba_premultiplied(90, 98, 110, 160);
pub const SYNTHETIC_ROOT_COLOR: Color32 = Color32::from_rgb(96, 104, 118);

pub fn blend_color(base: Color32, overlay: Color32, amount: f32) -> Color32 {
    let amount = amount.clamp(0.0, 1.0);
    let inverse = 1.0 - amount;

    Color32::from_rgba_unmultiplied(
        ((base.r() as f32 * inverse) + (overlay.r() as f32 * amount)) as u8,
        ((base.g() as f32 * inverse) + (overlay.g() as f32 * amount)) as u8,
        ((base.b() as f32 * inverse) + (overlay.b() as f32 * amount)) as u8,
        ((base.a() as f32 * inverse) + (overlay.a() as f32 * amount)) as u8,
    )
}

pub fn with_alpha(color: Color32, alpha: f32) -> Color32 {
    let alpha = (alpha.clamp(0.0, 1.0) * 255.0) as u8;
    Color32::from_rgba_unmultiplied(color.r(), color.g(), color.b(), alpha)
}

pub fn circle_visible(rect: Rect, position: Pos2, radius: f32) -> bool {
    !(position.x + radius < rect.left()
        || position.x - radius > rect.right()
        || position.y + radius < rect.top()
        || position.y - radius > rect.bottom())
}

/// Log-scaled `[0, 1]` position of `weight` within `0..=max`.
fn normalize_weight(weight: u32, max: u32) -> f32 {
    if max == 0 {
        return 0.0;
    }

    let denominator = (max as f64 + 1.0).ln();
    if denominator.abs() < f64::EPSILON {
        return 0.0;
    }

    ((weight as f64 + 1.0).ln() / denominator).clamp(0.0, 1.0) as f32
}

pub fn node_radius(weight: u32, max: u32) -> f32 {
    6.0 + (normalize_weight(weight, max) * 18.0)
}

pub fn weight_color(weight: u32, max: u32) -> Color32 {
    let t = normalize_weight(weight, max);
    let r = (55.0 + (190.0 * t)) as u8;
    let g = (150.0 - (70.0 * t)) as u8;
    let b = (215.0 - (155.0 * t)) as u8;
    Color32::from_rgb(r, g, b)
}

/// Stable colour per relation kind.
pub fn kind_color(kind: &str) -> Color32 {
    KIND_PALETTE[(stable_hash(kind) % KIND_PALETTE.len() as u64) as usize]
}

#[cfg(test)]
mod tests {
    use eframe::egui::pos2;

    use super::*;

    #[test]
    fn radius_grows_with_weight() {
        assert_eq!(node_radius(0, 0), 6.0);
        assert!(node_radius(1, 10) < node_radius(10, 10));
        assert_eq!(node_radius(10, 10), 24.0);
    }

    #[test]
    fn kind_colors_are_stable() {
        assert_eq!(kind_color("isRelatedTo"), kind_color("isRelatedTo"));
    }

    #[test]
    fn circle_visibility_accounts_for_radius() {
        let rect = Rect::from_min_max(pos2(0.0, 0.0), pos2(100.0, 100.0));
        assert!(circle_visible(rect, pos2(-5.0, 50.0), 10.0));
        assert!(!circle_visible(rect, pos2(-20.0, 50.0), 10.0));
    }
}
