use eframe::egui::vec2;

use crate::config::NodeSpacing;
use crate::model::SkillTree;

/// Tidy top-down placement.
///
/// Leaves take consecutive slots left to right, `spacing.horizontal` apart;
/// a parent sits at the midpoint of its first and last child. The whole tree
/// is shifted horizontally so the root lands on `center_x`.
pub fn layout_hierarchical(tree: &mut SkillTree, spacing: NodeSpacing, center_x: f32) {
    let order = tree.preorder();
    if order.is_empty() {
        return;
    }

    let depths = tree.depths();
    let mut xs = vec![0.0_f32; tree.len()];

    let mut cursor = 0.0_f32;
    for &index in &order {
        if tree.nodes()[index].children.is_empty() {
            xs[index] = cursor;
            cursor += spacing.horizontal;
        }
    }

    for &index in order.iter().rev() {
        let children = &tree.nodes()[index].children;
        if let (Some(&first), Some(&last)) = (children.first(), children.last()) {
            xs[index] = (xs[first] + xs[last]) * 0.5;
        }
    }

    let shift = center_x - xs[order[0]];
    for &index in &order {
        let y = depths[index] as f32 * spacing.vertical;
        tree.set_position(index, vec2(xs[index] + shift, y));
    }
}
