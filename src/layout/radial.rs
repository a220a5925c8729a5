use std::f32::consts::TAU;

use eframe::egui::{Vec2, vec2};

use crate::model::SkillTree;

/// Angular slot a node receives from its parent.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RadialSlot {
    pub depth: usize,
    pub arc_start: f32,
    pub arc: f32,
    pub radius: f32,
}

impl RadialSlot {
    pub fn angle(&self) -> f32 {
        self.arc_start + self.arc * 0.5
    }

    fn offset(&self) -> Vec2 {
        let angle = self.angle();
        vec2(angle.cos(), angle.sin()) * self.radius
    }
}

/// Ring radius for a depth; rings widen with depth so they never overlap.
pub fn ring_radius(depth: usize, base_radius: f32) -> f32 {
    if depth == 0 {
        0.0
    } else {
        base_radius * (1.8 * (depth - 1) as f32 + 1.0)
    }
}

fn slot(depth: usize, arc_start: f32, arc: f32, base_radius: f32) -> RadialSlot {
    RadialSlot {
        depth,
        arc_start,
        arc,
        radius: ring_radius(depth, base_radius),
    }
}

/// Computes every node's slot, index-aligned with the tree arena. Nodes not
/// reachable from the root get `None`.
pub fn radial_slots(tree: &SkillTree, base_radius: f32) -> Vec<Option<RadialSlot>> {
    let mut slots = vec![None; tree.len()];
    let Some(root) = tree.root() else {
        return slots;
    };

    let mut pending = vec![(root, slot(0, 0.0, TAU, base_radius))];
    while let Some((index, assigned)) = pending.pop() {
        slots[index] = Some(assigned);

        let children = &tree.nodes()[index].children;
        if children.is_empty() {
            continue;
        }

        let child_arc = assigned.arc / children.len() as f32;
        let mut cursor = assigned.arc_start;
        for &child in children {
            pending.push((child, slot(assigned.depth + 1, cursor, child_arc, base_radius)));
            cursor += child_arc;
        }
    }

    slots
}

/// Places the root at `center` and every other node on its depth ring.
pub fn layout_radial(tree: &mut SkillTree, center: Vec2, base_radius: f32) {
    let slots = radial_slots(tree, base_radius);
    for (index, slot) in slots.into_iter().enumerate() {
        if let Some(slot) = slot {
            tree.set_position(index, center + slot.offset());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn star(children: usize) -> SkillTree {
        let mut tree = SkillTree::default();
        let root = tree.insert("hub", "hub", 0);
        tree.set_root(root);
        for index in 0..children {
            let child = tree.insert(&format!("leaf{index}"), "leaf", 0);
            tree.attach(root, child);
        }
        tree
    }

    #[test]
    fn root_is_pinned_to_center() {
        let mut tree = star(3);
        layout_radial(&mut tree, vec2(400.0, 300.0), 50.0);
        assert_eq!(tree.nodes()[0].position, vec2(400.0, 300.0));
    }

    #[test]
    fn children_split_parent_arc_evenly() {
        let tree = star(4);
        let slots = radial_slots(&tree, 50.0);
        for slot in slots.iter().skip(1) {
            let slot = slot.unwrap();
            assert!((slot.arc - TAU / 4.0).abs() < 1e-5);
            assert_eq!(slot.radius, 50.0);
        }
    }

    #[test]
    fn ring_radius_grows_with_depth() {
        assert_eq!(ring_radius(0, 10.0), 0.0);
        assert_eq!(ring_radius(1, 10.0), 10.0);
        assert!((ring_radius(2, 10.0) - 28.0).abs() < 1e-4);
    }

    #[test]
    fn lone_root_has_no_children_to_divide_among() {
        let mut tree = SkillTree::singleton("x", "x", 0);
        layout_radial(&mut tree, vec2(10.0, 10.0), 50.0);
        assert_eq!(tree.nodes()[0].position, vec2(10.0, 10.0));
    }
}
