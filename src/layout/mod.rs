//! Node placement. Both algorithms recompute every position from scratch.

mod hierarchical;
mod radial;

use eframe::egui::Vec2;
use log::debug;

use crate::config::{EngineConfig, LayoutAlgorithm, NodeSpacing};
use crate::model::SkillTree;

pub use hierarchical::layout_hierarchical;
pub use radial::{RadialSlot, layout_radial, radial_slots, ring_radius};

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct LayoutParams {
    pub container: Vec2,
    pub spacing: NodeSpacing,
    pub radial_base_radius: f32,
}

impl LayoutParams {
    pub fn from_config(config: &EngineConfig, container: Vec2) -> Self {
        Self {
            container,
            spacing: config.node_spacing,
            radial_base_radius: config.radial_base_radius,
        }
    }
}

pub fn layout(tree: &mut SkillTree, algorithm: LayoutAlgorithm, params: &LayoutParams) {
    match algorithm {
        LayoutAlgorithm::Hierarchical => {
            layout_hierarchical(tree, params.spacing, params.container.x * 0.5);
        }
        LayoutAlgorithm::Radial => {
            layout_radial(tree, params.container * 0.5, params.radial_base_radius);
        }
    }
    debug!("{} layout placed {} node(s)", algorithm.label(), tree.len());
}
