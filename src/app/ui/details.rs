use eframe::egui::{RichText, Ui};
use skill_flow::{HitTarget, HoverInfo};

use super::super::ViewModel;

impl ViewModel {
    pub(in crate::app) fn draw_details(&mut self, ui: &mut Ui) {
        ui.heading("Focus Details");
        ui.add_space(6.0);

        if let Some(message) = &self.reload_error {
            let color = ui.visuals().error_fg_color;
            ui.colored_label(color, format!("Reload failed: {message}"));
            ui.separator();
        }

        let context = self.engine.focus_context();
        match &context.focus {
            Some(focus) => {
                let model = self.engine.model();
                ui.label(RichText::new(model.catalog.display_name(focus)).strong());
                ui.small(focus.as_str());
                ui.label(format!("Weight: {}", model.weights.get(focus)));
                ui.label(format!("Connections: {}", model.connection_count(focus)));
                ui.label(format!("Reachable skills: {}", self.engine.tree().len()));
            }
            None => {
                ui.label("Full hierarchy. Click a skill to drill into its relations.");
            }
        }
        if let Some(filter) = &context.filter {
            ui.label(format!("Weighted by {}: {}", filter.kind, filter.id));
        }

        ui.separator();
        ui.label(RichText::new("Under the pointer").strong());
        match self.engine.hover() {
            Some(HoverInfo::Node {
                id,
                display_name,
                weight,
                connections,
            }) => {
                ui.label(display_name.as_str());
                ui.small(id.as_str());
                ui.label(format!("Weight {weight}, {connections} connection(s)"));
            }
            Some(HoverInfo::Edge {
                from,
                to,
                kind,
                strength,
                ..
            }) => {
                let catalog = &self.engine.model().catalog;
                ui.label(format!(
                    "{} -> {}",
                    catalog.display_name(from),
                    catalog.display_name(to)
                ));
                ui.label(format!("{kind}, strength {strength:.1}"));
            }
            None => {
                ui.label("Nothing hovered.");
            }
        }

        ui.separator();
        ui.label(RichText::new("Last click").strong());
        let text = match &self.last_click {
            Some(HitTarget::Node(id)) => format!("Skill {id}"),
            Some(HitTarget::Edge(index)) => self.edge_label(*index),
            Some(HitTarget::Particle(hit)) => {
                format!("Particle #{} on {}", hit.particle_id, self.edge_label(hit.edge))
            }
            Some(HitTarget::Background) => "Background".to_owned(),
            None => "None yet.".to_owned(),
        };
        ui.label(text);

        ui.separator();
        let particles = self.engine.particles();
        ui.label(format!(
            "Particles: {} live of {} ({} flows)",
            particles.len(),
            particles.cap(),
            particles.flows().len()
        ));
        let transform = self.engine.transform();
        ui.label(format!(
            "View: scale {:.2}, offset ({:.0}, {:.0})",
            transform.scale, transform.x, transform.y
        ));
    }

    fn edge_label(&self, index: usize) -> String {
        match self.engine.model().edges.get(index) {
            Some(edge) => format!("{} -{}-> {}", edge.from, edge.kind, edge.to),
            None => format!("edge {index}"),
        }
    }
}
