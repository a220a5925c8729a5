use eframe::egui::{self, Ui};
use fuzzy_matcher::FuzzyMatcher;
use fuzzy_matcher::skim::SkimMatcherV2;
use skill_flow::util::short_label;
use skill_flow::{FadePolicy, FocusFilter, FocusTransition, LayoutAlgorithm};

use super::super::ViewModel;

const SEARCH_RESULTS: usize = 12;

fn fuzzy_match_score(matcher: &SkimMatcherV2, text: &str, query: &str) -> Option<i64> {
    matcher
        .fuzzy_match(text, query)
        .or_else(|| matcher.fuzzy_match(&text.to_ascii_lowercase(), &query.to_ascii_lowercase()))
}

impl ViewModel {
    pub(in crate::app) fn draw_controls(&mut self, ui: &mut Ui) {
        let now = ui.input(|input| input.time);

        ui.heading("View Controls");
        ui.separator();
        ui.add_space(4.0);

        let mut layout = self.engine.config().layout_algorithm;
        ui.horizontal_wrapped(|ui| {
            ui.selectable_value(&mut layout, LayoutAlgorithm::Hierarchical, "Hierarchical")
                .on_hover_text("Top-down tree, leaves spaced evenly left to right.");
            ui.selectable_value(&mut layout, LayoutAlgorithm::Radial, "Radial")
                .on_hover_text("Concentric rings around the root.");
        });
        self.engine.set_layout(layout);

        let mut transition = self.engine.config().focus_transition;
        ui.horizontal_wrapped(|ui| {
            ui.selectable_value(&mut transition, FocusTransition::DrillIn, "Drill in")
                .on_hover_text("Fit the view to the new focus tree.");
            ui.selectable_value(&mut transition, FocusTransition::Refresh, "Refresh in place")
                .on_hover_text("Keep the current pan and zoom when the focus changes.");
        });
        if transition != self.engine.config().focus_transition {
            self.engine.set_focus_transition(transition);
        }

        ui.horizontal(|ui| {
            if ui.button("Fit to view").clicked() {
                self.engine.fit_to_view();
            }
            if ui
                .button("Centre")
                .on_hover_text("Centre the focused skill, or the root, without zooming.")
                .clicked()
            {
                self.engine.center_on_focus();
            }
            let drilled_in = self.engine.focus().is_some();
            if ui
                .add_enabled(drilled_in, egui::Button::new("Show all skills"))
                .clicked()
            {
                self.engine.set_focus(None, now);
            }
        });

        ui.checkbox(&mut self.show_labels, "Node labels");
        ui.checkbox(&mut self.show_fps_bar, "FPS display");

        ui.separator();
        ui.label("Particles");

        let mut fade = self.engine.config().fade_policy;
        ui.horizontal_wrapped(|ui| {
            ui.selectable_value(&mut fade, FadePolicy::Constant, "Constant")
                .on_hover_text("Particles loop along their edge at full opacity.");
            ui.selectable_value(&mut fade, FadePolicy::Decaying, "Decaying")
                .on_hover_text("Particles fade out and are replaced by new spawns.");
        });
        if fade != self.engine.config().fade_policy {
            self.engine.set_fade_policy(fade);
        }

        let mut cap = self.engine.config().particle_cap;
        if ui
            .add(egui::Slider::new(&mut cap, 0..=5000).step_by(50.0).text("Particle cap"))
            .on_hover_text("Upper bound on live particles across all edges.")
            .changed()
        {
            self.engine.set_particle_cap(cap);
        }

        let mut spawn_rate = self.engine.config().particle_spawn_rate;
        if ui
            .add(
                egui::Slider::new(&mut spawn_rate, 0.0..=0.2)
                    .text("Spawn rate")
                    .clamping(egui::SliderClamping::Always),
            )
            .on_hover_text("Per-frame spawn probability for an edge of strength 10.")
            .changed()
        {
            self.engine.set_spawn_rate(spawn_rate);
        }

        ui.separator();
        self.draw_subject_filter(ui);

        ui.separator();
        self.draw_focus_search(ui, now);
    }

    fn draw_subject_filter(&mut self, ui: &mut Ui) {
        ui.label("Weight by subject group")
            .on_hover_text("Only subjects in the chosen unit or role count toward node weight.");

        let selected_text = match &self.selected_group {
            Some((kind, target)) => format!("{kind}: {target}"),
            None => "All subjects".to_owned(),
        };

        let mut selected = self.selected_group.clone();
        egui::ComboBox::from_id_salt("subject_group")
            .selected_text(selected_text)
            .show_ui(ui, |ui| {
                ui.selectable_value(&mut selected, None, "All subjects");
                for group in &self.subject_groups {
                    let label = format!("{}: {}", group.0, group.1);
                    ui.selectable_value(&mut selected, Some(group.clone()), label);
                }
            });

        if selected != self.selected_group {
            let filter = selected
                .as_ref()
                .map(|(kind, target)| FocusFilter::new(kind.as_str(), target.as_str()));
            self.engine.set_focus_filter(filter);
            self.selected_group = selected;
        }
    }

    fn draw_focus_search(&mut self, ui: &mut Ui, now: f64) {
        ui.label("Focus on a skill")
            .on_hover_text("Fuzzy search by name or id, then pick a result to drill in.");
        ui.text_edit_singleline(&mut self.search);

        let query = self.search.trim();
        if query.is_empty() {
            return;
        }

        let matcher = SkimMatcherV2::default();
        let mut matches = self
            .engine
            .model()
            .catalog
            .entries()
            .iter()
            .filter_map(|entry| {
                let score = fuzzy_match_score(&matcher, &entry.display_name, query)
                    .max(fuzzy_match_score(&matcher, &entry.id, query))?;
                Some((score, entry.id.clone(), entry.display_name.clone()))
            })
            .collect::<Vec<_>>();
        matches.sort_by(|a, b| b.0.cmp(&a.0).then_with(|| a.2.cmp(&b.2)));
        matches.truncate(SEARCH_RESULTS);

        if matches.is_empty() {
            ui.label("No skills match.");
            return;
        }

        let mut chosen = None;
        egui::ScrollArea::vertical()
            .id_salt("focus_search_results")
            .max_height(260.0)
            .show(ui, |ui| {
                for (_, id, name) in &matches {
                    let focused = self.engine.focus() == Some(id.as_str());
                    if ui
                        .selectable_label(focused, short_label(name, 36))
                        .on_hover_text(id.as_str())
                        .clicked()
                    {
                        chosen = Some(id.clone());
                    }
                }
            });

        if let Some(id) = chosen {
            self.engine.set_focus(Some(&id), now);
        }
    }
}
