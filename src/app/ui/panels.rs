use std::collections::VecDeque;
use std::path::Path;

use eframe::egui::{self, Align, Context, Layout};
use skill_flow::{Document, EngineConfig, SkillFlowEngine};

use super::super::ViewModel;

impl ViewModel {
    pub(in crate::app) fn new(
        document: Document,
        config: EngineConfig,
        initial_focus: Option<&str>,
        now: f64,
    ) -> Result<Self, String> {
        let subject_groups = document.subject_groups();
        let mut engine = SkillFlowEngine::new(document, config, egui::vec2(1000.0, 800.0))
            .map_err(|error| error.to_string())?;
        if let Some(focus) = initial_focus {
            engine.set_focus(Some(focus), now);
        }

        Ok(Self {
            engine,
            search: String::new(),
            subject_groups,
            selected_group: None,
            last_click: None,
            reload_error: None,
            pointer_captured: false,
            pointer_inside: false,
            show_labels: true,
            show_fps_bar: true,
            fps_current: 0.0,
            fps_samples: VecDeque::new(),
        })
    }

    /// Refreshes host-side state that depends on the document contents.
    pub(in crate::app) fn document_replaced(&mut self) {
        self.subject_groups = self.engine.document().subject_groups();
        if let Some(group) = &self.selected_group
            && !self.subject_groups.contains(group)
        {
            self.selected_group = None;
            self.engine.set_focus_filter(None);
        }
        self.last_click = None;
        self.reload_error = None;
    }

    pub(in crate::app) fn show(
        &mut self,
        ctx: &Context,
        document_path: &Path,
        reload_requested: &mut bool,
        is_loading: bool,
    ) {
        self.update_fps_counter(ctx);

        egui::TopBottomPanel::top("top_bar")
            .resizable(false)
            .show(ctx, |ui| {
                ui.horizontal(|ui| {
                    ui.heading("skill-flow");
                    ui.separator();
                    ui.label(format!("document: {}", document_path.display()));
                    ui.label(format!("skills: {}", self.engine.model().catalog.len()));
                    ui.label(format!("relations: {}", self.engine.model().edges.len()));
                    let reload_button =
                        ui.add_enabled(!is_loading, egui::Button::new("Reload document"));
                    if reload_button.clicked() {
                        *reload_requested = true;
                    }
                    if is_loading {
                        ui.spinner();
                    }
                    ui.with_layout(Layout::right_to_left(Align::Center), |ui| {
                        ui.label(self.scene_text());
                        if let Some(fps_text) = self.fps_display_text() {
                            ui.label(fps_text);
                        }
                    });
                });
            });

        egui::SidePanel::left("controls")
            .resizable(true)
            .default_width(320.0)
            .show(ctx, |ui| self.draw_controls(ui));

        egui::SidePanel::right("details")
            .resizable(true)
            .default_width(320.0)
            .show(ctx, |ui| self.draw_details(ui));

        egui::CentralPanel::default()
            .frame(egui::Frame::NONE)
            .show(ctx, |ui| self.draw_canvas(ui));
    }
}
