use std::collections::VecDeque;
use std::path::PathBuf;
use std::sync::mpsc::{self, Receiver, TryRecvError};
use std::thread;

use eframe::egui::{self, Context};
use log::{error, info};
use skill_flow::{Document, EngineConfig, HitTarget, SkillFlowEngine};

mod canvas;
mod ui;

type LoadResult = Result<Document, String>;

pub struct SkillFlowApp {
    document_path: PathBuf,
    config: EngineConfig,
    initial_focus: Option<String>,
    state: AppState,
    reload_rx: Option<Receiver<LoadResult>>,
}

enum AppState {
    Loading { rx: Receiver<LoadResult> },
    Ready(Box<ViewModel>),
    Error(String),
}

struct ViewModel {
    engine: SkillFlowEngine,
    search: String,
    subject_groups: Vec<(String, String)>,
    selected_group: Option<(String, String)>,
    last_click: Option<HitTarget>,
    reload_error: Option<String>,
    pointer_captured: bool,
    pointer_inside: bool,
    show_labels: bool,
    show_fps_bar: bool,
    fps_current: f32,
    fps_samples: VecDeque<f32>,
}

impl SkillFlowApp {
    pub fn new(
        _cc: &eframe::CreationContext<'_>,
        document_path: PathBuf,
        config: EngineConfig,
        initial_focus: Option<String>,
    ) -> Self {
        let state = Self::start_load(document_path.clone());
        Self {
            document_path,
            config,
            initial_focus,
            state,
            reload_rx: None,
        }
    }

    fn spawn_load(document_path: PathBuf) -> Receiver<LoadResult> {
        let (tx, rx) = mpsc::channel();

        thread::spawn(move || {
            let result = Document::load(&document_path).map_err(|error| error.to_string());
            let _ = tx.send(result);
        });

        rx
    }

    fn start_load(document_path: PathBuf) -> AppState {
        info!("loading {}", document_path.display());
        AppState::Loading {
            rx: Self::spawn_load(document_path),
        }
    }

    fn ready_state(&self, document: Document, now: f64) -> AppState {
        match ViewModel::new(document, self.config.clone(), self.initial_focus.as_deref(), now) {
            Ok(model) => AppState::Ready(Box::new(model)),
            Err(error) => AppState::Error(error),
        }
    }
}

impl eframe::App for SkillFlowApp {
    fn update(&mut self, ctx: &Context, _frame: &mut eframe::Frame) {
        let now = ctx.input(|input| input.time);
        let mut transition = None;

        match &mut self.state {
            AppState::Loading { rx } => {
                match rx.try_recv() {
                    Ok(Ok(document)) => transition = Some(Ok(document)),
                    Ok(Err(error)) => transition = Some(Err(error)),
                    Err(TryRecvError::Empty) => {}
                    Err(TryRecvError::Disconnected) => {
                        transition = Some(Err("Background load worker disconnected".to_owned()));
                    }
                }

                egui::CentralPanel::default().show(ctx, |ui| {
                    ui.vertical_centered(|ui| {
                        ui.add_space(120.0);
                        ui.heading("Loading skills document...");
                        ui.add_space(8.0);
                        ui.spinner();
                    });
                });
                ctx.request_repaint();
            }
            AppState::Error(message) => {
                let mut retry = false;
                egui::CentralPanel::default().show(ctx, |ui| {
                    ui.heading("Failed to load the skills document");
                    ui.add_space(6.0);
                    ui.label(message.as_str());
                    ui.add_space(10.0);
                    retry = ui.button("Retry").clicked();
                });
                if retry {
                    self.state = Self::start_load(self.document_path.clone());
                    return;
                }
            }
            AppState::Ready(model) => {
                let mut reload_requested = false;
                let is_reloading = self.reload_rx.is_some();
                model.show(ctx, &self.document_path, &mut reload_requested, is_reloading);

                if reload_requested && self.reload_rx.is_none() {
                    self.reload_rx = Some(Self::spawn_load(self.document_path.clone()));
                }

                if let Some(rx) = self.reload_rx.take() {
                    match rx.try_recv() {
                        Ok(Ok(document)) => {
                            model.engine.replace_document(document, now);
                            model.document_replaced();
                        }
                        Ok(Err(message)) => {
                            error!("reload failed: {message}");
                            model.reload_error = Some(message);
                        }
                        Err(TryRecvError::Empty) => {
                            self.reload_rx = Some(rx);
                        }
                        Err(TryRecvError::Disconnected) => {
                            model.reload_error =
                                Some("Background load worker disconnected".to_owned());
                        }
                    }
                }
            }
        }

        if let Some(result) = transition {
            self.reload_rx = None;
            self.state = match result {
                Ok(document) => self.ready_state(document, now),
                Err(message) => {
                    error!("load failed: {message}");
                    AppState::Error(message)
                }
            };
        }
    }
}
