mod app;

use std::path::PathBuf;

use anyhow::Context as _;
use clap::Parser;
use log::info;
use skill_flow::{EngineConfig, FadePolicy, LayoutAlgorithm};

#[derive(Debug, Parser)]
#[command(author, version, about)]
struct Args {
    /// Skills document (JSON) to load.
    #[arg(long, default_value = "demos/skills.json")]
    document: PathBuf,

    /// Engine configuration (JSON). Unset fields keep their defaults.
    #[arg(long)]
    config: Option<PathBuf>,

    #[arg(long, value_enum)]
    layout: Option<LayoutAlgorithm>,

    #[arg(long)]
    particle_cap: Option<usize>,

    #[arg(long, value_enum)]
    fade: Option<FadePolicy>,

    /// Node id to drill into on startup.
    #[arg(long)]
    focus: Option<String>,
}

impl Args {
    fn engine_config(&self) -> anyhow::Result<EngineConfig> {
        let mut config = match &self.config {
            Some(path) => EngineConfig::load(path)
                .with_context(|| format!("loading config {}", path.display()))?,
            None => EngineConfig::default(),
        };

        if let Some(layout) = self.layout {
            config.layout_algorithm = layout;
        }
        if let Some(cap) = self.particle_cap {
            config.particle_cap = cap;
        }
        if let Some(fade) = self.fade {
            config.fade_policy = fade;
        }
        config.validate()?;
        Ok(config)
    }
}

fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();
    let config = args.engine_config()?;
    info!(
        "starting with {} layout, particle cap {}",
        config.layout_algorithm.label(),
        config.particle_cap
    );

    let options = eframe::NativeOptions {
        viewport: eframe::egui::ViewportBuilder::default().with_inner_size([1440.0, 920.0]),
        ..Default::default()
    };

    eframe::run_native(
        "skill-flow",
        options,
        Box::new(move |cc| {
            Ok(Box::new(app::SkillFlowApp::new(
                cc,
                args.document.clone(),
                config.clone(),
                args.focus.clone(),
            )))
        }),
    )
    .map_err(|error| anyhow::anyhow!("eframe failed: {error}"))
}
