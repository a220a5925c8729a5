//! Skill graph layout and animated relationship flows.
//!
//! A [`Document`] of skills and subjects is turned into a containment tree
//! plus weighted peer edges, optionally narrowed to the spanning tree around
//! a focus node, laid out hierarchically or radially, and animated with
//! particles that travel along the peer edges. [`SkillFlowEngine`] drives the
//! whole pipeline and hands back plain [`Frame`] data for any renderer.

pub mod config;
pub mod document;
pub mod engine;
pub mod error;
pub mod interaction;
pub mod layout;
pub mod model;
pub mod particles;
pub mod render_utils;
pub mod util;
pub mod viewport;

pub use config::{EngineConfig, FadePolicy, FocusTransition, LayoutAlgorithm, StrengthFallback};
pub use document::Document;
pub use engine::{EngineEvent, Frame, HitTarget, HoverInfo, SkillFlowEngine};
pub use error::{Error, Result};
pub use interaction::{FocusContext, InputEvent, InteractionCoordinator};
pub use model::{FocusFilter, GraphModel, GraphModelBuilder, SkillTree, spanning_tree};
pub use particles::ParticleSimulator;
pub use viewport::{Transform, Viewport};
