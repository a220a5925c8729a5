//! Flow particles travelling along peer edges.
//!
//! Lifecycle: spawned on an edge roll, travelling (progress loops modulo 1),
//! fading (decaying policy only) and removed once alpha is spent or the
//! particle has stayed off screen too long. The particle vector is filtered
//! in place every frame; only new spawns allocate.

mod curve;

use eframe::egui::{Color32, Pos2, Rect, Vec2, vec2};
use log::trace;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::config::{EngineConfig, FadePolicy};
use crate::viewport::Transform;

pub use curve::{FlowPath, MIN_CURVE_LENGTH, quadratic_bezier};

/// Strength at which an edge spawns at exactly the configured rate.
pub const REFERENCE_STRENGTH: f32 = 10.0;
/// Upper bound on a single edge's per-frame spawn probability.
pub const MAX_SPAWN_PROBABILITY: f32 = 0.5;
pub const ALPHA_EPSILON: f32 = 0.01;
/// Particles at or below this alpha are neither drawn nor hit-tested.
pub const VISIBILITY_THRESHOLD: f32 = 0.05;
pub const HIT_RADIUS: f32 = 10.0;
const DECAY_PER_SEC: f32 = 0.3;
const OFFSCREEN_GRACE_SECS: f32 = 0.75;
const SPAWN_JITTER: f32 = 6.0;
const CONSTANT_ALPHA: f32 = 0.9;

/// Maps any progress value into `[0, 1)`.
pub fn wrap_progress(progress: f32) -> f32 {
    let wrapped = progress.rem_euclid(1.0);
    if wrapped >= 1.0 || !wrapped.is_finite() {
        0.0
    } else {
        wrapped
    }
}

/// One animated edge: the geometry particles follow plus their styling.
#[derive(Clone, Debug, PartialEq)]
pub struct Flow {
    /// Index into the engine's edge list.
    pub edge: usize,
    pub path: FlowPath,
    pub strength: f32,
    pub speed: f32,
    pub color: Color32,
}

#[derive(Clone, Debug, PartialEq)]
pub struct Particle {
    pub id: u64,
    pub flow: usize,
    pub progress: f32,
    pub size: f32,
    pub alpha: f32,
    pub color: Color32,
    /// Screen position from the latest update.
    pub screen: Pos2,
    control_jitter: Vec2,
    offscreen_secs: f32,
}

impl Particle {
    pub fn is_visible(&self) -> bool {
        self.alpha > VISIBILITY_THRESHOLD
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ParticleHit {
    pub particle_id: u64,
    pub edge: usize,
    pub distance: f32,
}

pub struct ParticleSimulator {
    particles: Vec<Particle>,
    flows: Vec<Flow>,
    active: Vec<usize>,
    cap: usize,
    spawn_rate: f32,
    fade_policy: FadePolicy,
    rng: StdRng,
    next_id: u64,
}

impl ParticleSimulator {
    pub fn new(cap: usize, spawn_rate: f32, fade_policy: FadePolicy, seed: Option<u64>) -> Self {
        let rng = match seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };

        Self {
            particles: Vec::with_capacity(cap.min(4096)),
            flows: Vec::new(),
            active: Vec::new(),
            cap,
            spawn_rate: spawn_rate.max(0.0),
            fade_policy,
            rng,
            next_id: 0,
        }
    }

    pub fn from_config(config: &EngineConfig) -> Self {
        Self::new(
            config.particle_cap,
            config.particle_spawn_rate,
            config.fade_policy,
            config.particle_seed,
        )
    }

    /// Replaces the edge geometry. Existing particles are discarded rather
    /// than migrated.
    pub fn set_flows(&mut self, flows: Vec<Flow>) {
        self.flows = flows;
        self.clear();
    }

    pub fn clear(&mut self) {
        self.particles.clear();
        self.active.clear();
    }

    pub fn flows(&self) -> &[Flow] {
        &self.flows
    }

    pub fn particles(&self) -> &[Particle] {
        &self.particles
    }

    pub fn len(&self) -> usize {
        self.particles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.particles.is_empty()
    }

    pub fn cap(&self) -> usize {
        self.cap
    }

    pub fn set_cap(&mut self, cap: usize) {
        self.cap = cap;
        if self.particles.len() > cap {
            self.particles.truncate(cap);
            self.active.retain(|&index| index < cap);
        }
    }

    pub fn set_spawn_rate(&mut self, spawn_rate: f32) {
        self.spawn_rate = spawn_rate.max(0.0);
    }

    pub fn fade_policy(&self) -> FadePolicy {
        self.fade_policy
    }

    pub fn set_fade_policy(&mut self, fade_policy: FadePolicy) {
        self.fade_policy = fade_policy;
    }

    /// Visible particles as of the last update, with cached screen positions.
    pub fn active(&self) -> impl Iterator<Item = &Particle> {
        self.active.iter().map(|&index| &self.particles[index])
    }

    /// Places a particle on `flow` at `progress` unless the cap is reached.
    pub fn spawn_on(&mut self, flow: usize, progress: f32, transform: &Transform) -> Option<u64> {
        if self.particles.len() >= self.cap {
            return None;
        }
        let flow_ref = self.flows.get(flow)?;

        let jitter = vec2(
            self.rng.gen_range(-1.0..=1.0_f32),
            self.rng.gen_range(-1.0..=1.0_f32),
        ) * SPAWN_JITTER;
        let progress = wrap_progress(progress);
        let position = flow_ref.path.with_control_offset(jitter).point_at(progress);
        let alpha = match self.fade_policy {
            FadePolicy::Constant => CONSTANT_ALPHA,
            FadePolicy::Decaying => 1.0,
        };

        let id = self.next_id;
        self.next_id += 1;
        self.particles.push(Particle {
            id,
            flow,
            progress,
            size: (1.5 + flow_ref.strength * 0.35).clamp(2.0, 6.0),
            alpha,
            color: flow_ref.color,
            screen: transform.to_screen(position),
            control_jitter: jitter,
            offscreen_secs: 0.0,
        });
        if alpha > VISIBILITY_THRESHOLD {
            self.active.push(self.particles.len() - 1);
        }
        Some(id)
    }

    /// Advances one frame. `bounds` is the visible screen area.
    pub fn update(&mut self, delta_seconds: f32, transform: &Transform, bounds: Rect) {
        let delta_seconds = if delta_seconds.is_finite() {
            delta_seconds.max(0.0)
        } else {
            0.0
        };
        let fade_policy = self.fade_policy;
        let flows = &self.flows;

        self.particles.retain_mut(|particle| {
            let Some(flow) = flows.get(particle.flow) else {
                return false;
            };

            particle.progress = wrap_progress(particle.progress + flow.speed * delta_seconds);
            let position = flow
                .path
                .with_control_offset(particle.control_jitter)
                .point_at(particle.progress);
            particle.screen = transform.to_screen(position);

            if fade_policy == FadePolicy::Decaying {
                particle.alpha -= DECAY_PER_SEC * delta_seconds;
                if particle.alpha < ALPHA_EPSILON {
                    return false;
                }
            }

            if bounds.expand(particle.size).contains(particle.screen) {
                particle.offscreen_secs = 0.0;
            } else {
                particle.offscreen_secs += delta_seconds;
                if fade_policy == FadePolicy::Constant
                    || particle.offscreen_secs > OFFSCREEN_GRACE_SECS
                {
                    return false;
                }
            }
            true
        });

        self.active.clear();
        self.active.extend(
            self.particles
                .iter()
                .enumerate()
                .filter(|(_, particle)| particle.is_visible())
                .map(|(index, _)| index),
        );

        self.spawn_frame(transform);

        trace!(
            "particles: {} live, {} visible, {} flows",
            self.particles.len(),
            self.active.len(),
            self.flows.len()
        );
    }

    fn spawn_frame(&mut self, transform: &Transform) {
        if self.spawn_rate <= 0.0 {
            return;
        }

        for flow in 0..self.flows.len() {
            if self.particles.len() >= self.cap {
                break;
            }

            let probability = (self.spawn_rate * self.flows[flow].strength / REFERENCE_STRENGTH)
                .clamp(0.0, MAX_SPAWN_PROBABILITY);
            if probability > 0.0 && self.rng.gen_bool(probability as f64) {
                self.spawn_on(flow, 0.0, transform);
            }
        }
    }

    /// Nearest visible particle within `radius` screen pixels of `point`.
    pub fn hit_test(&self, point: Pos2, radius: f32) -> Option<ParticleHit> {
        self.active()
            .filter_map(|particle| {
                let distance = particle.screen.distance(point);
                (distance <= radius).then(|| ParticleHit {
                    particle_id: particle.id,
                    edge: self.flows[particle.flow].edge,
                    distance,
                })
            })
            .min_by(|a, b| a.distance.total_cmp(&b.distance))
    }
}
