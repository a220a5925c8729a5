//! Wires the pipeline together: document, model, focus filtering, layout,
//! viewport, particles and input. The host feeds it input and a clock and
//! draws the [`Frame`] it hands back.

use eframe::egui::{Color32, Pos2, Rect, Vec2};
use log::{debug, info, warn};

use crate::config::{EngineConfig, FadePolicy, FocusTransition, LayoutAlgorithm};
use crate::document::Document;
use crate::error::Result;
use crate::interaction::{FocusContext, InputEvent, Intent, InteractionCoordinator, TimerAction};
use crate::layout::{LayoutParams, layout};
use crate::model::{FocusFilter, GraphModel, GraphModelBuilder, SkillTree, spanning_tree};
use crate::particles::{Flow, FlowPath, HIT_RADIUS, ParticleHit, ParticleSimulator};
use crate::render_utils::{
    CONTAINMENT_COLOR, SYNTHETIC_ROOT_COLOR, blend_color, kind_color, node_radius, weight_color,
    with_alpha,
};
use crate::util::short_label;
use crate::viewport::{Transform, Viewport};

/// Segments per sampled peer curve, for drawing and edge picking.
pub const EDGE_SEGMENTS: usize = 16;
/// Screen distance within which a pointer counts as on an edge.
pub const EDGE_HIT_TOLERANCE: f32 = 5.0;
const LABEL_CHARS: usize = 28;
const FOCUS_COLOR: Color32 = Color32::from_rgb(245, 206, 93);
const HOVER_COLOR: Color32 = Color32::from_rgb(255, 164, 101);

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EdgeRef {
    /// Tree link, as indices into the active tree.
    Containment { parent: usize, child: usize },
    /// Index into the model's peer edges.
    Peer(usize),
}

#[derive(Clone, Debug, PartialEq)]
pub struct NodeSprite {
    pub index: usize,
    pub id: String,
    pub label: String,
    pub screen: Pos2,
    pub radius: f32,
    pub color: Color32,
    pub focused: bool,
}

#[derive(Clone, Debug, PartialEq)]
pub struct EdgeSprite {
    pub edge: EdgeRef,
    pub points: Vec<Pos2>,
    pub color: Color32,
    pub width: f32,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ParticleSprite {
    pub id: u64,
    pub screen: Pos2,
    pub size: f32,
    pub color: Color32,
    pub alpha: f32,
}

/// Plain draw data in container-local screen coordinates.
#[derive(Clone, Debug, Default)]
pub struct Frame {
    pub nodes: Vec<NodeSprite>,
    pub edges: Vec<EdgeSprite>,
    pub particles: Vec<ParticleSprite>,
}

#[derive(Clone, Debug, PartialEq)]
pub enum HitTarget {
    Particle(ParticleHit),
    Node(String),
    Edge(usize),
    Background,
}

#[derive(Clone, Debug, PartialEq)]
pub enum HoverInfo {
    Node {
        id: String,
        display_name: String,
        weight: u32,
        connections: usize,
    },
    Edge {
        index: usize,
        from: String,
        to: String,
        kind: String,
        strength: f32,
    },
}

#[derive(Clone, Debug, PartialEq)]
pub enum EngineEvent {
    Clicked(HitTarget),
    FocusChanged(Option<String>),
}

pub struct SkillFlowEngine {
    config: EngineConfig,
    builder: GraphModelBuilder,
    document: Document,
    model: GraphModel,
    tree: SkillTree,
    container: Vec2,
    viewport: Viewport,
    particles: ParticleSimulator,
    coordinator: InteractionCoordinator,
    hover: Option<HoverInfo>,
    frame: Frame,
    structure_dirty: bool,
}

impl SkillFlowEngine {
    pub fn new(document: Document, config: EngineConfig, container: Vec2) -> Result<Self> {
        config.validate()?;

        let mut engine = Self {
            builder: GraphModelBuilder::from_config(&config),
            viewport: Viewport::new(config.zoom_bounds),
            particles: ParticleSimulator::from_config(&config),
            coordinator: InteractionCoordinator::from_config(&config),
            config,
            document,
            model: GraphModel::default(),
            tree: SkillTree::default(),
            container,
            hover: None,
            frame: Frame::default(),
            structure_dirty: true,
        };
        engine.rebuild();
        engine.fit_to_view();
        Ok(engine)
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn document(&self) -> &Document {
        &self.document
    }

    pub fn model(&self) -> &GraphModel {
        &self.model
    }

    /// The tree currently laid out: the full hierarchy, or the spanning
    /// tree around the focus.
    pub fn tree(&self) -> &SkillTree {
        &self.tree
    }

    pub fn viewport(&self) -> &Viewport {
        &self.viewport
    }

    pub fn transform(&self) -> Transform {
        self.viewport.transform()
    }

    pub fn container(&self) -> Vec2 {
        self.container
    }

    pub fn particles(&self) -> &ParticleSimulator {
        &self.particles
    }

    pub fn focus_context(&self) -> &FocusContext {
        self.coordinator.context()
    }

    pub fn focus(&self) -> Option<&str> {
        self.coordinator.context().focus.as_deref()
    }

    pub fn hover(&self) -> Option<&HoverInfo> {
        self.hover.as_ref()
    }

    pub fn recenter_pending(&self) -> bool {
        self.coordinator.recenter_pending()
    }

    pub fn is_dragging(&self) -> bool {
        self.coordinator.is_dragging()
    }

    pub fn frame(&self) -> &Frame {
        &self.frame
    }

    /// Swaps in a freshly parsed document. The view transform is kept; a
    /// focus that no longer exists is dropped.
    pub fn replace_document(&mut self, document: Document, now: f64) {
        self.document = document;
        self.rebuild();

        if let Some(focus) = self.focus().map(str::to_owned)
            && !self.model.catalog.contains(&focus)
        {
            warn!("focus `{focus}` vanished from the reloaded document");
            self.coordinator.set_focus(None, now);
            self.refilter();
        }
    }

    /// Drills into `focus`, or back out to the full hierarchy with `None`.
    /// Returns `false` for unknown ids and no-op changes.
    pub fn set_focus(&mut self, focus: Option<&str>, now: f64) -> bool {
        if let Some(id) = focus
            && !self.model.catalog.contains(id)
        {
            warn!("ignoring focus on unknown node `{id}`");
            return false;
        }

        if !self.coordinator.set_focus(focus.map(str::to_owned), now) {
            return false;
        }

        info!("focus changed to {}", focus.unwrap_or("<all>"));
        self.refilter();
        if self.coordinator.transition() == FocusTransition::DrillIn {
            self.fit_to_view();
        }
        true
    }

    /// Scopes weights (and the drilled-in relevance set) to one subject
    /// group. Rebuilds the model but keeps the transform.
    pub fn set_focus_filter(&mut self, filter: Option<FocusFilter>) -> bool {
        if !self.coordinator.set_filter(filter) {
            return false;
        }
        self.rebuild();
        true
    }

    pub fn set_layout(&mut self, algorithm: LayoutAlgorithm) -> bool {
        if self.config.layout_algorithm == algorithm {
            return false;
        }
        self.config.layout_algorithm = algorithm;
        self.relayout();
        self.fit_to_view();
        true
    }

    pub fn set_focus_transition(&mut self, transition: FocusTransition) {
        self.config.focus_transition = transition;
        self.coordinator.set_transition(transition);
    }

    pub fn set_particle_cap(&mut self, cap: usize) {
        self.config.particle_cap = cap;
        self.particles.set_cap(cap);
    }

    pub fn set_spawn_rate(&mut self, spawn_rate: f32) {
        self.config.particle_spawn_rate = spawn_rate.max(0.0);
        self.particles.set_spawn_rate(spawn_rate);
    }

    pub fn set_fade_policy(&mut self, fade_policy: FadePolicy) {
        self.config.fade_policy = fade_policy;
        self.particles.set_fade_policy(fade_policy);
    }

    /// Records the new container size; the fit follows once resizing has
    /// settled.
    pub fn resize(&mut self, size: Vec2, now: f64) {
        if size == self.container {
            return;
        }
        self.container = size;
        self.coordinator.schedule_recenter(now);
    }

    pub fn fit_to_view(&mut self) -> bool {
        let positions = self.tree.nodes().iter().map(|node| node.position);
        let fitted = self
            .viewport
            .fit_to_view(positions, self.container, self.config.fit_padding);
        self.structure_dirty |= fitted;
        fitted
    }

    /// Pans so the focused node (or the tree root) sits in the middle of the
    /// container at the current scale.
    pub fn center_on_focus(&mut self) -> bool {
        let target = match self.focus() {
            Some(focus) => self.tree.index_of(focus),
            None => self.tree.root(),
        };
        let Some(node) = target.and_then(|index| self.tree.node(index)) else {
            return false;
        };

        self.viewport.center_on(node.position, self.container);
        self.structure_dirty = true;
        true
    }

    pub fn handle_input(&mut self, event: InputEvent, now: f64) -> Vec<EngineEvent> {
        let mut events = Vec::new();
        let Some(intent) = self.coordinator.interpret(event, now) else {
            return events;
        };

        match intent {
            Intent::Pan(delta) => {
                self.viewport.pan(delta.x, delta.y);
                self.structure_dirty = true;
            }
            Intent::Zoom { cursor, factor } => {
                self.viewport.zoom(cursor, factor);
                self.structure_dirty = true;
            }
            Intent::Resize(size) => self.resize(size, now),
            Intent::Hover(position) => {
                let hover = self.hover_at(position);
                self.set_hover(hover);
            }
            Intent::ClearHover => self.set_hover(None),
            Intent::Click(position) => {
                let target = self.hit_test(position);
                if let HitTarget::Node(id) = &target {
                    let synthetic = self.tree.get(id).is_some_and(|node| node.synthetic);
                    if !synthetic && self.set_focus(Some(id.as_str()), now) {
                        events.push(EngineEvent::FocusChanged(Some(id.clone())));
                    }
                }
                events.push(EngineEvent::Clicked(target));
            }
        }
        events
    }

    /// One animation step: fires timers, moves particles and refreshes the
    /// frame.
    pub fn advance(&mut self, delta_seconds: f32, now: f64) -> Vec<EngineEvent> {
        let mut events = Vec::new();
        match self.coordinator.tick(now) {
            Some(TimerAction::Recenter) => {
                debug!("re-centering after resize");
                self.fit_to_view();
            }
            Some(TimerAction::Collapse) => {
                if self.set_focus(None, now) {
                    events.push(EngineEvent::FocusChanged(None));
                }
            }
            None => {}
        }

        let transform = self.viewport.transform();
        let bounds = Rect::from_min_size(Pos2::ZERO, self.container);
        self.particles.update(delta_seconds, &transform, bounds);

        if self.structure_dirty {
            self.rebuild_structure();
            self.structure_dirty = false;
        }
        self.rebuild_particle_sprites();
        events
    }

    /// Particle first, then node, then edge under `point`.
    pub fn hit_test(&self, point: Pos2) -> HitTarget {
        if let Some(hit) = self.particles.hit_test(point, HIT_RADIUS) {
            return HitTarget::Particle(hit);
        }

        let transform = self.viewport.transform();
        let max_weight = self.max_weight();
        let node = self
            .tree
            .nodes()
            .iter()
            .filter_map(|node| {
                let distance = transform.to_screen(node.position).distance(point);
                let radius = screen_radius(node.weight, max_weight, transform.scale);
                (distance <= radius).then_some((node, distance))
            })
            .min_by(|a, b| a.1.total_cmp(&b.1));
        if let Some((node, _)) = node {
            return HitTarget::Node(node.id.clone());
        }

        let edge = self
            .particles
            .flows()
            .iter()
            .filter_map(|flow| {
                let distance = polyline_distance(
                    flow.path.sample(EDGE_SEGMENTS).map(|p| transform.to_screen(p)),
                    point,
                )?;
                (distance <= EDGE_HIT_TOLERANCE).then_some((flow.edge, distance))
            })
            .min_by(|a, b| a.1.total_cmp(&b.1));

        match edge {
            Some((edge, _)) => HitTarget::Edge(edge),
            None => HitTarget::Background,
        }
    }

    fn hover_at(&self, point: Pos2) -> Option<HoverInfo> {
        match self.hit_test(point) {
            HitTarget::Node(id) => {
                let node = self.tree.get(&id)?;
                Some(HoverInfo::Node {
                    display_name: node.display_name.clone(),
                    weight: node.weight,
                    connections: self.model.connection_count(&id),
                    id,
                })
            }
            HitTarget::Edge(index) => self.edge_info(index),
            HitTarget::Particle(hit) => self.edge_info(hit.edge),
            HitTarget::Background => None,
        }
    }

    fn edge_info(&self, index: usize) -> Option<HoverInfo> {
        let edge = self.model.edges.get(index)?;
        Some(HoverInfo::Edge {
            index,
            from: edge.from.clone(),
            to: edge.to.clone(),
            kind: edge.kind.clone(),
            strength: edge.strength,
        })
    }

    fn set_hover(&mut self, hover: Option<HoverInfo>) {
        if self.hover != hover {
            self.hover = hover;
            self.structure_dirty = true;
        }
    }

    fn rebuild(&mut self) {
        let context = self.coordinator.context();
        self.model = self.builder.build(&self.document, context.filter.as_ref());
        debug!(
            "model rebuilt: {} catalog node(s), {} tree node(s), {} peer edge(s)",
            self.model.catalog.len(),
            self.model.tree.len(),
            self.model.edges.len()
        );
        self.refilter();
    }

    fn refilter(&mut self) {
        let context = self.coordinator.context();
        self.tree = match context.focus.as_deref() {
            Some(focus) => {
                let relevant = context
                    .filter
                    .as_ref()
                    .map(|_| self.model.weights.relevant_ids());
                spanning_tree(
                    &self.model.edges,
                    &self.model.catalog,
                    &self.model.weights,
                    focus,
                    relevant.as_ref(),
                )
            }
            None => self.model.tree.clone(),
        };
        self.relayout();
    }

    /// Recomputes positions and flow geometry. Live particles are discarded
    /// and a pending re-center no longer applies.
    fn relayout(&mut self) {
        let params = LayoutParams::from_config(&self.config, self.container);
        layout(&mut self.tree, self.config.layout_algorithm, &params);

        let flows = self
            .model
            .edges
            .iter()
            .enumerate()
            .filter_map(|(index, edge)| {
                let from = self.tree.get(&edge.from)?;
                let to = self.tree.get(&edge.to)?;
                Some(Flow {
                    edge: index,
                    path: FlowPath::between(from.position, to.position)?,
                    strength: edge.strength,
                    speed: edge.flow_speed(),
                    color: kind_color(&edge.kind),
                })
            })
            .collect();
        self.particles.set_flows(flows);
        self.coordinator.cancel_recenter();
        self.hover = None;
        self.structure_dirty = true;
    }

    fn max_weight(&self) -> u32 {
        self.tree
            .nodes()
            .iter()
            .map(|node| node.weight)
            .max()
            .unwrap_or(0)
    }

    fn rebuild_structure(&mut self) {
        let transform = self.viewport.transform();
        let max_weight = self.max_weight();
        let zoom_sqrt = transform.scale.sqrt();
        let focus = self.coordinator.context().focus.as_deref();
        let (hovered_node, hovered_edge) = match &self.hover {
            Some(HoverInfo::Node { id, .. }) => (Some(id.as_str()), None),
            Some(HoverInfo::Edge { index, .. }) => (None, Some(*index)),
            None => (None, None),
        };

        self.frame.nodes.clear();
        for (index, node) in self.tree.nodes().iter().enumerate() {
            let focused = focus == Some(node.id.as_str());
            let base = if node.synthetic {
                SYNTHETIC_ROOT_COLOR
            } else {
                weight_color(node.weight, max_weight)
            };
            let color = if hovered_node == Some(node.id.as_str()) {
                HOVER_COLOR
            } else if focused {
                blend_color(base, FOCUS_COLOR, 0.72)
            } else {
                base
            };

            self.frame.nodes.push(NodeSprite {
                index,
                id: node.id.clone(),
                label: short_label(&node.display_name, LABEL_CHARS),
                screen: transform.to_screen(node.position),
                radius: screen_radius(node.weight, max_weight, transform.scale),
                color,
                focused,
            });
        }

        self.frame.edges.clear();
        if focus.is_none() {
            let width = (1.18 * zoom_sqrt).clamp(0.6, 3.4);
            for (child, node) in self.tree.nodes().iter().enumerate() {
                let Some(parent) = node.parent else {
                    continue;
                };
                let Some(parent_node) = self.tree.node(parent) else {
                    continue;
                };
                self.frame.edges.push(EdgeSprite {
                    edge: EdgeRef::Containment { parent, child },
                    points: vec![
                        transform.to_screen(parent_node.position),
                        transform.to_screen(node.position),
                    ],
                    color: CONTAINMENT_COLOR,
                    width,
                });
            }
        }

        for flow in self.particles.flows() {
            let highlighted = hovered_edge == Some(flow.edge);
            let width = ((0.6 + flow.strength * 0.12) * zoom_sqrt).clamp(0.5, 4.0);
            self.frame.edges.push(EdgeSprite {
                edge: EdgeRef::Peer(flow.edge),
                points: flow
                    .path
                    .sample(EDGE_SEGMENTS)
                    .map(|point| transform.to_screen(point))
                    .collect(),
                color: if highlighted {
                    HOVER_COLOR
                } else {
                    with_alpha(flow.color, 0.45)
                },
                width: if highlighted { width * 1.8 } else { width },
            });
        }
    }

    fn rebuild_particle_sprites(&mut self) {
        let zoom_sqrt = self.viewport.transform().scale.sqrt();
        self.frame.particles.clear();
        self.frame
            .particles
            .extend(self.particles.active().map(|particle| ParticleSprite {
                id: particle.id,
                screen: particle.screen,
                size: (particle.size * zoom_sqrt).clamp(1.0, 8.0),
                color: particle.color,
                alpha: particle.alpha,
            }));
    }
}

fn screen_radius(weight: u32, max_weight: u32, scale: f32) -> f32 {
    (node_radius(weight, max_weight) * scale.powf(0.4)).clamp(2.5, 46.0)
}

fn segment_distance(point: Pos2, start: Pos2, end: Pos2) -> f32 {
    let segment = end - start;
    let length_sq = segment.length_sq();
    if length_sq <= f32::EPSILON {
        return point.distance(start);
    }
    let t = ((point - start).dot(segment) / length_sq).clamp(0.0, 1.0);
    point.distance(start + segment * t)
}

/// Shortest distance from `point` to a polyline, `None` for fewer than two
/// points.
fn polyline_distance(points: impl IntoIterator<Item = Pos2>, point: Pos2) -> Option<f32> {
    let mut points = points.into_iter();
    let mut previous = points.next()?;
    let mut best: Option<f32> = None;
    for next in points {
        let distance = segment_distance(point, previous, next);
        best = Some(best.map_or(distance, |best| best.min(distance)));
        previous = next;
    }
    best
}

#[cfg(test)]
mod tests {
    use eframe::egui::{pos2, vec2};

    use super::*;

    const DOCUMENT: &str = r#"{
        "skills": [
            { "id": "a", "name": "Alpha", "relations": [] },
            { "id": "b", "name": "Beta", "relations": [
                { "kind": "Child", "target": "a" },
                { "kind": "isRelatedTo", "target": "c", "score": 7 }
            ] },
            { "id": "c", "name": "Gamma", "relations": [
                { "kind": "Child", "target": "a" }
            ] }
        ],
        "subjects": [
            { "id": "p1", "name": "P1", "relations": [{ "kind": "unit", "target": "u1" }],
              "skills": ["b"] }
        ]
    }"#;

    fn engine() -> SkillFlowEngine {
        let document = Document::from_json_str(DOCUMENT).unwrap();
        let config = EngineConfig {
            particle_seed: Some(1),
            particle_spawn_rate: 0.0,
            ..EngineConfig::default()
        };
        SkillFlowEngine::new(document, config, vec2(800.0, 600.0)).unwrap()
    }

    #[test]
    fn polyline_distance_measures_nearest_segment() {
        let points = [pos2(0.0, 0.0), pos2(10.0, 0.0), pos2(10.0, 10.0)];
        assert_eq!(polyline_distance(points, pos2(5.0, 3.0)), Some(3.0));
        assert_eq!(polyline_distance(points, pos2(12.0, 5.0)), Some(2.0));
        assert_eq!(polyline_distance([pos2(0.0, 0.0)], pos2(1.0, 1.0)), None);
    }

    #[test]
    fn frame_contains_nodes_and_both_edge_families() {
        let mut engine = engine();
        engine.advance(0.0, 0.0);
        let frame = engine.frame();

        assert_eq!(frame.nodes.len(), 3);
        assert!(
            frame
                .edges
                .iter()
                .any(|edge| matches!(edge.edge, EdgeRef::Containment { .. }))
        );
        let peer = frame
            .edges
            .iter()
            .find(|edge| edge.edge == EdgeRef::Peer(0))
            .unwrap();
        assert_eq!(peer.points.len(), EDGE_SEGMENTS + 1);
    }

    #[test]
    fn clicking_a_node_drills_in() {
        let mut engine = engine();
        engine.advance(0.0, 0.0);
        let b = engine
            .frame()
            .nodes
            .iter()
            .find(|node| node.id == "b")
            .unwrap()
            .screen;

        engine.handle_input(InputEvent::PointerDown { pointer: 0, position: b }, 1.0);
        let events = engine.handle_input(InputEvent::PointerUp { pointer: 0, position: b }, 1.05);

        assert!(events.contains(&EngineEvent::FocusChanged(Some("b".to_owned()))));
        assert_eq!(engine.focus(), Some("b"));
        let ids = engine
            .tree()
            .nodes()
            .iter()
            .map(|node| node.id.as_str())
            .collect::<Vec<_>>();
        assert_eq!(ids, vec!["b", "c"]);
    }

    #[test]
    fn focus_and_layout_changes_cancel_pending_recenter() {
        let mut engine = engine();
        engine.resize(vec2(400.0, 300.0), 0.0);
        assert!(engine.recenter_pending());
        engine.set_focus(Some("b"), 0.05);
        assert!(!engine.recenter_pending());

        engine.resize(vec2(500.0, 300.0), 0.1);
        assert!(engine.set_layout(LayoutAlgorithm::Radial));
        assert!(!engine.recenter_pending());
    }

    #[test]
    fn resize_fits_after_settling() {
        let mut engine = engine();
        let before = engine.transform();
        engine.resize(vec2(200.0, 150.0), 0.0);
        engine.advance(0.016, 0.05);
        assert_eq!(engine.transform(), before);

        engine.advance(0.016, 1.0);
        assert_ne!(engine.transform(), before);
        assert!(!engine.recenter_pending());
    }

    #[test]
    fn unknown_focus_is_ignored() {
        let mut engine = engine();
        assert!(!engine.set_focus(Some("nope"), 0.0));
        assert_eq!(engine.focus(), None);
    }

    #[test]
    fn replacing_the_document_keeps_the_transform() {
        let mut engine = engine();
        engine.handle_input(
            InputEvent::Wheel {
                position: pos2(100.0, 100.0),
                delta: 120.0,
            },
            0.0,
        );
        let zoomed = engine.transform();

        engine.replace_document(Document::from_json_str(DOCUMENT).unwrap(), 1.0);
        assert_eq!(engine.transform(), zoomed);
    }

    #[test]
    fn hovering_a_node_reports_weight_and_connections() {
        let mut engine = engine();
        engine.advance(0.0, 0.0);
        let b = engine
            .frame()
            .nodes
            .iter()
            .find(|node| node.id == "b")
            .unwrap()
            .screen;

        engine.handle_input(InputEvent::PointerMove { pointer: 0, position: b }, 0.1);
        assert_eq!(
            engine.hover(),
            Some(&HoverInfo::Node {
                id: "b".to_owned(),
                display_name: "Beta".to_owned(),
                weight: 1,
                connections: 1,
            })
        );

        engine.handle_input(InputEvent::PointerLeave, 0.2);
        assert_eq!(engine.hover(), None);
    }
}
