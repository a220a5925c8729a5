//! Pointer gesture interpretation and focus bookkeeping.
//!
//! The coordinator turns raw pointer/wheel/resize input into semantic
//! intents and owns the [`FocusContext`]; resolving intents against the
//! scene is left to the engine.

use std::collections::HashMap;

use eframe::egui::{Pos2, Vec2, vec2};

use crate::config::{EngineConfig, FocusTransition};
use crate::model::FocusFilter;
use crate::viewport::wheel_zoom_factor;

/// Movement in pixels after pointer-down that turns a press into a drag.
pub const DRAG_THRESHOLD: f32 = 4.0;
/// After a drag ends, clicks from the same pointer are ignored this long.
pub const DRAG_RELEASE_DEBOUNCE_SECS: f64 = 0.15;
/// Delay between the last resize and the fit it triggers.
pub const RECENTER_SETTLE_SECS: f64 = 0.2;

pub type PointerId = u64;

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum InputEvent {
    PointerDown { pointer: PointerId, position: Pos2 },
    PointerMove { pointer: PointerId, position: Pos2 },
    PointerUp { pointer: PointerId, position: Pos2 },
    PointerLeave,
    Wheel { position: Pos2, delta: f32 },
    Resize { width: f32, height: f32 },
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Intent {
    Pan(Vec2),
    Zoom { cursor: Pos2, factor: f32 },
    Click(Pos2),
    Hover(Pos2),
    ClearHover,
    Resize(Vec2),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TimerAction {
    Recenter,
    Collapse,
}

/// Explicit replacement for page-wide "current entity" state: which node is
/// the focus and which subject group scopes the weights.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct FocusContext {
    pub focus: Option<String>,
    pub filter: Option<FocusFilter>,
}

impl FocusContext {
    pub fn is_drilled_in(&self) -> bool {
        self.focus.is_some()
    }
}

#[derive(Clone, Copy, Debug)]
struct Gesture {
    origin: Pos2,
    last: Pos2,
    dragging: bool,
}

#[derive(Clone, Debug)]
pub struct InteractionCoordinator {
    gestures: HashMap<PointerId, Gesture>,
    released_at: HashMap<PointerId, f64>,
    context: FocusContext,
    transition: FocusTransition,
    auto_collapse_secs: Option<f64>,
    last_activity: f64,
    pending_recenter: Option<f64>,
}

impl InteractionCoordinator {
    pub fn new(transition: FocusTransition, auto_collapse_delay_ms: u64) -> Self {
        Self {
            gestures: HashMap::new(),
            released_at: HashMap::new(),
            context: FocusContext::default(),
            transition,
            auto_collapse_secs: (auto_collapse_delay_ms > 0)
                .then(|| auto_collapse_delay_ms as f64 / 1000.0),
            last_activity: 0.0,
            pending_recenter: None,
        }
    }

    pub fn from_config(config: &EngineConfig) -> Self {
        Self::new(config.focus_transition, config.auto_collapse_delay_ms)
    }

    pub fn context(&self) -> &FocusContext {
        &self.context
    }

    pub fn transition(&self) -> FocusTransition {
        self.transition
    }

    pub fn set_transition(&mut self, transition: FocusTransition) {
        self.transition = transition;
    }

    pub fn is_dragging(&self) -> bool {
        self.gestures.values().any(|gesture| gesture.dragging)
    }

    /// Returns `true` when the focus actually changed. Any pending re-center
    /// is cancelled either way.
    pub fn set_focus(&mut self, focus: Option<String>, now: f64) -> bool {
        self.pending_recenter = None;
        self.last_activity = now;
        if self.context.focus == focus {
            return false;
        }
        self.context.focus = focus;
        true
    }

    pub fn set_filter(&mut self, filter: Option<FocusFilter>) -> bool {
        if self.context.filter == filter {
            return false;
        }
        self.context.filter = filter;
        true
    }

    pub fn schedule_recenter(&mut self, now: f64) {
        self.pending_recenter = Some(now + RECENTER_SETTLE_SECS);
    }

    pub fn cancel_recenter(&mut self) {
        self.pending_recenter = None;
    }

    pub fn recenter_pending(&self) -> bool {
        self.pending_recenter.is_some()
    }

    pub fn interpret(&mut self, event: InputEvent, now: f64) -> Option<Intent> {
        self.last_activity = now;

        match event {
            InputEvent::PointerDown { pointer, position } => {
                self.forget_settled_releases(now);
                self.gestures.insert(
                    pointer,
                    Gesture {
                        origin: position,
                        last: position,
                        dragging: false,
                    },
                );
                None
            }
            InputEvent::PointerMove { pointer, position } => {
                let Some(gesture) = self.gestures.get_mut(&pointer) else {
                    return Some(Intent::Hover(position));
                };

                if !gesture.dragging && gesture.origin.distance(position) > DRAG_THRESHOLD {
                    gesture.dragging = true;
                }

                let delta = position - gesture.last;
                gesture.last = position;
                gesture.dragging.then_some(Intent::Pan(delta))
            }
            InputEvent::PointerUp { pointer, position } => {
                self.forget_settled_releases(now);
                let gesture = self.gestures.remove(&pointer)?;
                if gesture.dragging {
                    self.released_at.insert(pointer, now);
                    return None;
                }

                let settling = self.released_at.contains_key(&pointer);
                (!settling).then_some(Intent::Click(position))
            }
            InputEvent::PointerLeave => {
                self.gestures.clear();
                Some(Intent::ClearHover)
            }
            InputEvent::Wheel { position, delta } => {
                if delta.abs() <= f32::EPSILON {
                    return None;
                }
                Some(Intent::Zoom {
                    cursor: position,
                    factor: wheel_zoom_factor(delta),
                })
            }
            InputEvent::Resize { width, height } => {
                if !(width > 0.0) || !(height > 0.0) {
                    return None;
                }
                Some(Intent::Resize(vec2(width, height)))
            }
        }
    }

    /// Touch sources hand out a fresh pointer id per contact, so releases are
    /// only remembered while they can still swallow a click.
    fn forget_settled_releases(&mut self, now: f64) {
        self.released_at
            .retain(|_, released| now - *released < DRAG_RELEASE_DEBOUNCE_SECS);
    }

    /// Fires due timers. A collapse only happens while drilled in and idle.
    pub fn tick(&mut self, now: f64) -> Option<TimerAction> {
        if let Some(deadline) = self.pending_recenter
            && now >= deadline
        {
            self.pending_recenter = None;
            return Some(TimerAction::Recenter);
        }

        if let Some(delay) = self.auto_collapse_secs
            && self.context.is_drilled_in()
            && self.gestures.is_empty()
            && now - self.last_activity >= delay
        {
            self.last_activity = now;
            return Some(TimerAction::Collapse);
        }

        None
    }
}
