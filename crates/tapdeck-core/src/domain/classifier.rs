//! Multi-pointer touch classifier.
//!
//! Consumes begin/move/end updates for every active pointer and decides, one
//! update at a time, whether the pointer is pressing a key, dragging on the
//! trackpad, or resting (palm).  Each update yields at most one
//! [`SemanticEvent`].
//!
//! # Per-pointer states
//!
//! ```text
//!            begin (palm)                      move (palm)
//!          ┌─────────────┐                   ┌───────────┐
//!          ▼             │                   ▼           │
//!   ── begin ──► Unclaimed ── key hit ──► KeyOwned ── end ──► Released (KeyUp)
//!                    │
//!                    └──── no key ──► FreeFinger ── end ──► Released (silent)
//! ```
//!
//! # Invariants
//!
//! - A key zone has at most one owner and a pointer owns at most one key zone.
//!   Ownership is stored once, on the zone, plus a reverse index from pointer
//!   to zone slot; both are only changed together.
//! - A pointer's position is committed before any palm or ownership decision,
//!   so deltas are always measured from the previous update.
//! - Ownership is sticky: movement never releases a key, only end/cancel does.
//!
//! # Claim order
//!
//! Zones are scanned in layout order (left group, then right group, left to
//! right within each group).  The first zone that contains the touch-down
//! point and is unowned wins.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use tracing::{debug, trace, warn};

use super::contact::{ContactTracker, PointerId, DEFAULT_PALM_THRESHOLD};
use super::layout::{compute_layout, KeySide, LayoutConfig, Point, Rect, SurfaceLayout};
use super::mode::{
    FreeFingerSample, Mode, ModeHandle, ModePolicy, DEFAULT_JITTER_EPSILON, DEFAULT_SENSITIVITY,
};
use crate::protocol::messages::SemanticEvent;

/// One raw contact update, as delivered by the input source.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TouchEvent {
    Begin {
        id: PointerId,
        position: Point,
        size: f32,
    },
    Move {
        id: PointerId,
        position: Point,
        size: f32,
    },
    End {
        id: PointerId,
    },
    Cancel {
        id: PointerId,
    },
}

impl TouchEvent {
    pub fn pointer_id(&self) -> PointerId {
        match *self {
            TouchEvent::Begin { id, .. }
            | TouchEvent::Move { id, .. }
            | TouchEvent::End { id }
            | TouchEvent::Cancel { id } => id,
        }
    }
}

/// Tunables for the classifier.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ClassifierConfig {
    /// Contact sizes strictly above this value are treated as a palm.
    #[serde(default = "default_palm_threshold")]
    pub palm_threshold: f32,
    /// Multiplier applied to relative horizontal deltas.
    #[serde(default = "default_sensitivity")]
    pub sensitivity: f32,
    /// Relative deltas with `|dx|` at or below this value are dropped.
    #[serde(default = "default_jitter_epsilon")]
    pub jitter_epsilon: f32,
}

fn default_palm_threshold() -> f32 {
    DEFAULT_PALM_THRESHOLD
}
fn default_sensitivity() -> f32 {
    DEFAULT_SENSITIVITY
}
fn default_jitter_epsilon() -> f32 {
    DEFAULT_JITTER_EPSILON
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self {
            palm_threshold: default_palm_threshold(),
            sensitivity: default_sensitivity(),
            jitter_epsilon: default_jitter_epsilon(),
        }
    }
}

/// A labeled key region together with its current owner.
#[derive(Debug, Clone, PartialEq)]
pub struct KeyZone {
    pub label: char,
    pub side: KeySide,
    pub bounds: Rect,
    pub owner: Option<PointerId>,
}

/// The touch classifier state machine.
pub struct TouchClassifier {
    layout_config: LayoutConfig,
    layout: SurfaceLayout,
    zones: Vec<KeyZone>,
    /// Reverse index: pointer id -> slot in `zones`.
    owned: HashMap<PointerId, usize>,
    tracker: ContactTracker,
    policy: ModePolicy,
}

impl TouchClassifier {
    /// Creates a classifier with an initial surface of `width` × `height`.
    pub fn new(
        width: f32,
        height: f32,
        layout_config: LayoutConfig,
        config: ClassifierConfig,
        mode: ModeHandle,
    ) -> Self {
        let layout = compute_layout(width, height, &layout_config);
        let zones = zones_from(&layout);
        Self {
            layout_config,
            layout,
            zones,
            owned: HashMap::new(),
            tracker: ContactTracker::new(config.palm_threshold),
            policy: ModePolicy::new(mode, config.sensitivity, config.jitter_epsilon),
        }
    }

    /// Rebuilds all zones for a new surface size.
    ///
    /// Key ownership held by active contacts is discarded without emitting a
    /// release; contact positions are kept.
    pub fn relayout(&mut self, width: f32, height: f32) {
        if !self.owned.is_empty() {
            let held: String = self.owned.values().map(|&slot| self.zones[slot].label).collect();
            warn!(
                %held,
                "relayout while keys are held; ownership dropped without release"
            );
        }
        self.layout = compute_layout(width, height, &self.layout_config);
        self.zones = zones_from(&self.layout);
        self.owned.clear();
        debug!(width, height, keys = self.zones.len(), "surface relaid out");
    }

    /// Processes a single contact update.
    pub fn handle(&mut self, event: TouchEvent) -> Option<SemanticEvent> {
        match event {
            TouchEvent::Begin { id, position, size } => self.on_begin(id, position, size),
            TouchEvent::Move { id, position, size } => self.on_move(id, position, size),
            TouchEvent::End { id } | TouchEvent::Cancel { id } => self.on_end(id),
        }
    }

    /// Processes every update of one input frame in order.
    pub fn handle_frame<I>(&mut self, events: I) -> Vec<SemanticEvent>
    where
        I: IntoIterator<Item = TouchEvent>,
    {
        events.into_iter().filter_map(|e| self.handle(e)).collect()
    }

    pub fn key_zones(&self) -> &[KeyZone] {
        &self.zones
    }

    pub fn layout(&self) -> &SurfaceLayout {
        &self.layout
    }

    /// Returns the pointer currently holding the key labeled `label`.
    pub fn owner_of(&self, label: char) -> Option<PointerId> {
        self.zones
            .iter()
            .find(|z| z.label == label)
            .and_then(|z| z.owner)
    }

    /// Returns the label of the key held by `id`, if any.
    pub fn owned_label(&self, id: PointerId) -> Option<char> {
        self.owned.get(&id).map(|&slot| self.zones[slot].label)
    }

    pub fn last_position(&self, id: PointerId) -> Option<Point> {
        self.tracker.last_position(id)
    }

    pub fn active_contacts(&self) -> usize {
        self.tracker.len()
    }

    pub fn mode(&self) -> Mode {
        self.policy.mode()
    }

    /// Returns the shared handle through which the mode can be changed.
    pub fn mode_handle(&self) -> &ModeHandle {
        self.policy.handle()
    }

    // ── Transitions ───────────────────────────────────────────────────────────

    fn on_begin(&mut self, id: PointerId, position: Point, size: f32) -> Option<SemanticEvent> {
        if self.tracker.on_begin(id, position, size).is_some() {
            // Missed end for a reused id: drop whatever it held first.
            if let Some(slot) = self.owned.remove(&id) {
                self.zones[slot].owner = None;
                warn!(pointer = %id, label = %self.zones[slot].label, "pointer re-began while holding a key");
            }
        }

        if self.tracker.is_palm(size) {
            trace!(pointer = %id, size, "palm contact ignored on begin");
            return None;
        }

        if let Some(slot) = self.claim_zone(id, position) {
            let label = self.zones[slot].label;
            debug!(pointer = %id, %label, "key claimed");
            return Some(SemanticEvent::KeyDown(label));
        }

        let sample = FreeFingerSample {
            previous: None,
            current: position,
        };
        self.policy.interpret(sample, &self.layout.trackpad)
    }

    fn on_move(&mut self, id: PointerId, position: Point, size: f32) -> Option<SemanticEvent> {
        let previous = self.tracker.on_move(id, position, size);

        if self.tracker.is_palm(size) {
            return None;
        }
        if self.owned.contains_key(&id) {
            return None;
        }

        let sample = FreeFingerSample {
            previous,
            current: position,
        };
        self.policy.interpret(sample, &self.layout.trackpad)
    }

    fn on_end(&mut self, id: PointerId) -> Option<SemanticEvent> {
        self.tracker.on_end(id);
        let slot = self.owned.remove(&id)?;
        let zone = &mut self.zones[slot];
        zone.owner = None;
        debug!(pointer = %id, label = %zone.label, "key released");
        Some(SemanticEvent::KeyUp(zone.label))
    }

    fn claim_zone(&mut self, id: PointerId, position: Point) -> Option<usize> {
        let slot = self
            .zones
            .iter()
            .position(|z| z.owner.is_none() && z.bounds.contains(position))?;
        self.zones[slot].owner = Some(id);
        self.owned.insert(id, slot);
        Some(slot)
    }
}

impl std::fmt::Debug for TouchClassifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TouchClassifier")
            .field("width", &self.layout.width)
            .field("height", &self.layout.height)
            .field("mode", &self.policy.mode())
            .field("contacts", &self.tracker.len())
            .field("held_keys", &self.owned.len())
            .finish()
    }
}

fn zones_from(layout: &SurfaceLayout) -> Vec<KeyZone> {
    layout
        .keys
        .iter()
        .map(|k| KeyZone {
            label: k.label,
            side: k.side,
            bounds: k.bounds,
            owner: None,
        })
        .collect()
}

// ── Tests ─────────────────────────────────────────────────────────────────────
