//! Trackpad interpretation policy.
//!
//! A free finger on the trackpad is either reported as a horizontal movement
//! delta ([`Mode::Relative`]) or as a normalized horizontal position
//! ([`Mode::Absolute`]).  The current mode is owned by whoever drives the
//! settings surface; the classifier only reads it through a [`ModeHandle`].
//!
//! The mode may be flipped from a settings thread while touch input keeps
//! flowing on the input thread, so it lives in an `AtomicU8`.

use std::fmt;
use std::str::FromStr;
use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use super::layout::{Point, TrackpadZone};
use crate::protocol::messages::SemanticEvent;

/// Multiplier applied to the raw horizontal delta before transmission.
pub const DEFAULT_SENSITIVITY: f32 = 2.0;

/// Horizontal movements of this magnitude or less are treated as jitter.
pub const DEFAULT_JITTER_EPSILON: f32 = 0.1;

/// How trackpad contacts are interpreted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
#[repr(u8)]
pub enum Mode {
    /// Send horizontal movement deltas.
    #[default]
    Relative = 0,
    /// Send the normalized horizontal position within the trackpad.
    Absolute = 1,
}

impl Mode {
    fn from_u8(value: u8) -> Self {
        match value {
            1 => Mode::Absolute,
            _ => Mode::Relative,
        }
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Mode::Relative => f.write_str("relative"),
            Mode::Absolute => f.write_str("absolute"),
        }
    }
}

/// Error returned when parsing an unknown mode name.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown mode {0:?}; expected \"relative\" or \"absolute\"")]
pub struct ParseModeError(pub String);

impl FromStr for Mode {
    type Err = ParseModeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "relative" | "rel" => Ok(Mode::Relative),
            "absolute" | "abs" => Ok(Mode::Absolute),
            other => Err(ParseModeError(other.to_string())),
        }
    }
}

/// Shared, lock-free cell holding the current [`Mode`].
///
/// Clones refer to the same cell.
#[derive(Debug, Clone, Default)]
pub struct ModeHandle {
    inner: Arc<AtomicU8>,
}

impl ModeHandle {
    pub fn new(mode: Mode) -> Self {
        Self {
            inner: Arc::new(AtomicU8::new(mode as u8)),
        }
    }

    pub fn get(&self) -> Mode {
        Mode::from_u8(self.inner.load(Ordering::Relaxed))
    }

    pub fn set(&self, mode: Mode) {
        self.inner.store(mode as u8, Ordering::Relaxed);
    }
}

/// One observation of a free (non-key, non-palm) finger.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FreeFingerSample {
    /// Position committed before this update; `None` on touch-down.
    pub previous: Option<Point>,
    /// Position reported by this update.
    pub current: Point,
}

/// Resolves free-finger samples into trackpad events.
#[derive(Debug, Clone)]
pub struct ModePolicy {
    mode: ModeHandle,
    sensitivity: f32,
    jitter_epsilon: f32,
}

impl ModePolicy {
    pub fn new(mode: ModeHandle, sensitivity: f32, jitter_epsilon: f32) -> Self {
        Self {
            mode,
            sensitivity,
            jitter_epsilon,
        }
    }

    pub fn mode(&self) -> Mode {
        self.mode.get()
    }

    pub fn handle(&self) -> &ModeHandle {
        &self.mode
    }

    pub fn sensitivity(&self) -> f32 {
        self.sensitivity
    }

    /// Interprets a free-finger sample against the trackpad bounds.
    ///
    /// Returns `None` when the finger is outside the trackpad, when a
    /// relative-mode sample has no previous position, when the horizontal
    /// movement is within the jitter epsilon, or when the scaled delta is not
    /// finite.
    pub fn interpret(&self, sample: FreeFingerSample, trackpad: &TrackpadZone) -> Option<SemanticEvent> {
        if !trackpad.contains(sample.current) {
            return None;
        }
        match self.mode.get() {
            Mode::Absolute => trackpad
                .horizontal_ratio(sample.current)
                .map(SemanticEvent::AbsolutePosition),
            Mode::Relative => {
                let previous = sample.previous?;
                // Vertical movement is intentionally not transmitted.
                let dx = sample.current.x - previous.x;
                let delta = dx * self.sensitivity;
                // Overflowing or NaN deltas cannot be put on the wire.
                if dx.abs() > self.jitter_epsilon && delta.is_finite() {
                    Some(SemanticEvent::Delta(delta))
                } else {
                    None
                }
            }
        }
    }
}

impl Default for ModePolicy {
    fn default() -> Self {
        Self::new(ModeHandle::default(), DEFAULT_SENSITIVITY, DEFAULT_JITTER_EPSILON)
    }
}
