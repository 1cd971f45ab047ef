//! Touch input sources for the sender.
//!
//! An input source produces [`RawTouchEvent`]s on its own thread and hands
//! them to the processing thread through a std `mpsc` channel.  The channel
//! preserves delivery order, so every begin/move/end for one pointer reaches
//! the classifier in the order the surface reported it.
//!
//! # Testability
//!
//! The [`InputSource`] trait allows tests to inject synthetic events through
//! [`scripted::ScriptedTouchSource`] without a real touch surface.

use std::sync::mpsc;

use tapdeck_core::{Mode, Point, PointerId, TouchEvent};

pub mod scripted;
pub mod trace;

/// A raw event produced by a touch surface or a recorded trace.
#[derive(Debug, Clone, PartialEq)]
pub enum RawTouchEvent {
    /// The surface changed size; zones must be rebuilt.
    Resize { width: f32, height: f32 },
    /// A pointer touched down.
    Down {
        id: i64,
        x: f32,
        y: f32,
        /// Reported contact size (touch major axis).
        size: f32,
    },
    /// A pointer moved.
    Move { id: i64, x: f32, y: f32, size: f32 },
    /// A pointer lifted.
    Up { id: i64 },
    /// The platform cancelled the pointer (e.g. gesture taken over).
    Cancel { id: i64 },
    /// The settings surface switched the trackpad mode.
    SetMode(Mode),
}

impl RawTouchEvent {
    /// Converts a contact update to the classifier's [`TouchEvent`].
    ///
    /// Returns `None` for surface-level events (`Resize`, `SetMode`).
    pub fn to_touch_event(&self) -> Option<TouchEvent> {
        match *self {
            RawTouchEvent::Down { id, x, y, size } => Some(TouchEvent::Begin {
                id: PointerId(id),
                position: Point::new(x, y),
                size,
            }),
            RawTouchEvent::Move { id, x, y, size } => Some(TouchEvent::Move {
                id: PointerId(id),
                position: Point::new(x, y),
                size,
            }),
            RawTouchEvent::Up { id } => Some(TouchEvent::End { id: PointerId(id) }),
            RawTouchEvent::Cancel { id } => Some(TouchEvent::Cancel { id: PointerId(id) }),
            RawTouchEvent::Resize { .. } | RawTouchEvent::SetMode(_) => None,
        }
    }
}

/// Error type for input source operations.
#[derive(Debug, thiserror::Error)]
pub enum CaptureError {
    #[error("failed to open touch trace {path}: {source}")]
    OpenTrace {
        path: std::path::PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to spawn input thread: {0}")]
    ThreadSpawn(#[source] std::io::Error),
    #[error("input source has already been started")]
    AlreadyStarted,
}

/// Trait abstracting touch event production.
pub trait InputSource: Send {
    /// Starts the input source and returns a receiver for its events.
    fn start(&self) -> Result<mpsc::Receiver<RawTouchEvent>, CaptureError>;
    /// Stops the input source; the receiver disconnects once pending events drain.
    fn stop(&self);
}
