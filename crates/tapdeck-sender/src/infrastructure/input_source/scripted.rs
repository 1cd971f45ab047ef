//! Scripted touch source for tests and demos.
//!
//! A touch surface reports contacts in frames: every pointer that changed
//! since the last frame appears once, in one batch.  [`ScriptedTouchSource`]
//! holds such frames in order and delivers all of them when started, then
//! closes the channel as if the surface went away.
//!
//! ```
//! use tapdeck_sender::infrastructure::input_source::scripted::ScriptedTouchSource;
//! use tapdeck_sender::infrastructure::input_source::InputSource;
//!
//! let source = ScriptedTouchSource::new()
//!     .surface(1000.0, 800.0)
//!     .tap(1, 150.0, 400.0)
//!     .drag(2, (300.0, 700.0), (320.0, 700.0), 2);
//! assert_eq!(source.frame_count(), 7);
//!
//! let rx = source.start().unwrap();
//! assert_eq!(rx.iter().count(), 7);
//! ```

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{mpsc, Mutex, PoisonError};

use tracing::debug;

use super::{CaptureError, InputSource, RawTouchEvent};

/// Contact size used by the gesture helpers; well below the palm threshold.
pub const FINGER_SIZE: f32 = 40.0;

/// An [`InputSource`] that replays a fixed list of touch frames.
#[derive(Debug, Default)]
pub struct ScriptedTouchSource {
    frames: Mutex<Vec<Vec<RawTouchEvent>>>,
    started: AtomicBool,
}

impl ScriptedTouchSource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends one frame: a batch of updates reported together.
    pub fn frame<I>(self, events: I) -> Self
    where
        I: IntoIterator<Item = RawTouchEvent>,
    {
        self.frames_mut().push(events.into_iter().collect());
        self
    }

    /// Appends a resize frame.
    pub fn surface(self, width: f32, height: f32) -> Self {
        self.frame([RawTouchEvent::Resize { width, height }])
    }

    /// Appends a touch-down frame and a lift frame for pointer `id`.
    pub fn tap(self, id: i64, x: f32, y: f32) -> Self {
        self.frame([RawTouchEvent::Down {
            id,
            x,
            y,
            size: FINGER_SIZE,
        }])
        .frame([RawTouchEvent::Up { id }])
    }

    /// Appends a straight drag from `from` to `to`: one down frame, `steps`
    /// evenly spaced move frames ending at `to`, then one lift frame.
    pub fn drag(self, id: i64, from: (f32, f32), to: (f32, f32), steps: u32) -> Self {
        let mut source = self.frame([RawTouchEvent::Down {
            id,
            x: from.0,
            y: from.1,
            size: FINGER_SIZE,
        }]);
        for step in 1..=steps {
            let t = step as f32 / steps as f32;
            source = source.frame([RawTouchEvent::Move {
                id,
                x: from.0 + (to.0 - from.0) * t,
                y: from.1 + (to.1 - from.1) * t,
                size: FINGER_SIZE,
            }]);
        }
        source.frame([RawTouchEvent::Up { id }])
    }

    /// Number of frames not yet delivered.
    pub fn frame_count(&self) -> usize {
        self.frames
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    fn frames_mut(&self) -> std::sync::MutexGuard<'_, Vec<Vec<RawTouchEvent>>> {
        self.frames.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl InputSource for ScriptedTouchSource {
    /// Delivers every scripted frame, in order, and closes the channel.
    fn start(&self) -> Result<mpsc::Receiver<RawTouchEvent>, CaptureError> {
        if self.started.swap(true, Ordering::SeqCst) {
            return Err(CaptureError::AlreadyStarted);
        }
        let frames = std::mem::take(&mut *self.frames_mut());
        let (tx, rx) = mpsc::channel();
        let mut delivered = 0usize;
        for event in frames.into_iter().flatten() {
            // The receiver is still held by us, so this cannot fail.
            if tx.send(event).is_err() {
                break;
            }
            delivered += 1;
        }
        debug!(events = delivered, "scripted touch frames delivered");
        Ok(rx)
    }

    /// Discards any frames that were scripted but never delivered.
    fn stop(&self) {
        self.frames_mut().clear();
    }
}
