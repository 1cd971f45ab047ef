//! ProcessTouchUseCase: classifies touch input and hands encoded datagrams to
//! the outbound path.
//!
//! This use case is the heart of the sender.  It owns the
//! [`TouchClassifier`], feeds it every [`RawTouchEvent`] from the input
//! source, encodes each produced [`SemanticEvent`], and submits the bytes to a
//! [`PacketSink`].
//!
//! # Threading
//!
//! All methods take `&mut self`, so the classifier state (zone ownership and
//! contact positions) is only ever touched from one place at a time.  The
//! sender binary runs the use case on a dedicated input thread; callers that
//! deliver input from several threads must wrap it in a single `Mutex`.
//!
//! # Failure handling
//!
//! Submission is fire-and-forget.  A full or closed sink is counted and
//! logged, and the classifier keeps running; link state never feeds back into
//! touch state.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{mpsc, Arc};
use std::time::Duration;

use tapdeck_core::{encode_event, SemanticEvent, TouchClassifier};
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::infrastructure::input_source::RawTouchEvent;

/// How often [`ProcessTouchUseCase::run`] re-checks its running flag while idle.
const POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Error returned by a [`PacketSink`] that could not accept a datagram.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum SinkError {
    /// The outbound queue is at capacity; the datagram was dropped.
    #[error("outbound queue is full")]
    Full,
    /// The outbound path has been disconnected.
    #[error("outbound queue is closed")]
    Closed,
}

/// Non-blocking destination for encoded datagrams.
///
/// Implementations must return immediately; they are called on the input
/// path.
#[cfg_attr(test, mockall::automock)]
pub trait PacketSink: Send + Sync {
    /// Queues one datagram for transmission.
    fn submit(&self, datagram: Vec<u8>) -> Result<(), SinkError>;
}

/// Counters describing what the use case has produced so far.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct DispatchStats {
    /// Raw input events processed (including resizes and mode changes).
    pub input_events: u64,
    /// Semantic events produced by the classifier.
    pub events_produced: u64,
    /// Datagrams accepted by the sink.
    pub datagrams_queued: u64,
    /// Datagrams the sink refused.
    pub datagrams_dropped: u64,
}

/// The Process Touch use case.
pub struct ProcessTouchUseCase {
    classifier: TouchClassifier,
    sink: Arc<dyn PacketSink>,
    stats: DispatchStats,
}

impl ProcessTouchUseCase {
    pub fn new(classifier: TouchClassifier, sink: Arc<dyn PacketSink>) -> Self {
        Self {
            classifier,
            sink,
            stats: DispatchStats::default(),
        }
    }

    /// Handles one raw input event.
    ///
    /// Returns the semantic event produced by the classifier, if any.  The
    /// event has already been submitted to the sink when this returns.
    pub fn handle_event(&mut self, event: RawTouchEvent) -> Option<SemanticEvent> {
        self.stats.input_events += 1;

        let touch = match event {
            RawTouchEvent::Resize { width, height } => {
                self.classifier.relayout(width, height);
                return None;
            }
            RawTouchEvent::SetMode(mode) => {
                if self.classifier.mode() != mode {
                    info!(%mode, "trackpad mode changed");
                }
                self.classifier.mode_handle().set(mode);
                return None;
            }
            other => other.to_touch_event()?,
        };

        let semantic = self.classifier.handle(touch)?;
        self.stats.events_produced += 1;
        self.dispatch(&semantic);
        Some(semantic)
    }

    /// Drains `events` until the channel disconnects or `running` is cleared.
    ///
    /// Returns the final counters.
    pub fn run(&mut self, events: &mpsc::Receiver<RawTouchEvent>, running: &AtomicBool) -> DispatchStats {
        while running.load(Ordering::Relaxed) {
            match events.recv_timeout(POLL_INTERVAL) {
                Ok(event) => {
                    self.handle_event(event);
                }
                Err(mpsc::RecvTimeoutError::Timeout) => {}
                Err(mpsc::RecvTimeoutError::Disconnected) => {
                    debug!("input source closed");
                    break;
                }
            }
        }
        self.stats
    }

    pub fn stats(&self) -> DispatchStats {
        self.stats
    }

    pub fn classifier(&self) -> &TouchClassifier {
        &self.classifier
    }

    // ── Private helpers ───────────────────────────────────────────────────────

    fn dispatch(&mut self, event: &SemanticEvent) {
        let datagram = encode_event(event);
        match self.sink.submit(datagram) {
            Ok(()) => {
                self.stats.datagrams_queued += 1;
                debug!(?event, "datagram queued");
            }
            Err(SinkError::Full) => {
                self.stats.datagrams_dropped += 1;
                warn!(?event, "outbound queue full; datagram dropped");
            }
            Err(SinkError::Closed) => {
                self.stats.datagrams_dropped += 1;
                debug!(?event, "outbound queue closed; datagram dropped");
            }
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
