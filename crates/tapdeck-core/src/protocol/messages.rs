//! TapDeck wire message types.
//!
//! Every message is a single UTF-8 text datagram with no length prefix and no
//! framing delimiter.  The variant is identified by its leading characters:
//!
//! | Message            | Text              |
//! |--------------------|-------------------|
//! | key down           | `KD` + label      |
//! | key up             | `KU` + label      |
//! | relative delta     | decimal, e.g. `12.5`, `-3.0` |
//! | absolute position  | `A` + decimal in `0.0..=1.0` |

use serde::{Deserialize, Serialize};

// ── Protocol constants ────────────────────────────────────────────────────────

/// UDP port the receiver listens on.
pub const DEFAULT_PORT: u16 = 8888;

pub const KEY_DOWN_PREFIX: &str = "KD";
pub const KEY_UP_PREFIX: &str = "KU";
pub const ABSOLUTE_PREFIX: &str = "A";

/// Upper bound on any encoded message.
///
/// The longest message is an absolute position: one prefix byte plus the
/// shortest round-trip `f32` text (at most 16 bytes), well under this limit.
pub const MAX_DATAGRAM_LEN: usize = 64;

// ── Semantic events ───────────────────────────────────────────────────────────

/// A classified touch outcome, ready to be encoded and sent.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum SemanticEvent {
    /// A labeled key was pressed.
    KeyDown(char),
    /// A labeled key was released.
    KeyUp(char),
    /// Scaled horizontal trackpad movement.
    Delta(f32),
    /// Normalized horizontal trackpad position in `0.0..=1.0`.
    AbsolutePosition(f32),
}

impl SemanticEvent {
    /// Returns the wire kind of this event.
    pub fn kind(&self) -> MessageKind {
        match self {
            SemanticEvent::KeyDown(_) => MessageKind::KeyDown,
            SemanticEvent::KeyUp(_) => MessageKind::KeyUp,
            SemanticEvent::Delta(_) => MessageKind::Delta,
            SemanticEvent::AbsolutePosition(_) => MessageKind::AbsolutePosition,
        }
    }

    /// Returns the key label for key events.
    pub fn label(&self) -> Option<char> {
        match *self {
            SemanticEvent::KeyDown(c) | SemanticEvent::KeyUp(c) => Some(c),
            _ => None,
        }
    }
}

// ── Message kinds ─────────────────────────────────────────────────────────────

/// Discriminant of a wire message, resolved from its leading text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MessageKind {
    KeyDown,
    KeyUp,
    Delta,
    AbsolutePosition,
}

impl MessageKind {
    /// Text that precedes the payload on the wire (empty for deltas).
    pub fn prefix(self) -> &'static str {
        match self {
            MessageKind::KeyDown => KEY_DOWN_PREFIX,
            MessageKind::KeyUp => KEY_UP_PREFIX,
            MessageKind::Delta => "",
            MessageKind::AbsolutePosition => ABSOLUTE_PREFIX,
        }
    }

    /// Resolves the kind of a decoded message from its text.
    ///
    /// Key prefixes are checked before the single-letter absolute prefix;
    /// anything else is treated as a bare delta.
    pub fn classify(text: &str) -> Self {
        if text.starts_with(KEY_DOWN_PREFIX) {
            MessageKind::KeyDown
        } else if text.starts_with(KEY_UP_PREFIX) {
            MessageKind::KeyUp
        } else if text.starts_with(ABSOLUTE_PREFIX) {
            MessageKind::AbsolutePosition
        } else {
            MessageKind::Delta
        }
    }
}
