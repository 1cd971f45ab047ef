//! # tapdeck-core
//!
//! Touch classification engine and wire codec for TapDeck, a touchscreen
//! remote-input device.  A tablet surface is split into labeled key zones and
//! a horizontal trackpad; every contact update is classified as a key press,
//! a trackpad drag, or a resting palm, and the result is encoded as a short
//! text datagram for the receiver.
//!
//! This crate has no dependencies on OS APIs, UI frameworks, or network
//! sockets.  The sender binary (`tapdeck-sender`) wires it to an input source
//! and a UDP transport.
//!
//! - **`domain`** – layout geometry, contact tracking, the classifier state
//!   machine, and the relative/absolute mode policy.
//! - **`protocol`** – semantic events and their text encoding.

pub mod domain;
pub mod protocol;

// Re-export the most-used types at the crate root.
pub use domain::classifier::{ClassifierConfig, KeyZone, TouchClassifier, TouchEvent};
pub use domain::contact::{Contact, ContactTracker, PointerId};
pub use domain::layout::{
    compute_layout, KeySide, LayoutConfig, LayoutError, Point, Rect, SurfaceLayout, TrackpadZone,
};
pub use domain::mode::{Mode, ModeHandle, ModePolicy, ParseModeError};
pub use protocol::codec::{decode_event, encode_event, ProtocolError};
pub use protocol::messages::{MessageKind, SemanticEvent, DEFAULT_PORT};
