//! Domain entities for TapDeck.
//!
//! Pure touch-classification logic with no sockets, threads, or OS calls.
//! Everything here is synchronous and total: each input update is resolved
//! immediately against the current state and never fails.
//!
//! # How the pieces fit together (for beginners)
//!
//! ```text
//! TouchEvent ──► ContactTracker (record position first)
//!                     │
//!                     ▼
//!               TouchClassifier ──► key zone claim / release  ──► KeyDown / KeyUp
//!                     │
//!                     └──► ModePolicy (free finger on trackpad) ──► Delta / AbsolutePosition
//! ```
//!
//! The [`layout`] module supplies the zone rectangles that the classifier
//! tests contact positions against.  Resizing the surface rebuilds them.

/// Touch classifier state machine.
pub mod classifier;
/// Per-pointer position and size bookkeeping.
pub mod contact;
/// Key and trackpad zone geometry.
pub mod layout;
/// Relative / absolute trackpad interpretation.
pub mod mode;
