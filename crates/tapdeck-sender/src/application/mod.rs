//! Application layer use cases for the sender.
//!
//! Use cases orchestrate the domain (the touch classifier) and depend on
//! traits rather than concrete sockets, so they run unchanged in unit tests.
//!
//! # Sub-modules
//!
//! - **`process_touch`** – Classifies every raw touch event and submits the
//!   encoded result to the outbound path.  Runs on every contact update.

pub mod process_touch;
