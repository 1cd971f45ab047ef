//! Infrastructure layer for the sender.
//!
//! Contains OS-facing adapters: touch input sources, the UDP outbound path,
//! and configuration file storage.
//!
//! **Dependency rule**: this layer may depend on `application` and
//! `tapdeck_core`, but MUST NOT be imported by the domain layer.

pub mod input_source;
pub mod network;
pub mod storage;
