//! Network infrastructure for the sender.
//!
//! # Sub-modules
//!
//! - **`outbound`** – The single bounded outbound queue and the task that
//!   drains it in order.  Implements the application's `PacketSink`.
//!
//! - **`udp`** – The UDP socket that carries datagrams to the receiver.

pub mod outbound;
pub mod udp;

pub use outbound::{DatagramTransport, OutboundQueue, OutboundStats, OutboundWorker, TransportError};
pub use udp::UdpTransport;
