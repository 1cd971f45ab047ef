//! Single ordered outbound queue.
//!
//! Every datagram produced on the input thread goes through one bounded
//! channel drained by exactly one sender task, so the receiver sees messages
//! in the order they were classified (a `KU` can never overtake its `KD`).
//!
//! ```text
//!  input thread ──try_send──► [ bounded mpsc ] ──► sender task ──► DatagramTransport
//!                  (never blocks;                   (one at a time,
//!                   full ⇒ drop)                     errors logged)
//! ```
//!
//! Closing works two ways:
//!
//! - dropping every [`OutboundQueue`] handle lets the task drain what is
//!   already queued and then finish;
//! - [`OutboundQueue::disconnect`] stops sending immediately and discards the
//!   backlog.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;
use tokio::sync::{mpsc, Notify};
use tracing::{debug, info, warn};

use crate::application::process_touch::{PacketSink, SinkError};

/// Error type for datagram transports.
#[derive(Debug, Error)]
pub enum TransportError {
    /// The bind address is not a valid IP address.
    #[error("invalid bind address {0:?}")]
    InvalidBindAddress(String),

    /// The local socket could not be bound.
    #[error("failed to bind UDP socket on {addr}: {source}")]
    Bind {
        addr: std::net::SocketAddr,
        #[source]
        source: std::io::Error,
    },

    /// The target host name could not be resolved.
    #[error("failed to resolve {target}: {source}")]
    Resolve {
        target: String,
        #[source]
        source: std::io::Error,
    },

    /// Resolution succeeded but yielded no address.
    #[error("no address found for {0}")]
    NoAddress(String),

    /// Sending a datagram failed.
    #[error("send failed: {0}")]
    Send(#[source] std::io::Error),
}

/// Async seam over the socket that actually carries datagrams.
#[async_trait]
pub trait DatagramTransport: Send + Sync {
    /// Sends one datagram.  Implementations must not retry.
    async fn send(&self, datagram: &[u8]) -> Result<(), TransportError>;
}

/// Counters reported by the sender task when it finishes.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct OutboundStats {
    pub sent: u64,
    pub failed: u64,
    /// Datagrams still queued when the queue was disconnected.
    pub discarded: u64,
}

#[derive(Debug, Default)]
struct Shutdown {
    disconnected: AtomicBool,
    notify: Notify,
}

/// Cloneable, non-blocking handle to the outbound queue.
#[derive(Debug, Clone)]
pub struct OutboundQueue {
    tx: mpsc::Sender<Vec<u8>>,
    shutdown: Arc<Shutdown>,
}

/// The receiving half, to be driven by exactly one task.
#[derive(Debug)]
pub struct OutboundWorker {
    rx: mpsc::Receiver<Vec<u8>>,
    shutdown: Arc<Shutdown>,
}

impl OutboundQueue {
    /// Creates a queue holding at most `capacity` datagrams (minimum 1).
    pub fn bounded(capacity: usize) -> (Self, OutboundWorker) {
        let (tx, rx) = mpsc::channel(capacity.max(1));
        let shutdown = Arc::new(Shutdown::default());
        (
            Self {
                tx,
                shutdown: Arc::clone(&shutdown),
            },
            OutboundWorker { rx, shutdown },
        )
    }

    /// Creates a queue and spawns its sender task on the current runtime.
    ///
    /// Must be called from within a Tokio runtime.
    pub fn spawn<T>(
        capacity: usize,
        transport: Arc<T>,
    ) -> (Self, tokio::task::JoinHandle<OutboundStats>)
    where
        T: DatagramTransport + 'static,
    {
        let (queue, worker) = Self::bounded(capacity);
        let handle = tokio::spawn(worker.run(transport));
        (queue, handle)
    }

    /// Stops all further sends; queued datagrams are discarded.
    pub fn disconnect(&self) {
        self.shutdown.disconnected.store(true, Ordering::Relaxed);
        self.shutdown.notify.notify_one();
    }

    pub fn is_disconnected(&self) -> bool {
        self.shutdown.disconnected.load(Ordering::Relaxed)
    }
}

impl PacketSink for OutboundQueue {
    fn submit(&self, datagram: Vec<u8>) -> Result<(), SinkError> {
        if self.is_disconnected() {
            return Err(SinkError::Closed);
        }
        self.tx.try_send(datagram).map_err(|e| match e {
            mpsc::error::TrySendError::Full(_) => SinkError::Full,
            mpsc::error::TrySendError::Closed(_) => SinkError::Closed,
        })
    }
}

impl OutboundWorker {
    /// Sends queued datagrams in order until the queue closes or disconnects.
    pub async fn run<T>(mut self, transport: Arc<T>) -> OutboundStats
    where
        T: DatagramTransport + ?Sized,
    {
        let mut stats = OutboundStats::default();
        info!("outbound sender started");

        loop {
            let next = tokio::select! {
                _ = self.shutdown.notify.notified() => None,
                next = self.rx.recv() => next,
            };
            let Some(datagram) = next else { break };
            if self.shutdown.disconnected.load(Ordering::Relaxed) {
                stats.discarded += 1;
                break;
            }
            match transport.send(&datagram).await {
                Ok(()) => stats.sent += 1,
                Err(e) => {
                    stats.failed += 1;
                    warn!("dropping datagram: {e}");
                }
            }
        }

        if self.shutdown.disconnected.load(Ordering::Relaxed) {
            self.rx.close();
            while self.rx.try_recv().is_ok() {
                stats.discarded += 1;
            }
            debug!(discarded = stats.discarded, "outbound queue disconnected");
        }
        info!(sent = stats.sent, failed = stats.failed, "outbound sender stopped");
        stats
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    #[derive(Default)]
    struct RecordingTransport {
        sent: Mutex<Vec<Vec<u8>>>,
        fail_every_other: bool,
    }

    #[async_trait]
    impl DatagramTransport for RecordingTransport {
        async fn send(&self, datagram: &[u8]) -> Result<(), TransportError> {
            let mut sent = self.sent.lock().unwrap();
            sent.push(datagram.to_vec());
            if self.fail_every_other && sent.len() % 2 == 0 {
                return Err(TransportError::Send(std::io::Error::other("injected failure")));
            }
            Ok(())
        }
    }

    #[tokio::test]
    async fn test_datagrams_are_sent_in_submission_order() {
        // Arrange
        let transport = Arc::new(RecordingTransport::default());
        let (queue, handle) = OutboundQueue::spawn(16, Arc::clone(&transport));

        // Act
        for text in ["KDs", "12.0", "-3.0", "KUs"] {
            queue.submit(text.as_bytes().to_vec()).expect("queue has room");
        }
        drop(queue);
        let stats = handle.await.expect("sender task");

        // Assert
        let expected: Vec<Vec<u8>> = ["KDs", "12.0", "-3.0", "KUs"]
            .iter()
            .map(|t| t.as_bytes().to_vec())
            .collect();
        assert_eq!(*transport.sent.lock().unwrap(), expected);
        assert_eq!(stats.sent, 4);
    }

    #[tokio::test]
    async fn test_full_queue_drops_without_blocking() {
        // Worker is not running, so nothing drains.
        let (queue, _worker) = OutboundQueue::bounded(2);

        assert_eq!(queue.submit(b"1.0".to_vec()), Ok(()));
        assert_eq!(queue.submit(b"2.0".to_vec()), Ok(()));
        assert_eq!(queue.submit(b"3.0".to_vec()), Err(SinkError::Full));
    }

    #[tokio::test]
    async fn test_zero_capacity_is_raised_to_one() {
        let (queue, _worker) = OutboundQueue::bounded(0);
        assert_eq!(queue.submit(b"KDs".to_vec()), Ok(()));
        assert_eq!(queue.submit(b"KUs".to_vec()), Err(SinkError::Full));
    }

    #[tokio::test]
    async fn test_transport_errors_are_counted_and_sending_continues() {
        let transport = Arc::new(RecordingTransport {
            fail_every_other: true,
            ..Default::default()
        });
        let (queue, handle) = OutboundQueue::spawn(8, Arc::clone(&transport));

        for i in 0..4 {
            queue.submit(format!("{i}.0").into_bytes()).unwrap();
        }
        drop(queue);
        let stats = handle.await.unwrap();

        assert_eq!(stats.sent, 2);
        assert_eq!(stats.failed, 2);
        assert_eq!(transport.sent.lock().unwrap().len(), 4);
    }

    #[tokio::test]
    async fn test_disconnect_rejects_new_datagrams_and_discards_backlog() {
        // Arrange: fill the queue before the worker starts.
        let transport = Arc::new(RecordingTransport::default());
        let (queue, worker) = OutboundQueue::bounded(8);
        queue.submit(b"KDs".to_vec()).unwrap();
        queue.submit(b"KUs".to_vec()).unwrap();

        // Act
        queue.disconnect();
        let stats = worker.run(Arc::clone(&transport)).await;

        // Assert
        assert!(queue.is_disconnected());
        assert_eq!(queue.submit(b"1.0".to_vec()), Err(SinkError::Closed));
        assert_eq!(stats.sent, 0);
        assert_eq!(stats.discarded, 2);
        assert!(transport.sent.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_submit_after_worker_dropped_reports_closed() {
        let (queue, worker) = OutboundQueue::bounded(4);
        drop(worker);
        assert_eq!(queue.submit(b"KDs".to_vec()), Err(SinkError::Closed));
    }
}
