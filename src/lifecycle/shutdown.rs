//! Bundled shutdown for the listeners of one serve call.

use tokio::sync::broadcast;

/// Coordinator for bundled shutdown.
///
/// Every runner subscribes before it is spawned; one trigger reaches all of
/// them, including runners that have not reached their watcher yet.
#[derive(Debug)]
pub struct Shutdown {
    /// Broadcast channel sender.
    tx: broadcast::Sender<()>,
}

impl Shutdown {
    /// Create a new shutdown coordinator.
    pub fn new() -> Self {
        let (tx, _) = broadcast::channel(1);
        Self { tx }
    }

    /// Subscribe to the shutdown signal.
    pub fn subscribe(&self) -> ShutdownListener {
        ShutdownListener {
            rx: self.tx.subscribe(),
        }
    }

    /// Trigger the shutdown signal.
    ///
    /// Returns the number of runners that were still listening.
    pub fn trigger(&self) -> usize {
        self.tx.send(()).unwrap_or(0)
    }

    /// Get the number of active subscribers (runners still watching).
    pub fn receiver_count(&self) -> usize {
        self.tx.receiver_count()
    }
}

impl Default for Shutdown {
    fn default() -> Self {
        Self::new()
    }
}

/// A runner's subscription to [`Shutdown`].
#[derive(Debug)]
pub struct ShutdownListener {
    rx: broadcast::Receiver<()>,
}

impl ShutdownListener {
    /// Wait until shutdown is triggered or the coordinator is dropped.
    pub async fn recv(&mut self) {
        // Lagged and Closed both mean a trigger happened or can no longer happen
        // while this listener is still supervised.
        let _ = self.rx.recv().await;
    }
}
