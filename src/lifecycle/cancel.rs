//! One-shot cancellation for a single listener.

use tokio::sync::oneshot;

/// Create a linked cancellation handle and signal.
///
/// The signal goes into a [`ServerSpec`](crate::ServerSpec); the handle stays
/// with whoever decides when that listener should stop.
pub fn cancel_pair() -> (CancelHandle, CancelSignal) {
    let (tx, rx) = oneshot::channel();
    (CancelHandle { tx }, CancelSignal { rx })
}

/// Firing side of a cancellation pair.
#[derive(Debug)]
pub struct CancelHandle {
    tx: oneshot::Sender<()>,
}

impl CancelHandle {
    /// Request shutdown of the listener holding the matching signal.
    pub fn cancel(self) {
        // The receiver is gone once its listener stopped; nothing to do then.
        let _ = self.tx.send(());
    }

    /// Returns true if the matching signal has already been dropped.
    pub fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }
}

/// Receiving side of a cancellation pair.
///
/// Fires when the handle is cancelled or dropped.
#[derive(Debug)]
pub struct CancelSignal {
    rx: oneshot::Receiver<()>,
}

impl CancelSignal {
    /// Wait until the signal fires.
    pub async fn fired(self) {
        let _ = self.rx.await;
    }
}
