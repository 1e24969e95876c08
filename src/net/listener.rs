//! TCP listener lifecycle.
//!
//! # Responsibilities
//! - Bind one port on all interfaces
//! - Hand the socket to the serve loop
//! - Close the listener when its cancel signal or the batch shutdown fires
//!
//! # Design Decisions
//! - Closing goes through the server handle, so the accept loop returns `Ok`
//! - Closing twice is a no-op

use std::net::{Ipv4Addr, SocketAddr};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use axum_server::Handle;
use tokio::net::TcpListener;
use tokio::task::JoinHandle;

use crate::error::ServeError;
use crate::lifecycle::{CancelSignal, ShutdownListener};

/// A bound listener waiting to be served.
#[derive(Debug)]
pub struct ServerListener {
    /// The underlying socket, non-blocking.
    inner: std::net::TcpListener,
    local_addr: SocketAddr,
    handle: ListenerHandle,
}

impl ServerListener {
    /// Bind `0.0.0.0:port`.
    pub async fn bind(port: u16) -> Result<Self, ServeError> {
        let bind_err = |source| ServeError::Bind { port, source };

        let addr = SocketAddr::from((Ipv4Addr::UNSPECIFIED, port));
        let listener = TcpListener::bind(addr).await.map_err(bind_err)?;
        let local_addr = listener.local_addr().map_err(bind_err)?;
        let inner = listener.into_std().map_err(bind_err)?;

        tracing::info!(port, address = %local_addr, "Listener bound");

        Ok(Self {
            inner,
            local_addr,
            handle: ListenerHandle::new(port),
        })
    }

    pub fn port(&self) -> u16 {
        self.handle.port
    }

    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// Get a handle that closes this listener.
    pub fn handle(&self) -> ListenerHandle {
        self.handle.clone()
    }

    /// Spawn the cancellation watcher.
    ///
    /// The listener is closed when `cancel` fires or, if given, when the batch
    /// shutdown triggers. With neither, the watcher never closes it.
    pub fn watch(
        &self,
        cancel: Option<CancelSignal>,
        shutdown: Option<ShutdownListener>,
    ) -> JoinHandle<()> {
        let handle = self.handle();
        tokio::spawn(async move {
            let cancelled = async {
                match cancel {
                    Some(signal) => signal.fired().await,
                    None => std::future::pending().await,
                }
            };
            let batch = async {
                match shutdown {
                    Some(mut listener) => listener.recv().await,
                    None => std::future::pending().await,
                }
            };

            tokio::select! {
                _ = cancelled => tracing::info!(port = handle.port, "Cancellation requested"),
                _ = batch => tracing::info!(port = handle.port, "Batch shutdown requested"),
            }
            handle.close();
        })
    }

    pub(crate) fn into_parts(self) -> (std::net::TcpListener, Handle) {
        let server_handle = self.handle.server.clone();
        (self.inner, server_handle)
    }
}

/// Close hook for one listener. Cheap to clone.
#[derive(Debug, Clone)]
pub struct ListenerHandle {
    port: u16,
    server: Handle,
    closed: Arc<AtomicBool>,
}

impl ListenerHandle {
    fn new(port: u16) -> Self {
        Self {
            port,
            server: Handle::new(),
            closed: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Stop accepting and drop open connections.
    pub fn close(&self) {
        if self.closed.swap(true, Ordering::SeqCst) {
            tracing::debug!(port = self.port, "Listener already closed");
            return;
        }
        self.server.shutdown();
        tracing::info!(port = self.port, "Listener closed");
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }

    /// Address the serve loop is accepting on, once it has started.
    pub async fn listening(&self) -> Option<SocketAddr> {
        self.server.listening().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lifecycle::{cancel_pair, Shutdown};
    use std::time::Duration;

    fn free_port() -> u16 {
        std::net::TcpListener::bind("0.0.0.0:0")
            .unwrap()
            .local_addr()
            .unwrap()
            .port()
    }

    #[tokio::test]
    async fn bind_reports_port() {
        let port = free_port();
        let listener = ServerListener::bind(port).await.unwrap();
        assert_eq!(listener.port(), port);
        assert_eq!(listener.local_addr().port(), port);
    }

    #[tokio::test]
    async fn bind_conflict_is_bind_error() {
        let occupied = std::net::TcpListener::bind("0.0.0.0:0").unwrap();
        let port = occupied.local_addr().unwrap().port();

        let err = ServerListener::bind(port).await.unwrap_err();
        match err {
            ServeError::Bind { port: p, .. } => assert_eq!(p, port),
            other => panic!("expected Bind, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn double_close_is_noop() {
        let listener = ServerListener::bind(free_port()).await.unwrap();
        let handle = listener.handle();
        assert!(!handle.is_closed());
        handle.close();
        handle.close();
        assert!(handle.is_closed());
    }

    #[tokio::test]
    async fn cancel_closes_listener() {
        let listener = ServerListener::bind(free_port()).await.unwrap();
        let handle = listener.handle();
        let (cancel, signal) = cancel_pair();

        let watcher = listener.watch(Some(signal), None);
        cancel.cancel();

        tokio::time::timeout(Duration::from_secs(1), watcher)
            .await
            .unwrap()
            .unwrap();
        assert!(handle.is_closed());
    }

    #[tokio::test]
    async fn batch_shutdown_closes_listener() {
        let listener = ServerListener::bind(free_port()).await.unwrap();
        let handle = listener.handle();
        let shutdown = Shutdown::new();

        let watcher = listener.watch(None, Some(shutdown.subscribe()));
        shutdown.trigger();

        tokio::time::timeout(Duration::from_secs(1), watcher)
            .await
            .unwrap()
            .unwrap();
        assert!(handle.is_closed());
    }
}
