//! One running server instance.
//!
//! Lifecycle:
//! ```text
//! TransportOptions → RpcServer (+ version service) → registration callback
//!     → bind → watcher → serve until closed
//! ```

use std::io;

use axum::Router;

use crate::error::{InvalidSpecReason, ServeError};
use crate::lifecycle::ShutdownListener;
use crate::net::listener::ServerListener;
use crate::net::tls::ServerCredentials;
use crate::server::options::TransportOptions;
use crate::server::rpc::RpcServer;
use crate::server::spec::ServerSpec;
use crate::version;

/// Runs one [`ServerSpec`] to completion.
pub struct ServerRunner {
    spec: ServerSpec,
    index: usize,
    credentials: Option<ServerCredentials>,
    shutdown: Option<ShutdownListener>,
}

impl ServerRunner {
    pub fn new(spec: ServerSpec, credentials: Option<ServerCredentials>) -> Self {
        Self {
            spec,
            index: 0,
            credentials,
            shutdown: None,
        }
    }

    /// Position of the spec in its batch, reported by validation errors.
    pub fn with_index(mut self, index: usize) -> Self {
        self.index = index;
        self
    }

    /// Also close the listener when the batch shutdown triggers.
    pub fn with_shutdown(mut self, shutdown: ShutdownListener) -> Self {
        self.shutdown = Some(shutdown);
        self
    }

    /// Build, bind and serve.
    ///
    /// Returns `Ok(())` once the listener is closed by its cancel signal or the
    /// batch shutdown.
    pub async fn run(self) -> Result<(), ServeError> {
        self.spec.validate(self.index)?;
        let index = self.index;
        let ServerSpec {
            port,
            max_message_size,
            registration,
            cancel,
            version,
        } = self.spec;

        let Some(registration) = registration else {
            return Err(ServeError::InvalidSpec {
                index,
                port,
                reason: InvalidSpecReason::MissingRegistration,
            });
        };

        let options = TransportOptions::new(max_message_size).with_credentials(self.credentials);

        let mut server = RpcServer::new();
        if let Some(version) = version {
            server.add_service(version::SERVICE_NAME, version::version_service(version));
        }
        registration(&mut server);
        tracing::debug!(port, services = ?server.services(), "Services registered");
        let router = server.into_router(&options);

        let listener = ServerListener::bind(port).await?;
        let watcher = listener.watch(cancel, self.shutdown);

        tracing::info!(
            port,
            tls = options.is_tls(),
            max_message_size,
            "Server starting"
        );

        let result = serve_listener(listener, router, &options).await;
        watcher.abort();

        match result {
            Ok(()) => {
                tracing::info!(port, "Server stopped");
                Ok(())
            }
            Err(source) => {
                tracing::error!(port, error = %source, "Server failed");
                Err(ServeError::FatalServe { port, source })
            }
        }
    }
}

async fn serve_listener(
    listener: ServerListener,
    router: Router,
    options: &TransportOptions,
) -> io::Result<()> {
    let (socket, handle) = listener.into_parts();
    let app = router.into_make_service();

    match &options.credentials {
        Some(credentials) => {
            let config = credentials.rustls_config();
            let mut server =
                axum_server::tls_rustls::from_tcp_rustls(socket, config).handle(handle);
            options.apply(server.http_builder());
            server.serve(app).await
        }
        None => {
            let mut server = axum_server::from_tcp(socket).handle(handle);
            options.apply(server.http_builder());
            server.serve(app).await
        }
    }
}
