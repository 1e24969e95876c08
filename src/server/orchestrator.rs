//! Multi-listener entry point.
//!
//! # Design Decisions
//! - Validation is one pass over every spec before anything starts
//! - Credentials are probed once per call and shared by all listeners
//! - One task per listener; serving is blocking and must not share a task
//! - First failure triggers bundled shutdown of the other listeners

use std::any::Any;
use std::collections::HashMap;
use std::io;
use std::panic::AssertUnwindSafe;
use std::path::PathBuf;

use futures_util::FutureExt;
use tokio::task::{JoinError, JoinSet};

use crate::error::ServeError;
use crate::lifecycle::Shutdown;
use crate::net::tls::{CredentialProbe, DEFAULT_TLS_DIR};
use crate::server::runner::ServerRunner;
use crate::server::spec::ServerSpec;

/// Options shared by every listener of one serve call.
#[derive(Debug, Clone)]
pub struct ServeOptions {
    /// Directory probed for `tls.crt` and `tls.key`.
    pub tls_dir: PathBuf,
}

impl ServeOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_tls_dir(mut self, tls_dir: impl Into<PathBuf>) -> Self {
        self.tls_dir = tls_dir.into();
        self
    }
}

impl Default for ServeOptions {
    fn default() -> Self {
        Self {
            tls_dir: PathBuf::from(DEFAULT_TLS_DIR),
        }
    }
}

/// Serve every spec until all are cancelled or one fails.
///
/// Uses the default TLS directory, see [`serve_with`].
pub async fn serve<I>(specs: I) -> Result<(), ServeError>
where
    I: IntoIterator<Item = ServerSpec>,
{
    serve_with(ServeOptions::default(), specs).await
}

/// Serve every spec until all are cancelled or one fails.
///
/// Returns `Ok(())` only if every listener was closed through its cancel
/// signal. On the first failure the remaining listeners are shut down and that
/// failure is returned once all of them have stopped.
pub async fn serve_with<I>(options: ServeOptions, specs: I) -> Result<(), ServeError>
where
    I: IntoIterator<Item = ServerSpec>,
{
    let specs: Vec<ServerSpec> = specs.into_iter().collect();
    for (index, spec) in specs.iter().enumerate() {
        spec.validate(index)?;
    }
    if specs.is_empty() {
        tracing::debug!("No server specs, nothing to serve");
        return Ok(());
    }

    let credentials = CredentialProbe::new(&options.tls_dir)
        .probe()
        .into_credentials()
        .await?;
    match &credentials {
        Some(creds) => tracing::info!(cert = %creds.paths().cert.display(), "TLS enabled"),
        None => tracing::info!(
            tls_dir = %options.tls_dir.display(),
            "No TLS material, serving plaintext"
        ),
    }

    let shutdown = Shutdown::new();
    let mut runners = JoinSet::new();
    let mut ports = HashMap::new();
    for (index, spec) in specs.into_iter().enumerate() {
        let port = spec.port;
        let runner = ServerRunner::new(spec, credentials.clone())
            .with_index(index)
            .with_shutdown(shutdown.subscribe());
        let task = runners.spawn(async move {
            AssertUnwindSafe(runner.run())
                .catch_unwind()
                .await
                .unwrap_or_else(|panic| Err(panicked(port, panic)))
        });
        ports.insert(task.id(), port);
    }
    tracing::info!(listeners = runners.len(), "Listeners spawned");

    let mut first_error = None;
    while let Some(joined) = runners.join_next().await {
        let result = joined.map_err(|e| {
            let port = ports.get(&e.id()).copied().unwrap_or_default();
            join_failed(port, e)
        });
        let Err(err) = result.and_then(|r| r) else {
            continue;
        };

        if first_error.is_none() {
            tracing::error!(
                port = ?err.port(),
                error = %err,
                "Listener failed, shutting down remaining listeners"
            );
            shutdown.trigger();
            first_error = Some(err);
        } else {
            tracing::warn!(port = ?err.port(), error = %err, "Listener failed during shutdown");
        }
    }

    match first_error {
        Some(err) => Err(err),
        None => Ok(()),
    }
}

fn panicked(port: u16, panic: Box<dyn Any + Send>) -> ServeError {
    let message = panic
        .downcast_ref::<&str>()
        .map(|s| s.to_string())
        .or_else(|| panic.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| "unknown panic".to_string());
    ServeError::FatalServe {
        port,
        source: io::Error::other(format!("server task panicked: {message}")),
    }
}

fn join_failed(port: u16, error: JoinError) -> ServeError {
    let message = if error.is_cancelled() {
        "server task was cancelled".to_string()
    } else {
        format!("server task failed: {error}")
    };
    ServeError::FatalServe {
        port,
        source: io::Error::other(message),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::InvalidSpecReason;

    #[tokio::test]
    async fn empty_batch_is_ok() {
        assert!(serve(Vec::new()).await.is_ok());
    }

    #[tokio::test]
    async fn validation_precedes_credentials() {
        let tmp = tempfile::tempdir().unwrap();
        std::fs::write(tmp.path().join("tls.crt"), "garbage").unwrap();

        let options = ServeOptions::new().with_tls_dir(tmp.path());
        let err = serve_with(options, vec![ServerSpec::new(0).register(|_| {})])
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            ServeError::InvalidSpec {
                reason: InvalidSpecReason::MissingPort,
                ..
            }
        ));
    }

    #[test]
    fn panic_payload_is_reported() {
        let err = panicked(7070, Box::new("boom"));
        assert_eq!(err.port(), Some(7070));
        assert!(err.to_string().contains("boom"));
    }

    #[tokio::test]
    async fn aborted_task_is_a_failure() {
        let task = tokio::spawn(std::future::pending::<()>());
        task.abort();
        let join_error = task.await.unwrap_err();

        let err = join_failed(7071, join_error);
        assert!(matches!(err, ServeError::FatalServe { port: 7071, .. }));
        assert!(err.to_string().contains("cancelled"));
    }
}
