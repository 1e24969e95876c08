//! Bootstrap error types.
//!
//! Every variant names the listener (port or spec index) it belongs to, so a
//! failed batch tells the caller which listener aborted it and why.

use std::path::PathBuf;
use thiserror::Error;

/// Why a [`ServerSpec`](crate::ServerSpec) was rejected before startup.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum InvalidSpecReason {
    /// The spec's port is zero.
    #[error("must specify a non-zero port")]
    MissingPort,

    /// The spec carries no registration callback.
    #[error("must specify a registration callback")]
    MissingRegistration,
}

/// Errors returned by [`serve`](crate::serve).
#[derive(Debug, Error)]
pub enum ServeError {
    /// A spec failed up-front validation. No listener was opened.
    #[error("invalid server spec #{index} (port {port}): {reason}")]
    InvalidSpec {
        index: usize,
        port: u16,
        reason: InvalidSpecReason,
    },

    /// TLS material exists but could not be loaded. No listener was opened.
    #[error("couldn't build transport credentials from {}: {source}", .path.display())]
    CredentialLoad {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The listener could not bind its port.
    #[error("failed to bind port {port}: {source}")]
    Bind {
        port: u16,
        #[source]
        source: std::io::Error,
    },

    /// The serve loop failed after the listener was bound.
    #[error("server on port {port} failed: {source}")]
    FatalServe {
        port: u16,
        #[source]
        source: std::io::Error,
    },
}

impl ServeError {
    /// Port of the listener this error belongs to, if any.
    pub fn port(&self) -> Option<u16> {
        match self {
            Self::InvalidSpec { port, .. }
            | Self::Bind { port, .. }
            | Self::FatalServe { port, .. } => Some(*port),
            Self::CredentialLoad { .. } => None,
        }
    }

    /// Returns true if the error was raised before any listener started.
    pub fn is_startup_error(&self) -> bool {
        matches!(self, Self::InvalidSpec { .. } | Self::CredentialLoad { .. })
    }
}
