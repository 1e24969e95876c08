//! Configuration schema definitions.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::net::tls::DEFAULT_TLS_DIR;
use crate::version::Version;

/// Default RPC port.
pub const DEFAULT_PORT: u16 = 7070;

/// Default per-message ceiling: 20 MiB.
pub const DEFAULT_MAX_MESSAGE_SIZE: usize = 20 * 1024 * 1024;

/// Root configuration for the bootstrap binary.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct BootstrapConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Directory probed for `tls.crt` and `tls.key`.
    pub tls_dir: PathBuf,

    /// Message-size ceiling for listeners that don't set their own.
    pub max_message_size: usize,

    /// Version reported by the built-in version service.
    pub version: Option<Version>,

    pub listeners: Vec<ListenerConfig>,
}

impl Default for BootstrapConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            tls_dir: PathBuf::from(DEFAULT_TLS_DIR),
            max_message_size: DEFAULT_MAX_MESSAGE_SIZE,
            version: None,
            listeners: vec![ListenerConfig::default()],
        }
    }
}

impl BootstrapConfig {
    /// Message-size ceiling for one listener.
    pub fn max_message_size_for(&self, listener: &ListenerConfig) -> usize {
        listener.max_message_size.unwrap_or(self.max_message_size)
    }
}

/// One listener.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ListenerConfig {
    /// Listener identifier for logging.
    pub name: String,

    pub port: u16,

    /// Overrides the top-level `max_message_size`.
    #[serde(default)]
    pub max_message_size: Option<usize>,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            name: "grpc".to_string(),
            port: DEFAULT_PORT,
            max_message_size: None,
        }
    }
}
