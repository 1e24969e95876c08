//! Per-listener server specification.

use std::fmt;
use std::sync::Arc;

use crate::error::{InvalidSpecReason, ServeError};
use crate::lifecycle::CancelSignal;
use crate::server::rpc::RpcServer;
use crate::version::Version;

/// Callback that attaches services to a server instance.
///
/// Invoked exactly once per listener, before the listener accepts connections.
pub type Registration = Arc<dyn Fn(&mut RpcServer) + Send + Sync>;

/// One requested listener.
pub struct ServerSpec {
    /// TCP port to bind on all interfaces. Must be non-zero.
    pub port: u16,
    /// Byte ceiling for one request or response; `0` keeps the transport default.
    pub max_message_size: usize,
    pub registration: Option<Registration>,
    /// Fires to stop this listener only.
    pub cancel: Option<CancelSignal>,
    /// When set, the built-in version service is registered too.
    pub version: Option<Version>,
}

impl ServerSpec {
    pub fn new(port: u16) -> Self {
        Self {
            port,
            max_message_size: 0,
            registration: None,
            cancel: None,
            version: None,
        }
    }

    /// Set the registration callback.
    pub fn register<F>(self, register: F) -> Self
    where
        F: Fn(&mut RpcServer) + Send + Sync + 'static,
    {
        self.with_registration(Arc::new(register))
    }

    /// Set a registration callback that may be shared with other specs.
    pub fn with_registration(mut self, registration: Registration) -> Self {
        self.registration = Some(registration);
        self
    }

    pub fn with_max_message_size(mut self, max_message_size: usize) -> Self {
        self.max_message_size = max_message_size;
        self
    }

    pub fn with_cancel(mut self, cancel: CancelSignal) -> Self {
        self.cancel = Some(cancel);
        self
    }

    pub fn with_version(mut self, version: Version) -> Self {
        self.version = Some(version);
        self
    }

    /// Check the spec invariants. `index` is the spec's position in its batch.
    pub fn validate(&self, index: usize) -> Result<(), ServeError> {
        let reason = if self.port == 0 {
            InvalidSpecReason::MissingPort
        } else if self.registration.is_none() {
            InvalidSpecReason::MissingRegistration
        } else {
            return Ok(());
        };
        Err(ServeError::InvalidSpec {
            index,
            port: self.port,
            reason,
        })
    }
}

impl fmt::Debug for ServerSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ServerSpec")
            .field("port", &self.port)
            .field("max_message_size", &self.max_message_size)
            .field("registration", &self.registration.is_some())
            .field("cancel", &self.cancel.is_some())
            .field("version", &self.version)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn reason(err: ServeError) -> InvalidSpecReason {
        match err {
            ServeError::InvalidSpec { reason, .. } => reason,
            other => panic!("expected InvalidSpec, got {:?}", other),
        }
    }

    #[test]
    fn valid_spec() {
        let spec = ServerSpec::new(7070).register(|_| {});
        assert!(spec.validate(0).is_ok());
    }

    #[test]
    fn zero_port_is_rejected() {
        let spec = ServerSpec::new(0).register(|_| {});
        assert_eq!(reason(spec.validate(3).unwrap_err()), InvalidSpecReason::MissingPort);
    }

    #[test]
    fn missing_registration_is_rejected() {
        let spec = ServerSpec::new(7070);
        let err = spec.validate(2).unwrap_err();
        match err {
            ServeError::InvalidSpec { index, port, reason } => {
                assert_eq!(index, 2);
                assert_eq!(port, 7070);
                assert_eq!(reason, InvalidSpecReason::MissingRegistration);
            }
            other => panic!("expected InvalidSpec, got {:?}", other),
        }
    }

    #[test]
    fn debug_hides_callback() {
        let spec = ServerSpec::new(7070).register(|_| {}).with_max_message_size(1024);
        let debug = format!("{:?}", spec);
        assert!(debug.contains("registration: true"));
        assert!(debug.contains("max_message_size: 1024"));
    }
}
