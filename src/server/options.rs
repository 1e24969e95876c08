//! Transport options for one server instance.

use std::time::Duration;

use hyper_util::rt::{TokioExecutor, TokioTimer};
use hyper_util::server::conn::auto::Builder;

use crate::net::tls::ServerCredentials;

/// Shortest client keepalive interval the server tolerates.
pub const KEEPALIVE_MIN_TIME: Duration = Duration::from_secs(5);

/// How long a keepalive ping may go unanswered before the connection is dropped.
pub const KEEPALIVE_TIMEOUT: Duration = Duration::from_secs(20);

/// Keepalive policy.
///
/// The HTTP/2 stack does not report inbound PING frames, so clients pinging
/// faster than `min_time` are not rejected. The policy is approximated by
/// server-initiated keepalive every `min_time`, enabled only when idle
/// connections may be pinged. See [`TransportOptions::keepalive_interval`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeepalivePolicy {
    /// Minimum interval between pings.
    pub min_time: Duration,
    /// Whether pings are allowed on connections with no active streams.
    pub permit_without_stream: bool,
}

impl Default for KeepalivePolicy {
    fn default() -> Self {
        Self {
            min_time: KEEPALIVE_MIN_TIME,
            permit_without_stream: true,
        }
    }
}

/// Limits and policies applied to one server instance.
///
/// A size limit of `0` leaves the HTTP stack's default in place.
#[derive(Debug, Clone)]
pub struct TransportOptions {
    pub max_concurrent_streams: u32,
    pub max_recv_message_size: usize,
    pub max_send_message_size: usize,
    pub keepalive: KeepalivePolicy,
    pub credentials: Option<ServerCredentials>,
}

impl TransportOptions {
    /// Build the option set for a message-size ceiling.
    pub fn new(max_message_size: usize) -> Self {
        Self {
            max_concurrent_streams: u32::MAX,
            max_recv_message_size: max_message_size,
            max_send_message_size: max_message_size,
            keepalive: KeepalivePolicy::default(),
            credentials: None,
        }
    }

    pub fn with_credentials(mut self, credentials: Option<ServerCredentials>) -> Self {
        self.credentials = credentials;
        self
    }

    pub fn is_tls(&self) -> bool {
        self.credentials.is_some()
    }

    /// Server keepalive interval derived from the policy, if any.
    pub fn keepalive_interval(&self) -> Option<Duration> {
        self.keepalive
            .permit_without_stream
            .then_some(self.keepalive.min_time)
    }

    /// Apply the connection-level options to a hyper connection builder.
    ///
    /// Size limits are enforced per request by the router, see
    /// [`RpcServer::into_router`](crate::server::RpcServer::into_router).
    pub fn apply(&self, builder: &mut Builder<TokioExecutor>) {
        let mut http2 = builder.http2();
        http2.max_concurrent_streams(self.max_concurrent_streams);

        if let Some(interval) = self.keepalive_interval() {
            http2
                .timer(TokioTimer::new())
                .keep_alive_interval(interval)
                .keep_alive_timeout(KEEPALIVE_TIMEOUT);
        }
    }
}

impl Default for TransportOptions {
    fn default() -> Self {
        Self::new(0)
    }
}
