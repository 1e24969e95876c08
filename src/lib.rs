//! Multi-listener RPC server bootstrap.
//!
//! Give [`serve`] one [`ServerSpec`] per port. Each spec brings a registration
//! callback that mounts services on an [`RpcServer`]; every listener runs on its
//! own task until its [`CancelSignal`] fires or one listener fails.
//!
//! ```no_run
//! use axum::{routing::post, Router};
//! use rpc_bootstrap::{cancel_pair, serve, ServerSpec};
//!
//! # async fn run() -> Result<(), rpc_bootstrap::ServeError> {
//! let (cancel, signal) = cancel_pair();
//! let spec = ServerSpec::new(7070)
//!     .with_max_message_size(20 * 1024 * 1024)
//!     .with_cancel(signal)
//!     .register(|server| {
//!         let echo = Router::new().route("/Echo", post(|b: String| async move { b }));
//!         server.add_service("echo.API", echo);
//!     });
//!
//! tokio::spawn(async move {
//!     let _ = tokio::signal::ctrl_c().await;
//!     cancel.cancel();
//! });
//! serve(vec![spec]).await
//! # }
//! ```

pub mod config;
pub mod error;
pub mod lifecycle;
pub mod net;
pub mod observability;
pub mod server;
pub mod version;

pub use error::{InvalidSpecReason, ServeError};
pub use lifecycle::{cancel_pair, CancelHandle, CancelSignal};
pub use server::{
    serve, serve_with, Registration, RpcServer, ServeOptions, ServerSpec, TransportOptions,
};
pub use version::Version;
