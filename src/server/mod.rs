//! RPC server subsystem.
//!
//! # Data Flow
//! ```text
//! serve(specs)
//!     → orchestrator.rs (validate all, probe TLS once, spawn one task per spec)
//!     → runner.rs (options.rs + rpc.rs + registration callback)
//!     → net::listener (bind, watch cancel, serve until closed)
//! ```

pub mod options;
pub mod orchestrator;
pub mod rpc;
pub mod runner;
pub mod spec;

pub use options::{KeepalivePolicy, TransportOptions};
pub use orchestrator::{serve, serve_with, ServeOptions};
pub use rpc::RpcServer;
pub use runner::ServerRunner;
pub use spec::{Registration, ServerSpec};
