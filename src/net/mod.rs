//! Network layer subsystem.
//!
//! # Data Flow
//! ```text
//! tls.rs (probe TLS directory once per serve call)
//!     → listener.rs (bind port, watch cancellation)
//!     → server::runner (serve plaintext or TLS until closed)
//! ```
//!
//! # Design Decisions
//! - TLS presence is a tri-state: absent, present, invalid
//! - Invalid TLS material never falls back to plaintext

pub mod listener;
pub mod tls;
