//! Observability subsystem.
//!
//! Structured logging through `tracing`; every listener event carries its
//! `port` as a field.

pub mod logging;
