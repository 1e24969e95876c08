//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Per listener (cancel.rs):
//!     CancelHandle::cancel() → CancelSignal fires → that listener closes
//!
//! Per serve call (shutdown.rs):
//!     first fatal runner error → Shutdown::trigger() → every listener closes
//!
//! Process (signals.rs):
//!     SIGTERM/SIGINT → binary fires every CancelHandle
//! ```
//!
//! # Design Decisions
//! - Cancellation is one-shot and owned: firing consumes the handle
//! - A dropped handle counts as fired (closed channel)
//! - Batch shutdown never outlives the serve call that created it

pub mod cancel;
pub mod shutdown;
pub mod signals;

pub use cancel::{cancel_pair, CancelHandle, CancelSignal};
pub use shutdown::{Shutdown, ShutdownListener};
