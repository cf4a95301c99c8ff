//! Resilience subsystem.
//!
//! # Data Flow
//! ```text
//! Request to backend:
//!     → timeouts.rs (enforce connect/response deadline)
//!     → On failure: one server-error response, no retry
//! ```
//!
//! # Design Decisions
//! - Timeouts are non-negotiable; every external call has a deadline
//! - Failures are surfaced immediately, never retried or failed over

pub mod timeouts;

pub use timeouts::{with_deadline, DeadlineExceeded, UpstreamTimeouts};
