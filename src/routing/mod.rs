//! Routing subsystem.
//!
//! # Data Flow
//! ```text
//! Incoming Request (path)
//!     → router.rs (fixed route table)
//!     → matched: preflight → [normalizer] → forwarder
//!     → unmatched: framework default 404, backend untouched
//! ```
//!
//! # Design Decisions
//! - Routes compiled at startup, immutable at runtime
//! - Exact path matches only

pub mod router;

pub use router::{RouteTable, ROUTE_PATHS};
