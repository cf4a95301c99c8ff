//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! All subsystems produce:
//!     → logging.rs (structured log events)
//!     → metrics.rs (counters, histograms)
//! Request IDs come from http::request and ride on every span.
//! ```

pub mod logging;
pub mod metrics;

pub use logging::init_logging;
