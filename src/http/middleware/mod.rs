//! Per-route middleware.

pub mod preflight;

pub use preflight::preflight;
