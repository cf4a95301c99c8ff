//! Upstream subsystem: the single backend and how requests reach it.
//!
//! # Data Flow
//! ```text
//! TARGET_URL / config
//!     → target.rs (resolve once at startup, fatal on error)
//!     → forward.rs (Forwarder: rewrite URI + Host, send, stream back)
//! ```

pub mod forward;
pub mod target;

pub use forward::{ForwardError, Forwarder, HttpClient};
pub use target::{BackendTarget, FALLBACK_TARGET};
