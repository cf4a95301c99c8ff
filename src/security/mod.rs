//! Security subsystem.
//!
//! # Data Flow
//! ```text
//! Inbound request:
//!     → headers.rs (strip hop-by-hop, add X-Forwarded-For)
//!     → forwarded to backend
//! Backend response:
//!     → headers.rs (strip hop-by-hop)
//!     → relayed to client
//! ```

pub mod headers;
