//! Single-backend CORS reverse proxy.
//!
//! Fronts one backend behind a fixed set of API routes, answers browser
//! preflights locally and rewrites `Access-Control-Allow-Origin` on every
//! forwarded response to a single `*`.

// Core subsystems
pub mod config;
pub mod http;
pub mod routing;
pub mod upstream;

// Cross-cutting concerns
pub mod lifecycle;
pub mod observability;
pub mod resilience;
pub mod security;

pub use config::ProxyConfig;
pub use http::HttpServer;
pub use lifecycle::Shutdown;
pub use routing::RouteTable;
pub use upstream::{BackendTarget, Forwarder};
