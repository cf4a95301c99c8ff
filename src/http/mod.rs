//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, request ID + trace layers)
//!     → request.rs (assign / propagate x-request-id)
//!     → routing::RouteTable (fixed paths)
//!     → middleware/preflight.rs (answer OPTIONS locally)
//!     → response.rs (normalize Access-Control-Allow-Origin)
//!     → server.rs proxy_handler → upstream::Forwarder
//!     → Send to client
//! ```

pub mod middleware;
pub mod request;
pub mod response;
pub mod server;

pub use request::X_REQUEST_ID;
pub use response::CorsPolicy;
pub use server::HttpServer;
