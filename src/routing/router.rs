//! Route table construction.
//!
//! # Responsibilities
//! - Register the fixed set of proxied paths
//! - Compose the per-route chain: preflight → normalizer → forwarder
//! - Leave every other path to the framework's default 404
//!
//! # Design Decisions
//! - Immutable after construction (thread-safe without locks)
//! - The forwarder is explicit router state, not a global
//! - The normalizer is only wired in when `cors.normalize_origin` is set

use std::sync::Arc;

use axum::{
    middleware::from_fn_with_state,
    routing::{any, MethodRouter},
    Router,
};

use crate::http::middleware::preflight;
use crate::http::response::{cors_normalizer, CorsPolicy};
use crate::http::server::proxy_handler;
use crate::upstream::Forwarder;

/// Paths forwarded to the backend. Anything else is not found.
pub const ROUTE_PATHS: [&str; 5] = [
    "/send-email",
    "/send-single-email",
    "/add-recipe",
    "/get-all-recipes",
    "/generate-recipes",
];

/// The fully built set of proxied routes.
pub struct RouteTable {
    router: Router,
    paths: &'static [&'static str],
}

impl RouteTable {
    /// Build the table for the built-in [`ROUTE_PATHS`].
    pub fn new(forwarder: Forwarder, cors: CorsPolicy) -> Self {
        Self::with_paths(&ROUTE_PATHS, forwarder, cors)
    }

    /// Build the table for an explicit set of paths.
    pub fn with_paths(
        paths: &'static [&'static str],
        forwarder: Forwarder,
        cors: CorsPolicy,
    ) -> Self {
        let cors = Arc::new(cors);
        let router = paths
            .iter()
            .fold(Router::new(), |router, path| {
                router.route(path, Self::handler_chain(&cors))
            })
            .with_state(forwarder);

        tracing::debug!(routes = ?paths, "Route table built");
        Self { router, paths }
    }

    fn handler_chain(cors: &Arc<CorsPolicy>) -> MethodRouter<Forwarder> {
        let mut chain = any(proxy_handler);
        if cors.normalize_origin() {
            chain = chain.layer(cors_normalizer());
        }
        chain.layer(from_fn_with_state(cors.clone(), preflight))
    }

    /// Registered paths, in registration order.
    pub fn paths(&self) -> &'static [&'static str] {
        self.paths
    }

    pub fn contains(&self, path: &str) -> bool {
        self.paths.contains(&path)
    }

    pub fn into_router(self) -> Router {
        self.router
    }
}
