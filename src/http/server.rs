//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Resolve the backend target and build the route table
//! - Wire up middleware (request ID, tracing)
//! - Bind server to listener and serve until shutdown
//! - Forward routed requests to the backend

use std::net::SocketAddr;
use std::time::Instant;

use axum::{
    body::Body,
    extract::State,
    http::Request,
    response::{IntoResponse, Response},
    Router,
};
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower::ServiceBuilder;
use tower_http::trace::TraceLayer;

use crate::config::{ConfigError, ProxyConfig};
use crate::http::request::{propagate_request_id_layer, request_span, set_request_id_layer};
use crate::http::response::CorsPolicy;
use crate::observability::metrics;
use crate::resilience::UpstreamTimeouts;
use crate::routing::RouteTable;
use crate::upstream::{BackendTarget, Forwarder};

/// HTTP server for the proxy.
pub struct HttpServer {
    router: Router,
    config: ProxyConfig,
    target: BackendTarget,
}

impl HttpServer {
    /// Create a new HTTP server with the given configuration.
    ///
    /// Fails if the backend target or CORS values are unusable; nothing is
    /// bound until [`HttpServer::run`].
    pub fn new(config: ProxyConfig) -> Result<Self, ConfigError> {
        let target = BackendTarget::resolve(&config.target.url)?;
        let cors = CorsPolicy::from_config(&config.cors)?;
        let forwarder = Forwarder::new(target.clone(), UpstreamTimeouts::from(&config.timeouts))?;

        let router = Self::build_router(RouteTable::new(forwarder, cors));
        Ok(Self {
            router,
            config,
            target,
        })
    }

    /// Build the Axum router with all middleware layers.
    fn build_router(routes: RouteTable) -> Router {
        routes.into_router().layer(
            ServiceBuilder::new()
                .layer(set_request_id_layer())
                .layer(TraceLayer::new_for_http().make_span_with(request_span))
                .layer(propagate_request_id_layer()),
        )
    }

    /// Run the server until `shutdown` fires, accepting on `listener`.
    pub async fn run(
        self,
        listener: TcpListener,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(
            address = %addr,
            target = %self.target,
            normalize_origin = self.config.cors.normalize_origin,
            "HTTP server starting"
        );

        let app = self
            .router
            .into_make_service_with_connect_info::<SocketAddr>();

        axum::serve(listener, app)
            .with_graceful_shutdown(async move {
                let _ = shutdown.recv().await;
            })
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }

    /// A copy of the fully layered router, for driving requests in-process.
    pub fn router(&self) -> Router {
        self.router.clone()
    }

    /// Get a reference to the config.
    pub fn config(&self) -> &ProxyConfig {
        &self.config
    }

    pub fn target(&self) -> &BackendTarget {
        &self.target
    }
}

/// Forward a routed request and relay the backend's answer.
///
/// Backend failures become a 502/504 for this request only.
pub(crate) async fn proxy_handler(
    State(forwarder): State<Forwarder>,
    request: Request<Body>,
) -> Response {
    let start_time = Instant::now();
    let method = request.method().clone();
    let path = request.uri().path().to_string();

    tracing::debug!(method = %method, path = %path, "Proxying request");

    match forwarder.forward(request).await {
        Ok(response) => {
            metrics::record_request(method.as_str(), response.status().as_u16(), start_time);
            response
        }
        Err(e) => {
            tracing::error!(
                method = %method,
                path = %path,
                kind = e.kind(),
                error = %e,
                "Upstream error"
            );
            metrics::record_upstream_error(e.kind());
            let response = e.into_response();
            metrics::record_request(method.as_str(), response.status().as_u16(), start_time);
            response
        }
    }
}
