//! Forwarding of routed requests to the backend.
//!
//! # Responsibilities
//! - Rewrite the inbound URI and `Host` onto the backend target
//! - Preserve method, end-to-end headers, query string and body
//! - Stream the backend response back without buffering
//! - Bound every pause in the streamed bodies by the read deadline
//! - Turn transport failures and deadlines into a `ForwardError`
//!
//! # Design Decisions
//! - No retries and no failover: one outbound attempt per request
//! - Idle connections to the backend are pooled by the client
//! - `http` and `https` targets share one client; TLS trusts the webpki roots
//! - Dropping the `forward` future (client went away) aborts the outbound call

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::{
    body::{Body, HttpBody},
    extract::ConnectInfo,
    http::{header, Request, Response, StatusCode},
};
use hyper_rustls::{HttpsConnector, HttpsConnectorBuilder};
use hyper_util::{
    client::legacy::{connect::HttpConnector, Client},
    rt::{TokioExecutor, TokioTimer},
};
use thiserror::Error;
use tower_http::timeout::TimeoutBody;

use crate::config::ConfigError;
use crate::resilience::{with_deadline, DeadlineExceeded, UpstreamTimeouts};
use crate::security::headers::{
    append_forwarded_for, strip_hop_by_hop, strip_request_hop_by_hop,
};
use crate::upstream::target::BackendTarget;

/// Client used for all outbound calls.
pub type HttpClient = Client<HttpsConnector<HttpConnector>, Body>;

/// Errors raised while talking to the backend.
#[derive(Debug, Error)]
pub enum ForwardError {
    /// The outbound request could not be assembled.
    #[error("could not build upstream request: {0}")]
    Build(#[from] axum::http::Error),

    /// Connection refused, reset, or any other transport failure.
    #[error("upstream request failed: {0}")]
    Upstream(#[from] hyper_util::client::legacy::Error),

    /// The backend did not answer in time.
    #[error("upstream did not respond within {0:?}")]
    Timeout(Duration),
}

impl ForwardError {
    /// Status code reported to the client.
    pub fn status(&self) -> StatusCode {
        match self {
            ForwardError::Timeout(_) => StatusCode::GATEWAY_TIMEOUT,
            ForwardError::Build(_) | ForwardError::Upstream(_) => StatusCode::BAD_GATEWAY,
        }
    }

    /// Short label used in logs and metrics.
    pub fn kind(&self) -> &'static str {
        match self {
            ForwardError::Build(_) => "build",
            ForwardError::Upstream(e) if e.is_connect() => "connect",
            ForwardError::Upstream(_) => "transport",
            ForwardError::Timeout(_) => "timeout",
        }
    }
}

/// Relays requests to a single backend.
///
/// Cheap to clone; clones share the target and the connection pool.
#[derive(Clone)]
pub struct Forwarder {
    target: Arc<BackendTarget>,
    client: HttpClient,
    timeouts: UpstreamTimeouts,
}

impl Forwarder {
    /// Create a forwarder for `target` with the given deadlines.
    pub fn new(target: BackendTarget, timeouts: UpstreamTimeouts) -> Result<Self, ConfigError> {
        let mut connector = HttpConnector::new();
        connector.set_connect_timeout(Some(timeouts.connect));
        connector.set_nodelay(true);
        connector.enforce_http(false);

        let connector = HttpsConnectorBuilder::new()
            .with_provider_and_webpki_roots(rustls::crypto::ring::default_provider())
            .map_err(ConfigError::Tls)?
            .https_or_http()
            .enable_http1()
            .wrap_connector(connector);

        let client = Client::builder(TokioExecutor::new())
            .pool_timer(TokioTimer::new())
            .pool_idle_timeout(timeouts.idle)
            .build(connector);

        Ok(Self {
            target: Arc::new(target),
            client,
            timeouts,
        })
    }

    pub fn target(&self) -> &BackendTarget {
        &self.target
    }

    pub fn timeouts(&self) -> UpstreamTimeouts {
        self.timeouts
    }

    /// Send `request` to the backend and return its response.
    ///
    /// The body is streamed in both directions. The response deadline covers
    /// connecting and waiting for response headers; after that, each body
    /// frame must arrive within the read deadline or the stream is aborted.
    pub async fn forward(&self, request: Request<Body>) -> Result<Response<Body>, ForwardError> {
        let (mut parts, body) = request.into_parts();

        let client_ip = parts
            .extensions
            .get::<ConnectInfo<SocketAddr>>()
            .map(|ConnectInfo(addr)| addr.ip());

        let mut headers = std::mem::take(&mut parts.headers);
        strip_request_hop_by_hop(&mut headers);
        headers.insert(header::HOST, self.target.host_header().clone());
        if let Some(ip) = client_ip {
            append_forwarded_for(&mut headers, ip);
        }

        // An empty body stays as-is so bodiless requests are not sent chunked.
        let body = if body.is_end_stream() {
            body
        } else {
            Body::new(TimeoutBody::new(self.timeouts.read, body))
        };

        let mut outbound = Request::builder()
            .method(parts.method)
            .uri(self.target.upstream_uri(&parts.uri)?)
            .body(body)?;
        *outbound.headers_mut() = headers;

        tracing::debug!(
            method = %outbound.method(),
            uri = %outbound.uri(),
            "Forwarding to backend"
        );

        let response = match with_deadline(self.timeouts.response, self.client.request(outbound)).await {
            Ok(result) => result?,
            Err(DeadlineExceeded(limit)) => return Err(ForwardError::Timeout(limit)),
        };

        let (mut parts, body) = response.into_parts();
        strip_hop_by_hop(&mut parts.headers);
        Ok(Response::from_parts(
            parts,
            Body::new(TimeoutBody::new(self.timeouts.read, body)),
        ))
    }
}
