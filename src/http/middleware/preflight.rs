//! Preflight interception.
//!
//! `OPTIONS` requests are answered here with `200`, an empty body and the
//! CORS headers; they never reach the backend. Every other request is passed
//! on, and the CORS headers are added to whatever comes back if missing.

use std::sync::Arc;

use axum::{
    body::Body,
    extract::State,
    http::{Method, Request, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
};

use crate::http::response::CorsPolicy;
use crate::observability::metrics;

pub async fn preflight(
    State(policy): State<Arc<CorsPolicy>>,
    request: Request<Body>,
    next: Next,
) -> Response {
    if request.method() == Method::OPTIONS {
        tracing::debug!(path = %request.uri().path(), "Answering preflight");
        metrics::record_preflight(request.uri().path());

        let mut response = StatusCode::OK.into_response();
        policy.apply(response.headers_mut());
        return response;
    }

    let mut response = next.run(request).await;
    policy.apply_missing(response.headers_mut());
    response
}
