//! Response handling and transformation.
//!
//! # Responsibilities
//! - Hold the CORS policy stamped onto routed responses
//! - Normalize `Access-Control-Allow-Origin` on forwarded responses
//! - Map backend errors to appropriate HTTP status codes
//!
//! # Design Decisions
//! - Streaming responses avoid buffering entire body
//! - The normalizer overrides, so duplicated or comma-joined origins from
//!   the backend (or an edge in front of it) collapse to one `*`
//! - Backend timeouts result in 504 Gateway Timeout, other failures in 502

use axum::{
    http::{
        header::{
            ACCESS_CONTROL_ALLOW_HEADERS, ACCESS_CONTROL_ALLOW_METHODS,
            ACCESS_CONTROL_ALLOW_ORIGIN,
        },
        HeaderMap, HeaderValue,
    },
    response::{IntoResponse, Response},
};
use tower_http::set_header::SetResponseHeaderLayer;

use crate::config::{ConfigError, CorsConfig, ValidationError};
use crate::upstream::ForwardError;

/// The only origin value this proxy ever emits.
pub const ALLOW_ANY_ORIGIN: HeaderValue = HeaderValue::from_static("*");

/// Cross-origin headers applied to every routed response.
#[derive(Debug, Clone)]
pub struct CorsPolicy {
    allow_methods: HeaderValue,
    allow_headers: HeaderValue,
    normalize_origin: bool,
}

impl CorsPolicy {
    pub fn from_config(config: &CorsConfig) -> Result<Self, ConfigError> {
        let header = |field: &'static str, value: &str| {
            HeaderValue::from_str(value).map_err(|_| {
                ConfigError::Validation(vec![ValidationError::InvalidHeaderValue {
                    field,
                    value: value.to_string(),
                }])
            })
        };

        Ok(Self {
            allow_methods: header("allow_methods", &config.allow_methods)?,
            allow_headers: header("allow_headers", &config.allow_headers)?,
            normalize_origin: config.normalize_origin,
        })
    }

    /// Whether forwarded responses get their origin header rewritten.
    pub fn normalize_origin(&self) -> bool {
        self.normalize_origin
    }

    /// Set all three headers, replacing any existing values.
    pub fn apply(&self, headers: &mut HeaderMap) {
        headers.insert(ACCESS_CONTROL_ALLOW_ORIGIN, ALLOW_ANY_ORIGIN);
        headers.insert(ACCESS_CONTROL_ALLOW_METHODS, self.allow_methods.clone());
        headers.insert(ACCESS_CONTROL_ALLOW_HEADERS, self.allow_headers.clone());
    }

    /// Set whichever of the three headers the response does not carry yet.
    pub fn apply_missing(&self, headers: &mut HeaderMap) {
        headers
            .entry(ACCESS_CONTROL_ALLOW_ORIGIN)
            .or_insert(ALLOW_ANY_ORIGIN);
        headers
            .entry(ACCESS_CONTROL_ALLOW_METHODS)
            .or_insert_with(|| self.allow_methods.clone());
        headers
            .entry(ACCESS_CONTROL_ALLOW_HEADERS)
            .or_insert_with(|| self.allow_headers.clone());
    }
}

impl Default for CorsPolicy {
    fn default() -> Self {
        Self {
            allow_methods: HeaderValue::from_static("GET, POST, PUT, OPTIONS"),
            allow_headers: HeaderValue::from_static("Content-Type"),
            normalize_origin: true,
        }
    }
}

/// Layer that replaces every `Access-Control-Allow-Origin` value with a single `*`.
pub fn cors_normalizer() -> SetResponseHeaderLayer<HeaderValue> {
    SetResponseHeaderLayer::overriding(ACCESS_CONTROL_ALLOW_ORIGIN, ALLOW_ANY_ORIGIN)
}

impl IntoResponse for ForwardError {
    fn into_response(self) -> Response {
        let message = match &self {
            ForwardError::Timeout(_) => "Upstream timed out",
            ForwardError::Build(_) | ForwardError::Upstream(_) => "Upstream request failed",
        };
        (self.status(), message).into_response()
    }
}
