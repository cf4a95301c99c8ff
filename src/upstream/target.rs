//! Backend target resolution.
//!
//! # Responsibilities
//! - Substitute the fallback address when none is configured
//! - Parse the address into scheme + authority (+ optional base path/query)
//! - Map inbound request URIs onto the backend
//!
//! # Design Decisions
//! - Resolved once at startup; the value is immutable afterwards
//! - Any parse failure is a `ConfigError`, fatal before the listener binds
//! - Only `http` and `https` are accepted

use std::fmt;
use std::str::FromStr;

use axum::http::uri::{Authority, PathAndQuery, Scheme};
use axum::http::{HeaderValue, Uri};
use url::{Position, Url};

use crate::config::ConfigError;

/// Backend used when no address is configured.
pub const FALLBACK_TARGET: &str = "http://recipe-mailer-backend.railway.internal:8080";

/// The single upstream service all routed requests are forwarded to.
#[derive(Debug, Clone)]
pub struct BackendTarget {
    scheme: Scheme,
    authority: Authority,
    host_header: HeaderValue,
    base_path: String,
    base_query: Option<String>,
}

impl BackendTarget {
    /// Resolve a backend address, falling back to [`FALLBACK_TARGET`] when empty.
    pub fn resolve(address: &str) -> Result<Self, ConfigError> {
        let address = match address.trim() {
            "" => FALLBACK_TARGET,
            other => other,
        };

        let url = Url::parse(address).map_err(|source| ConfigError::InvalidTarget {
            url: address.to_string(),
            source,
        })?;

        let scheme = match url.scheme() {
            "http" => Scheme::HTTP,
            "https" => Scheme::HTTPS,
            other => {
                return Err(ConfigError::UnsupportedScheme {
                    scheme: other.to_string(),
                })
            }
        };
        if url.host_str().map_or(true, str::is_empty) {
            return Err(ConfigError::MissingHost {
                url: address.to_string(),
            });
        }

        let invalid_authority = |reason: String| ConfigError::InvalidAuthority {
            url: address.to_string(),
            reason,
        };
        let authority_str = &url[Position::BeforeHost..Position::AfterPort];
        let authority =
            Authority::from_str(authority_str).map_err(|e| invalid_authority(e.to_string()))?;
        let host_header = HeaderValue::from_str(authority.as_str())
            .map_err(|e| invalid_authority(e.to_string()))?;

        Ok(Self {
            scheme,
            authority,
            host_header,
            base_path: url.path().to_string(),
            base_query: url.query().filter(|q| !q.is_empty()).map(str::to_string),
        })
    }

    pub fn scheme(&self) -> &Scheme {
        &self.scheme
    }

    pub fn authority(&self) -> &Authority {
        &self.authority
    }

    /// Value sent as `Host` on every outbound request.
    pub fn host_header(&self) -> &HeaderValue {
        &self.host_header
    }

    /// Build the backend URI for an inbound request URI.
    ///
    /// The request path is appended to the target's base path with exactly one
    /// slash between them, and the two query strings are joined with `&`.
    pub fn upstream_uri(&self, inbound: &Uri) -> Result<Uri, axum::http::Error> {
        let path = join_paths(&self.base_path, inbound.path());
        let query = match (self.base_query.as_deref(), inbound.query()) {
            (Some(base), Some(req)) if !req.is_empty() => Some(format!("{base}&{req}")),
            (Some(base), _) => Some(base.to_string()),
            (None, Some(req)) if !req.is_empty() => Some(req.to_string()),
            (None, _) => None,
        };

        let path_and_query = match query {
            Some(query) => PathAndQuery::from_str(&format!("{path}?{query}"))?,
            None => PathAndQuery::from_str(&path)?,
        };

        Uri::builder()
            .scheme(self.scheme.clone())
            .authority(self.authority.clone())
            .path_and_query(path_and_query)
            .build()
    }
}

impl fmt::Display for BackendTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}://{}{}", self.scheme, self.authority, self.base_path)?;
        if let Some(query) = &self.base_query {
            write!(f, "?{query}")?;
        }
        Ok(())
    }
}

fn join_paths(base: &str, path: &str) -> String {
    match (base.ends_with('/'), path.starts_with('/')) {
        (true, true) => format!("{}{}", base, &path[1..]),
        (false, false) => format!("{base}/{path}"),
        _ => format!("{base}{path}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_address_uses_fallback() {
        let target = BackendTarget::resolve("").unwrap();
        assert_eq!(
            target.authority().as_str(),
            "recipe-mailer-backend.railway.internal:8080"
        );
        assert_eq!(target.scheme(), &Scheme::HTTP);

        let blank = BackendTarget::resolve("   ").unwrap();
        assert_eq!(blank.authority(), target.authority());
    }

    #[test]
    fn parses_scheme_and_authority() {
        let target = BackendTarget::resolve("http://127.0.0.1:3000").unwrap();
        assert_eq!(target.authority().as_str(), "127.0.0.1:3000");
        assert_eq!(target.host_header(), "127.0.0.1:3000");
        assert_eq!(target.to_string(), "http://127.0.0.1:3000/");
    }

    #[test]
    fn default_port_is_left_implicit() {
        let target = BackendTarget::resolve("http://backend.internal").unwrap();
        assert_eq!(target.authority().as_str(), "backend.internal");
    }

    #[test]
    fn malformed_address_is_config_error() {
        let err = BackendTarget::resolve("not a url").unwrap_err();
        assert!(matches!(err, ConfigError::InvalidTarget { .. }));

        let err = BackendTarget::resolve("http://").unwrap_err();
        assert!(matches!(err, ConfigError::InvalidTarget { .. }));
    }

    #[test]
    fn https_target_resolves() {
        let target = BackendTarget::resolve("https://backend.example.com").unwrap();
        assert_eq!(target.scheme(), &Scheme::HTTPS);
        assert_eq!(target.authority().as_str(), "backend.example.com");
        assert_eq!(target.host_header(), "backend.example.com");

        let inbound: Uri = "/add-recipe".parse().unwrap();
        assert_eq!(
            target.upstream_uri(&inbound).unwrap().to_string(),
            "https://backend.example.com/add-recipe"
        );

        let explicit = BackendTarget::resolve("https://backend.example.com:8443").unwrap();
        assert_eq!(explicit.authority().as_str(), "backend.example.com:8443");
    }

    #[test]
    fn other_schemes_rejected() {
        let err = BackendTarget::resolve("ftp://files.example.com").unwrap_err();
        assert!(matches!(err, ConfigError::UnsupportedScheme { ref scheme } if scheme == "ftp"));

        // Without a scheme the host is read as one.
        let err = BackendTarget::resolve("localhost:8080").unwrap_err();
        assert!(matches!(err, ConfigError::UnsupportedScheme { .. }));
    }

    #[test]
    fn upstream_uri_keeps_path_and_query() {
        let target = BackendTarget::resolve("http://127.0.0.1:3000").unwrap();
        let inbound: Uri = "/get-all-recipes?limit=5&sort=asc".parse().unwrap();
        assert_eq!(
            target.upstream_uri(&inbound).unwrap().to_string(),
            "http://127.0.0.1:3000/get-all-recipes?limit=5&sort=asc"
        );
    }

    #[test]
    fn upstream_uri_joins_base_path_and_query() {
        let target = BackendTarget::resolve("http://api:8080/v1?key=abc").unwrap();

        let inbound: Uri = "/add-recipe".parse().unwrap();
        assert_eq!(
            target.upstream_uri(&inbound).unwrap().to_string(),
            "http://api:8080/v1/add-recipe?key=abc"
        );

        let inbound: Uri = "/add-recipe?draft=1".parse().unwrap();
        assert_eq!(
            target.upstream_uri(&inbound).unwrap().to_string(),
            "http://api:8080/v1/add-recipe?key=abc&draft=1"
        );

        let slashed = BackendTarget::resolve("http://api:8080/v1/").unwrap();
        assert_eq!(
            slashed.upstream_uri(&inbound).unwrap().to_string(),
            "http://api:8080/v1/add-recipe?draft=1"
        );
    }

    #[test]
    fn join_paths_uses_single_slash() {
        assert_eq!(join_paths("/", "/a"), "/a");
        assert_eq!(join_paths("/base", "/a"), "/base/a");
        assert_eq!(join_paths("/base/", "a"), "/base/a");
        assert_eq!(join_paths("/base", "a"), "/base/a");
    }
}
