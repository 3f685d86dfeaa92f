//! Cross-origin policy.
//!
//! `CorsPolicy` validates the configured allow lists once at startup and
//! compiles them into a `tower_http::cors::CorsLayer`, which writes every
//! `Access-Control-*` and `Vary` header. The policy also answers one question
//! tower-http does not: whether a preflight should be refused outright.
//!
//! Origins come in two flavours:
//! - `allowed_origins`: exact values. The single entry `*` means any origin and
//!   is echoed as the literal `*`, which browsers refuse together with credentials.
//! - `allowed_origin_patterns`: wildcard patterns (`https://*.example.com`, `*`).
//!   A match echoes the concrete request origin, so it can carry credentials.

use std::{sync::Arc, time::Duration};

use axum::http::{HeaderMap, HeaderName, HeaderValue, Method, header, request::Parts};
use tower_http::cors::{
    AllowCredentials, AllowHeaders, AllowMethods, AllowOrigin, CorsLayer, ExposeHeaders,
};

use crate::services::wildcard;

const ANY: &str = "*";

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CorsPolicyError {
    #[error(
        "allow_credentials=true cannot be combined with the wildcard origin '*'; \
         list concrete origins or use an origin pattern"
    )]
    WildcardWithCredentials,
    #[error("allow_credentials=true cannot be combined with exposed header '*'")]
    WildcardExposeWithCredentials,
    #[error("invalid CORS origin: {0:?}")]
    InvalidOrigin(String),
    #[error("invalid CORS method: {0:?}")]
    InvalidMethod(String),
    #[error("invalid CORS header name: {0:?}")]
    InvalidHeader(String),
}

/// Raw policy as read from configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CorsSettings {
    pub allowed_origins: Vec<String>,
    pub allowed_origin_patterns: Vec<String>,
    pub allowed_methods: Vec<String>,
    pub allowed_headers: Vec<String>,
    pub exposed_headers: Vec<String>,
    pub allow_credentials: bool,
    pub max_age_seconds: u64,
}

impl Default for CorsSettings {
    fn default() -> Self {
        fn owned(items: &[&str]) -> Vec<String> {
            items.iter().map(|s| s.to_string()).collect()
        }

        Self {
            allowed_origins: owned(&[
                "http://localhost:3000",
                "http://127.0.0.1:3000",
                "http://192.168.49.2:3000",
            ]),
            allowed_origin_patterns: Vec::new(),
            allowed_methods: owned(&["GET", "POST", "PUT", "DELETE", "OPTIONS"]),
            allowed_headers: owned(&["Authorization", "Content-Type", "Accept"]),
            exposed_headers: owned(&["Authorization"]),
            allow_credentials: true,
            max_age_seconds: 3600,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum AllowList<T> {
    Any,
    Only(Vec<T>),
}

#[derive(Debug, PartialEq, Eq)]
struct OriginRules {
    any: bool,
    exact: Vec<String>,
    patterns: Vec<String>,
}

impl OriginRules {
    /// Non-text origins are never permitted, not even under `*`.
    fn permits(&self, origin: &HeaderValue) -> bool {
        let Ok(origin) = origin.to_str() else {
            return false;
        };
        if self.any {
            return true;
        }
        let origin = normalize_origin(origin);
        self.exact.iter().any(|o| *o == origin)
            || self.patterns.iter().any(|p| wildcard::matches(p, &origin))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PreflightRejection {
    OriginNotAllowed,
    MethodNotAllowed(String),
    HeaderNotAllowed(String),
}

/// Validated, immutable CORS policy. Built once at startup.
#[derive(Debug, Clone)]
pub struct CorsPolicy {
    origins: Arc<OriginRules>,
    methods: AllowList<Method>,
    headers: AllowList<HeaderName>,
    layer: CorsLayer,
}

fn normalize_origin(origin: &str) -> String {
    origin.trim().trim_end_matches('/').to_ascii_lowercase()
}

impl CorsPolicy {
    pub fn new(settings: CorsSettings) -> Result<Self, CorsPolicyError> {
        let mut any = false;
        let mut exact = Vec::new();
        for origin in &settings.allowed_origins {
            let origin = normalize_origin(origin);
            if origin == ANY {
                any = true;
            } else if origin == "null" || origin.contains("://") {
                exact.push(origin);
            } else {
                return Err(CorsPolicyError::InvalidOrigin(origin));
            }
        }

        // Browsers reject `Access-Control-Allow-Origin: *` with credentials.
        if any && settings.allow_credentials {
            return Err(CorsPolicyError::WildcardWithCredentials);
        }

        let patterns = settings
            .allowed_origin_patterns
            .iter()
            .map(|p| normalize_origin(p))
            .filter(|p| !p.is_empty())
            .collect();
        let origins = Arc::new(OriginRules {
            any,
            exact,
            patterns,
        });

        let methods = if settings.allowed_methods.iter().any(|m| m.trim() == ANY) {
            AllowList::Any
        } else {
            let methods = settings
                .allowed_methods
                .iter()
                .map(|m| {
                    Method::from_bytes(m.trim().to_ascii_uppercase().as_bytes())
                        .map_err(|_| CorsPolicyError::InvalidMethod(m.clone()))
                })
                .collect::<Result<Vec<_>, _>>()?;
            AllowList::Only(methods)
        };

        let headers = if settings.allowed_headers.iter().any(|h| h.trim() == ANY) {
            AllowList::Any
        } else {
            AllowList::Only(parse_header_names(&settings.allowed_headers)?)
        };

        let exposed = parse_header_names(&settings.exposed_headers)?;
        if settings.allow_credentials && exposed.iter().any(|h| h.as_str() == ANY) {
            return Err(CorsPolicyError::WildcardExposeWithCredentials);
        }

        let layer = build_layer(
            &origins,
            &methods,
            &headers,
            exposed,
            settings.allow_credentials,
            Duration::from_secs(settings.max_age_seconds),
        );

        Ok(Self {
            origins,
            methods,
            headers,
            layer,
        })
    }

    /// The tower-http layer that writes the CORS response headers.
    pub fn cors_layer(&self) -> &CorsLayer {
        &self.layer
    }

    pub fn permits_origin(&self, origin: &HeaderValue) -> bool {
        self.origins.permits(origin)
    }

    /// `Ok` when a preflight may be answered with the policy headers.
    ///
    /// Reads `Origin`, `Access-Control-Request-Method` and
    /// `Access-Control-Request-Headers`; any of them that is not valid text is refused.
    pub fn preflight(&self, headers: &HeaderMap) -> Result<(), PreflightRejection> {
        match headers.get(header::ORIGIN) {
            Some(origin) if self.origins.permits(origin) => {}
            _ => return Err(PreflightRejection::OriginNotAllowed),
        }

        let method = headers
            .get(header::ACCESS_CONTROL_REQUEST_METHOD)
            .and_then(|v| v.to_str().ok())
            .map(str::trim)
            .unwrap_or_default();
        let method_ok = match &self.methods {
            AllowList::Any => Method::from_bytes(method.as_bytes()).is_ok(),
            AllowList::Only(methods) => methods.iter().any(|m| m.as_str() == method),
        };
        if !method_ok {
            return Err(PreflightRejection::MethodNotAllowed(method.to_string()));
        }

        let requested = match headers.get(header::ACCESS_CONTROL_REQUEST_HEADERS) {
            None => "",
            Some(v) => v
                .to_str()
                .map_err(|_| PreflightRejection::HeaderNotAllowed("<non-text>".to_string()))?,
        };
        if let AllowList::Only(allowed) = &self.headers
            && let Some(denied) = requested
                .split(',')
                .map(|h| h.trim().to_ascii_lowercase())
                .filter(|h| !h.is_empty())
                .find(|h| !allowed.iter().any(|a| a.as_str() == h.as_str()))
        {
            return Err(PreflightRejection::HeaderNotAllowed(denied));
        }

        Ok(())
    }
}

fn build_layer(
    origins: &Arc<OriginRules>,
    methods: &AllowList<Method>,
    headers: &AllowList<HeaderName>,
    exposed: Vec<HeaderName>,
    allow_credentials: bool,
    max_age: Duration,
) -> CorsLayer {
    let allow_origin = if origins.any {
        AllowOrigin::any()
    } else {
        let rules = Arc::clone(origins);
        AllowOrigin::predicate(move |origin: &HeaderValue, _parts: &Parts| rules.permits(origin))
    };

    let allow_methods = match methods {
        AllowList::Any => AllowMethods::mirror_request(),
        AllowList::Only(methods) => AllowMethods::list(methods.iter().cloned()),
    };
    let allow_headers = match headers {
        AllowList::Any => AllowHeaders::mirror_request(),
        AllowList::Only(headers) => AllowHeaders::list(headers.iter().cloned()),
    };

    let mut layer = CorsLayer::new()
        .allow_origin(allow_origin)
        .allow_methods(allow_methods)
        .allow_headers(allow_headers)
        .max_age(max_age);

    if !exposed.is_empty() {
        layer = layer.expose_headers(ExposeHeaders::list(exposed));
    }
    if allow_credentials {
        // Only permitted origins get `Allow-Credentials: true`.
        let rules = Arc::clone(origins);
        layer = layer.allow_credentials(AllowCredentials::predicate(
            move |origin: &HeaderValue, _parts: &Parts| rules.permits(origin),
        ));
    }
    layer
}

fn parse_header_names(raw: &[String]) -> Result<Vec<HeaderName>, CorsPolicyError> {
    raw.iter()
        .map(|h| h.trim())
        .filter(|h| !h.is_empty())
        .map(|h| {
            HeaderName::from_bytes(h.as_bytes())
                .map_err(|_| CorsPolicyError::InvalidHeader(h.to_string()))
        })
        .collect()
}
