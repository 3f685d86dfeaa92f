//! CORS enforcement at the edge.
//!
//! Must sit outside the admission gate: preflight requests are answered here
//! and never reach authentication. Header writing is done by the policy's
//! `tower_http::cors::CorsLayer`; this middleware only decides which requests
//! it sees.
//!
//! - No `Origin` header    -> not a CORS request, untouched
//! - Preflight refused     -> 403 `{"error":"Invalid CORS request"}`
//! - Preflight allowed     -> answered by `CorsLayer` (200, policy headers)
//! - Plain `OPTIONS`       -> passed on to admission like any other method
//! - Actual request        -> forwarded through `CorsLayer`; permitted origins get
//!   Allow-Origin, Allow-Credentials and Expose-Headers on whatever comes back

use std::sync::Arc;

use axum::{
    Router,
    body::Body,
    extract::State,
    http::{HeaderMap, Method, Request, header},
    middleware::{self, Next},
    response::{IntoResponse, Response},
};
use tower::{Layer, ServiceExt};
use tracing::{debug, warn};

use crate::error::AppError;
use crate::services::cors::CorsPolicy;

pub fn apply(router: Router, policy: Arc<CorsPolicy>) -> Router {
    router.layer(middleware::from_fn_with_state(policy, cors_middleware))
}

async fn cors_middleware(
    State(policy): State<Arc<CorsPolicy>>,
    req: Request<Body>,
    next: Next,
) -> Response {
    if !req.headers().contains_key(header::ORIGIN) {
        return next.run(req).await;
    }

    if req.method() == Method::OPTIONS {
        // CorsLayer answers every OPTIONS itself, so a non-preflight one must bypass it.
        if !is_preflight_request(req.method(), req.headers()) {
            return next.run(req).await;
        }

        let origin = req.headers().get(header::ORIGIN);
        if let Err(reason) = policy.preflight(req.headers()) {
            warn!(origin = ?origin, path = %req.uri().path(), reason = ?reason, "cors preflight rejected");
            return AppError::CorsRejected.into_response();
        }
        debug!(origin = ?origin, path = %req.uri().path(), "cors preflight allowed");
    }

    match policy.cors_layer().layer(next).oneshot(req).await {
        Ok(response) => response,
        Err(never) => match never {},
    }
}

/// `OPTIONS` carrying both `Origin` and `Access-Control-Request-Method`.
pub fn is_preflight_request(method: &Method, headers: &HeaderMap) -> bool {
    method == Method::OPTIONS
        && headers.contains_key(header::ORIGIN)
        && headers.contains_key(header::ACCESS_CONTROL_REQUEST_METHOD)
}
