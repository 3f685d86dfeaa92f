//! Admission gate: run the admission decision, then forward or terminate.
//!
//! - `PublicPathAllowed` -> forwarded untouched, no identity attached
//! - `Authenticated`     -> `AuthCtx` inserted into extensions, then forwarded
//! - `Rejected`          -> 401 JSON body, downstream never runs
//!
//! Every request that reaches this layer is admitted or rejected, `OPTIONS`
//! included. Preflights are answered by the CORS layer and never get here.

use axum::{
    Router,
    body::Body,
    extract::State,
    http::Request,
    middleware::{self, Next},
    response::Response,
};

use crate::api::extractors::AuthCtx;
use crate::error::AppError;
use crate::services::auth::{AdmissionResult, RequestContext};
use crate::state::AppState;

/// Apply the admission gate to every route (and the fallback) of `router`.
///
/// ```ignore
/// let router = api::routes().with_state(state.clone());
/// let router = middleware::auth::access::apply(router, state.clone());
/// ```
pub fn apply(router: Router, state: AppState) -> Router {
    router.layer(middleware::from_fn_with_state(state, access_middleware))
}

async fn access_middleware(
    State(state): State<AppState>,
    mut req: Request<Body>,
    next: Next,
) -> Result<Response, AppError> {
    let decision = state.admission.decide(&RequestContext::from_request(&req));

    match decision {
        AdmissionResult::PublicPathAllowed => Ok(next.run(req).await),
        AdmissionResult::Authenticated(claims) => {
            // Identity is attached only here, right before forwarding.
            req.extensions_mut().insert(AuthCtx::from(claims));
            Ok(next.run(req).await)
        }
        AdmissionResult::Rejected(rejection) => Err(AppError::from(rejection)),
    }
}
