/*
 * Responsibility
 * - URL structure served by the gateway itself
 * - Everything else falls through to a JSON 404 (after the admission gate)
 */
use axum::{Router, routing::get};

use crate::api::handlers::{
    actuator::{health, info},
    me::me,
    not_found,
};
use crate::state::AppState;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/actuator/health", get(health))
        .route("/actuator/info", get(info))
        .route("/api/me", get(me))
        .fallback(not_found)
}
