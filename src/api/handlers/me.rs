/*
 * Responsibility
 * - GET /api/me: echo the identity the gateway derived from the token
 */
use axum::Json;
use serde::Serialize;

use crate::api::extractors::AuthCtxExtractor;

#[derive(Debug, Serialize)]
pub struct MeResponse {
    pub subject: String,
    pub roles: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expires_at: Option<String>,
}

pub async fn me(AuthCtxExtractor(ctx): AuthCtxExtractor) -> Json<MeResponse> {
    Json(MeResponse {
        subject: ctx.subject,
        roles: ctx.roles.into_iter().collect(),
        expires_at: ctx.expires_at.map(|t| t.to_rfc3339()),
    })
}
