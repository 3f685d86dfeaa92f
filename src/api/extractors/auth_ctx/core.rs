use axum::extract::FromRequestParts;
use axum::http::request::Parts;

use crate::error::AppError;
use crate::services::auth::Rejection;

use super::AuthCtx;

/// Extractor giving handlers the caller identity.
/// Relies on the admission gate having inserted `AuthCtx` into the extensions;
/// when absent (public path, or gate not applied) the handler is refused with 401.
pub struct AuthCtxExtractor(pub AuthCtx);

impl<S> FromRequestParts<S> for AuthCtxExtractor
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<AuthCtx>()
            .cloned()
            .map(AuthCtxExtractor)
            .ok_or(AppError::Unauthorized(Rejection::MissingCredential))
    }
}
