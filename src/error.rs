/*
 * Responsibility
 * - Gateway-wide AppError definition
 * - IntoResponse (HTTP status + `{"error": "<message>"}` JSON body)
 * - No internals (stack traces, claim names, key errors) ever reach the body
 */
use axum::{
    Json,
    http::{HeaderValue, StatusCode, header},
    response::{IntoResponse, Response},
};
use serde::Serialize;
use thiserror::Error;

use crate::services::auth::Rejection;

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

#[derive(Debug, Error)]
pub enum AppError {
    #[error("{}", .0.message())]
    Unauthorized(Rejection),
    #[error("Invalid CORS request")]
    CorsRejected,
    #[error("Not found")]
    NotFound,
    #[error("Request timed out")]
    Timeout,
    #[error("Internal server error")]
    Internal,
}

impl From<Rejection> for AppError {
    fn from(r: Rejection) -> Self {
        Self::Unauthorized(r)
    }
}

impl AppError {
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::Unauthorized(rejection) => rejection.status(),
            AppError::CorsRejected => StatusCode::FORBIDDEN,
            AppError::NotFound => StatusCode::NOT_FOUND,
            AppError::Timeout => StatusCode::REQUEST_TIMEOUT,
            AppError::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = ErrorResponse {
            error: self.to_string(),
        };

        let mut response = (status, Json(body)).into_response();
        if matches!(self, AppError::Unauthorized(_)) {
            response.headers_mut().insert(
                header::WWW_AUTHENTICATE,
                HeaderValue::from_static("Bearer"),
            );
        }
        response
    }
}
