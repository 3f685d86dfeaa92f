pub mod actuator;
pub mod me;

use crate::error::AppError;

/// Fallback for paths no route claims. Only reached after admission.
pub async fn not_found() -> AppError {
    AppError::NotFound
}
