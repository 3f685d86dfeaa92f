/*
 * Responsibility
 * - Framework-free decision logic (admission, CORS policy)
 * - middleware/ only adapts these to axum
 */
pub mod auth;
pub mod cors;
pub mod wildcard;
