//! Authentication and CORS gate for an API gateway edge.
//!
//! Every request is either answered by the CORS enforcer (preflight),
//! forwarded (public path, or valid token with identity attached), or
//! terminated with a 401 JSON error.

pub mod api;
pub mod app;
pub mod config;
pub mod error;
pub mod middleware;
pub mod services;
pub mod state;
