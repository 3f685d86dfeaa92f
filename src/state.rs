/*
 * Responsibility
 * - Shared context handed to every middleware and handler (AppState)
 *   - admission: path rules + token verifier
 *   - cors: validated CORS policy
 * - Cheap to clone (Arc inside); nothing in here is mutated per request
 */
use std::sync::Arc;

use crate::services::{auth::AdmissionEngine, cors::CorsPolicy};

#[derive(Clone, Debug)]
pub struct AppState {
    pub admission: Arc<AdmissionEngine>,
    pub cors: Arc<CorsPolicy>,
}

impl AppState {
    pub fn new(admission: Arc<AdmissionEngine>, cors: Arc<CorsPolicy>) -> Self {
        Self { admission, cors }
    }
}
