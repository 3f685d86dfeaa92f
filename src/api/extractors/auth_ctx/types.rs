/*
 * Responsibility
 * - The authenticated identity as seen by downstream handlers
 * - The admission gate builds it from verified claims and stores it in request extensions
 *
 * Notes
 * - Roles are a flat set of strings; no authority hierarchy
 * - Absent on public paths (those run anonymously)
 */
use std::collections::BTreeSet;

use chrono::{DateTime, Utc};

use crate::services::auth::Claims;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthCtx {
    pub subject: String,
    pub roles: BTreeSet<String>,
    pub expires_at: Option<DateTime<Utc>>,
}

impl From<Claims> for AuthCtx {
    fn from(claims: Claims) -> Self {
        Self {
            subject: claims.subject,
            roles: claims.roles,
            expires_at: claims.expires_at,
        }
    }
}
