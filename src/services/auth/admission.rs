//! Request admission decision.
//!
//! `AdmissionEngine::decide` is a pure function of the request view and the
//! immutable rule set / verifier it was built with. The caller (middleware)
//! branches on the result: forward, forward with identity, or terminate.
//!
//! Order is fixed: path check -> token extraction -> validation -> claims.
//! Public paths never touch token code, so a broken token cannot fail a public route.

use std::{collections::BTreeSet, sync::Arc};

use axum::http::{HeaderMap, Method, Request, StatusCode};
use chrono::{DateTime, Utc};
use tracing::{debug, error, warn};

use super::path_matcher::PublicPaths;
use super::token_codec::{ClaimsError, TokenVerifier};
use super::token_extractor;

/// Borrowed, read-only view of the inbound request.
#[derive(Debug, Clone, Copy)]
pub struct RequestContext<'a> {
    pub method: &'a Method,
    pub path: &'a str,
    pub headers: &'a HeaderMap,
}

impl<'a> RequestContext<'a> {
    pub fn new(method: &'a Method, path: &'a str, headers: &'a HeaderMap) -> Self {
        Self {
            method,
            path,
            headers,
        }
    }

    pub fn from_request<B>(req: &'a Request<B>) -> Self {
        Self::new(req.method(), req.uri().path(), req.headers())
    }
}

/// Identity derived from a validated token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Claims {
    pub subject: String,
    pub roles: BTreeSet<String>,
    pub expires_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Rejection {
    /// No token on a private path.
    MissingCredential,
    /// Token present but malformed, badly signed or expired.
    InvalidCredential,
    /// Token accepted but its claims could not be read.
    ClaimExtractionFailure(ClaimsError),
}

impl Rejection {
    /// All credential problems share one status; only the message differs.
    pub fn status(&self) -> StatusCode {
        StatusCode::UNAUTHORIZED
    }

    pub fn message(&self) -> &'static str {
        match self {
            Self::MissingCredential => "No authentication token provided",
            Self::InvalidCredential => "Invalid or expired token",
            Self::ClaimExtractionFailure(_) => "Token processing failed",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AdmissionResult {
    Authenticated(Claims),
    PublicPathAllowed,
    Rejected(Rejection),
}

#[derive(Clone)]
pub struct AdmissionEngine {
    public_paths: Arc<PublicPaths>,
    verifier: Arc<dyn TokenVerifier>,
}

impl std::fmt::Debug for AdmissionEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AdmissionEngine")
            .field("public_paths", &self.public_paths)
            .finish_non_exhaustive()
    }
}

impl AdmissionEngine {
    pub fn new(public_paths: Arc<PublicPaths>, verifier: Arc<dyn TokenVerifier>) -> Self {
        Self {
            public_paths,
            verifier,
        }
    }

    pub fn decide(&self, ctx: &RequestContext<'_>) -> AdmissionResult {
        if self.public_paths.is_public(ctx.path) {
            debug!(method = %ctx.method, path = %ctx.path, "public path, skipping authentication");
            return AdmissionResult::PublicPathAllowed;
        }

        let Some(token) = token_extractor::extract(ctx.headers) else {
            debug!(method = %ctx.method, path = %ctx.path, "no authentication token on private path");
            return AdmissionResult::Rejected(Rejection::MissingCredential);
        };

        let Some(verified) = self.verifier.validate(token.as_str()) else {
            warn!(method = %ctx.method, path = %ctx.path, source = ?token.source(), "rejected invalid token");
            return AdmissionResult::Rejected(Rejection::InvalidCredential);
        };

        let claims = self.verifier.extract_subject(&verified).and_then(|subject| {
            let roles = self.verifier.extract_roles(&verified)?;
            Ok(Claims {
                subject,
                roles,
                expires_at: verified.expires_at(),
            })
        });

        match claims {
            Ok(claims) => AdmissionResult::Authenticated(claims),
            Err(err) => {
                // Signature was fine, so this is an issuer/gateway payload mismatch.
                error!(method = %ctx.method, path = %ctx.path, error = %err, "claim extraction failed on a verified token");
                AdmissionResult::Rejected(Rejection::ClaimExtractionFailure(err))
            }
        }
    }
}
