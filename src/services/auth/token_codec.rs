//! Access-token verification.
//!
//! `TokenVerifier` is the seam the admission engine calls through; `JwtCodec`
//! implements it with `jsonwebtoken` (HS256 shared secret or EdDSA public key).
//! Claims can only be read from a `VerifiedToken`, which only `validate` hands out.

use std::{collections::BTreeSet, fmt};

use chrono::{DateTime, Utc};
use jsonwebtoken::{Algorithm, DecodingKey, Validation};
use serde_json::{Map, Value};
use tracing::warn;

/// Claim holding the caller identity (usually an email or username).
pub const SUBJECT_CLAIM: &str = "sub";
/// Claim holding the role list.
pub const ROLES_CLAIM: &str = "roles";

/// Raised while reading claims out of a token whose signature and expiry were already accepted.
///
/// This means the issuer and this gateway disagree about the payload shape,
/// not that the client sent garbage.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ClaimsError {
    #[error("missing '{0}' claim")]
    Missing(&'static str),
    #[error("empty '{0}' claim")]
    Empty(&'static str),
    #[error("malformed '{0}' claim")]
    Malformed(&'static str),
}

#[derive(Debug, thiserror::Error)]
pub enum TokenKeyError {
    #[error("invalid ed25519 public key pem: {0}")]
    InvalidPem(#[source] jsonwebtoken::errors::Error),
    #[error("empty shared secret")]
    EmptySecret,
}

/// Key material used to verify token signatures.
#[derive(Clone)]
pub enum VerificationKey {
    /// HS256 shared secret.
    Hmac(Vec<u8>),
    /// EdDSA (Ed25519) public key in PEM form.
    Ed25519Pem(String),
}

impl fmt::Debug for VerificationKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Do not print key material
        match self {
            Self::Hmac(_) => f.write_str("VerificationKey::Hmac(..)"),
            Self::Ed25519Pem(_) => f.write_str("VerificationKey::Ed25519Pem(..)"),
        }
    }
}

impl VerificationKey {
    fn algorithm(&self) -> Algorithm {
        match self {
            Self::Hmac(_) => Algorithm::HS256,
            Self::Ed25519Pem(_) => Algorithm::EdDSA,
        }
    }

    fn decoding_key(&self) -> Result<DecodingKey, TokenKeyError> {
        match self {
            Self::Hmac(secret) if secret.is_empty() => Err(TokenKeyError::EmptySecret),
            Self::Hmac(secret) => Ok(DecodingKey::from_secret(secret)),
            Self::Ed25519Pem(pem) => {
                DecodingKey::from_ed_pem(pem.as_bytes()).map_err(TokenKeyError::InvalidPem)
            }
        }
    }
}

/// Claim checks applied on top of signature verification.
#[derive(Debug, Clone, Default)]
pub struct ValidationSettings {
    pub issuer: Option<String>,
    pub audience: Option<String>,
    pub leeway_seconds: u64,
}

/// A token whose structure, signature and expiry have been accepted.
///
/// Obtained from [`TokenVerifier::validate`]; the claim accessors only accept this type.
#[derive(Clone)]
pub struct VerifiedToken {
    claims: Map<String, Value>,
}

impl fmt::Debug for VerifiedToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("VerifiedToken")
            .field("claims", &self.claims.keys().collect::<Vec<_>>())
            .finish()
    }
}

impl VerifiedToken {
    /// Wrap a payload that a [`TokenVerifier`] implementation has already verified.
    pub fn from_verified_claims(claims: Map<String, Value>) -> Self {
        Self { claims }
    }

    pub fn claim(&self, name: &str) -> Option<&Value> {
        self.claims.get(name)
    }

    pub fn expires_at(&self) -> Option<DateTime<Utc>> {
        self.claims
            .get("exp")
            .and_then(Value::as_i64)
            .and_then(|exp| DateTime::from_timestamp(exp, 0))
    }
}

/// Token validation seam used by the admission engine.
pub trait TokenVerifier: Send + Sync {
    /// `None` for malformed tokens, bad signatures and expired tokens. Never panics.
    fn validate(&self, token: &str) -> Option<VerifiedToken>;

    fn is_valid(&self, token: &str) -> bool {
        self.validate(token).is_some()
    }

    fn extract_subject(&self, token: &VerifiedToken) -> Result<String, ClaimsError> {
        match token.claim(SUBJECT_CLAIM) {
            None | Some(Value::Null) => Err(ClaimsError::Missing(SUBJECT_CLAIM)),
            Some(Value::String(s)) if s.trim().is_empty() => Err(ClaimsError::Empty(SUBJECT_CLAIM)),
            Some(Value::String(s)) => Ok(s.clone()),
            Some(_) => Err(ClaimsError::Malformed(SUBJECT_CLAIM)),
        }
    }

    /// Absent or `null` roles yield an empty set.
    fn extract_roles(&self, token: &VerifiedToken) -> Result<BTreeSet<String>, ClaimsError> {
        match token.claim(ROLES_CLAIM) {
            None | Some(Value::Null) => Ok(BTreeSet::new()),
            Some(Value::Array(items)) => items
                .iter()
                .map(|v| {
                    v.as_str()
                        .map(str::to_string)
                        .ok_or(ClaimsError::Malformed(ROLES_CLAIM))
                })
                .collect(),
            Some(_) => Err(ClaimsError::Malformed(ROLES_CLAIM)),
        }
    }
}

struct KeySet {
    decoding_key: DecodingKey,
    validation: Validation,
}

impl KeySet {
    fn build(key: &VerificationKey, settings: &ValidationSettings) -> Result<Self, TokenKeyError> {
        let decoding_key = key.decoding_key()?;

        let mut validation = Validation::new(key.algorithm());
        validation.leeway = settings.leeway_seconds;
        if let Some(issuer) = settings.issuer.as_deref() {
            validation.set_issuer(&[issuer]);
        }
        match settings.audience.as_deref() {
            Some(audience) => validation.set_audience(&[audience]),
            None => validation.validate_aud = false,
        }

        Ok(Self {
            decoding_key,
            validation,
        })
    }
}

/// JWT verifier. Key material and claim checks are fixed at construction.
pub struct JwtCodec {
    keys: KeySet,
    settings: ValidationSettings,
}

impl fmt::Debug for JwtCodec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("JwtCodec")
            .field("settings", &self.settings)
            .finish_non_exhaustive()
    }
}

impl JwtCodec {
    pub fn new(key: VerificationKey, settings: ValidationSettings) -> Result<Self, TokenKeyError> {
        let keys = KeySet::build(&key, &settings)?;
        Ok(Self { keys, settings })
    }
}

impl TokenVerifier for JwtCodec {
    fn validate(&self, token: &str) -> Option<VerifiedToken> {
        let keys = &self.keys;

        match jsonwebtoken::decode::<Map<String, Value>>(token, &keys.decoding_key, &keys.validation)
        {
            Ok(data) => Some(VerifiedToken::from_verified_claims(data.claims)),
            Err(err) => {
                warn!(error = ?err.kind(), "access token verification failed");
                None
            }
        }
    }
}
