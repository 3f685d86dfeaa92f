/*
 * Responsibility
 * - Read settings from the environment (.env supported): port, public paths,
 *   token key material, CORS policy, HTTP limits
 * - Validate them up front (missing key material => startup failure)
 * - Env access is isolated behind a lookup fn so tests can feed a map
 */
use std::fmt;
use std::net::SocketAddr;
use std::str::FromStr;

use crate::services::auth::{ValidationSettings, VerificationKey};
use crate::services::cors::CorsSettings;

pub const DEFAULT_PUBLIC_PATHS: &[&str] = &[
    "/auth/**",
    "/actuator/health",
    "/actuator/info",
    "/swagger-ui/**",
    "/swagger-ui.html",
    "/v3/**",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppEnv {
    Development,
    Production,
}

impl AppEnv {
    fn parse(raw: Option<String>) -> Self {
        match raw
            .unwrap_or_else(|| "development".to_string())
            .to_ascii_lowercase()
            .as_str()
        {
            "production" | "prod" => Self::Production,
            _ => Self::Development,
        }
    }

    pub fn is_production(&self) -> bool {
        matches!(self, Self::Production)
    }
}

#[derive(Debug, PartialEq, Eq)]
pub enum ConfigError {
    Missing(&'static str),
    Invalid(&'static str),
    Conflict(&'static str, &'static str),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::Missing(key) => write!(f, "missing configuration: {}", key),
            ConfigError::Invalid(key) => write!(f, "invalid configuration: {}", key),
            ConfigError::Conflict(a, b) => {
                write!(f, "conflicting configuration: set only one of {} and {}", a, b)
            }
        }
    }
}

impl std::error::Error for ConfigError {}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpSettings {
    pub timeout_seconds: u64,
    pub body_limit_bytes: usize,
}

impl Default for HttpSettings {
    fn default() -> Self {
        Self {
            timeout_seconds: 30,
            body_limit_bytes: 1024 * 1024,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    pub addr: SocketAddr,
    pub app_env: AppEnv,

    pub public_paths: Vec<String>,

    pub token_key: VerificationKey,
    pub token_validation: ValidationSettings,

    pub cors: CorsSettings,
    pub http: HttpSettings,
}

fn split_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let list_or = |key: &str, default: Vec<String>| {
            non_empty(key).map(|v| split_list(&v)).unwrap_or(default)
        };

        let port: u16 = match non_empty("PORT") {
            Some(v) => v.trim().parse().map_err(|_| ConfigError::Invalid("PORT"))?,
            None => 3000,
        };

        let addr: SocketAddr = SocketAddr::from_str(&format!("0.0.0.0:{}", port))
            .map_err(|_| ConfigError::Invalid("PORT"))?;

        let app_env = AppEnv::parse(lookup("APP_ENV"));

        let public_paths = list_or(
            "PUBLIC_PATHS",
            DEFAULT_PUBLIC_PATHS.iter().map(|s| s.to_string()).collect(),
        );

        let token_key = match (
            non_empty("JWT_SECRET"),
            non_empty("ACCESS_JWT_PUBLIC_KEY_PEM"),
        ) {
            (Some(_), Some(_)) => {
                return Err(ConfigError::Conflict(
                    "JWT_SECRET",
                    "ACCESS_JWT_PUBLIC_KEY_PEM",
                ));
            }
            (Some(secret), None) => VerificationKey::Hmac(secret.into_bytes()),
            (None, Some(pem)) => VerificationKey::Ed25519Pem(pem.replace("\\n", "\n")),
            (None, None) => return Err(ConfigError::Missing("JWT_SECRET")),
        };

        let leeway_seconds = match non_empty("ACCESS_TOKEN_LEEWAY_SECONDS") {
            Some(v) => v
                .trim()
                .parse::<u64>()
                .map_err(|_| ConfigError::Invalid("ACCESS_TOKEN_LEEWAY_SECONDS"))?,
            None => 60,
        };

        let token_validation = ValidationSettings {
            issuer: non_empty("AUTH_ISSUER"),
            audience: non_empty("AUTH_AUDIENCE"),
            leeway_seconds,
        };

        let defaults = CorsSettings::default();
        let allow_credentials = match non_empty("CORS_ALLOW_CREDENTIALS") {
            Some(v) => match v.trim().to_ascii_lowercase().as_str() {
                "true" | "1" | "yes" => true,
                "false" | "0" | "no" => false,
                _ => return Err(ConfigError::Invalid("CORS_ALLOW_CREDENTIALS")),
            },
            None => defaults.allow_credentials,
        };
        let max_age_seconds = match non_empty("CORS_MAX_AGE_SECONDS") {
            Some(v) => v
                .trim()
                .parse::<u64>()
                .map_err(|_| ConfigError::Invalid("CORS_MAX_AGE_SECONDS"))?,
            None => defaults.max_age_seconds,
        };

        let cors = CorsSettings {
            allowed_origins: list_or("CORS_ALLOWED_ORIGINS", defaults.allowed_origins),
            allowed_origin_patterns: list_or(
                "CORS_ALLOWED_ORIGIN_PATTERNS",
                defaults.allowed_origin_patterns,
            ),
            allowed_methods: list_or("CORS_ALLOWED_METHODS", defaults.allowed_methods),
            allowed_headers: list_or("CORS_ALLOWED_HEADERS", defaults.allowed_headers),
            exposed_headers: list_or("CORS_EXPOSED_HEADERS", defaults.exposed_headers),
            allow_credentials,
            max_age_seconds,
        };

        let http_defaults = HttpSettings::default();
        let http = HttpSettings {
            timeout_seconds: non_empty("HTTP_TIMEOUT_SECONDS")
                .map(|v| v.trim().parse::<u64>())
                .transpose()
                .map_err(|_| ConfigError::Invalid("HTTP_TIMEOUT_SECONDS"))?
                .unwrap_or(http_defaults.timeout_seconds),
            body_limit_bytes: non_empty("HTTP_BODY_LIMIT_BYTES")
                .map(|v| v.trim().parse::<usize>())
                .transpose()
                .map_err(|_| ConfigError::Invalid("HTTP_BODY_LIMIT_BYTES"))?
                .unwrap_or(http_defaults.body_limit_bytes),
        };

        Ok(Self {
            addr,
            app_env,
            public_paths,
            token_key,
            token_validation,
            cors,
            http,
        })
    }
}
