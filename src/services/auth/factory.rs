/// Factory: build the `AdmissionEngine` from application `Config`.
use std::sync::Arc;

use anyhow::Context;

use crate::config::Config;
use crate::services::auth::{AdmissionEngine, JwtCodec, PublicPaths};

pub fn build_admission_engine(config: &Config) -> anyhow::Result<AdmissionEngine> {
    let public_paths = PublicPaths::parse(&config.public_paths).context("invalid PUBLIC_PATHS")?;

    let codec = JwtCodec::new(config.token_key.clone(), config.token_validation.clone())
        .context("invalid token verification key")?;

    tracing::info!(
        patterns = ?public_paths.patterns().iter().map(|p| p.as_str()).collect::<Vec<_>>(),
        "public paths loaded"
    );

    Ok(AdmissionEngine::new(Arc::new(public_paths), Arc::new(codec)))
}
