/*
 * Responsibility
 * - Config loading -> dependency construction -> Router assembly
 * - Middleware order (outer to inner): request-id/trace -> CORS -> limits -> admission -> routes
 * - axum::serve() startup
 */
use std::{panic, process, sync::Arc};

use anyhow::{Context, Result};
use axum::Router;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::config::{Config, HttpSettings};
use crate::services::auth::build_admission_engine;
use crate::services::cors::CorsPolicy;
use crate::state::AppState;
use crate::{api, middleware};

fn init_tracing() {
    // Prefer RUST_LOG if set; otherwise use a sensible default.
    // Ex:
    // RUST_LOG=info,edge_gateway=debug,tower_http=debug cargo run
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info,tower_http=info"));

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .init();
}

fn init_panic_hook(abort_on_panic: bool) {
    let default_hook = panic::take_hook();

    panic::set_hook(Box::new(move |info| {
        // Surface panics via tracing; stderr may be hidden depending on how we're launched.
        tracing::error!(?info, "panic");

        // Development: crash the whole process so it gets noticed.
        if abort_on_panic {
            process::abort();
        } else {
            default_hook(info);
        }
    }))
}

pub async fn run() -> Result<()> {
    init_tracing();
    let config = Config::from_env()?;
    init_panic_hook(!config.app_env.is_production());

    tracing::info!(
        "starting gateway in {:?} mode on {}",
        config.app_env,
        config.addr
    );

    let state = build_state(&config)?;
    let app = build_router(state, &config.http);

    let listener = tokio::net::TcpListener::bind(config.addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}

/// Build process-level services once. Any misconfiguration (including a
/// wildcard CORS origin combined with credentials) stops startup here.
pub fn build_state(config: &Config) -> Result<AppState> {
    let admission = build_admission_engine(config)?;
    let cors = CorsPolicy::new(config.cors.clone()).context("invalid CORS policy")?;

    Ok(AppState::new(Arc::new(admission), Arc::new(cors)))
}

pub fn build_router(state: AppState, http: &HttpSettings) -> Router {
    let router = api::routes().with_state(state.clone());
    gate(router, state, http)
}

/// Wrap any downstream router in the gateway edge layers.
pub fn gate(downstream: Router, state: AppState, http: &HttpSettings) -> Router {
    let router = middleware::auth::access::apply(downstream, state.clone());
    let router = middleware::http::apply_limits(router, http);
    let router = middleware::cors::apply(router, state.cors.clone());
    middleware::http::apply(router)
}
