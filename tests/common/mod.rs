#![allow(dead_code)]

use std::collections::HashMap;

use axum::{
    Extension, Json, Router,
    body::Body,
    http::{HeaderMap, Request, StatusCode, header},
    response::Response,
};
use chrono::Utc;
use jsonwebtoken::{Algorithm, EncodingKey, Header};
use serde_json::{Value, json};
use tower::ServiceExt;

use edge_gateway::api::extractors::AuthCtx;
use edge_gateway::app;
use edge_gateway::config::Config;
use edge_gateway::middleware::auth::access;

pub const SECRET: &str = "integration-test-secret-integration";

pub fn config(extra: &[(&str, &str)]) -> Config {
    let mut env: HashMap<String, String> = HashMap::new();
    env.insert("JWT_SECRET".into(), SECRET.into());
    for (k, v) in extra {
        env.insert(k.to_string(), v.to_string());
    }
    Config::from_lookup(|key| env.get(key).cloned()).expect("test config should load")
}

pub fn sign(claims: &Value) -> String {
    jsonwebtoken::encode(
        &Header::new(Algorithm::HS256),
        claims,
        &EncodingKey::from_secret(SECRET.as_bytes()),
    )
    .expect("sign test token")
}

pub fn token_for(subject: &str, roles: &[&str]) -> String {
    sign(&json!({
        "sub": subject,
        "roles": roles,
        "exp": Utc::now().timestamp() + 600,
    }))
}

/// Downstream stand-in: reports what it received.
async fn echo(auth: Option<Extension<AuthCtx>>, headers: HeaderMap) -> Json<Value> {
    let (subject, roles): (Option<String>, Vec<String>) = match auth {
        Some(Extension(ctx)) => (Some(ctx.subject), ctx.roles.into_iter().collect()),
        None => (None, Vec::new()),
    };
    Json(json!({
        "reached": true,
        "subject": subject,
        "roles": roles,
        "authorization": headers
            .get(header::AUTHORIZATION)
            .and_then(|v| v.to_str().ok()),
    }))
}

/// Gateway edge wrapped around an echoing downstream.
pub fn gateway(config: &Config) -> Router {
    let state = app::build_state(config).expect("state should build");
    let downstream = Router::new().fallback(echo);
    app::gate(downstream, state, &config.http)
}

/// Admission gate alone, with no CORS layer in front of it.
pub fn admission_only(config: &Config) -> Router {
    let state = app::build_state(config).expect("state should build");
    access::apply(Router::new().fallback(echo), state)
}

/// Gateway with its own built-in routes.
pub fn builtin_gateway(config: &Config) -> Router {
    let state = app::build_state(config).expect("state should build");
    app::build_router(state, &config.http)
}

pub async fn send(router: &Router, req: Request<Body>) -> Response {
    router.clone().oneshot(req).await.expect("infallible")
}

pub fn get(path: &str) -> axum::http::request::Builder {
    Request::builder().method("GET").uri(path)
}

pub async fn json_body(response: Response) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("read body");
    serde_json::from_slice(&bytes).expect("json body")
}

pub fn assert_status(response: &Response, status: StatusCode) {
    assert_eq!(response.status(), status, "unexpected status");
}
