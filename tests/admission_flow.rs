mod common;

use axum::{
    body::Body,
    http::{HeaderValue, Request, StatusCode, header},
};
use chrono::Utc;
use serde_json::json;

use common::{
    admission_only, assert_status, builtin_gateway, config, gateway, get, json_body, send, sign,
    token_for,
};

#[tokio::test]
async fn private_path_without_credentials_is_401() {
    let router = gateway(&config(&[]));

    let response = send(&router, get("/orders").body(Body::empty()).unwrap()).await;

    assert_status(&response, StatusCode::UNAUTHORIZED);
    assert_eq!(response.headers()[header::WWW_AUTHENTICATE], "Bearer");
    let body = json_body(response).await;
    assert!(
        body["error"]
            .as_str()
            .unwrap()
            .contains("No authentication token"),
        "{body}"
    );
}

#[tokio::test]
async fn public_path_is_forwarded_without_identity() {
    let router = gateway(&config(&[]));

    let response = send(&router, get("/auth/login").body(Body::empty()).unwrap()).await;

    assert_status(&response, StatusCode::OK);
    let body = json_body(response).await;
    assert_eq!(body["reached"], true);
    assert_eq!(body["subject"], serde_json::Value::Null);
}

#[tokio::test]
async fn public_path_passes_a_bogus_authorization_header_through_untouched() {
    let router = gateway(&config(&[]));

    let req = get("/auth/login")
        .header(header::AUTHORIZATION, "Bearer not-a-token")
        .body(Body::empty())
        .unwrap();
    let response = send(&router, req).await;

    assert_status(&response, StatusCode::OK);
    let body = json_body(response).await;
    assert_eq!(body["authorization"], "Bearer not-a-token");
    assert_eq!(body["subject"], serde_json::Value::Null);
}

#[tokio::test]
async fn bare_prefix_of_a_public_pattern_still_requires_auth() {
    let router = gateway(&config(&[]));

    for path in ["/auth", "/authorization", "/actuator/metrics"] {
        let response = send(&router, get(path).body(Body::empty()).unwrap()).await;
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED, "{path}");
    }
}

#[tokio::test]
async fn valid_bearer_token_forwards_identity() {
    let router = gateway(&config(&[]));
    let token = token_for("ada@example.com", &["USER", "ADMIN"]);

    let req = get("/orders")
        .header(header::AUTHORIZATION, format!("Bearer {token}"))
        .body(Body::empty())
        .unwrap();
    let response = send(&router, req).await;

    assert_status(&response, StatusCode::OK);
    let body = json_body(response).await;
    assert_eq!(body["subject"], "ada@example.com");
    assert_eq!(body["roles"], json!(["ADMIN", "USER"]));
}

#[tokio::test]
async fn jwt_cookie_is_accepted_when_no_bearer_header() {
    let router = gateway(&config(&[]));
    let token = token_for("grace", &[]);

    let req = get("/orders")
        .header(header::COOKIE, format!("theme=dark; jwt={token}"))
        .body(Body::empty())
        .unwrap();
    let response = send(&router, req).await;

    assert_status(&response, StatusCode::OK);
    assert_eq!(json_body(response).await["subject"], "grace");
}

#[tokio::test]
async fn bearer_header_takes_precedence_over_cookie() {
    let router = gateway(&config(&[]));
    let good = token_for("grace", &[]);

    // Invalid header token must win over a valid cookie.
    let req = get("/orders")
        .header(header::AUTHORIZATION, "Bearer broken")
        .header(header::COOKIE, format!("jwt={good}"))
        .body(Body::empty())
        .unwrap();
    let response = send(&router, req).await;

    assert_status(&response, StatusCode::UNAUTHORIZED);
    assert_eq!(
        json_body(response).await,
        json!({"error": "Invalid or expired token"})
    );
}

#[tokio::test]
async fn basic_scheme_is_not_a_token() {
    let router = gateway(&config(&[]));

    let req = get("/orders")
        .header(header::AUTHORIZATION, "Basic abc")
        .body(Body::empty())
        .unwrap();
    let response = send(&router, req).await;

    assert_status(&response, StatusCode::UNAUTHORIZED);
    assert_eq!(
        json_body(response).await,
        json!({"error": "No authentication token provided"})
    );
}

#[tokio::test]
async fn expired_token_is_401() {
    let router = gateway(&config(&[("ACCESS_TOKEN_LEEWAY_SECONDS", "0")]));
    let token = sign(&json!({"sub": "ada", "exp": Utc::now().timestamp() - 120}));

    let req = get("/orders")
        .header(header::AUTHORIZATION, format!("Bearer {token}"))
        .body(Body::empty())
        .unwrap();
    let response = send(&router, req).await;

    assert_status(&response, StatusCode::UNAUTHORIZED);
    assert_eq!(json_body(response).await["error"], "Invalid or expired token");
}

#[tokio::test]
async fn corrupt_claims_on_a_signed_token_are_401_not_500() {
    let router = gateway(&config(&[]));
    let token = sign(&json!({"sub": {"nested": true}, "exp": Utc::now().timestamp() + 600}));

    let req = get("/orders")
        .header(header::AUTHORIZATION, format!("Bearer {token}"))
        .body(Body::empty())
        .unwrap();
    let response = send(&router, req).await;

    assert_status(&response, StatusCode::UNAUTHORIZED);
    assert_eq!(
        json_body(response).await,
        json!({"error": "Token processing failed"})
    );
}

#[tokio::test]
async fn plain_options_without_preflight_headers_is_not_exempt() {
    let router = gateway(&config(&[]));

    let req = Request::builder()
        .method("OPTIONS")
        .uri("/orders")
        .body(Body::empty())
        .unwrap();
    let response = send(&router, req).await;

    assert_status(&response, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn custom_public_paths_replace_the_defaults() {
    let router = gateway(&config(&[("PUBLIC_PATHS", "/catalog/**")]));

    let public = send(&router, get("/catalog/items").body(Body::empty()).unwrap()).await;
    let formerly_public = send(&router, get("/auth/login").body(Body::empty()).unwrap()).await;

    assert_status(&public, StatusCode::OK);
    assert_status(&formerly_public, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn builtin_routes_health_me_and_fallback() {
    let router = builtin_gateway(&config(&[]));
    let token = token_for("ada", &["USER"]);

    let health = send(&router, get("/actuator/health").body(Body::empty()).unwrap()).await;
    assert_status(&health, StatusCode::OK);
    assert_eq!(json_body(health).await, json!({"status": "UP"}));

    let me = send(
        &router,
        get("/api/me")
            .header(header::AUTHORIZATION, format!("Bearer {token}"))
            .body(Body::empty())
            .unwrap(),
    )
    .await;
    assert_status(&me, StatusCode::OK);
    let me = json_body(me).await;
    assert_eq!(me["subject"], "ada");
    assert_eq!(me["roles"], json!(["USER"]));

    let anonymous_me = send(&router, get("/api/me").body(Body::empty()).unwrap()).await;
    assert_status(&anonymous_me, StatusCode::UNAUTHORIZED);

    let missing = send(
        &router,
        get("/nowhere")
            .header(header::AUTHORIZATION, format!("Bearer {token}"))
            .body(Body::empty())
            .unwrap(),
    )
    .await;
    assert_status(&missing, StatusCode::NOT_FOUND);
    assert_eq!(json_body(missing).await, json!({"error": "Not found"}));
}

#[tokio::test]
async fn responses_carry_a_request_id() {
    let router = gateway(&config(&[]));

    let response = send(&router, get("/orders").body(Body::empty()).unwrap()).await;

    assert!(response.headers().contains_key("x-request-id"));
}

#[tokio::test]
async fn admission_never_exempts_options_on_a_private_path() {
    let router = admission_only(&config(&[]));

    let shapes: [&[(&str, &str)]; 3] = [
        &[],
        &[("origin", "http://localhost:3000")],
        &[
            ("origin", "http://localhost:3000"),
            ("access-control-request-method", "POST"),
        ],
    ];
    for headers in shapes {
        let mut req = Request::builder().method("OPTIONS").uri("/orders");
        for (name, value) in headers {
            req = req.header(*name, *value);
        }
        let response = send(&router, req.body(Body::empty()).unwrap()).await;

        assert_status(&response, StatusCode::UNAUTHORIZED);
        assert_eq!(
            json_body(response).await,
            json!({"error": "No authentication token provided"})
        );
    }
}

#[tokio::test]
async fn non_text_authorization_header_is_no_token() {
    let router = gateway(&config(&[]));

    let req = get("/orders")
        .header(
            header::AUTHORIZATION,
            HeaderValue::from_bytes(b"Bearer \xe9\x80abc").unwrap(),
        )
        .body(Body::empty())
        .unwrap();
    let response = send(&router, req).await;

    assert_status(&response, StatusCode::UNAUTHORIZED);
    assert_eq!(
        json_body(response).await,
        json!({"error": "No authentication token provided"})
    );
}
