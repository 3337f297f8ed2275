mod common;

use std::sync::Arc;

use axum::body::Body;
use axum::http::{header, Method, Request, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use serde_json::{json, Value};
use tower::util::ServiceExt;

use common::*;
use fireside::verifier::{EmulatorVerifier, TokenVerifier};
use fireside::web::{router, AppState};

/// App wired for production mode against the given certificate endpoint.
fn production_app(certs_url: impl Into<String>) -> Router {
    let config = test_config(None);
    let verifier = TokenVerifier::Production(production_verifier(certs_url));
    router(Arc::new(AppState::with_verifier(&config, verifier)))
}

/// App wired for emulator mode.
fn emulator_app() -> Router {
    let config = test_config(Some("localhost:9099"));
    let verifier = TokenVerifier::Emulator(EmulatorVerifier::new());
    router(Arc::new(AppState::with_verifier(&config, verifier)))
}

/// A production app whose certificate endpoint is never expected to answer.
fn offline_app() -> Router {
    production_app("http://127.0.0.1:9/")
}

async fn send(
    app: Router,
    method: Method,
    uri: &str,
    authorization: Option<&str>,
) -> (StatusCode, Vec<u8>) {
    let mut request = Request::builder().method(method).uri(uri);
    if let Some(value) = authorization {
        request = request.header(header::AUTHORIZATION, value);
    }
    let response = app
        .oneshot(request.body(Body::empty()).unwrap())
        .await
        .unwrap();

    let status = response.status();
    let body = response.into_body().collect().await.unwrap().to_bytes();
    (status, body.to_vec())
}

fn unauthenticated_envelope() -> Value {
    json!({
        "error": {
            "code": "UNAUTHENTICATED",
            "message": "Missing or invalid authentication token"
        }
    })
}

#[tokio::test]
async fn home_page_serves_html() {
    let app = offline_app();
    let response = app
        .oneshot(Request::builder().uri("/").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers()[header::CONTENT_TYPE],
        "text/html; charset=utf-8"
    );

    let body = response.into_body().collect().await.unwrap().to_bytes();
    let html = String::from_utf8(body.to_vec()).unwrap();
    assert!(html.contains("Hello, World!"));
    assert!(html.contains("signin-btn"));
    assert!(html.contains("signout-btn"));
    assert!(html.contains(r#"href="/profile""#));
    assert!(html.contains(r#"projectId: "test-project-123""#));
    assert!(html.contains("firebasejs/11.3.0/firebase-app.js"));
}

#[tokio::test]
async fn profile_page_serves_html() {
    let (status, body) = send(offline_app(), Method::GET, "/profile", None).await;
    assert_eq!(status, StatusCode::OK);

    let html = String::from_utf8(body).unwrap();
    assert!(html.contains(r#"fetch("/api/me""#));
    assert!(html.contains("signout-btn"));
}

#[tokio::test]
async fn emulator_mode_pages_connect_to_emulator() {
    let (_, body) = send(emulator_app(), Method::GET, "/", None).await;
    let html = String::from_utf8(body).unwrap();
    assert!(html.contains(r#"connectAuthEmulator(auth, "http://localhost:9099""#));

    let (_, body) = send(offline_app(), Method::GET, "/", None).await;
    let html = String::from_utf8(body).unwrap();
    assert!(!html.contains("connectAuthEmulator(auth,"));
}

#[tokio::test]
async fn me_without_authorization_is_unauthenticated() {
    let (status, body) = send(offline_app(), Method::GET, "/api/me", None).await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
    let parsed: Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(parsed, unauthenticated_envelope());
}

#[tokio::test]
async fn me_with_basic_scheme_is_unauthenticated() {
    let (status, body) = send(
        offline_app(),
        Method::GET,
        "/api/me",
        Some("Basic dXNlcjpwYXNz"),
    )
    .await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
    let parsed: Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(parsed, unauthenticated_envelope());
}

#[tokio::test]
async fn me_with_empty_bearer_token_is_unauthenticated() {
    let (status, _) = send(offline_app(), Method::GET, "/api/me", Some("Bearer ")).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn me_with_garbage_token_is_unauthenticated() {
    let (status, body) = send(
        offline_app(),
        Method::GET,
        "/api/me",
        Some("Bearer this-is-not-a-jwt"),
    )
    .await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
    let parsed: Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(parsed, unauthenticated_envelope());
}

#[tokio::test]
async fn me_with_valid_token_returns_profile() {
    let server = start_cert_server(1).await;
    let app = production_app(server.uri());

    let token = sign_token(&base_claims(), PRIVATE_KEY_PEM, Some(KID));
    let (status, body) = send(
        app,
        Method::GET,
        "/api/me",
        Some(&format!("Bearer {token}")),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    let parsed: Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(
        parsed,
        json!({
            "uid": "user-uid-abc123",
            "email": "jane@example.com",
            "name": "Jane Doe",
            "picture": "https://example.com/jane/photo.jpg"
        })
    );
}

#[tokio::test]
async fn me_without_picture_claim_returns_empty_string() {
    let server = start_cert_server(1).await;
    let app = production_app(server.uri());

    let mut claims = base_claims();
    claims.as_object_mut().unwrap().remove("picture");
    let token = sign_token(&claims, PRIVATE_KEY_PEM, Some(KID));

    let (status, body) = send(
        app,
        Method::GET,
        "/api/me",
        Some(&format!("Bearer {token}")),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    let parsed: Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(parsed["picture"], json!(""));
}

#[tokio::test]
async fn me_with_expired_token_is_unauthenticated() {
    let server = start_cert_server(1).await;
    let app = production_app(server.uri());

    let mut claims = base_claims();
    claims["exp"] = json!(unix_now() - 7200);
    let token = sign_token(&claims, PRIVATE_KEY_PEM, Some(KID));

    let (status, body) = send(
        app,
        Method::GET,
        "/api/me",
        Some(&format!("Bearer {token}")),
    )
    .await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
    let parsed: Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(parsed, unauthenticated_envelope());
}

#[tokio::test]
async fn emulator_mode_accepts_unsigned_token() {
    let token = unsigned_token(&base_claims());
    let (status, body) = send(
        emulator_app(),
        Method::GET,
        "/api/me",
        Some(&format!("Bearer {token}")),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    let parsed: Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(parsed["uid"], json!("user-uid-abc123"));
}

#[tokio::test]
async fn emulator_mode_still_rejects_garbage() {
    let (status, _) = send(
        emulator_app(),
        Method::GET,
        "/api/me",
        Some("Bearer garbage"),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn unknown_path_is_404_with_empty_body() {
    let (status, body) = send(offline_app(), Method::GET, "/nonexistent", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert!(body.is_empty());
}

#[tokio::test]
async fn post_to_page_routes_is_rejected() {
    let (status, _) = send(offline_app(), Method::POST, "/", None).await;
    assert_eq!(status, StatusCode::METHOD_NOT_ALLOWED);

    let (status, _) = send(offline_app(), Method::POST, "/api/me", None).await;
    assert_eq!(status, StatusCode::METHOD_NOT_ALLOWED);
}
