// src/web.rs

use std::sync::Arc;
use std::time::Instant;

use axum::{
    extract::{Request, State},
    http::{header, HeaderMap, StatusCode},
    middleware::{self, Next},
    response::{Html, IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde::Serialize;
use tower_http::trace::TraceLayer;
use tracing::{info, warn};
use uuid::Uuid;

use crate::config::Config;
use crate::pages;
use crate::verifier::TokenVerifier;

/// Shared application state.
pub struct AppState {
    pub verifier: TokenVerifier,
    // Pages depend only on startup configuration, so they are rendered once.
    home_html: String,
    profile_html: String,
}

impl AppState {
    pub fn new(config: &Config) -> Self {
        Self::with_verifier(config, TokenVerifier::from_config(&config.firebase))
    }

    /// Builds state around an explicit verifier so tests can point the
    /// production verifier at a local certificate endpoint.
    pub fn with_verifier(config: &Config, verifier: TokenVerifier) -> Self {
        Self {
            verifier,
            home_html: pages::home_page(&config.firebase),
            profile_html: pages::profile_page(&config.firebase),
        }
    }
}

/// Creates the router.
pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/", get(home_handler))
        .route("/profile", get(profile_handler))
        .route("/api/me", get(me_handler))
        .fallback(not_found_handler)
        .layer(middleware::from_fn(log_requests))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn home_handler(State(state): State<Arc<AppState>>) -> Html<String> {
    Html(state.home_html.clone())
}

async fn profile_handler(State(state): State<Arc<AppState>>) -> Html<String> {
    Html(state.profile_html.clone())
}

/// GET /api/me: the authenticated user's profile as JSON.
///
/// Every failure, from a missing header to a bad signature, produces the
/// same UNAUTHENTICATED envelope. The specific reason is logged server-side
/// only; echoing it would hand an attacker a verification oracle. The token
/// value itself is never logged.
async fn me_handler(State(state): State<Arc<AppState>>, headers: HeaderMap) -> Response {
    let Some(token) = bearer_token(&headers) else {
        return unauthenticated_response();
    };

    match state.verifier.verify(token).await {
        Ok(user) => Json(user).into_response(),
        Err(err) => {
            warn!(error = %err, "token verification failed");
            unauthenticated_response()
        }
    }
}

async fn not_found_handler() -> StatusCode {
    StatusCode::NOT_FOUND
}

/// Extracts the token from a `Bearer <token>` authorization header. Missing
/// header, any other scheme, and an empty token all come back as `None`.
fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    let value = headers.get(header::AUTHORIZATION)?.to_str().ok()?;
    let token = value.strip_prefix("Bearer ")?;
    if token.is_empty() {
        None
    } else {
        Some(token)
    }
}

#[derive(Debug, Serialize)]
struct ErrorEnvelope {
    error: ErrorDetail,
}

#[derive(Debug, Serialize)]
struct ErrorDetail {
    code: &'static str,
    message: &'static str,
}

fn unauthenticated_response() -> Response {
    (
        StatusCode::UNAUTHORIZED,
        Json(ErrorEnvelope {
            error: ErrorDetail {
                code: "UNAUTHENTICATED",
                message: "Missing or invalid authentication token",
            },
        }),
    )
        .into_response()
}

/// Logs one line per request: id, method, path, status, latency.
async fn log_requests(request: Request, next: Next) -> Response {
    let method = request.method().clone();
    let path = request.uri().path().to_owned();
    let request_id = Uuid::new_v4();
    let start = Instant::now();

    let response = next.run(request).await;

    info!(
        %request_id,
        %method,
        path = %path,
        status = response.status().as_u16(),
        latency_ms = start.elapsed().as_secs_f64() * 1000.0,
        "request"
    );
    response
}

#[cfg(test)]
mod tests {
    use axum::http::HeaderValue;

    use super::*;

    fn headers_with_authorization(value: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(header::AUTHORIZATION, HeaderValue::from_str(value).unwrap());
        headers
    }

    #[test]
    fn bearer_token_extracted() {
        let headers = headers_with_authorization("Bearer abc.def.ghi");
        assert_eq!(bearer_token(&headers), Some("abc.def.ghi"));
    }

    #[test]
    fn bearer_token_missing_header() {
        assert_eq!(bearer_token(&HeaderMap::new()), None);
    }

    #[test]
    fn bearer_token_wrong_scheme() {
        let headers = headers_with_authorization("Basic dXNlcjpwYXNz");
        assert_eq!(bearer_token(&headers), None);
    }

    #[test]
    fn bearer_token_empty_value() {
        let headers = headers_with_authorization("Bearer ");
        assert_eq!(bearer_token(&headers), None);
    }

    #[test]
    fn bearer_token_scheme_is_case_sensitive() {
        let headers = headers_with_authorization("bearer abc");
        assert_eq!(bearer_token(&headers), None);
    }
}
