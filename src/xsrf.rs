//! XSRF (Cross-Site Request Forgery) protection.
//!
//! Every state-changing request (POST, PUT, DELETE, PATCH) must echo the
//! current token, either in the `X-XSRF-Token` header (HTMX) or in the
//! `_xsrf_token` field of a urlencoded form body.

use axum::body::Body;
use axum::http::header::CONTENT_TYPE;
use axum::http::{Method, Request, StatusCode};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use std::sync::{Arc, RwLock};
use uuid::Uuid;

/// The header name for XSRF tokens in AJAX/HTMX requests.
pub const XSRF_HEADER: &str = "X-XSRF-Token";

/// The form field name for XSRF tokens in form submissions.
pub const XSRF_FORM_FIELD: &str = "_xsrf_token";

/// Form bodies above this size are rejected before parsing.
const MAX_FORM_BYTES: usize = 64 * 1024;

/// Shared, rotatable XSRF token.
#[derive(Clone)]
pub struct XsrfToken(Arc<RwLock<String>>);

impl XsrfToken {
    pub fn generate() -> Self {
        Self(Arc::new(RwLock::new(Uuid::new_v4().to_string())))
    }

    pub fn value(&self) -> String {
        self.0.read().unwrap_or_else(|e| e.into_inner()).clone()
    }

    /// Replace the token, e.g. after a successful login.
    pub fn regenerate(&self) {
        let mut guard = self.0.write().unwrap_or_else(|e| e.into_inner());
        *guard = Uuid::new_v4().to_string();
    }

    fn matches(&self, candidate: &str) -> bool {
        *self.0.read().unwrap_or_else(|e| e.into_inner()) == candidate
    }
}

/// Middleware that validates XSRF tokens on state-changing requests.
pub async fn xsrf_middleware(
    xsrf_token: XsrfToken,
    request: Request<Body>,
    next: Next,
) -> Response {
    if !matches!(
        *request.method(),
        Method::POST | Method::PUT | Method::DELETE | Method::PATCH
    ) {
        return next.run(request).await;
    }

    let header_token = request
        .headers()
        .get(XSRF_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(String::from);

    if let Some(token) = header_token {
        if xsrf_token.matches(&token) {
            return next.run(request).await;
        }
        tracing::warn!(path = %request.uri().path(), "XSRF header token mismatch");
        return xsrf_error_response();
    }

    let is_form = request
        .headers()
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|ct| ct.starts_with("application/x-www-form-urlencoded"));

    if !is_form {
        return xsrf_error_response();
    }

    let (parts, body) = request.into_parts();
    let Ok(bytes) = axum::body::to_bytes(body, MAX_FORM_BYTES).await else {
        return xsrf_error_response();
    };

    let fields: Vec<(String, String)> = serde_urlencoded::from_bytes(&bytes).unwrap_or_default();
    let valid = fields
        .iter()
        .any(|(key, value)| key == XSRF_FORM_FIELD && xsrf_token.matches(value));

    if valid {
        next.run(Request::from_parts(parts, Body::from(bytes))).await
    } else {
        tracing::warn!(path = %parts.uri.path(), "Missing or invalid XSRF form token");
        xsrf_error_response()
    }
}

fn xsrf_error_response() -> Response {
    (StatusCode::FORBIDDEN, "Invalid or missing XSRF token").into_response()
}
