//! Admin authentication and sessions.
//!
//! The admin secret is configured as an Argon2 hash. A successful login
//! creates a server-side [`Session`] keyed by a random token stored in an
//! `HttpOnly` cookie. The auth middleware resolves that token on every
//! request and places the `Session` into the request extensions, where
//! handlers pick it up with the [`Session`] extractor.

use argon2::password_hash::{PasswordHasher, SaltString};
use argon2::{Argon2, PasswordHash, PasswordVerifier};
use askama::Template;
use axum::async_trait;
use axum::body::Body;
use axum::extract::{FromRequestParts, State};
use axum::http::request::Parts;
use axum::http::{Request, StatusCode};
use axum::middleware::Next;
use axum::response::{IntoResponse, Redirect, Response};
use axum::Form;
use chrono::{DateTime, Duration, Utc};
use serde::Deserialize;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use tower_cookies::{Cookie, Cookies};
use uuid::Uuid;

use crate::config::AuthMode;
use crate::error::{AppError, RenderHtml};
use crate::state::AppState;
use crate::VERSION;

/// Cookie name for the session token.
pub const SESSION_COOKIE: &str = "dishdash_session";

/// An authenticated admin session.
#[derive(Debug, Clone)]
pub struct Session {
    pub token: String,
    pub created_at: DateTime<Utc>,
    pub expires_at: Option<DateTime<Utc>>,
}

impl Session {
    /// Session handed to every visitor when authentication is disabled.
    pub fn anonymous() -> Self {
        Self {
            token: String::new(),
            created_at: Utc::now(),
            expires_at: None,
        }
    }

    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires_at.is_some_and(|at| now >= at)
    }

    /// Anonymous sessions have nothing to sign out of.
    pub fn can_sign_out(&self) -> bool {
        !self.token.is_empty()
    }
}

#[async_trait]
impl<S> FromRequestParts<S> for Session
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<Session>()
            .cloned()
            .ok_or_else(|| AppError::Unauthorized("Admin sign-in required".into()))
    }
}

/// Server-side session store.
#[derive(Clone)]
pub struct SessionStore {
    sessions: Arc<Mutex<HashMap<String, Session>>>,
    ttl: Duration,
}

impl SessionStore {
    pub fn new(ttl_hours: i64) -> Self {
        Self {
            sessions: Arc::new(Mutex::new(HashMap::new())),
            ttl: Duration::hours(ttl_hours.max(1)),
        }
    }

    pub fn create(&self) -> Session {
        let now = Utc::now();
        let session = Session {
            token: Uuid::new_v4().to_string(),
            created_at: now,
            expires_at: Some(now + self.ttl),
        };

        let mut sessions = self.sessions.lock().unwrap_or_else(|e| e.into_inner());
        sessions.retain(|_, s| !s.is_expired(now));
        sessions.insert(session.token.clone(), session.clone());
        session
    }

    /// Look up a live session, dropping it if it has expired.
    pub fn resolve(&self, token: &str) -> Option<Session> {
        let now = Utc::now();
        let mut sessions = self.sessions.lock().unwrap_or_else(|e| e.into_inner());
        match sessions.get(token) {
            Some(session) if session.is_expired(now) => {
                sessions.remove(token);
                None
            }
            Some(session) => Some(session.clone()),
            None => None,
        }
    }

    pub fn remove(&self, token: &str) -> bool {
        self.sessions
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .remove(token)
            .is_some()
    }

    pub fn len(&self) -> usize {
        self.sessions.lock().unwrap_or_else(|e| e.into_inner()).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[derive(Template)]
#[template(path = "pages/login.html")]
pub struct LoginTemplate {
    pub title: String,
    pub version: &'static str,
    pub xsrf_token: String,
    pub has_error: bool,
    pub error: String,
}

#[derive(Debug, Deserialize)]
pub struct LoginFormData {
    pub password: String,
}

/// Resolve the session for each request, redirecting anonymous visitors.
pub async fn auth_middleware(
    State(state): State<AppState>,
    cookies: Cookies,
    mut request: Request<Body>,
    next: Next,
) -> Response {
    if matches!(state.config.auth_mode, AuthMode::Unauthenticated) {
        request.extensions_mut().insert(Session::anonymous());
        return next.run(request).await;
    }

    if let Some(session) = cookies
        .get(SESSION_COOKIE)
        .and_then(|cookie| state.sessions.resolve(cookie.value()))
    {
        request.extensions_mut().insert(session);
        return next.run(request).await;
    }

    let path = request.uri().path();
    if path == "/login" || path.starts_with("/static/") || path == "/health" {
        return next.run(request).await;
    }

    let is_htmx = request.headers().contains_key("HX-Request");
    if is_htmx || path.starts_with("/api/") {
        return (StatusCode::UNAUTHORIZED, "Authentication required").into_response();
    }

    Redirect::to("/login").into_response()
}

pub async fn login_page(State(state): State<AppState>) -> Response {
    if matches!(state.config.auth_mode, AuthMode::Unauthenticated) {
        return Redirect::to("/").into_response();
    }
    render_login(&state, None)
}

pub async fn login_submit(
    State(state): State<AppState>,
    cookies: Cookies,
    Form(form): Form<LoginFormData>,
) -> Response {
    let password_hash = match &state.config.auth_mode {
        AuthMode::Unauthenticated => return Redirect::to("/").into_response(),
        AuthMode::Password(hash) => hash,
    };

    if !verify_password(&form.password, password_hash) {
        tracing::warn!("Rejected admin login attempt");
        return render_login(&state, Some("Invalid password".into()));
    }

    let session = state.sessions.create();
    state.xsrf_token.regenerate();
    tracing::info!(active_sessions = state.sessions.len(), "Admin signed in");

    let cookie = Cookie::build((SESSION_COOKIE, session.token))
        .path("/")
        .http_only(true)
        .same_site(tower_cookies::cookie::SameSite::Strict)
        .build();
    cookies.add(cookie);

    Redirect::to("/").into_response()
}

pub async fn logout(State(state): State<AppState>, cookies: Cookies) -> Redirect {
    if let Some(cookie) = cookies.get(SESSION_COOKIE) {
        if state.sessions.remove(cookie.value()) {
            tracing::info!("Admin signed out");
        }
    }

    cookies.remove(Cookie::build((SESSION_COOKIE, "")).path("/").build());

    Redirect::to("/login")
}

fn render_login(state: &AppState, error: Option<String>) -> Response {
    let status = if error.is_some() {
        StatusCode::UNAUTHORIZED
    } else {
        StatusCode::OK
    };
    let template = LoginTemplate {
        title: "Login".into(),
        version: VERSION,
        xsrf_token: state.xsrf_token.value(),
        has_error: error.is_some(),
        error: error.unwrap_or_default(),
    };

    match template.render_html() {
        Ok(html) => (status, html).into_response(),
        Err(e) => e.into_response(),
    }
}

/// Verify a password against an Argon2 hash.
pub fn verify_password(password: &str, hash: &str) -> bool {
    let Ok(parsed_hash) = PasswordHash::new(hash) else {
        tracing::error!("Invalid password hash format in DISHDASH_PASSWORD_HASH");
        return false;
    };

    Argon2::default()
        .verify_password(password.as_bytes(), &parsed_hash)
        .is_ok()
}

/// Hash an admin secret for `DISHDASH_PASSWORD_HASH`.
pub fn hash_password(password: &str) -> Result<String, AppError> {
    let salt = SaltString::encode_b64(Uuid::new_v4().as_bytes())
        .map_err(|e| AppError::Internal(format!("Salt error: {}", e)))?;
    hash_password_with_salt(password, &salt)
}

pub fn hash_password_with_salt(password: &str, salt: &SaltString) -> Result<String, AppError> {
    Argon2::default()
        .hash_password(password.as_bytes(), salt)
        .map(|hash| hash.to_string())
        .map_err(|e| AppError::Internal(format!("Password hashing failed: {}", e)))
}
