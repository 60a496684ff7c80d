//! Shared test utilities for integration tests.
//!
//! `TestClient` drives the full application router (auth, XSRF and error-page
//! middleware included) against a fresh in-memory database. It keeps a tiny
//! cookie jar so a login carries over to later requests. Methods are
//! intentionally broad to support various test scenarios across files.

#![allow(dead_code)]

use axum::body::Body;
use axum::http::{header, Request, Response, StatusCode};
use axum::Router;
use dish_dash::config::{AuthMode, Config};
use dish_dash::db::{create_in_memory_pool, migrations};
use dish_dash::server;
use dish_dash::state::AppState;
use dish_dash::xsrf::{XSRF_FORM_FIELD, XSRF_HEADER};
use http_body_util::BodyExt;
use std::path::Path;
use std::sync::Mutex;
use tower::ServiceExt;

/// A test client that simulates a browser session, allowing sequential requests
/// against the application.
pub struct TestClient {
    pub state: AppState,
    cookie: Mutex<Option<String>>,
}

impl TestClient {
    /// Create a new test client with a fresh in-memory database (unauthenticated mode).
    pub fn new() -> Self {
        Self::with_auth_mode(AuthMode::Unauthenticated)
    }

    /// Create a new test client with a specific authentication mode.
    pub fn with_auth_mode(auth_mode: AuthMode) -> Self {
        let pool = create_in_memory_pool().expect("Failed to create in-memory pool");
        {
            let conn = pool.get().expect("Failed to get connection");
            migrations::run_migrations(&conn, Path::new("migrations"))
                .expect("Failed to run migrations");
        }

        Self {
            state: AppState::new(pool, Config::local(auth_mode)),
            cookie: Mutex::new(None),
        }
    }

    pub fn router(&self) -> Router {
        server::router(self.state.clone())
    }

    /// Send a request through the router, remembering any session cookie.
    pub async fn send(&self, request: Request<Body>) -> Response<Body> {
        let response = self.router().oneshot(request).await.unwrap();

        if let Some(set_cookie) = response.headers().get(header::SET_COOKIE) {
            let pair = set_cookie
                .to_str()
                .unwrap()
                .split(';')
                .next()
                .unwrap()
                .to_string();
            let mut jar = self.cookie.lock().unwrap();
            // removal cookies come back with an empty value
            if pair.ends_with('=') {
                *jar = None;
            } else {
                *jar = Some(pair);
            }
        }

        response
    }

    fn request(&self, method: &str, uri: &str) -> axum::http::request::Builder {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(cookie) = self.cookie.lock().unwrap().as_ref() {
            builder = builder.header(header::COOKIE, cookie);
        }
        builder
    }

    async fn read(response: Response<Body>) -> (StatusCode, String) {
        let status = response.status();
        let body = response.into_body().collect().await.unwrap().to_bytes();
        (status, String::from_utf8_lossy(&body).to_string())
    }

    /// Make a GET request and return status and body.
    pub async fn get(&self, uri: &str) -> (StatusCode, String) {
        let request = self.request("GET", uri).body(Body::empty()).unwrap();
        Self::read(self.send(request).await).await
    }

    /// Make a GET request as HTMX would.
    pub async fn get_htmx(&self, uri: &str) -> (StatusCode, String) {
        let request = self
            .request("GET", uri)
            .header("HX-Request", "true")
            .body(Body::empty())
            .unwrap();
        Self::read(self.send(request).await).await
    }

    /// Make a GET request and return the status and `Location` header.
    pub async fn get_redirect(&self, uri: &str) -> (StatusCode, Option<String>) {
        let request = self.request("GET", uri).body(Body::empty()).unwrap();
        let response = self.send(request).await;
        (response.status(), location(&response))
    }

    fn form_body(form_data: &[(&str, &str)]) -> String {
        form_data
            .iter()
            .map(|(k, v)| format!("{}={}", k, urlencoding::encode(v)))
            .collect::<Vec<_>>()
            .join("&")
    }

    fn form_request(&self, uri: &str, body: String, with_header: bool) -> Request<Body> {
        let mut builder = self
            .request("POST", uri)
            .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded");
        if with_header {
            builder = builder.header(XSRF_HEADER, self.state.xsrf_token.value());
        }
        builder.body(Body::from(body)).unwrap()
    }

    /// POST form data with the XSRF header and return status and body.
    pub async fn post_form(&self, uri: &str, form_data: &[(&str, &str)]) -> (StatusCode, String) {
        let request = self.form_request(uri, Self::form_body(form_data), true);
        Self::read(self.send(request).await).await
    }

    /// POST form data and return the status and `Location` header.
    pub async fn post_form_redirect(
        &self,
        uri: &str,
        form_data: &[(&str, &str)],
    ) -> (StatusCode, Option<String>) {
        let request = self.form_request(uri, Self::form_body(form_data), true);
        let response = self.send(request).await;
        (response.status(), location(&response))
    }

    /// POST form data carrying the XSRF token as a form field instead of a header.
    pub async fn post_form_with_token_field(
        &self,
        uri: &str,
        form_data: &[(&str, &str)],
    ) -> (StatusCode, Option<String>) {
        let token = self.state.xsrf_token.value();
        let mut fields = form_data.to_vec();
        fields.push((XSRF_FORM_FIELD, token.as_str()));
        let request = self.form_request(uri, Self::form_body(&fields), false);
        let response = self.send(request).await;
        (response.status(), location(&response))
    }

    /// POST form data without any XSRF token.
    pub async fn post_form_without_xsrf(
        &self,
        uri: &str,
        form_data: &[(&str, &str)],
    ) -> (StatusCode, String) {
        let request = self.form_request(uri, Self::form_body(form_data), false);
        Self::read(self.send(request).await).await
    }

    /// Make an HTMX DELETE request and return status and body.
    pub async fn delete(&self, uri: &str) -> (StatusCode, String) {
        let request = self
            .request("DELETE", uri)
            .header("HX-Request", "true")
            .header(XSRF_HEADER, self.state.xsrf_token.value())
            .body(Body::empty())
            .unwrap();
        Self::read(self.send(request).await).await
    }

    /// Get JSON from an endpoint and parse it.
    pub async fn get_json<T: serde::de::DeserializeOwned>(
        &self,
        uri: &str,
    ) -> (StatusCode, Option<T>) {
        let (status, body) = self.get(uri).await;
        let parsed = serde_json::from_str(&body).ok();
        (status, parsed)
    }

    pub fn has_session_cookie(&self) -> bool {
        self.cookie.lock().unwrap().is_some()
    }

    // =========================================================================
    // Helper methods for creating entities through the web forms
    // =========================================================================

    /// Create a dish via POST and return success status.
    pub async fn create_dish(
        &self,
        name: &str,
        price: &str,
        kind: &str,
        category_id: Option<i64>,
    ) -> bool {
        let category = category_id.map(|id| id.to_string()).unwrap_or_default();
        let (status, location) = self
            .post_form_redirect(
                "/menu/create",
                &[
                    ("name", name),
                    ("price", price),
                    ("kind", kind),
                    ("category_id", &category),
                    ("is_available", "on"),
                ],
            )
            .await;
        status == StatusCode::SEE_OTHER
            && location.is_some_and(|l| l.contains("level=success"))
    }

    /// Record a transaction via POST and return success status.
    pub async fn create_transaction(
        &self,
        kind: &str,
        amount: &str,
        description: &str,
        dish_id: Option<i64>,
        quantity: Option<i64>,
        date: Option<&str>,
    ) -> bool {
        let dish = dish_id.map(|id| id.to_string()).unwrap_or_default();
        let qty = quantity.map(|q| q.to_string()).unwrap_or_default();
        let (status, location) = self
            .post_form_redirect(
                "/transactions/create",
                &[
                    ("kind", kind),
                    ("amount", amount),
                    ("description", description),
                    ("dish_id", &dish),
                    ("quantity", &qty),
                    ("date", date.unwrap_or("")),
                ],
            )
            .await;
        status == StatusCode::SEE_OTHER
            && location.is_some_and(|l| l.contains("level=success"))
    }

    /// Add a worker via POST and return success status.
    pub async fn create_worker(
        &self,
        name: &str,
        designation: &str,
        payment: &str,
        effective_date: &str,
    ) -> bool {
        let (status, location) = self
            .post_form_redirect(
                "/workers/create",
                &[
                    ("name", name),
                    ("designation", designation),
                    ("payment", payment),
                    ("effective_date", effective_date),
                ],
            )
            .await;
        status == StatusCode::SEE_OTHER
            && location.is_some_and(|l| l.contains("level=success"))
    }
}

fn location(response: &Response<Body>) -> Option<String> {
    response
        .headers()
        .get(header::LOCATION)
        .and_then(|v| v.to_str().ok())
        .map(String::from)
}

/// Today's date in local time, formatted for form inputs.
pub fn today() -> String {
    chrono::Local::now().format("%Y-%m-%d").to_string()
}
