//! Common test utilities and fixtures

#![allow(dead_code)]

use axum::{
    body::{to_bytes, Body},
    http::{header, Request, Response, StatusCode},
    Router,
};
use settings_admin::{config::AppConfig, create_router, storage::InMemoryStore, AppState};
use std::{collections::HashMap, sync::Arc, sync::Mutex};
use tower::util::ServiceExt;

pub const ADMIN_TOKEN: &str = "test-admin-token";
pub const CRON_TOKEN: &str = "0123456789abcdef0123456789abcdef";

/// Test configuration builder
pub struct TestConfigBuilder {
    config: AppConfig,
}

impl TestConfigBuilder {
    pub fn new() -> Self {
        let mut config = AppConfig::default();
        config.server.admin_token = Some(ADMIN_TOKEN.to_string());
        config.server.secure_cookies = false;
        Self { config }
    }

    pub fn without_admin_token(mut self) -> Self {
        self.config.server.admin_token = None;
        self
    }

    pub fn with_login_attempts(mut self, attempts: u32) -> Self {
        self.config.server.login_attempts_per_minute = attempts;
        self
    }

    pub fn with_max_request_bytes(mut self, bytes: usize) -> Self {
        self.config.server.max_request_bytes = bytes;
        self
    }

    pub fn build(self) -> AppConfig {
        self.config
    }
}

impl Default for TestConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// A router over an in-memory store, with a tiny cookie jar that behaves
/// like a browser between requests.
pub struct TestApp {
    pub router: Router,
    pub store: Arc<InMemoryStore>,
    pub state: Arc<AppState>,
    jar: Mutex<HashMap<String, String>>,
}

impl TestApp {
    pub fn new() -> Self {
        Self::with_config(TestConfigBuilder::new().build())
    }

    pub fn with_config(config: AppConfig) -> Self {
        Self::with_state(config, |state| state)
    }

    /// Build the app, letting the caller adjust the state before routing.
    pub fn with_state(config: AppConfig, customize: impl FnOnce(AppState) -> AppState) -> Self {
        let store = Arc::new(InMemoryStore::with_values([
            ("app.name", "Example Site"),
            ("app.color_scheme", "blue"),
            ("app.cronToken", CRON_TOKEN),
            ("mail.driver", "smtp"),
            ("mail.host", "smtp.example.com"),
            ("mail.port", "587"),
            ("mail.from.address", "noreply@example.com"),
            ("mail.from.name", "Example"),
            ("mail.encryption", "tls"),
            ("mail.username", "mailer"),
            ("mail.password", "s3cret"),
        ]));
        let state = Arc::new(customize(AppState::new(config, store.clone()).unwrap()));
        Self {
            router: create_router(state.clone()),
            store,
            state,
            jar: Mutex::new(HashMap::new()),
        }
    }

    /// Send a request with the jar's cookies and remember any cookies set in
    /// the response.
    pub async fn send(&self, mut request: Request<Body>) -> Response<Body> {
        let cookie_header = {
            let jar = self.jar.lock().unwrap();
            jar.iter()
                .map(|(k, v)| format!("{k}={v}"))
                .collect::<Vec<_>>()
                .join("; ")
        };
        if !cookie_header.is_empty() {
            request
                .headers_mut()
                .insert(header::COOKIE, cookie_header.parse().unwrap());
        }

        let response = self.router.clone().oneshot(request).await.unwrap();

        let mut jar = self.jar.lock().unwrap();
        for value in response.headers().get_all(header::SET_COOKIE) {
            let raw = value.to_str().unwrap();
            let pair = raw.split(';').next().unwrap();
            let (name, value) = pair.split_once('=').unwrap();
            let expired = raw.contains("Max-Age=0");
            if value.is_empty() || expired {
                jar.remove(name);
            } else {
                jar.insert(name.to_string(), value.to_string());
            }
        }
        response
    }

    pub fn cookie(&self, name: &str) -> Option<String> {
        self.jar.lock().unwrap().get(name).cloned()
    }

    pub fn set_cookie(&self, name: &str, value: &str) {
        self.jar
            .lock()
            .unwrap()
            .insert(name.to_string(), value.to_string());
    }

    pub async fn get(&self, uri: &str) -> Response<Body> {
        self.send(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
    }

    pub async fn post_form(&self, uri: &str, fields: &[(&str, &str)]) -> Response<Body> {
        let body = url::form_urlencoded::Serializer::new(String::new())
            .extend_pairs(fields)
            .finish();
        self.send(
            Request::builder()
                .method("POST")
                .uri(uri)
                .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
                .body(Body::from(body))
                .unwrap(),
        )
        .await
    }

    pub async fn login(&self) {
        let response = self
            .post_form("/admin/login", &[("token", ADMIN_TOKEN)])
            .await;
        assert_eq!(response.status(), StatusCode::SEE_OTHER);
    }

    /// Load the form page (which issues the CSRF cookie) and return its body.
    pub async fn settings_page(&self) -> String {
        let response = self.get("/admin/settings").await;
        assert_eq!(response.status(), StatusCode::OK);
        body_string(response).await
    }

    /// Submit the settings form with the CSRF token from the jar.
    pub async fn submit(&self, fields: &[(&str, &str)]) -> Response<Body> {
        let token = self.cookie("csrf_token").expect("visit the form first");
        let mut with_token: Vec<(&str, &str)> = fields.to_vec();
        with_token.push(("_token", token.as_str()));
        self.post_form("/admin/settings", &with_token).await
    }

    pub async fn stored(&self, key: &str) -> Option<String> {
        self.store.snapshot().await.get(key).cloned()
    }
}

impl Default for TestApp {
    fn default() -> Self {
        Self::new()
    }
}

pub fn valid_fields() -> Vec<(&'static str, &'static str)> {
    vec![
        ("siteName", "My Site"),
        ("siteSkin", "dark-blue"),
        ("mailDriver", "smtp"),
        ("mailHost", "mail.example.org"),
        ("mailPort", "465"),
        ("mailFromAddress", "admin@example.org"),
        ("mailFromName", "Admin"),
        ("mailEncryption", "ssl"),
        ("mailUsername", "postmaster"),
        ("mailPassword", "hunter2"),
    ]
}

pub async fn body_string(response: Response<Body>) -> String {
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    String::from_utf8(bytes.to_vec()).unwrap()
}
