// src/middleware/admin_auth.rs

use crate::{error::AppError, state::AppState};
use axum::{
    body::Body,
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use cookie::{time::Duration as CookieDuration, SameSite};
use std::sync::Arc;
use tower_cookies::{Cookie, Cookies, Key};
use tracing::{debug, warn};

pub const ADMIN_TOKEN_COOKIE: &str = "admin_token";

/// Constant-time string comparison to prevent timing attacks
pub fn secure_compare(a: &str, b: &str) -> bool {
    if a.len() != b.len() {
        return false;
    }

    let mut result = 0u8;
    for (byte_a, byte_b) in a.bytes().zip(b.bytes()) {
        result |= byte_a ^ byte_b;
    }
    result == 0
}

/// Check a presented token against the configured one. No configured token
/// means nobody can authenticate.
pub fn token_matches(expected: Option<&str>, presented: &str) -> bool {
    match expected {
        Some(expected) if !expected.is_empty() => secure_compare(presented, expected),
        _ => false,
    }
}

/// Mark the browser as authenticated. The cookie is private, so the token
/// never travels in clear text.
pub fn set_session(cookies: &Cookies, key: &Key, token: &str, secure: bool) {
    let cookie = Cookie::build((ADMIN_TOKEN_COOKIE, token.to_string()))
        .path("/admin")
        .http_only(true)
        .secure(secure)
        .same_site(SameSite::Strict)
        .max_age(CookieDuration::hours(12))
        .build();
    cookies.private(key).add(cookie);
}

pub fn clear_session(cookies: &Cookies, key: &Key) {
    cookies
        .private(key)
        .remove(Cookie::build(ADMIN_TOKEN_COOKIE).path("/admin").build());
}

/// Middleware for admin authentication.
/// Checks if the admin token cookie matches the configured admin token.
pub async fn admin_auth_middleware(
    State(state): State<Arc<AppState>>,
    cookies: Cookies,
    req: Request<Body>,
    next: Next,
) -> Result<Response, AppError> {
    let expected = state.config.server.admin_token.as_deref();
    if expected.map_or(true, str::is_empty) {
        warn!("Admin authentication failed: no admin token configured");
        return Err(AppError::unauthorized("admin access is disabled"));
    }

    let presented = cookies
        .private(&state.cookie_key)
        .get(ADMIN_TOKEN_COOKIE)
        .map(|cookie| cookie.value().to_string());

    match presented {
        Some(token) if token_matches(expected, &token) => {
            debug!("Admin authentication successful");
            Ok(next.run(req).await)
        }
        _ => {
            warn!("Admin authentication failed: invalid or missing token");
            Err(AppError::unauthorized("missing or invalid admin session"))
        }
    }
}
