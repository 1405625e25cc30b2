// src/middleware/csrf.rs

//! Double-submit CSRF protection.
//!
//! The form page issues a random token in the `csrf_token` cookie and embeds
//! the same value in a hidden `_token` field. A state-changing request must
//! echo it back, either in that field or in the `X-CSRF-Token` header.

use crate::error::{AppError, Result};
use crate::middleware::admin_auth::secure_compare;
use axum::http::{HeaderMap, HeaderName};
use cookie::SameSite;
use rand::{thread_rng, Rng};
use tower_cookies::{Cookie, Cookies};
use tracing::{debug, warn};

/// The name of the custom header for the CSRF token.
pub static X_CSRF_TOKEN: HeaderName = HeaderName::from_static("x-csrf-token");
/// The name of the cookie storing the CSRF token.
pub const CSRF_TOKEN_COOKIE: &str = "csrf_token";
/// The hidden form field carrying the CSRF token.
pub const CSRF_FORM_FIELD: &str = "_token";

const MAX_TOKEN_LEN: usize = 128;

/// Return the browser's current token, minting and setting a new one when
/// none is present.
pub fn issue_token(cookies: &Cookies, secure: bool) -> String {
    if let Some(existing) = cookies
        .get(CSRF_TOKEN_COOKIE)
        .map(|c| c.value().to_string())
        .filter(|v| !v.is_empty() && v.len() <= MAX_TOKEN_LEN)
    {
        return existing;
    }

    let mut token_bytes = [0u8; 32];
    thread_rng().fill(&mut token_bytes);
    let token = hex::encode(token_bytes);

    let cookie = Cookie::build((CSRF_TOKEN_COOKIE, token.clone()))
        .path("/admin")
        .http_only(true)
        .secure(secure)
        .same_site(SameSite::Strict)
        .build();
    cookies.add(cookie);
    debug!("Issued new CSRF token");
    token
}

/// Accept the request only if the cookie token matches the form field or,
/// failing that, the `X-CSRF-Token` header.
pub fn verify(cookies: &Cookies, headers: &HeaderMap, form_token: Option<&str>) -> Result<()> {
    let cookie_token = cookies
        .get(CSRF_TOKEN_COOKIE)
        .map(|cookie| cookie.value().to_string());

    let presented = form_token.or_else(|| {
        headers
            .get(&X_CSRF_TOKEN)
            .and_then(|value| value.to_str().ok())
    });

    match (cookie_token, presented) {
        (Some(c_token), Some(p_token))
            if !c_token.is_empty()
                && c_token.len() <= MAX_TOKEN_LEN
                && p_token.len() <= MAX_TOKEN_LEN
                && secure_compare(&c_token, p_token) =>
        {
            debug!("CSRF token matched.");
            Ok(())
        }
        _ => {
            warn!("CSRF token mismatch or missing. Access forbidden.");
            Err(AppError::Csrf)
        }
    }
}
