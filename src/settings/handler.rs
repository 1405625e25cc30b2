//! HTTP handlers for the admin settings page
//!
//! - GET  /admin/login     login form
//! - POST /admin/login     exchange the admin token for a session cookie
//! - POST /admin/logout    drop the session (CSRF token required)
//! - GET  /admin/settings  settings form (session required)
//! - POST /admin/settings  save settings (session and CSRF token required)

use crate::error::Result;
use crate::middleware::{
    admin_auth::{clear_session, set_session, token_matches},
    admin_auth_middleware,
    csrf::{self, CSRF_FORM_FIELD},
    login_rate_limit_middleware,
};
use crate::settings::flash::Flash;
use crate::settings::view::SettingsPage;
use crate::state::AppState;
use axum::{
    extract::State,
    http::{header, HeaderMap, StatusCode},
    middleware,
    response::{Html, IntoResponse, Redirect, Response},
    routing::{get, post},
    Form, Router,
};
use serde::Deserialize;
use std::collections::HashMap;
use std::sync::Arc;
use tower_cookies::{CookieManagerLayer, Cookies};
use tracing::{info, warn};

pub const SETTINGS_PATH: &str = "/admin/settings";
pub const LOGIN_PATH: &str = "/admin/login";

#[derive(Debug, Deserialize)]
pub struct LoginForm {
    #[serde(default)]
    pub token: String,
}

/// Create the `/admin` router. Authentication runs before any settings
/// handler; login attempts are throttled.
pub fn admin_routes(state: Arc<AppState>) -> Router<Arc<AppState>> {
    let authed_routes = Router::new()
        .route("/settings", get(show_settings).post(submit_settings))
        .route("/logout", post(logout))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            admin_auth_middleware,
        ));

    let login_routes = Router::new()
        .route("/login", get(login_page).post(login))
        .route_layer(middleware::from_fn_with_state(
            state,
            login_rate_limit_middleware,
        ));

    Router::new().nest(
        "/admin",
        Router::new()
            .route("/", get(|| async { Redirect::to(SETTINGS_PATH) }))
            .merge(login_routes)
            .merge(authed_routes)
            .layer(CookieManagerLayer::new()),
    )
}

/// GET /admin/settings
async fn show_settings(State(state): State<Arc<AppState>>, cookies: Cookies) -> Result<Response> {
    let (title, mut record) = state.settings.show_settings_form().await?;

    let flash = Flash::take(&cookies, &state.cookie_key);
    if let Some(flash) = &flash {
        record.overlay_input(&flash.input);
    }
    let csrf_token = csrf::issue_token(&cookies, state.secure_cookies());

    let body = state.view.render_settings(&SettingsPage {
        title,
        record: &record,
        flash: flash.as_ref(),
        csrf_token: &csrf_token,
    });
    Ok(([(header::CACHE_CONTROL, "no-store")], Html(body)).into_response())
}

/// POST /admin/settings
async fn submit_settings(
    State(state): State<Arc<AppState>>,
    cookies: Cookies,
    headers: HeaderMap,
    Form(mut input): Form<HashMap<String, String>>,
) -> Result<Redirect> {
    let form_token = input.remove(CSRF_FORM_FIELD);
    csrf::verify(&cookies, &headers, form_token.as_deref())?;

    let outcome = state.settings.submit_settings(&input).await?;

    #[cfg(feature = "metrics")]
    crate::metrics::record_submission(outcome.is_saved());

    Flash::from_outcome(&outcome).put(&cookies, &state.cookie_key, state.secure_cookies());
    Ok(Redirect::to(SETTINGS_PATH))
}

/// GET /admin/login
async fn login_page(State(state): State<Arc<AppState>>) -> Html<String> {
    Html(state.view.render_login(None))
}

/// POST /admin/login
async fn login(
    State(state): State<Arc<AppState>>,
    cookies: Cookies,
    Form(form): Form<LoginForm>,
) -> Response {
    let expected = state.config.server.admin_token.as_deref();
    if token_matches(expected, &form.token) {
        set_session(
            &cookies,
            &state.cookie_key,
            &form.token,
            state.secure_cookies(),
        );
        info!("Admin login successful.");
        Redirect::to(SETTINGS_PATH).into_response()
    } else {
        warn!("Failed admin login attempt: Invalid token or no token configured.");
        (
            StatusCode::UNAUTHORIZED,
            Html(state.view.render_login(Some("Invalid admin token."))),
        )
            .into_response()
    }
}

/// POST /admin/logout
async fn logout(
    State(state): State<Arc<AppState>>,
    cookies: Cookies,
    headers: HeaderMap,
    Form(input): Form<HashMap<String, String>>,
) -> Result<Redirect> {
    csrf::verify(
        &cookies,
        &headers,
        input.get(CSRF_FORM_FIELD).map(String::as_str),
    )?;

    clear_session(&cookies, &state.cookie_key);
    info!("Admin logged out.");
    Ok(Redirect::to(LOGIN_PATH))
}
