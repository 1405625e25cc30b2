// src/lib.rs

pub mod bootstrap;
pub mod cli;
pub mod config;
pub mod error;
#[cfg(feature = "metrics")]
pub mod metrics;
pub mod middleware;
pub mod settings;
pub mod state;
pub mod storage;

use crate::settings::SettingsField;
use axum::{
    body::Body,
    extract::{DefaultBodyLimit, State},
    http::{header, HeaderValue, Request as AxumRequest, StatusCode},
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use serde_json::json;
use std::{
    path::{Path, PathBuf},
    sync::Arc,
    time::Instant,
};
use tower_http::set_header::SetResponseHeaderLayer;
use tracing::{error, info, info_span, Instrument};
use uuid::Uuid;

pub use config::AppConfig;
pub use error::{AppError, Result};
pub use state::AppState;

/// Env var naming the configuration file when no path is given.
pub const CONFIG_PATH_ENV: &str = "SETTINGS_ADMIN_CONFIG";

/// Builds the application router with every route and middleware.
pub fn create_router(state: Arc<AppState>) -> Router {
    let max_request_bytes = state.config.server.max_request_bytes;

    let router = Router::new()
        .route("/health", get(health_check))
        .merge(settings::admin_routes(state.clone()));

    #[cfg(feature = "metrics")]
    let router = router
        .route("/metrics", get(metrics::metrics_handler))
        .layer(axum::middleware::from_fn(metrics::metrics_middleware));

    router
        .layer(SetResponseHeaderLayer::overriding(
            header::X_FRAME_OPTIONS,
            HeaderValue::from_static("DENY"),
        ))
        .layer(SetResponseHeaderLayer::overriding(
            header::X_CONTENT_TYPE_OPTIONS,
            HeaderValue::from_static("nosniff"),
        ))
        .layer(DefaultBodyLimit::max(max_request_bytes))
        .layer(axum::middleware::from_fn_with_state(
            state.clone(),
            crate::middleware::request_size_limit_middleware,
        ))
        .layer(axum::middleware::from_fn(trace_requests))
        .with_state(state)
}

/// Liveness plus a read through the configuration store.
async fn health_check(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let store = state.settings.store();
    match store.get(SettingsField::SiteName.store_key()).await {
        Ok(_) => (
            StatusCode::OK,
            Json(json!({ "status": "ok", "store": store.backend_name() })),
        ),
        Err(e) => {
            error!(error = %e, "Health check failed to reach the settings store");
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(json!({ "status": "unavailable", "store": store.backend_name() })),
            )
        }
    }
}

/// Adds a request ID and a tracing span to every request.
async fn trace_requests(
    mut req: AxumRequest<Body>,
    next: axum::middleware::Next,
) -> impl IntoResponse {
    let request_id = Uuid::new_v4();
    let start_time = Instant::now();
    let method = req.method().clone();
    let path = req.uri().path().to_string();

    let span = info_span!(
        "request",
        request_id = %request_id,
        http.method = %method,
        url.path = %path,
    );

    req.extensions_mut().insert(request_id);

    async move {
        let mut response = next.run(req).await;
        let elapsed = start_time.elapsed();

        if let Ok(value) = HeaderValue::from_str(&request_id.to_string()) {
            response.headers_mut().insert("X-Request-ID", value);
        }

        info!(
            http.response.duration = ?elapsed,
            http.status_code = response.status().as_u16(),
            "Finished processing request"
        );

        response
    }
    .instrument(span)
    .await
}

/// Loads configuration, prepares the store and returns the router ready to
/// serve, together with the effective configuration.
pub async fn run(config_path_override: Option<PathBuf>) -> Result<(Router, AppConfig)> {
    info!("Starting settings admin...");

    let app_config = setup_configuration(config_path_override)?;
    let app_state = build_application_state(app_config.clone()).await?;

    #[cfg(feature = "metrics")]
    let app_state = app_state.with_metrics(metrics::install_recorder()?);

    Ok((create_router(Arc::new(app_state)), app_config))
}

/// Resolves the configuration path (argument, then env var, then
/// `config.yaml`), then loads and validates it.
pub fn setup_configuration(config_path_override: Option<PathBuf>) -> Result<AppConfig> {
    let config_path = config_path_override.unwrap_or_else(|| {
        std::env::var(CONFIG_PATH_ENV).map_or_else(|_| PathBuf::from("config.yaml"), PathBuf::from)
    });
    load_and_log(&config_path)
}

fn load_and_log(config_path: &Path) -> Result<AppConfig> {
    let config_path_display = config_path.display().to_string();
    if config_path.exists() {
        info!(config.path = %config_path_display, "Using configuration file");
    } else {
        info!(config.path = %config_path_display, "Optional configuration file not found. Using defaults and environment variables.");
    }

    let app_config = config::load_config(config_path).map_err(|e| {
        error!(
            config.path = %config_path_display,
            error = ?e,
            "Failed to load or validate configuration. Exiting."
        );
        e
    })?;

    info!(
        server.port = app_config.server.port,
        store.backend = %app_config.store.backend,
        config.defaults = app_config.defaults.len(),
        "Configuration loaded and validated successfully."
    );
    Ok(app_config)
}

/// Opens the store, seeds defaults, makes sure a cron token exists and wraps
/// everything in an [`AppState`].
pub async fn build_application_state(app_config: AppConfig) -> Result<AppState> {
    let store = bootstrap::open_store(&app_config.store).await?;
    bootstrap::seed_defaults(store.as_ref(), &app_config.defaults).await?;
    bootstrap::ensure_cron_token(store.as_ref()).await?;

    let app_state = AppState::new(app_config, store).map_err(|e| {
        error!(error = ?e, "Failed to initialize application state. Exiting.");
        e
    })?;
    info!("Application state initialized successfully.");
    Ok(app_state)
}
