// src/state.rs

use crate::config::AppConfig;
use crate::error::{AppError, Result};
use crate::middleware::LoginThrottle;
use crate::settings::{HtmlSettingsView, SettingsService, SettingsView};
use crate::storage::ConfigStore;
use std::sync::Arc;
use tower_cookies::Key;
use tracing::{info, warn};

#[cfg(feature = "metrics")]
use metrics_exporter_prometheus::PrometheusHandle;

/// Represents the shared application state that is accessible by all Axum handlers.
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub settings: SettingsService,
    pub view: Arc<dyn SettingsView>,
    /// Encrypts the session and flash cookies.
    pub cookie_key: Key,
    pub login_throttle: LoginThrottle,
    #[cfg(feature = "metrics")]
    pub metrics: Option<PrometheusHandle>,
}

impl std::fmt::Debug for AppState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppState")
            .field("settings", &self.settings)
            .field("login_throttle", &self.login_throttle)
            .finish_non_exhaustive()
    }
}

impl AppState {
    /// Creates a new `AppState` serving settings from `store` with the
    /// built-in HTML view.
    pub fn new(config: AppConfig, store: Arc<dyn ConfigStore>) -> Result<Self> {
        let cookie_key = cookie_key(config.server.cookie_secret.as_deref())?;
        let login_throttle = LoginThrottle::per_minute(config.server.login_attempts_per_minute);
        info!(store = store.backend_name(), "Creating shared AppState");

        Ok(Self {
            config: Arc::new(config),
            settings: SettingsService::new(store),
            view: Arc::new(HtmlSettingsView),
            cookie_key,
            login_throttle,
            #[cfg(feature = "metrics")]
            metrics: None,
        })
    }

    /// Replace the page renderer.
    pub fn with_view(mut self, view: Arc<dyn SettingsView>) -> Self {
        self.view = view;
        self
    }

    #[cfg(feature = "metrics")]
    pub fn with_metrics(mut self, handle: PrometheusHandle) -> Self {
        self.metrics = Some(handle);
        self
    }

    pub fn secure_cookies(&self) -> bool {
        self.config.server.secure_cookies
    }
}

fn cookie_key(secret: Option<&str>) -> Result<Key> {
    match secret {
        Some(secret) => Key::try_from(secret.as_bytes()).map_err(|e| {
            AppError::config_validation(
                format!("invalid cookie secret: {e}"),
                Some("server.cookie_secret"),
            )
        }),
        None => {
            warn!("No cookie secret configured, sessions will not survive a restart");
            Ok(Key::generate())
        }
    }
}
