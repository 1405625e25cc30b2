// src/config/validation.rs

use crate::config::{AppConfig, StoreBackend};
use crate::error::{AppError, Result};
use tracing::{debug, warn};
use url::Url;

/// Minimum length accepted for `server.cookie_secret`.
pub const MIN_COOKIE_SECRET_LEN: usize = 64;

pub struct ConfigValidator;

impl ConfigValidator {
    pub fn validate(config: &AppConfig) -> Result<()> {
        debug!("Starting configuration validation");

        if let Err(e) = Self::validate_server_config(config) {
            warn!("Server config validation failed: {}", e);
            return Err(e);
        }
        debug!("Server config validation passed");

        if let Err(e) = Self::validate_store_config(config) {
            warn!("Store config validation failed: {}", e);
            return Err(e);
        }
        debug!("Store config validation passed");

        if config.server.admin_token.as_deref().map_or(true, str::is_empty) {
            warn!("No admin token configured; every admin page will answer 401");
        }

        debug!("Configuration validation completed successfully");
        Ok(())
    }

    fn validate_server_config(config: &AppConfig) -> Result<()> {
        if config.server.port == 0 {
            return Err(AppError::config_validation(
                "Server port cannot be 0",
                Some("server.port"),
            ));
        }

        if config.server.max_request_bytes == 0 {
            return Err(AppError::config_validation(
                "Maximum request size cannot be 0",
                Some("server.max_request_bytes"),
            ));
        }

        if config.server.login_attempts_per_minute == 0 {
            return Err(AppError::config_validation(
                "Login attempts per minute cannot be 0",
                Some("server.login_attempts_per_minute"),
            ));
        }

        if let Some(secret) = &config.server.cookie_secret {
            if secret.len() < MIN_COOKIE_SECRET_LEN {
                return Err(AppError::config_validation(
                    format!(
                        "Cookie secret must be at least {MIN_COOKIE_SECRET_LEN} bytes, got {}",
                        secret.len()
                    ),
                    Some("server.cookie_secret"),
                ));
            }
        }

        Ok(())
    }

    fn validate_store_config(config: &AppConfig) -> Result<()> {
        match config.store.backend {
            StoreBackend::Memory => Ok(()),
            StoreBackend::File => match &config.store.path {
                Some(path) if !path.as_os_str().is_empty() => Ok(()),
                _ => Err(AppError::config_validation(
                    "The file store backend requires store.path",
                    Some("store.path"),
                )),
            },
            StoreBackend::Redis => {
                if !cfg!(feature = "redis") {
                    return Err(AppError::config_validation(
                        "The redis store backend is not compiled in (enable the `redis` feature)",
                        Some("store.backend"),
                    ));
                }
                let redis_url = config.store.redis_url.as_deref().ok_or_else(|| {
                    AppError::config_validation(
                        "The redis store backend requires store.redis_url",
                        Some("store.redis_url"),
                    )
                })?;
                Self::validate_url(redis_url, "store.redis_url")
            }
        }
    }

    fn validate_url(url_str: &str, field_name: &str) -> Result<()> {
        Url::parse(url_str).map_err(|e| {
            AppError::config_validation(
                format!("Invalid URL in {field_name}: {url_str} - {e}"),
                Some(field_name),
            )
        })?;
        Ok(())
    }
}
