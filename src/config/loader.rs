// src/config/loader.rs

use crate::config::{AppConfig, ConfigValidator, StoreBackend};
use crate::error::{AppError, Result};
use std::path::Path;
use tracing::{debug, info, warn};

/// Load configuration from file or defaults, then apply environment overrides
/// and validate the result.
pub fn load_config(config_path: &Path) -> Result<AppConfig> {
    let mut config = if config_path.exists() {
        info!("Loading configuration from file: {}", config_path.display());
        load_from_file(config_path)?
    } else {
        info!("Configuration file not found, using defaults");
        AppConfig::default()
    };

    override_with_env(&mut config);

    ConfigValidator::validate(&config)?;

    debug!("Configuration loaded and validated successfully");
    Ok(config)
}

fn load_from_file(config_path: &Path) -> Result<AppConfig> {
    let content = std::fs::read_to_string(config_path).map_err(|_| AppError::ConfigNotFound {
        path: config_path.display().to_string(),
    })?;

    serde_yaml::from_str(&content).map_err(|e| AppError::ConfigParse {
        message: format!("Failed to parse config file: {e}"),
        line: e.location().map(|loc| loc.line()),
    })
}

fn override_with_env(config: &mut AppConfig) {
    if let Ok(port_str) = std::env::var("SETTINGS_ADMIN_PORT") {
        if let Ok(port) = port_str.parse::<u16>() {
            info!("Overriding server port from environment variable: {}", port);
            config.server.port = port;
        } else {
            warn!("Invalid SETTINGS_ADMIN_PORT environment variable: {}", port_str);
        }
    }

    if let Ok(token) = std::env::var("SETTINGS_ADMIN_TOKEN") {
        info!("Overriding admin token from environment variable");
        config.server.admin_token = Some(token);
    }

    if let Ok(backend_str) = std::env::var("SETTINGS_ADMIN_STORE") {
        match backend_str.parse::<StoreBackend>() {
            Ok(backend) => {
                info!("Overriding store backend from environment variable: {}", backend);
                config.store.backend = backend;
            }
            Err(e) => warn!("Invalid SETTINGS_ADMIN_STORE environment variable: {}", e),
        }
    }

    if let Ok(redis_url) = std::env::var("REDIS_URL") {
        info!("Overriding Redis URL from environment variable");
        config.store.redis_url = Some(redis_url);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn clear_env() {
        for var in [
            "SETTINGS_ADMIN_PORT",
            "SETTINGS_ADMIN_TOKEN",
            "SETTINGS_ADMIN_STORE",
            "REDIS_URL",
        ] {
            std::env::remove_var(var);
        }
    }

    #[test]
    #[serial]
    fn test_missing_file_yields_defaults() {
        clear_env();
        let config = load_config(Path::new("/definitely/not/here/config.yaml")).unwrap();
        assert_eq!(config, AppConfig::default());
    }

    #[test]
    #[serial]
    fn test_load_from_file() {
        clear_env();
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "server:\n  port: 9100\n  admin_token: abc\ndefaults:\n  app.name: Test").unwrap();

        let config = load_config(file.path()).unwrap();
        assert_eq!(config.server.port, 9100);
        assert_eq!(config.server.admin_token.as_deref(), Some("abc"));
        assert_eq!(config.defaults.get("app.name").map(String::as_str), Some("Test"));
    }

    #[test]
    #[serial]
    fn test_parse_error_reports_line() {
        clear_env();
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "server:\n  port: [not a port").unwrap();

        let err = load_config(file.path()).unwrap_err();
        assert!(matches!(err, AppError::ConfigParse { .. }), "got {err:?}");
    }

    #[test]
    #[serial]
    fn test_env_overrides() {
        clear_env();
        std::env::set_var("SETTINGS_ADMIN_PORT", "7000");
        std::env::set_var("SETTINGS_ADMIN_TOKEN", "from-env");
        std::env::set_var("SETTINGS_ADMIN_STORE", "memory");

        let config = load_config(Path::new("/definitely/not/here/config.yaml")).unwrap();
        clear_env();

        assert_eq!(config.server.port, 7000);
        assert_eq!(config.server.admin_token.as_deref(), Some("from-env"));
        assert_eq!(config.store.backend, StoreBackend::Memory);
    }

    #[test]
    #[serial]
    fn test_invalid_env_port_is_ignored() {
        clear_env();
        std::env::set_var("SETTINGS_ADMIN_PORT", "not-a-port");

        let config = load_config(Path::new("/definitely/not/here/config.yaml")).unwrap();
        clear_env();

        assert_eq!(config.server.port, 8080);
    }
}
