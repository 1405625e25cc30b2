// src/bootstrap.rs

//! Startup steps that prepare the configuration store before serving.

use crate::config::{StoreBackend, StoreConfig};
use crate::error::{AppError, Result};
use crate::settings::SettingsField;
use crate::storage::{ConfigStore, FileStore, InMemoryStore};
use rand::{thread_rng, Rng};
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::{info, warn};

/// Open the backend selected in `store`.
pub async fn open_store(store: &StoreConfig) -> Result<Arc<dyn ConfigStore>> {
    match store.backend {
        StoreBackend::Memory => {
            warn!("Using in-memory settings store, changes are lost on restart");
            Ok(Arc::new(InMemoryStore::new()))
        }
        StoreBackend::File => {
            let path = store.path.as_ref().ok_or_else(|| {
                AppError::config_validation("store.path is required", Some("store.path"))
            })?;
            Ok(Arc::new(FileStore::open(path.clone()).await?))
        }
        #[cfg(feature = "redis")]
        StoreBackend::Redis => {
            let url = store.redis_url.as_deref().ok_or_else(|| {
                AppError::config_validation("store.redis_url is required", Some("store.redis_url"))
            })?;
            Ok(Arc::new(
                crate::storage::RedisStore::connect(url, store.key_prefix.clone()).await?,
            ))
        }
        #[cfg(not(feature = "redis"))]
        StoreBackend::Redis => Err(AppError::config_validation(
            "this build does not include the redis backend",
            Some("store.backend"),
        )),
    }
}

/// Write each default whose key is missing or empty in the store. Returns
/// the number of keys written.
pub async fn seed_defaults(
    store: &dyn ConfigStore,
    defaults: &BTreeMap<String, String>,
) -> Result<usize> {
    let mut pending = Vec::new();
    for (key, value) in defaults {
        let current = store.get(key).await?;
        if current.map_or(true, |v| v.is_empty()) {
            pending.push((key.as_str(), value.as_str()));
        }
    }

    if !pending.is_empty() {
        store.set_many(&pending).await?;
        info!(count = pending.len(), "Seeded default settings");
    }
    Ok(pending.len())
}

/// 32 lowercase hex characters from 16 random bytes.
pub fn generate_cron_token() -> String {
    let mut bytes = [0u8; 16];
    thread_rng().fill(&mut bytes);
    hex::encode(bytes)
}

/// Make sure the read-only cron token exists. Returns the token in effect.
pub async fn ensure_cron_token(store: &dyn ConfigStore) -> Result<String> {
    let key = SettingsField::CronToken.store_key();
    match store.get(key).await? {
        Some(token) if !token.is_empty() => Ok(token),
        _ => {
            let token = generate_cron_token();
            store.set(key, &token).await?;
            info!("Generated a new cron token");
            Ok(token)
        }
    }
}
