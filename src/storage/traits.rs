// src/storage/traits.rs

use crate::error::Result;
use async_trait::async_trait;

/// Flat, string-keyed configuration storage.
///
/// Keys are full dotted names such as `mail.from.address`. Implementations
/// guarantee per-key atomicity only; `set_many` is not a transaction unless a
/// backend says otherwise.
#[async_trait]
pub trait ConfigStore: Send + Sync {
    /// Short backend name for logs.
    fn backend_name(&self) -> &'static str;

    /// Get the value stored under `key`, if any.
    async fn get(&self, key: &str) -> Result<Option<String>>;

    /// Overwrite the value stored under `key`.
    async fn set(&self, key: &str, value: &str) -> Result<()>;

    /// Write a batch of values.
    async fn set_many(&self, entries: &[(&str, &str)]) -> Result<()> {
        for (key, value) in entries {
            self.set(key, value).await?;
        }
        Ok(())
    }
}
