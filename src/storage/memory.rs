// src/storage/memory.rs

use crate::error::Result;
use crate::storage::ConfigStore;
use async_trait::async_trait;
use std::collections::HashMap;
use tokio::sync::RwLock;
use tracing::trace;

/// In-memory implementation of configuration storage
#[derive(Debug, Default)]
pub struct InMemoryStore {
    values: RwLock<HashMap<String, String>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_values<I, K, V>(values: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            values: RwLock::new(
                values
                    .into_iter()
                    .map(|(k, v)| (k.into(), v.into()))
                    .collect(),
            ),
        }
    }

    /// Copy of every stored entry.
    pub async fn snapshot(&self) -> HashMap<String, String> {
        self.values.read().await.clone()
    }
}

#[async_trait]
impl ConfigStore for InMemoryStore {
    fn backend_name(&self) -> &'static str {
        "memory"
    }

    async fn get(&self, key: &str) -> Result<Option<String>> {
        trace!("InMemoryStore::get: waiting for read lock");
        let values = self.values.read().await;
        Ok(values.get(key).cloned())
    }

    async fn set(&self, key: &str, value: &str) -> Result<()> {
        trace!("InMemoryStore::set: waiting for write lock");
        let mut values = self.values.write().await;
        values.insert(key.to_string(), value.to_string());
        Ok(())
    }

    async fn set_many(&self, entries: &[(&str, &str)]) -> Result<()> {
        trace!("InMemoryStore::set_many: waiting for write lock");
        let mut values = self.values.write().await;
        for (key, value) in entries {
            values.insert((*key).to_string(), (*value).to_string());
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_missing_key_is_none() {
        let store = InMemoryStore::new();
        assert_eq!(store.get("app.name").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_set_overwrites() {
        let store = InMemoryStore::with_values([("app.name", "Old")]);
        store.set("app.name", "New").await.unwrap();
        assert_eq!(store.get("app.name").await.unwrap().as_deref(), Some("New"));
    }

    #[tokio::test]
    async fn test_set_many_writes_every_entry() {
        let store = InMemoryStore::new();
        store
            .set_many(&[("mail.driver", "smtp"), ("mail.port", "587")])
            .await
            .unwrap();

        let snapshot = store.snapshot().await;
        assert_eq!(snapshot.len(), 2);
        assert_eq!(snapshot["mail.driver"], "smtp");
        assert_eq!(snapshot["mail.port"], "587");
    }
}
