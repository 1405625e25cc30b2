// src/storage/redis.rs

use crate::error::Result;
use crate::storage::ConfigStore;
use async_trait::async_trait;
use deadpool_redis::{Config as PoolConfig, Connection as RedisConnection, Pool, Runtime};
use redis::AsyncCommands;
use tracing::{info, trace};

/// Redis implementation of configuration storage.
///
/// Every setting lives in its own string key, `{prefix}{name}`. Batches are
/// sent as one MULTI/EXEC pipeline.
pub struct RedisStore {
    pool: Pool,
    key_prefix: String,
}

impl RedisStore {
    pub async fn connect(redis_url: &str, key_prefix: impl Into<String>) -> Result<Self> {
        let pool = PoolConfig::from_url(redis_url).create_pool(Some(Runtime::Tokio1))?;

        // Fail at startup rather than on the first request.
        let mut conn = pool.get().await?;
        let _: String = redis::cmd("PING").query_async(&mut conn).await?;
        info!("Connected to Redis settings store.");

        Ok(Self::with_pool(pool, key_prefix))
    }

    pub fn with_pool(pool: Pool, key_prefix: impl Into<String>) -> Self {
        Self {
            pool,
            key_prefix: key_prefix.into(),
        }
    }

    fn prefix_key(&self, key: &str) -> String {
        format!("{}{}", self.key_prefix, key)
    }

    async fn get_connection(&self) -> Result<RedisConnection> {
        self.pool.get().await.map_err(Into::into)
    }
}

#[async_trait]
impl ConfigStore for RedisStore {
    fn backend_name(&self) -> &'static str {
        "redis"
    }

    async fn get(&self, key: &str) -> Result<Option<String>> {
        trace!(key, "RedisStore::get");
        let mut conn = self.get_connection().await?;
        let value: Option<String> = conn.get(self.prefix_key(key)).await?;
        Ok(value)
    }

    async fn set(&self, key: &str, value: &str) -> Result<()> {
        trace!(key, "RedisStore::set");
        let mut conn = self.get_connection().await?;
        let _: () = conn.set(self.prefix_key(key), value).await?;
        Ok(())
    }

    async fn set_many(&self, entries: &[(&str, &str)]) -> Result<()> {
        trace!(entries = entries.len(), "RedisStore::set_many");
        let mut conn = self.get_connection().await?;
        let mut pipe = redis::pipe();
        pipe.atomic();
        for (key, value) in entries {
            pipe.set(self.prefix_key(key), *value).ignore();
        }
        let _: () = pipe.query_async(&mut conn).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prefix_key() {
        let pool = PoolConfig::from_url("redis://127.0.0.1:6379/")
            .create_pool(Some(Runtime::Tokio1))
            .unwrap();
        let store = RedisStore::with_pool(pool, "site:");
        assert_eq!(store.prefix_key("mail.from.address"), "site:mail.from.address");
    }
}
