use async_trait::async_trait;
use redis::{aio::ConnectionManager, AsyncCommands};

use super::KeyValueStore;
use crate::error::Result;

/// Key/value items in Redis.
#[derive(Clone)]
pub struct RedisKeyValueStore {
    conn: ConnectionManager,
}

impl RedisKeyValueStore {
    pub async fn connect(redis_url: &str) -> Result<Self> {
        let client = redis::Client::open(redis_url)?;
        let conn = ConnectionManager::new(client).await?;
        Ok(Self::new(conn))
    }

    pub fn new(conn: ConnectionManager) -> Self {
        Self { conn }
    }
}

#[async_trait]
impl KeyValueStore for RedisKeyValueStore {
    async fn get_item(&self, key: &str) -> Result<Option<String>> {
        let mut conn = self.conn.clone();
        let value: Option<String> = conn.get(key).await?;
        Ok(value)
    }

    async fn set_item(&self, key: &str, value: &str) -> Result<()> {
        let mut conn = self.conn.clone();
        let _: () = conn.set(key, value).await?;
        Ok(())
    }

    async fn remove_item(&self, key: &str) -> Result<()> {
        let mut conn = self.conn.clone();
        let _: () = conn.del(key).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn connect_returns_error_on_invalid_url() {
        assert!(RedisKeyValueStore::connect("not-a-url").await.is_err());
    }
}
