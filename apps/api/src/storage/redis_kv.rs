use async_trait::async_trait;
use redis::aio::ConnectionManager;
use redis::AsyncCommands;
use tokio::sync::OnceCell;
use tracing::debug;

use super::{KvStore, StoreError};

/// Redis-backed key-value store. The connection manager is opened on first
/// use and shared by every request afterwards. It reconnects on its own
/// after the server drops the connection.
pub struct RedisKv {
    client: redis::Client,
    conn: OnceCell<ConnectionManager>,
}

impl RedisKv {
    pub fn new(client: redis::Client) -> Self {
        Self {
            client,
            conn: OnceCell::new(),
        }
    }

    /// A failed first connect is not cached; the next call tries again.
    pub(crate) async fn connection(&self) -> Result<ConnectionManager, StoreError> {
        let conn = self
            .conn
            .get_or_try_init(|| async {
                debug!("Opening Redis connection manager");
                ConnectionManager::new(self.client.clone()).await
            })
            .await?;
        Ok(conn.clone())
    }

    /// True when `key` exists. Used by the session resolver.
    pub async fn exists(&self, key: &str) -> Result<bool, StoreError> {
        let mut conn = self.connection().await?;
        let found: bool = conn.exists(key).await?;
        Ok(found)
    }
}

#[async_trait]
impl KvStore for RedisKv {
    async fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        let mut conn = self.connection().await?;
        let value: Option<String> = conn.get(key).await?;
        debug!(key, found = value.is_some(), "Redis GET");
        Ok(value)
    }
}
