//! Message persistence.
//!
//! Two interchangeable backends sit behind [`MessageStore`]: Redis when it is
//! reachable at startup, otherwise an in-memory ring of recent messages. The
//! choice is made once by [`connect`] and never revisited.

mod durable;
mod memory;

pub use durable::RedisMessageStore;
pub use memory::InMemoryMessageStore;

use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;

use crate::models::{Emoji, Message, MessageView};

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// The message violates the data model
    #[error("invalid message data: {0}")]
    Validation(String),
    /// The backend could not complete the operation
    #[error("storage backend error: {0:#}")]
    Backend(#[from] anyhow::Error),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageBackend {
    Redis,
    Memory,
}

impl StorageBackend {
    pub fn as_str(&self) -> &'static str {
        match self {
            StorageBackend::Redis => "redis",
            StorageBackend::Memory => "memory",
        }
    }
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait MessageStore: Send + Sync {
    /// Persist a new message; the store assigns its id and timestamp
    async fn insert(
        &self,
        text: String,
        emoji: Emoji,
        client_hash: String,
    ) -> Result<Message, StoreError>;

    /// Up to `limit` messages (capped at the recent window), newest first
    async fn list_recent(&self, limit: usize) -> Result<Vec<MessageView>, StoreError>;

    fn backend(&self) -> StorageBackend;
}

/// Pick the backend for this process: Redis if it answers within
/// `connect_timeout`, otherwise the in-memory fallback.
pub async fn connect(redis_url: &str, connect_timeout: Duration) -> Arc<dyn MessageStore> {
    match tokio::time::timeout(connect_timeout, RedisMessageStore::connect(redis_url)).await {
        Ok(Ok(store)) => {
            tracing::info!("connected to Redis message store");
            Arc::new(store)
        }
        Ok(Err(e)) => {
            tracing::warn!(
                error = %format!("{:#}", e),
                "Redis unavailable, using in-memory storage (data will be lost on restart)"
            );
            Arc::new(InMemoryMessageStore::new())
        }
        Err(_) => {
            tracing::warn!(
                timeout_secs = connect_timeout.as_secs(),
                "Redis connection timed out, using in-memory storage (data will be lost on restart)"
            );
            Arc::new(InMemoryMessageStore::new())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_unreachable_redis_falls_back_to_memory() {
        let store = connect("not-a-redis-url", Duration::from_secs(1)).await;
        assert_eq!(store.backend(), StorageBackend::Memory);
    }

    #[test]
    fn test_backend_names() {
        assert_eq!(StorageBackend::Redis.as_str(), "redis");
        assert_eq!(StorageBackend::Memory.as_str(), "memory");
    }
}
