use anyhow::{Context, Result};
use redis::{aio::ConnectionManager, AsyncCommands, RedisError};

/// Redis client wrapper for the durable message backend
#[derive(Clone)]
pub struct RedisClient {
    manager: ConnectionManager,
}

impl RedisClient {
    /// Connect to Redis from a connection URL
    ///
    /// Supports plain (`redis://`) and TLS (`rediss://`) URLs. A URL without
    /// credentials is accepted but logged, since production deployments
    /// should always authenticate.
    pub async fn new(redis_url: &str) -> Result<Self> {
        if !redis_url.contains("://") {
            anyhow::bail!(
                "Invalid Redis URL format. Expected: redis://:password@host:port or rediss://:password@host:port"
            );
        }

        if !redis_url.contains('@') {
            tracing::warn!("Redis URL does not include a password");
        }

        let client =
            redis::Client::open(redis_url).context("Failed to create Redis client from URL")?;

        let manager = ConnectionManager::new(client)
            .await
            .context("Failed to create Redis connection manager - check REDIS_URL")?;

        Ok(Self { manager })
    }

    /// Store `value` under `value_key` and index `member` in the sorted set
    /// `index_key`, as one MULTI/EXEC transaction
    pub async fn set_and_index(
        &self,
        value_key: &str,
        value: &str,
        index_key: &str,
        member: &str,
        score: f64,
    ) -> Result<(), RedisError> {
        let mut conn = self.manager.clone();
        redis::pipe()
            .atomic()
            .set(value_key, value)
            .ignore()
            .zadd(index_key, member, score)
            .ignore()
            .query_async::<_, ()>(&mut conn)
            .await
    }

    /// Increment a counter, returning the new value
    pub async fn incr(&self, key: &str) -> Result<i64, RedisError> {
        let mut conn = self.manager.clone();
        conn.incr(key, 1).await
    }

    /// Members of a sorted set, highest score first
    pub async fn zrevrange(
        &self,
        key: &str,
        start: isize,
        stop: isize,
    ) -> Result<Vec<String>, RedisError> {
        let mut conn = self.manager.clone();
        conn.zrevrange(key, start, stop).await
    }

    /// Get multiple values by keys; missing keys come back as `None`
    pub async fn mget(&self, keys: &[String]) -> Result<Vec<Option<String>>, RedisError> {
        if keys.is_empty() {
            return Ok(Vec::new());
        }

        let mut conn = self.manager.clone();
        redis::cmd("MGET").arg(keys).query_async(&mut conn).await
    }

    /// Ping Redis to check if connection is alive
    pub async fn ping(&self) -> Result<bool, RedisError> {
        let mut conn = self.manager.clone();
        redis::cmd("PING")
            .query_async::<_, String>(&mut conn)
            .await
            .map(|resp| resp == "PONG")
    }
}
