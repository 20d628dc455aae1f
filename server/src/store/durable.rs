use anyhow::{Context, Result};
use async_trait::async_trait;

use super::{MessageStore, StorageBackend, StoreError};
use crate::models::{Emoji, Message, MessageView, MAX_TEXT_CHARS, MIN_TEXT_CHARS, RECENT_WINDOW};
use crate::redis_client::RedisClient;

const MESSAGES_KEY: &str = "messages";
const SEQUENCE_KEY: &str = "messages:seq";
const MESSAGE_KEY_PREFIX: &str = "message:";

fn message_key(id: &str) -> String {
    format!("{}{}", MESSAGE_KEY_PREFIX, id)
}

/// Data-model checks applied before anything reaches Redis
fn validate(text: &str) -> Result<(), StoreError> {
    let chars = text.chars().count();
    if chars < MIN_TEXT_CHARS {
        return Err(StoreError::Validation(format!(
            "text must be at least {} characters",
            MIN_TEXT_CHARS
        )));
    }
    if chars > MAX_TEXT_CHARS {
        return Err(StoreError::Validation(format!(
            "text must be at most {} characters",
            MAX_TEXT_CHARS
        )));
    }
    Ok(())
}

/// Durable store backed by Redis.
///
/// Each message is a JSON document under `message:{id}`; the `messages`
/// sorted set indexes ids by a sequence number drawn from `messages:seq`,
/// so messages accepted within the same millisecond still list in
/// acceptance order. Nothing expires, but listings only ever read the
/// newest [`RECENT_WINDOW`] entries.
#[derive(Clone)]
pub struct RedisMessageStore {
    redis: RedisClient,
}

impl RedisMessageStore {
    pub fn new(redis: RedisClient) -> Self {
        Self { redis }
    }

    /// Connect and verify the server answers PING
    pub async fn connect(redis_url: &str) -> Result<Self> {
        let redis = RedisClient::new(redis_url).await?;
        let alive = redis.ping().await.context("Redis PING failed")?;
        if !alive {
            anyhow::bail!("Redis answered PING with an unexpected reply");
        }
        Ok(Self::new(redis))
    }
}

#[async_trait]
impl MessageStore for RedisMessageStore {
    async fn insert(
        &self,
        text: String,
        emoji: Emoji,
        client_hash: String,
    ) -> Result<Message, StoreError> {
        validate(&text)?;

        let seq = self
            .redis
            .incr(SEQUENCE_KEY)
            .await
            .context("Failed to allocate message sequence number")?;

        let message = Message::new(text, emoji, client_hash);
        let json = serde_json::to_string(&message).context("Failed to encode message")?;

        self.redis
            .set_and_index(&message_key(&message.id), &json, MESSAGES_KEY, &message.id, seq as f64)
            .await
            .context("Failed to write message to Redis")?;

        Ok(message)
    }

    async fn list_recent(&self, limit: usize) -> Result<Vec<MessageView>, StoreError> {
        let limit = limit.min(RECENT_WINDOW);
        if limit == 0 {
            return Ok(Vec::new());
        }

        let ids = self
            .redis
            .zrevrange(MESSAGES_KEY, 0, limit as isize - 1)
            .await
            .context("Failed to read message index")?;

        let keys: Vec<String> = ids.iter().map(|id| message_key(id)).collect();
        let documents = self
            .redis
            .mget(&keys)
            .await
            .context("Failed to read messages")?;

        let messages = documents
            .into_iter()
            .zip(ids)
            .filter_map(|(doc, id)| match doc {
                Some(json) => match serde_json::from_str::<Message>(&json) {
                    Ok(message) => Some(message.view()),
                    Err(e) => {
                        tracing::warn!(message_id = %id, error = %e, "skipping unreadable message");
                        None
                    }
                },
                None => {
                    tracing::debug!(message_id = %id, "indexed message has no document");
                    None
                }
            })
            .collect();

        Ok(messages)
    }

    fn backend(&self) -> StorageBackend {
        StorageBackend::Redis
    }
}
