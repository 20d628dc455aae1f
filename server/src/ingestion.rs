use governor::clock::{Clock, DefaultClock};
use std::sync::Arc;
use std::time::Duration;

use crate::broadcast::BroadcastGateway;
use crate::telemetry::MetricsTracker;
use crate::models::{Emoji, MessageView, MAX_TEXT_CHARS};
use crate::security::{ModerationEngine, RateLimitDecision, RateLimiter, RejectionReason, Verdict};
use crate::store::{MessageStore, StoreError};

#[derive(Debug, thiserror::Error)]
pub enum SubmitError {
    #[error("Please wait before posting again.")]
    RateLimited { retry_after: Duration },
    #[error("{0}")]
    ContentRejected(RejectionReason),
    #[error("Invalid message data: {0}")]
    InvalidData(String),
    #[error("Failed to save message")]
    StorageFailure(#[source] anyhow::Error),
}

impl From<StoreError> for SubmitError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Validation(reason) => SubmitError::InvalidData(reason),
            StoreError::Backend(source) => SubmitError::StorageFailure(source),
        }
    }
}

/// Runs a submission through rate limiting, moderation, storage and broadcast
#[derive(Clone)]
pub struct IngestionService<C: Clock = DefaultClock> {
    rate_limiter: RateLimiter<C>,
    moderation: ModerationEngine,
    store: Arc<dyn MessageStore>,
    gateway: BroadcastGateway,
    metrics: MetricsTracker,
}

impl<C: Clock> IngestionService<C> {
    pub fn new(
        rate_limiter: RateLimiter<C>,
        moderation: ModerationEngine,
        store: Arc<dyn MessageStore>,
        gateway: BroadcastGateway,
        metrics: MetricsTracker,
    ) -> Self {
        Self {
            rate_limiter,
            moderation,
            store,
            gateway,
            metrics,
        }
    }

    pub async fn submit(
        &self,
        client_id: &str,
        text: &str,
        emoji: Option<&str>,
    ) -> Result<MessageView, SubmitError> {
        if let RateLimitDecision::Limited { retry_after } =
            self.rate_limiter.check_and_record(client_id)
        {
            self.metrics.rate_limited();
            return Err(SubmitError::RateLimited { retry_after });
        }

        if let Verdict::Rejected(reason) = self.moderation.classify(text) {
            tracing::info!(reason = reason.code(), "message rejected by moderation");
            self.metrics.message_rejected(reason.code());
            return Err(SubmitError::ContentRejected(reason));
        }

        let text = text.trim();
        if text.chars().count() > MAX_TEXT_CHARS {
            return Err(SubmitError::InvalidData(format!(
                "text must be at most {} characters",
                MAX_TEXT_CHARS
            )));
        }
        let emoji = Emoji::resolve(emoji);

        let message = self
            .store
            .insert(text.to_string(), emoji, client_id.to_string())
            .await?;
        let view = message.view();

        let delivered = self.gateway.publish(view.clone());
        self.metrics.message_accepted();
        tracing::info!(message_id = %view.id, subscribers = delivered, "message accepted");

        Ok(view)
    }

    pub async fn list_recent(&self, limit: usize) -> Result<Vec<MessageView>, StoreError> {
        self.store.list_recent(limit).await
    }

    pub fn gateway(&self) -> &BroadcastGateway {
        &self.gateway
    }

    pub fn store(&self) -> &Arc<dyn MessageStore> {
        &self.store
    }
}
