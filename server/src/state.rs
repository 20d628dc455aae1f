use metrics_exporter_prometheus::PrometheusHandle;
use std::sync::Arc;

use crate::broadcast::BroadcastGateway;
use crate::config::Config;
use crate::ingestion::IngestionService;
use crate::telemetry::MetricsTracker;
use crate::security::{ClientKeyHasher, ModerationEngine, RateLimiter};
use crate::store::{self, MessageStore};

#[derive(Clone)]
pub struct AppState {
    pub ingestion: IngestionService,
    pub key_hasher: ClientKeyHasher,
    pub metrics: MetricsTracker,
    pub prometheus: Option<PrometheusHandle>,
}

impl AppState {
    /// Build the application state, choosing the storage backend once
    pub async fn new(config: &Config, prometheus: Option<PrometheusHandle>) -> Self {
        let store = store::connect(&config.redis_url, config.store_connect_timeout).await;
        Self::with_store(store, config.server_secret.clone(), prometheus)
    }

    pub fn with_store(
        store: Arc<dyn MessageStore>,
        server_secret: String,
        prometheus: Option<PrometheusHandle>,
    ) -> Self {
        let metrics = MetricsTracker::new();
        let ingestion = IngestionService::new(
            RateLimiter::new(),
            ModerationEngine::new(),
            store,
            BroadcastGateway::new(),
            metrics.clone(),
        );

        Self {
            ingestion,
            key_hasher: ClientKeyHasher::new(server_secret),
            metrics,
            prometheus,
        }
    }
}
