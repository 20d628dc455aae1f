use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Arc;

/// Counters and gauges for the message pipeline and live connections
#[derive(Clone, Default)]
pub struct MetricsTracker {
    active_connections: Arc<AtomicI64>,
}

impl MetricsTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Install the global Prometheus recorder. Call once at startup.
    pub fn install_exporter() -> anyhow::Result<PrometheusHandle> {
        Ok(PrometheusBuilder::new().install_recorder()?)
    }

    pub fn increment_connections(&self) {
        let count = self.active_connections.fetch_add(1, Ordering::Relaxed) + 1;
        metrics::gauge!("active_websocket_connections").set(count as f64);
    }

    pub fn decrement_connections(&self) {
        let count = self.active_connections.fetch_sub(1, Ordering::Relaxed) - 1;
        metrics::gauge!("active_websocket_connections").set(count as f64);
    }

    pub fn active_connections(&self) -> i64 {
        self.active_connections.load(Ordering::Relaxed)
    }

    pub fn message_accepted(&self) {
        metrics::counter!("messages_accepted_total").increment(1);
    }

    pub fn message_rejected(&self, reason: &'static str) {
        metrics::counter!("messages_rejected_total", "reason" => reason).increment(1);
    }

    pub fn rate_limited(&self) {
        metrics::counter!("rate_limited_total").increment(1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_connection_gauge_tracks_count() {
        let metrics = MetricsTracker::new();
        metrics.increment_connections();
        metrics.increment_connections();
        metrics.decrement_connections();

        assert_eq!(metrics.active_connections(), 1);
        assert_eq!(metrics.clone().active_connections(), 1);
    }
}
