use governor::clock::{Clock, DefaultClock};
use governor::middleware::NoOpMiddleware;
use governor::state::keyed::DefaultKeyedStateStore;
use governor::state::{InMemoryState, NotKeyed};
use governor::Quota;
use std::num::NonZeroU32;
use std::sync::Arc;
use std::time::Duration;

/// Minimum spacing between two permitted submissions from one client
const COOLDOWN: Duration = Duration::from_secs(5);
/// Tracked-client count above which stale entries are swept
const SWEEP_THRESHOLD: usize = 1_000;
/// At most one sweep runs per interval, however busy the limiter is
const SWEEP_INTERVAL: Duration = Duration::from_secs(60);

type KeyedLimiter<C> = governor::RateLimiter<
    String,
    DefaultKeyedStateStore<String>,
    C,
    NoOpMiddleware<<C as Clock>::Instant>,
>;
type SweepGate<C> =
    governor::RateLimiter<NotKeyed, InMemoryState, C, NoOpMiddleware<<C as Clock>::Instant>>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RateLimitDecision {
    Allowed,
    /// Denied; the client may retry once `retry_after` has elapsed
    Limited { retry_after: Duration },
}

#[cfg(test)]
impl RateLimitDecision {
    pub fn is_allowed(&self) -> bool {
        matches!(self, RateLimitDecision::Allowed)
    }
}

/// One permit per `period` with no burst
fn one_per(period: Duration) -> Quota {
    // with_period only rejects a zero period
    Quota::with_period(period)
        .unwrap_or_else(|| Quota::per_second(NonZeroU32::MIN))
        .allow_burst(NonZeroU32::MIN)
}

/// Per-client cooldown tracker
///
/// Backed by a keyed GCRA limiter allowing one submission per cooldown
/// window. A denied attempt leaves the client's state untouched. Cloning
/// shares the underlying state.
#[derive(Clone)]
pub struct RateLimiter<C: Clock = DefaultClock> {
    limiter: Arc<KeyedLimiter<C>>,
    sweep_gate: Arc<SweepGate<C>>,
    clock: C,
}

impl RateLimiter {
    pub fn new() -> Self {
        Self::with_clock(DefaultClock::default())
    }
}

impl<C: Clock> RateLimiter<C> {
    pub fn with_clock(clock: C) -> Self {
        Self {
            limiter: Arc::new(governor::RateLimiter::new(
                one_per(COOLDOWN),
                DefaultKeyedStateStore::default(),
                &clock,
            )),
            sweep_gate: Arc::new(governor::RateLimiter::new(
                one_per(SWEEP_INTERVAL),
                InMemoryState::default(),
                &clock,
            )),
            clock,
        }
    }

    /// Check whether `client_id` may submit now, recording the attempt if so
    pub fn check_and_record(&self, client_id: &str) -> RateLimitDecision {
        // check_key tests and updates the client's state in one step under
        // its shard lock, so two concurrent requests from the same client
        // can't both pass.
        match self.limiter.check_key(&client_id.to_string()) {
            Ok(_) => {
                self.sweep_if_crowded();
                RateLimitDecision::Allowed
            }
            Err(not_until) => RateLimitDecision::Limited {
                retry_after: not_until.wait_time_from(self.clock.now()),
            },
        }
    }

    /// Drop clients whose cooldown has long expired once too many are tracked
    fn sweep_if_crowded(&self) {
        if self.limiter.len() <= SWEEP_THRESHOLD || self.sweep_gate.check().is_err() {
            return;
        }

        let before = self.limiter.len();
        self.limiter.retain_recent();
        self.limiter.shrink_to_fit();
        tracing::debug!(
            removed = before.saturating_sub(self.limiter.len()),
            remaining = self.limiter.len(),
            "swept stale rate-limit entries"
        );
    }

    /// Number of clients currently tracked
    #[cfg(test)]
    pub fn tracked_clients(&self) -> usize {
        self.limiter.len()
    }
}

impl Default for RateLimiter {
    fn default() -> Self {
        Self::new()
    }
}
