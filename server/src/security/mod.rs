pub mod client_key;
pub mod middleware;
pub mod moderation;
pub mod rate_limiter;

pub use client_key::ClientKeyHasher;
pub use moderation::{ModerationEngine, RejectionReason, Verdict};
pub use rate_limiter::{RateLimitDecision, RateLimiter};
