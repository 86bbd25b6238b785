use dashmap::DashMap;
use std::sync::Arc;
use tokio::time::{Duration, Instant};

use crate::core::config::RateLimitConfig;

/// Fixed-window rate limiter keyed by client.
///
/// Each client gets its own window that starts with its first request and lasts
/// `config.window`. Inside a window at most `config.max_requests` requests are
/// admitted; the rest are rejected until the window rolls over.
#[derive(Clone)]
pub struct RateLimiter {
    /// Per-client window state
    windows: Arc<DashMap<String, Window>>,
    config: RateLimitConfig,
}

#[derive(Debug, Clone, Copy)]
struct Window {
    started: Instant,
    hits: u32,
}

/// Outcome of [`RateLimiter::check`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RateLimitDecision {
    /// Request admitted
    Allowed {
        limit: u32,
        remaining: u32,
        /// Time until the client's window resets
        reset_after: Duration,
    },
    /// Request rejected
    Limited { limit: u32, retry_after: Duration },
}

impl RateLimitDecision {
    pub fn is_allowed(&self) -> bool {
        matches!(self, RateLimitDecision::Allowed { .. })
    }
}

impl RateLimiter {
    /// Creates a rate limiter with the given window and quota.
    ///
    /// # Example
    ///
    /// ```no_run
    /// use chipmunk::core::config::RateLimitConfig;
    /// use chipmunk::core::rate_limiter::RateLimiter;
    ///
    /// let limiter = RateLimiter::new(RateLimitConfig::default());
    /// ```
    pub fn new(config: RateLimitConfig) -> Self {
        Self {
            windows: Arc::new(DashMap::new()),
            config,
        }
    }

    pub fn config(&self) -> RateLimitConfig {
        self.config
    }

    /// Records a request from `client` and decides whether it may proceed.
    pub fn check(&self, client: &str) -> RateLimitDecision {
        self.check_at(client, Instant::now())
    }

    fn check_at(&self, client: &str, now: Instant) -> RateLimitDecision {
        let limit = self.config.max_requests;
        let window_len = self.config.window;

        let mut entry = self
            .windows
            .entry(client.to_string())
            .or_insert(Window { started: now, hits: 0 });

        if now.duration_since(entry.started) >= window_len {
            *entry = Window { started: now, hits: 0 };
        }

        let reset_after = window_len.saturating_sub(now.duration_since(entry.started));

        if entry.hits >= limit {
            return RateLimitDecision::Limited {
                limit,
                retry_after: reset_after,
            };
        }

        entry.hits += 1;
        RateLimitDecision::Allowed {
            limit,
            remaining: limit - entry.hits,
            reset_after,
        }
    }

    /// Drops windows that have already expired.
    ///
    /// Called periodically by the HTTP server so idle clients don't accumulate.
    pub fn prune_expired(&self) {
        let now = Instant::now();
        let window_len = self.config.window;
        self.windows
            .retain(|_, window| now.duration_since(window.started) < window_len);
    }

    /// Number of clients with a live window
    pub fn tracked_clients(&self) -> usize {
        self.windows.len()
    }

    /// Forgets a client's window.
    pub fn reset(&self, client: &str) {
        self.windows.remove(client);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn limiter(max_requests: u32, window_ms: u64) -> RateLimiter {
        RateLimiter::new(RateLimitConfig {
            max_requests,
            window: Duration::from_millis(window_ms),
        })
    }

    #[test]
    fn test_within_limit() {
        let limiter = limiter(3, 60_000);
        let now = Instant::now();

        for expected_remaining in [2, 1, 0] {
            match limiter.check_at("10.0.0.1", now) {
                RateLimitDecision::Allowed { remaining, limit, .. } => {
                    assert_eq!(limit, 3);
                    assert_eq!(remaining, expected_remaining);
                }
                other => panic!("expected Allowed, got {:?}", other),
            }
        }
    }

    #[test]
    fn test_exceeds_limit() {
        let limiter = limiter(2, 60_000);
        let now = Instant::now();

        assert!(limiter.check_at("client", now).is_allowed());
        assert!(limiter.check_at("client", now).is_allowed());

        match limiter.check_at("client", now + Duration::from_secs(10)) {
            RateLimitDecision::Limited { retry_after, limit } => {
                assert_eq!(limit, 2);
                assert_eq!(retry_after, Duration::from_secs(50));
            }
            other => panic!("expected Limited, got {:?}", other),
        }
    }

    #[test]
    fn test_clients_are_independent() {
        let limiter = limiter(1, 60_000);
        let now = Instant::now();

        assert!(limiter.check_at("a", now).is_allowed());
        assert!(!limiter.check_at("a", now).is_allowed());
        assert!(limiter.check_at("b", now).is_allowed());
    }

    #[test]
    fn test_window_rolls_over() {
        let limiter = limiter(1, 1_000);
        let now = Instant::now();

        assert!(limiter.check_at("client", now).is_allowed());
        assert!(!limiter.check_at("client", now + Duration::from_millis(999)).is_allowed());
        assert!(limiter.check_at("client", now + Duration::from_millis(1_000)).is_allowed());
    }

    #[test]
    fn test_prune_expired_and_reset() {
        let limiter = limiter(5, 0);
        limiter.check("a");
        limiter.check("b");
        limiter.prune_expired();
        assert_eq!(limiter.tracked_clients(), 0);

        let limiter = self::limiter(1, 60_000);
        limiter.check("a");
        assert!(!limiter.check("a").is_allowed());
        limiter.reset("a");
        assert!(limiter.check("a").is_allowed());
    }
}
