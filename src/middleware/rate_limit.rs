//! Fixed-window rate limiter.
//!
//! Remembers the last accepted invocation per (command, user). A call made
//! before `window` has elapsed since then is rejected and does not move the
//! window. State lives in memory only and resets on restart. Expired entries
//! are swept every [`SWEEP_EVERY`] checks.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use tracing::debug;

/// Checks between two sweeps of expired entries.
pub const SWEEP_EVERY: u64 = 1024;

/// Outcome of a rate-limit check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RateDecision {
    Allowed,
    /// Rejected. `remaining` is always greater than zero.
    Limited { remaining: Duration },
}

impl RateDecision {
    /// Remaining wait rounded up to whole seconds (never 0 when limited).
    pub fn wait_secs(&self) -> Option<u64> {
        match self {
            Self::Allowed => None,
            Self::Limited { remaining } => {
                let secs = remaining.as_secs() + u64::from(remaining.subsec_nanos() > 0);
                Some(secs.max(1))
            }
        }
    }
}

/// Per-user, per-command rate limiter.
#[derive(Clone)]
pub struct RateLimiter {
    window: Duration,
    last_call: Arc<DashMap<(&'static str, u64), Instant>>,
    checks: Arc<AtomicU64>,
}

impl RateLimiter {
    pub fn new(window: Duration) -> Self {
        Self {
            window,
            last_call: Arc::new(DashMap::new()),
            checks: Arc::new(AtomicU64::new(0)),
        }
    }

    pub fn window(&self) -> Duration {
        self.window
    }

    /// Check and, if allowed, record a call made now.
    pub fn check(&self, scope: &'static str, user_id: u64) -> RateDecision {
        self.check_at(scope, user_id, Instant::now())
    }

    /// Check and, if allowed, record a call made at `now`.
    pub fn check_at(&self, scope: &'static str, user_id: u64, now: Instant) -> RateDecision {
        if self.checks.fetch_add(1, Ordering::Relaxed) % SWEEP_EVERY == SWEEP_EVERY - 1 {
            self.evict_expired(now);
        }

        // The entry holds the shard lock, so check-then-set is atomic per key.
        match self.last_call.entry((scope, user_id)) {
            Entry::Vacant(slot) => {
                slot.insert(now);
                RateDecision::Allowed
            }
            Entry::Occupied(mut slot) => {
                let elapsed = now.saturating_duration_since(*slot.get());
                if elapsed < self.window {
                    RateDecision::Limited {
                        remaining: self.window - elapsed,
                    }
                } else {
                    slot.insert(now);
                    RateDecision::Allowed
                }
            }
        }
    }

    /// Drop entries whose window has passed. Returns how many were removed.
    pub fn evict_expired(&self, now: Instant) -> usize {
        let before = self.last_call.len();
        self.last_call
            .retain(|_, last| now.saturating_duration_since(*last) < self.window);
        let removed = before.saturating_sub(self.last_call.len());
        if removed > 0 {
            debug!("Evicted {} expired rate-limit entries", removed);
        }
        removed
    }
}
