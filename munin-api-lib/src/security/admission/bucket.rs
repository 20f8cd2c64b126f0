use std::time::{Duration, Instant};

/// Token bucket state for one client identity.
///
/// Refill is lazy: tokens accrue from the wall-clock time elapsed since the
/// last refill, capped at capacity. `last_seen` is bookkeeping for eviction
/// only and is updated on every observed request, allowed or rejected.
#[derive(Debug)]
pub(crate) struct TokenBucket {
    tokens: f64,
    last_refill: Instant,
    last_seen: Instant,
}

impl TokenBucket {
    /// A new bucket starts full: a new client gets its whole burst.
    pub(crate) fn new(capacity: f64, now: Instant) -> Self {
        Self { tokens: capacity, last_refill: now, last_seen: now }
    }

    /// Refill from elapsed time, mark the client as seen, then consume one
    /// token if at least one is available.
    ///
    /// A rejected acquire consumes nothing; tokens stay within
    /// `[0, capacity]` either way.
    pub(crate) fn try_acquire(&mut self, capacity: f64, refill_per_second: f64, now: Instant) -> bool {
        let elapsed = now.saturating_duration_since(self.last_refill).as_secs_f64();
        self.tokens = (self.tokens + elapsed * refill_per_second).min(capacity);
        self.last_refill = now;
        self.last_seen = now;

        if self.tokens >= 1.0 {
            self.tokens -= 1.0;
            true
        } else {
            false
        }
    }

    /// Time since this client was last observed, for the eviction sweep.
    pub(crate) fn idle_for(&self, now: Instant) -> Duration {
        now.saturating_duration_since(self.last_seen)
    }

    #[cfg(test)]
    pub(crate) fn tokens(&self) -> f64 {
        self.tokens
    }
}
