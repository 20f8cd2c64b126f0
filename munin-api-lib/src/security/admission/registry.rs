use ahash::AHashMap;
use std::net::{IpAddr, SocketAddr};
use std::sync::Mutex;
use std::time::{Duration, Instant};

use http::HeaderMap;
use tracing::{debug, warn};

use crate::config::{AdmissionConfig, AdmissionScope};
use crate::error::{ApiError, Result};
use crate::security::admission::bucket::TokenBucket;

/// Registry key when `scope = "global"`: every client shares one bucket.
const GLOBAL_IDENTITY: &str = "global";

/// Outcome of an admission check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Admission {
    /// Request may proceed to the handler.
    Allowed,
    /// Request exceeds the client's rate and should be rejected with 429.
    Rejected,
}

impl Admission {
    pub fn is_allowed(&self) -> bool {
        matches!(self, Admission::Allowed)
    }

    pub fn is_rejected(&self) -> bool {
        matches!(self, Admission::Rejected)
    }
}

/// Registry of per-client token buckets behind one exclusive lock.
///
/// Every lookup-or-create, refill, decide, consume, and evict runs as a
/// single critical section on the registry lock. The lock is released before
/// any handler work, so slow downstream handling never serializes unrelated
/// clients' admission checks.
pub struct AdmissionController {
    config: AdmissionConfig,
    buckets: Mutex<AHashMap<String, TokenBucket>>,
}

impl AdmissionController {
    pub fn new(config: AdmissionConfig) -> Self {
        Self { config, buckets: Mutex::new(AHashMap::new()) }
    }

    /// Check whether a request from `identity` is admitted right now.
    pub fn admit(&self, identity: &str) -> Admission {
        self.admit_at(identity, Instant::now())
    }

    /// Deterministic-time variant of [`admit`](Self::admit).
    ///
    /// `now` must be non-decreasing across calls for one identity; the
    /// registry lock already serializes concurrent callers.
    pub fn admit_at(&self, identity: &str, now: Instant) -> Admission {
        if !self.config.enabled {
            return Admission::Allowed;
        }

        let key = match self.config.scope {
            AdmissionScope::PerClient => identity,
            AdmissionScope::Global => GLOBAL_IDENTITY,
        };
        let capacity = f64::from(self.config.burst);

        let mut buckets = match self.buckets.lock() {
            Ok(guard) => guard,
            Err(_) => {
                warn!("admission registry lock poisoned, failing open");
                return Admission::Allowed;
            }
        };

        let bucket = buckets
            .entry(key.to_string())
            .or_insert_with(|| TokenBucket::new(capacity, now));

        if bucket.try_acquire(capacity, self.config.refill_per_second, now) {
            Admission::Allowed
        } else {
            Admission::Rejected
        }
    }

    /// Evict every bucket idle for longer than the configured window.
    pub fn sweep(&self) {
        self.sweep_at(Instant::now());
    }

    /// Deterministic-time variant of [`sweep`](Self::sweep).
    pub fn sweep_at(&self, now: Instant) {
        let idle_window = Duration::from_secs(self.config.idle_secs);

        let mut buckets = match self.buckets.lock() {
            Ok(guard) => guard,
            Err(_) => {
                warn!("admission registry lock poisoned, skipping sweep");
                return;
            }
        };

        let before = buckets.len();
        buckets.retain(|_, bucket| bucket.idle_for(now) <= idle_window);
        let evicted = before.saturating_sub(buckets.len());
        if evicted > 0 {
            debug!(evicted, remaining = buckets.len(), "evicted idle clients");
        }
    }

    /// Number of identities currently tracked in the registry.
    pub fn tracked_clients(&self) -> usize {
        self.buckets.lock().map(|buckets| buckets.len()).unwrap_or(0)
    }

    pub fn config(&self) -> &AdmissionConfig {
        &self.config
    }
}

/// Derive the rate-limit identity for a request.
///
/// The identity is the client's IP address: the first `X-Forwarded-For`
/// entry when the header is present, otherwise the peer address of the
/// connection (the port is never part of the identity). A header that does
/// not parse as an IP address is a server-side error, not a rejection.
pub fn client_identity(peer: SocketAddr, headers: &HeaderMap) -> Result<String> {
    if let Some(forwarded) = headers.get("x-forwarded-for") {
        let value = forwarded.to_str().map_err(|_| {
            ApiError::ClientIdentity("x-forwarded-for header is not valid UTF-8".to_string())
        })?;
        let first = value.split(',').next().unwrap_or(value).trim();
        let ip: IpAddr = first.parse().map_err(|_| {
            ApiError::ClientIdentity(format!("invalid x-forwarded-for address: {first}"))
        })?;
        return Ok(ip.to_string());
    }

    Ok(peer.ip().to_string())
}
