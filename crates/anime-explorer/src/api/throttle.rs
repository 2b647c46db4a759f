//! Throttled fetch gate.
//!
//! Enforces a minimum spacing between outbound calls to the API host. Calls to
//! any other host pass straight through.

use super::error::ApiResult;
use super::transport::{RawResponse, Transport};
use async_trait::async_trait;
use reqwest::Url;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::{sleep_until, Instant};
use tracing::debug;

/// Minimum spacing the Jikan API tolerates between two requests
pub const DEFAULT_MIN_INTERVAL: Duration = Duration::from_millis(1000);

/// Transport decorator that spaces out calls to a single host
#[derive(Debug)]
pub struct ThrottledGate<T> {
    /// Wrapped transport
    inner: T,
    /// Host the spacing applies to
    host: String,
    /// Minimum time between two issued calls
    min_interval: Duration,
    /// When the most recent call was (or will be) issued
    last_call: Mutex<Option<Instant>>,
    /// Number of throttled calls issued so far
    calls_issued: AtomicU64,
}

impl<T: Transport> ThrottledGate<T> {
    /// Create a gate for the host of `api_base`
    pub fn new(inner: T, api_base: &Url, min_interval: Duration) -> Self {
        Self {
            inner,
            host: api_base.host_str().unwrap_or_default().to_string(),
            min_interval,
            last_call: Mutex::new(None),
            calls_issued: AtomicU64::new(0),
        }
    }

    /// Whether a request to `url` is subject to the spacing rule
    pub fn applies_to(&self, url: &Url) -> bool {
        !self.host.is_empty() && url.host_str() == Some(self.host.as_str())
    }

    /// Number of calls to the API host issued through this gate
    pub fn calls_issued(&self) -> u64 {
        self.calls_issued.load(Ordering::Relaxed)
    }

    pub fn min_interval(&self) -> Duration {
        self.min_interval
    }

    /// Wait until the next call to the API host may be issued
    ///
    /// The slot is claimed while the lock is held, so concurrent callers queue
    /// up one interval apart instead of all observing the same timestamp.
    pub async fn acquire(&self) {
        let slot = self.reserve_slot().await;
        let wait = slot.saturating_duration_since(Instant::now());

        if !wait.is_zero() {
            debug!(
                wait_ms = wait.as_millis() as u64,
                "Throttle: waiting before API call"
            );
            sleep_until(slot).await;
        }

        self.calls_issued.fetch_add(1, Ordering::Relaxed);
    }

    async fn reserve_slot(&self) -> Instant {
        let mut last_call = self.last_call.lock().await;
        let now = Instant::now();

        let slot = match *last_call {
            Some(previous) => (previous + self.min_interval).max(now),
            None => now,
        };

        *last_call = Some(slot);
        slot
    }
}

#[async_trait]
impl<T: Transport> Transport for ThrottledGate<T> {
    async fn get(&self, url: &Url) -> ApiResult<RawResponse> {
        if self.applies_to(url) {
            self.acquire().await;
        } else {
            debug!(url = %url, "Throttle: foreign host, passing through");
        }

        self.inner.get(url).await
    }
}
