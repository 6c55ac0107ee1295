use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;
use tracing::debug;

use crate::config::LimiterConfig;

struct ClientBucket {
    tokens: f64,
    last_refill: Instant,
    last_seen: Instant,
}

/// Per-client token bucket limiter keyed by caller address. Cheap enough
/// to sit in front of every request; a sweep task evicts idle entries so
/// the map does not grow with one slot per address ever seen.
#[derive(Clone)]
pub struct RateLimiter {
    enabled: bool,
    rate: f64,
    burst: f64,
    idle_eviction: Duration,
    clients: Arc<Mutex<HashMap<String, ClientBucket>>>,
}

impl RateLimiter {
    #[must_use]
    pub fn new(config: &LimiterConfig) -> Self {
        Self {
            enabled: config.enabled,
            rate: config.requests_per_second,
            burst: f64::from(config.burst),
            idle_eviction: Duration::from_secs(config.idle_eviction_seconds),
            clients: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    /// Returns false when the caller has exhausted its bucket.
    pub async fn allow(&self, key: &str) -> bool {
        if !self.enabled {
            return true;
        }

        let now = Instant::now();
        let mut clients = self.clients.lock().await;

        let bucket = clients.entry(key.to_string()).or_insert(ClientBucket {
            tokens: self.burst,
            last_refill: now,
            last_seen: now,
        });

        let elapsed = now.duration_since(bucket.last_refill).as_secs_f64();
        bucket.tokens = (bucket.tokens + elapsed * self.rate).min(self.burst);
        bucket.last_refill = now;
        bucket.last_seen = now;

        if bucket.tokens >= 1.0 {
            bucket.tokens -= 1.0;
            true
        } else {
            false
        }
    }

    /// Periodically drop buckets that have been idle past the eviction
    /// window. Runs until the process exits.
    pub fn spawn_sweeper(&self) -> tokio::task::JoinHandle<()> {
        let clients = self.clients.clone();
        let idle_eviction = self.idle_eviction;

        tokio::spawn(async move {
            let mut interval = tokio::time::interval(Duration::from_secs(60));
            loop {
                interval.tick().await;
                let now = Instant::now();
                let mut clients = clients.lock().await;
                let before = clients.len();
                clients.retain(|_, bucket| now.duration_since(bucket.last_seen) < idle_eviction);
                let evicted = before - clients.len();
                if evicted > 0 {
                    debug!("Rate limiter evicted {evicted} idle clients");
                }
            }
        })
    }

    #[cfg(test)]
    async fn client_count(&self) -> usize {
        self.clients.lock().await.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(enabled: bool, rps: f64, burst: u32) -> LimiterConfig {
        LimiterConfig {
            enabled,
            requests_per_second: rps,
            burst,
            idle_eviction_seconds: 180,
        }
    }

    #[tokio::test]
    async fn test_burst_then_deny() {
        let limiter = RateLimiter::new(&config(true, 0.001, 3));

        assert!(limiter.allow("10.0.0.1").await);
        assert!(limiter.allow("10.0.0.1").await);
        assert!(limiter.allow("10.0.0.1").await);
        assert!(!limiter.allow("10.0.0.1").await);

        // Other clients are unaffected
        assert!(limiter.allow("10.0.0.2").await);
    }

    #[tokio::test]
    async fn test_disabled_always_allows() {
        let limiter = RateLimiter::new(&config(false, 0.001, 1));

        for _ in 0..20 {
            assert!(limiter.allow("10.0.0.1").await);
        }
        assert_eq!(limiter.client_count().await, 0);
    }

    #[tokio::test]
    async fn test_refill_restores_capacity() {
        let limiter = RateLimiter::new(&config(true, 1000.0, 1));

        assert!(limiter.allow("c").await);
        assert!(!limiter.allow("c").await);

        tokio::time::sleep(Duration::from_millis(10)).await;
        assert!(limiter.allow("c").await);
    }
}
