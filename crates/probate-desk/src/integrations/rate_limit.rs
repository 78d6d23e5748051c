use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use axum::{
    extract::{Request, State},
    http::{header, HeaderMap, HeaderValue, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use chrono::{DateTime, Utc};
use serde_json::json;
use tracing::warn;

use crate::config::RateLimitConfig;

/// Outcome of a single limiter check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateDecision {
    pub allowed: bool,
    pub remaining: u32,
    /// Zero when allowed.
    pub retry_after: Duration,
}

impl RateDecision {
    fn allow(remaining: u32) -> Self {
        Self {
            allowed: true,
            remaining,
            retry_after: Duration::ZERO,
        }
    }

    fn deny(retry_after: Duration) -> Self {
        Self {
            allowed: false,
            remaining: 0,
            retry_after,
        }
    }
}

pub trait RateLimiter: Send + Sync {
    /// Records one request for `key` and reports whether it may proceed.
    fn check(&self, key: &str, now: DateTime<Utc>) -> RateDecision;
}

fn window_millis(window: Duration) -> i64 {
    i64::try_from(window.as_millis()).unwrap_or(i64::MAX).max(1)
}

/// Per-process sliding window. State is lost on restart.
#[derive(Debug)]
pub struct SlidingWindowLimiter {
    max_requests: u32,
    window_ms: i64,
    hits: Mutex<HashMap<String, VecDeque<i64>>>,
}

impl SlidingWindowLimiter {
    pub fn new(max_requests: u32, window: Duration) -> Self {
        Self {
            max_requests,
            window_ms: window_millis(window),
            hits: Mutex::new(HashMap::new()),
        }
    }

    pub fn from_config(config: &RateLimitConfig) -> Self {
        Self::new(config.max_requests, config.window)
    }

    /// Number of keys currently tracked.
    pub fn tracked_keys(&self) -> usize {
        self.hits
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }
}

impl RateLimiter for SlidingWindowLimiter {
    fn check(&self, key: &str, now: DateTime<Utc>) -> RateDecision {
        let now_ms = now.timestamp_millis();
        let cutoff = now_ms - self.window_ms;
        let mut hits = self.hits.lock().unwrap_or_else(PoisonError::into_inner);

        hits.retain(|_, stamps| stamps.back().is_some_and(|last| *last > cutoff));
        let stamps = hits.entry(key.to_string()).or_default();
        while stamps.front().is_some_and(|first| *first <= cutoff) {
            stamps.pop_front();
        }

        let used = u32::try_from(stamps.len()).unwrap_or(u32::MAX);
        if used >= self.max_requests {
            let oldest = stamps.front().copied().unwrap_or(now_ms);
            let wait_ms = (oldest + self.window_ms - now_ms).max(0);
            return RateDecision::deny(Duration::from_millis(wait_ms.unsigned_abs()));
        }

        stamps.push_back(now_ms);
        RateDecision::allow(self.max_requests - used - 1)
    }
}

#[derive(Debug, thiserror::Error)]
#[error("counter store unavailable: {0}")]
pub struct CounterStoreError(pub String);

/// Shared counter backend for multi-instance deployments.
pub trait CounterStore: Send + Sync {
    /// Increments the counter for `key` in the window starting at `window_start_ms`
    /// and returns the new count.
    fn increment(
        &self,
        key: &str,
        window_start_ms: i64,
        ttl: Duration,
    ) -> Result<u32, CounterStoreError>;
}

#[derive(Debug, Default)]
pub struct InMemoryCounterStore {
    counters: Mutex<HashMap<String, (i64, u32)>>,
}

impl CounterStore for InMemoryCounterStore {
    fn increment(
        &self,
        key: &str,
        window_start_ms: i64,
        _ttl: Duration,
    ) -> Result<u32, CounterStoreError> {
        let mut counters = self.counters.lock().unwrap_or_else(PoisonError::into_inner);
        let entry = counters.entry(key.to_string()).or_insert((window_start_ms, 0));
        if entry.0 != window_start_ms {
            *entry = (window_start_ms, 0);
        }
        entry.1 = entry.1.saturating_add(1);
        Ok(entry.1)
    }
}

/// Fixed-window limiter over a [`CounterStore`]. Store failures let the request through.
pub struct FixedWindowLimiter<S> {
    store: S,
    max_requests: u32,
    window: Duration,
}

impl<S: CounterStore> FixedWindowLimiter<S> {
    pub fn new(store: S, max_requests: u32, window: Duration) -> Self {
        Self {
            store,
            max_requests,
            window,
        }
    }
}

impl<S: CounterStore> RateLimiter for FixedWindowLimiter<S> {
    fn check(&self, key: &str, now: DateTime<Utc>) -> RateDecision {
        let window_ms = window_millis(self.window);
        let now_ms = now.timestamp_millis();
        let window_start = now_ms - now_ms.rem_euclid(window_ms);

        match self.store.increment(key, window_start, self.window) {
            Ok(count) if count <= self.max_requests => {
                RateDecision::allow(self.max_requests - count)
            }
            Ok(_) => {
                let wait_ms = window_start + window_ms - now_ms;
                RateDecision::deny(Duration::from_millis(wait_ms.unsigned_abs()))
            }
            Err(err) => {
                warn!(key, error = %err, "rate limit store failed; allowing request");
                RateDecision::allow(self.max_requests)
            }
        }
    }
}

/// First `x-forwarded-for` hop, then `x-real-ip`, else `unknown`.
pub fn client_key(headers: &HeaderMap) -> String {
    let forwarded = headers
        .get("x-forwarded-for")
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.split(',').next())
        .map(str::trim)
        .filter(|value| !value.is_empty());
    let real_ip = || {
        headers
            .get("x-real-ip")
            .and_then(|value| value.to_str().ok())
            .map(str::trim)
            .filter(|value| !value.is_empty())
    };

    forwarded
        .or_else(real_ip)
        .unwrap_or("unknown")
        .to_string()
}

/// Axum middleware: `middleware::from_fn_with_state(limiter, enforce_rate_limit)`.
pub async fn enforce_rate_limit(
    State(limiter): State<Arc<dyn RateLimiter>>,
    request: Request,
    next: Next,
) -> Response {
    let key = client_key(request.headers());
    let decision = limiter.check(&key, Utc::now());
    if decision.allowed {
        return next.run(request).await;
    }

    let retry_after_secs = decision.retry_after.as_secs_f64().ceil() as u64;
    warn!(client = %key, retry_after_secs, "rate limit exceeded");
    let mut response = (
        StatusCode::TOO_MANY_REQUESTS,
        Json(json!({
            "error": "too many requests",
            "retry_after_secs": retry_after_secs,
        })),
    )
        .into_response();
    response
        .headers_mut()
        .insert(header::RETRY_AFTER, HeaderValue::from(retry_after_secs));
    response
}
