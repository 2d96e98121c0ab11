//! Global per-IP request floor.
//!
//! A coarse fixed-window counter in front of everything else: 100
//! requests per minute per client IP, independent of the per-player
//! action limits. The client IP comes from `X-Forwarded-For` (first
//! hop) when present, else the socket address recorded by the
//! connect-info extension; requests with neither share one bucket,
//! which only happens in tests.

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::Mutex;
use std::time::{Duration, Instant};

use axum::extract::{ConnectInfo, Request, State};
use axum::http::StatusCode;
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use std::sync::Arc;

/// Requests allowed per window per IP.
const REQUESTS_PER_WINDOW: u32 = 100;

/// Window length.
const WINDOW: Duration = Duration::from_secs(60);

/// Buckets are pruned when the map grows past this many entries.
const PRUNE_THRESHOLD: usize = 10_000;

/// One client's window state.
#[derive(Debug, Clone, Copy)]
struct Bucket {
    window_start: Instant,
    count: u32,
}

/// Shared counter state.
#[derive(Debug, Default)]
pub struct IpLimiter {
    buckets: Mutex<HashMap<String, Bucket>>,
}

impl IpLimiter {
    /// Fresh limiter.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a request from `client` and decide whether it may proceed.
    fn allow(&self, client: &str) -> bool {
        let now = Instant::now();
        let Ok(mut buckets) = self.buckets.lock() else {
            // A poisoned lock means a panic elsewhere; fail open.
            return true;
        };

        if buckets.len() > PRUNE_THRESHOLD {
            buckets.retain(|_, b| now.duration_since(b.window_start) < WINDOW);
        }

        let bucket = buckets.entry(client.to_owned()).or_insert(Bucket {
            window_start: now,
            count: 0,
        });
        if now.duration_since(bucket.window_start) >= WINDOW {
            bucket.window_start = now;
            bucket.count = 0;
        }
        bucket.count = bucket.count.saturating_add(1);
        bucket.count <= REQUESTS_PER_WINDOW
    }
}

/// Axum middleware enforcing the per-IP floor.
pub async fn enforce(
    State(limiter): State<Arc<IpLimiter>>,
    request: Request,
    next: Next,
) -> Response {
    let client = client_key(&request);
    if limiter.allow(&client) {
        next.run(request).await
    } else {
        (
            StatusCode::TOO_MANY_REQUESTS,
            axum::Json(serde_json::json!({
                "code": "rate_limited",
                "message": "per-IP request floor exceeded",
            })),
        )
            .into_response()
    }
}

/// Derive the rate key for a request.
fn client_key(request: &Request) -> String {
    if let Some(forwarded) = request
        .headers()
        .get("x-forwarded-for")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(',').next())
        .map(str::trim)
        .filter(|v| !v.is_empty())
    {
        return forwarded.to_owned();
    }
    request
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map_or_else(|| "unknown".to_owned(), |info| info.0.ip().to_string())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn floor_allows_then_blocks() {
        let limiter = IpLimiter::new();
        for _ in 0..REQUESTS_PER_WINDOW {
            assert!(limiter.allow("10.0.0.1"));
        }
        assert!(!limiter.allow("10.0.0.1"));
        // A different client is unaffected.
        assert!(limiter.allow("10.0.0.2"));
    }
}
