//! Rate limiting middleware
//!
//! Token bucket rate limiting keyed by client address. Each client gets its
//! own limiter, cached in memory with idle expiry so one-off visitors do
//! not accumulate forever. Sandboxed executions are expensive, so this sits
//! in front of the whole API surface.

use axum::{
    body::Body,
    extract::{ConnectInfo, State},
    http::{Request, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use governor::{
    clock::{Clock, DefaultClock},
    state::{InMemoryState, NotKeyed},
    Quota, RateLimiter,
};
use moka::future::Cache;
use serde_json::json;
use std::net::SocketAddr;
use std::num::NonZeroU32;
use std::sync::Arc;
use std::time::Duration;

use crate::config::Settings;

// ============================================================================
// Types
// ============================================================================

/// Type alias for a single client's rate limiter
type ClientRateLimiter = RateLimiter<NotKeyed, InMemoryState, DefaultClock>;

/// Rate limit state shared across requests
#[derive(Clone)]
pub struct RateLimitState {
    /// Application settings
    pub settings: Arc<Settings>,

    /// Cache of rate limiters per client address
    pub limiters: Cache<String, Arc<ClientRateLimiter>>,
}

impl RateLimitState {
    /// Create a new rate limit state
    pub fn new(settings: Arc<Settings>) -> Self {
        // 10,000 clients, idle entries dropped after 10 minutes
        let limiters = Cache::builder()
            .max_capacity(10_000)
            .time_to_idle(Duration::from_secs(600))
            .build();

        Self { settings, limiters }
    }

    /// Get or create the rate limiter for a client
    pub async fn get_limiter(&self, client: &str) -> Arc<ClientRateLimiter> {
        if let Some(limiter) = self.limiters.get(client).await {
            return limiter;
        }

        let limiter = Arc::new(self.create_limiter());
        self.limiters.insert(client.to_string(), limiter.clone()).await;

        limiter
    }

    /// Create a new rate limiter from the configured window
    fn create_limiter(&self) -> ClientRateLimiter {
        let requests_per_window = self.settings.rate_limit.requests_per_window;
        let window_seconds = self.settings.rate_limit.window_seconds;

        // Allow bursts up to the full window limit, replenishing one token
        // per (window / limit) so the average holds over the window.
        let quota = if window_seconds > 0 && requests_per_window > 0 {
            let replenish_period = Duration::from_secs(window_seconds) / requests_per_window;
            Quota::with_period(replenish_period)
                .unwrap()
                .allow_burst(NonZeroU32::new(requests_per_window).unwrap())
        } else {
            // Fallback: 100 requests per minute
            Quota::per_minute(NonZeroU32::new(100).unwrap())
        };

        RateLimiter::direct(quota)
    }
}

// ============================================================================
// Rate Limit Errors
// ============================================================================

/// Rate limit error with retry information
#[derive(Debug)]
pub struct RateLimitError {
    /// Seconds until the next request is allowed
    pub retry_after_seconds: u64,
}

impl IntoResponse for RateLimitError {
    fn into_response(self) -> Response {
        let body = json!({
            "type": "error",
            "error": {
                "type": "rate_limit_error",
                "message": format!(
                    "Rate limit exceeded. Please retry after {} seconds.",
                    self.retry_after_seconds
                ),
            }
        });

        let mut response = (StatusCode::TOO_MANY_REQUESTS, Json(body)).into_response();

        // Add rate limit headers
        let headers = response.headers_mut();
        if let Ok(v) = self.retry_after_seconds.to_string().parse() {
            headers.insert("retry-after", v);
        }
        if let Ok(v) = self.retry_after_seconds.to_string().parse() {
            headers.insert("x-ratelimit-reset", v);
        }

        response
    }
}

// ============================================================================
// Rate Limit Middleware
// ============================================================================

/// Middleware to enforce per-client rate limits
///
/// # Headers
/// On success:
/// - `X-RateLimit-Limit`: Maximum requests per window
///
/// On rate limit exceeded:
/// - `Retry-After`: Seconds until next request allowed
/// - `X-RateLimit-Reset`: Same as Retry-After
pub async fn rate_limit(
    State(rate_state): State<RateLimitState>,
    request: Request<Body>,
    next: Next,
) -> Result<Response, RateLimitError> {
    // Check if rate limiting is enabled
    if !rate_state.settings.rate_limit.enabled {
        return Ok(next.run(request).await);
    }

    let client = client_key(&request);
    let limiter = rate_state.get_limiter(&client).await;

    match limiter.check() {
        Ok(_) => {
            let mut response = next.run(request).await;

            let limit = rate_state.settings.rate_limit.requests_per_window;
            if let Ok(v) = limit.to_string().parse() {
                response.headers_mut().insert("x-ratelimit-limit", v);
            }

            Ok(response)
        }
        Err(not_until) => {
            let retry_after = not_until.wait_time_from(DefaultClock::default().now());
            let retry_after_seconds = retry_after.as_secs().max(1);

            tracing::warn!(
                client = %client,
                retry_after_seconds = retry_after_seconds,
                "Rate limit exceeded"
            );

            Err(RateLimitError { retry_after_seconds })
        }
    }
}

/// Identify the client making a request.
///
/// Proxy headers take precedence so deployments behind a reverse proxy key
/// on the original address; the socket peer is the fallback for direct
/// connections.
fn client_key(request: &Request<Body>) -> String {
    if let Some(forwarded) = request
        .headers()
        .get("x-forwarded-for")
        .and_then(|v| v.to_str().ok())
    {
        if let Some(first) = forwarded.split(',').next() {
            let first = first.trim();
            if !first.is_empty() {
                return first.to_string();
            }
        }
    }

    if let Some(real_ip) = request
        .headers()
        .get("x-real-ip")
        .and_then(|v| v.to_str().ok())
    {
        return real_ip.to_string();
    }

    request
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| addr.ip().to_string())
        .unwrap_or_else(|| "unknown".to_string())
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn state() -> RateLimitState {
        RateLimitState::new(Arc::new(Settings::default()))
    }

    #[test]
    fn test_rate_limit_state_creation() {
        assert_eq!(state().limiters.entry_count(), 0);
    }

    #[test]
    fn test_create_limiter() {
        let limiter = state().create_limiter();

        // First request should be allowed
        assert!(limiter.check().is_ok());
    }

    #[test]
    fn test_rate_limit_error_response() {
        let error = RateLimitError {
            retry_after_seconds: 30,
        };

        let response = error.into_response();
        assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
        assert!(response.headers().contains_key("retry-after"));
        assert_eq!(response.headers()["x-ratelimit-reset"], "30");
    }

    #[tokio::test]
    async fn test_get_limiter_caching() {
        let state = state();

        let limiter1 = state.get_limiter("203.0.113.9").await;
        let limiter2 = state.get_limiter("203.0.113.9").await;

        // Should be the same instance (Arc pointer comparison)
        assert!(Arc::ptr_eq(&limiter1, &limiter2));
    }

    #[tokio::test]
    async fn test_clients_get_separate_limiters() {
        let state = state();

        let limiter1 = state.get_limiter("203.0.113.9").await;
        let limiter2 = state.get_limiter("203.0.113.10").await;

        assert!(!Arc::ptr_eq(&limiter1, &limiter2));
    }

    #[test]
    fn test_burst_allowance() {
        let mut settings = Settings::default();
        settings.rate_limit.requests_per_window = 10;
        settings.rate_limit.window_seconds = 60;

        let state = RateLimitState::new(Arc::new(settings));
        let limiter = state.create_limiter();

        // Should allow burst of requests
        for i in 0..10 {
            assert!(limiter.check().is_ok(), "Request {} should be allowed", i);
        }

        // 11th request should be rate limited
        assert!(limiter.check().is_err(), "Request 11 should be rate limited");
    }

    #[test]
    fn test_client_key_prefers_forwarded_header() {
        let request = Request::builder()
            .uri("/api/execute")
            .header("x-forwarded-for", "198.51.100.4, 10.0.0.1")
            .body(Body::empty())
            .unwrap();

        assert_eq!(client_key(&request), "198.51.100.4");
    }

    #[test]
    fn test_client_key_falls_back_to_real_ip() {
        let request = Request::builder()
            .uri("/api/execute")
            .header("x-real-ip", "198.51.100.7")
            .body(Body::empty())
            .unwrap();

        assert_eq!(client_key(&request), "198.51.100.7");
    }

    #[test]
    fn test_client_key_without_peer_info() {
        let request = Request::builder()
            .uri("/api/execute")
            .body(Body::empty())
            .unwrap();

        assert_eq!(client_key(&request), "unknown");
    }
}
