// src/middleware/rate_limit.rs

use crate::{error::AppError, state::AppState};
use axum::{
    extract::{ConnectInfo, Request, State},
    http::Method,
    middleware::Next,
    response::Response,
};
use std::{
    collections::HashMap,
    net::SocketAddr,
    sync::Arc,
    time::{Duration, Instant},
};
use tokio::sync::RwLock;
use tracing::{debug, warn};

#[derive(Debug, Clone)]
pub struct RateLimitEntry {
    pub count: u32,
    pub window_start: Instant,
}

/// Fixed-window counter of login attempts per client address.
#[derive(Debug)]
pub struct LoginThrottle {
    max_requests: u32,
    window_duration: Duration,
    entries: RwLock<HashMap<String, RateLimitEntry>>,
}

impl LoginThrottle {
    pub fn new(max_requests: u32, window_duration: Duration) -> Self {
        Self {
            max_requests,
            window_duration,
            entries: RwLock::new(HashMap::new()),
        }
    }

    pub fn per_minute(max_requests: u32) -> Self {
        Self::new(max_requests, Duration::from_secs(60))
    }

    /// Count one attempt for `client_key`. Returns `false` once the window's
    /// budget is spent.
    pub async fn try_acquire(&self, client_key: &str) -> bool {
        let now = Instant::now();
        let mut entries = self.entries.write().await;

        // Drop stale windows so the map cannot grow without bound.
        entries.retain(|_, e| now.duration_since(e.window_start) < self.window_duration);

        let entry = entries
            .entry(client_key.to_string())
            .or_insert(RateLimitEntry {
                count: 0,
                window_start: now,
            });

        if entry.count >= self.max_requests {
            return false;
        }
        entry.count += 1;
        true
    }

    pub fn max_requests(&self) -> u32 {
        self.max_requests
    }
}

/// Throttles login attempts (POST only). Requests without connection info
/// (for example in-process tests) share one bucket.
pub async fn login_rate_limit_middleware(
    State(state): State<Arc<AppState>>,
    connect_info: Option<ConnectInfo<SocketAddr>>,
    request: Request,
    next: Next,
) -> Result<Response, AppError> {
    if request.method() != Method::POST {
        return Ok(next.run(request).await);
    }

    let client_key = connect_info
        .map(|ConnectInfo(addr)| addr.ip().to_string())
        .unwrap_or_else(|| "unknown".to_string());

    let throttle = &state.login_throttle;
    if !throttle.try_acquire(&client_key).await {
        warn!(
            client_ip = %client_key,
            max_requests = throttle.max_requests(),
            "Rate limit exceeded for admin login"
        );
        return Err(AppError::RateLimit {
            limit: throttle.max_requests(),
            window: "minute".to_string(),
        });
    }

    debug!(client_ip = %client_key, "Rate limit check passed");
    Ok(next.run(request).await)
}
