//! # Request Metrics
//!
//! Lightweight request counters on atomics, exposed through the shared
//! handle for health/ops views. In-process only; an exporter can read the
//! same handle.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use axum::extract::Request;
use axum::middleware::Next;
use axum::response::Response;

/// Shared request counters.
#[derive(Debug, Clone, Default)]
pub struct ApiMetrics {
    request_count: Arc<AtomicU64>,
    rejected_count: Arc<AtomicU64>,
}

impl ApiMetrics {
    /// Create a fresh counter set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Total requests served.
    pub fn requests(&self) -> u64 {
        self.request_count.load(Ordering::Relaxed)
    }

    /// Requests answered with a 4xx/5xx status.
    pub fn rejected(&self) -> u64 {
        self.rejected_count.load(Ordering::Relaxed)
    }
}

/// Middleware that increments the counters around each request.
pub async fn metrics_middleware(request: Request, next: Next) -> Response {
    let metrics = request.extensions().get::<ApiMetrics>().cloned();

    let response = next.run(request).await;

    if let Some(m) = metrics {
        m.request_count.fetch_add(1, Ordering::Relaxed);
        if response.status().is_client_error() || response.status().is_server_error() {
            m.rejected_count.fetch_add(1, Ordering::Relaxed);
        }
    }
    response
}
