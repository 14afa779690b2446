//! # sarlaft-api — Axum API Surface for the SARLAFT Stack
//!
//! Thin transport over the case service: routes parse and validate input,
//! resolve the caller's identity, dispatch one service call, and map the
//! result. No business rules live in handlers — every gate is enforced by
//! the engine, so a bug here can reject too much but never permit too much.
//!
//! ## API Surface
//!
//! | Prefix                   | Module                   | Domain            |
//! |--------------------------|--------------------------|-------------------|
//! | `/api/dossiers/*`        | [`routes::dossiers`]     | Review lifecycle  |
//! | `/api/evaluations/*`     | [`routes::evaluations`]  | Risk scoring      |
//! | `/api/pep/*`             | [`routes::pep`]          | PEP declarations  |
//! | `/api/v1/alerts/*`       | [`routes::alerts`]       | Alert lifecycle   |
//! | `/api/audit/*`           | [`routes::audit`]        | Ledger queries    |
//!
//! ## Middleware Stack (execution order)
//!
//! ```text
//! TraceLayer → MetricsMiddleware → AuthMiddleware → Handler
//! ```
//!
//! Health probes (`/health/*`) are mounted outside the auth middleware.

pub mod auth;
pub mod error;
pub mod middleware;
pub mod openapi;
pub mod routes;
pub mod state;

use axum::middleware::from_fn;
use axum::Router;
use tower_http::trace::TraceLayer;

use crate::auth::AuthConfig;
use crate::middleware::metrics::ApiMetrics;
use crate::state::AppState;

pub use error::AppError;

/// Assemble the full application router with all routes and middleware.
pub fn app(state: AppState) -> Router {
    let auth_config = AuthConfig {
        secret: state.config.auth_secret.clone(),
    };
    let metrics = ApiMetrics::new();

    let api = Router::new()
        .merge(routes::dossiers::router())
        .merge(routes::evaluations::router())
        .merge(routes::pep::router())
        .merge(routes::alerts::router())
        .merge(routes::audit::router())
        .merge(openapi::router())
        .layer(from_fn(auth::auth_middleware))
        .layer(from_fn(middleware::metrics::metrics_middleware))
        .layer(TraceLayer::new_for_http())
        .layer(axum::Extension(auth_config))
        .layer(axum::Extension(metrics))
        .with_state(state);

    let health = Router::new()
        .route("/health/liveness", axum::routing::get(liveness))
        .route("/health/readiness", axum::routing::get(readiness));

    Router::new().merge(health).merge(api)
}

/// Liveness probe — 200 while the process runs.
async fn liveness() -> &'static str {
    "ok"
}

/// Readiness probe — 200 when the application can serve.
async fn readiness() -> &'static str {
    "ready"
}
