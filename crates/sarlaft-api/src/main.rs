//! # sarlaft-api — Binary Entry Point
//!
//! Starts the Axum HTTP server over an in-memory case service.
//!
//! Environment:
//! - `PORT` — listen port (default 8080).
//! - `AUTH_SECRET` — shared bearer secret; unset disables auth (dev mode).
//! - `RISK_POLICY` — path to a YAML file with the risk thresholds;
//!   unset uses the defaults.

use std::sync::Arc;

use sarlaft_api::state::{AppConfig, AppState};
use sarlaft_engine::RiskPolicy;
use sarlaft_service::CaseService;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let port: u16 = std::env::var("PORT")
        .ok()
        .and_then(|p| p.parse().ok())
        .unwrap_or(8080);
    let auth_secret = std::env::var("AUTH_SECRET").ok();
    if auth_secret.is_none() {
        tracing::warn!("AUTH_SECRET not set - authentication disabled (development mode)");
    }

    let risk_policy = match std::env::var("RISK_POLICY") {
        Ok(path) => {
            let raw = std::fs::read_to_string(&path)?;
            let policy: RiskPolicy = serde_yaml::from_str(&raw)?;
            tracing::info!(%path, ?policy, "risk policy loaded");
            policy
        }
        Err(_) => RiskPolicy::default(),
    };

    let service = CaseService::in_memory(risk_policy)
        .map_err(|e| anyhow::anyhow!("invalid risk policy: {e}"))?;
    let config = AppConfig {
        port,
        auth_secret,
        risk_policy,
    };
    let state = AppState::new(Arc::new(service), config);

    let app = sarlaft_api::app(state);
    let addr = std::net::SocketAddr::from(([0, 0, 0, 0], port));
    tracing::info!("SARLAFT API listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}
