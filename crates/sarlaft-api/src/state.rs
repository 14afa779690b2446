//! # Application State
//!
//! Shared state for the Axum application, passed to all route handlers via
//! the `State` extractor. Holds the case service (which owns the stores and
//! the ledger) and the runtime configuration.

use std::sync::Arc;

use sarlaft_engine::RiskPolicy;
use sarlaft_service::CaseService;

/// Runtime configuration, read from the environment in `main`.
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Listen port.
    pub port: u16,
    /// Shared bearer secret. `None` disables authentication (development
    /// mode: every request runs as the compliance officer).
    pub auth_secret: Option<String>,
    /// Risk threshold policy in force.
    pub risk_policy: RiskPolicy,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            port: 8080,
            auth_secret: None,
            risk_policy: RiskPolicy::default(),
        }
    }
}

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    /// The case coordination service.
    pub service: Arc<CaseService>,
    /// Runtime configuration.
    pub config: AppConfig,
}

impl AppState {
    /// Build state over the given service.
    pub fn new(service: Arc<CaseService>, config: AppConfig) -> Self {
        Self { service, config }
    }
}
