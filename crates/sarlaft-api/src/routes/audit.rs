//! # Audit Ledger Routes
//!
//! Read-only inspector views over the ledger: filtered event queries and
//! chain verification. Available to all authenticated roles.

use axum::extract::{Query, State};
use axum::routing::get;
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use sarlaft_core::{ActorId, Timestamp};
use sarlaft_ledger::{AuditEvent, AuditModule, LedgerQuery};

use crate::error::AppError;
use crate::state::AppState;

/// Query-string filters for the event listing.
#[derive(Debug, Default, Deserialize)]
pub struct AuditQueryParams {
    /// Earliest timestamp (RFC 3339).
    #[serde(default)]
    pub from: Option<String>,
    /// Latest timestamp (RFC 3339).
    #[serde(default)]
    pub to: Option<String>,
    /// Only events by this actor.
    #[serde(default)]
    pub actor_id: Option<String>,
    /// Only events in this module tag.
    #[serde(default)]
    pub module: Option<String>,
    /// Only events on this entity.
    #[serde(default)]
    pub entity_id: Option<String>,
}

/// Chain verification result.
#[derive(Debug, Serialize, ToSchema)]
pub struct ChainStatus {
    /// Whether every link verified.
    pub valid: bool,
    /// Number of events covered.
    pub events: usize,
    /// Failure detail, when invalid.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
}

/// Build the audit router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/audit/events", get(query_events))
        .route("/api/audit/verify", get(verify_chain))
}

/// GET /api/audit/events — Events matching the filters, newest first.
#[utoipa::path(
    get,
    path = "/api/audit/events",
    responses(
        (status = 200, description = "Matching events, newest first"),
        (status = 400, description = "Bad filter value"),
    ),
    tag = "audit"
)]
pub async fn query_events(
    State(state): State<AppState>,
    Query(params): Query<AuditQueryParams>,
) -> Result<Json<Vec<AuditEvent>>, AppError> {
    let query = LedgerQuery {
        from: parse_stamp(&params.from)?,
        to: parse_stamp(&params.to)?,
        actor_id: params.actor_id.map(ActorId::new),
        module: params
            .module
            .as_deref()
            .map(AuditModule::parse)
            .transpose()?,
        entity_id: params.entity_id,
    };
    Ok(Json(state.service.query_audit(&query)))
}

/// GET /api/audit/verify — Verify the ledger's digest chain end to end.
#[utoipa::path(
    get,
    path = "/api/audit/verify",
    responses((status = 200, description = "Chain verification result", body = ChainStatus)),
    tag = "audit"
)]
pub async fn verify_chain(State(state): State<AppState>) -> Json<ChainStatus> {
    let events = state.service.audit_len();
    match state.service.verify_audit_chain() {
        Ok(()) => Json(ChainStatus {
            valid: true,
            events,
            detail: None,
        }),
        Err(e) => Json(ChainStatus {
            valid: false,
            events,
            detail: Some(e.to_string()),
        }),
    }
}

fn parse_stamp(value: &Option<String>) -> Result<Option<Timestamp>, AppError> {
    match value {
        Some(s) => Ok(Some(Timestamp::parse_lenient(s)?)),
        None => Ok(None),
    }
}
