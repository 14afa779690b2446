//! # Alert Routes
//!
//! Alert lifecycle: creation, follow-up tracking, attention, and
//! officer-only closure.

use axum::extract::{Path, Query, State};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Deserialize;
use utoipa::ToSchema;
use uuid::Uuid;

use sarlaft_core::{AlertId, DossierId};
use sarlaft_engine::{Alert, AlertClassification, AlertLevel, AlertType};

use crate::auth::CallerIdentity;
use crate::error::AppError;
use crate::state::AppState;

/// Raise a user-originated alert.
#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateAlertRequest {
    /// The dossier the alert concerns.
    pub dossier_id: Uuid,
    /// Alert type tag (`MANUAL_REVIEW`, `SCREENING_HIT`, ...).
    pub alert_type: String,
    /// Severity tag (`BAJA`, `MEDIA`, `ALTA`, `CRITICA`).
    pub level: String,
}

/// A follow-up or attention comment.
#[derive(Debug, Deserialize, ToSchema)]
pub struct TrackingRequest {
    /// The version the caller last read.
    pub version: u64,
    /// The mandatory comment.
    pub comment: String,
}

/// Close an alert.
#[derive(Debug, Deserialize, ToSchema)]
pub struct CloseAlertRequest {
    /// The version the caller last read.
    pub version: u64,
    /// Mandatory closure reason.
    pub reason: String,
    /// Resolution tag (`MITIGADO`, `ACEPTADO`, `ESCALADO`).
    pub classification: String,
}

/// Optional list filter.
#[derive(Debug, Deserialize)]
pub struct ListAlertsQuery {
    /// Only alerts for this dossier.
    #[serde(default)]
    pub dossier_id: Option<Uuid>,
}

/// Build the alerts router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/v1/alerts", get(list_alerts).post(create_alert))
        .route("/api/v1/alerts/:id", get(get_alert))
        .route("/api/v1/alerts/:id/tracking", post(track_alert))
        .route("/api/v1/alerts/:id/attend", post(attend_alert))
        .route("/api/v1/alerts/:id/close", post(close_alert))
}

/// GET /api/v1/alerts — All alerts, optionally filtered by dossier.
#[utoipa::path(
    get,
    path = "/api/v1/alerts",
    responses((status = 200, description = "Alert list")),
    tag = "alerts"
)]
pub async fn list_alerts(
    State(state): State<AppState>,
    Query(query): Query<ListAlertsQuery>,
) -> Json<Vec<Alert>> {
    let alerts = match query.dossier_id {
        Some(dossier_id) => state
            .service
            .list_alerts_for_dossier(DossierId::from(dossier_id)),
        None => state.service.list_alerts(),
    };
    Json(alerts)
}

/// POST /api/v1/alerts — Raise a user-originated alert.
#[utoipa::path(
    post,
    path = "/api/v1/alerts",
    request_body = CreateAlertRequest,
    responses(
        (status = 200, description = "Alert raised"),
        (status = 400, description = "Unknown type or level tag"),
        (status = 404, description = "Dossier not found"),
    ),
    tag = "alerts"
)]
pub async fn create_alert(
    State(state): State<AppState>,
    caller: CallerIdentity,
    Json(req): Json<CreateAlertRequest>,
) -> Result<Json<Alert>, AppError> {
    let alert = state.service.create_alert(
        &caller.actor(),
        DossierId::from(req.dossier_id),
        AlertType::parse(&req.alert_type)?,
        AlertLevel::parse(&req.level)?,
    )?;
    Ok(Json(alert))
}

/// GET /api/v1/alerts/{id} — Fetch one alert.
#[utoipa::path(
    get,
    path = "/api/v1/alerts/{id}",
    responses(
        (status = 200, description = "Alert"),
        (status = 404, description = "Alert not found"),
    ),
    tag = "alerts"
)]
pub async fn get_alert(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<Alert>, AppError> {
    Ok(Json(state.service.get_alert(AlertId::from(id))?))
}

/// POST /api/v1/alerts/{id}/tracking — Record a follow-up.
#[utoipa::path(
    post,
    path = "/api/v1/alerts/{id}/tracking",
    request_body = TrackingRequest,
    responses(
        (status = 200, description = "Follow-up recorded"),
        (status = 422, description = "Missing comment"),
        (status = 409, description = "Alert closed, or version conflict"),
    ),
    tag = "alerts"
)]
pub async fn track_alert(
    State(state): State<AppState>,
    caller: CallerIdentity,
    Path(id): Path<Uuid>,
    Json(req): Json<TrackingRequest>,
) -> Result<Json<Alert>, AppError> {
    let alert = state.service.follow_up_alert(
        &caller.actor(),
        AlertId::from(id),
        req.version,
        &req.comment,
    )?;
    Ok(Json(alert))
}

/// POST /api/v1/alerts/{id}/attend — Conclude the follow-up.
#[utoipa::path(
    post,
    path = "/api/v1/alerts/{id}/attend",
    request_body = TrackingRequest,
    responses((status = 200, description = "Alert attended")),
    tag = "alerts"
)]
pub async fn attend_alert(
    State(state): State<AppState>,
    caller: CallerIdentity,
    Path(id): Path<Uuid>,
    Json(req): Json<TrackingRequest>,
) -> Result<Json<Alert>, AppError> {
    let alert = state.service.attend_alert(
        &caller.actor(),
        AlertId::from(id),
        req.version,
        &req.comment,
    )?;
    Ok(Json(alert))
}

/// POST /api/v1/alerts/{id}/close — Close (officer only, irreversible).
#[utoipa::path(
    post,
    path = "/api/v1/alerts/{id}/close",
    request_body = CloseAlertRequest,
    responses(
        (status = 200, description = "Alert closed"),
        (status = 403, description = "Caller is not the compliance officer"),
        (status = 409, description = "Already closed, or version conflict"),
    ),
    tag = "alerts"
)]
pub async fn close_alert(
    State(state): State<AppState>,
    caller: CallerIdentity,
    Path(id): Path<Uuid>,
    Json(req): Json<CloseAlertRequest>,
) -> Result<Json<Alert>, AppError> {
    let alert = state.service.close_alert(
        &caller.actor(),
        AlertId::from(id),
        req.version,
        &req.reason,
        AlertClassification::parse(&req.classification)?,
    )?;
    Ok(Json(alert))
}
