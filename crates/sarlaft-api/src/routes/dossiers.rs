//! # Dossier Routes
//!
//! Review lifecycle of compliance dossiers: creation, completeness
//! tracking, submission, approval/rejection, information requests,
//! reopening, and the per-dossier history view.

use axum::extract::{Path, State};
use axum::routing::{get, post, put};
use axum::{Json, Router};
use serde::Deserialize;
use utoipa::ToSchema;
use uuid::Uuid;

use sarlaft_core::DossierId;
use sarlaft_engine::{Alert, Dossier, PepDeclaration, RiskEvaluation, SubjectType};
use sarlaft_ledger::AuditEvent;

use crate::auth::CallerIdentity;
use crate::error::AppError;
use crate::state::AppState;

/// Open a new dossier.
#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateDossierRequest {
    /// Subject kind tag (`CLIENT`, `INTERMEDIARY`, ...).
    pub subject_type: String,
}

/// Expected version of the aggregate being mutated.
#[derive(Debug, Deserialize, ToSchema)]
pub struct VersionRequest {
    /// The version the caller last read.
    pub version: u64,
}

/// New completeness percentage.
#[derive(Debug, Deserialize, ToSchema)]
pub struct CompletenessRequest {
    /// The version the caller last read.
    pub version: u64,
    /// Documentary completeness, 0–100.
    pub completeness: u8,
}

/// A versioned mutation carrying a mandatory reason.
#[derive(Debug, Deserialize, ToSchema)]
pub struct ReasonRequest {
    /// The version the caller last read.
    pub version: u64,
    /// The reason, recorded verbatim.
    pub reason: String,
}

/// Detail view: the dossier with its nested workflow records.
#[derive(Debug, serde::Serialize)]
pub struct DossierDetail {
    /// The dossier itself.
    pub dossier: Dossier,
    /// All evaluations, in revision order.
    pub evaluations: Vec<RiskEvaluation>,
    /// The PEP declaration covering the subject, if any.
    pub pep_declaration: Option<PepDeclaration>,
    /// Alerts raised against the dossier.
    pub alerts: Vec<Alert>,
}

/// Build the dossiers router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/dossiers", post(create_dossier).get(list_dossiers))
        .route("/api/dossiers/:id", get(get_dossier))
        .route("/api/dossiers/:id/completeness", put(update_completeness))
        .route("/api/dossiers/:id/submit", post(submit_dossier))
        .route("/api/dossiers/:id/approve", post(approve_dossier))
        .route("/api/dossiers/:id/reject", post(reject_dossier))
        .route("/api/dossiers/:id/request-info", post(request_info))
        .route("/api/dossiers/:id/reopen", post(reopen_dossier))
        .route("/api/dossiers/:id/history", get(dossier_history))
}

/// POST /api/dossiers — Open a new dossier.
#[utoipa::path(
    post,
    path = "/api/dossiers",
    request_body = CreateDossierRequest,
    responses(
        (status = 200, description = "Dossier created"),
        (status = 400, description = "Unknown subject type"),
        (status = 403, description = "Role may not create dossiers"),
    ),
    tag = "dossiers"
)]
pub async fn create_dossier(
    State(state): State<AppState>,
    caller: CallerIdentity,
    Json(req): Json<CreateDossierRequest>,
) -> Result<Json<Dossier>, AppError> {
    let subject = SubjectType::parse(&req.subject_type)?;
    let dossier = state.service.create_dossier(&caller.actor(), subject)?;
    Ok(Json(dossier))
}

/// GET /api/dossiers — All dossiers.
#[utoipa::path(
    get,
    path = "/api/dossiers",
    responses((status = 200, description = "Dossier list")),
    tag = "dossiers"
)]
pub async fn list_dossiers(State(state): State<AppState>) -> Json<Vec<Dossier>> {
    Json(state.service.list_dossiers())
}

/// GET /api/dossiers/{id} — Dossier detail with nested workflow records.
#[utoipa::path(
    get,
    path = "/api/dossiers/{id}",
    responses(
        (status = 200, description = "Dossier detail"),
        (status = 404, description = "Dossier not found"),
    ),
    tag = "dossiers"
)]
pub async fn get_dossier(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<DossierDetail>, AppError> {
    let id = DossierId::from(id);
    let dossier = state.service.get_dossier(id)?;
    Ok(Json(DossierDetail {
        evaluations: state.service.list_evaluations(id),
        pep_declaration: state.service.find_declaration(id),
        alerts: state.service.list_alerts_for_dossier(id),
        dossier,
    }))
}

/// PUT /api/dossiers/{id}/completeness — Record a new completeness value.
#[utoipa::path(
    put,
    path = "/api/dossiers/{id}/completeness",
    request_body = CompletenessRequest,
    responses(
        (status = 200, description = "Completeness updated"),
        (status = 409, description = "Version conflict or frozen dossier"),
    ),
    tag = "dossiers"
)]
pub async fn update_completeness(
    State(state): State<AppState>,
    caller: CallerIdentity,
    Path(id): Path<Uuid>,
    Json(req): Json<CompletenessRequest>,
) -> Result<Json<Dossier>, AppError> {
    let dossier = state.service.update_completeness(
        &caller.actor(),
        DossierId::from(id),
        req.version,
        req.completeness,
    )?;
    Ok(Json(dossier))
}

/// POST /api/dossiers/{id}/submit — Submit for compliance review.
#[utoipa::path(
    post,
    path = "/api/dossiers/{id}/submit",
    request_body = VersionRequest,
    responses(
        (status = 200, description = "Dossier under review"),
        (status = 422, description = "Completeness below threshold"),
    ),
    tag = "dossiers"
)]
pub async fn submit_dossier(
    State(state): State<AppState>,
    caller: CallerIdentity,
    Path(id): Path<Uuid>,
    Json(req): Json<VersionRequest>,
) -> Result<Json<Dossier>, AppError> {
    let dossier =
        state
            .service
            .submit_dossier(&caller.actor(), DossierId::from(id), req.version)?;
    Ok(Json(dossier))
}

/// POST /api/dossiers/{id}/approve — Approve (officer only).
#[utoipa::path(
    post,
    path = "/api/dossiers/{id}/approve",
    request_body = VersionRequest,
    responses(
        (status = 200, description = "Dossier approved"),
        (status = 403, description = "Caller is not the compliance officer"),
        (status = 409, description = "Not under review, or version conflict"),
    ),
    tag = "dossiers"
)]
pub async fn approve_dossier(
    State(state): State<AppState>,
    caller: CallerIdentity,
    Path(id): Path<Uuid>,
    Json(req): Json<VersionRequest>,
) -> Result<Json<Dossier>, AppError> {
    let dossier =
        state
            .service
            .approve_dossier(&caller.actor(), DossierId::from(id), req.version)?;
    Ok(Json(dossier))
}

/// POST /api/dossiers/{id}/reject — Reject with observations (officer only).
#[utoipa::path(
    post,
    path = "/api/dossiers/{id}/reject",
    request_body = ReasonRequest,
    responses(
        (status = 200, description = "Dossier observed"),
        (status = 422, description = "Missing rejection reason"),
    ),
    tag = "dossiers"
)]
pub async fn reject_dossier(
    State(state): State<AppState>,
    caller: CallerIdentity,
    Path(id): Path<Uuid>,
    Json(req): Json<ReasonRequest>,
) -> Result<Json<Dossier>, AppError> {
    let dossier = state.service.reject_dossier(
        &caller.actor(),
        DossierId::from(id),
        req.version,
        &req.reason,
    )?;
    Ok(Json(dossier))
}

/// POST /api/dossiers/{id}/request-info — Ask for more information
/// (officer only).
#[utoipa::path(
    post,
    path = "/api/dossiers/{id}/request-info",
    request_body = ReasonRequest,
    responses((status = 200, description = "Information requested")),
    tag = "dossiers"
)]
pub async fn request_info(
    State(state): State<AppState>,
    caller: CallerIdentity,
    Path(id): Path<Uuid>,
    Json(req): Json<ReasonRequest>,
) -> Result<Json<Dossier>, AppError> {
    let dossier = state.service.request_dossier_info(
        &caller.actor(),
        DossierId::from(id),
        req.version,
        &req.reason,
    )?;
    Ok(Json(dossier))
}

/// POST /api/dossiers/{id}/reopen — Start a new review cycle.
#[utoipa::path(
    post,
    path = "/api/dossiers/{id}/reopen",
    request_body = ReasonRequest,
    responses((status = 200, description = "Dossier reopened")),
    tag = "dossiers"
)]
pub async fn reopen_dossier(
    State(state): State<AppState>,
    caller: CallerIdentity,
    Path(id): Path<Uuid>,
    Json(req): Json<ReasonRequest>,
) -> Result<Json<Dossier>, AppError> {
    let dossier = state.service.reopen_dossier(
        &caller.actor(),
        DossierId::from(id),
        req.version,
        &req.reason,
    )?;
    Ok(Json(dossier))
}

/// GET /api/dossiers/{id}/history — Ledger events for this dossier,
/// newest first.
#[utoipa::path(
    get,
    path = "/api/dossiers/{id}/history",
    responses((status = 200, description = "Transition history")),
    tag = "dossiers"
)]
pub async fn dossier_history(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Json<Vec<AuditEvent>> {
    Json(state.service.entity_history(&DossierId::from(id).to_string()))
}
