//! # Risk Evaluation Routes
//!
//! Scoring passes and their approval lifecycle: start, submit, manual
//! override, approve (with risk write-back), reject.

use axum::extract::{Path, State};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Deserialize;
use utoipa::ToSchema;
use uuid::Uuid;

use sarlaft_core::{DossierId, EvaluationId};
use sarlaft_engine::{EvaluationType, RiskEvaluation, RiskFactor, RiskLevel};

use crate::auth::CallerIdentity;
use crate::error::AppError;
use crate::state::AppState;

/// One weighted factor as submitted by the client.
#[derive(Debug, Deserialize, ToSchema)]
pub struct FactorDto {
    /// Catalog identifier of the factor.
    pub factor_id: String,
    /// Weight contributed, 0.0–5.0.
    pub weight: f64,
    /// Analyst observation.
    #[serde(default)]
    pub observation: Option<String>,
}

impl From<FactorDto> for RiskFactor {
    fn from(dto: FactorDto) -> Self {
        RiskFactor {
            factor_id: dto.factor_id,
            weight: dto.weight,
            observation: dto.observation,
        }
    }
}

/// Start a scoring pass.
#[derive(Debug, Deserialize, ToSchema)]
pub struct StartEvaluationRequest {
    /// Evaluation type tag (`INICIAL`, `PERIODICA`, `RE_EVALUACION`).
    pub evaluation_type: String,
    /// The weighted factors.
    pub factors: Vec<FactorDto>,
}

/// Expected version of the evaluation being mutated.
#[derive(Debug, Deserialize, ToSchema)]
pub struct EvaluationVersionRequest {
    /// The version the caller last read.
    pub version: u64,
}

/// Manual override request.
#[derive(Debug, Deserialize, ToSchema)]
pub struct OverrideRequest {
    /// The version the caller last read.
    pub version: u64,
    /// Level tag to force (`LOW`, `MEDIUM`, `HIGH`).
    pub new_level: String,
    /// Mandatory justification.
    pub justification: String,
}

/// Rejection with a mandatory reason.
#[derive(Debug, Deserialize, ToSchema)]
pub struct EvaluationReasonRequest {
    /// The version the caller last read.
    pub version: u64,
    /// The reason, recorded verbatim.
    pub reason: String,
}

/// Build the evaluations router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/dossiers/:id/evaluations", post(start_evaluation))
        .route("/api/evaluations/:id", get(get_evaluation))
        .route("/api/evaluations/:id/submit", post(submit_evaluation))
        .route("/api/evaluations/:id/override", post(override_evaluation))
        .route("/api/evaluations/:id/approve", post(approve_evaluation))
        .route("/api/evaluations/:id/reject", post(reject_evaluation))
}

/// POST /api/dossiers/{id}/evaluations — Run a scoring pass.
#[utoipa::path(
    post,
    path = "/api/dossiers/{id}/evaluations",
    request_body = StartEvaluationRequest,
    responses(
        (status = 200, description = "Evaluation drafted"),
        (status = 422, description = "Factor weight out of range"),
    ),
    tag = "evaluations"
)]
pub async fn start_evaluation(
    State(state): State<AppState>,
    caller: CallerIdentity,
    Path(id): Path<Uuid>,
    Json(req): Json<StartEvaluationRequest>,
) -> Result<Json<RiskEvaluation>, AppError> {
    let evaluation_type = EvaluationType::parse(&req.evaluation_type)?;
    let factors = req.factors.into_iter().map(RiskFactor::from).collect();
    let evaluation = state.service.start_evaluation(
        &caller.actor(),
        DossierId::from(id),
        evaluation_type,
        factors,
    )?;
    Ok(Json(evaluation))
}

/// GET /api/evaluations/{id} — Fetch one evaluation.
#[utoipa::path(
    get,
    path = "/api/evaluations/{id}",
    responses(
        (status = 200, description = "Evaluation"),
        (status = 404, description = "Evaluation not found"),
    ),
    tag = "evaluations"
)]
pub async fn get_evaluation(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<RiskEvaluation>, AppError> {
    Ok(Json(state.service.get_evaluation(EvaluationId::from(id))?))
}

/// POST /api/evaluations/{id}/submit — Queue a draft for approval.
#[utoipa::path(
    post,
    path = "/api/evaluations/{id}/submit",
    request_body = EvaluationVersionRequest,
    responses((status = 200, description = "Evaluation pending approval")),
    tag = "evaluations"
)]
pub async fn submit_evaluation(
    State(state): State<AppState>,
    caller: CallerIdentity,
    Path(id): Path<Uuid>,
    Json(req): Json<EvaluationVersionRequest>,
) -> Result<Json<RiskEvaluation>, AppError> {
    let evaluation =
        state
            .service
            .submit_evaluation(&caller.actor(), EvaluationId::from(id), req.version)?;
    Ok(Json(evaluation))
}

/// POST /api/evaluations/{id}/override — Manual level override.
#[utoipa::path(
    post,
    path = "/api/evaluations/{id}/override",
    request_body = OverrideRequest,
    responses(
        (status = 200, description = "Override recorded"),
        (status = 422, description = "Missing justification"),
        (status = 409, description = "Evaluation frozen"),
    ),
    tag = "evaluations"
)]
pub async fn override_evaluation(
    State(state): State<AppState>,
    caller: CallerIdentity,
    Path(id): Path<Uuid>,
    Json(req): Json<OverrideRequest>,
) -> Result<Json<RiskEvaluation>, AppError> {
    let new_level = RiskLevel::parse(&req.new_level)?;
    let evaluation = state.service.override_evaluation(
        &caller.actor(),
        EvaluationId::from(id),
        req.version,
        new_level,
        &req.justification,
    )?;
    Ok(Json(evaluation))
}

/// POST /api/evaluations/{id}/approve — Approve and write the risk back
/// to the dossier (officer only).
#[utoipa::path(
    post,
    path = "/api/evaluations/{id}/approve",
    request_body = EvaluationVersionRequest,
    responses(
        (status = 200, description = "Evaluation approved"),
        (status = 403, description = "Caller is not the compliance officer"),
    ),
    tag = "evaluations"
)]
pub async fn approve_evaluation(
    State(state): State<AppState>,
    caller: CallerIdentity,
    Path(id): Path<Uuid>,
    Json(req): Json<EvaluationVersionRequest>,
) -> Result<Json<RiskEvaluation>, AppError> {
    let evaluation =
        state
            .service
            .approve_evaluation(&caller.actor(), EvaluationId::from(id), req.version)?;
    Ok(Json(evaluation))
}

/// POST /api/evaluations/{id}/reject — Reject (officer only, reason
/// mandatory).
#[utoipa::path(
    post,
    path = "/api/evaluations/{id}/reject",
    request_body = EvaluationReasonRequest,
    responses((status = 200, description = "Evaluation rejected")),
    tag = "evaluations"
)]
pub async fn reject_evaluation(
    State(state): State<AppState>,
    caller: CallerIdentity,
    Path(id): Path<Uuid>,
    Json(req): Json<EvaluationReasonRequest>,
) -> Result<Json<RiskEvaluation>, AppError> {
    let evaluation = state.service.reject_evaluation(
        &caller.actor(),
        EvaluationId::from(id),
        req.version,
        &req.reason,
    )?;
    Ok(Json(evaluation))
}
