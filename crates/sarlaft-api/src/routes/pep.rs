//! # PEP Declaration Routes
//!
//! Declaration lifecycle, linked relatives, condition changes, and the
//! enhanced due-diligence measures checklist.

use axum::extract::{Path, State};
use axum::routing::{get, post, put};
use axum::{Json, Router};
use serde::Deserialize;
use utoipa::ToSchema;
use uuid::Uuid;

use sarlaft_core::{DeclarationId, DossierId, RelativeId};
use sarlaft_engine::{
    EnhancedMeasures, MeasureSet, MeasureToggle, PepCondition, PepDeclaration, PepSeniority,
};
use sarlaft_ledger::AuditEvent;
use sarlaft_service::DeclarePepParams;

use crate::auth::CallerIdentity;
use crate::error::AppError;
use crate::state::AppState;

/// Record a PEP declaration.
#[derive(Debug, Deserialize, ToSchema)]
pub struct DeclareRequest {
    /// The dossier the declaration covers.
    pub dossier_id: Uuid,
    /// Condition tag (`NO_PEP`, `CURRENT_PEP`, `FORMER_PEP`, `RELATED_PEP`).
    pub condition: String,
    /// Seniority tag (`ORDINARIO`, `ALTO_NIVEL`); defaults to ordinary.
    #[serde(default)]
    pub seniority: Option<String>,
    /// Kind of office or function.
    #[serde(default)]
    pub pep_type: Option<String>,
    /// Country of the office.
    #[serde(default)]
    pub country: Option<String>,
    /// Relationship kind, for `RELATED_PEP`.
    #[serde(default)]
    pub relationship_type: Option<String>,
    /// Where the classification information came from.
    #[serde(default)]
    pub information_source: String,
    /// Why the subject is classified this way.
    #[serde(default)]
    pub justification: String,
}

/// Expected version of the declaration being mutated.
#[derive(Debug, Deserialize, ToSchema)]
pub struct DeclarationVersionRequest {
    /// The version the caller last read.
    pub version: u64,
}

/// Link a relative/associate.
#[derive(Debug, Deserialize, ToSchema)]
pub struct RelativeRequest {
    /// The version the caller last read.
    pub version: u64,
    /// Full name as registered.
    pub full_name: String,
    /// Relationship to the subject.
    pub relationship: String,
}

/// One measure toggle as submitted by the client.
#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct ToggleDto {
    /// Whether the control is active.
    #[serde(default)]
    pub enabled: bool,
    /// Free-text application detail.
    #[serde(default)]
    pub detail: Option<String>,
    /// Application frequency.
    #[serde(default)]
    pub frequency: Option<String>,
}

impl From<ToggleDto> for MeasureToggle {
    fn from(dto: ToggleDto) -> Self {
        MeasureToggle {
            enabled: dto.enabled,
            detail: dto.detail,
            frequency: dto.frequency,
        }
    }
}

/// The measures checklist as submitted by the client.
#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct MeasureSetDto {
    /// Funds-origin verification control.
    #[serde(default)]
    pub funds_origin_verification: ToggleDto,
    /// Expanded screening control.
    #[serde(default)]
    pub expanded_screening: ToggleDto,
    /// Intensified monitoring control.
    #[serde(default)]
    pub intensified_monitoring: ToggleDto,
    /// Additional documentation control.
    #[serde(default)]
    pub additional_documentation: ToggleDto,
    /// Periodic update control.
    #[serde(default)]
    pub periodic_update: ToggleDto,
}

impl From<MeasureSetDto> for MeasureSet {
    fn from(dto: MeasureSetDto) -> Self {
        MeasureSet {
            funds_origin_verification: dto.funds_origin_verification.into(),
            expanded_screening: dto.expanded_screening.into(),
            intensified_monitoring: dto.intensified_monitoring.into(),
            additional_documentation: dto.additional_documentation.into(),
            periodic_update: dto.periodic_update.into(),
        }
    }
}

/// Replace the measures checklist.
#[derive(Debug, Deserialize, ToSchema)]
pub struct MeasuresUpdateRequest {
    /// The version the caller last read.
    pub version: u64,
    /// The new checklist.
    pub measures: MeasureSetDto,
    /// Mandatory justification.
    pub justification: String,
}

/// Record a condition change.
#[derive(Debug, Deserialize, ToSchema)]
pub struct ConditionChangeRequest {
    /// The version the caller last read.
    pub version: u64,
    /// New condition tag.
    pub condition: String,
    /// New seniority tag; defaults to ordinary.
    #[serde(default)]
    pub seniority: Option<String>,
    /// Mandatory justification.
    pub justification: String,
    /// Updated information source.
    #[serde(default)]
    pub information_source: String,
}

fn parse_seniority(tag: &Option<String>) -> Result<PepSeniority, AppError> {
    match tag {
        Some(tag) => Ok(PepSeniority::parse(tag)?),
        None => Ok(PepSeniority::Ordinario),
    }
}

/// Build the PEP router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/pep/declarations", post(declare))
        .route("/api/pep/declarations/:id", get(get_declaration))
        .route("/api/pep/declarations/:id/submit", post(submit_declaration))
        .route("/api/pep/declarations/:id/approve", post(approve_declaration))
        .route("/api/pep/declarations/:id/relatives", post(add_relative))
        .route(
            "/api/pep/declarations/:id/relatives/:relative_id/advance",
            post(advance_relative),
        )
        .route(
            "/api/pep/declarations/:id/enhanced-measures",
            get(get_measures).put(update_measures),
        )
        .route(
            "/api/pep/declarations/:id/enhanced-measures/approve",
            post(approve_measures),
        )
        .route("/api/pep/declarations/:id/condition", post(change_condition))
        .route("/api/pep/declarations/:id/history", get(declaration_history))
}

/// POST /api/pep/declarations — Record a declaration; an exposed
/// condition escalates risk and raises a PEP alert in the same
/// transaction.
#[utoipa::path(
    post,
    path = "/api/pep/declarations",
    request_body = DeclareRequest,
    responses(
        (status = 200, description = "Declaration recorded"),
        (status = 422, description = "Missing justification or source"),
    ),
    tag = "pep"
)]
pub async fn declare(
    State(state): State<AppState>,
    caller: CallerIdentity,
    Json(req): Json<DeclareRequest>,
) -> Result<Json<PepDeclaration>, AppError> {
    let params = DeclarePepParams {
        dossier_id: DossierId::from(req.dossier_id),
        condition: PepCondition::parse(&req.condition)?,
        seniority: parse_seniority(&req.seniority)?,
        pep_type: req.pep_type,
        country: req.country,
        relationship_type: req.relationship_type,
        information_source: req.information_source,
        justification: req.justification,
    };
    let declaration = state.service.declare_pep(&caller.actor(), params)?;
    Ok(Json(declaration))
}

/// GET /api/pep/declarations/{id} — Fetch one declaration.
#[utoipa::path(
    get,
    path = "/api/pep/declarations/{id}",
    responses(
        (status = 200, description = "Declaration"),
        (status = 404, description = "Declaration not found"),
    ),
    tag = "pep"
)]
pub async fn get_declaration(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<PepDeclaration>, AppError> {
    Ok(Json(state.service.get_declaration(DeclarationId::from(id))?))
}

/// POST /api/pep/declarations/{id}/submit — Queue a draft for approval.
#[utoipa::path(
    post,
    path = "/api/pep/declarations/{id}/submit",
    request_body = DeclarationVersionRequest,
    responses(
        (status = 200, description = "Declaration pending approval"),
        (status = 422, description = "RELATED_PEP without linked relatives"),
    ),
    tag = "pep"
)]
pub async fn submit_declaration(
    State(state): State<AppState>,
    caller: CallerIdentity,
    Path(id): Path<Uuid>,
    Json(req): Json<DeclarationVersionRequest>,
) -> Result<Json<PepDeclaration>, AppError> {
    let declaration =
        state
            .service
            .submit_declaration(&caller.actor(), DeclarationId::from(id), req.version)?;
    Ok(Json(declaration))
}

/// POST /api/pep/declarations/{id}/approve — Approve (officer only);
/// auto-creates the measures baseline if absent.
#[utoipa::path(
    post,
    path = "/api/pep/declarations/{id}/approve",
    request_body = DeclarationVersionRequest,
    responses(
        (status = 200, description = "Declaration approved"),
        (status = 403, description = "Caller is not the compliance officer"),
    ),
    tag = "pep"
)]
pub async fn approve_declaration(
    State(state): State<AppState>,
    caller: CallerIdentity,
    Path(id): Path<Uuid>,
    Json(req): Json<DeclarationVersionRequest>,
) -> Result<Json<PepDeclaration>, AppError> {
    let declaration =
        state
            .service
            .approve_declaration(&caller.actor(), DeclarationId::from(id), req.version)?;
    Ok(Json(declaration))
}

/// POST /api/pep/declarations/{id}/relatives — Link a relative.
#[utoipa::path(
    post,
    path = "/api/pep/declarations/{id}/relatives",
    request_body = RelativeRequest,
    responses((status = 200, description = "Relative linked")),
    tag = "pep"
)]
pub async fn add_relative(
    State(state): State<AppState>,
    caller: CallerIdentity,
    Path(id): Path<Uuid>,
    Json(req): Json<RelativeRequest>,
) -> Result<Json<PepDeclaration>, AppError> {
    let declaration = state.service.add_relative(
        &caller.actor(),
        DeclarationId::from(id),
        req.version,
        &req.full_name,
        &req.relationship,
    )?;
    Ok(Json(declaration))
}

/// POST /api/pep/declarations/{id}/relatives/{relative_id}/advance —
/// Advance a relative's review state.
#[utoipa::path(
    post,
    path = "/api/pep/declarations/{id}/relatives/{relative_id}/advance",
    request_body = DeclarationVersionRequest,
    responses((status = 200, description = "Relative advanced")),
    tag = "pep"
)]
pub async fn advance_relative(
    State(state): State<AppState>,
    caller: CallerIdentity,
    Path((id, relative_id)): Path<(Uuid, Uuid)>,
    Json(req): Json<DeclarationVersionRequest>,
) -> Result<Json<PepDeclaration>, AppError> {
    let declaration = state.service.advance_relative(
        &caller.actor(),
        DeclarationId::from(id),
        req.version,
        RelativeId::from(relative_id),
    )?;
    Ok(Json(declaration))
}

/// GET /api/pep/declarations/{id}/enhanced-measures — Fetch the checklist.
#[utoipa::path(
    get,
    path = "/api/pep/declarations/{id}/enhanced-measures",
    responses(
        (status = 200, description = "Enhanced measures"),
        (status = 404, description = "No measures for this declaration"),
    ),
    tag = "pep"
)]
pub async fn get_measures(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<EnhancedMeasures>, AppError> {
    Ok(Json(state.service.get_measures(DeclarationId::from(id))?))
}

/// PUT /api/pep/declarations/{id}/enhanced-measures — Replace the
/// checklist (resets the officer sign-off).
#[utoipa::path(
    put,
    path = "/api/pep/declarations/{id}/enhanced-measures",
    request_body = MeasuresUpdateRequest,
    responses((status = 200, description = "Measures updated")),
    tag = "pep"
)]
pub async fn update_measures(
    State(state): State<AppState>,
    caller: CallerIdentity,
    Path(id): Path<Uuid>,
    Json(req): Json<MeasuresUpdateRequest>,
) -> Result<Json<EnhancedMeasures>, AppError> {
    let measures = state.service.update_measures(
        &caller.actor(),
        DeclarationId::from(id),
        req.version,
        req.measures.into(),
        &req.justification,
    )?;
    Ok(Json(measures))
}

/// POST /api/pep/declarations/{id}/enhanced-measures/approve — Officer
/// sign-off over the current checklist.
#[utoipa::path(
    post,
    path = "/api/pep/declarations/{id}/enhanced-measures/approve",
    request_body = DeclarationVersionRequest,
    responses(
        (status = 200, description = "Measures signed off"),
        (status = 403, description = "Caller is not the compliance officer"),
    ),
    tag = "pep"
)]
pub async fn approve_measures(
    State(state): State<AppState>,
    caller: CallerIdentity,
    Path(id): Path<Uuid>,
    Json(req): Json<DeclarationVersionRequest>,
) -> Result<Json<EnhancedMeasures>, AppError> {
    let measures =
        state
            .service
            .approve_measures(&caller.actor(), DeclarationId::from(id), req.version)?;
    Ok(Json(measures))
}

/// POST /api/pep/declarations/{id}/condition — Record a condition change
/// (append-only history; re-enters approval).
#[utoipa::path(
    post,
    path = "/api/pep/declarations/{id}/condition",
    request_body = ConditionChangeRequest,
    responses((status = 200, description = "Condition changed")),
    tag = "pep"
)]
pub async fn change_condition(
    State(state): State<AppState>,
    caller: CallerIdentity,
    Path(id): Path<Uuid>,
    Json(req): Json<ConditionChangeRequest>,
) -> Result<Json<PepDeclaration>, AppError> {
    let declaration = state.service.change_pep_condition(
        &caller.actor(),
        DeclarationId::from(id),
        req.version,
        PepCondition::parse(&req.condition)?,
        parse_seniority(&req.seniority)?,
        &req.justification,
        &req.information_source,
    )?;
    Ok(Json(declaration))
}

/// GET /api/pep/declarations/{id}/history — Ledger events for this
/// declaration, newest first.
#[utoipa::path(
    get,
    path = "/api/pep/declarations/{id}/history",
    responses((status = 200, description = "Declaration history")),
    tag = "pep"
)]
pub async fn declaration_history(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Json<Vec<AuditEvent>> {
    Json(
        state
            .service
            .entity_history(&DeclarationId::from(id).to_string()),
    )
}
