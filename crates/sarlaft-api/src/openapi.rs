//! # OpenAPI Specification Assembly
//!
//! Assembles the utoipa-documented routes into a single spec served at
//! `/openapi.json`.

use axum::routing::get;
use axum::{Json, Router};
use utoipa::OpenApi;

use crate::state::AppState;

/// Assembled OpenAPI spec for the API surface.
#[derive(OpenApi)]
#[openapi(
    info(
        title = "SARLAFT Stack API",
        version = "0.2.0",
        description = "AML/KYC case management core: dossier review lifecycle, risk evaluations with PEP escalation, PEP declarations and enhanced measures, alert lifecycle, and the append-only audit ledger.",
        license(name = "BUSL-1.1")
    ),
    paths(
        // Dossiers
        crate::routes::dossiers::create_dossier,
        crate::routes::dossiers::list_dossiers,
        crate::routes::dossiers::get_dossier,
        crate::routes::dossiers::update_completeness,
        crate::routes::dossiers::submit_dossier,
        crate::routes::dossiers::approve_dossier,
        crate::routes::dossiers::reject_dossier,
        crate::routes::dossiers::request_info,
        crate::routes::dossiers::reopen_dossier,
        crate::routes::dossiers::dossier_history,
        // Evaluations
        crate::routes::evaluations::start_evaluation,
        crate::routes::evaluations::get_evaluation,
        crate::routes::evaluations::submit_evaluation,
        crate::routes::evaluations::override_evaluation,
        crate::routes::evaluations::approve_evaluation,
        crate::routes::evaluations::reject_evaluation,
        // PEP
        crate::routes::pep::declare,
        crate::routes::pep::get_declaration,
        crate::routes::pep::submit_declaration,
        crate::routes::pep::approve_declaration,
        crate::routes::pep::add_relative,
        crate::routes::pep::advance_relative,
        crate::routes::pep::get_measures,
        crate::routes::pep::update_measures,
        crate::routes::pep::approve_measures,
        crate::routes::pep::change_condition,
        crate::routes::pep::declaration_history,
        // Alerts
        crate::routes::alerts::list_alerts,
        crate::routes::alerts::create_alert,
        crate::routes::alerts::get_alert,
        crate::routes::alerts::track_alert,
        crate::routes::alerts::attend_alert,
        crate::routes::alerts::close_alert,
        // Audit
        crate::routes::audit::query_events,
        crate::routes::audit::verify_chain,
    ),
    components(schemas(
        crate::error::ErrorBody,
        crate::error::ErrorDetail,
        crate::routes::dossiers::CreateDossierRequest,
        crate::routes::dossiers::VersionRequest,
        crate::routes::dossiers::CompletenessRequest,
        crate::routes::dossiers::ReasonRequest,
        crate::routes::evaluations::FactorDto,
        crate::routes::evaluations::StartEvaluationRequest,
        crate::routes::evaluations::EvaluationVersionRequest,
        crate::routes::evaluations::OverrideRequest,
        crate::routes::evaluations::EvaluationReasonRequest,
        crate::routes::pep::DeclareRequest,
        crate::routes::pep::DeclarationVersionRequest,
        crate::routes::pep::RelativeRequest,
        crate::routes::pep::ToggleDto,
        crate::routes::pep::MeasureSetDto,
        crate::routes::pep::MeasuresUpdateRequest,
        crate::routes::pep::ConditionChangeRequest,
        crate::routes::alerts::CreateAlertRequest,
        crate::routes::alerts::TrackingRequest,
        crate::routes::alerts::CloseAlertRequest,
        crate::routes::audit::ChainStatus,
    ))
)]
pub struct ApiDoc;

/// Build the OpenAPI router.
pub fn router() -> Router<AppState> {
    Router::new().route("/openapi.json", get(serve_openapi))
}

async fn serve_openapi() -> Json<utoipa::openapi::OpenApi> {
    Json(ApiDoc::openapi())
}
