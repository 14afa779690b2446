//! # Case Service
//!
//! The single entry point UI actions dispatch into. Each mutating operation:
//!
//! 1. takes the transaction guard (the ledger lock),
//! 2. loads the aggregate and checks the caller's expected version,
//! 3. applies the engine transition on a working copy,
//! 4. appends the audit event(s),
//! 5. publishes the copy through the repository's versioned save.
//!
//! A failed step returns before anything is published, so a rejected
//! operation leaves entities and ledger exactly as they were. Cross-module
//! effects — PEP escalation of the dossier's risk, the `PEP_DETECTED`
//! alert, the risk write-back on evaluation approval, the auto-created
//! enhanced-measures baseline — run inside the same transaction as the
//! operation that triggers them.
//!
//! Reads never take the transaction guard (ledger queries take it only long
//! enough to copy matching events out).

use std::sync::Arc;

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};

use sarlaft_core::{
    ActorRef, AlertId, DeclarationId, DossierId, EvaluationId, RelativeId, RulesError,
};
use sarlaft_engine::{
    pep_escalation_floor, Alert, AlertClassification, AlertLevel, AlertType, DeclarationStatus,
    Dossier, EnhancedMeasures, EvaluationType, MeasureSet, PepCondition, PepDeclaration,
    PepSeniority, RiskEngine, RiskEvaluation, RiskFactor, RiskPolicy, SubjectType,
};
use sarlaft_ledger::{
    AuditEvent, AuditLedger, AuditModule, EntityKind, EventDraft, LedgerError, LedgerQuery,
};

use crate::memory::{
    InMemoryAlertRepository, InMemoryDeclarationRepository, InMemoryDossierRepository,
    InMemoryEvaluationRepository, InMemoryMeasuresRepository,
};
use crate::ports::{
    AlertRepository, DeclarationRepository, DossierRepository, EvaluationRepository,
    MeasuresRepository, Versioned,
};

/// Everything needed to record a PEP declaration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeclarePepParams {
    /// The dossier the declaration covers.
    pub dossier_id: DossierId,
    /// Political-exposure condition.
    pub condition: PepCondition,
    /// Seniority of the office held.
    #[serde(default)]
    pub seniority: PepSeniority,
    /// Kind of office or function.
    #[serde(default)]
    pub pep_type: Option<String>,
    /// Country of the office.
    #[serde(default)]
    pub country: Option<String>,
    /// Relationship kind, when the condition is `RELATED_PEP`.
    #[serde(default)]
    pub relationship_type: Option<String>,
    /// Where the classification information came from.
    #[serde(default)]
    pub information_source: String,
    /// Why the subject is classified this way.
    #[serde(default)]
    pub justification: String,
}

/// The case coordination service.
pub struct CaseService {
    dossiers: Arc<dyn DossierRepository>,
    evaluations: Arc<dyn EvaluationRepository>,
    declarations: Arc<dyn DeclarationRepository>,
    measures: Arc<dyn MeasuresRepository>,
    alerts: Arc<dyn AlertRepository>,
    engine: RiskEngine,
    /// Transaction guard: holding this lock makes an entity mutation and
    /// its ledger append one atomic step.
    ledger: Mutex<AuditLedger>,
}

impl CaseService {
    /// Assemble a service over the given storage adapters.
    pub fn new(
        dossiers: Arc<dyn DossierRepository>,
        evaluations: Arc<dyn EvaluationRepository>,
        declarations: Arc<dyn DeclarationRepository>,
        measures: Arc<dyn MeasuresRepository>,
        alerts: Arc<dyn AlertRepository>,
        policy: RiskPolicy,
    ) -> Result<Self, RulesError> {
        Ok(Self {
            dossiers,
            evaluations,
            declarations,
            measures,
            alerts,
            engine: RiskEngine::new(policy)?,
            ledger: Mutex::new(AuditLedger::new()),
        })
    }

    /// Assemble a service over fresh in-memory stores (reference setup and
    /// test double).
    pub fn in_memory(policy: RiskPolicy) -> Result<Self, RulesError> {
        Self::new(
            Arc::new(InMemoryDossierRepository::new()),
            Arc::new(InMemoryEvaluationRepository::new()),
            Arc::new(InMemoryDeclarationRepository::new()),
            Arc::new(InMemoryMeasuresRepository::new()),
            Arc::new(InMemoryAlertRepository::new()),
            policy,
        )
    }

    // ─── Dossier operations ──────────────────────────────────────────

    /// Open a new dossier.
    pub fn create_dossier(
        &self,
        actor: &ActorRef,
        subject_type: SubjectType,
    ) -> Result<Dossier, RulesError> {
        let mut ledger = self.ledger.lock();
        let dossier = Dossier::create(DossierId::new(), subject_type, actor)?;
        append(
            &mut ledger,
            EventDraft {
                actor: actor.clone(),
                entity_kind: EntityKind::Dossier,
                entity_id: dossier.id.to_string(),
                previous_state: None,
                new_state: dossier.status.as_str().to_string(),
                justification: None,
                module: AuditModule::Dossiers,
            },
        )?;
        self.dossiers.insert(&dossier)?;
        tracing::info!(dossier = %dossier.id, subject = %subject_type, "dossier created");
        Ok(dossier)
    }

    /// Fetch a dossier.
    pub fn get_dossier(&self, id: DossierId) -> Result<Dossier, RulesError> {
        self.dossiers.get(id)
    }

    /// All dossiers.
    pub fn list_dossiers(&self) -> Vec<Dossier> {
        self.dossiers.list()
    }

    /// Record a new completeness percentage.
    pub fn update_completeness(
        &self,
        actor: &ActorRef,
        id: DossierId,
        expected_version: u64,
        pct: u8,
    ) -> Result<Dossier, RulesError> {
        let mut ledger = self.ledger.lock();
        let mut dossier = self.loaded_dossier(id, expected_version)?;
        let status = dossier.status;
        dossier.update_completeness(actor, pct)?;
        append(
            &mut ledger,
            EventDraft {
                actor: actor.clone(),
                entity_kind: EntityKind::Dossier,
                entity_id: dossier.id.to_string(),
                previous_state: Some(status.as_str().to_string()),
                new_state: status.as_str().to_string(),
                justification: Some(format!("completeness updated to {pct}%")),
                module: AuditModule::Dossiers,
            },
        )?;
        self.dossiers.save(&dossier, expected_version)?;
        Ok(dossier)
    }

    /// Submit a dossier for review.
    pub fn submit_dossier(
        &self,
        actor: &ActorRef,
        id: DossierId,
        expected_version: u64,
    ) -> Result<Dossier, RulesError> {
        self.dossier_transition(actor, id, expected_version, None, |dossier, actor| {
            dossier.submit_for_review(actor)
        })
    }

    /// Approve a dossier. Officer only.
    pub fn approve_dossier(
        &self,
        actor: &ActorRef,
        id: DossierId,
        expected_version: u64,
    ) -> Result<Dossier, RulesError> {
        self.dossier_transition(actor, id, expected_version, None, |dossier, actor| {
            dossier.approve(actor)
        })
    }

    /// Reject a dossier with observations. Officer only, reason mandatory.
    pub fn reject_dossier(
        &self,
        actor: &ActorRef,
        id: DossierId,
        expected_version: u64,
        reason: &str,
    ) -> Result<Dossier, RulesError> {
        self.dossier_transition(
            actor,
            id,
            expected_version,
            Some(reason.to_string()),
            |dossier, actor| dossier.reject(actor, reason),
        )
    }

    /// Send a dossier back for more information. Officer only, reason
    /// mandatory.
    pub fn request_dossier_info(
        &self,
        actor: &ActorRef,
        id: DossierId,
        expected_version: u64,
        reason: &str,
    ) -> Result<Dossier, RulesError> {
        self.dossier_transition(
            actor,
            id,
            expected_version,
            Some(reason.to_string()),
            |dossier, actor| dossier.request_info(actor, reason),
        )
    }

    /// Reopen an approved dossier for a new review cycle.
    pub fn reopen_dossier(
        &self,
        actor: &ActorRef,
        id: DossierId,
        expected_version: u64,
        reason: &str,
    ) -> Result<Dossier, RulesError> {
        self.dossier_transition(
            actor,
            id,
            expected_version,
            Some(reason.to_string()),
            |dossier, actor| dossier.reopen(actor, reason),
        )
    }

    /// Shared shape of the pure dossier status transitions.
    fn dossier_transition(
        &self,
        actor: &ActorRef,
        id: DossierId,
        expected_version: u64,
        justification: Option<String>,
        apply: impl FnOnce(&mut Dossier, &ActorRef) -> Result<(), RulesError>,
    ) -> Result<Dossier, RulesError> {
        let mut ledger = self.ledger.lock();
        let mut dossier = self.loaded_dossier(id, expected_version)?;
        let previous = dossier.status;
        apply(&mut dossier, actor)?;
        append(
            &mut ledger,
            EventDraft {
                actor: actor.clone(),
                entity_kind: EntityKind::Dossier,
                entity_id: dossier.id.to_string(),
                previous_state: Some(previous.as_str().to_string()),
                new_state: dossier.status.as_str().to_string(),
                justification,
                module: AuditModule::Dossiers,
            },
        )?;
        self.dossiers.save(&dossier, expected_version)?;
        tracing::info!(
            dossier = %dossier.id,
            from = %previous,
            to = %dossier.status,
            actor = %actor,
            "dossier transition"
        );
        Ok(dossier)
    }

    // ─── Evaluation operations ───────────────────────────────────────

    /// Run a scoring pass over a dossier. The new evaluation starts in
    /// `DRAFT` at the next revision number.
    pub fn start_evaluation(
        &self,
        actor: &ActorRef,
        dossier_id: DossierId,
        evaluation_type: EvaluationType,
        factors: Vec<RiskFactor>,
    ) -> Result<RiskEvaluation, RulesError> {
        let mut ledger = self.ledger.lock();
        let dossier = self.dossiers.get(dossier_id)?;
        let pep = self.declarations.find_by_dossier(dossier_id);
        let revision = self.evaluations.list_for_dossier(dossier_id).len() as u32 + 1;
        let evaluation = self.engine.evaluate(
            &dossier,
            pep.as_ref(),
            evaluation_type,
            factors,
            revision,
            actor,
        )?;
        append(
            &mut ledger,
            EventDraft {
                actor: actor.clone(),
                entity_kind: EntityKind::RiskEvaluation,
                entity_id: evaluation.id.to_string(),
                previous_state: None,
                new_state: evaluation.status.as_str().to_string(),
                justification: Some(format!(
                    "revision {} ({}) scored {:.2} -> {}",
                    revision,
                    evaluation.evaluation_type,
                    evaluation.total_score,
                    evaluation.final_level
                )),
                module: AuditModule::RiskEvaluations,
            },
        )?;
        self.evaluations.insert(&evaluation)?;
        Ok(evaluation)
    }

    /// Fetch an evaluation.
    pub fn get_evaluation(&self, id: EvaluationId) -> Result<RiskEvaluation, RulesError> {
        self.evaluations.get(id)
    }

    /// All evaluations of a dossier, in revision order.
    pub fn list_evaluations(&self, dossier_id: DossierId) -> Vec<RiskEvaluation> {
        self.evaluations.list_for_dossier(dossier_id)
    }

    /// Queue a draft evaluation for approval.
    pub fn submit_evaluation(
        &self,
        actor: &ActorRef,
        id: EvaluationId,
        expected_version: u64,
    ) -> Result<RiskEvaluation, RulesError> {
        let mut ledger = self.ledger.lock();
        let mut evaluation = self.loaded_evaluation(id, expected_version)?;
        let previous = evaluation.status;
        evaluation.submit(actor)?;
        append(
            &mut ledger,
            EventDraft {
                actor: actor.clone(),
                entity_kind: EntityKind::RiskEvaluation,
                entity_id: evaluation.id.to_string(),
                previous_state: Some(previous.as_str().to_string()),
                new_state: evaluation.status.as_str().to_string(),
                justification: None,
                module: AuditModule::RiskEvaluations,
            },
        )?;
        self.evaluations.save(&evaluation, expected_version)?;
        Ok(evaluation)
    }

    /// Override an evaluation's level, recording both the preliminary and
    /// the overridden value.
    pub fn override_evaluation(
        &self,
        actor: &ActorRef,
        id: EvaluationId,
        expected_version: u64,
        new_level: sarlaft_engine::RiskLevel,
        justification: &str,
    ) -> Result<RiskEvaluation, RulesError> {
        let mut ledger = self.ledger.lock();
        let mut evaluation = self.loaded_evaluation(id, expected_version)?;
        let preliminary = evaluation.preliminary_level;
        evaluation.apply_manual_override(actor, new_level, justification)?;
        append(
            &mut ledger,
            EventDraft {
                actor: actor.clone(),
                entity_kind: EntityKind::RiskEvaluation,
                entity_id: evaluation.id.to_string(),
                previous_state: Some(preliminary.as_str().to_string()),
                new_state: new_level.as_str().to_string(),
                justification: Some(justification.to_string()),
                module: AuditModule::RiskEvaluations,
            },
        )?;
        self.evaluations.save(&evaluation, expected_version)?;
        Ok(evaluation)
    }

    /// Approve an evaluation and write the derived risk back to the
    /// dossier. Officer only.
    pub fn approve_evaluation(
        &self,
        actor: &ActorRef,
        id: EvaluationId,
        expected_version: u64,
    ) -> Result<RiskEvaluation, RulesError> {
        let mut ledger = self.ledger.lock();
        let mut evaluation = self.loaded_evaluation(id, expected_version)?;
        let previous = evaluation.status;
        evaluation.approve(actor)?;
        append(
            &mut ledger,
            EventDraft {
                actor: actor.clone(),
                entity_kind: EntityKind::RiskEvaluation,
                entity_id: evaluation.id.to_string(),
                previous_state: Some(previous.as_str().to_string()),
                new_state: evaluation.status.as_str().to_string(),
                justification: None,
                module: AuditModule::RiskEvaluations,
            },
        )?;

        // Derived write-back: the dossier's risk comes from its approved
        // evaluation, never from a direct caller mutation.
        let mut dossier = self.dossiers.get(evaluation.dossier_id)?;
        let stored_version = dossier.version;
        let previous_level = dossier.risk_level;
        dossier.apply_risk_profile(actor, evaluation.final_level, evaluation.total_score);
        append(
            &mut ledger,
            EventDraft {
                actor: actor.clone(),
                entity_kind: EntityKind::Dossier,
                entity_id: dossier.id.to_string(),
                previous_state: Some(previous_level.as_str().to_string()),
                new_state: evaluation.final_level.as_str().to_string(),
                justification: Some(format!(
                    "risk profile from evaluation revision {}",
                    evaluation.revision
                )),
                module: AuditModule::Dossiers,
            },
        )?;
        self.dossiers.save(&dossier, stored_version)?;
        self.evaluations.save(&evaluation, expected_version)?;
        Ok(evaluation)
    }

    /// Reject an evaluation. Officer only, reason mandatory.
    pub fn reject_evaluation(
        &self,
        actor: &ActorRef,
        id: EvaluationId,
        expected_version: u64,
        reason: &str,
    ) -> Result<RiskEvaluation, RulesError> {
        let mut ledger = self.ledger.lock();
        let mut evaluation = self.loaded_evaluation(id, expected_version)?;
        let previous = evaluation.status;
        evaluation.reject(actor, reason)?;
        append(
            &mut ledger,
            EventDraft {
                actor: actor.clone(),
                entity_kind: EntityKind::RiskEvaluation,
                entity_id: evaluation.id.to_string(),
                previous_state: Some(previous.as_str().to_string()),
                new_state: evaluation.status.as_str().to_string(),
                justification: Some(reason.to_string()),
                module: AuditModule::RiskEvaluations,
            },
        )?;
        self.evaluations.save(&evaluation, expected_version)?;
        Ok(evaluation)
    }

    // ─── PEP operations ──────────────────────────────────────────────

    /// Record a PEP declaration. An exposed condition synchronously
    /// escalates the dossier's risk and raises a `PEP_DETECTED` alert at
    /// `ALTA` in the same transaction.
    pub fn declare_pep(
        &self,
        actor: &ActorRef,
        params: DeclarePepParams,
    ) -> Result<PepDeclaration, RulesError> {
        let mut ledger = self.ledger.lock();
        let dossier = self.dossiers.get(params.dossier_id)?;
        let declaration = PepDeclaration::declare(
            DeclarationId::new(),
            params.dossier_id,
            params.condition,
            params.seniority,
            params.pep_type,
            params.country,
            params.relationship_type,
            &params.information_source,
            &params.justification,
            actor,
        )?;
        append(
            &mut ledger,
            EventDraft {
                actor: actor.clone(),
                entity_kind: EntityKind::PepDeclaration,
                entity_id: declaration.id.to_string(),
                previous_state: None,
                new_state: declaration.status.as_str().to_string(),
                justification: declaration.condition.is_exposed().then(|| {
                    format!("{}: {}", declaration.condition, declaration.justification)
                }),
                module: AuditModule::PepDeclarations,
            },
        )?;
        self.declarations.insert(&declaration)?;

        if declaration.requires_escalation() {
            // An officer's declaration is approved on the spot, so the
            // measures baseline it would get at approval is created now.
            if declaration.status == DeclarationStatus::Approved {
                self.ensure_measures_baseline(&mut ledger, actor, declaration.id)?;
            }
            self.escalate_for_pep(&mut ledger, actor, dossier, &declaration)?;
        }
        Ok(declaration)
    }

    /// Fetch a declaration.
    pub fn get_declaration(&self, id: DeclarationId) -> Result<PepDeclaration, RulesError> {
        self.declarations.get(id)
    }

    /// The declaration covering a dossier, if one exists.
    pub fn find_declaration(&self, dossier_id: DossierId) -> Option<PepDeclaration> {
        self.declarations.find_by_dossier(dossier_id)
    }

    /// Queue a draft declaration for approval.
    pub fn submit_declaration(
        &self,
        actor: &ActorRef,
        id: DeclarationId,
        expected_version: u64,
    ) -> Result<PepDeclaration, RulesError> {
        let mut ledger = self.ledger.lock();
        let mut declaration = self.loaded_declaration(id, expected_version)?;
        let previous = declaration.status;
        declaration.submit_for_approval(actor)?;
        append(
            &mut ledger,
            EventDraft {
                actor: actor.clone(),
                entity_kind: EntityKind::PepDeclaration,
                entity_id: declaration.id.to_string(),
                previous_state: Some(previous.as_str().to_string()),
                new_state: declaration.status.as_str().to_string(),
                justification: None,
                module: AuditModule::PepDeclarations,
            },
        )?;
        self.declarations.save(&declaration, expected_version)?;
        Ok(declaration)
    }

    /// Approve a declaration. Officer only. An enhanced-measures baseline
    /// is auto-created first if none exists yet.
    pub fn approve_declaration(
        &self,
        actor: &ActorRef,
        id: DeclarationId,
        expected_version: u64,
    ) -> Result<PepDeclaration, RulesError> {
        let mut ledger = self.ledger.lock();
        let mut declaration = self.loaded_declaration(id, expected_version)?;

        if declaration.requires_escalation() {
            self.ensure_measures_baseline(&mut ledger, actor, id)?;
        }

        let previous = declaration.status;
        declaration.approve(actor)?;
        append(
            &mut ledger,
            EventDraft {
                actor: actor.clone(),
                entity_kind: EntityKind::PepDeclaration,
                entity_id: declaration.id.to_string(),
                previous_state: Some(previous.as_str().to_string()),
                new_state: declaration.status.as_str().to_string(),
                justification: None,
                module: AuditModule::PepDeclarations,
            },
        )?;
        self.declarations.save(&declaration, expected_version)?;
        Ok(declaration)
    }

    /// Link a relative/associate to a declaration.
    pub fn add_relative(
        &self,
        actor: &ActorRef,
        id: DeclarationId,
        expected_version: u64,
        full_name: &str,
        relationship: &str,
    ) -> Result<PepDeclaration, RulesError> {
        let mut ledger = self.ledger.lock();
        let mut declaration = self.loaded_declaration(id, expected_version)?;
        let relative_id = declaration.add_relative(actor, full_name, relationship)?;
        append(
            &mut ledger,
            EventDraft {
                actor: actor.clone(),
                entity_kind: EntityKind::PepRelative,
                entity_id: relative_id.to_string(),
                previous_state: None,
                new_state: "PENDING".to_string(),
                justification: Some(format!("linked to {}", declaration.id)),
                module: AuditModule::PepDeclarations,
            },
        )?;
        self.declarations.save(&declaration, expected_version)?;
        Ok(declaration)
    }

    /// Advance a relative's review state.
    pub fn advance_relative(
        &self,
        actor: &ActorRef,
        id: DeclarationId,
        expected_version: u64,
        relative_id: RelativeId,
    ) -> Result<PepDeclaration, RulesError> {
        let mut ledger = self.ledger.lock();
        let mut declaration = self.loaded_declaration(id, expected_version)?;
        let previous = declaration
            .relatives
            .iter()
            .find(|r| r.id == relative_id)
            .map(|r| r.evaluation_status.as_str().to_string());
        let next = declaration.advance_relative(actor, relative_id)?;
        append(
            &mut ledger,
            EventDraft {
                actor: actor.clone(),
                entity_kind: EntityKind::PepRelative,
                entity_id: relative_id.to_string(),
                previous_state: previous,
                new_state: next.as_str().to_string(),
                justification: None,
                module: AuditModule::PepDeclarations,
            },
        )?;
        self.declarations.save(&declaration, expected_version)?;
        Ok(declaration)
    }

    /// Record a condition change. Re-enters the approval flow, resets the
    /// measures sign-off, and fires escalation effects when the new
    /// condition is exposed.
    #[allow(clippy::too_many_arguments)]
    pub fn change_pep_condition(
        &self,
        actor: &ActorRef,
        id: DeclarationId,
        expected_version: u64,
        new_condition: PepCondition,
        new_seniority: PepSeniority,
        justification: &str,
        information_source: &str,
    ) -> Result<PepDeclaration, RulesError> {
        let mut ledger = self.ledger.lock();
        let mut declaration = self.loaded_declaration(id, expected_version)?;
        let previous_condition = declaration.condition;
        declaration.change_condition(
            actor,
            new_condition,
            new_seniority,
            justification,
            information_source,
        )?;
        append(
            &mut ledger,
            EventDraft {
                actor: actor.clone(),
                entity_kind: EntityKind::PepDeclaration,
                entity_id: declaration.id.to_string(),
                previous_state: Some(previous_condition.as_str().to_string()),
                new_state: new_condition.as_str().to_string(),
                justification: Some(justification.to_string()),
                module: AuditModule::PepDeclarations,
            },
        )?;

        // The officer sign-off covered the old condition; drop it.
        if let Some(mut measures) = self.measures.try_get(id) {
            if measures.compliance_officer_approval {
                let stored_version = measures.version;
                measures.reset_officer_approval();
                measures.version += 1;
                append(
                    &mut ledger,
                    EventDraft {
                        actor: actor.clone(),
                        entity_kind: EntityKind::EnhancedMeasures,
                        entity_id: measures.entity(),
                        previous_state: Some("APPROVED".to_string()),
                        new_state: "UNAPPROVED".to_string(),
                        justification: Some("condition changed; sign-off reset".to_string()),
                        module: AuditModule::EnhancedMeasures,
                    },
                )?;
                self.measures.save(&measures, stored_version)?;
            }
        }

        self.declarations.save(&declaration, expected_version)?;

        if declaration.requires_escalation() {
            // An officer's change is approved on the spot; make sure the
            // measures baseline exists just as on the approval path.
            if declaration.status == DeclarationStatus::Approved {
                self.ensure_measures_baseline(&mut ledger, actor, id)?;
            }
            let dossier = self.dossiers.get(declaration.dossier_id)?;
            self.escalate_for_pep(&mut ledger, actor, dossier, &declaration)?;
        }
        Ok(declaration)
    }

    /// Fetch the enhanced measures of a declaration.
    pub fn get_measures(&self, id: DeclarationId) -> Result<EnhancedMeasures, RulesError> {
        self.measures.get(id)
    }

    /// Replace a declaration's due-diligence checklist.
    pub fn update_measures(
        &self,
        actor: &ActorRef,
        id: DeclarationId,
        expected_version: u64,
        set: MeasureSet,
        justification: &str,
    ) -> Result<EnhancedMeasures, RulesError> {
        let mut ledger = self.ledger.lock();
        let mut measures = self.measures.get(id)?;
        require_version(&measures, expected_version, measures.entity())?;
        let previous = approval_label(&measures);
        measures.update(actor, set, justification)?;
        append(
            &mut ledger,
            EventDraft {
                actor: actor.clone(),
                entity_kind: EntityKind::EnhancedMeasures,
                entity_id: measures.entity(),
                previous_state: Some(previous.to_string()),
                new_state: "UNAPPROVED".to_string(),
                justification: Some(justification.to_string()),
                module: AuditModule::EnhancedMeasures,
            },
        )?;
        self.measures.save(&measures, expected_version)?;
        Ok(measures)
    }

    /// Officer sign-off over a declaration's measures.
    pub fn approve_measures(
        &self,
        actor: &ActorRef,
        id: DeclarationId,
        expected_version: u64,
    ) -> Result<EnhancedMeasures, RulesError> {
        let mut ledger = self.ledger.lock();
        let mut measures = self.measures.get(id)?;
        require_version(&measures, expected_version, measures.entity())?;
        measures.approve(actor)?;
        append(
            &mut ledger,
            EventDraft {
                actor: actor.clone(),
                entity_kind: EntityKind::EnhancedMeasures,
                entity_id: measures.entity(),
                previous_state: Some("UNAPPROVED".to_string()),
                new_state: "APPROVED".to_string(),
                justification: None,
                module: AuditModule::EnhancedMeasures,
            },
        )?;
        self.measures.save(&measures, expected_version)?;
        Ok(measures)
    }

    // ─── Alert operations ────────────────────────────────────────────

    /// Raise a user-originated alert.
    pub fn create_alert(
        &self,
        actor: &ActorRef,
        dossier_id: DossierId,
        alert_type: AlertType,
        level: AlertLevel,
    ) -> Result<Alert, RulesError> {
        let mut ledger = self.ledger.lock();
        // The dossier must exist.
        let _ = self.dossiers.get(dossier_id)?;
        let alert = Alert::manual(AlertId::new(), dossier_id, alert_type, level, actor)?;
        append(
            &mut ledger,
            EventDraft {
                actor: actor.clone(),
                entity_kind: EntityKind::Alert,
                entity_id: alert.id.to_string(),
                previous_state: None,
                new_state: alert.status.as_str().to_string(),
                justification: Some(format!("{} at {}", alert.alert_type, alert.level)),
                module: AuditModule::Alerts,
            },
        )?;
        self.alerts.insert(&alert)?;
        Ok(alert)
    }

    /// Fetch an alert.
    pub fn get_alert(&self, id: AlertId) -> Result<Alert, RulesError> {
        self.alerts.get(id)
    }

    /// All alerts.
    pub fn list_alerts(&self) -> Vec<Alert> {
        self.alerts.list()
    }

    /// All alerts raised against one dossier.
    pub fn list_alerts_for_dossier(&self, dossier_id: DossierId) -> Vec<Alert> {
        self.alerts.list_for_dossier(dossier_id)
    }

    /// Record a follow-up on an alert.
    pub fn follow_up_alert(
        &self,
        actor: &ActorRef,
        id: AlertId,
        expected_version: u64,
        comment: &str,
    ) -> Result<Alert, RulesError> {
        let mut ledger = self.ledger.lock();
        let mut alert = self.loaded_alert(id, expected_version)?;
        let previous = alert.status;
        alert.mark_follow_up(actor, comment)?;
        append(
            &mut ledger,
            EventDraft {
                actor: actor.clone(),
                entity_kind: EntityKind::Alert,
                entity_id: alert.id.to_string(),
                previous_state: Some(previous.as_str().to_string()),
                new_state: alert.status.as_str().to_string(),
                justification: Some(comment.to_string()),
                module: AuditModule::Alerts,
            },
        )?;
        self.alerts.save(&alert, expected_version)?;
        Ok(alert)
    }

    /// Conclude an alert's follow-up.
    pub fn attend_alert(
        &self,
        actor: &ActorRef,
        id: AlertId,
        expected_version: u64,
        comment: &str,
    ) -> Result<Alert, RulesError> {
        let mut ledger = self.ledger.lock();
        let mut alert = self.loaded_alert(id, expected_version)?;
        let previous = alert.status;
        alert.mark_attended(actor, comment)?;
        append(
            &mut ledger,
            EventDraft {
                actor: actor.clone(),
                entity_kind: EntityKind::Alert,
                entity_id: alert.id.to_string(),
                previous_state: Some(previous.as_str().to_string()),
                new_state: alert.status.as_str().to_string(),
                justification: Some(comment.to_string()),
                module: AuditModule::Alerts,
            },
        )?;
        self.alerts.save(&alert, expected_version)?;
        Ok(alert)
    }

    /// Close an alert. Officer only; irreversible.
    pub fn close_alert(
        &self,
        actor: &ActorRef,
        id: AlertId,
        expected_version: u64,
        reason: &str,
        classification: AlertClassification,
    ) -> Result<Alert, RulesError> {
        let mut ledger = self.ledger.lock();
        let mut alert = self.loaded_alert(id, expected_version)?;
        let previous = alert.status;
        alert.close(actor, reason, classification)?;
        append(
            &mut ledger,
            EventDraft {
                actor: actor.clone(),
                entity_kind: EntityKind::Alert,
                entity_id: alert.id.to_string(),
                previous_state: Some(previous.as_str().to_string()),
                new_state: alert.status.as_str().to_string(),
                justification: Some(format!("{classification}: {reason}")),
                module: AuditModule::Alerts,
            },
        )?;
        self.alerts.save(&alert, expected_version)?;
        tracing::info!(alert = %alert.id, %classification, "alert closed");
        Ok(alert)
    }

    // ─── Ledger queries ──────────────────────────────────────────────

    /// Events matching the query, newest first.
    pub fn query_audit(&self, query: &LedgerQuery) -> Vec<AuditEvent> {
        let ledger = self.ledger.lock();
        ledger.query(query).cloned().collect()
    }

    /// The full transition history of one entity, newest first.
    pub fn entity_history(&self, entity_id: &str) -> Vec<AuditEvent> {
        let ledger = self.ledger.lock();
        ledger.events_for_entity(entity_id).cloned().collect()
    }

    /// Number of ledger events.
    pub fn audit_len(&self) -> usize {
        self.ledger.lock().len()
    }

    /// Verify the ledger's digest chain end to end.
    pub fn verify_audit_chain(&self) -> Result<(), LedgerError> {
        self.ledger.lock().verify_chain()
    }

    // ─── Internals ───────────────────────────────────────────────────

    /// Create the all-off measures baseline for a declaration, if absent.
    fn ensure_measures_baseline(
        &self,
        ledger: &mut AuditLedger,
        actor: &ActorRef,
        declaration_id: DeclarationId,
    ) -> Result<(), RulesError> {
        if self.measures.try_get(declaration_id).is_some() {
            return Ok(());
        }
        let baseline = EnhancedMeasures::baseline(declaration_id, actor);
        append(
            ledger,
            EventDraft {
                actor: actor.clone(),
                entity_kind: EntityKind::EnhancedMeasures,
                entity_id: baseline.entity(),
                previous_state: None,
                new_state: "UNAPPROVED".to_string(),
                justification: Some(baseline.justification.clone()),
                module: AuditModule::EnhancedMeasures,
            },
        )?;
        self.measures.insert(&baseline)?;
        Ok(())
    }

    /// Escalation effects of an exposed PEP condition: flag the dossier,
    /// raise its risk to the escalation floor, and raise a `PEP_DETECTED`
    /// alert at `ALTA`. Runs under the caller's transaction guard.
    fn escalate_for_pep(
        &self,
        ledger: &mut AuditLedger,
        actor: &ActorRef,
        mut dossier: Dossier,
        declaration: &PepDeclaration,
    ) -> Result<(), RulesError> {
        let stored_version = dossier.version;
        dossier.mark_pep(actor);
        if let Some(floor) = pep_escalation_floor(declaration.condition, declaration.seniority) {
            if floor > dossier.risk_level {
                let previous_level = dossier.risk_level;
                dossier.apply_risk_profile(actor, floor, dossier.current_risk_score);
                append(
                    ledger,
                    EventDraft {
                        actor: actor.clone(),
                        entity_kind: EntityKind::Dossier,
                        entity_id: dossier.id.to_string(),
                        previous_state: Some(previous_level.as_str().to_string()),
                        new_state: floor.as_str().to_string(),
                        justification: Some(format!(
                            "escalated by {} declaration",
                            declaration.condition
                        )),
                        module: AuditModule::Dossiers,
                    },
                )?;
            }
        }
        self.dossiers.save(&dossier, stored_version)?;

        let alert = Alert::system(
            AlertId::new(),
            dossier.id,
            AlertType::PepDetected,
            AlertLevel::Alta,
        );
        append(
            ledger,
            EventDraft {
                actor: actor.clone(),
                entity_kind: EntityKind::Alert,
                entity_id: alert.id.to_string(),
                previous_state: None,
                new_state: alert.status.as_str().to_string(),
                justification: Some(format!(
                    "{} declared on {}",
                    declaration.condition, dossier.id
                )),
                module: AuditModule::Alerts,
            },
        )?;
        self.alerts.insert(&alert)?;
        tracing::warn!(
            dossier = %dossier.id,
            condition = %declaration.condition,
            "PEP escalation applied"
        );
        Ok(())
    }

    fn loaded_dossier(&self, id: DossierId, expected_version: u64) -> Result<Dossier, RulesError> {
        let dossier = self.dossiers.get(id)?;
        require_version(&dossier, expected_version, id.to_string())?;
        Ok(dossier)
    }

    fn loaded_evaluation(
        &self,
        id: EvaluationId,
        expected_version: u64,
    ) -> Result<RiskEvaluation, RulesError> {
        let evaluation = self.evaluations.get(id)?;
        require_version(&evaluation, expected_version, id.to_string())?;
        Ok(evaluation)
    }

    fn loaded_declaration(
        &self,
        id: DeclarationId,
        expected_version: u64,
    ) -> Result<PepDeclaration, RulesError> {
        let declaration = self.declarations.get(id)?;
        require_version(&declaration, expected_version, id.to_string())?;
        Ok(declaration)
    }

    fn loaded_alert(&self, id: AlertId, expected_version: u64) -> Result<Alert, RulesError> {
        let alert = self.alerts.get(id)?;
        require_version(&alert, expected_version, id.to_string())?;
        Ok(alert)
    }
}

/// Check the caller's expected version against the loaded aggregate.
fn require_version<T: Versioned>(
    aggregate: &T,
    expected: u64,
    entity: String,
) -> Result<(), RulesError> {
    if aggregate.version() != expected {
        return Err(RulesError::ConcurrentModification {
            entity,
            expected,
            actual: aggregate.version(),
        });
    }
    Ok(())
}

/// Label for the measures sign-off state in ledger events.
fn approval_label(measures: &EnhancedMeasures) -> &'static str {
    if measures.compliance_officer_approval {
        "APPROVED"
    } else {
        "UNAPPROVED"
    }
}

/// Append a draft, mapping sealing failures to the shared error type.
fn append(ledger: &mut AuditLedger, draft: EventDraft) -> Result<(), RulesError> {
    ledger
        .append(draft)
        .map(|_| ())
        .map_err(|e| RulesError::Validation(format!("audit append failed: {e}")))
}
