//! # Risk Scoring Engine
//!
//! Computes a dossier's risk from weighted factors and runs each scoring
//! pass through an approval lifecycle.
//!
//! ## Aggregation
//!
//! `total_score = min(Σ weightᵢ, 5.0)` with every weight in `0.0–5.0`.
//! Weights are additive, never averaged: adding a factor can only hold or
//! raise the cumulative score, so conflicting factors ("sensitive economic
//! sector" on top of a benign base activity) accumulate instead of diluting
//! each other.
//!
//! ## Threshold mapping
//!
//! Configurable via [`RiskPolicy`] (the values are policy, not physics):
//!
//! ```text
//! score <  medium_threshold (default 2.0)  →  LOW
//! score <  high_threshold   (default 3.5)  →  MEDIUM
//! score >= high_threshold                  →  HIGH
//! ```
//!
//! ## PEP escalation
//!
//! A hard floor applied after threshold mapping, never below it:
//! any politically exposed subject is at least `MEDIUM`; a current PEP in a
//! high-office position is `HIGH` regardless of the computed score. The
//! preliminary level always records what the factors alone produced.
//!
//! ## Evaluation lifecycle
//!
//! `DRAFT → PENDING_APPROVAL → APPROVED | REJECTED`. An approved evaluation
//! is frozen; any change is a new revision of the dossier's evaluation
//! sequence, never a mutation of an approved record.

use serde::{Deserialize, Serialize};

use sarlaft_core::{ActorId, ActorRef, DossierId, EvaluationId, Role, RulesError, Timestamp};

use crate::dossier::Dossier;
use crate::pep::{PepCondition, PepDeclaration, PepSeniority};

/// Maximum weight a single factor may carry.
pub const MAX_FACTOR_WEIGHT: f64 = 5.0;

/// Ceiling of the aggregated score scale.
pub const SCORE_CEILING: f64 = 5.0;

// ─── Risk Level ──────────────────────────────────────────────────────

/// Categorical risk level. Ordered: `Low < Medium < High`.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RiskLevel {
    /// Standard monitoring.
    #[default]
    Low,
    /// Reinforced monitoring.
    Medium,
    /// Enhanced due diligence.
    High,
}

impl RiskLevel {
    /// The wire tag for this level.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Low => "LOW",
            Self::Medium => "MEDIUM",
            Self::High => "HIGH",
        }
    }

    /// Parse a level tag, failing loudly on anything unrecognized.
    pub fn parse(tag: &str) -> Result<Self, RulesError> {
        match tag {
            "LOW" => Ok(Self::Low),
            "MEDIUM" => Ok(Self::Medium),
            "HIGH" => Ok(Self::High),
            other => Err(RulesError::UnknownTag {
                concept: "risk level".to_string(),
                tag: other.to_string(),
            }),
        }
    }
}

impl std::fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ─── Evaluation Type ─────────────────────────────────────────────────

/// Why this scoring pass was run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EvaluationType {
    /// First evaluation at onboarding.
    #[serde(rename = "INICIAL")]
    Inicial,
    /// Scheduled periodic re-assessment.
    #[serde(rename = "PERIODICA")]
    Periodica,
    /// Event-driven re-assessment (alert, PEP change, correction).
    #[serde(rename = "RE_EVALUACION")]
    ReEvaluacion,
}

impl EvaluationType {
    /// The wire tag for this evaluation type.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Inicial => "INICIAL",
            Self::Periodica => "PERIODICA",
            Self::ReEvaluacion => "RE_EVALUACION",
        }
    }

    /// Parse an evaluation-type tag, failing loudly on anything
    /// unrecognized.
    pub fn parse(tag: &str) -> Result<Self, RulesError> {
        match tag {
            "INICIAL" => Ok(Self::Inicial),
            "PERIODICA" => Ok(Self::Periodica),
            "RE_EVALUACION" => Ok(Self::ReEvaluacion),
            other => Err(RulesError::UnknownTag {
                concept: "evaluation type".to_string(),
                tag: other.to_string(),
            }),
        }
    }
}

impl std::fmt::Display for EvaluationType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ─── Factors & Policy ────────────────────────────────────────────────

/// One weighted factor in a scoring pass.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RiskFactor {
    /// Catalog identifier of the factor (e.g. `"sector_economico"`).
    pub factor_id: String,
    /// Weight contributed, `0.0–5.0`.
    pub weight: f64,
    /// Analyst observation attached to the factor.
    pub observation: Option<String>,
}

/// Threshold configuration for mapping scores to levels.
///
/// Deserializable from the deployment's policy file; defaults match the
/// values the compliance unit operates with today.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct RiskPolicy {
    /// Scores at or above this are at least `MEDIUM`.
    pub medium_threshold: f64,
    /// Scores at or above this are `HIGH`.
    pub high_threshold: f64,
}

impl Default for RiskPolicy {
    fn default() -> Self {
        Self {
            medium_threshold: 2.0,
            high_threshold: 3.5,
        }
    }
}

impl RiskPolicy {
    /// Validate threshold ordering and range.
    pub fn validate(&self) -> Result<(), RulesError> {
        if !(self.medium_threshold.is_finite() && self.high_threshold.is_finite()) {
            return Err(RulesError::Validation(
                "risk thresholds must be finite".to_string(),
            ));
        }
        if self.medium_threshold <= 0.0
            || self.medium_threshold >= self.high_threshold
            || self.high_threshold > SCORE_CEILING
        {
            return Err(RulesError::Validation(format!(
                "risk thresholds must satisfy 0 < medium ({}) < high ({}) <= {SCORE_CEILING}",
                self.medium_threshold, self.high_threshold
            )));
        }
        Ok(())
    }

    /// Map a score to its categorical level.
    pub fn level_for(&self, score: f64) -> RiskLevel {
        if score >= self.high_threshold {
            RiskLevel::High
        } else if score >= self.medium_threshold {
            RiskLevel::Medium
        } else {
            RiskLevel::Low
        }
    }
}

/// The escalation floor a PEP profile imposes, if any.
///
/// `CURRENT_PEP` in a high-office position floors at `HIGH`; every other
/// exposed condition floors at `MEDIUM`. `NO_PEP` imposes none.
pub fn pep_escalation_floor(
    condition: PepCondition,
    seniority: PepSeniority,
) -> Option<RiskLevel> {
    match condition {
        PepCondition::NoPep => None,
        PepCondition::CurrentPep if seniority == PepSeniority::AltoNivel => Some(RiskLevel::High),
        _ => Some(RiskLevel::Medium),
    }
}

// ─── Evaluation Lifecycle ────────────────────────────────────────────

/// The approval status of one scoring pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EvaluationStatus {
    /// Being assembled by the analyst.
    Draft,
    /// Awaiting the compliance officer's decision.
    PendingApproval,
    /// Approved and frozen (terminal).
    Approved,
    /// Rejected (terminal); a corrected pass is a new revision.
    Rejected,
}

impl EvaluationStatus {
    /// The wire tag for this status.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Draft => "DRAFT",
            Self::PendingApproval => "PENDING_APPROVAL",
            Self::Approved => "APPROVED",
            Self::Rejected => "REJECTED",
        }
    }

    /// Whether this status is terminal.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Approved | Self::Rejected)
    }
}

impl std::fmt::Display for EvaluationStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One scoring pass over a dossier's weighted factors.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RiskEvaluation {
    /// Unique evaluation identifier.
    pub id: EvaluationId,
    /// The dossier this pass scores.
    pub dossier_id: DossierId,
    /// Monotonic evaluation number within the dossier (1-based).
    pub revision: u32,
    /// Why the pass was run.
    pub evaluation_type: EvaluationType,
    /// The weighted factors, as scored.
    pub factors: Vec<RiskFactor>,
    /// Aggregated score, `0.0–5.0`.
    pub total_score: f64,
    /// Level the factors alone produced.
    pub preliminary_level: RiskLevel,
    /// Level after escalation floors and any manual override.
    pub final_level: RiskLevel,
    /// Whether an authorized actor overrode the computed level.
    pub has_manual_override: bool,
    /// Mandatory justification when an override exists.
    pub override_justification: Option<String>,
    /// Whether this pass carries an escalation, override, or HIGH outcome.
    pub requires_approval: bool,
    /// Lifecycle status.
    pub status: EvaluationStatus,
    /// Analyst who ran the pass.
    pub evaluated_by: ActorId,
    /// When the pass was run.
    pub evaluated_at: Timestamp,
    /// Officer who approved, once approved.
    pub approved_by: Option<ActorId>,
    /// When it was approved.
    pub approved_at: Option<Timestamp>,
    /// Optimistic concurrency version.
    pub version: u64,
}

impl RiskEvaluation {
    /// Description used in error messages and the ledger.
    pub fn entity(&self) -> String {
        self.id.to_string()
    }

    /// Submit the draft for officer approval (`DRAFT → PENDING_APPROVAL`).
    pub fn submit(&mut self, actor: &ActorRef) -> Result<(), RulesError> {
        if !actor.role.has_at_least(Role::ComplianceAnalyst) {
            return Err(RulesError::unauthorized(
                "submit an evaluation",
                Role::ComplianceAnalyst.as_str(),
                actor.role.as_str(),
            ));
        }
        if self.status != EvaluationStatus::Draft {
            return Err(RulesError::invalid_state(
                self.entity(),
                self.status.as_str(),
                EvaluationStatus::PendingApproval.as_str(),
            ));
        }
        self.status = EvaluationStatus::PendingApproval;
        self.version += 1;
        Ok(())
    }

    /// Override the computed level, preserving the preliminary value.
    ///
    /// Requires at least the compliance-analyst role and a non-empty
    /// justification. Frozen once the evaluation is terminal.
    pub fn apply_manual_override(
        &mut self,
        actor: &ActorRef,
        new_level: RiskLevel,
        justification: &str,
    ) -> Result<(), RulesError> {
        if !actor.role.has_at_least(Role::ComplianceAnalyst) {
            return Err(RulesError::unauthorized(
                "override a risk level",
                Role::ComplianceAnalyst.as_str(),
                actor.role.as_str(),
            ));
        }
        if justification.trim().is_empty() {
            return Err(RulesError::MissingJustification {
                field: "override justification".to_string(),
            });
        }
        if self.status.is_terminal() {
            return Err(RulesError::invalid_state(
                self.entity(),
                self.status.as_str(),
                "manual override",
            ));
        }
        self.has_manual_override = true;
        self.override_justification = Some(justification.to_string());
        self.final_level = new_level;
        self.requires_approval = true;
        self.version += 1;
        Ok(())
    }

    /// Approve the evaluation (`PENDING_APPROVAL → APPROVED`). Officer only.
    ///
    /// Approval freezes the record; later factor changes must go through a
    /// new revision.
    pub fn approve(&mut self, actor: &ActorRef) -> Result<(), RulesError> {
        if !actor.role.is_officer() {
            return Err(RulesError::unauthorized(
                "approve an evaluation",
                Role::ComplianceOfficer.as_str(),
                actor.role.as_str(),
            ));
        }
        if self.status != EvaluationStatus::PendingApproval {
            return Err(RulesError::invalid_state(
                self.entity(),
                self.status.as_str(),
                EvaluationStatus::Approved.as_str(),
            ));
        }
        self.status = EvaluationStatus::Approved;
        self.approved_by = Some(actor.id.clone());
        self.approved_at = Some(Timestamp::now());
        self.version += 1;
        Ok(())
    }

    /// Reject the evaluation (`PENDING_APPROVAL → REJECTED`). Officer only,
    /// reason mandatory.
    pub fn reject(&mut self, actor: &ActorRef, reason: &str) -> Result<(), RulesError> {
        if !actor.role.is_officer() {
            return Err(RulesError::unauthorized(
                "reject an evaluation",
                Role::ComplianceOfficer.as_str(),
                actor.role.as_str(),
            ));
        }
        if reason.trim().is_empty() {
            return Err(RulesError::MissingJustification {
                field: "rejection reason".to_string(),
            });
        }
        if self.status != EvaluationStatus::PendingApproval {
            return Err(RulesError::invalid_state(
                self.entity(),
                self.status.as_str(),
                EvaluationStatus::Rejected.as_str(),
            ));
        }
        self.status = EvaluationStatus::Rejected;
        self.version += 1;
        Ok(())
    }
}

// ─── Engine ──────────────────────────────────────────────────────────

/// The scoring engine, parameterized by threshold policy.
#[derive(Debug, Clone)]
pub struct RiskEngine {
    policy: RiskPolicy,
}

impl RiskEngine {
    /// Build an engine after validating the policy.
    pub fn new(policy: RiskPolicy) -> Result<Self, RulesError> {
        policy.validate()?;
        Ok(Self { policy })
    }

    /// The active threshold policy.
    pub fn policy(&self) -> &RiskPolicy {
        &self.policy
    }

    /// Run one scoring pass over a dossier.
    ///
    /// `pep` is the dossier's declaration when one exists; a dossier flagged
    /// PEP without declaration details floors at `MEDIUM`. The returned
    /// evaluation starts in `DRAFT`.
    pub fn evaluate(
        &self,
        dossier: &Dossier,
        pep: Option<&PepDeclaration>,
        evaluation_type: EvaluationType,
        factors: Vec<RiskFactor>,
        revision: u32,
        actor: &ActorRef,
    ) -> Result<RiskEvaluation, RulesError> {
        if !actor.role.has_at_least(Role::ComplianceAnalyst) {
            return Err(RulesError::unauthorized(
                "run a risk evaluation",
                Role::ComplianceAnalyst.as_str(),
                actor.role.as_str(),
            ));
        }
        for factor in &factors {
            if !(0.0..=MAX_FACTOR_WEIGHT).contains(&factor.weight) || !factor.weight.is_finite() {
                return Err(RulesError::Validation(format!(
                    "factor {:?} weight {} outside 0.0-{MAX_FACTOR_WEIGHT}",
                    factor.factor_id, factor.weight
                )));
            }
        }

        let total_score = aggregate_score(&factors);
        let preliminary_level = self.policy.level_for(total_score);

        let floor = match pep {
            Some(declaration) => pep_escalation_floor(declaration.condition, declaration.seniority),
            None if dossier.is_pep => Some(RiskLevel::Medium),
            None => None,
        };
        let final_level = match floor {
            Some(floor) => preliminary_level.max(floor),
            None => preliminary_level,
        };

        let escalated = final_level > preliminary_level;
        if escalated {
            tracing::debug!(
                dossier = %dossier.id,
                preliminary = %preliminary_level,
                escalated_to = %final_level,
                "PEP escalation floor applied"
            );
        }

        Ok(RiskEvaluation {
            id: EvaluationId::new(),
            dossier_id: dossier.id,
            revision,
            evaluation_type,
            factors,
            total_score,
            preliminary_level,
            final_level,
            has_manual_override: false,
            override_justification: None,
            requires_approval: escalated || final_level == RiskLevel::High,
            status: EvaluationStatus::Draft,
            evaluated_by: actor.id.clone(),
            evaluated_at: Timestamp::now(),
            approved_by: None,
            approved_at: None,
            version: 1,
        })
    }
}

/// Additive aggregation, clamped to the scale ceiling.
fn aggregate_score(factors: &[RiskFactor]) -> f64 {
    let sum: f64 = factors.iter().map(|f| f.weight).sum();
    sum.min(SCORE_CEILING)
}

// ─── Tests ───────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dossier::SubjectType;
    use sarlaft_core::DossierId;

    fn analyst() -> ActorRef {
        ActorRef::new("lrojas", Role::ComplianceAnalyst)
    }

    fn officer() -> ActorRef {
        ActorRef::new("mgarcia", Role::ComplianceOfficer)
    }

    fn engine() -> RiskEngine {
        RiskEngine::new(RiskPolicy::default()).unwrap()
    }

    fn plain_dossier() -> Dossier {
        Dossier::create(
            DossierId::new(),
            SubjectType::Client,
            &ActorRef::new("jperez", Role::Commercial),
        )
        .unwrap()
    }

    fn factor(id: &str, weight: f64) -> RiskFactor {
        RiskFactor {
            factor_id: id.to_string(),
            weight,
            observation: None,
        }
    }

    fn current_pep_alto(dossier_id: DossierId) -> PepDeclaration {
        PepDeclaration::declare(
            sarlaft_core::DeclarationId::new(),
            dossier_id,
            PepCondition::CurrentPep,
            PepSeniority::AltoNivel,
            Some("Minister of Finance".to_string()),
            Some("CO".to_string()),
            None,
            "National gazette appointment record",
            "Subject holds current high public office",
            &officer(),
        )
        .unwrap()
    }

    // ── Thresholds ───────────────────────────────────────────────────

    #[test]
    fn test_threshold_boundaries() {
        let policy = RiskPolicy::default();
        assert_eq!(policy.level_for(0.0), RiskLevel::Low);
        assert_eq!(policy.level_for(1.99), RiskLevel::Low);
        assert_eq!(policy.level_for(2.0), RiskLevel::Medium);
        assert_eq!(policy.level_for(3.49), RiskLevel::Medium);
        assert_eq!(policy.level_for(3.5), RiskLevel::High);
        assert_eq!(policy.level_for(5.0), RiskLevel::High);
    }

    #[test]
    fn test_policy_validation() {
        assert!(RiskPolicy::default().validate().is_ok());
        assert!(RiskPolicy {
            medium_threshold: 3.5,
            high_threshold: 2.0
        }
        .validate()
        .is_err());
        assert!(RiskPolicy {
            medium_threshold: 0.0,
            high_threshold: 3.5
        }
        .validate()
        .is_err());
        assert!(RiskPolicy {
            medium_threshold: 2.0,
            high_threshold: 9.0
        }
        .validate()
        .is_err());
    }

    #[test]
    fn test_policy_deserializes_from_yaml() {
        let policy: RiskPolicy =
            serde_yaml::from_str("medium_threshold: 1.8\nhigh_threshold: 3.2\n").unwrap();
        assert_eq!(policy.medium_threshold, 1.8);
        assert_eq!(policy.level_for(1.9), RiskLevel::Medium);
    }

    // ── Aggregation ──────────────────────────────────────────────────

    #[test]
    fn test_scores_are_additive_and_clamped() {
        let d = plain_dossier();
        let eval = engine()
            .evaluate(
                &d,
                None,
                EvaluationType::Inicial,
                vec![factor("a", 2.0), factor("b", 2.0), factor("c", 2.0)],
                1,
                &analyst(),
            )
            .unwrap();
        assert_eq!(eval.total_score, 5.0);
        assert_eq!(eval.preliminary_level, RiskLevel::High);
    }

    #[test]
    fn test_adding_factor_never_lowers_score() {
        let d = plain_dossier();
        let base = engine()
            .evaluate(
                &d,
                None,
                EvaluationType::Inicial,
                vec![factor("activity", 3.0)],
                1,
                &analyst(),
            )
            .unwrap();
        let with_more = engine()
            .evaluate(
                &d,
                None,
                EvaluationType::Inicial,
                vec![factor("activity", 3.0), factor("sector", 0.5)],
                2,
                &analyst(),
            )
            .unwrap();
        assert!(with_more.total_score >= base.total_score);
    }

    #[test]
    fn test_weight_out_of_range_rejected() {
        let d = plain_dossier();
        let err = engine()
            .evaluate(
                &d,
                None,
                EvaluationType::Inicial,
                vec![factor("bad", 5.1)],
                1,
                &analyst(),
            )
            .unwrap_err();
        assert!(matches!(err, RulesError::Validation(_)));

        let err = engine()
            .evaluate(
                &d,
                None,
                EvaluationType::Inicial,
                vec![factor("neg", -0.1)],
                1,
                &analyst(),
            )
            .unwrap_err();
        assert!(matches!(err, RulesError::Validation(_)));
    }

    #[test]
    fn test_no_factors_scores_low() {
        let d = plain_dossier();
        let eval = engine()
            .evaluate(&d, None, EvaluationType::Periodica, vec![], 1, &analyst())
            .unwrap();
        assert_eq!(eval.total_score, 0.0);
        assert_eq!(eval.final_level, RiskLevel::Low);
        assert!(!eval.requires_approval);
    }

    // ── PEP escalation ───────────────────────────────────────────────

    #[test]
    fn test_low_score_current_pep_alto_forces_high() {
        let d = plain_dossier();
        let pep = current_pep_alto(d.id);
        let eval = engine()
            .evaluate(
                &d,
                Some(&pep),
                EvaluationType::Inicial,
                vec![factor("activity", 1.2)],
                1,
                &analyst(),
            )
            .unwrap();
        assert_eq!(eval.total_score, 1.2);
        assert_eq!(eval.preliminary_level, RiskLevel::Low);
        assert_eq!(eval.final_level, RiskLevel::High);
        assert!(eval.requires_approval);
    }

    #[test]
    fn test_former_pep_floors_at_medium() {
        assert_eq!(
            pep_escalation_floor(PepCondition::FormerPep, PepSeniority::Ordinario),
            Some(RiskLevel::Medium)
        );
        assert_eq!(
            pep_escalation_floor(PepCondition::RelatedPep, PepSeniority::AltoNivel),
            Some(RiskLevel::Medium)
        );
        assert_eq!(
            pep_escalation_floor(PepCondition::NoPep, PepSeniority::Ordinario),
            None
        );
    }

    #[test]
    fn test_pep_flag_without_declaration_floors_medium() {
        let mut d = plain_dossier();
        d.mark_pep(&analyst());
        let eval = engine()
            .evaluate(
                &d,
                None,
                EvaluationType::Inicial,
                vec![factor("activity", 0.5)],
                1,
                &analyst(),
            )
            .unwrap();
        assert_eq!(eval.preliminary_level, RiskLevel::Low);
        assert_eq!(eval.final_level, RiskLevel::Medium);
    }

    #[test]
    fn test_escalation_never_lowers_computed_level() {
        // A former PEP whose factors already score HIGH stays HIGH.
        let d = plain_dossier();
        let mut pep = current_pep_alto(d.id);
        pep.condition = PepCondition::FormerPep;
        pep.seniority = PepSeniority::Ordinario;
        let eval = engine()
            .evaluate(
                &d,
                Some(&pep),
                EvaluationType::ReEvaluacion,
                vec![factor("a", 4.0)],
                1,
                &analyst(),
            )
            .unwrap();
        assert_eq!(eval.final_level, RiskLevel::High);
    }

    // ── Override & lifecycle ─────────────────────────────────────────

    fn pending_eval() -> RiskEvaluation {
        let d = plain_dossier();
        let mut eval = engine()
            .evaluate(
                &d,
                None,
                EvaluationType::Inicial,
                vec![factor("activity", 2.5)],
                1,
                &analyst(),
            )
            .unwrap();
        eval.submit(&analyst()).unwrap();
        eval
    }

    #[test]
    fn test_override_preserves_preliminary() {
        let mut eval = pending_eval();
        eval.apply_manual_override(
            &analyst(),
            RiskLevel::High,
            "Adverse media on the beneficial owner",
        )
        .unwrap();
        assert!(eval.has_manual_override);
        assert_eq!(eval.preliminary_level, RiskLevel::Medium);
        assert_eq!(eval.final_level, RiskLevel::High);
        assert!(eval.requires_approval);
    }

    #[test]
    fn test_override_requires_justification() {
        let mut eval = pending_eval();
        let err = eval
            .apply_manual_override(&analyst(), RiskLevel::High, "  ")
            .unwrap_err();
        assert!(matches!(err, RulesError::MissingJustification { .. }));
        assert!(!eval.has_manual_override);
        assert_eq!(eval.final_level, RiskLevel::Medium);
    }

    #[test]
    fn test_override_rejected_for_commercial() {
        let mut eval = pending_eval();
        let err = eval
            .apply_manual_override(
                &ActorRef::new("jperez", Role::Commercial),
                RiskLevel::Low,
                "please",
            )
            .unwrap_err();
        assert!(matches!(err, RulesError::Unauthorized { .. }));
    }

    #[test]
    fn test_approve_freezes_evaluation() {
        let mut eval = pending_eval();
        eval.approve(&officer()).unwrap();
        assert_eq!(eval.status, EvaluationStatus::Approved);
        assert!(eval.approved_by.is_some());

        let err = eval
            .apply_manual_override(&officer(), RiskLevel::Low, "too late")
            .unwrap_err();
        assert!(matches!(err, RulesError::InvalidState { .. }));
    }

    #[test]
    fn test_analyst_approve_rejected_without_side_effect() {
        let mut eval = pending_eval();
        let version = eval.version;
        let err = eval.approve(&analyst()).unwrap_err();
        assert!(matches!(err, RulesError::Unauthorized { .. }));
        assert_eq!(eval.status, EvaluationStatus::PendingApproval);
        assert_eq!(eval.version, version);
    }

    #[test]
    fn test_cannot_approve_draft() {
        let d = plain_dossier();
        let mut eval = engine()
            .evaluate(&d, None, EvaluationType::Inicial, vec![], 1, &analyst())
            .unwrap();
        assert!(matches!(
            eval.approve(&officer()),
            Err(RulesError::InvalidState { .. })
        ));
    }

    #[test]
    fn test_reject_requires_reason() {
        let mut eval = pending_eval();
        assert!(matches!(
            eval.reject(&officer(), ""),
            Err(RulesError::MissingJustification { .. })
        ));
        eval.reject(&officer(), "Factors incomplete").unwrap();
        assert_eq!(eval.status, EvaluationStatus::Rejected);
    }

    // ── Serialization ────────────────────────────────────────────────

    #[test]
    fn test_evaluation_type_tags() {
        assert_eq!(
            serde_json::to_string(&EvaluationType::ReEvaluacion).unwrap(),
            "\"RE_EVALUACION\""
        );
        assert_eq!(EvaluationType::Inicial.to_string(), "INICIAL");
    }

    #[test]
    fn test_evaluation_serde_roundtrip() {
        let eval = pending_eval();
        let json = serde_json::to_string(&eval).unwrap();
        let back: RiskEvaluation = serde_json::from_str(&json).unwrap();
        assert_eq!(back.status, eval.status);
        assert_eq!(back.total_score, eval.total_score);
    }

    #[test]
    fn test_risk_level_parse_fails_loudly() {
        assert_eq!(RiskLevel::parse("HIGH").unwrap(), RiskLevel::High);
        assert!(RiskLevel::parse("EXTREME").is_err());
    }
}
