//! # Dossier Review State Machine
//!
//! Models the lifecycle of a compliance dossier — one case per subject
//! (client, intermediary, employee, provider, reinsurer, retrocessionaire).
//!
//! ## States
//!
//! ```text
//! INCOMPLETE ──▶ UNDER_REVIEW ──▶ APPROVED (terminal for the cycle)
//!      ▲              │
//!      │              ├──▶ OBSERVED ──────▶ UNDER_REVIEW (resubmission)
//!      │              └──▶ REQUIRES_INFO ─▶ UNDER_REVIEW (resubmission)
//!      │
//!   (creation)
//!
//! APPROVED ──▶ UNDER_REVIEW (reopen: new review cycle, cycle counter +1)
//! ```
//!
//! ## Gates
//!
//! - Submission requires documentary completeness of at least
//!   [`REVIEW_COMPLETENESS_THRESHOLD`] percent.
//! - Approval, rejection, and information requests are restricted to the
//!   compliance officer.
//! - Risk level and score are derived values written back by the evaluation
//!   workflow; they are never set directly by callers.
//!
//! ## Design Decision
//!
//! An enum with validated transitions rather than typestate types: the
//! dossier is loaded from a repository at runtime, so its state is data, not
//! a compile-time fact. `require_state()` + `do_transition()` keep every
//! mutation behind the same validation path, and a rejected call returns
//! before anything is touched.

use serde::{Deserialize, Serialize};

use sarlaft_core::{ActorId, ActorRef, DossierId, Role, RulesError, Timestamp};

use crate::risk::RiskLevel;

/// Minimum documentary completeness (percent) required to submit a dossier
/// for review. The 75/76 boundary is pinned by tests.
pub const REVIEW_COMPLETENESS_THRESHOLD: u8 = 76;

// ─── Subject Type ────────────────────────────────────────────────────

/// The kind of counterparty a dossier covers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SubjectType {
    /// Policy holder or insured party.
    Client,
    /// Broker or agency channel.
    Intermediary,
    /// Company employee.
    Employee,
    /// Goods/services provider.
    Provider,
    /// Reinsurance counterparty.
    Reinsurer,
    /// Retrocession counterparty.
    Retrocessionaire,
}

impl SubjectType {
    /// The wire tag for this subject type.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Client => "CLIENT",
            Self::Intermediary => "INTERMEDIARY",
            Self::Employee => "EMPLOYEE",
            Self::Provider => "PROVIDER",
            Self::Reinsurer => "REINSURER",
            Self::Retrocessionaire => "RETROCESSIONAIRE",
        }
    }

    /// Parse a subject tag, failing loudly on anything unrecognized.
    pub fn parse(tag: &str) -> Result<Self, RulesError> {
        match tag {
            "CLIENT" => Ok(Self::Client),
            "INTERMEDIARY" => Ok(Self::Intermediary),
            "EMPLOYEE" => Ok(Self::Employee),
            "PROVIDER" => Ok(Self::Provider),
            "REINSURER" => Ok(Self::Reinsurer),
            "RETROCESSIONAIRE" => Ok(Self::Retrocessionaire),
            other => Err(RulesError::UnknownTag {
                concept: "subject type".to_string(),
                tag: other.to_string(),
            }),
        }
    }
}

impl std::fmt::Display for SubjectType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ─── Dossier Status ──────────────────────────────────────────────────

/// The review status of a dossier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DossierStatus {
    /// Documentation still being gathered.
    Incomplete,
    /// Submitted and awaiting a compliance decision.
    UnderReview,
    /// Sent back with a request for additional information.
    RequiresInfo,
    /// Rejected with observations; must be corrected and resubmitted.
    Observed,
    /// Approved by the compliance officer. Terminal for the review cycle.
    Approved,
}

impl DossierStatus {
    /// The wire tag for this status.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Incomplete => "INCOMPLETE",
            Self::UnderReview => "UNDER_REVIEW",
            Self::RequiresInfo => "REQUIRES_INFO",
            Self::Observed => "OBSERVED",
            Self::Approved => "APPROVED",
        }
    }

    /// Whether the dossier may be (re)submitted for review from this status.
    pub fn allows_submission(&self) -> bool {
        matches!(self, Self::Incomplete | Self::RequiresInfo | Self::Observed)
    }
}

impl std::fmt::Display for DossierStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ─── Transition Record ───────────────────────────────────────────────

/// One entry in the dossier's own transition history, mirrored into the
/// global audit ledger by the service layer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DossierTransitionRecord {
    /// Status before the transition.
    pub from: DossierStatus,
    /// Status after the transition.
    pub to: DossierStatus,
    /// When it happened.
    pub timestamp: Timestamp,
    /// Who performed it.
    pub actor: ActorId,
    /// Reason, where the operation required one.
    pub reason: Option<String>,
}

// ─── Dossier ─────────────────────────────────────────────────────────

/// A compliance dossier with its review state and transition history.
///
/// Mutations happen only through the operation methods; each successful
/// operation bumps `version` (optimistic concurrency) and stamps
/// `last_modified_by`. Failed operations return before touching anything.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Dossier {
    /// Unique dossier identifier.
    pub id: DossierId,
    /// Kind of counterparty under review.
    pub subject_type: SubjectType,
    /// Current review status.
    pub status: DossierStatus,
    /// Documentary completeness, 0–100 percent.
    pub completeness: u8,
    /// Derived risk level; written back by the evaluation workflow.
    pub risk_level: RiskLevel,
    /// Derived risk score on the 0.0–5.0 scale.
    pub current_risk_score: f64,
    /// Whether an approved PEP declaration covers this subject.
    pub is_pep: bool,
    /// Which review cycle this is (reopening an approved dossier starts a
    /// new cycle).
    pub review_cycle: u32,
    /// Who created the dossier.
    pub created_by: ActorId,
    /// Who last mutated the dossier.
    pub last_modified_by: ActorId,
    /// Approver of the current cycle, once approved.
    pub approved_by: Option<ActorId>,
    /// When the current cycle was approved.
    pub approved_at: Option<Timestamp>,
    /// When the dossier was created.
    pub created_at: Timestamp,
    /// Optimistic concurrency version.
    pub version: u64,
    /// Ordered log of all status transitions.
    pub transitions: Vec<DossierTransitionRecord>,
}

impl Dossier {
    /// Open a new dossier in `INCOMPLETE`.
    ///
    /// Requires at least the commercial role; auditors are read-only.
    pub fn create(
        id: DossierId,
        subject_type: SubjectType,
        actor: &ActorRef,
    ) -> Result<Self, RulesError> {
        if !actor.role.has_at_least(Role::Commercial) {
            return Err(RulesError::unauthorized(
                "create a dossier",
                Role::Commercial.as_str(),
                actor.role.as_str(),
            ));
        }
        Ok(Self {
            id,
            subject_type,
            status: DossierStatus::Incomplete,
            completeness: 0,
            risk_level: RiskLevel::Low,
            current_risk_score: 0.0,
            is_pep: false,
            review_cycle: 1,
            created_by: actor.id.clone(),
            last_modified_by: actor.id.clone(),
            approved_by: None,
            approved_at: None,
            created_at: Timestamp::now(),
            version: 1,
            transitions: Vec::new(),
        })
    }

    /// Record a new documentary completeness percentage.
    ///
    /// Not a status transition — but still a versioned, ledgered mutation.
    /// Approved dossiers are frozen; reopen first.
    pub fn update_completeness(&mut self, actor: &ActorRef, pct: u8) -> Result<(), RulesError> {
        if !actor.role.has_at_least(Role::Commercial) {
            return Err(RulesError::unauthorized(
                "update dossier completeness",
                Role::Commercial.as_str(),
                actor.role.as_str(),
            ));
        }
        if pct > 100 {
            return Err(RulesError::Validation(format!(
                "completeness must be 0-100, got {pct}"
            )));
        }
        if self.status == DossierStatus::Approved {
            return Err(RulesError::invalid_state(
                self.entity(),
                self.status.as_str(),
                "completeness update",
            ));
        }
        self.completeness = pct;
        self.touch(actor);
        Ok(())
    }

    /// Submit the dossier for compliance review.
    ///
    /// Allowed from `INCOMPLETE`, `OBSERVED`, and `REQUIRES_INFO` (the
    /// correction loop). Fails with `IncompleteDossier` below the
    /// completeness threshold.
    pub fn submit_for_review(&mut self, actor: &ActorRef) -> Result<(), RulesError> {
        if !actor.role.has_at_least(Role::Commercial) {
            return Err(RulesError::unauthorized(
                "submit a dossier for review",
                Role::Commercial.as_str(),
                actor.role.as_str(),
            ));
        }
        if !self.status.allows_submission() {
            return Err(RulesError::invalid_state(
                self.entity(),
                self.status.as_str(),
                DossierStatus::UnderReview.as_str(),
            ));
        }
        if self.completeness < REVIEW_COMPLETENESS_THRESHOLD {
            return Err(RulesError::IncompleteDossier {
                completeness: self.completeness,
                required: REVIEW_COMPLETENESS_THRESHOLD,
            });
        }
        self.do_transition(DossierStatus::UnderReview, actor, None);
        Ok(())
    }

    /// Approve the dossier (`UNDER_REVIEW → APPROVED`). Officer only.
    pub fn approve(&mut self, actor: &ActorRef) -> Result<(), RulesError> {
        self.require_officer(actor, "approve a dossier")?;
        self.require_state(DossierStatus::UnderReview, DossierStatus::Approved)?;
        self.approved_by = Some(actor.id.clone());
        self.approved_at = Some(Timestamp::now());
        self.do_transition(DossierStatus::Approved, actor, None);
        Ok(())
    }

    /// Reject the dossier with observations (`UNDER_REVIEW → OBSERVED`).
    ///
    /// Officer only; the reason is mandatory and recorded verbatim.
    pub fn reject(&mut self, actor: &ActorRef, reason: &str) -> Result<(), RulesError> {
        self.require_officer(actor, "reject a dossier")?;
        if reason.trim().is_empty() {
            return Err(RulesError::MissingJustification {
                field: "rejection reason".to_string(),
            });
        }
        self.require_state(DossierStatus::UnderReview, DossierStatus::Observed)?;
        self.do_transition(DossierStatus::Observed, actor, Some(reason.to_string()));
        Ok(())
    }

    /// Send the dossier back for more information
    /// (`UNDER_REVIEW → REQUIRES_INFO`). Officer only, reason mandatory.
    pub fn request_info(&mut self, actor: &ActorRef, reason: &str) -> Result<(), RulesError> {
        self.require_officer(actor, "request additional information")?;
        if reason.trim().is_empty() {
            return Err(RulesError::MissingJustification {
                field: "information request reason".to_string(),
            });
        }
        self.require_state(DossierStatus::UnderReview, DossierStatus::RequiresInfo)?;
        self.do_transition(DossierStatus::RequiresInfo, actor, Some(reason.to_string()));
        Ok(())
    }

    /// Reopen an approved dossier for a new review cycle
    /// (`APPROVED → UNDER_REVIEW`).
    ///
    /// The prior approval stays in the transition history and the ledger;
    /// the approval stamps are cleared for the new cycle.
    pub fn reopen(&mut self, actor: &ActorRef, reason: &str) -> Result<(), RulesError> {
        if !actor.role.has_at_least(Role::ComplianceAnalyst) {
            return Err(RulesError::unauthorized(
                "reopen an approved dossier",
                Role::ComplianceAnalyst.as_str(),
                actor.role.as_str(),
            ));
        }
        if reason.trim().is_empty() {
            return Err(RulesError::MissingJustification {
                field: "reopen reason".to_string(),
            });
        }
        self.require_state(DossierStatus::Approved, DossierStatus::UnderReview)?;
        self.review_cycle += 1;
        self.approved_by = None;
        self.approved_at = None;
        self.do_transition(DossierStatus::UnderReview, actor, Some(reason.to_string()));
        Ok(())
    }

    /// Write back a derived risk profile from the evaluation workflow.
    ///
    /// Callers never set risk directly; the service invokes this when an
    /// evaluation is approved or a PEP escalation fires.
    pub fn apply_risk_profile(&mut self, actor: &ActorRef, level: RiskLevel, score: f64) {
        self.risk_level = level;
        self.current_risk_score = score;
        self.touch(actor);
    }

    /// Flag the subject as politically exposed.
    pub fn mark_pep(&mut self, actor: &ActorRef) {
        self.is_pep = true;
        self.touch(actor);
    }

    /// Whether the dossier is approved in its current cycle.
    pub fn is_approved(&self) -> bool {
        self.status == DossierStatus::Approved
    }

    /// Description used in error messages and the ledger.
    pub fn entity(&self) -> String {
        self.id.to_string()
    }

    // ─── Internals ───────────────────────────────────────────────────

    fn require_officer(&self, actor: &ActorRef, action: &str) -> Result<(), RulesError> {
        if !actor.role.is_officer() {
            return Err(RulesError::unauthorized(
                action,
                Role::ComplianceOfficer.as_str(),
                actor.role.as_str(),
            ));
        }
        Ok(())
    }

    fn require_state(
        &self,
        expected: DossierStatus,
        target: DossierStatus,
    ) -> Result<(), RulesError> {
        if self.status != expected {
            return Err(RulesError::invalid_state(
                self.entity(),
                self.status.as_str(),
                target.as_str(),
            ));
        }
        Ok(())
    }

    fn do_transition(&mut self, to: DossierStatus, actor: &ActorRef, reason: Option<String>) {
        self.transitions.push(DossierTransitionRecord {
            from: self.status,
            to,
            timestamp: Timestamp::now(),
            actor: actor.id.clone(),
            reason,
        });
        self.status = to;
        self.touch(actor);
    }

    fn touch(&mut self, actor: &ActorRef) {
        self.last_modified_by = actor.id.clone();
        self.version += 1;
    }
}

// ─── Tests ───────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    fn commercial() -> ActorRef {
        ActorRef::new("jperez", Role::Commercial)
    }

    fn analyst() -> ActorRef {
        ActorRef::new("lrojas", Role::ComplianceAnalyst)
    }

    fn officer() -> ActorRef {
        ActorRef::new("mgarcia", Role::ComplianceOfficer)
    }

    fn make_dossier() -> Dossier {
        Dossier::create(DossierId::new(), SubjectType::Client, &commercial()).unwrap()
    }

    fn make_under_review() -> Dossier {
        let mut d = make_dossier();
        d.update_completeness(&commercial(), 90).unwrap();
        d.submit_for_review(&commercial()).unwrap();
        d
    }

    // ── Creation ─────────────────────────────────────────────────────

    #[test]
    fn test_new_dossier_starts_incomplete() {
        let d = make_dossier();
        assert_eq!(d.status, DossierStatus::Incomplete);
        assert_eq!(d.completeness, 0);
        assert_eq!(d.review_cycle, 1);
        assert_eq!(d.version, 1);
        assert!(!d.is_pep);
    }

    #[test]
    fn test_auditor_cannot_create() {
        let result = Dossier::create(
            DossierId::new(),
            SubjectType::Client,
            &ActorRef::new("aud", Role::Auditor),
        );
        assert!(matches!(result, Err(RulesError::Unauthorized { .. })));
    }

    // ── Completeness gate ────────────────────────────────────────────

    #[test]
    fn test_submit_at_75_fails_at_76_succeeds() {
        let mut d = make_dossier();
        d.update_completeness(&commercial(), 75).unwrap();
        let err = d.submit_for_review(&commercial()).unwrap_err();
        assert!(matches!(
            err,
            RulesError::IncompleteDossier {
                completeness: 75,
                required: 76
            }
        ));
        assert_eq!(d.status, DossierStatus::Incomplete);

        d.update_completeness(&commercial(), 76).unwrap();
        d.submit_for_review(&commercial()).unwrap();
        assert_eq!(d.status, DossierStatus::UnderReview);
    }

    #[test]
    fn test_completeness_over_100_rejected() {
        let mut d = make_dossier();
        assert!(matches!(
            d.update_completeness(&commercial(), 101),
            Err(RulesError::Validation(_))
        ));
        assert_eq!(d.completeness, 0);
    }

    #[test]
    fn test_failed_submit_leaves_version_unchanged() {
        let mut d = make_dossier();
        let version_before = d.version;
        let _ = d.submit_for_review(&commercial()).unwrap_err();
        assert_eq!(d.version, version_before);
        assert!(d.transitions.is_empty());
    }

    // ── Approval ─────────────────────────────────────────────────────

    #[test]
    fn test_approve_stamps_approver() {
        let mut d = make_under_review();
        d.approve(&officer()).unwrap();
        assert_eq!(d.status, DossierStatus::Approved);
        assert_eq!(d.approved_by.as_ref().unwrap().as_str(), "mgarcia");
        assert!(d.approved_at.is_some());
    }

    #[test]
    fn test_analyst_cannot_approve() {
        let mut d = make_under_review();
        let err = d.approve(&analyst()).unwrap_err();
        assert!(matches!(err, RulesError::Unauthorized { .. }));
        assert_eq!(d.status, DossierStatus::UnderReview);
        assert!(d.approved_by.is_none());
    }

    #[test]
    fn test_cannot_approve_incomplete() {
        let mut d = make_dossier();
        let err = d.approve(&officer()).unwrap_err();
        assert!(matches!(err, RulesError::InvalidState { .. }));
    }

    // ── Rejection & information requests ─────────────────────────────

    #[test]
    fn test_reject_requires_reason() {
        let mut d = make_under_review();
        let err = d.reject(&officer(), "   ").unwrap_err();
        assert!(matches!(err, RulesError::MissingJustification { .. }));
        assert_eq!(d.status, DossierStatus::UnderReview);
    }

    #[test]
    fn test_reject_records_reason() {
        let mut d = make_under_review();
        d.reject(&officer(), "Beneficiary documentation inconsistent")
            .unwrap();
        assert_eq!(d.status, DossierStatus::Observed);
        let last = d.transitions.last().unwrap();
        assert_eq!(
            last.reason.as_deref(),
            Some("Beneficiary documentation inconsistent")
        );
    }

    #[test]
    fn test_commercial_cannot_reject() {
        let mut d = make_under_review();
        assert!(matches!(
            d.reject(&commercial(), "reason"),
            Err(RulesError::Unauthorized { .. })
        ));
    }

    #[test]
    fn test_request_info_loop() {
        let mut d = make_under_review();
        d.request_info(&officer(), "Need source-of-funds certificate")
            .unwrap();
        assert_eq!(d.status, DossierStatus::RequiresInfo);
        d.submit_for_review(&commercial()).unwrap();
        assert_eq!(d.status, DossierStatus::UnderReview);
    }

    #[test]
    fn test_observed_resubmission_loop() {
        let mut d = make_under_review();
        d.reject(&officer(), "Fix observations").unwrap();
        d.submit_for_review(&commercial()).unwrap();
        assert_eq!(d.status, DossierStatus::UnderReview);
        d.approve(&officer()).unwrap();
        assert!(d.is_approved());
    }

    // ── Reopen ───────────────────────────────────────────────────────

    #[test]
    fn test_reopen_starts_new_cycle() {
        let mut d = make_under_review();
        d.approve(&officer()).unwrap();
        d.reopen(&analyst(), "Periodic re-evaluation due").unwrap();
        assert_eq!(d.status, DossierStatus::UnderReview);
        assert_eq!(d.review_cycle, 2);
        assert!(d.approved_by.is_none());
        // The original approval remains in history.
        assert!(d
            .transitions
            .iter()
            .any(|t| t.to == DossierStatus::Approved));
    }

    #[test]
    fn test_reopen_requires_reason_and_role() {
        let mut d = make_under_review();
        d.approve(&officer()).unwrap();
        assert!(matches!(
            d.reopen(&analyst(), ""),
            Err(RulesError::MissingJustification { .. })
        ));
        assert!(matches!(
            d.reopen(&commercial(), "why"),
            Err(RulesError::Unauthorized { .. })
        ));
        assert_eq!(d.review_cycle, 1);
    }

    #[test]
    fn test_approved_freezes_completeness() {
        let mut d = make_under_review();
        d.approve(&officer()).unwrap();
        assert!(matches!(
            d.update_completeness(&commercial(), 50),
            Err(RulesError::InvalidState { .. })
        ));
    }

    // ── Derived risk ─────────────────────────────────────────────────

    #[test]
    fn test_apply_risk_profile_bumps_version() {
        let mut d = make_dossier();
        let v = d.version;
        d.apply_risk_profile(&analyst(), RiskLevel::High, 4.2);
        assert_eq!(d.risk_level, RiskLevel::High);
        assert_eq!(d.current_risk_score, 4.2);
        assert_eq!(d.version, v + 1);
    }

    // ── History & serialization ──────────────────────────────────────

    #[test]
    fn test_transition_log_is_ordered() {
        let mut d = make_under_review();
        d.reject(&officer(), "obs").unwrap();
        d.submit_for_review(&commercial()).unwrap();
        let states: Vec<_> = d.transitions.iter().map(|t| t.to).collect();
        assert_eq!(
            states,
            vec![
                DossierStatus::UnderReview,
                DossierStatus::Observed,
                DossierStatus::UnderReview
            ]
        );
    }

    #[test]
    fn test_status_display() {
        assert_eq!(DossierStatus::Incomplete.to_string(), "INCOMPLETE");
        assert_eq!(DossierStatus::UnderReview.to_string(), "UNDER_REVIEW");
        assert_eq!(DossierStatus::RequiresInfo.to_string(), "REQUIRES_INFO");
        assert_eq!(DossierStatus::Observed.to_string(), "OBSERVED");
        assert_eq!(DossierStatus::Approved.to_string(), "APPROVED");
    }

    #[test]
    fn test_subject_type_parse_round_trip() {
        for s in [
            SubjectType::Client,
            SubjectType::Intermediary,
            SubjectType::Employee,
            SubjectType::Provider,
            SubjectType::Reinsurer,
            SubjectType::Retrocessionaire,
        ] {
            assert_eq!(SubjectType::parse(s.as_str()).unwrap(), s);
        }
        assert!(SubjectType::parse("SHAREHOLDER").is_err());
    }

    #[test]
    fn test_dossier_serialization() {
        let d = make_under_review();
        let json = serde_json::to_string(&d).unwrap();
        let back: Dossier = serde_json::from_str(&json).unwrap();
        assert_eq!(back.status, d.status);
        assert_eq!(back.id, d.id);
        assert_eq!(back.version, d.version);
    }
}
