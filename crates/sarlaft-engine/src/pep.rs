//! # PEP Declaration Lifecycle
//!
//! Models the political-exposure classification of a dossier's subject.
//!
//! ## States
//!
//! ```text
//! DRAFT ──▶ PENDING_APPROVAL ──▶ APPROVED
//! ```
//!
//! A declaration recorded by the compliance officer is approved on the
//! spot; anyone else leaves it pending. A `RELATED_PEP` declaration cannot
//! leave `DRAFT` until at least one relative/associate is linked.
//!
//! ## Append-only history
//!
//! A condition change never overwrites: it appends a [`ConditionChange`]
//! entry and re-enters the approval flow. Relatives are never deleted, only
//! advanced through their evaluation states.

use serde::{Deserialize, Serialize};

use sarlaft_core::{
    ActorId, ActorRef, DeclarationId, DossierId, RelativeId, Role, RulesError, Timestamp,
};

// ─── Condition & Seniority ───────────────────────────────────────────

/// The political-exposure condition of a subject.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PepCondition {
    /// Not politically exposed.
    NoPep,
    /// Currently holds public office.
    CurrentPep,
    /// Formerly held public office.
    FormerPep,
    /// Relative or close associate of a PEP.
    RelatedPep,
}

impl PepCondition {
    /// The wire tag for this condition.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::NoPep => "NO_PEP",
            Self::CurrentPep => "CURRENT_PEP",
            Self::FormerPep => "FORMER_PEP",
            Self::RelatedPep => "RELATED_PEP",
        }
    }

    /// Parse a condition tag, failing loudly on anything unrecognized.
    pub fn parse(tag: &str) -> Result<Self, RulesError> {
        match tag {
            "NO_PEP" => Ok(Self::NoPep),
            "CURRENT_PEP" => Ok(Self::CurrentPep),
            "FORMER_PEP" => Ok(Self::FormerPep),
            "RELATED_PEP" => Ok(Self::RelatedPep),
            other => Err(RulesError::UnknownTag {
                concept: "pep condition".to_string(),
                tag: other.to_string(),
            }),
        }
    }

    /// Whether this condition marks the subject as exposed.
    pub fn is_exposed(&self) -> bool {
        !matches!(self, Self::NoPep)
    }
}

impl std::fmt::Display for PepCondition {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Seniority of the public office held (drives the escalation floor).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum PepSeniority {
    /// Ordinary public function.
    #[default]
    #[serde(rename = "ORDINARIO")]
    Ordinario,
    /// High-office position (minister, magistrate, general officer, ...).
    #[serde(rename = "ALTO_NIVEL")]
    AltoNivel,
}

impl PepSeniority {
    /// The wire tag for this seniority.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Ordinario => "ORDINARIO",
            Self::AltoNivel => "ALTO_NIVEL",
        }
    }

    /// Parse a seniority tag, failing loudly on anything unrecognized.
    pub fn parse(tag: &str) -> Result<Self, RulesError> {
        match tag {
            "ORDINARIO" => Ok(Self::Ordinario),
            "ALTO_NIVEL" => Ok(Self::AltoNivel),
            other => Err(RulesError::UnknownTag {
                concept: "pep seniority".to_string(),
                tag: other.to_string(),
            }),
        }
    }
}

impl std::fmt::Display for PepSeniority {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ─── Declaration Status ──────────────────────────────────────────────

/// Lifecycle status of a declaration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DeclarationStatus {
    /// Incomplete; `RELATED_PEP` waits here for its first linked relative.
    Draft,
    /// Awaiting the compliance officer's decision.
    PendingApproval,
    /// Approved by the compliance officer.
    Approved,
}

impl DeclarationStatus {
    /// The wire tag for this status.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Draft => "DRAFT",
            Self::PendingApproval => "PENDING_APPROVAL",
            Self::Approved => "APPROVED",
        }
    }
}

impl std::fmt::Display for DeclarationStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ─── Relatives ───────────────────────────────────────────────────────

/// Evaluation state of a linked relative/associate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RelativeEvaluationStatus {
    /// Registered, not yet reviewed.
    Pending,
    /// Under review by the compliance unit.
    InReview,
    /// Review finished (terminal).
    Evaluated,
}

impl RelativeEvaluationStatus {
    /// The wire tag for this status.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "PENDING",
            Self::InReview => "IN_REVIEW",
            Self::Evaluated => "EVALUATED",
        }
    }

    /// The next state in the review sequence, if any.
    pub fn next(&self) -> Option<Self> {
        match self {
            Self::Pending => Some(Self::InReview),
            Self::InReview => Some(Self::Evaluated),
            Self::Evaluated => None,
        }
    }
}

impl std::fmt::Display for RelativeEvaluationStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A relative or close associate linked to a `RELATED_PEP` declaration.
///
/// Never deleted; only advanced through its evaluation states.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PepRelative {
    /// Unique relative identifier.
    pub id: RelativeId,
    /// Full name as registered.
    pub full_name: String,
    /// Relationship to the subject (spouse, partner, associate, ...).
    pub relationship: String,
    /// Review state of this relative.
    pub evaluation_status: RelativeEvaluationStatus,
    /// Who registered the relative.
    pub added_by: ActorId,
    /// When the relative was registered.
    pub added_at: Timestamp,
}

// ─── Condition History ───────────────────────────────────────────────

/// One append-only entry in the declaration's condition history.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConditionChange {
    /// Condition before the change; `None` for the initial declaration.
    pub from: Option<PepCondition>,
    /// Condition after the change.
    pub to: PepCondition,
    /// When the change was recorded.
    pub timestamp: Timestamp,
    /// Who recorded it.
    pub actor: ActorId,
    /// Why.
    pub justification: String,
}

// ─── Declaration ─────────────────────────────────────────────────────

/// A subject's political-exposure declaration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PepDeclaration {
    /// Unique declaration identifier.
    pub id: DeclarationId,
    /// The dossier this declaration belongs to.
    pub dossier_id: DossierId,
    /// Current political-exposure condition.
    pub condition: PepCondition,
    /// Seniority of the office held.
    pub seniority: PepSeniority,
    /// Kind of office or function (free text from the position catalog).
    pub pep_type: Option<String>,
    /// Country of the office.
    pub country: Option<String>,
    /// Relationship kind, when the condition is `RELATED_PEP`.
    pub relationship_type: Option<String>,
    /// Where the classification information came from. Mandatory for any
    /// exposed condition.
    pub information_source: String,
    /// Why the subject is classified this way. Mandatory for any exposed
    /// condition.
    pub justification: String,
    /// Lifecycle status.
    pub status: DeclarationStatus,
    /// Who recorded the declaration.
    pub declared_by: ActorId,
    /// When it was recorded.
    pub declared_at: Timestamp,
    /// Officer who approved, once approved.
    pub approved_by: Option<ActorId>,
    /// When it was approved.
    pub approved_at: Option<Timestamp>,
    /// Linked relatives/associates.
    pub relatives: Vec<PepRelative>,
    /// Append-only condition history (initial entry included).
    pub condition_history: Vec<ConditionChange>,
    /// Optimistic concurrency version.
    pub version: u64,
}

impl PepDeclaration {
    /// Record a declaration.
    ///
    /// Validation: an exposed condition requires non-empty justification and
    /// information source; `RELATED_PEP` requires a relationship type.
    /// An officer's declaration is approved on the spot — except
    /// `RELATED_PEP` with no linked relatives yet, which stays in `DRAFT`
    /// for everyone.
    #[allow(clippy::too_many_arguments)]
    pub fn declare(
        id: DeclarationId,
        dossier_id: DossierId,
        condition: PepCondition,
        seniority: PepSeniority,
        pep_type: Option<String>,
        country: Option<String>,
        relationship_type: Option<String>,
        information_source: &str,
        justification: &str,
        actor: &ActorRef,
    ) -> Result<Self, RulesError> {
        if !actor.role.has_at_least(Role::Commercial) {
            return Err(RulesError::unauthorized(
                "record a PEP declaration",
                Role::Commercial.as_str(),
                actor.role.as_str(),
            ));
        }
        validate_exposure_fields(condition, justification, information_source)?;
        if condition == PepCondition::RelatedPep
            && relationship_type.as_deref().map_or(true, |r| r.trim().is_empty())
        {
            return Err(RulesError::Validation(
                "RELATED_PEP requires a relationship type".to_string(),
            ));
        }

        let now = Timestamp::now();
        let status = initial_status(condition, 0, actor.role);
        let (approved_by, approved_at) = if status == DeclarationStatus::Approved {
            (Some(actor.id.clone()), Some(now))
        } else {
            (None, None)
        };

        Ok(Self {
            id,
            dossier_id,
            condition,
            seniority,
            pep_type,
            country,
            relationship_type,
            information_source: information_source.to_string(),
            justification: justification.to_string(),
            status,
            declared_by: actor.id.clone(),
            declared_at: now,
            approved_by,
            approved_at,
            relatives: Vec::new(),
            condition_history: vec![ConditionChange {
                from: None,
                to: condition,
                timestamp: now,
                actor: actor.id.clone(),
                justification: justification.to_string(),
            }],
            version: 1,
        })
    }

    /// Whether this declaration must trigger risk escalation and alerting.
    pub fn requires_escalation(&self) -> bool {
        self.condition.is_exposed()
    }

    /// Description used in error messages and the ledger.
    pub fn entity(&self) -> String {
        self.id.to_string()
    }

    /// Move a draft into the approval queue
    /// (`DRAFT → PENDING_APPROVAL`).
    ///
    /// `RELATED_PEP` requires at least one linked relative first.
    pub fn submit_for_approval(&mut self, actor: &ActorRef) -> Result<(), RulesError> {
        if !actor.role.has_at_least(Role::Commercial) {
            return Err(RulesError::unauthorized(
                "submit a PEP declaration",
                Role::Commercial.as_str(),
                actor.role.as_str(),
            ));
        }
        if self.status != DeclarationStatus::Draft {
            return Err(RulesError::invalid_state(
                self.entity(),
                self.status.as_str(),
                DeclarationStatus::PendingApproval.as_str(),
            ));
        }
        if self.condition == PepCondition::RelatedPep && self.relatives.is_empty() {
            return Err(RulesError::Validation(
                "RELATED_PEP requires at least one linked relative before approval".to_string(),
            ));
        }
        self.status = DeclarationStatus::PendingApproval;
        self.version += 1;
        Ok(())
    }

    /// Approve the declaration (`PENDING_APPROVAL → APPROVED`). Officer only.
    ///
    /// The service guarantees an enhanced-measures record exists before this
    /// completes for an exposed condition.
    pub fn approve(&mut self, actor: &ActorRef) -> Result<(), RulesError> {
        if !actor.role.is_officer() {
            return Err(RulesError::unauthorized(
                "approve a PEP declaration",
                Role::ComplianceOfficer.as_str(),
                actor.role.as_str(),
            ));
        }
        if self.status != DeclarationStatus::PendingApproval {
            return Err(RulesError::invalid_state(
                self.entity(),
                self.status.as_str(),
                DeclarationStatus::Approved.as_str(),
            ));
        }
        self.status = DeclarationStatus::Approved;
        self.approved_by = Some(actor.id.clone());
        self.approved_at = Some(Timestamp::now());
        self.version += 1;
        Ok(())
    }

    /// Link a relative/associate. Allowed in every status; relatives are
    /// never deleted.
    pub fn add_relative(
        &mut self,
        actor: &ActorRef,
        full_name: &str,
        relationship: &str,
    ) -> Result<RelativeId, RulesError> {
        if !actor.role.has_at_least(Role::Commercial) {
            return Err(RulesError::unauthorized(
                "link a relative",
                Role::Commercial.as_str(),
                actor.role.as_str(),
            ));
        }
        if full_name.trim().is_empty() || relationship.trim().is_empty() {
            return Err(RulesError::Validation(
                "relative name and relationship are mandatory".to_string(),
            ));
        }
        let id = RelativeId::new();
        self.relatives.push(PepRelative {
            id,
            full_name: full_name.to_string(),
            relationship: relationship.to_string(),
            evaluation_status: RelativeEvaluationStatus::Pending,
            added_by: actor.id.clone(),
            added_at: Timestamp::now(),
        });
        self.version += 1;
        Ok(id)
    }

    /// Advance a relative's review state
    /// (`PENDING → IN_REVIEW → EVALUATED`).
    pub fn advance_relative(
        &mut self,
        actor: &ActorRef,
        relative_id: RelativeId,
    ) -> Result<RelativeEvaluationStatus, RulesError> {
        if !actor.role.has_at_least(Role::ComplianceAnalyst) {
            return Err(RulesError::unauthorized(
                "advance a relative's review",
                Role::ComplianceAnalyst.as_str(),
                actor.role.as_str(),
            ));
        }
        let entity = self.entity();
        let relative = self
            .relatives
            .iter_mut()
            .find(|r| r.id == relative_id)
            .ok_or_else(|| RulesError::NotFound {
                entity: format!("{relative_id} on {entity}"),
            })?;
        match relative.evaluation_status.next() {
            Some(next) => {
                relative.evaluation_status = next;
                self.version += 1;
                Ok(next)
            }
            None => Err(RulesError::invalid_state(
                format!("relative {relative_id}"),
                relative.evaluation_status.as_str(),
                "next review state",
            )),
        }
    }

    /// Record a condition change, appending to the history.
    ///
    /// The declaration re-enters the approval flow: an officer's change is
    /// approved on the spot, anyone else's goes back to pending (or draft,
    /// for `RELATED_PEP` without relatives).
    pub fn change_condition(
        &mut self,
        actor: &ActorRef,
        new_condition: PepCondition,
        new_seniority: PepSeniority,
        justification: &str,
        information_source: &str,
    ) -> Result<(), RulesError> {
        if !actor.role.has_at_least(Role::ComplianceAnalyst) {
            return Err(RulesError::unauthorized(
                "change a PEP condition",
                Role::ComplianceAnalyst.as_str(),
                actor.role.as_str(),
            ));
        }
        if justification.trim().is_empty() {
            return Err(RulesError::MissingJustification {
                field: "condition change justification".to_string(),
            });
        }
        validate_exposure_fields(new_condition, justification, information_source)?;

        let now = Timestamp::now();
        self.condition_history.push(ConditionChange {
            from: Some(self.condition),
            to: new_condition,
            timestamp: now,
            actor: actor.id.clone(),
            justification: justification.to_string(),
        });
        self.condition = new_condition;
        self.seniority = new_seniority;
        self.information_source = information_source.to_string();
        self.justification = justification.to_string();

        self.status = initial_status(new_condition, self.relatives.len(), actor.role);
        if self.status == DeclarationStatus::Approved {
            self.approved_by = Some(actor.id.clone());
            self.approved_at = Some(now);
        } else {
            self.approved_by = None;
            self.approved_at = None;
        }
        self.version += 1;
        Ok(())
    }
}

/// Status a declaration (re)enters given its condition, linked relatives,
/// and the recording role.
fn initial_status(
    condition: PepCondition,
    relative_count: usize,
    role: Role,
) -> DeclarationStatus {
    if condition == PepCondition::RelatedPep && relative_count == 0 {
        DeclarationStatus::Draft
    } else if role.is_officer() {
        DeclarationStatus::Approved
    } else {
        DeclarationStatus::PendingApproval
    }
}

/// An exposed condition requires non-empty justification and source.
fn validate_exposure_fields(
    condition: PepCondition,
    justification: &str,
    information_source: &str,
) -> Result<(), RulesError> {
    if condition.is_exposed() {
        if justification.trim().is_empty() {
            return Err(RulesError::MissingJustification {
                field: "pep justification".to_string(),
            });
        }
        if information_source.trim().is_empty() {
            return Err(RulesError::MissingJustification {
                field: "information source".to_string(),
            });
        }
    }
    Ok(())
}

// ─── Tests ───────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    fn analyst() -> ActorRef {
        ActorRef::new("lrojas", Role::ComplianceAnalyst)
    }

    fn officer() -> ActorRef {
        ActorRef::new("mgarcia", Role::ComplianceOfficer)
    }

    fn declare_as(
        condition: PepCondition,
        actor: &ActorRef,
    ) -> Result<PepDeclaration, RulesError> {
        PepDeclaration::declare(
            DeclarationId::new(),
            DossierId::new(),
            condition,
            PepSeniority::Ordinario,
            Some("Councilman".to_string()),
            Some("CO".to_string()),
            (condition == PepCondition::RelatedPep).then(|| "SPOUSE".to_string()),
            "Public registry cross-check",
            "Office verified against the official gazette",
            actor,
        )
    }

    // ── Declaration validation ───────────────────────────────────────

    #[test]
    fn test_exposed_condition_requires_justification_and_source() {
        let err = PepDeclaration::declare(
            DeclarationId::new(),
            DossierId::new(),
            PepCondition::CurrentPep,
            PepSeniority::Ordinario,
            None,
            None,
            None,
            "a source",
            "   ",
            &analyst(),
        )
        .unwrap_err();
        assert!(matches!(err, RulesError::MissingJustification { .. }));

        let err = PepDeclaration::declare(
            DeclarationId::new(),
            DossierId::new(),
            PepCondition::CurrentPep,
            PepSeniority::Ordinario,
            None,
            None,
            None,
            "",
            "a justification",
            &analyst(),
        )
        .unwrap_err();
        assert!(matches!(err, RulesError::MissingJustification { .. }));
    }

    #[test]
    fn test_no_pep_needs_no_justification() {
        let decl = PepDeclaration::declare(
            DeclarationId::new(),
            DossierId::new(),
            PepCondition::NoPep,
            PepSeniority::Ordinario,
            None,
            None,
            None,
            "",
            "",
            &analyst(),
        )
        .unwrap();
        assert!(!decl.requires_escalation());
        assert_eq!(decl.status, DeclarationStatus::PendingApproval);
    }

    #[test]
    fn test_related_pep_requires_relationship_type() {
        let err = PepDeclaration::declare(
            DeclarationId::new(),
            DossierId::new(),
            PepCondition::RelatedPep,
            PepSeniority::Ordinario,
            None,
            None,
            None,
            "source",
            "justified",
            &analyst(),
        )
        .unwrap_err();
        assert!(matches!(err, RulesError::Validation(_)));
    }

    // ── Status on declaration ────────────────────────────────────────

    #[test]
    fn test_officer_declaration_approved_immediately() {
        let decl = declare_as(PepCondition::CurrentPep, &officer()).unwrap();
        assert_eq!(decl.status, DeclarationStatus::Approved);
        assert!(decl.approved_by.is_some());
    }

    #[test]
    fn test_analyst_declaration_pends() {
        let decl = declare_as(PepCondition::CurrentPep, &analyst()).unwrap();
        assert_eq!(decl.status, DeclarationStatus::PendingApproval);
        assert!(decl.approved_by.is_none());
    }

    #[test]
    fn test_related_pep_starts_draft_even_for_officer() {
        let decl = declare_as(PepCondition::RelatedPep, &officer()).unwrap();
        assert_eq!(decl.status, DeclarationStatus::Draft);
    }

    // ── Related-PEP relative gate ────────────────────────────────────

    #[test]
    fn test_related_pep_cannot_pend_without_relatives() {
        let mut decl = declare_as(PepCondition::RelatedPep, &analyst()).unwrap();
        let err = decl.submit_for_approval(&analyst()).unwrap_err();
        assert!(matches!(err, RulesError::Validation(_)));
        assert_eq!(decl.status, DeclarationStatus::Draft);

        decl.add_relative(&analyst(), "Ana Torres", "SPOUSE").unwrap();
        decl.submit_for_approval(&analyst()).unwrap();
        assert_eq!(decl.status, DeclarationStatus::PendingApproval);
    }

    // ── Approval ─────────────────────────────────────────────────────

    #[test]
    fn test_only_officer_approves() {
        let mut decl = declare_as(PepCondition::CurrentPep, &analyst()).unwrap();
        assert!(matches!(
            decl.approve(&analyst()),
            Err(RulesError::Unauthorized { .. })
        ));
        decl.approve(&officer()).unwrap();
        assert_eq!(decl.status, DeclarationStatus::Approved);
    }

    #[test]
    fn test_cannot_approve_twice() {
        let mut decl = declare_as(PepCondition::CurrentPep, &analyst()).unwrap();
        decl.approve(&officer()).unwrap();
        assert!(matches!(
            decl.approve(&officer()),
            Err(RulesError::InvalidState { .. })
        ));
    }

    // ── Relatives ────────────────────────────────────────────────────

    #[test]
    fn test_relative_review_sequence() {
        let mut decl = declare_as(PepCondition::RelatedPep, &analyst()).unwrap();
        let id = decl.add_relative(&analyst(), "Ana Torres", "SPOUSE").unwrap();

        assert_eq!(
            decl.advance_relative(&analyst(), id).unwrap(),
            RelativeEvaluationStatus::InReview
        );
        assert_eq!(
            decl.advance_relative(&analyst(), id).unwrap(),
            RelativeEvaluationStatus::Evaluated
        );
        assert!(matches!(
            decl.advance_relative(&analyst(), id),
            Err(RulesError::InvalidState { .. })
        ));
        // Never deleted.
        assert_eq!(decl.relatives.len(), 1);
    }

    #[test]
    fn test_advance_unknown_relative() {
        let mut decl = declare_as(PepCondition::RelatedPep, &analyst()).unwrap();
        assert!(matches!(
            decl.advance_relative(&analyst(), RelativeId::new()),
            Err(RulesError::NotFound { .. })
        ));
    }

    #[test]
    fn test_relatives_allowed_after_approval() {
        let mut decl = declare_as(PepCondition::CurrentPep, &officer()).unwrap();
        decl.add_relative(&analyst(), "Ana Torres", "DAUGHTER").unwrap();
        assert_eq!(decl.relatives.len(), 1);
    }

    // ── Condition history ────────────────────────────────────────────

    #[test]
    fn test_initial_declaration_recorded_in_history() {
        let decl = declare_as(PepCondition::CurrentPep, &analyst()).unwrap();
        assert_eq!(decl.condition_history.len(), 1);
        assert_eq!(decl.condition_history[0].from, None);
        assert_eq!(decl.condition_history[0].to, PepCondition::CurrentPep);
    }

    #[test]
    fn test_condition_change_appends_and_reenters_approval() {
        let mut decl = declare_as(PepCondition::NoPep, &officer()).unwrap();
        assert_eq!(decl.status, DeclarationStatus::Approved);

        decl.change_condition(
            &analyst(),
            PepCondition::FormerPep,
            PepSeniority::Ordinario,
            "Subject elected to municipal office in March",
            "Electoral registry",
        )
        .unwrap();

        assert_eq!(decl.condition, PepCondition::FormerPep);
        assert_eq!(decl.status, DeclarationStatus::PendingApproval);
        assert!(decl.approved_by.is_none());
        assert_eq!(decl.condition_history.len(), 2);
        assert_eq!(
            decl.condition_history[1].from,
            Some(PepCondition::NoPep)
        );
    }

    #[test]
    fn test_condition_change_requires_justification() {
        let mut decl = declare_as(PepCondition::NoPep, &analyst()).unwrap();
        let history_before = decl.condition_history.len();
        let err = decl
            .change_condition(
                &analyst(),
                PepCondition::CurrentPep,
                PepSeniority::AltoNivel,
                "",
                "registry",
            )
            .unwrap_err();
        assert!(matches!(err, RulesError::MissingJustification { .. }));
        assert_eq!(decl.condition, PepCondition::NoPep);
        assert_eq!(decl.condition_history.len(), history_before);
    }

    // ── Serialization ────────────────────────────────────────────────

    #[test]
    fn test_condition_tags() {
        assert_eq!(
            serde_json::to_string(&PepCondition::RelatedPep).unwrap(),
            "\"RELATED_PEP\""
        );
        assert_eq!(PepCondition::parse("NO_PEP").unwrap(), PepCondition::NoPep);
        assert!(PepCondition::parse("MAYBE_PEP").is_err());
    }

    #[test]
    fn test_declaration_serde_roundtrip() {
        let decl = declare_as(PepCondition::CurrentPep, &analyst()).unwrap();
        let json = serde_json::to_string(&decl).unwrap();
        let back: PepDeclaration = serde_json::from_str(&json).unwrap();
        assert_eq!(back.condition, decl.condition);
        assert_eq!(back.status, decl.status);
        assert_eq!(back.id, decl.id);
    }
}
