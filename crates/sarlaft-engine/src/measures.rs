//! # Enhanced Due-Diligence Measures
//!
//! The control checklist activated when a subject is classified as
//! politically exposed: funds-origin verification, expanded screening,
//! intensified monitoring, additional documentation, and periodic update.
//!
//! ## Invariant
//!
//! `compliance_officer_approval` can be set true only by the compliance
//! officer; any other role fails without side effect. Updating the checklist
//! resets the officer sign-off, so an approval always covers the measures as
//! they currently stand.

use serde::{Deserialize, Serialize};

use sarlaft_core::{ActorId, ActorRef, DeclarationId, Role, RulesError, Timestamp};

/// One due-diligence control with its activation detail.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MeasureToggle {
    /// Whether the control is active.
    pub enabled: bool,
    /// Free-text detail of how the control is applied.
    pub detail: Option<String>,
    /// Application frequency (e.g. `"SEMESTRAL"`), where periodic.
    pub frequency: Option<String>,
}

impl MeasureToggle {
    /// An active toggle with detail.
    pub fn on(detail: &str) -> Self {
        Self {
            enabled: true,
            detail: Some(detail.to_string()),
            frequency: None,
        }
    }
}

/// The five controls of the checklist.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MeasureSet {
    /// Verification of the origin of funds and wealth.
    pub funds_origin_verification: MeasureToggle,
    /// Screening expanded to relatives and associates.
    pub expanded_screening: MeasureToggle,
    /// Intensified transactional monitoring.
    pub intensified_monitoring: MeasureToggle,
    /// Additional supporting documentation requirements.
    pub additional_documentation: MeasureToggle,
    /// Periodic update of the subject's information.
    pub periodic_update: MeasureToggle,
}

impl MeasureSet {
    /// Whether any control is active.
    pub fn any_enabled(&self) -> bool {
        self.funds_origin_verification.enabled
            || self.expanded_screening.enabled
            || self.intensified_monitoring.enabled
            || self.additional_documentation.enabled
            || self.periodic_update.enabled
    }
}

/// The enhanced-measures record of one PEP declaration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EnhancedMeasures {
    /// The declaration these measures cover.
    pub declaration_id: DeclarationId,
    /// The control checklist.
    pub measures: MeasureSet,
    /// Why this set of controls was chosen. Mandatory.
    pub justification: String,
    /// Officer sign-off over the current checklist.
    pub compliance_officer_approval: bool,
    /// Officer who signed off, when approved.
    pub approved_by: Option<ActorId>,
    /// When the sign-off happened.
    pub approved_at: Option<Timestamp>,
    /// Who last updated the record.
    pub updated_by: ActorId,
    /// When it was last updated.
    pub updated_at: Timestamp,
    /// Optimistic concurrency version.
    pub version: u64,
}

impl EnhancedMeasures {
    /// The all-off baseline auto-created when a declaration is approved
    /// before the compliance unit has defined the concrete controls.
    pub fn baseline(declaration_id: DeclarationId, actor: &ActorRef) -> Self {
        Self {
            declaration_id,
            measures: MeasureSet::default(),
            justification: "Activated on PEP approval; controls pending definition".to_string(),
            compliance_officer_approval: false,
            approved_by: None,
            approved_at: None,
            updated_by: actor.id.clone(),
            updated_at: Timestamp::now(),
            version: 1,
        }
    }

    /// Description used in error messages and the ledger.
    pub fn entity(&self) -> String {
        format!("measures for {}", self.declaration_id)
    }

    /// Replace the checklist. Resets the officer sign-off.
    pub fn update(
        &mut self,
        actor: &ActorRef,
        measures: MeasureSet,
        justification: &str,
    ) -> Result<(), RulesError> {
        if !actor.role.has_at_least(Role::ComplianceAnalyst) {
            return Err(RulesError::unauthorized(
                "update enhanced measures",
                Role::ComplianceAnalyst.as_str(),
                actor.role.as_str(),
            ));
        }
        if justification.trim().is_empty() {
            return Err(RulesError::MissingJustification {
                field: "measures justification".to_string(),
            });
        }
        self.measures = measures;
        self.justification = justification.to_string();
        self.reset_officer_approval();
        self.updated_by = actor.id.clone();
        self.updated_at = Timestamp::now();
        self.version += 1;
        Ok(())
    }

    /// Officer sign-off over the current checklist. Officer only; any other
    /// role fails without side effect.
    pub fn approve(&mut self, actor: &ActorRef) -> Result<(), RulesError> {
        if !actor.role.is_officer() {
            return Err(RulesError::unauthorized(
                "approve enhanced measures",
                Role::ComplianceOfficer.as_str(),
                actor.role.as_str(),
            ));
        }
        if self.compliance_officer_approval {
            return Err(RulesError::invalid_state(
                self.entity(),
                "APPROVED",
                "APPROVED",
            ));
        }
        self.compliance_officer_approval = true;
        self.approved_by = Some(actor.id.clone());
        self.approved_at = Some(Timestamp::now());
        self.version += 1;
        Ok(())
    }

    /// Drop the officer sign-off (used when the underlying declaration's
    /// condition changes).
    pub fn reset_officer_approval(&mut self) {
        self.compliance_officer_approval = false;
        self.approved_by = None;
        self.approved_at = None;
    }
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

    fn baseline() -> EnhancedMeasures {
        EnhancedMeasures::baseline(DeclarationId::new(), &officer())
    }

    fn full_set() -> MeasureSet {
        MeasureSet {
            funds_origin_verification: MeasureToggle::on("Bank certification required"),
            expanded_screening: MeasureToggle::on("Spouse and first-degree relatives"),
            intensified_monitoring: MeasureToggle {
                enabled: true,
                detail: Some("Transactional review".to_string()),
                frequency: Some("MENSUAL".to_string()),
            },
            additional_documentation: MeasureToggle::default(),
            periodic_update: MeasureToggle {
                enabled: true,
                detail: None,
                frequency: Some("SEMESTRAL".to_string()),
            },
        }
    }

    #[test]
    fn test_baseline_is_all_off_unapproved() {
        let m = baseline();
        assert!(!m.measures.any_enabled());
        assert!(!m.compliance_officer_approval);
        assert!(!m.justification.is_empty());
    }

    #[test]
    fn test_update_requires_justification() {
        let mut m = baseline();
        let err = m.update(&analyst(), full_set(), " ").unwrap_err();
        assert!(matches!(err, RulesError::MissingJustification { .. }));
        assert!(!m.measures.any_enabled());
    }

    #[test]
    fn test_update_resets_officer_approval() {
        let mut m = baseline();
        m.update(&analyst(), full_set(), "High-office current PEP")
            .unwrap();
        m.approve(&officer()).unwrap();
        assert!(m.compliance_officer_approval);

        m.update(&analyst(), full_set(), "Added monitoring frequency")
            .unwrap();
        assert!(!m.compliance_officer_approval);
        assert!(m.approved_by.is_none());
    }

    #[test]
    fn test_non_officer_approval_fails_without_side_effect() {
        let mut m = baseline();
        let version = m.version;
        let err = m.approve(&analyst()).unwrap_err();
        assert!(matches!(err, RulesError::Unauthorized { .. }));
        assert!(!m.compliance_officer_approval);
        assert!(m.approved_by.is_none());
        assert_eq!(m.version, version);
    }

    #[test]
    fn test_officer_approval_stamps() {
        let mut m = baseline();
        m.approve(&officer()).unwrap();
        assert!(m.compliance_officer_approval);
        assert_eq!(m.approved_by.as_ref().unwrap().as_str(), "mgarcia");
        assert!(m.approved_at.is_some());
    }

    #[test]
    fn test_double_approval_rejected() {
        let mut m = baseline();
        m.approve(&officer()).unwrap();
        assert!(matches!(
            m.approve(&officer()),
            Err(RulesError::InvalidState { .. })
        ));
    }

    #[test]
    fn test_measures_serde_roundtrip() {
        let mut m = baseline();
        m.update(&analyst(), full_set(), "Defined controls").unwrap();
        let json = serde_json::to_string(&m).unwrap();
        let back: EnhancedMeasures = serde_json::from_str(&json).unwrap();
        assert!(back.measures.intensified_monitoring.enabled);
        assert_eq!(
            back.measures.periodic_update.frequency.as_deref(),
            Some("SEMESTRAL")
        );
    }
}
