//! # Alert Lifecycle State Machine
//!
//! Models system- and user-raised compliance alerts tied to a dossier.
//!
//! ## States
//!
//! ```text
//! NUEVA ──▶ EN_SEGUIMIENTO ──▶ ATENDIDA ──▶ CERRADA (terminal)
//! ```
//!
//! Statuses only ever move forward. The compliance officer may close from
//! any non-terminal state with a mandatory reason and classification;
//! `CERRADA` is irreversible and alerts are never deleted.

use serde::{Deserialize, Serialize};

use sarlaft_core::{ActorId, ActorRef, AlertId, DossierId, Role, RulesError, Timestamp};

// ─── Level, Type, Origin ─────────────────────────────────────────────

/// Severity of an alert. Ordered: `Baja < Media < Alta < Critica`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum AlertLevel {
    /// Routine attention.
    #[serde(rename = "BAJA")]
    Baja,
    /// Reinforced attention.
    #[serde(rename = "MEDIA")]
    Media,
    /// Priority attention.
    #[serde(rename = "ALTA")]
    Alta,
    /// Immediate attention.
    #[serde(rename = "CRITICA")]
    Critica,
}

impl AlertLevel {
    /// The wire tag for this level (ASCII-normalized).
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Baja => "BAJA",
            Self::Media => "MEDIA",
            Self::Alta => "ALTA",
            Self::Critica => "CRITICA",
        }
    }

    /// Parse a level tag, failing loudly on anything unrecognized.
    pub fn parse(tag: &str) -> Result<Self, RulesError> {
        match tag {
            "BAJA" => Ok(Self::Baja),
            "MEDIA" => Ok(Self::Media),
            "ALTA" => Ok(Self::Alta),
            "CRITICA" => Ok(Self::Critica),
            other => Err(RulesError::UnknownTag {
                concept: "alert level".to_string(),
                tag: other.to_string(),
            }),
        }
    }

    /// Base priority contributed by the level (0–100 scale).
    pub fn base_priority(&self) -> f64 {
        match self {
            Self::Baja => 25.0,
            Self::Media => 50.0,
            Self::Alta => 75.0,
            Self::Critica => 100.0,
        }
    }
}

impl std::fmt::Display for AlertLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What kind of finding raised the alert.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AlertType {
    /// A politically exposed subject was detected.
    PepDetected,
    /// A restrictive-list screening produced a hit.
    ScreeningHit,
    /// The derived risk level escalated.
    RiskEscalation,
    /// Mandatory documentation is missing or expired.
    MissingDocumentation,
    /// Raised manually by an analyst.
    ManualReview,
}

impl AlertType {
    /// The wire tag for this type.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::PepDetected => "PEP_DETECTED",
            Self::ScreeningHit => "SCREENING_HIT",
            Self::RiskEscalation => "RISK_ESCALATION",
            Self::MissingDocumentation => "MISSING_DOCUMENTATION",
            Self::ManualReview => "MANUAL_REVIEW",
        }
    }

    /// Parse a type tag, failing loudly on anything unrecognized.
    pub fn parse(tag: &str) -> Result<Self, RulesError> {
        match tag {
            "PEP_DETECTED" => Ok(Self::PepDetected),
            "SCREENING_HIT" => Ok(Self::ScreeningHit),
            "RISK_ESCALATION" => Ok(Self::RiskEscalation),
            "MISSING_DOCUMENTATION" => Ok(Self::MissingDocumentation),
            "MANUAL_REVIEW" => Ok(Self::ManualReview),
            other => Err(RulesError::UnknownTag {
                concept: "alert type".to_string(),
                tag: other.to_string(),
            }),
        }
    }
}

impl std::fmt::Display for AlertType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Whether the system or a person raised the alert.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AlertOrigin {
    /// Raised by a rules-engine effect (PEP detection, escalation).
    #[serde(rename = "SISTEMA")]
    Sistema,
    /// Raised by a user.
    #[serde(rename = "MANUAL")]
    Manual,
}

impl std::fmt::Display for AlertOrigin {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Self::Sistema => "SISTEMA",
            Self::Manual => "MANUAL",
        })
    }
}

// ─── Status & Classification ─────────────────────────────────────────

/// Lifecycle status. Ordered so transitions can only move forward.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum AlertStatus {
    /// Just raised, unassigned.
    #[serde(rename = "NUEVA")]
    Nueva,
    /// Being followed up by the compliance unit.
    #[serde(rename = "EN_SEGUIMIENTO")]
    EnSeguimiento,
    /// Follow-up concluded, pending closure.
    #[serde(rename = "ATENDIDA")]
    Atendida,
    /// Closed by the compliance officer (terminal, irreversible).
    #[serde(rename = "CERRADA")]
    Cerrada,
}

impl AlertStatus {
    /// The wire tag for this status.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Nueva => "NUEVA",
            Self::EnSeguimiento => "EN_SEGUIMIENTO",
            Self::Atendida => "ATENDIDA",
            Self::Cerrada => "CERRADA",
        }
    }

    /// Parse a status tag, failing loudly on anything unrecognized.
    pub fn parse(tag: &str) -> Result<Self, RulesError> {
        match tag {
            "NUEVA" => Ok(Self::Nueva),
            "EN_SEGUIMIENTO" => Ok(Self::EnSeguimiento),
            "ATENDIDA" => Ok(Self::Atendida),
            "CERRADA" => Ok(Self::Cerrada),
            other => Err(RulesError::UnknownTag {
                concept: "alert status".to_string(),
                tag: other.to_string(),
            }),
        }
    }

    /// Whether this status is terminal.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Cerrada)
    }
}

impl std::fmt::Display for AlertStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How a closed alert was resolved.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AlertClassification {
    /// Risk was mitigated with controls.
    #[serde(rename = "MITIGADO")]
    Mitigado,
    /// Risk was accepted with justification.
    #[serde(rename = "ACEPTADO")]
    Aceptado,
    /// Escalated outside the unit (report to the regulator).
    #[serde(rename = "ESCALADO")]
    Escalado,
}

impl AlertClassification {
    /// The wire tag for this classification.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Mitigado => "MITIGADO",
            Self::Aceptado => "ACEPTADO",
            Self::Escalado => "ESCALADO",
        }
    }

    /// Parse a classification tag, failing loudly on anything unrecognized.
    pub fn parse(tag: &str) -> Result<Self, RulesError> {
        match tag {
            "MITIGADO" => Ok(Self::Mitigado),
            "ACEPTADO" => Ok(Self::Aceptado),
            "ESCALADO" => Ok(Self::Escalado),
            other => Err(RulesError::UnknownTag {
                concept: "alert classification".to_string(),
                tag: other.to_string(),
            }),
        }
    }
}

impl std::fmt::Display for AlertClassification {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ─── Records ─────────────────────────────────────────────────────────

/// One follow-up comment on an alert.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FollowUpRecord {
    /// Who followed up.
    pub actor: ActorId,
    /// The mandatory comment.
    pub comment: String,
    /// When.
    pub timestamp: Timestamp,
}

/// Closure detail of a closed alert.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClosureRecord {
    /// Mandatory closure reason.
    pub reason: String,
    /// How the alert was resolved.
    pub classification: AlertClassification,
    /// Officer who closed it.
    pub closed_by: ActorId,
    /// When.
    pub closed_at: Timestamp,
}

/// One entry in the alert's own transition history.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AlertTransitionRecord {
    /// Status before the transition.
    pub from: AlertStatus,
    /// Status after the transition.
    pub to: AlertStatus,
    /// When.
    pub timestamp: Timestamp,
    /// Who performed it.
    pub actor: ActorId,
}

// ─── Alert ───────────────────────────────────────────────────────────

/// A compliance alert tied to a dossier.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Alert {
    /// Unique alert identifier.
    pub id: AlertId,
    /// The dossier the alert concerns.
    pub dossier_id: DossierId,
    /// What kind of finding raised it.
    pub alert_type: AlertType,
    /// Severity level.
    pub level: AlertLevel,
    /// Lifecycle status.
    pub status: AlertStatus,
    /// System- or user-originated.
    pub origin: AlertOrigin,
    /// Detecting user, for manual alerts.
    pub detected_by: Option<ActorId>,
    /// When the alert was raised.
    pub detected_at: Timestamp,
    /// Derived priority on a 0–100 scale; never decreases over the
    /// alert's life.
    pub priority_score: f64,
    /// Follow-up trail.
    pub follow_ups: Vec<FollowUpRecord>,
    /// Closure detail, once closed.
    pub closure: Option<ClosureRecord>,
    /// Optimistic concurrency version.
    pub version: u64,
    /// Ordered log of all status transitions.
    pub transitions: Vec<AlertTransitionRecord>,
}

impl Alert {
    /// Raise a system-originated alert (no role gate; the engine raises
    /// these as side effects of other validated operations).
    pub fn system(id: AlertId, dossier_id: DossierId, alert_type: AlertType, level: AlertLevel) -> Self {
        Self::build(id, dossier_id, alert_type, level, AlertOrigin::Sistema, None)
    }

    /// Raise a user-originated alert. Requires at least the commercial role.
    pub fn manual(
        id: AlertId,
        dossier_id: DossierId,
        alert_type: AlertType,
        level: AlertLevel,
        actor: &ActorRef,
    ) -> Result<Self, RulesError> {
        if !actor.role.has_at_least(Role::Commercial) {
            return Err(RulesError::unauthorized(
                "raise an alert",
                Role::Commercial.as_str(),
                actor.role.as_str(),
            ));
        }
        Ok(Self::build(
            id,
            dossier_id,
            alert_type,
            level,
            AlertOrigin::Manual,
            Some(actor.id.clone()),
        ))
    }

    fn build(
        id: AlertId,
        dossier_id: DossierId,
        alert_type: AlertType,
        level: AlertLevel,
        origin: AlertOrigin,
        detected_by: Option<ActorId>,
    ) -> Self {
        Self {
            id,
            dossier_id,
            alert_type,
            level,
            status: AlertStatus::Nueva,
            origin,
            detected_by,
            detected_at: Timestamp::now(),
            priority_score: level.base_priority(),
            follow_ups: Vec::new(),
            closure: None,
            version: 1,
            transitions: Vec::new(),
        }
    }

    /// Description used in error messages and the ledger.
    pub fn entity(&self) -> String {
        self.id.to_string()
    }

    /// Record a follow-up (`NUEVA | EN_SEGUIMIENTO → EN_SEGUIMIENTO`).
    ///
    /// The comment is mandatory.
    pub fn mark_follow_up(&mut self, actor: &ActorRef, comment: &str) -> Result<(), RulesError> {
        if !actor.role.has_at_least(Role::ComplianceAnalyst) {
            return Err(RulesError::unauthorized(
                "follow up an alert",
                Role::ComplianceAnalyst.as_str(),
                actor.role.as_str(),
            ));
        }
        if comment.trim().is_empty() {
            return Err(RulesError::MissingComment);
        }
        if !matches!(self.status, AlertStatus::Nueva | AlertStatus::EnSeguimiento) {
            return Err(RulesError::invalid_state(
                self.entity(),
                self.status.as_str(),
                AlertStatus::EnSeguimiento.as_str(),
            ));
        }
        self.follow_ups.push(FollowUpRecord {
            actor: actor.id.clone(),
            comment: comment.to_string(),
            timestamp: Timestamp::now(),
        });
        if self.status != AlertStatus::EnSeguimiento {
            self.do_transition(AlertStatus::EnSeguimiento, actor);
        } else {
            self.version += 1;
        }
        Ok(())
    }

    /// Conclude the follow-up (`EN_SEGUIMIENTO → ATENDIDA`). Comment
    /// mandatory.
    pub fn mark_attended(&mut self, actor: &ActorRef, comment: &str) -> Result<(), RulesError> {
        if !actor.role.has_at_least(Role::ComplianceAnalyst) {
            return Err(RulesError::unauthorized(
                "mark an alert attended",
                Role::ComplianceAnalyst.as_str(),
                actor.role.as_str(),
            ));
        }
        if comment.trim().is_empty() {
            return Err(RulesError::MissingComment);
        }
        if self.status != AlertStatus::EnSeguimiento {
            return Err(RulesError::invalid_state(
                self.entity(),
                self.status.as_str(),
                AlertStatus::Atendida.as_str(),
            ));
        }
        self.follow_ups.push(FollowUpRecord {
            actor: actor.id.clone(),
            comment: comment.to_string(),
            timestamp: Timestamp::now(),
        });
        self.do_transition(AlertStatus::Atendida, actor);
        Ok(())
    }

    /// Close the alert (any non-terminal status `→ CERRADA`).
    ///
    /// Officer only; reason mandatory; irreversible. A second close fails
    /// with `InvalidState` and changes nothing.
    pub fn close(
        &mut self,
        actor: &ActorRef,
        reason: &str,
        classification: AlertClassification,
    ) -> Result<(), RulesError> {
        if !actor.role.is_officer() {
            return Err(RulesError::unauthorized(
                "close an alert",
                Role::ComplianceOfficer.as_str(),
                actor.role.as_str(),
            ));
        }
        if reason.trim().is_empty() {
            return Err(RulesError::MissingJustification {
                field: "closure reason".to_string(),
            });
        }
        if self.status.is_terminal() {
            return Err(RulesError::invalid_state(
                self.entity(),
                self.status.as_str(),
                AlertStatus::Cerrada.as_str(),
            ));
        }
        self.closure = Some(ClosureRecord {
            reason: reason.to_string(),
            classification,
            closed_by: actor.id.clone(),
            closed_at: Timestamp::now(),
        });
        self.do_transition(AlertStatus::Cerrada, actor);
        Ok(())
    }

    // ─── Internals ───────────────────────────────────────────────────

    fn do_transition(&mut self, to: AlertStatus, actor: &ActorRef) {
        self.transitions.push(AlertTransitionRecord {
            from: self.status,
            to,
            timestamp: Timestamp::now(),
            actor: actor.id.clone(),
        });
        self.status = to;
        self.version += 1;
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

    fn make_alert() -> Alert {
        Alert::manual(
            AlertId::new(),
            DossierId::new(),
            AlertType::ManualReview,
            AlertLevel::Media,
            &analyst(),
        )
        .unwrap()
    }

    // ── Creation ─────────────────────────────────────────────────────

    #[test]
    fn test_manual_alert_records_detector() {
        let a = make_alert();
        assert_eq!(a.status, AlertStatus::Nueva);
        assert_eq!(a.origin, AlertOrigin::Manual);
        assert_eq!(a.detected_by.as_ref().unwrap().as_str(), "lrojas");
        assert_eq!(a.priority_score, 50.0);
    }

    #[test]
    fn test_system_alert_has_no_detector() {
        let a = Alert::system(
            AlertId::new(),
            DossierId::new(),
            AlertType::PepDetected,
            AlertLevel::Alta,
        );
        assert_eq!(a.origin, AlertOrigin::Sistema);
        assert!(a.detected_by.is_none());
        assert_eq!(a.priority_score, 75.0);
    }

    #[test]
    fn test_auditor_cannot_raise() {
        let result = Alert::manual(
            AlertId::new(),
            DossierId::new(),
            AlertType::ManualReview,
            AlertLevel::Baja,
            &ActorRef::new("aud", Role::Auditor),
        );
        assert!(matches!(result, Err(RulesError::Unauthorized { .. })));
    }

    // ── Follow-up ────────────────────────────────────────────────────

    #[test]
    fn test_follow_up_requires_comment() {
        let mut a = make_alert();
        let err = a.mark_follow_up(&analyst(), "  ").unwrap_err();
        assert!(matches!(err, RulesError::MissingComment));
        assert_eq!(a.status, AlertStatus::Nueva);
        assert!(a.follow_ups.is_empty());
    }

    #[test]
    fn test_follow_up_moves_to_en_seguimiento() {
        let mut a = make_alert();
        a.mark_follow_up(&analyst(), "Requested account statements")
            .unwrap();
        assert_eq!(a.status, AlertStatus::EnSeguimiento);
        assert_eq!(a.follow_ups.len(), 1);

        // A second follow-up stays in EN_SEGUIMIENTO and appends.
        a.mark_follow_up(&analyst(), "Statements received").unwrap();
        assert_eq!(a.status, AlertStatus::EnSeguimiento);
        assert_eq!(a.follow_ups.len(), 2);
    }

    #[test]
    fn test_attended_requires_en_seguimiento() {
        let mut a = make_alert();
        assert!(matches!(
            a.mark_attended(&analyst(), "done"),
            Err(RulesError::InvalidState { .. })
        ));
        a.mark_follow_up(&analyst(), "working it").unwrap();
        a.mark_attended(&analyst(), "Verified, nothing unusual")
            .unwrap();
        assert_eq!(a.status, AlertStatus::Atendida);
    }

    // ── Closure ──────────────────────────────────────────────────────

    #[test]
    fn test_close_is_officer_only() {
        let mut a = make_alert();
        let err = a
            .close(&analyst(), "resolved", AlertClassification::Mitigado)
            .unwrap_err();
        assert!(matches!(err, RulesError::Unauthorized { .. }));
        assert_eq!(a.status, AlertStatus::Nueva);
        assert!(a.closure.is_none());
    }

    #[test]
    fn test_close_requires_reason() {
        let mut a = make_alert();
        let err = a
            .close(&officer(), "", AlertClassification::Aceptado)
            .unwrap_err();
        assert!(matches!(err, RulesError::MissingJustification { .. }));
        assert!(a.closure.is_none());
    }

    #[test]
    fn test_officer_can_close_from_any_non_terminal_state() {
        for setup in 0..3 {
            let mut a = make_alert();
            if setup >= 1 {
                a.mark_follow_up(&analyst(), "tracking").unwrap();
            }
            if setup >= 2 {
                a.mark_attended(&analyst(), "attended").unwrap();
            }
            a.close(
                &officer(),
                "Risk mitigated with enhanced controls",
                AlertClassification::Mitigado,
            )
            .unwrap();
            assert_eq!(a.status, AlertStatus::Cerrada);
        }
    }

    #[test]
    fn test_second_close_fails_and_changes_nothing() {
        let mut a = make_alert();
        a.close(&officer(), "done", AlertClassification::Aceptado)
            .unwrap();
        let version = a.version;
        let transitions = a.transitions.len();

        let err = a
            .close(&officer(), "done", AlertClassification::Aceptado)
            .unwrap_err();
        assert!(matches!(err, RulesError::InvalidState { .. }));
        assert_eq!(a.version, version);
        assert_eq!(a.transitions.len(), transitions);
        assert_eq!(a.status, AlertStatus::Cerrada);
    }

    #[test]
    fn test_no_operation_leaves_cerrada() {
        let mut a = make_alert();
        a.close(&officer(), "closing", AlertClassification::Escalado)
            .unwrap();
        assert!(matches!(
            a.mark_follow_up(&analyst(), "reopening?"),
            Err(RulesError::InvalidState { .. })
        ));
        assert!(matches!(
            a.mark_attended(&analyst(), "still closed"),
            Err(RulesError::InvalidState { .. })
        ));
        // No transition record ever leaves CERRADA.
        assert!(a.transitions.iter().all(|t| t.from != AlertStatus::Cerrada));
    }

    #[test]
    fn test_transitions_only_move_forward() {
        let mut a = make_alert();
        a.mark_follow_up(&analyst(), "c1").unwrap();
        a.mark_attended(&analyst(), "c2").unwrap();
        a.close(&officer(), "c3", AlertClassification::Mitigado)
            .unwrap();
        assert!(a.transitions.iter().all(|t| t.from < t.to));
    }

    // ── Labels ───────────────────────────────────────────────────────

    #[test]
    fn test_level_ordering_and_priority() {
        assert!(AlertLevel::Baja < AlertLevel::Critica);
        assert!(AlertLevel::Baja.base_priority() < AlertLevel::Media.base_priority());
        assert_eq!(AlertLevel::Critica.base_priority(), 100.0);
    }

    #[test]
    fn test_level_tags_ascii_normalized() {
        assert_eq!(AlertLevel::Critica.as_str(), "CRITICA");
        assert_eq!(
            serde_json::to_string(&AlertLevel::Critica).unwrap(),
            "\"CRITICA\""
        );
        assert_eq!(AlertLevel::parse("CRITICA").unwrap(), AlertLevel::Critica);
        assert!(AlertLevel::parse("URGENTE").is_err());
    }

    #[test]
    fn test_status_parse_fails_loudly() {
        assert_eq!(
            AlertStatus::parse("EN_SEGUIMIENTO").unwrap(),
            AlertStatus::EnSeguimiento
        );
        assert!(AlertStatus::parse("REABIERTA").is_err());
    }

    #[test]
    fn test_alert_serde_roundtrip() {
        let mut a = make_alert();
        a.mark_follow_up(&analyst(), "note").unwrap();
        let json = serde_json::to_string(&a).unwrap();
        let back: Alert = serde_json::from_str(&json).unwrap();
        assert_eq!(back.status, a.status);
        assert_eq!(back.follow_ups.len(), 1);
        assert_eq!(back.level, a.level);
    }
}
