//! # Audit Events
//!
//! The immutable record of one state transition. Drafts carry what the
//! caller knows (actor, entity, states, justification); the ledger assigns
//! the sequential id, the timestamp, and the digest chain links at append.

use serde::{Deserialize, Serialize};

use sarlaft_core::{
    sha256_digest, ActorId, ActorRef, CanonicalBytes, CanonicalizationError, ContentDigest, Role,
    Timestamp,
};

// ─── Module & Entity Tags ────────────────────────────────────────────

/// The functional module an event belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AuditModule {
    /// Dossier lifecycle (creation, review, approval).
    Dossiers,
    /// Risk evaluations and overrides.
    RiskEvaluations,
    /// PEP declarations and relatives.
    PepDeclarations,
    /// Enhanced due-diligence measures.
    EnhancedMeasures,
    /// Alert lifecycle.
    Alerts,
}

impl AuditModule {
    /// The string tag used on the wire and in query filters.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Dossiers => "DOSSIERS",
            Self::RiskEvaluations => "RISK_EVALUATIONS",
            Self::PepDeclarations => "PEP_DECLARATIONS",
            Self::EnhancedMeasures => "ENHANCED_MEASURES",
            Self::Alerts => "ALERTS",
        }
    }

    /// Parse a module tag, failing loudly on anything unrecognized.
    pub fn parse(tag: &str) -> Result<Self, sarlaft_core::RulesError> {
        match tag {
            "DOSSIERS" => Ok(Self::Dossiers),
            "RISK_EVALUATIONS" => Ok(Self::RiskEvaluations),
            "PEP_DECLARATIONS" => Ok(Self::PepDeclarations),
            "ENHANCED_MEASURES" => Ok(Self::EnhancedMeasures),
            "ALERTS" => Ok(Self::Alerts),
            other => Err(sarlaft_core::RulesError::UnknownTag {
                concept: "audit module".to_string(),
                tag: other.to_string(),
            }),
        }
    }
}

impl std::fmt::Display for AuditModule {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The kind of entity an event describes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EntityKind {
    /// A compliance dossier.
    Dossier,
    /// A risk evaluation.
    RiskEvaluation,
    /// A PEP declaration.
    PepDeclaration,
    /// An enhanced-measures record.
    EnhancedMeasures,
    /// A relative/associate linked to a PEP declaration.
    PepRelative,
    /// A compliance alert.
    Alert,
}

impl EntityKind {
    /// The string tag used on the wire.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Dossier => "DOSSIER",
            Self::RiskEvaluation => "RISK_EVALUATION",
            Self::PepDeclaration => "PEP_DECLARATION",
            Self::EnhancedMeasures => "ENHANCED_MEASURES",
            Self::PepRelative => "PEP_RELATIVE",
            Self::Alert => "ALERT",
        }
    }
}

impl std::fmt::Display for EntityKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ─── Event Draft ─────────────────────────────────────────────────────

/// What a manager knows about a transition before the ledger seals it.
#[derive(Debug, Clone)]
pub struct EventDraft {
    /// Who performed the transition.
    pub actor: ActorRef,
    /// Kind of the entity that changed.
    pub entity_kind: EntityKind,
    /// Identifier of the entity that changed (display form).
    pub entity_id: String,
    /// State label before the transition; `None` for creations.
    pub previous_state: Option<String>,
    /// State label after the transition.
    pub new_state: String,
    /// Free-text justification, where the operation requires one.
    pub justification: Option<String>,
    /// Functional module the transition belongs to.
    pub module: AuditModule,
}

// ─── Audit Event ─────────────────────────────────────────────────────

/// A sealed ledger entry. Immutable once appended.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuditEvent {
    /// Sequential event id, assigned by the ledger (starts at 1).
    pub event_id: u64,
    /// When the ledger sealed the event (monotonically non-decreasing).
    pub timestamp: Timestamp,
    /// Actor who performed the transition.
    pub actor_id: ActorId,
    /// Role the actor presented.
    pub actor_role: Role,
    /// Kind of the entity that changed.
    pub entity_kind: EntityKind,
    /// Identifier of the entity that changed.
    pub entity_id: String,
    /// State before the transition; `None` for creations.
    pub previous_state: Option<String>,
    /// State after the transition.
    pub new_state: String,
    /// Justification, where the operation required one.
    pub justification: Option<String>,
    /// Functional module.
    pub module: AuditModule,
    /// Digest of the previous event; `None` only for the first event.
    pub prev_digest: Option<ContentDigest>,
    /// Digest over this event's content including `prev_digest`.
    pub digest: ContentDigest,
}

/// The digest preimage: every sealed field except the digest itself.
///
/// Kept as a separate struct so the covered field set is explicit and the
/// digest can never accidentally cover itself.
#[derive(Serialize)]
struct EventPreimage<'a> {
    event_id: u64,
    timestamp: &'a Timestamp,
    actor_id: &'a ActorId,
    actor_role: Role,
    entity_kind: EntityKind,
    entity_id: &'a str,
    previous_state: &'a Option<String>,
    new_state: &'a str,
    justification: &'a Option<String>,
    module: AuditModule,
    prev_digest: &'a Option<ContentDigest>,
}

impl AuditEvent {
    /// Seal a draft into an event.
    pub(crate) fn seal(
        draft: EventDraft,
        event_id: u64,
        timestamp: Timestamp,
        prev_digest: Option<ContentDigest>,
    ) -> Result<Self, CanonicalizationError> {
        let digest = compute_digest(
            event_id,
            &timestamp,
            &draft.actor.id,
            draft.actor.role,
            draft.entity_kind,
            &draft.entity_id,
            &draft.previous_state,
            &draft.new_state,
            &draft.justification,
            draft.module,
            &prev_digest,
        )?;
        Ok(Self {
            event_id,
            timestamp,
            actor_id: draft.actor.id,
            actor_role: draft.actor.role,
            entity_kind: draft.entity_kind,
            entity_id: draft.entity_id,
            previous_state: draft.previous_state,
            new_state: draft.new_state,
            justification: draft.justification,
            module: draft.module,
            prev_digest,
            digest,
        })
    }

    /// Recompute this event's digest from its sealed fields.
    ///
    /// Used by chain verification; matches the stored digest iff the event
    /// has not been altered since it was appended.
    pub fn recompute_digest(&self) -> Result<ContentDigest, CanonicalizationError> {
        compute_digest(
            self.event_id,
            &self.timestamp,
            &self.actor_id,
            self.actor_role,
            self.entity_kind,
            &self.entity_id,
            &self.previous_state,
            &self.new_state,
            &self.justification,
            self.module,
            &self.prev_digest,
        )
    }
}

#[allow(clippy::too_many_arguments)]
fn compute_digest(
    event_id: u64,
    timestamp: &Timestamp,
    actor_id: &ActorId,
    actor_role: Role,
    entity_kind: EntityKind,
    entity_id: &str,
    previous_state: &Option<String>,
    new_state: &str,
    justification: &Option<String>,
    module: AuditModule,
    prev_digest: &Option<ContentDigest>,
) -> Result<ContentDigest, CanonicalizationError> {
    let preimage = EventPreimage {
        event_id,
        timestamp,
        actor_id,
        actor_role,
        entity_kind,
        entity_id,
        previous_state,
        new_state,
        justification,
        module,
        prev_digest,
    };
    let canonical = CanonicalBytes::new(&preimage)?;
    Ok(sha256_digest(&canonical))
}
