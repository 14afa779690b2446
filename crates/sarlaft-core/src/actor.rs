//! # Actor & Role Model
//!
//! Roles in the compliance workflow, ordered by privilege. The rules engine
//! receives an explicit [`ActorRef`] on every mutating call — there is no
//! ambient session, token, or global user context inside the engine.
//!
//! ## Authorization model
//!
//! Two kinds of checks exist:
//!
//! - **Minimum-privilege checks** (`has_at_least`) use the derived `Ord`:
//!   `Auditor < Commercial < ComplianceAnalyst < ComplianceOfficer`.
//! - **Officer-only checks** (`is_officer`) are exact-match. Approving
//!   dossiers, evaluations, and PEP declarations, and closing alerts, is
//!   restricted to the Compliance Officer and never granted by ordering.

use serde::{Deserialize, Serialize};

use crate::error::RulesError;
use crate::identity::ActorId;

/// Roles in the compliance workflow, ordered by privilege level.
///
/// The `Ord` derivation respects variant declaration order, which enables
/// `>=` comparison for minimum-privilege checks.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    /// Read-only access to dossiers and the audit ledger.
    Auditor,
    /// Creates dossiers and uploads documentation for the subjects it manages.
    Commercial,
    /// Compliance unit analyst: runs evaluations, records PEP declarations,
    /// follows up on alerts.
    ComplianceAnalyst,
    /// The single privileged approver role. Approves dossiers, evaluations
    /// and PEP declarations; closes alerts; signs off enhanced measures.
    ComplianceOfficer,
}

impl Role {
    /// The string representation used in tokens, serialized events, and logs.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Auditor => "auditor",
            Self::Commercial => "commercial",
            Self::ComplianceAnalyst => "compliance_analyst",
            Self::ComplianceOfficer => "compliance_officer",
        }
    }

    /// Parse a role tag, failing loudly on anything unrecognized.
    ///
    /// There is deliberately no default: an unknown role in a token or a
    /// stored event is a data error, not something to paper over.
    pub fn parse(tag: &str) -> Result<Self, RulesError> {
        match tag {
            "auditor" => Ok(Self::Auditor),
            "commercial" => Ok(Self::Commercial),
            "compliance_analyst" => Ok(Self::ComplianceAnalyst),
            "compliance_officer" => Ok(Self::ComplianceOfficer),
            other => Err(RulesError::UnknownTag {
                concept: "role".to_string(),
                tag: other.to_string(),
            }),
        }
    }

    /// Whether this role meets a minimum privilege bar.
    pub fn has_at_least(&self, minimum: Role) -> bool {
        *self >= minimum
    }

    /// Whether this is the privileged approver role.
    pub fn is_officer(&self) -> bool {
        matches!(self, Self::ComplianceOfficer)
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The acting identity for one engine operation: who, and with what role.
///
/// The role is carried alongside the id (rather than looked up) because the
/// excluded API layer is the authority on the caller's session; the engine
/// re-checks the role against each operation's requirement and nothing else.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActorRef {
    /// Directory account of the acting user.
    pub id: ActorId,
    /// Role the session presented for this call.
    pub role: Role,
}

impl ActorRef {
    /// Construct an actor reference.
    pub fn new(id: impl Into<ActorId>, role: Role) -> Self {
        Self {
            id: id.into(),
            role,
        }
    }
}

impl std::fmt::Display for ActorRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}({})", self.id, self.role)
    }
}

impl From<String> for ActorId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_ordering() {
        assert!(Role::Auditor < Role::Commercial);
        assert!(Role::Commercial < Role::ComplianceAnalyst);
        assert!(Role::ComplianceAnalyst < Role::ComplianceOfficer);
    }

    #[test]
    fn test_has_at_least() {
        assert!(Role::ComplianceOfficer.has_at_least(Role::Commercial));
        assert!(Role::ComplianceAnalyst.has_at_least(Role::ComplianceAnalyst));
        assert!(!Role::Commercial.has_at_least(Role::ComplianceAnalyst));
    }

    #[test]
    fn test_only_officer_is_officer() {
        assert!(Role::ComplianceOfficer.is_officer());
        assert!(!Role::ComplianceAnalyst.is_officer());
        assert!(!Role::Commercial.is_officer());
        assert!(!Role::Auditor.is_officer());
    }

    #[test]
    fn test_parse_known_roles() {
        assert_eq!(Role::parse("auditor").unwrap(), Role::Auditor);
        assert_eq!(
            Role::parse("compliance_officer").unwrap(),
            Role::ComplianceOfficer
        );
    }

    #[test]
    fn test_parse_unknown_role_fails_loudly() {
        let err = Role::parse("superadmin").unwrap_err();
        match err {
            RulesError::UnknownTag { concept, tag } => {
                assert_eq!(concept, "role");
                assert_eq!(tag, "superadmin");
            }
            other => panic!("expected UnknownTag, got: {other:?}"),
        }
    }

    #[test]
    fn test_role_serde_uses_snake_case() {
        let json = serde_json::to_string(&Role::ComplianceOfficer).unwrap();
        assert_eq!(json, "\"compliance_officer\"");
    }

    #[test]
    fn test_actor_ref_display() {
        let actor = ActorRef::new("lrojas", Role::ComplianceAnalyst);
        assert_eq!(actor.to_string(), "lrojas(compliance_analyst)");
    }
}
