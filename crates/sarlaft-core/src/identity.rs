//! # Domain Identity Newtypes
//!
//! Newtype wrappers for every identifier namespace in the SARLAFT Stack.
//! A `DossierId` cannot be passed where an `AlertId` is expected; the
//! compiler rejects cross-namespace confusion before it reaches the ledger.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Unique identifier for a compliance dossier (one case per subject).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DossierId(pub Uuid);

/// Unique identifier for one risk evaluation pass over a dossier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EvaluationId(pub Uuid);

/// Unique identifier for a PEP declaration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DeclarationId(pub Uuid);

/// Unique identifier for a compliance alert.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AlertId(pub Uuid);

/// Unique identifier for a relative/associate linked to a PEP declaration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RelativeId(pub Uuid);

/// Identifier of a human or system actor (directory account name).
///
/// Actors come from the identity provider of the excluded session layer;
/// the engine treats them as opaque strings and never mints them.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ActorId(pub String);

macro_rules! uuid_id_impl {
    ($ty:ident, $prefix:literal) => {
        impl $ty {
            /// Generate a new random identifier.
            pub fn new() -> Self {
                Self(Uuid::new_v4())
            }

            /// Access the inner UUID.
            pub fn as_uuid(&self) -> &Uuid {
                &self.0
            }
        }

        impl Default for $ty {
            fn default() -> Self {
                Self::new()
            }
        }

        impl From<Uuid> for $ty {
            fn from(id: Uuid) -> Self {
                Self(id)
            }
        }

        impl std::fmt::Display for $ty {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, concat!($prefix, ":{}"), self.0)
            }
        }
    };
}

uuid_id_impl!(DossierId, "dossier");
uuid_id_impl!(EvaluationId, "evaluation");
uuid_id_impl!(DeclarationId, "declaration");
uuid_id_impl!(AlertId, "alert");
uuid_id_impl!(RelativeId, "relative");

impl ActorId {
    /// Wrap an account name as an actor identifier.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// The account name as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for ActorId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ActorId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ids_are_distinct_namespaces() {
        let d = DossierId::new();
        let a = AlertId::new();
        assert_ne!(d.to_string(), a.to_string());
        assert!(d.to_string().starts_with("dossier:"));
        assert!(a.to_string().starts_with("alert:"));
    }

    #[test]
    fn test_id_serde_roundtrip() {
        let id = DeclarationId::new();
        let json = serde_json::to_string(&id).unwrap();
        let back: DeclarationId = serde_json::from_str(&json).unwrap();
        assert_eq!(id, back);
    }

    #[test]
    fn test_actor_id_display_is_bare() {
        let actor = ActorId::from("mgarcia");
        assert_eq!(actor.to_string(), "mgarcia");
        assert_eq!(actor.as_str(), "mgarcia");
    }
}
