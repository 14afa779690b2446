//! # Error Types — Rules Engine Rejections
//!
//! The single error vocabulary of the rules engine. Every rejected operation
//! surfaces one of these variants to the caller; none are silently recovered,
//! and a rejected operation never mutates state or writes a ledger event.
//!
//! `ConcurrentModification` is the only variant a caller is expected to
//! retry, after refetching the entity at its current version.

use thiserror::Error;

/// A rejection produced by the rules engine.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum RulesError {
    /// The caller's role does not permit the requested operation.
    #[error("role '{actual}' is not authorized to {action} (requires '{required}')")]
    Unauthorized {
        /// The operation that was attempted.
        action: String,
        /// The role the operation requires.
        required: String,
        /// The role the caller presented.
        actual: String,
    },

    /// The transition is not legal from the entity's current state.
    #[error("invalid transition for {entity}: {from} -> {attempted}")]
    InvalidState {
        /// Description of the entity (kind and id).
        entity: String,
        /// Current state label.
        from: String,
        /// Attempted target state label.
        attempted: String,
    },

    /// A mandatory free-text justification was empty.
    #[error("{field} is mandatory and must be non-empty")]
    MissingJustification {
        /// The field that was empty.
        field: String,
    },

    /// A mandatory follow-up comment was empty.
    #[error("follow-up comment is mandatory and must be non-empty")]
    MissingComment,

    /// The dossier has not reached the completeness threshold for review.
    #[error("dossier completeness {completeness}% is below the required {required}%")]
    IncompleteDossier {
        /// Current completeness percentage.
        completeness: u8,
        /// Threshold that must be met.
        required: u8,
    },

    /// The caller acted on a stale version of the entity.
    #[error("{entity} was modified concurrently (expected version {expected}, found {actual})")]
    ConcurrentModification {
        /// Description of the entity (kind and id).
        entity: String,
        /// Version the caller expected.
        expected: u64,
        /// Version actually stored.
        actual: u64,
    },

    /// The referenced entity does not exist.
    #[error("{entity} not found")]
    NotFound {
        /// Description of the entity (kind and id).
        entity: String,
    },

    /// A label/tag did not map to any known variant.
    ///
    /// Label lookup fails loudly instead of falling back to a default; a
    /// default would mask data errors in stored records.
    #[error("unrecognized {concept} tag: {tag:?}")]
    UnknownTag {
        /// The concept being parsed (role, alert level, status, ...).
        concept: String,
        /// The unrecognized tag.
        tag: String,
    },

    /// Input failed structural validation (range, format).
    #[error("validation error: {0}")]
    Validation(String),
}

impl RulesError {
    /// Convenience constructor for officer-gated operations.
    pub fn unauthorized(action: &str, required: &str, actual: &str) -> Self {
        Self::Unauthorized {
            action: action.to_string(),
            required: required.to_string(),
            actual: actual.to_string(),
        }
    }

    /// Convenience constructor for illegal transitions.
    pub fn invalid_state(entity: impl Into<String>, from: &str, attempted: &str) -> Self {
        Self::InvalidState {
            entity: entity.into(),
            from: from.to_string(),
            attempted: attempted.to_string(),
        }
    }
}

/// Error during canonical serialization for digest computation.
#[derive(Error, Debug)]
pub enum CanonicalizationError {
    /// Floats are not permitted in digested representations; their JCS
    /// rendering has edge cases that break byte determinism. Scores cross
    /// the digest boundary as strings.
    #[error("float values are not permitted in canonical representations: {0}")]
    FloatRejected(f64),

    /// JSON serialization failed.
    #[error("serialization failed: {0}")]
    SerializationFailed(#[from] serde_json::Error),
}
