//! # sarlaft-engine — Compliance Case State Machines
//!
//! Implements the rules that the case-management front-ends dispatch into:
//! every status transition of a compliance case is validated here, gated on
//! the caller's role, and rejected with a structured error when illegal.
//! Rejected operations mutate nothing.
//!
//! ## State Machines
//!
//! - **Dossier** (`dossier.rs`): `INCOMPLETE → UNDER_REVIEW →
//!   {OBSERVED, REQUIRES_INFO, APPROVED}`, with correction loops back to
//!   `UNDER_REVIEW` and a completeness gate on submission. `APPROVED` is
//!   terminal for the review cycle; reopening starts a new cycle.
//!
//! - **Risk** (`risk.rs`): weighted-factor scoring with configurable
//!   thresholds, PEP escalation floors, manual overrides with mandatory
//!   justification, and an approval lifecycle that freezes each evaluation
//!   revision once approved.
//!
//! - **PEP** (`pep.rs`): declaration lifecycle `DRAFT → PENDING_APPROVAL →
//!   APPROVED`, linked relatives, and an append-only condition history.
//!
//! - **Enhanced Measures** (`measures.rs`): the due-diligence checklist
//!   activated for a PEP, with officer-only sign-off.
//!
//! - **Alert** (`alert.rs`): `NUEVA → EN_SEGUIMIENTO → ATENDIDA → CERRADA`,
//!   forward-only, with officer-only irreversible closure.
//!
//! ## Design
//!
//! Each aggregate owns its transition history and an optimistic-concurrency
//! `version` incremented on every successful mutation. The state is an enum
//! with validated transitions — `require_state()` checks, `do_transition()`
//! records — so an illegal move is a structured [`sarlaft_core::RulesError`],
//! never a silent fallthrough. Cross-module effects (PEP escalation, alert
//! raising, risk write-back) are coordinated by the service layer, not here.

pub mod alert;
pub mod dossier;
pub mod measures;
pub mod pep;
pub mod risk;

// ─── Dossier re-exports ─────────────────────────────────────────────

pub use dossier::{
    Dossier, DossierStatus, DossierTransitionRecord, SubjectType, REVIEW_COMPLETENESS_THRESHOLD,
};

// ─── Risk re-exports ────────────────────────────────────────────────

pub use risk::{
    pep_escalation_floor, EvaluationStatus, EvaluationType, RiskEngine, RiskEvaluation,
    RiskFactor, RiskLevel, RiskPolicy, MAX_FACTOR_WEIGHT, SCORE_CEILING,
};

// ─── PEP re-exports ─────────────────────────────────────────────────

pub use pep::{
    ConditionChange, DeclarationStatus, PepCondition, PepDeclaration, PepRelative, PepSeniority,
    RelativeEvaluationStatus,
};

// ─── Enhanced measures re-exports ───────────────────────────────────

pub use measures::{EnhancedMeasures, MeasureSet, MeasureToggle};

// ─── Alert re-exports ───────────────────────────────────────────────

pub use alert::{
    Alert, AlertClassification, AlertLevel, AlertOrigin, AlertStatus, AlertTransitionRecord,
    AlertType, ClosureRecord, FollowUpRecord,
};
