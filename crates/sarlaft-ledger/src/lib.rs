//! # sarlaft-ledger — Append-Only Audit Ledger
//!
//! Every state-changing operation in the rules engine produces exactly one
//! [`AuditEvent`], appended here in the same logical transaction as the
//! mutation it describes. The ledger is the regulatory evidence trail: it has
//! no update and no delete, and each event carries a SHA-256 digest covering
//! its predecessor's digest, so any tampering with a stored event invalidates
//! every later link.
//!
//! ## Ordering
//!
//! Event ids are assigned sequentially at append time and timestamps are
//! clamped to be monotonically non-decreasing, so `(event_id, timestamp)`
//! ordering can never diverge. Queries iterate newest-first.
//!
//! ## Visibility
//!
//! The ledger itself is role-agnostic: filtering what a requester may see is
//! the caller's responsibility (the API layer), per the access model of the
//! surrounding system.

pub mod event;
pub mod ledger;

pub use event::{AuditEvent, AuditModule, EntityKind, EventDraft};
pub use ledger::{AuditLedger, LedgerError, LedgerQuery};
