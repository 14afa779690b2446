//! # sarlaft-core — Foundational Types for the SARLAFT Stack
//!
//! Defines the primitives every other crate in the workspace builds on:
//! identifier newtypes, the actor/role model, UTC-only timestamps, canonical
//! serialization with content digests, and the shared error hierarchy of the
//! rules engine.
//!
//! ## Key Design Principles
//!
//! 1. **Newtype wrappers for domain identifiers.** `DossierId`, `AlertId`,
//!    `DeclarationId`, `ActorId` — never bare UUIDs or strings in public APIs,
//!    so one kind of identifier cannot be passed where another is expected.
//!
//! 2. **Explicit actors.** Every mutating operation in the stack takes an
//!    [`ActorRef`] parameter. There is no ambient session state inside the
//!    rules engine; role is the sole authorization input.
//!
//! 3. **UTC-only timestamps.** [`Timestamp`] enforces UTC with `Z` suffix at
//!    seconds precision, so ledger ordering and serialized evidence are
//!    deterministic.
//!
//! 4. **Digests flow through canonicalization.** [`sha256_digest()`] accepts
//!    only [`CanonicalBytes`]; there is no way to hash a non-canonical byte
//!    sequence into the audit chain.
//!
//! 5. **One error vocabulary.** [`RulesError`] carries every rejection the
//!    engine can produce; rejected operations surface it unchanged and leave
//!    all entities untouched.
//!
//! ## Crate Policy
//!
//! - No dependencies on other `sarlaft-*` crates (this is the leaf of the DAG).
//! - No `unsafe` code.
//! - No `panic!()` or `.unwrap()` outside tests.
//! - All public types derive `Debug` and `Clone`, and implement
//!   `Serialize`/`Deserialize` where they cross a boundary.

pub mod actor;
pub mod canonical;
pub mod digest;
pub mod error;
pub mod identity;
pub mod temporal;

pub use actor::{ActorRef, Role};
pub use canonical::CanonicalBytes;
pub use digest::{sha256_digest, sha256_hex, ContentDigest};
pub use error::{CanonicalizationError, RulesError};
pub use identity::{
    ActorId, AlertId, DeclarationId, DossierId, EvaluationId, RelativeId,
};
pub use temporal::Timestamp;
