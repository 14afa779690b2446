//! # sarlaft-service — Case Coordination Layer
//!
//! Sits between the transport layer and the rules engine. Three concerns:
//!
//! - **Ports** (`ports.rs`): repository traits the storage layer implements.
//!   The engine never sees a database; a Postgres adapter and the in-memory
//!   reference implementation are interchangeable behind these traits.
//!
//! - **In-memory stores** (`memory.rs`): the reference implementation.
//!   Optimistic versioning is enforced inside a single write lock, so there
//!   is no window between the version check and the swap.
//!
//! - **Case service** (`service.rs`): the one entry point UI actions
//!   dispatch into. Each operation validates the caller's expected entity
//!   version, applies the engine transition on a working copy, appends the
//!   audit event(s), and only then publishes the copy — all under one
//!   transaction guard, so a ledger entry and the mutation it describes
//!   cannot be observed apart, and a failed operation publishes nothing.

pub mod memory;
pub mod ports;
pub mod service;

pub use memory::{
    InMemoryAlertRepository, InMemoryDeclarationRepository, InMemoryDossierRepository,
    InMemoryEvaluationRepository, InMemoryMeasuresRepository,
};
pub use ports::{
    AlertRepository, DeclarationRepository, DossierRepository, EvaluationRepository,
    MeasuresRepository, Versioned,
};
pub use service::{CaseService, DeclarePepParams};
