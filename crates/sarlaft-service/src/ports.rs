//! # Repository Ports
//!
//! The storage contracts the case service operates against. Implementations
//! must enforce the version check inside whatever atomicity primitive they
//! have (a write lock here, `WHERE version = $n` in SQL) — the service
//! re-checks versions, but the store is the last line against lost updates.

use sarlaft_core::{AlertId, DeclarationId, DossierId, EvaluationId, RulesError};
use sarlaft_engine::{Alert, Dossier, EnhancedMeasures, PepDeclaration, RiskEvaluation};

/// An aggregate carrying an optimistic-concurrency version.
pub trait Versioned {
    /// Current version of the aggregate.
    fn version(&self) -> u64;
}

impl Versioned for Dossier {
    fn version(&self) -> u64 {
        self.version
    }
}

impl Versioned for RiskEvaluation {
    fn version(&self) -> u64 {
        self.version
    }
}

impl Versioned for PepDeclaration {
    fn version(&self) -> u64 {
        self.version
    }
}

impl Versioned for EnhancedMeasures {
    fn version(&self) -> u64 {
        self.version
    }
}

impl Versioned for Alert {
    fn version(&self) -> u64 {
        self.version
    }
}

/// Storage port for dossiers.
pub trait DossierRepository: Send + Sync {
    /// Fetch a dossier. `NotFound` if absent.
    fn get(&self, id: DossierId) -> Result<Dossier, RulesError>;
    /// Insert a new dossier. Fails if the id already exists.
    fn insert(&self, dossier: &Dossier) -> Result<(), RulesError>;
    /// Replace a dossier iff the stored version equals `expected_version`.
    fn save(&self, dossier: &Dossier, expected_version: u64) -> Result<(), RulesError>;
    /// All dossiers, unordered.
    fn list(&self) -> Vec<Dossier>;
}

/// Storage port for risk evaluations.
pub trait EvaluationRepository: Send + Sync {
    /// Fetch an evaluation. `NotFound` if absent.
    fn get(&self, id: EvaluationId) -> Result<RiskEvaluation, RulesError>;
    /// Insert a new evaluation. Fails if the id already exists.
    fn insert(&self, evaluation: &RiskEvaluation) -> Result<(), RulesError>;
    /// Replace an evaluation iff the stored version matches.
    fn save(&self, evaluation: &RiskEvaluation, expected_version: u64) -> Result<(), RulesError>;
    /// All evaluations of one dossier, in revision order.
    fn list_for_dossier(&self, dossier_id: DossierId) -> Vec<RiskEvaluation>;
}

/// Storage port for PEP declarations.
pub trait DeclarationRepository: Send + Sync {
    /// Fetch a declaration. `NotFound` if absent.
    fn get(&self, id: DeclarationId) -> Result<PepDeclaration, RulesError>;
    /// Insert a new declaration. Fails if the id already exists.
    fn insert(&self, declaration: &PepDeclaration) -> Result<(), RulesError>;
    /// Replace a declaration iff the stored version matches.
    fn save(&self, declaration: &PepDeclaration, expected_version: u64)
        -> Result<(), RulesError>;
    /// The declaration covering a dossier, if one exists.
    fn find_by_dossier(&self, dossier_id: DossierId) -> Option<PepDeclaration>;
}

/// Storage port for enhanced-measures records (keyed by declaration).
pub trait MeasuresRepository: Send + Sync {
    /// Fetch the measures of a declaration. `NotFound` if absent.
    fn get(&self, declaration_id: DeclarationId) -> Result<EnhancedMeasures, RulesError>;
    /// Fetch without failing.
    fn try_get(&self, declaration_id: DeclarationId) -> Option<EnhancedMeasures>;
    /// Insert a new record. Fails if one already exists for the declaration.
    fn insert(&self, measures: &EnhancedMeasures) -> Result<(), RulesError>;
    /// Replace a record iff the stored version matches.
    fn save(&self, measures: &EnhancedMeasures, expected_version: u64) -> Result<(), RulesError>;
}

/// Storage port for alerts.
pub trait AlertRepository: Send + Sync {
    /// Fetch an alert. `NotFound` if absent.
    fn get(&self, id: AlertId) -> Result<Alert, RulesError>;
    /// Insert a new alert. Fails if the id already exists.
    fn insert(&self, alert: &Alert) -> Result<(), RulesError>;
    /// Replace an alert iff the stored version matches.
    fn save(&self, alert: &Alert, expected_version: u64) -> Result<(), RulesError>;
    /// All alerts, unordered.
    fn list(&self) -> Vec<Alert>;
    /// All alerts raised against one dossier.
    fn list_for_dossier(&self, dossier_id: DossierId) -> Vec<Alert>;
}
