//! # In-Memory Reference Stores
//!
//! The reference implementation of the repository ports, and the test
//! double for everything above the ports. A thread-safe map guarded by a
//! `parking_lot::RwLock` (non-poisonable — a panicking writer does not
//! corrupt the store), with the optimistic version check performed inside
//! the write lock so there is no check-then-swap window.

use std::collections::HashMap;
use std::hash::Hash;
use std::sync::Arc;

use parking_lot::RwLock;

use sarlaft_core::{AlertId, DeclarationId, DossierId, EvaluationId, RulesError};
use sarlaft_engine::{Alert, Dossier, EnhancedMeasures, PepDeclaration, RiskEvaluation};

use crate::ports::{
    AlertRepository, DeclarationRepository, DossierRepository, EvaluationRepository,
    MeasuresRepository, Versioned,
};

// ─── Generic Store ───────────────────────────────────────────────────

/// Thread-safe, cloneable in-memory key-value store with versioned swaps.
///
/// All operations are synchronous; the lock is never held across await
/// points because nothing here is async.
#[derive(Debug)]
struct Store<K, V> {
    data: Arc<RwLock<HashMap<K, V>>>,
}

impl<K, V> Clone for Store<K, V> {
    fn clone(&self) -> Self {
        Self {
            data: Arc::clone(&self.data),
        }
    }
}

impl<K, V> Default for Store<K, V>
where
    K: Eq + Hash,
{
    fn default() -> Self {
        Self {
            data: Arc::new(RwLock::new(HashMap::new())),
        }
    }
}

impl<K, V> Store<K, V>
where
    K: Eq + Hash + Clone,
    V: Clone + Versioned,
{
    fn get(&self, key: &K) -> Option<V> {
        self.data.read().get(key).cloned()
    }

    fn list(&self) -> Vec<V> {
        self.data.read().values().cloned().collect()
    }

    /// Insert a brand-new record; the key must not exist yet.
    fn insert_new(&self, key: K, value: V, entity: impl Fn() -> String) -> Result<(), RulesError> {
        let mut guard = self.data.write();
        if guard.contains_key(&key) {
            return Err(RulesError::Validation(format!(
                "{} already exists",
                entity()
            )));
        }
        guard.insert(key, value);
        Ok(())
    }

    /// Swap in a new value iff the stored version equals `expected_version`.
    ///
    /// Check and swap happen under one write lock — the lost-update window
    /// between them does not exist.
    fn compare_and_save(
        &self,
        key: K,
        value: V,
        expected_version: u64,
        entity: impl Fn() -> String,
    ) -> Result<(), RulesError> {
        let mut guard = self.data.write();
        match guard.get(&key) {
            None => Err(RulesError::NotFound { entity: entity() }),
            Some(current) if current.version() != expected_version => {
                Err(RulesError::ConcurrentModification {
                    entity: entity(),
                    expected: expected_version,
                    actual: current.version(),
                })
            }
            Some(_) => {
                guard.insert(key, value);
                Ok(())
            }
        }
    }
}

// ─── Concrete Repositories ───────────────────────────────────────────

/// In-memory dossier repository.
#[derive(Debug, Clone, Default)]
pub struct InMemoryDossierRepository {
    store: Store<DossierId, Dossier>,
}

impl InMemoryDossierRepository {
    /// Create an empty repository.
    pub fn new() -> Self {
        Self::default()
    }
}

impl DossierRepository for InMemoryDossierRepository {
    fn get(&self, id: DossierId) -> Result<Dossier, RulesError> {
        self.store.get(&id).ok_or_else(|| RulesError::NotFound {
            entity: format!("dossier {id}"),
        })
    }

    fn insert(&self, dossier: &Dossier) -> Result<(), RulesError> {
        let id = dossier.id;
        self.store
            .insert_new(id, dossier.clone(), move || format!("dossier {id}"))
    }

    fn save(&self, dossier: &Dossier, expected_version: u64) -> Result<(), RulesError> {
        let id = dossier.id;
        self.store
            .compare_and_save(id, dossier.clone(), expected_version, move || {
                format!("dossier {id}")
            })
    }

    fn list(&self) -> Vec<Dossier> {
        self.store.list()
    }
}

/// In-memory evaluation repository.
#[derive(Debug, Clone, Default)]
pub struct InMemoryEvaluationRepository {
    store: Store<EvaluationId, RiskEvaluation>,
}

impl InMemoryEvaluationRepository {
    /// Create an empty repository.
    pub fn new() -> Self {
        Self::default()
    }
}

impl EvaluationRepository for InMemoryEvaluationRepository {
    fn get(&self, id: EvaluationId) -> Result<RiskEvaluation, RulesError> {
        self.store.get(&id).ok_or_else(|| RulesError::NotFound {
            entity: format!("evaluation {id}"),
        })
    }

    fn insert(&self, evaluation: &RiskEvaluation) -> Result<(), RulesError> {
        let id = evaluation.id;
        self.store
            .insert_new(id, evaluation.clone(), move || format!("evaluation {id}"))
    }

    fn save(&self, evaluation: &RiskEvaluation, expected_version: u64) -> Result<(), RulesError> {
        let id = evaluation.id;
        self.store
            .compare_and_save(id, evaluation.clone(), expected_version, move || {
                format!("evaluation {id}")
            })
    }

    fn list_for_dossier(&self, dossier_id: DossierId) -> Vec<RiskEvaluation> {
        let mut evaluations: Vec<_> = self
            .store
            .list()
            .into_iter()
            .filter(|e| e.dossier_id == dossier_id)
            .collect();
        evaluations.sort_by_key(|e| e.revision);
        evaluations
    }
}

/// In-memory declaration repository.
#[derive(Debug, Clone, Default)]
pub struct InMemoryDeclarationRepository {
    store: Store<DeclarationId, PepDeclaration>,
}

impl InMemoryDeclarationRepository {
    /// Create an empty repository.
    pub fn new() -> Self {
        Self::default()
    }
}

impl DeclarationRepository for InMemoryDeclarationRepository {
    fn get(&self, id: DeclarationId) -> Result<PepDeclaration, RulesError> {
        self.store.get(&id).ok_or_else(|| RulesError::NotFound {
            entity: format!("declaration {id}"),
        })
    }

    fn insert(&self, declaration: &PepDeclaration) -> Result<(), RulesError> {
        let id = declaration.id;
        self.store
            .insert_new(id, declaration.clone(), move || format!("declaration {id}"))
    }

    fn save(
        &self,
        declaration: &PepDeclaration,
        expected_version: u64,
    ) -> Result<(), RulesError> {
        let id = declaration.id;
        self.store
            .compare_and_save(id, declaration.clone(), expected_version, move || {
                format!("declaration {id}")
            })
    }

    fn find_by_dossier(&self, dossier_id: DossierId) -> Option<PepDeclaration> {
        self.store
            .list()
            .into_iter()
            .filter(|d| d.dossier_id == dossier_id)
            .max_by_key(|d| d.declared_at)
    }
}

/// In-memory enhanced-measures repository, keyed by declaration.
#[derive(Debug, Clone, Default)]
pub struct InMemoryMeasuresRepository {
    store: Store<DeclarationId, EnhancedMeasures>,
}

impl InMemoryMeasuresRepository {
    /// Create an empty repository.
    pub fn new() -> Self {
        Self::default()
    }
}

impl MeasuresRepository for InMemoryMeasuresRepository {
    fn get(&self, declaration_id: DeclarationId) -> Result<EnhancedMeasures, RulesError> {
        self.store
            .get(&declaration_id)
            .ok_or_else(|| RulesError::NotFound {
                entity: format!("enhanced measures for {declaration_id}"),
            })
    }

    fn try_get(&self, declaration_id: DeclarationId) -> Option<EnhancedMeasures> {
        self.store.get(&declaration_id)
    }

    fn insert(&self, measures: &EnhancedMeasures) -> Result<(), RulesError> {
        let id = measures.declaration_id;
        self.store.insert_new(id, measures.clone(), move || {
            format!("enhanced measures for {id}")
        })
    }

    fn save(&self, measures: &EnhancedMeasures, expected_version: u64) -> Result<(), RulesError> {
        let id = measures.declaration_id;
        self.store
            .compare_and_save(id, measures.clone(), expected_version, move || {
                format!("enhanced measures for {id}")
            })
    }
}

/// In-memory alert repository.
#[derive(Debug, Clone, Default)]
pub struct InMemoryAlertRepository {
    store: Store<AlertId, Alert>,
}

impl InMemoryAlertRepository {
    /// Create an empty repository.
    pub fn new() -> Self {
        Self::default()
    }
}

impl AlertRepository for InMemoryAlertRepository {
    fn get(&self, id: AlertId) -> Result<Alert, RulesError> {
        self.store.get(&id).ok_or_else(|| RulesError::NotFound {
            entity: format!("alert {id}"),
        })
    }

    fn insert(&self, alert: &Alert) -> Result<(), RulesError> {
        let id = alert.id;
        self.store
            .insert_new(id, alert.clone(), move || format!("alert {id}"))
    }

    fn save(&self, alert: &Alert, expected_version: u64) -> Result<(), RulesError> {
        let id = alert.id;
        self.store
            .compare_and_save(id, alert.clone(), expected_version, move || {
                format!("alert {id}")
            })
    }

    fn list(&self) -> Vec<Alert> {
        self.store.list()
    }

    fn list_for_dossier(&self, dossier_id: DossierId) -> Vec<Alert> {
        let mut alerts: Vec<_> = self
            .store
            .list()
            .into_iter()
            .filter(|a| a.dossier_id == dossier_id)
            .collect();
        alerts.sort_by_key(|a| a.detected_at);
        alerts
    }
}
