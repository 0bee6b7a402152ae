//! Namespace migration: move every resource under one namespace to fresh
//! identifiers under another.
//!
//! A run is a fixed batch of subjects selected once, renamed one at a time.
//! Each rename (and its optional `owl:sameAs` link) is bracketed by its own
//! write lock on the primary store; there is no run-wide lock and no rollback.
//! Renamed resources leave the old namespace, so re-running after a failure
//! picks up only what is left.

use crate::allocator::{AllocateError, IdentifierAllocator};
use crate::observer::{MigrationObserver, TracingObserver};
use rand::Rng;
use rand::rngs::StdRng;
use rekey_graph::vocab::OWL_SAME_AS;
use rekey_graph::{
    GraphStore, Iri, LockMode, PatternError, Statement, StoreError, SubjectPattern, TriplePattern,
};
use serde::Serialize;
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("old namespace cannot be empty")]
    EmptyOldNamespace,

    #[error("new namespace cannot be empty")]
    EmptyNewNamespace,

    #[error("no {role} store provided")]
    MissingStore { role: &'static str },
}

#[derive(Debug, thiserror::Error)]
pub enum MigrationError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Pattern(#[from] PatternError),

    #[error("failed to allocate identifier for <{old_id}>: {source}")]
    Allocation {
        old_id: Iri,
        #[source]
        source: AllocateError,
    },
}

/// Caller-supplied parameters of one migration run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NamespaceChange {
    pub old_namespace: String,
    pub new_namespace: String,
    pub record_equivalence: bool,
    /// Include the old/new pairs in the report. Does not change mutations.
    pub verbose: bool,
}

impl NamespaceChange {
    pub fn new(old_namespace: impl Into<String>, new_namespace: impl Into<String>) -> Self {
        Self {
            old_namespace: old_namespace.into(),
            new_namespace: new_namespace.into(),
            record_equivalence: false,
            verbose: false,
        }
    }

    pub fn record_equivalence(mut self, enabled: bool) -> Self {
        self.record_equivalence = enabled;
        self
    }

    pub fn verbose(mut self, enabled: bool) -> Self {
        self.verbose = enabled;
        self
    }

    /// Trimmed `(old, new)` namespaces, or the first blank one.
    pub fn validate(&self) -> Result<(&str, &str), ValidationError> {
        let old = self.old_namespace.trim();
        if old.is_empty() {
            return Err(ValidationError::EmptyOldNamespace);
        }
        let new = self.new_namespace.trim();
        if new.is_empty() {
            return Err(ValidationError::EmptyNewNamespace);
        }
        Ok((old, new))
    }
}

/// One resource moved by a run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RenamedResource {
    pub old_id: Iri,
    pub new_id: Iri,
    pub statements: usize,
}

/// Per-resource progress tick.
#[derive(Debug, Clone, PartialEq)]
pub struct Progress {
    /// 1-based position in the batch.
    pub index: usize,
    pub total: usize,
    pub percent: f64,
    pub old_id: Iri,
    pub new_id: Iri,
}

/// `round(10000 * index / total) / 100`, i.e. percent with two decimals.
///
/// An empty batch (`total == 0`) is already complete and reports `100.0`
/// instead of dividing by zero.
pub fn percent_complete(index: usize, total: usize) -> f64 {
    if total == 0 {
        return 100.0;
    }
    (10000.0 * index as f64 / total as f64).round() / 100.0
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MigrationReport {
    pub run_id: Uuid,
    pub old_namespace: String,
    pub new_namespace: String,
    pub renamed: usize,
    pub statements_rewritten: usize,
    pub equivalences_added: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pairs: Option<Vec<RenamedResource>>,
}

impl MigrationReport {
    fn empty(old_namespace: &str, new_namespace: &str, verbose: bool) -> Self {
        Self {
            run_id: Uuid::new_v4(),
            old_namespace: old_namespace.to_string(),
            new_namespace: new_namespace.to_string(),
            renamed: 0,
            statements_rewritten: 0,
            equivalences_added: 0,
            pairs: verbose.then(Vec::new),
        }
    }

    fn record(&mut self, renamed: RenamedResource, equivalence_added: bool) {
        self.renamed += 1;
        self.statements_rewritten += renamed.statements;
        if equivalence_added {
            self.equivalences_added += 1;
        }
        if let Some(pairs) = self.pairs.as_mut() {
            pairs.push(renamed);
        }
    }
}

/// Distinct subjects of `store` whose identifier starts with `old_namespace`,
/// in lexicographic order.
pub fn select_batch(store: &dyn GraphStore, old_namespace: &str) -> Result<Vec<Iri>, MigrationError> {
    let pattern = TriplePattern::any().with_subject(SubjectPattern::prefix(old_namespace)?);
    let _guard = store.lock(LockMode::Read)?;
    Ok(store.distinct_subjects(&pattern)?)
}

/// Drives namespace migrations; owns the identifier allocator.
#[derive(Debug, Clone)]
pub struct MigrationEngine<R = StdRng> {
    allocator: IdentifierAllocator<R>,
}

impl MigrationEngine<StdRng> {
    pub fn from_entropy() -> Self {
        Self::new(IdentifierAllocator::from_entropy())
    }
}

impl<R: Rng> MigrationEngine<R> {
    pub fn new(allocator: IdentifierAllocator<R>) -> Self {
        Self { allocator }
    }

    pub fn allocator(&self) -> &IdentifierAllocator<R> {
        &self.allocator
    }

    /// Rename every subject under the old namespace in `primary`.
    ///
    /// New identifiers are checked against `reference` and `primary`. Equal
    /// namespaces (after trimming) return an empty report without touching
    /// either store. A failure aborts the run; resources already renamed
    /// stay renamed and `flush` is not called.
    pub fn execute(
        &mut self,
        primary: &dyn GraphStore,
        reference: &dyn GraphStore,
        change: &NamespaceChange,
        observer: &mut dyn MigrationObserver,
    ) -> Result<MigrationReport, MigrationError> {
        let (old_namespace, new_namespace) = change.validate()?;
        let mut report = MigrationReport::empty(old_namespace, new_namespace, change.verbose);
        if old_namespace == new_namespace {
            tracing::trace!(namespace = old_namespace, "namespaces are equal, nothing to change");
            return Ok(report);
        }
        tracing::debug!(
            store = primary.name(),
            reference = reference.name(),
            old_namespace,
            new_namespace,
            same_as = change.record_equivalence,
            "starting namespace migration"
        );

        let batch = select_batch(primary, old_namespace)?;
        observer.on_batch_selected(old_namespace, &batch);

        let total = batch.len();
        for (offset, old_id) in batch.into_iter().enumerate() {
            let new_id = self
                .allocator
                .allocate(new_namespace, &[reference, primary])
                .map_err(|source| MigrationError::Allocation {
                    old_id: old_id.clone(),
                    source,
                })?;

            let (statements, equivalence_added) = {
                let _guard = primary.lock(LockMode::Write)?;
                let statements = primary.rename(&old_id, &new_id)?;
                let added = if change.record_equivalence {
                    primary.add_statement(Statement::new(
                        new_id.clone(),
                        OWL_SAME_AS,
                        old_id.clone(),
                    ))?
                } else {
                    false
                };
                (statements, added)
            };

            let index = offset + 1;
            observer.on_progress(&Progress {
                index,
                total,
                percent: percent_complete(index, total),
                old_id: old_id.clone(),
                new_id: new_id.clone(),
            });
            report.record(
                RenamedResource {
                    old_id,
                    new_id,
                    statements,
                },
                equivalence_added,
            );
        }

        primary.flush()?;
        observer.on_complete(&report);
        Ok(report)
    }
}

/// Run one migration with a fresh entropy-seeded allocator, logging through
/// `tracing`.
pub fn change_namespace(
    primary: &dyn GraphStore,
    reference: &dyn GraphStore,
    change: &NamespaceChange,
) -> Result<MigrationReport, MigrationError> {
    MigrationEngine::from_entropy().execute(
        primary,
        reference,
        change,
        &mut TracingObserver::default(),
    )
}
