//! The graph store boundary consumed by the migration and split tools.
//!
//! Every operation is potentially blocking I/O. Individual operations are
//! atomic with respect to the store's own data lock; `lock` gives callers a
//! coarser critical section to bracket check-then-act sequences.

use crate::jsonl::JsonlError;
use crate::lockfile::LockFileError;
use crate::pattern::TriplePattern;
use crate::term::{Iri, Statement};
use std::collections::BTreeSet;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

/// Errors raised by graph store operations.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("graph store `{store}` is unreachable: {message}")]
    Unreachable { store: String, message: String },

    #[error("graph store `{store}` lock poisoned")]
    Poisoned { store: String },

    #[error(transparent)]
    LockFile(#[from] LockFileError),

    #[error("graph store `{store}` persistence failed: {source}")]
    Persist {
        store: String,
        #[source]
        source: JsonlError,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LockMode {
    Read,
    Write,
}

impl LockMode {
    pub fn as_str(self) -> &'static str {
        match self {
            LockMode::Read => "read",
            LockMode::Write => "write",
        }
    }
}

/// Scoped critical-section guard; released when dropped.
#[derive(Debug)]
pub struct StoreGuard<'a> {
    mode: LockMode,
    _held: HeldSection<'a>,
}

#[derive(Debug)]
enum HeldSection<'a> {
    Read(#[allow(dead_code)] RwLockReadGuard<'a, ()>),
    Write(#[allow(dead_code)] RwLockWriteGuard<'a, ()>),
}

impl<'a> StoreGuard<'a> {
    /// Enter `section` in `mode`, blocking until it is available.
    pub fn enter(section: &'a RwLock<()>, mode: LockMode, store: &str) -> Result<Self, StoreError> {
        let poisoned = || StoreError::Poisoned {
            store: store.to_string(),
        };
        let held = match mode {
            LockMode::Read => HeldSection::Read(section.read().map_err(|_| poisoned())?),
            LockMode::Write => HeldSection::Write(section.write().map_err(|_| poisoned())?),
        };
        Ok(Self { mode, _held: held })
    }

    pub fn mode(&self) -> LockMode {
        self.mode
    }
}

/// A named, mutable set of statements.
pub trait GraphStore {
    /// Store name used in logs and errors.
    fn name(&self) -> &str;

    /// Enter the store's critical section.
    ///
    /// Not reentrant: a caller holding a guard must not request another one
    /// on the same store.
    fn lock(&self, mode: LockMode) -> Result<StoreGuard<'_>, StoreError>;

    /// Statements matching `pattern`, ordered by subject, predicate, object.
    fn query(&self, pattern: &TriplePattern) -> Result<Vec<Statement>, StoreError>;

    /// Distinct subjects of the statements matching `pattern`, in order.
    fn distinct_subjects(&self, pattern: &TriplePattern) -> Result<Vec<Iri>, StoreError> {
        let subjects: BTreeSet<Iri> = self
            .query(pattern)?
            .into_iter()
            .map(|statement| statement.subject)
            .collect();
        Ok(subjects.into_iter().collect())
    }

    /// Whether `id` is the subject or object of at least one statement.
    fn contains_identifier(&self, id: &Iri) -> Result<bool, StoreError>;

    /// Re-point every statement mentioning `old` (as subject or object) to
    /// `new`. Returns the number of statements rewritten.
    fn rename(&self, old: &Iri, new: &Iri) -> Result<usize, StoreError>;

    /// Insert one statement. Returns `false` if it was already present.
    fn add_statement(&self, statement: Statement) -> Result<bool, StoreError>;

    /// Remove one statement. Returns `false` if it was absent.
    fn remove_statement(&self, statement: &Statement) -> Result<bool, StoreError>;

    fn len(&self) -> Result<usize, StoreError>;

    fn is_empty(&self) -> Result<bool, StoreError> {
        Ok(self.len()? == 0)
    }

    /// Make prior mutations durable and visible to other handles.
    fn flush(&self) -> Result<(), StoreError>;
}
