//! Split delimited literal values into one statement per piece.
//!
//! Identifiers are never touched: only literal objects of the old predicate
//! are read, and the pieces are asserted under the new predicate against the
//! same subject.

use regex::Regex;
use rekey_graph::{GraphStore, Iri, LockMode, MemoryGraph, Statement, StoreError, TriplePattern};
use serde::Serialize;
use tracing::{debug, info};

#[derive(Debug, thiserror::Error)]
pub enum SplitError {
    #[error("invalid split regex `{pattern}`: {message}")]
    InvalidDelimiter { pattern: String, message: String },

    #[error("{0} predicate cannot be empty")]
    EmptyPredicate(&'static str),

    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Derive split statements from `store` into a new in-memory graph.
///
/// Every literal object of `old_predicate` is split on `delimiter`; each
/// non-empty piece (trimmed first when `trim` is set) keeps the original
/// datatype or language tag. Non-literal objects are skipped. The input
/// store is only read, under its read lock.
pub fn split_values(
    store: &dyn GraphStore,
    old_predicate: &Iri,
    new_predicate: &Iri,
    delimiter: &Regex,
    trim: bool,
) -> Result<MemoryGraph, StoreError> {
    let out = MemoryGraph::in_memory(format!("{}-split", store.name()));
    let source = {
        let _guard = store.lock(LockMode::Read)?;
        store.query(&TriplePattern::any().with_predicate(old_predicate.clone()))?
    };

    for statement in &source {
        let Some(literal) = statement.object.as_literal() else {
            continue;
        };
        for piece in delimiter.split(literal.lexical()) {
            let piece = if trim { piece.trim() } else { piece };
            if piece.is_empty() {
                continue;
            }
            out.add_statement(Statement::new(
                statement.subject.clone(),
                new_predicate.clone(),
                literal.with_lexical(piece),
            ))?;
        }
    }
    debug!(
        store = store.name(),
        examined = source.len(),
        derived = out.len()?,
        "split property values"
    );
    Ok(out)
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SplitReport {
    /// Statements of the old predicate read from the store.
    pub examined: usize,
    /// Distinct split statements derived.
    pub derived: usize,
    /// Derived statements that were not already in the store.
    pub added: usize,
}

/// A configured split: old predicate, new predicate, delimiter, trim flag.
#[derive(Debug, Clone)]
pub struct SplitProperty {
    old_predicate: Iri,
    new_predicate: Iri,
    delimiter: Regex,
    trim: bool,
}

impl SplitProperty {
    pub fn new(
        old_predicate: impl Into<String>,
        new_predicate: impl Into<String>,
        delimiter: &str,
    ) -> Result<Self, SplitError> {
        let old_predicate = old_predicate.into();
        if old_predicate.trim().is_empty() {
            return Err(SplitError::EmptyPredicate("old"));
        }
        let new_predicate = new_predicate.into();
        if new_predicate.trim().is_empty() {
            return Err(SplitError::EmptyPredicate("new"));
        }
        let delimiter = Regex::new(delimiter).map_err(|e| SplitError::InvalidDelimiter {
            pattern: delimiter.to_string(),
            message: e.to_string(),
        })?;
        Ok(Self {
            old_predicate: Iri::new(old_predicate),
            new_predicate: Iri::new(new_predicate),
            delimiter,
            trim: false,
        })
    }

    pub fn trim(mut self, enabled: bool) -> Self {
        self.trim = enabled;
        self
    }

    /// Derived statements only; `store` is not modified.
    pub fn derive(&self, store: &dyn GraphStore) -> Result<MemoryGraph, SplitError> {
        Ok(split_values(
            store,
            &self.old_predicate,
            &self.new_predicate,
            &self.delimiter,
            self.trim,
        )?)
    }

    /// Derive, merge the result back into `store` under its write lock, and
    /// flush it.
    pub fn apply(&self, store: &dyn GraphStore) -> Result<SplitReport, SplitError> {
        let examined = {
            let _guard = store.lock(LockMode::Read)?;
            store
                .query(&TriplePattern::any().with_predicate(self.old_predicate.clone()))?
                .len()
        };
        let derived = self.derive(store)?;
        let statements = derived.statements()?;

        let mut added = 0;
        {
            let _guard = store.lock(LockMode::Write)?;
            for statement in &statements {
                if store.add_statement(statement.clone())? {
                    added += 1;
                }
            }
        }
        store.flush()?;

        let report = SplitReport {
            examined,
            derived: statements.len(),
            added,
        };
        info!(
            store = store.name(),
            old_predicate = %self.old_predicate,
            new_predicate = %self.new_predicate,
            derived = report.derived,
            added = report.added,
            "split property values"
        );
        Ok(report)
    }
}
