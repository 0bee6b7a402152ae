//! Canonical in-memory graph, optionally backed by a JSONL file.
//!
//! - set semantics over statements
//! - subject and object indices for identity lookups
//! - deterministic (lexicographic) iteration order
//! - `flush` persists to JSONL when a backing file is attached

use crate::jsonl::{read_statements_from_path, write_statements_to_path};
use crate::lockfile::StoreFileLock;
use crate::pattern::{SubjectPattern, TriplePattern};
use crate::store::{GraphStore, LockMode, StoreError, StoreGuard};
use crate::term::{Iri, Statement, Term};
use sha2::{Digest, Sha256};
use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};
use tracing::debug;

pub const GRAPH_SNAPSHOT_PREFIX: &str = "graph1_";

#[derive(Debug, Clone, Default)]
struct GraphState {
    statements: BTreeSet<Statement>,
    by_subject: BTreeMap<Iri, BTreeSet<Statement>>,
    by_object: BTreeMap<Iri, BTreeSet<Statement>>,
}

impl GraphState {
    fn insert(&mut self, statement: Statement) -> bool {
        if self.statements.contains(&statement) {
            return false;
        }
        self.by_subject
            .entry(statement.subject.clone())
            .or_default()
            .insert(statement.clone());
        if let Term::Iri(object) = &statement.object {
            self.by_object
                .entry(object.clone())
                .or_default()
                .insert(statement.clone());
        }
        self.statements.insert(statement)
    }

    fn remove(&mut self, statement: &Statement) -> bool {
        if !self.statements.remove(statement) {
            return false;
        }
        remove_indexed(&mut self.by_subject, &statement.subject, statement);
        if let Term::Iri(object) = &statement.object {
            remove_indexed(&mut self.by_object, object, statement);
        }
        true
    }

    fn mentioning(&self, id: &Iri) -> BTreeSet<Statement> {
        let mut found = BTreeSet::new();
        if let Some(as_subject) = self.by_subject.get(id) {
            found.extend(as_subject.iter().cloned());
        }
        if let Some(as_object) = self.by_object.get(id) {
            found.extend(as_object.iter().cloned());
        }
        found
    }
}

fn remove_indexed(index: &mut BTreeMap<Iri, BTreeSet<Statement>>, key: &Iri, statement: &Statement) {
    if let Some(bucket) = index.get_mut(key) {
        bucket.remove(statement);
        if bucket.is_empty() {
            index.remove(key);
        }
    }
}

#[derive(Debug)]
struct JsonlBacking {
    path: PathBuf,
    _lock: StoreFileLock,
}

/// In-memory graph store.
#[derive(Debug)]
pub struct MemoryGraph {
    name: String,
    section: RwLock<()>,
    state: RwLock<GraphState>,
    backing: Option<JsonlBacking>,
}

impl MemoryGraph {
    /// Empty graph with no backing file; `flush` is a no-op.
    pub fn in_memory(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            section: RwLock::new(()),
            state: RwLock::new(GraphState::default()),
            backing: None,
        }
    }

    pub fn from_statements(
        name: impl Into<String>,
        statements: impl IntoIterator<Item = Statement>,
    ) -> Self {
        let mut state = GraphState::default();
        for statement in statements {
            state.insert(statement);
        }
        Self {
            name: name.into(),
            section: RwLock::new(()),
            state: RwLock::new(state),
            backing: None,
        }
    }

    /// Open a JSONL-backed graph.
    ///
    /// A missing file opens as an empty graph and is created on first flush.
    /// The handle owns `<path>.lock` until dropped, so a second handle on the
    /// same file fails with `LockFileError::Busy`.
    pub fn open_jsonl(name: impl Into<String>, path: impl AsRef<Path>) -> Result<Self, StoreError> {
        let name = name.into();
        let path = path.as_ref().to_path_buf();
        let lock = StoreFileLock::acquire(&path)?;
        let statements = if path.exists() {
            read_statements_from_path(&path).map_err(|source| StoreError::Persist {
                store: name.clone(),
                source,
            })?
        } else {
            Vec::new()
        };
        debug!(store = %name, path = %path.display(), statements = statements.len(), "opened jsonl graph");

        let graph = Self::from_statements(name, statements);
        Ok(Self {
            backing: Some(JsonlBacking { path, _lock: lock }),
            ..graph
        })
    }

    pub fn backing_path(&self) -> Option<&Path> {
        self.backing.as_ref().map(|b| b.path.as_path())
    }

    /// Insert many statements; returns how many were new.
    pub fn load_statements(
        &self,
        statements: impl IntoIterator<Item = Statement>,
    ) -> Result<usize, StoreError> {
        let mut state = self.write_state()?;
        Ok(statements
            .into_iter()
            .map(|statement| state.insert(statement))
            .filter(|inserted| *inserted)
            .count())
    }

    /// All statements in canonical order.
    pub fn statements(&self) -> Result<Vec<Statement>, StoreError> {
        Ok(self.read_state()?.statements.iter().cloned().collect())
    }

    /// N-Triples rendering, one sorted line per statement.
    pub fn to_ntriples(&self) -> Result<String, StoreError> {
        let state = self.read_state()?;
        let mut out = String::new();
        for statement in &state.statements {
            out.push_str(&statement.to_ntriples());
            out.push('\n');
        }
        Ok(out)
    }

    /// Content digest of the current statement set.
    pub fn snapshot_ref(&self) -> Result<String, StoreError> {
        let state = self.read_state()?;
        let mut hasher = Sha256::new();
        for statement in &state.statements {
            hasher.update(statement.to_ntriples().as_bytes());
            hasher.update([0]);
        }
        Ok(format!("{GRAPH_SNAPSHOT_PREFIX}{:x}", hasher.finalize()))
    }

    fn read_state(&self) -> Result<RwLockReadGuard<'_, GraphState>, StoreError> {
        self.state.read().map_err(|_| self.poisoned())
    }

    fn write_state(&self) -> Result<RwLockWriteGuard<'_, GraphState>, StoreError> {
        self.state.write().map_err(|_| self.poisoned())
    }

    fn poisoned(&self) -> StoreError {
        StoreError::Poisoned {
            store: self.name.clone(),
        }
    }
}

impl GraphStore for MemoryGraph {
    fn name(&self) -> &str {
        &self.name
    }

    fn lock(&self, mode: LockMode) -> Result<StoreGuard<'_>, StoreError> {
        StoreGuard::enter(&self.section, mode, &self.name)
    }

    fn query(&self, pattern: &TriplePattern) -> Result<Vec<Statement>, StoreError> {
        let state = self.read_state()?;
        let candidates: Box<dyn Iterator<Item = &Statement> + '_> =
            match (&pattern.subject, &pattern.object) {
                (SubjectPattern::Exact(subject), _) => {
                    Box::new(state.by_subject.get(subject).into_iter().flatten())
                }
                (_, Some(Term::Iri(object))) => {
                    Box::new(state.by_object.get(object).into_iter().flatten())
                }
                _ => Box::new(state.statements.iter()),
            };
        Ok(candidates
            .filter(|statement| pattern.matches(statement))
            .cloned()
            .collect())
    }

    fn contains_identifier(&self, id: &Iri) -> Result<bool, StoreError> {
        let state = self.read_state()?;
        Ok(state.by_subject.contains_key(id) || state.by_object.contains_key(id))
    }

    fn rename(&self, old: &Iri, new: &Iri) -> Result<usize, StoreError> {
        if old == new {
            return Ok(0);
        }
        let mut state = self.write_state()?;
        let affected = state.mentioning(old);
        for statement in &affected {
            state.remove(statement);
        }
        for statement in &affected {
            state.insert(statement.renamed(old, new));
        }
        Ok(affected.len())
    }

    fn add_statement(&self, statement: Statement) -> Result<bool, StoreError> {
        Ok(self.write_state()?.insert(statement))
    }

    fn remove_statement(&self, statement: &Statement) -> Result<bool, StoreError> {
        Ok(self.write_state()?.remove(statement))
    }

    fn len(&self) -> Result<usize, StoreError> {
        Ok(self.read_state()?.statements.len())
    }

    fn flush(&self) -> Result<(), StoreError> {
        let Some(backing) = &self.backing else {
            return Ok(());
        };
        let state = self.read_state()?;
        write_statements_to_path(&backing.path, &state.statements).map_err(|source| {
            StoreError::Persist {
                store: self.name.clone(),
                source,
            }
        })?;
        debug!(
            store = %self.name,
            path = %backing.path.display(),
            statements = state.statements.len(),
            "flushed jsonl graph"
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::term::Literal;
    use std::fs;
    use std::time::{SystemTime, UNIX_EPOCH};

    fn temp_path(prefix: &str) -> PathBuf {
        let unique = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .expect("clock should be after unix epoch")
            .as_nanos();
        std::env::temp_dir().join(format!(
            "rekey-memory-{prefix}-{}-{unique}.jsonl",
            std::process::id()
        ))
    }

    fn sample() -> MemoryGraph {
        MemoryGraph::from_statements(
            "sample",
            vec![
                Statement::new("ex:b", "foaf:name", Literal::plain("Bob")),
                Statement::new("ex:a", "foaf:name", Literal::plain("Alice")),
                Statement::new("ex:a", "foaf:knows", Iri::new("ex:b")),
                Statement::new("other:c", "foaf:knows", Iri::new("ex:a")),
            ],
        )
    }

    #[test]
    fn duplicate_statements_collapse() {
        let graph = sample();
        let added = graph
            .add_statement(Statement::new("ex:a", "foaf:name", Literal::plain("Alice")))
            .expect("add should succeed");
        assert!(!added);
        assert_eq!(graph.len().expect("len should succeed"), 4);
    }

    #[test]
    fn query_orders_by_subject() {
        let graph = sample();
        let subjects: Vec<String> = graph
            .query(&TriplePattern::any())
            .expect("query should succeed")
            .into_iter()
            .map(|s| s.subject.to_string())
            .collect();
        assert_eq!(subjects, vec!["ex:a", "ex:a", "ex:b", "other:c"]);
    }

    #[test]
    fn distinct_subjects_with_prefix() {
        let graph = sample();
        let pattern = TriplePattern::any()
            .with_subject(SubjectPattern::prefix("ex:").expect("prefix should compile"));
        let subjects = graph
            .distinct_subjects(&pattern)
            .expect("query should succeed");
        assert_eq!(subjects, vec![Iri::new("ex:a"), Iri::new("ex:b")]);
    }

    #[test]
    fn contains_identifier_checks_subject_and_object_only() {
        let graph = sample();
        assert!(graph.contains_identifier(&Iri::new("ex:b")).expect("lookup"));
        assert!(graph.contains_identifier(&Iri::new("other:c")).expect("lookup"));
        assert!(!graph.contains_identifier(&Iri::new("foaf:knows")).expect("lookup"));
    }

    #[test]
    fn rename_preserves_other_components() {
        let graph = sample();
        let old = Iri::new("ex:a");
        let new = Iri::new("new:n7");

        let rewritten = graph.rename(&old, &new).expect("rename should succeed");
        assert_eq!(rewritten, 3);
        assert!(!graph.contains_identifier(&old).expect("lookup"));
        assert_eq!(graph.len().expect("len"), 4);

        let expected = vec![
            Statement::new("ex:b", "foaf:name", Literal::plain("Bob")),
            Statement::new("new:n7", "foaf:knows", Iri::new("ex:b")),
            Statement::new("new:n7", "foaf:name", Literal::plain("Alice")),
            Statement::new("other:c", "foaf:knows", Iri::new("new:n7")),
        ];
        assert_eq!(graph.statements().expect("statements"), expected);
    }

    #[test]
    fn rename_rewrites_self_reference_once() {
        let graph = MemoryGraph::from_statements(
            "loop",
            vec![Statement::new("ex:a", "owl:sameAs", Iri::new("ex:a"))],
        );
        let rewritten = graph
            .rename(&Iri::new("ex:a"), &Iri::new("new:a"))
            .expect("rename should succeed");
        assert_eq!(rewritten, 1);
        assert_eq!(
            graph.statements().expect("statements"),
            vec![Statement::new("new:a", "owl:sameAs", Iri::new("new:a"))]
        );
    }

    #[test]
    fn remove_statement_drops_indices() {
        let graph = sample();
        let removed = graph
            .remove_statement(&Statement::new("other:c", "foaf:knows", Iri::new("ex:a")))
            .expect("remove should succeed");
        assert!(removed);
        assert!(!graph.contains_identifier(&Iri::new("other:c")).expect("lookup"));
    }

    #[test]
    fn lock_guard_reports_mode() {
        let graph = sample();
        let guard = graph.lock(LockMode::Write).expect("lock should succeed");
        assert_eq!(guard.mode(), LockMode::Write);
        drop(guard);
        let read_a = graph.lock(LockMode::Read).expect("read lock");
        let read_b = graph.lock(LockMode::Read).expect("shared read lock");
        assert_eq!(read_a.mode(), read_b.mode());
    }

    #[test]
    fn snapshot_ref_tracks_content() {
        let a = sample();
        let b = sample();
        let before = a.snapshot_ref().expect("digest");
        assert!(before.starts_with(GRAPH_SNAPSHOT_PREFIX));
        assert_eq!(before, b.snapshot_ref().expect("digest"));

        a.rename(&Iri::new("ex:b"), &Iri::new("ex:z"))
            .expect("rename should succeed");
        assert_ne!(before, a.snapshot_ref().expect("digest"));
    }

    #[test]
    fn ntriples_rendering_is_sorted() {
        insta::assert_snapshot!(sample().to_ntriples().expect("render"), @r#"
        <ex:a> <foaf:knows> <ex:b> .
        <ex:a> <foaf:name> "Alice" .
        <ex:b> <foaf:name> "Bob" .
        <other:c> <foaf:knows> <ex:a> .
        "#);
    }

    #[test]
    fn jsonl_backing_round_trips_through_flush() {
        let path = temp_path("flush");
        {
            let graph = MemoryGraph::open_jsonl("disk", &path).expect("open should succeed");
            assert!(graph.is_empty().expect("is_empty"));
            graph
                .add_statement(Statement::new("ex:a", "foaf:name", Literal::lang("Alice", "en")))
                .expect("add should succeed");
            graph.flush().expect("flush should succeed");

            let err = MemoryGraph::open_jsonl("disk-again", &path)
                .expect_err("second handle must be refused while first is open");
            assert!(matches!(err, StoreError::LockFile(_)));
        }

        let reopened = MemoryGraph::open_jsonl("disk", &path).expect("reopen should succeed");
        assert_eq!(reopened.backing_path(), Some(path.as_path()));
        assert_eq!(
            reopened.statements().expect("statements"),
            vec![Statement::new("ex:a", "foaf:name", Literal::lang("Alice", "en"))]
        );
        drop(reopened);
        let _ = fs::remove_file(path);
    }
}
