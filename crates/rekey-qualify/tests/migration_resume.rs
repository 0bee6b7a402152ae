use rekey_graph::vocab::OWL_SAME_AS;
use rekey_graph::{
    GraphStore, Iri, Literal, LockMode, MemoryGraph, Statement, StoreError, StoreGuard,
    TriplePattern,
};
use rekey_qualify::{
    IdentifierAllocator, MigrationEngine, MigrationError, NamespaceChange, NullObserver,
    change_namespace, select_batch,
};
use std::cell::Cell;
use std::fs;
use std::path::PathBuf;
use std::time::{SystemTime, UNIX_EPOCH};

#[derive(Clone, Copy, PartialEq, Eq)]
enum Fault {
    /// Fail before the rename reaches the store.
    Before,
    /// Apply the rename, then report the store as unreachable.
    AfterCommit,
}

/// Delegates to a `MemoryGraph` and fails the n-th rename call.
struct FlakyStore {
    inner: MemoryGraph,
    fail_on: Cell<Option<(usize, Fault)>>,
    renames: Cell<usize>,
    flushes: Cell<usize>,
}

impl FlakyStore {
    fn new(inner: MemoryGraph, fail_on: usize, fault: Fault) -> Self {
        Self {
            inner,
            fail_on: Cell::new(Some((fail_on, fault))),
            renames: Cell::new(0),
            flushes: Cell::new(0),
        }
    }

    fn heal(&self) {
        self.fail_on.set(None);
    }

    fn unreachable(&self) -> StoreError {
        StoreError::Unreachable {
            store: self.inner.name().to_string(),
            message: "connection reset".to_string(),
        }
    }
}

impl GraphStore for FlakyStore {
    fn name(&self) -> &str {
        self.inner.name()
    }

    fn lock(&self, mode: LockMode) -> Result<StoreGuard<'_>, StoreError> {
        self.inner.lock(mode)
    }

    fn query(&self, pattern: &TriplePattern) -> Result<Vec<Statement>, StoreError> {
        self.inner.query(pattern)
    }

    fn contains_identifier(&self, id: &Iri) -> Result<bool, StoreError> {
        self.inner.contains_identifier(id)
    }

    fn rename(&self, old: &Iri, new: &Iri) -> Result<usize, StoreError> {
        let call = self.renames.get() + 1;
        self.renames.set(call);
        match self.fail_on.get() {
            Some((n, Fault::Before)) if n == call => Err(self.unreachable()),
            Some((n, Fault::AfterCommit)) if n == call => {
                self.inner.rename(old, new)?;
                Err(self.unreachable())
            }
            _ => self.inner.rename(old, new),
        }
    }

    fn add_statement(&self, statement: Statement) -> Result<bool, StoreError> {
        self.inner.add_statement(statement)
    }

    fn remove_statement(&self, statement: &Statement) -> Result<bool, StoreError> {
        self.inner.remove_statement(statement)
    }

    fn len(&self) -> Result<usize, StoreError> {
        self.inner.len()
    }

    fn flush(&self) -> Result<(), StoreError> {
        self.flushes.set(self.flushes.get() + 1);
        self.inner.flush()
    }
}

fn three_people() -> MemoryGraph {
    MemoryGraph::from_statements(
        "primary",
        vec![
            Statement::new("ex:p1", "foaf:name", Literal::plain("One")),
            Statement::new("ex:p2", "foaf:name", Literal::plain("Two")),
            Statement::new("ex:p3", "foaf:name", Literal::plain("Three")),
            Statement::new("ex:p1", "foaf:knows", Iri::new("ex:p3")),
        ],
    )
}

fn remaining_in(store: &dyn GraphStore, namespace: &str) -> Vec<Iri> {
    select_batch(store, namespace).expect("selection should succeed")
}

#[test]
fn rerun_after_committed_failure_renames_only_the_remainder() {
    let store = FlakyStore::new(three_people(), 2, Fault::AfterCommit);
    let reference = MemoryGraph::in_memory("reference");
    let change = NamespaceChange::new("ex:", "new:").record_equivalence(true);
    let mut engine = MigrationEngine::new(IdentifierAllocator::seeded(3));

    let err = engine
        .execute(&store, &reference, &change, &mut NullObserver)
        .expect_err("second rename must fail");
    assert!(matches!(
        err,
        MigrationError::Store(StoreError::Unreachable { .. })
    ));
    assert_eq!(store.flushes.get(), 0);
    assert_eq!(remaining_in(&store, "ex:"), vec![Iri::new("ex:p3")]);

    store.heal();
    let report = engine
        .execute(&store, &reference, &change.clone().verbose(true), &mut NullObserver)
        .expect("rerun should succeed");
    assert_eq!(report.renamed, 1);
    assert_eq!(
        report.pairs.expect("pairs")[0].old_id,
        Iri::new("ex:p3")
    );
    assert!(remaining_in(&store, "ex:").is_empty());
    assert_eq!(store.flushes.get(), 1);
}

#[test]
fn rerun_after_rejected_rename_picks_up_failed_resource() {
    let store = FlakyStore::new(three_people(), 2, Fault::Before);
    let change = NamespaceChange::new("ex:", "new:");
    let mut engine = MigrationEngine::new(IdentifierAllocator::seeded(8));

    engine
        .execute(&store, &store, &change, &mut NullObserver)
        .expect_err("second rename must fail");
    assert_eq!(
        remaining_in(&store, "ex:"),
        vec![Iri::new("ex:p2"), Iri::new("ex:p3")]
    );

    store.heal();
    let report = engine
        .execute(&store, &store, &change, &mut NullObserver)
        .expect("rerun should succeed");
    assert_eq!(report.renamed, 2);
    assert_eq!(store.len().expect("len"), 4);
}

#[test]
fn end_to_end_single_resource_with_same_as() {
    let store = MemoryGraph::from_statements(
        "primary",
        vec![Statement::new("ex:a1", "foaf:name", Literal::plain("Alice"))],
    );

    let report = change_namespace(
        &store,
        &store,
        &NamespaceChange::new("ex:", "http://new/")
            .record_equivalence(true)
            .verbose(true),
    )
    .expect("migration should succeed");

    assert_eq!(report.renamed, 1);
    let pairs = report.pairs.expect("pairs");
    let pair = &pairs[0];
    let local = pair
        .new_id
        .as_str()
        .strip_prefix("http://new/n")
        .expect("new id should be in the new namespace");
    assert!(local.parse::<u32>().is_ok());

    let statements = store.statements().expect("statements");
    assert_eq!(statements.len(), 2);
    assert!(statements.contains(&Statement::new(
        pair.new_id.clone(),
        "foaf:name",
        Literal::plain("Alice")
    )));
    assert!(statements.contains(&Statement::new(
        pair.new_id.clone(),
        OWL_SAME_AS,
        Iri::new("ex:a1")
    )));
}

#[test]
fn jsonl_backed_store_is_flushed_after_run() {
    let unique = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("clock should be after unix epoch")
        .as_nanos();
    let path: PathBuf = std::env::temp_dir().join(format!(
        "rekey-qualify-flush-{}-{unique}.jsonl",
        std::process::id()
    ));

    {
        let store = MemoryGraph::open_jsonl("disk", &path).expect("open should succeed");
        store
            .load_statements(three_people().statements().expect("statements"))
            .expect("load should succeed");
        MigrationEngine::new(IdentifierAllocator::seeded(21))
            .execute(&store, &store, &NamespaceChange::new("ex:", "new:"), &mut NullObserver)
            .expect("migration should succeed");
    }

    let reopened = MemoryGraph::open_jsonl("disk", &path).expect("reopen should succeed");
    assert_eq!(reopened.len().expect("len"), 4);
    assert!(remaining_in(&reopened, "ex:").is_empty());
    drop(reopened);
    let _ = fs::remove_file(path);
}
