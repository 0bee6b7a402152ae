//! # rekey-qualify
//!
//! Qualify tools that rewrite data already loaded into a graph store.
//!
//! - `IdentifierAllocator`: fresh identifiers in a namespace, checked
//!   against every given store under read locks
//! - `MigrationEngine`: namespace migration with optional `owl:sameAs`
//!   provenance and per-resource progress events
//! - `SplitProperty`: decompose delimited literal values
//!
//! Stores are consumed through `rekey_graph::GraphStore`; this crate owns no
//! storage of its own beyond the in-memory output of a split.

pub mod allocator;
pub mod migration;
pub mod observer;
pub mod split;

pub use allocator::{
    AllocateError, CANDIDATE_UPPER_BOUND, IDENTIFIER_LOCAL_PREFIX, IdentifierAllocator,
};
pub use migration::{
    MigrationEngine, MigrationError, MigrationReport, NamespaceChange, Progress, RenamedResource,
    ValidationError, change_namespace, percent_complete, select_batch,
};
pub use observer::{MigrationObserver, NullObserver, TracingObserver};
pub use split::{SplitError, SplitProperty, SplitReport, split_values};
