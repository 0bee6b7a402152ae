//! # rekey-graph
//!
//! Graph store layer for statement-level RDF data.
//!
//! This crate provides:
//! - `Iri`, `Literal`, `Term` and `Statement` (the data model)
//! - `TriplePattern` queries with anchored-prefix subject matching
//! - the `GraphStore` trait consumed by the qualify tools
//! - `MemoryGraph` (canonical in-memory store, optionally JSONL-backed)
//!
//! It intentionally does not rename namespaces or split values.
//! Those tools live in `rekey-qualify`.
//!
//! ## Data model
//!
//! ```text
//! JSONL (on disk, one line per statement)
//!     <->  open / flush
//! MemoryGraph (set semantics, subject/object indices)
//! ```

pub mod jsonl;
pub mod lockfile;
pub mod memory;
pub mod pattern;
pub mod store;
pub mod term;

pub use jsonl::{
    JsonlError, read_statements, read_statements_from_path, write_statements,
    write_statements_to_path,
};
pub use lockfile::{LockFileError, StoreFileLock, store_lock_path};
pub use memory::{GRAPH_SNAPSHOT_PREFIX, MemoryGraph};
pub use pattern::{PatternError, SubjectPattern, TriplePattern};
pub use store::{GraphStore, LockMode, StoreError, StoreGuard};
pub use term::{Iri, Literal, Statement, Term};

/// Well-known vocabulary IRIs.
pub mod vocab {
    pub const OWL_SAME_AS: &str = "http://www.w3.org/2002/07/owl#sameAs";
    pub const RDF_TYPE: &str = "http://www.w3.org/1999/02/22-rdf-syntax-ns#type";
    pub const RDFS_LABEL: &str = "http://www.w3.org/2000/01/rdf-schema#label";
    pub const XSD_STRING: &str = "http://www.w3.org/2001/XMLSchema#string";
}
