//! Collision-free identifier allocation across one or more graph stores.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rekey_graph::{GraphStore, Iri, LockMode, StoreError};
use tracing::{debug, trace};

/// Local-name prefix placed between the namespace and the random integer.
pub const IDENTIFIER_LOCAL_PREFIX: &str = "n";

/// Exclusive upper bound of the random integer in a candidate identifier.
pub const CANDIDATE_UPPER_BOUND: u32 = i32::MAX as u32;

#[derive(Debug, thiserror::Error)]
pub enum AllocateError {
    #[error("namespace cannot be empty")]
    EmptyNamespace,

    #[error("no unused identifier found in namespace `{namespace}` after {attempts} attempts")]
    Exhausted { namespace: String, attempts: u32 },

    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Mints `namespace + "n" + <random>` identifiers absent from every store.
///
/// The identifier is not reserved: two allocations against the same stores
/// may return the same value until one of them is referenced by a statement.
#[derive(Debug, Clone)]
pub struct IdentifierAllocator<R = StdRng> {
    rng: R,
    max_attempts: Option<u32>,
}

impl IdentifierAllocator<StdRng> {
    pub fn from_entropy() -> Self {
        Self::new(StdRng::from_entropy())
    }

    /// Deterministic allocator for reproducible runs.
    pub fn seeded(seed: u64) -> Self {
        Self::new(StdRng::seed_from_u64(seed))
    }
}

impl<R: Rng> IdentifierAllocator<R> {
    /// Allocator with unbounded retries.
    pub fn new(rng: R) -> Self {
        Self {
            rng,
            max_attempts: None,
        }
    }

    /// Cap the number of candidates tried before `AllocateError::Exhausted`.
    pub fn with_max_attempts(mut self, max_attempts: u32) -> Self {
        self.max_attempts = Some(max_attempts.max(1));
        self
    }

    pub fn max_attempts(&self) -> Option<u32> {
        self.max_attempts
    }

    fn candidate(&mut self, namespace: &str) -> Iri {
        let local = self.rng.gen_range(0..CANDIDATE_UPPER_BOUND);
        Iri::new(format!("{namespace}{IDENTIFIER_LOCAL_PREFIX}{local}"))
    }

    /// Return an identifier in `namespace` that no store in `stores` mentions.
    ///
    /// Each store is checked under its own read lock, one store at a time.
    pub fn allocate(
        &mut self,
        namespace: &str,
        stores: &[&dyn GraphStore],
    ) -> Result<Iri, AllocateError> {
        if namespace.is_empty() {
            return Err(AllocateError::EmptyNamespace);
        }

        let mut attempts: u32 = 0;
        loop {
            if let Some(max) = self.max_attempts
                && attempts >= max
            {
                return Err(AllocateError::Exhausted {
                    namespace: namespace.to_string(),
                    attempts,
                });
            }
            attempts = attempts.saturating_add(1);

            let candidate = self.candidate(namespace);
            trace!(candidate = %candidate, attempt = attempts, "evaluating identifier");
            if is_unused(&candidate, stores)? {
                debug!(identifier = %candidate, attempts, "using new identifier");
                return Ok(candidate);
            }
        }
    }
}

fn is_unused(candidate: &Iri, stores: &[&dyn GraphStore]) -> Result<bool, StoreError> {
    for store in stores {
        let _guard = store.lock(LockMode::Read)?;
        let contains = store.contains_identifier(candidate)?;
        trace!(store = store.name(), candidate = %candidate, contains, "store lookup");
        if contains {
            return Ok(false);
        }
    }
    Ok(true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rekey_graph::{Literal, MemoryGraph, Statement};

    fn draws(seed: u64, count: usize) -> Vec<u32> {
        let mut preview = StdRng::seed_from_u64(seed);
        (0..count)
            .map(|_| preview.gen_range(0..CANDIDATE_UPPER_BOUND))
            .collect()
    }

    #[test]
    fn allocates_in_namespace_with_local_prefix() {
        let store = MemoryGraph::in_memory("primary");
        let mut allocator = IdentifierAllocator::seeded(11);
        let id = allocator
            .allocate("http://new/", &[&store])
            .expect("allocation should succeed");
        let expected = format!("http://new/n{}", draws(11, 1)[0]);
        assert_eq!(id.as_str(), expected);
    }

    #[test]
    fn retries_after_collision_in_any_store() {
        let seed = 42;
        let values = draws(seed, 3);
        let reference = MemoryGraph::from_statements(
            "reference",
            vec![Statement::new(
                format!("new:n{}", values[0]),
                "foaf:name",
                Literal::plain("taken"),
            )],
        );
        let primary = MemoryGraph::from_statements(
            "primary",
            vec![Statement::new(
                "ex:x",
                "foaf:knows",
                Iri::new(format!("new:n{}", values[1])),
            )],
        );

        let mut allocator = IdentifierAllocator::seeded(seed);
        let id = allocator
            .allocate("new:", &[&reference, &primary])
            .expect("third candidate should be free");
        assert_eq!(id.as_str(), format!("new:n{}", values[2]));
        assert!(!reference.contains_identifier(&id).expect("lookup"));
        assert!(!primary.contains_identifier(&id).expect("lookup"));
    }

    #[test]
    fn bounded_allocator_reports_exhaustion() {
        let seed = 5;
        let first = draws(seed, 1)[0];
        let store = MemoryGraph::from_statements(
            "primary",
            vec![Statement::new(
                format!("new:n{first}"),
                "foaf:name",
                Literal::plain("taken"),
            )],
        );

        let mut allocator = IdentifierAllocator::seeded(seed).with_max_attempts(1);
        let err = allocator
            .allocate("new:", &[&store])
            .expect_err("single attempt must collide");
        assert!(matches!(
            err,
            AllocateError::Exhausted { ref namespace, attempts: 1 } if namespace == "new:"
        ));
    }

    #[test]
    fn empty_namespace_is_rejected() {
        let store = MemoryGraph::in_memory("primary");
        let err = IdentifierAllocator::seeded(1)
            .allocate("", &[&store])
            .expect_err("empty namespace must fail");
        assert!(matches!(err, AllocateError::EmptyNamespace));
    }

    #[test]
    fn unbounded_by_default() {
        assert_eq!(IdentifierAllocator::seeded(1).max_attempts(), None);
        assert_eq!(
            IdentifierAllocator::seeded(1).with_max_attempts(0).max_attempts(),
            Some(1)
        );
    }
}
