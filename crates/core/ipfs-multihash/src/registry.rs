//! Hashing algorithm registry
//!
//! Resolves algorithm names and codes to [`HashingAlgorithm`] entries. A
//! registry is a cheap handle: clones share the same table, which is guarded
//! by a single lock.

use std::{
    fmt,
    sync::{Arc, LazyLock, Mutex, MutexGuard, PoisonError},
};

use tracing::debug;

use crate::{
    HashingAlgorithm, MultiHashError, Result,
    algorithm::DigestFn,
    digests::BUILTIN,
};

static GLOBAL: LazyLock<AlgorithmRegistry> = LazyLock::new(AlgorithmRegistry::with_defaults);

/// Told about each `ipfs-<code>` algorithm synthesized while decoding
pub type UnknownObserver = Arc<dyn Fn(&HashingAlgorithm) + Send + Sync>;

/// Outcome of resolving a code found in a multihash
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Resolved {
    /// The code is registered
    Known(HashingAlgorithm),
    /// The code is not registered; this is a transient `ipfs-<code>` entry
    Unknown(HashingAlgorithm),
}

impl Resolved {
    pub fn is_known(&self) -> bool {
        matches!(self, Resolved::Known(_))
    }

    pub fn algorithm(&self) -> &HashingAlgorithm {
        match self {
            Resolved::Known(alg) | Resolved::Unknown(alg) => alg,
        }
    }

    pub fn into_algorithm(self) -> HashingAlgorithm {
        match self {
            Resolved::Known(alg) | Resolved::Unknown(alg) => alg,
        }
    }
}

/// Table of hashing algorithms
///
/// ```
/// use ipfs_multihash::AlgorithmRegistry;
///
/// let registry = AlgorithmRegistry::with_defaults();
/// let sha256 = registry.by_name("sha2-256").unwrap();
/// assert_eq!(sha256.code(), 0x12);
/// assert_eq!(sha256.digest_size(), 32);
/// ```
#[derive(Clone, Default)]
pub struct AlgorithmRegistry {
    algorithms: Arc<Mutex<Vec<HashingAlgorithm>>>,
    on_unknown: Arc<Mutex<Option<UnknownObserver>>>,
}

impl AlgorithmRegistry {
    /// An empty registry
    pub fn new() -> Self {
        AlgorithmRegistry::default()
    }

    /// A registry holding the built-in algorithms (sha1, sha2, sha3, keccak,
    /// shake, blake2 and identity)
    pub fn with_defaults() -> Self {
        let algorithms = BUILTIN
            .iter()
            .map(|b| {
                let compute: DigestFn = Arc::new(b.compute);
                HashingAlgorithm::new(b.name, b.code, b.digest_size, Some(compute))
            })
            .collect();
        AlgorithmRegistry {
            algorithms: Arc::new(Mutex::new(algorithms)),
            on_unknown: Arc::default(),
        }
    }

    /// Process-wide registry with the built-in algorithms
    ///
    /// Used by the `FromStr` and serde conversions, which have no way to be
    /// handed a registry.
    pub fn global() -> &'static AlgorithmRegistry {
        &GLOBAL
    }

    /// Register a new algorithm
    ///
    /// # Arguments
    /// * `name` - Unique, non-empty name such as "sha2-256"
    /// * `code` - Unique multicodec code
    /// * `digest_size` - Digest length in bytes, 0 if variable
    /// * `compute` - Digest function, if this build can compute the digest
    ///
    /// # Returns
    /// The registered algorithm, or [`MultiHashError::InvalidArgument`] if the
    /// name is empty or the name or code is already taken.
    pub fn register(
        &self,
        name: &str,
        code: u64,
        digest_size: usize,
        compute: Option<DigestFn>,
    ) -> Result<HashingAlgorithm> {
        if name.is_empty() {
            return Err(MultiHashError::InvalidArgument(
                "algorithm name is empty".into(),
            ));
        }

        let mut lock = self.lock();
        if lock.iter().any(|a| a.name() == name) {
            return Err(MultiHashError::InvalidArgument(format!(
                "hashing algorithm '{name}' is already registered"
            )));
        }
        if let Some(existing) = lock.iter().find(|a| a.code() == code) {
            return Err(MultiHashError::InvalidArgument(format!(
                "hashing algorithm code 0x{code:x} is already registered as '{existing}'"
            )));
        }

        debug!("Registering hashing algorithm ({name}, 0x{code:x})");
        let algorithm = HashingAlgorithm::new(name, code, digest_size, compute);
        lock.push(algorithm.clone());
        Ok(algorithm)
    }

    /// Register an algorithm with a digest function
    pub fn register_fn<F>(
        &self,
        name: &str,
        code: u64,
        digest_size: usize,
        compute: F,
    ) -> Result<HashingAlgorithm>
    where
        F: Fn(&[u8]) -> Vec<u8> + Send + Sync + 'static,
    {
        self.register(name, code, digest_size, Some(Arc::new(compute)))
    }

    /// Remove an algorithm
    ///
    /// Returns true if it was registered.
    pub fn deregister(&self, algorithm: &HashingAlgorithm) -> bool {
        let mut lock = self.lock();
        let before = lock.len();
        lock.retain(|a| !(a.code() == algorithm.code() && a.name() == algorithm.name()));
        let removed = lock.len() != before;
        if removed {
            debug!("Deregistered hashing algorithm ({algorithm})");
        }
        removed
    }

    pub fn by_name(&self, name: &str) -> Option<HashingAlgorithm> {
        self.lock().iter().find(|a| a.name() == name).cloned()
    }

    pub fn by_code(&self, code: u64) -> Option<HashingAlgorithm> {
        self.lock().iter().find(|a| a.code() == code).cloned()
    }

    /// Snapshot of every registered algorithm
    pub fn all(&self) -> Vec<HashingAlgorithm> {
        self.lock().clone()
    }

    /// Report unregistered codes met by any decode through this registry
    ///
    /// Covers every path that reads a multihash (`decode`, `parse`,
    /// `FromStr`, serde and multihashes nested in other formats). Replaces
    /// any previous observer; clones of the registry share it.
    pub fn set_unknown_observer<F>(&self, observer: F)
    where
        F: Fn(&HashingAlgorithm) + Send + Sync + 'static,
    {
        *self.observer_lock() = Some(Arc::new(observer));
    }

    /// Stop reporting unregistered codes
    pub fn clear_unknown_observer(&self) {
        *self.observer_lock() = None;
    }

    /// Resolve a code read from a multihash whose digest is `digest_len` bytes
    ///
    /// Unregistered codes yield [`Resolved::Unknown`] with a transient
    /// algorithm named `ipfs-<code>`, which is passed to the unknown-algorithm
    /// observer if one is set. The registry itself is not changed.
    pub fn resolve(&self, code: u64, digest_len: usize) -> Resolved {
        if let Some(alg) = self.by_code(code) {
            return Resolved::Known(alg);
        }

        let alg = HashingAlgorithm::unknown(code, digest_len);
        // Cloned out so the observer may use this registry
        let observer = self.observer_lock().clone();
        if let Some(observer) = observer {
            observer(&alg);
        }
        Resolved::Unknown(alg)
    }

    /// Returns the number of registered algorithms
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    /// Returns true if no algorithms are registered
    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    fn lock(&self) -> MutexGuard<'_, Vec<HashingAlgorithm>> {
        // Every mutation leaves the table consistent, so a poisoned lock is still usable
        self.algorithms.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn observer_lock(&self) -> MutexGuard<'_, Option<UnknownObserver>> {
        self.on_unknown.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl fmt::Debug for AlgorithmRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AlgorithmRegistry")
            .field("algorithms", &*self.lock())
            .field("has_unknown_observer", &self.observer_lock().is_some())
            .finish()
    }
}
