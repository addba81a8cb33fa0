//! Hashing algorithm descriptors

use std::{fmt, sync::Arc};

/// Computes a digest over a byte slice
pub type DigestFn = Arc<dyn Fn(&[u8]) -> Vec<u8> + Send + Sync>;

/// A hashing algorithm known to a registry, or synthesized while decoding
///
/// `digest_size` of 0 means the size is variable and the length encoded in a
/// multihash is trusted as-is.
#[derive(Clone)]
pub struct HashingAlgorithm {
    name: String,
    code: u64,
    digest_size: usize,
    compute: Option<DigestFn>,
}

impl HashingAlgorithm {
    pub fn new(
        name: impl Into<String>,
        code: u64,
        digest_size: usize,
        compute: Option<DigestFn>,
    ) -> Self {
        HashingAlgorithm {
            name: name.into(),
            code,
            digest_size,
            compute,
        }
    }

    /// Placeholder for a code with no registry entry
    pub(crate) fn unknown(code: u64, digest_size: usize) -> Self {
        HashingAlgorithm::new(format!("ipfs-{code}"), code, digest_size, None)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn code(&self) -> u64 {
        self.code
    }

    pub fn digest_size(&self) -> usize {
        self.digest_size
    }

    /// Returns true if this algorithm has a digest function
    pub fn can_compute(&self) -> bool {
        self.compute.is_some()
    }

    /// Digest `data`, or `None` if this algorithm has no digest function
    pub fn compute(&self, data: &[u8]) -> Option<Vec<u8>> {
        self.compute.as_ref().map(|f| f(data))
    }

    /// Returns true if a digest of `len` bytes is valid for this algorithm
    pub fn accepts_len(&self, len: usize) -> bool {
        self.digest_size == 0 || self.digest_size == len
    }
}

impl PartialEq for HashingAlgorithm {
    fn eq(&self, other: &Self) -> bool {
        self.code == other.code
            && self.name == other.name
            && self.digest_size == other.digest_size
    }
}

impl Eq for HashingAlgorithm {}

impl fmt::Debug for HashingAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HashingAlgorithm")
            .field("name", &self.name)
            .field("code", &format_args!("0x{:x}", self.code))
            .field("digest_size", &self.digest_size)
            .field("can_compute", &self.can_compute())
            .finish()
    }
}

impl fmt::Display for HashingAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unknown_is_named_by_code() {
        let alg = HashingAlgorithm::unknown(1, 2);
        assert_eq!(alg.name(), "ipfs-1");
        assert_eq!(alg.to_string(), "ipfs-1");
        assert_eq!(alg.code(), 1);
        assert_eq!(alg.digest_size(), 2);
        assert!(!alg.can_compute());
        assert!(alg.compute(b"data").is_none());
    }

    #[test]
    fn test_accepts_len() {
        let fixed = HashingAlgorithm::new("fixed", 0x300, 4, None);
        assert!(fixed.accepts_len(4));
        assert!(!fixed.accepts_len(0));
        assert!(!fixed.accepts_len(5));

        let variable = HashingAlgorithm::new("variable", 0x301, 0, None);
        assert!(variable.accepts_len(0));
        assert!(variable.accepts_len(1024));
    }

    #[test]
    fn test_compute() {
        let reverse: DigestFn =
            Arc::new(|data: &[u8]| data.iter().rev().copied().collect::<Vec<u8>>());
        let alg = HashingAlgorithm::new("reverse", 0x302, 0, Some(reverse));
        assert_eq!(alg.compute(&[1, 2, 3]), Some(vec![3, 2, 1]));
    }
}
