//! MultiHash value type
//!
//! Binary form: `varint(code) || varint(length) || digest`.
//! Text form: base58btc of the binary form.

use std::{
    fmt,
    hash::{Hash, Hasher},
    io::{Read, Write},
    str::FromStr,
};

use ipfs_encoding::{decode_base58, encode_base58, varint};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::{AlgorithmRegistry, HashingAlgorithm, MultiHashError, Resolved};

/// Algorithm used by [`MultiHash::compute`]
pub const DEFAULT_ALGORITHM: &str = "sha2-256";

/// A digest tagged with the algorithm that produced it
///
/// Two multihashes are equal when their algorithm codes and digest bytes are
/// equal.
///
/// ```
/// use ipfs_multihash::{AlgorithmRegistry, MultiHash};
///
/// let registry = AlgorithmRegistry::with_defaults();
/// let mh = MultiHash::parse("QmPZ9gcCEpqKTo6aq61g2nXGUhM4iCL3ewB6LDXZCtioEB", &registry).unwrap();
/// assert_eq!(mh.algorithm().name(), "sha2-256");
/// assert_eq!(mh.digest().len(), 32);
/// ```
#[derive(Clone, Debug)]
pub struct MultiHash {
    algorithm: HashingAlgorithm,
    digest: Vec<u8>,
}

impl MultiHash {
    /// Wrap an existing digest produced by the named algorithm
    ///
    /// Fails with [`MultiHashError::InvalidArgument`] if the name is empty or
    /// unknown, or if the digest is not the algorithm's fixed size.
    pub fn new(
        name: &str,
        digest: impl Into<Vec<u8>>,
        registry: &AlgorithmRegistry,
    ) -> Result<Self, MultiHashError> {
        let algorithm = lookup(name, registry)?;
        MultiHash::from_algorithm(algorithm, digest)
    }

    /// Wrap an existing digest produced by `algorithm`
    pub fn from_algorithm(
        algorithm: HashingAlgorithm,
        digest: impl Into<Vec<u8>>,
    ) -> Result<Self, MultiHashError> {
        let digest = digest.into();
        if !algorithm.accepts_len(digest.len()) {
            return Err(MultiHashError::InvalidArgument(format!(
                "{algorithm} digest must be {} bytes, got {}",
                algorithm.digest_size(),
                digest.len()
            )));
        }
        Ok(MultiHash { algorithm, digest })
    }

    pub fn algorithm(&self) -> &HashingAlgorithm {
        &self.algorithm
    }

    /// Algorithm code
    pub fn code(&self) -> u64 {
        self.algorithm.code()
    }

    pub fn digest(&self) -> &[u8] {
        &self.digest
    }

    /// Decode the binary form
    ///
    /// The whole slice must be consumed.
    pub fn decode(bytes: &[u8], registry: &AlgorithmRegistry) -> Result<Self, MultiHashError> {
        let mut reader = bytes;
        let mh = MultiHash::read_from(&mut reader, registry)?;
        if !reader.is_empty() {
            return Err(MultiHashError::InvalidData(format!(
                "{} unexpected bytes after the digest",
                reader.len()
            )));
        }
        Ok(mh)
    }

    /// Read the binary form from `reader`
    ///
    /// Reads exactly one multihash and leaves anything after it unread.
    pub fn read_from<R: Read + ?Sized>(
        reader: &mut R,
        registry: &AlgorithmRegistry,
    ) -> Result<Self, MultiHashError> {
        MultiHash::read_from_observed(reader, registry, |_| {})
    }

    /// Read the binary form from `reader`, reporting unregistered algorithms
    ///
    /// Unregistered codes still decode, to a transient `ipfs-<code>`
    /// algorithm. `on_unknown` is called once with that algorithm so the
    /// caller can log, register or reject it, after the registry's own
    /// observer (see [`AlgorithmRegistry::set_unknown_observer`]).
    pub fn read_from_observed<R, F>(
        reader: &mut R,
        registry: &AlgorithmRegistry,
        mut on_unknown: F,
    ) -> Result<Self, MultiHashError>
    where
        R: Read + ?Sized,
        F: FnMut(&HashingAlgorithm),
    {
        let code = varint::read_u64(reader)?;
        let declared = varint::read_u64(reader)?;
        let declared = usize::try_from(declared).map_err(|_| {
            MultiHashError::InvalidData(format!("digest length {declared} is too large"))
        })?;

        let algorithm = match registry.resolve(code, declared) {
            Resolved::Known(alg) => alg,
            Resolved::Unknown(alg) => {
                warn!("Unknown hashing algorithm code 0x{code:x}, decoding as {alg}");
                on_unknown(&alg);
                alg
            }
        };

        if !algorithm.accepts_len(declared) {
            return Err(MultiHashError::InvalidData(format!(
                "{algorithm} digest must be {} bytes, but {declared} are encoded",
                algorithm.digest_size()
            )));
        }

        let mut digest = Vec::with_capacity(declared.min(1024));
        Read::take(&mut *reader, declared as u64).read_to_end(&mut digest)?;
        if digest.len() != declared {
            return Err(MultiHashError::InvalidData(format!(
                "stream ended after {} of {declared} digest bytes",
                digest.len()
            )));
        }

        Ok(MultiHash { algorithm, digest })
    }

    /// Encode the binary form
    pub fn to_bytes(&self) -> Vec<u8> {
        let code = self.code();
        let len = self.digest.len() as u64;
        let capacity = varint::encoded_len(code) + varint::encoded_len(len) + self.digest.len();
        let mut bytes = Vec::with_capacity(capacity);
        bytes.extend(varint::encode_u64(code));
        bytes.extend(varint::encode_u64(len));
        bytes.extend(&self.digest);
        bytes
    }

    /// Write the binary form to `writer`
    pub fn write_to<W: Write + ?Sized>(&self, writer: &mut W) -> Result<(), MultiHashError> {
        writer.write_all(&self.to_bytes())?;
        Ok(())
    }

    /// Parse the base58 text form
    pub fn parse(text: &str, registry: &AlgorithmRegistry) -> Result<Self, MultiHashError> {
        if text.is_empty() {
            return Err(MultiHashError::InvalidArgument(
                "multihash text is empty".into(),
            ));
        }
        let bytes =
            decode_base58(text).map_err(|e| MultiHashError::InvalidFormat(e.to_string()))?;
        MultiHash::decode(&bytes, registry)
    }

    /// The base58 text form
    pub fn to_base58(&self) -> String {
        encode_base58(&self.to_bytes())
    }

    /// Digest `data` with [`DEFAULT_ALGORITHM`]
    pub fn compute(data: &[u8], registry: &AlgorithmRegistry) -> Result<Self, MultiHashError> {
        MultiHash::compute_with(data, DEFAULT_ALGORITHM, registry)
    }

    /// Digest `data` with the named algorithm
    ///
    /// Fails with [`MultiHashError::NotImplemented`] if the algorithm is
    /// registered without a digest function.
    pub fn compute_with(
        data: &[u8],
        name: &str,
        registry: &AlgorithmRegistry,
    ) -> Result<Self, MultiHashError> {
        let algorithm = lookup(name, registry)?;
        let Some(digest) = algorithm.compute(data) else {
            return Err(MultiHashError::NotImplemented(format!(
                "hashing algorithm '{name}' cannot compute digests"
            )));
        };
        MultiHash::from_algorithm(algorithm, digest)
    }

    /// Digest everything left in `reader` with the named algorithm
    pub fn compute_reader<R: Read + ?Sized>(
        reader: &mut R,
        name: &str,
        registry: &AlgorithmRegistry,
    ) -> Result<Self, MultiHashError> {
        let mut data = Vec::new();
        reader.read_to_end(&mut data)?;
        MultiHash::compute_with(&data, name, registry)
    }

    /// Returns true if `data` hashes to this digest under the same algorithm
    ///
    /// Algorithms without a digest function never match.
    pub fn matches(&self, data: &[u8]) -> bool {
        match self.algorithm.compute(data) {
            Some(digest) => digest == self.digest,
            None => {
                debug!("Cannot match against {}, it has no digest function", self.algorithm);
                false
            }
        }
    }

    /// Returns true if everything left in `reader` hashes to this digest
    pub fn matches_reader<R: Read + ?Sized>(&self, reader: &mut R) -> Result<bool, MultiHashError> {
        let mut data = Vec::new();
        reader.read_to_end(&mut data)?;
        Ok(self.matches(&data))
    }
}

fn lookup(name: &str, registry: &AlgorithmRegistry) -> Result<HashingAlgorithm, MultiHashError> {
    if name.is_empty() {
        return Err(MultiHashError::InvalidArgument(
            "algorithm name is empty".into(),
        ));
    }
    registry.by_name(name).ok_or_else(|| {
        MultiHashError::InvalidArgument(format!("unknown hashing algorithm '{name}'"))
    })
}

impl PartialEq for MultiHash {
    fn eq(&self, other: &Self) -> bool {
        self.code() == other.code() && self.digest == other.digest
    }
}

impl Eq for MultiHash {}

impl Hash for MultiHash {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.code().hash(state);
        self.digest.hash(state);
    }
}

impl fmt::Display for MultiHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_base58())
    }
}

impl FromStr for MultiHash {
    type Err = MultiHashError;

    /// Parses against [`AlgorithmRegistry::global`]
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        MultiHash::parse(s, AlgorithmRegistry::global())
    }
}

impl Serialize for MultiHash {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_base58())
    }
}

impl<'de> Deserialize<'de> for MultiHash {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let text = String::deserialize(deserializer)?;
        text.parse().map_err(serde::de::Error::custom)
    }
}
