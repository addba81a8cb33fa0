//! Self-describing digests for IPFS
//!
//! A multihash tags a digest with the code of the algorithm that produced it:
//! `varint(code) || varint(length) || digest`. Its text form is the base58btc
//! encoding of those bytes.
//!
//! Algorithms live in an [`AlgorithmRegistry`], so decoders built today can
//! still read digests from algorithms registered tomorrow. Codes that are not
//! registered decode to a synthesized `ipfs-<code>` algorithm instead of
//! failing.
//!
//! ```
//! use ipfs_multihash::{AlgorithmRegistry, MultiHash};
//!
//! let registry = AlgorithmRegistry::with_defaults();
//! let mh = MultiHash::compute(b"hello world", &registry).unwrap();
//! assert_eq!(mh.to_string(), "QmaozNR7DZHQK1ZcU9p7QdrshMvXqWK6gpu5rmrkPdT3L4");
//! assert!(mh.matches(b"hello world"));
//! ```
//!
//! See: <https://github.com/multiformats/multihash>

pub mod algorithm;
pub(crate) mod digests;
pub mod multihash;
pub mod registry;

pub use algorithm::{DigestFn, HashingAlgorithm};
pub use multihash::{DEFAULT_ALGORITHM, MultiHash};
pub use registry::{AlgorithmRegistry, Resolved, UnknownObserver};

mod error;
pub use error::{MultiHashError, Result};
