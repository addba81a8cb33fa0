//! Multiaddr errors

use ipfs_encoding::EncodingError;
use ipfs_multihash::MultiHashError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum MultiAddressError {
    /// Rejected at the API boundary before any parsing
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// Malformed text or framing
    #[error("Invalid format: {0}")]
    InvalidFormat(String),

    /// Binary input that ends inside a value or holds a bad value
    #[error("Invalid data: {0}")]
    InvalidData(String),

    /// Well-formed, but names a protocol this registry does not know
    #[error("Unknown network protocol '{0}'")]
    UnknownProtocolName(String),

    /// Well-formed, but uses a protocol code this registry does not know
    #[error("Unknown network protocol code {0}")]
    UnknownProtocolCode(u64),

    #[error("Invalid multihash: {0}")]
    MultiHash(#[from] MultiHashError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<EncodingError> for MultiAddressError {
    fn from(err: EncodingError) -> Self {
        match err {
            EncodingError::Io(e) => MultiAddressError::Io(e),
            other => MultiAddressError::InvalidFormat(other.to_string()),
        }
    }
}

pub type Result<T> = std::result::Result<T, MultiAddressError>;
