//! Multihash errors

use ipfs_encoding::EncodingError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum MultiHashError {
    /// Rejected at the API boundary before any parsing
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// Malformed text or framing
    #[error("Invalid format: {0}")]
    InvalidFormat(String),

    /// Well-framed input whose contents break a multihash invariant
    #[error("Invalid data: {0}")]
    InvalidData(String),

    /// The algorithm is known but has no digest function
    #[error("Not implemented: {0}")]
    NotImplemented(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<EncodingError> for MultiHashError {
    fn from(err: EncodingError) -> Self {
        match err {
            EncodingError::Io(e) => MultiHashError::Io(e),
            other => MultiHashError::InvalidFormat(other.to_string()),
        }
    }
}

pub type Result<T> = std::result::Result<T, MultiHashError>;
