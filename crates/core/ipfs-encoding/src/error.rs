//! Encoding errors

use thiserror::Error;

#[derive(Error, Debug)]
pub enum EncodingError {
    #[error("Invalid base58 encoding: {0}")]
    InvalidBase58(String),

    #[error("Invalid base32 encoding: {0}")]
    InvalidBase32(String),

    #[error("Varint ended before its final byte")]
    VarintTruncated,

    #[error("Varint does not fit in 64 bits")]
    VarintOverflow,

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
