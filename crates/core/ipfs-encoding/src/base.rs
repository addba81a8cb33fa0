//! Base58 and base32 text encodings
//!
//! Multihashes are written as plain base58btc (Bitcoin alphabet, no multibase
//! prefix). Onion addresses inside multiaddrs use lower case, unpadded
//! RFC 4648 base32.

use std::sync::LazyLock;

use data_encoding::{BASE32, Encoding};

use crate::EncodingError;

/// Lower case, unpadded RFC 4648 base32
static BASE32_LOWER: LazyLock<Encoding> = LazyLock::new(|| {
    let mut spec = BASE32.specification();
    spec.symbols = spec.symbols.to_ascii_lowercase();
    spec.padding = None;
    spec.encoding().expect("lower case base32 specification is valid")
});

/// RFC 4648 base32 reading either case, padded
static BASE32_ANY_CASE: LazyLock<Encoding> = LazyLock::new(|| any_case(Some('=')));

/// RFC 4648 base32 reading either case, unpadded
static BASE32_ANY_CASE_NOPAD: LazyLock<Encoding> = LazyLock::new(|| any_case(None));

fn any_case(padding: Option<char>) -> Encoding {
    let mut spec = BASE32.specification();
    spec.padding = padding;
    spec.translate.from.push_str("abcdefghijklmnopqrstuvwxyz");
    spec.translate.to.push_str("ABCDEFGHIJKLMNOPQRSTUVWXYZ");
    spec.encoding().expect("case-insensitive base32 specification is valid")
}

/// Encode bytes as base58btc
pub fn encode_base58(bytes: &[u8]) -> String {
    bs58::encode(bytes).into_string()
}

/// Decode a base58btc string
pub fn decode_base58(s: &str) -> Result<Vec<u8>, EncodingError> {
    bs58::decode(s)
        .into_vec()
        .map_err(|e| EncodingError::InvalidBase58(e.to_string()))
}

/// Encode bytes as upper case, padded RFC 4648 base32
pub fn encode_base32(bytes: &[u8]) -> String {
    BASE32.encode(bytes)
}

/// Encode bytes as lower case, unpadded RFC 4648 base32
pub fn encode_base32_lower(bytes: &[u8]) -> String {
    BASE32_LOWER.encode(bytes)
}

/// Decode RFC 4648 base32 in either case, with or without padding
pub fn decode_base32(s: &str) -> Result<Vec<u8>, EncodingError> {
    let encoding = if s.contains('=') {
        &*BASE32_ANY_CASE
    } else {
        &*BASE32_ANY_CASE_NOPAD
    };
    encoding
        .decode(s.as_bytes())
        .map_err(|e| EncodingError::InvalidBase32(e.to_string()))
}
