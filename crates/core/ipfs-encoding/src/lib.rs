//! Varint framing and base encodings for IPFS multiformats
//!
//! This crate provides the leaf primitives shared by the multihash and
//! multiaddr codecs:
//! - Unsigned varint reading (lenient) and writing (canonical)
//! - Base58btc and RFC 4648 base32 text encodings

pub mod base;
pub mod varint;

pub use base::{decode_base32, decode_base58, encode_base32, encode_base32_lower, encode_base58};

mod error;
pub use error::EncodingError;
