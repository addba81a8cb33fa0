//! MultiAddress value type
//!
//! Binary form: `varint(code) || value` for each layer, outermost first.
//! Text form: `/name/value` for each layer, `/name` for layers without a value.

use std::{
    fmt,
    io::{Read, Write},
    str::FromStr,
};

use ipfs_encoding::varint;
use ipfs_multihash::MultiHash;
use serde::{Deserialize, Serialize};

use crate::{
    MultiAddressError, NetworkProtocol, ProtocolRegistry, ProtocolValue, Result, protocol::P2P,
};

/// An ordered stack of protocol layers
///
/// Equality compares layers in order, so `/ip4/1.2.3.4/tcp/80` and
/// `/tcp/80/ip4/1.2.3.4` differ.
///
/// ```
/// use ipfs_multiaddr::{MultiAddress, ProtocolRegistry};
/// use ipfs_multihash::AlgorithmRegistry;
///
/// let registry = ProtocolRegistry::with_defaults(AlgorithmRegistry::with_defaults());
/// let addr = MultiAddress::parse("/ip4/1.2.3.4/tcp/80", &registry).unwrap();
/// assert_eq!(addr.len(), 2);
/// assert_eq!(addr.to_bytes(), [0x04, 1, 2, 3, 4, 0x06, 0x00, 0x50]);
/// assert_eq!(addr.to_string(), "/ip4/1.2.3.4/tcp/80");
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct MultiAddress {
    protocols: Vec<NetworkProtocol>,
}

impl MultiAddress {
    /// An address with no layers
    pub fn new() -> Self {
        MultiAddress::default()
    }

    /// Parse the text form
    ///
    /// Layers keep the name they were written with, so `/ipfs/<hash>` prints
    /// back as `/ipfs/<hash>`. A trailing `/` is accepted.
    pub fn parse(text: &str, registry: &ProtocolRegistry) -> Result<Self> {
        if text.is_empty() {
            return Err(MultiAddressError::InvalidArgument(
                "multiaddr text is empty".into(),
            ));
        }
        let Some(rest) = text.strip_prefix('/') else {
            return Err(MultiAddressError::InvalidFormat(format!(
                "multiaddr '{text}' must start with '/'"
            )));
        };

        let mut segments = rest.split('/');
        let mut protocols = Vec::new();
        while let Some(name) = segments.next() {
            if name.is_empty() {
                if segments.any(|s| !s.is_empty()) {
                    return Err(MultiAddressError::InvalidFormat(format!(
                        "empty protocol name in '{text}'"
                    )));
                }
                break;
            }

            let protocol = registry
                .by_name(name)
                .ok_or_else(|| MultiAddressError::UnknownProtocolName(name.to_string()))?;
            let value = protocol
                .format()
                .read_text(name, &mut segments, registry.algorithms())?;
            protocols.push(NetworkProtocol::from_parts(protocol.code(), name, value));
        }

        Ok(MultiAddress { protocols })
    }

    /// Decode the binary form; every byte must belong to a layer
    pub fn decode(bytes: &[u8], registry: &ProtocolRegistry) -> Result<Self> {
        MultiAddress::read_from(&mut &bytes[..], registry)
    }

    /// Read layers from `reader` until it is exhausted
    ///
    /// Each code is resolved before its value is read, since the protocol
    /// decides how long the value is.
    pub fn read_from<R: Read + ?Sized>(
        reader: &mut R,
        registry: &ProtocolRegistry,
    ) -> Result<Self> {
        let mut protocols = Vec::new();
        while let Some(code) = varint::try_read_u64(reader)? {
            let protocol = registry
                .by_code(code)
                .ok_or(MultiAddressError::UnknownProtocolCode(code))?;
            let value = protocol
                .format()
                .read_binary(reader, registry.algorithms())?;
            protocols.push(NetworkProtocol::from_parts(code, protocol.name(), value));
        }
        Ok(MultiAddress { protocols })
    }

    /// Encode the binary form
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut out = Vec::new();
        for protocol in &self.protocols {
            protocol.write_binary(&mut out);
        }
        out
    }

    /// Write the binary form to `writer`
    pub fn write_to<W: Write + ?Sized>(&self, writer: &mut W) -> Result<()> {
        writer.write_all(&self.to_bytes())?;
        Ok(())
    }

    /// Append a layer
    pub fn push(&mut self, protocol: NetworkProtocol) {
        self.protocols.push(protocol);
    }

    /// Remove every layer
    pub fn clear(&mut self) {
        self.protocols.clear();
    }

    pub fn protocols(&self) -> &[NetworkProtocol] {
        &self.protocols
    }

    pub fn iter(&self) -> std::slice::Iter<'_, NetworkProtocol> {
        self.protocols.iter()
    }

    pub fn len(&self) -> usize {
        self.protocols.len()
    }

    pub fn is_empty(&self) -> bool {
        self.protocols.is_empty()
    }

    /// Identifier carried by the last `/p2p` (or `/ipfs`) layer
    pub fn peer_id(&self) -> Option<&MultiHash> {
        self.protocols.iter().rev().find_map(|p| match p.value() {
            ProtocolValue::MultiHash(id) if p.code() == P2P => Some(id),
            _ => None,
        })
    }
}

impl fmt::Display for MultiAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for protocol in &self.protocols {
            write!(f, "{protocol}")?;
        }
        Ok(())
    }
}

impl FromStr for MultiAddress {
    type Err = MultiAddressError;

    /// Parses against [`ProtocolRegistry::global`]
    fn from_str(s: &str) -> Result<Self> {
        MultiAddress::parse(s, ProtocolRegistry::global())
    }
}

impl FromIterator<NetworkProtocol> for MultiAddress {
    fn from_iter<I: IntoIterator<Item = NetworkProtocol>>(iter: I) -> Self {
        MultiAddress {
            protocols: iter.into_iter().collect(),
        }
    }
}

impl IntoIterator for MultiAddress {
    type Item = NetworkProtocol;
    type IntoIter = std::vec::IntoIter<NetworkProtocol>;

    fn into_iter(self) -> Self::IntoIter {
        self.protocols.into_iter()
    }
}

impl<'a> IntoIterator for &'a MultiAddress {
    type Item = &'a NetworkProtocol;
    type IntoIter = std::slice::Iter<'a, NetworkProtocol>;

    fn into_iter(self) -> Self::IntoIter {
        self.protocols.iter()
    }
}

impl Serialize for MultiAddress {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for MultiAddress {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let text = String::deserialize(deserializer)?;
        text.parse().map_err(serde::de::Error::custom)
    }
}
