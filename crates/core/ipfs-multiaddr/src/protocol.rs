//! Network protocol layers
//!
//! A [`ValueFormat`] says how a protocol's value is framed in binary and
//! text; a [`ProtocolValue`] is one such value. Protocol names and codes are
//! registry data, so a new protocol only needs new code when it brings a new
//! value format.

use std::{
    fmt,
    hash::{Hash, Hasher},
    io::Read,
    net::{Ipv4Addr, Ipv6Addr},
    str::FromStr,
};

use ipfs_encoding::{decode_base32, encode_base32_lower, varint};
use ipfs_multihash::{AlgorithmRegistry, MultiHash};

use crate::{MultiAddressError, ProtocolDef, Result};

// ****************************************************************************
// Protocol Codes
// See: https://github.com/multiformats/multiaddr/blob/master/protocols.csv
// ****************************************************************************
pub const IP4: u64 = 4;
pub const TCP: u64 = 6;
pub const DCCP: u64 = 33;
pub const IP6: u64 = 41;
pub const DNS: u64 = 53;
pub const DNS4: u64 = 54;
pub const DNS6: u64 = 55;
pub const DNSADDR: u64 = 56;
pub const SCTP: u64 = 132;
pub const UDP: u64 = 273;
pub const P2P_CIRCUIT: u64 = 290;
pub const UDT: u64 = 301;
pub const UTP: u64 = 302;
pub const P2P: u64 = 421;
pub const HTTPS: u64 = 443;
pub const ONION: u64 = 444;
pub const QUIC: u64 = 460;
pub const WS: u64 = 477;
pub const WSS: u64 = 478;
pub const HTTP: u64 = 480;

/// How a protocol's value is written
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ValueFormat {
    /// Marker layer, no value at all
    None,
    /// 4 raw octets / dotted decimal
    Ip4,
    /// 16 raw octets / RFC 5952 text
    Ip6,
    /// 2 bytes big-endian / decimal
    Port,
    /// varint length + UTF-8 / the text itself
    Text,
    /// varint length + binary multihash / base58
    MultiHash,
    /// 10-byte service hash + 2-byte port / `base32:port`
    Onion,
}

impl ValueFormat {
    /// Read a value of this format from binary input
    ///
    /// Input that ends inside the value is [`MultiAddressError::InvalidData`].
    pub fn read_binary<R: Read + ?Sized>(
        self,
        reader: &mut R,
        algorithms: &AlgorithmRegistry,
    ) -> Result<ProtocolValue> {
        let value = match self {
            ValueFormat::None => ProtocolValue::None,
            ValueFormat::Ip4 => ProtocolValue::Ip4(Ipv4Addr::from(read_array::<_, 4>(reader)?)),
            ValueFormat::Ip6 => ProtocolValue::Ip6(Ipv6Addr::from(read_array::<_, 16>(reader)?)),
            ValueFormat::Port => ProtocolValue::Port(u16::from_be_bytes(read_array(reader)?)),
            ValueFormat::Text => {
                let text = String::from_utf8(read_prefixed(reader)?).map_err(|e| {
                    MultiAddressError::InvalidData(format!("text value is not UTF-8: {e}"))
                })?;
                ProtocolValue::Text(text)
            }
            ValueFormat::MultiHash => {
                let bytes = read_prefixed(reader)?;
                ProtocolValue::MultiHash(MultiHash::decode(&bytes, algorithms)?)
            }
            ValueFormat::Onion => {
                let bytes: [u8; 12] = read_array(reader)?;
                let mut hash = [0u8; 10];
                hash.copy_from_slice(&bytes[..10]);
                let port = u16::from_be_bytes([bytes[10], bytes[11]]);
                let address = OnionAddress::new(hash, port)
                    .map_err(|e| MultiAddressError::InvalidData(e.to_string()))?;
                ProtocolValue::Onion(address)
            }
        };
        value.validate().map_err(MultiAddressError::InvalidData)?;
        Ok(value)
    }

    /// Read a value of this format from the `/`-separated segments that follow
    /// the protocol name
    ///
    /// Consumes one segment, or none for [`ValueFormat::None`].
    pub fn read_text<'a, I>(
        self,
        protocol: &str,
        segments: &mut I,
        algorithms: &AlgorithmRegistry,
    ) -> Result<ProtocolValue>
    where
        I: Iterator<Item = &'a str>,
    {
        if self == ValueFormat::None {
            return Ok(ProtocolValue::None);
        }
        let Some(text) = segments.next().filter(|s| !s.is_empty()) else {
            return Err(MultiAddressError::InvalidFormat(format!(
                "missing value for /{protocol}"
            )));
        };

        let value = match self {
            ValueFormat::None => Some(ProtocolValue::None),
            ValueFormat::Ip4 => parse_canonical(text).map(ProtocolValue::Ip4),
            ValueFormat::Ip6 => parse_canonical(text).map(ProtocolValue::Ip6),
            ValueFormat::Port => parse_port(text).map(ProtocolValue::Port),
            ValueFormat::Text => Some(ProtocolValue::Text(text.to_string())),
            ValueFormat::MultiHash => Some(ProtocolValue::MultiHash(MultiHash::parse(
                text, algorithms,
            )?)),
            ValueFormat::Onion => OnionAddress::parse(text).map(ProtocolValue::Onion),
        };
        value.ok_or_else(|| {
            MultiAddressError::InvalidFormat(format!("invalid value '{text}' for /{protocol}"))
        })
    }
}

/// The value carried by one protocol layer
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ProtocolValue {
    None,
    Ip4(Ipv4Addr),
    Ip6(Ipv6Addr),
    Port(u16),
    Text(String),
    MultiHash(MultiHash),
    Onion(OnionAddress),
}

impl ProtocolValue {
    pub fn format(&self) -> ValueFormat {
        match self {
            ProtocolValue::None => ValueFormat::None,
            ProtocolValue::Ip4(_) => ValueFormat::Ip4,
            ProtocolValue::Ip6(_) => ValueFormat::Ip6,
            ProtocolValue::Port(_) => ValueFormat::Port,
            ProtocolValue::Text(_) => ValueFormat::Text,
            ProtocolValue::MultiHash(_) => ValueFormat::MultiHash,
            ProtocolValue::Onion(_) => ValueFormat::Onion,
        }
    }

    /// Append the binary form of this value to `out`
    pub fn write_binary(&self, out: &mut Vec<u8>) {
        match self {
            ProtocolValue::None => {}
            ProtocolValue::Ip4(address) => out.extend(address.octets()),
            ProtocolValue::Ip6(address) => out.extend(address.octets()),
            ProtocolValue::Port(port) => out.extend(port.to_be_bytes()),
            ProtocolValue::Text(text) => {
                out.extend(varint::encode_u64(text.len() as u64));
                out.extend(text.as_bytes());
            }
            ProtocolValue::MultiHash(mh) => {
                let bytes = mh.to_bytes();
                out.extend(varint::encode_u64(bytes.len() as u64));
                out.extend(bytes);
            }
            ProtocolValue::Onion(address) => {
                out.extend(address.hash());
                out.extend(address.port().to_be_bytes());
            }
        }
    }

    /// Append the text form of this value to `out`; nothing for
    /// [`ProtocolValue::None`]
    pub fn write_text<W: fmt::Write + ?Sized>(&self, out: &mut W) -> fmt::Result {
        write!(out, "{self}")
    }

    /// Text values end up as a single `/` segment
    fn validate(&self) -> std::result::Result<(), String> {
        match self {
            ProtocolValue::Text(text) if text.is_empty() || text.contains('/') => Err(format!(
                "text value '{text}' must be non-empty and must not contain '/'"
            )),
            _ => Ok(()),
        }
    }
}

impl fmt::Display for ProtocolValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProtocolValue::None => Ok(()),
            ProtocolValue::Ip4(address) => write!(f, "{address}"),
            ProtocolValue::Ip6(address) => write!(f, "{address}"),
            ProtocolValue::Port(port) => write!(f, "{port}"),
            ProtocolValue::Text(text) => write!(f, "{text}"),
            ProtocolValue::MultiHash(mh) => write!(f, "{mh}"),
            ProtocolValue::Onion(address) => write!(f, "{address}"),
        }
    }
}

/// A Tor onion service (v2) address and port
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct OnionAddress {
    hash: [u8; 10],
    port: u16,
}

impl OnionAddress {
    /// Fails with [`MultiAddressError::InvalidArgument`] for port 0
    pub fn new(hash: [u8; 10], port: u16) -> Result<Self> {
        if port == 0 {
            return Err(MultiAddressError::InvalidArgument(
                "onion port must be between 1 and 65535".into(),
            ));
        }
        Ok(OnionAddress { hash, port })
    }

    pub fn hash(&self) -> &[u8; 10] {
        &self.hash
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    /// Parse `<16 lower case base32 chars>:<port>`
    fn parse(text: &str) -> Option<Self> {
        let (address, port) = text.split_once(':')?;
        if address.len() != 16 || address.bytes().any(|b| b.is_ascii_uppercase()) {
            return None;
        }
        let hash: [u8; 10] = decode_base32(address).ok()?.try_into().ok()?;
        OnionAddress::new(hash, parse_port(port)?).ok()
    }
}

impl fmt::Display for OnionAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", encode_base32_lower(&self.hash), self.port)
    }
}

/// One layer of a multiaddr
///
/// Layers compare by code and value, so `/ipfs/<hash>` equals `/p2p/<hash>`.
#[derive(Debug, Clone)]
pub struct NetworkProtocol {
    code: u64,
    name: String,
    value: ProtocolValue,
}

impl NetworkProtocol {
    /// A layer of a registered protocol
    ///
    /// Fails with [`MultiAddressError::InvalidArgument`] if `value` is not in
    /// the protocol's format or cannot be written as text.
    pub fn new(protocol: &ProtocolDef, value: ProtocolValue) -> Result<Self> {
        if value.format() != protocol.format() {
            return Err(MultiAddressError::InvalidArgument(format!(
                "/{} takes a {:?} value, not {:?}",
                protocol.name(),
                protocol.format(),
                value.format()
            )));
        }
        value.validate().map_err(MultiAddressError::InvalidArgument)?;
        Ok(NetworkProtocol::from_parts(
            protocol.code(),
            protocol.name(),
            value,
        ))
    }

    pub(crate) fn from_parts(code: u64, name: &str, value: ProtocolValue) -> Self {
        NetworkProtocol {
            code,
            name: name.to_string(),
            value,
        }
    }

    pub fn ip4(address: Ipv4Addr) -> Self {
        NetworkProtocol::from_parts(IP4, "ip4", ProtocolValue::Ip4(address))
    }

    pub fn ip6(address: Ipv6Addr) -> Self {
        NetworkProtocol::from_parts(IP6, "ip6", ProtocolValue::Ip6(address))
    }

    pub fn tcp(port: u16) -> Self {
        NetworkProtocol::from_parts(TCP, "tcp", ProtocolValue::Port(port))
    }

    pub fn udp(port: u16) -> Self {
        NetworkProtocol::from_parts(UDP, "udp", ProtocolValue::Port(port))
    }

    /// Fails with [`MultiAddressError::InvalidArgument`] if `name` is empty
    /// or contains `/`
    pub fn dns(name: &str) -> Result<Self> {
        let value = ProtocolValue::Text(name.to_string());
        value.validate().map_err(MultiAddressError::InvalidArgument)?;
        Ok(NetworkProtocol::from_parts(DNS, "dns", value))
    }

    /// Peer (or content) identifier
    pub fn p2p(id: MultiHash) -> Self {
        NetworkProtocol::from_parts(P2P, "p2p", ProtocolValue::MultiHash(id))
    }

    pub fn onion(address: OnionAddress) -> Self {
        NetworkProtocol::from_parts(ONION, "onion", ProtocolValue::Onion(address))
    }

    pub fn http() -> Self {
        NetworkProtocol::from_parts(HTTP, "http", ProtocolValue::None)
    }

    pub fn https() -> Self {
        NetworkProtocol::from_parts(HTTPS, "https", ProtocolValue::None)
    }

    pub fn ws() -> Self {
        NetworkProtocol::from_parts(WS, "ws", ProtocolValue::None)
    }

    pub fn quic() -> Self {
        NetworkProtocol::from_parts(QUIC, "quic", ProtocolValue::None)
    }

    pub fn code(&self) -> u64 {
        self.code
    }

    /// Name this layer was read or created with
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn value(&self) -> &ProtocolValue {
        &self.value
    }

    /// Append `varint(code) || value` to `out`
    pub fn write_binary(&self, out: &mut Vec<u8>) {
        out.extend(varint::encode_u64(self.code));
        self.value.write_binary(out);
    }
}

impl PartialEq for NetworkProtocol {
    fn eq(&self, other: &Self) -> bool {
        self.code == other.code && self.value == other.value
    }
}

impl Eq for NetworkProtocol {}

impl Hash for NetworkProtocol {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.code.hash(state);
        self.value.hash(state);
    }
}

impl fmt::Display for NetworkProtocol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "/{}", self.name)?;
        if self.value != ProtocolValue::None {
            f.write_str("/")?;
            self.value.write_text(f)?;
        }
        Ok(())
    }
}

fn read_array<R: Read + ?Sized, const N: usize>(reader: &mut R) -> Result<[u8; N]> {
    let mut bytes = [0u8; N];
    reader.read_exact(&mut bytes).map_err(|e| match e.kind() {
        std::io::ErrorKind::UnexpectedEof => {
            MultiAddressError::InvalidData(format!("stream ended inside a {N} byte value"))
        }
        _ => MultiAddressError::Io(e),
    })?;
    Ok(bytes)
}

fn read_prefixed<R: Read + ?Sized>(reader: &mut R) -> Result<Vec<u8>> {
    let len = varint::read_u64(reader)?;
    let mut bytes = Vec::with_capacity(len.min(1024) as usize);
    Read::take(&mut *reader, len).read_to_end(&mut bytes)?;
    if bytes.len() as u64 != len {
        return Err(MultiAddressError::InvalidData(format!(
            "stream ended after {} of {len} value bytes",
            bytes.len()
        )));
    }
    Ok(bytes)
}

/// Decimal digits without leading zeros, as written back by `Display`
fn parse_port(text: &str) -> Option<u16> {
    if text.is_empty()
        || !text.bytes().all(|b| b.is_ascii_digit())
        || (text.len() > 1 && text.starts_with('0'))
    {
        return None;
    }
    text.parse().ok()
}

/// Accepts `text` only if it is already in the form `Display` writes back
fn parse_canonical<T: FromStr + ToString>(text: &str) -> Option<T> {
    text.parse().ok().filter(|value: &T| value.to_string() == text)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn algorithms() -> AlgorithmRegistry {
        AlgorithmRegistry::with_defaults()
    }

    fn text_value(format: ValueFormat, text: &str) -> Result<ProtocolValue> {
        format.read_text("test", &mut text.split('/'), &algorithms())
    }

    #[test]
    fn test_ip4() {
        let value = text_value(ValueFormat::Ip4, "10.1.10.10").unwrap();
        assert_eq!(value, ProtocolValue::Ip4(Ipv4Addr::new(10, 1, 10, 10)));
        assert_eq!(value.to_string(), "10.1.10.10");

        let mut bytes = Vec::new();
        value.write_binary(&mut bytes);
        assert_eq!(bytes, [10, 1, 10, 10]);
        let back = ValueFormat::Ip4
            .read_binary(&mut &bytes[..], &algorithms())
            .unwrap();
        assert_eq!(back, value);

        assert!(matches!(
            text_value(ValueFormat::Ip4, "10.1.10").unwrap_err(),
            MultiAddressError::InvalidFormat(_)
        ));
    }

    #[test]
    fn test_ip6() {
        let value = text_value(ValueFormat::Ip6, "fe80::1").unwrap();
        assert_eq!(value.to_string(), "fe80::1");
        let mut bytes = Vec::new();
        value.write_binary(&mut bytes);
        assert_eq!(bytes.len(), 16);
        assert_eq!(bytes[0], 0xfe);
        assert_eq!(bytes[15], 0x01);

        // Same address, but not as it would be written back
        for other in ["::1.2.3.4", "FE80::1", "fe80:0:0:0:0:0:0:1", "fe80::0001"] {
            assert!(
                matches!(
                    text_value(ValueFormat::Ip6, other).unwrap_err(),
                    MultiAddressError::InvalidFormat(_)
                ),
                "{other}"
            );
        }
        assert!(text_value(ValueFormat::Ip6, "::102:304").is_ok());
    }

    #[test]
    fn test_port() {
        let value = text_value(ValueFormat::Port, "29087").unwrap();
        assert_eq!(value, ProtocolValue::Port(29087));
        let mut bytes = Vec::new();
        value.write_binary(&mut bytes);
        assert_eq!(bytes, [0x71, 0x9f]);

        assert_eq!(text_value(ValueFormat::Port, "0").unwrap(), ProtocolValue::Port(0));
        for bad in ["65536", "-1", "+80", "http", "080", "00"] {
            assert!(
                matches!(
                    text_value(ValueFormat::Port, bad).unwrap_err(),
                    MultiAddressError::InvalidFormat(_)
                ),
                "{bad}"
            );
        }
    }

    #[test]
    fn test_text() {
        let value = text_value(ValueFormat::Text, "example.com").unwrap();
        let mut bytes = Vec::new();
        value.write_binary(&mut bytes);
        assert_eq!(bytes[0], 11);
        assert_eq!(&bytes[1..], b"example.com");
        let back = ValueFormat::Text
            .read_binary(&mut &bytes[..], &algorithms())
            .unwrap();
        assert_eq!(back, value);
    }

    #[test]
    fn test_text_rejects_invalid_utf8() {
        let bytes = [0x02, 0xff, 0xfe];
        assert!(matches!(
            ValueFormat::Text
                .read_binary(&mut &bytes[..], &algorithms())
                .unwrap_err(),
            MultiAddressError::InvalidData(_)
        ));
    }

    #[test]
    fn test_multihash() {
        let text = "QmVcSqVEsvm5RR9mBLjwpb2XjFVn5bPdPL69mL8PH45pPC";
        let value = text_value(ValueFormat::MultiHash, text).unwrap();
        assert_eq!(value.to_string(), text);

        let mut bytes = Vec::new();
        value.write_binary(&mut bytes);
        assert_eq!(&bytes[..3], &[0x22, 0x12, 0x20]);
        let back = ValueFormat::MultiHash
            .read_binary(&mut &bytes[..], &algorithms())
            .unwrap();
        assert_eq!(back, value);

        assert!(matches!(
            text_value(ValueFormat::MultiHash, "0OIl").unwrap_err(),
            MultiAddressError::MultiHash(_)
        ));
    }

    #[test]
    fn test_onion() {
        let value = text_value(ValueFormat::Onion, "timaq4ygg2iegci7:1234").unwrap();
        assert_eq!(value.to_string(), "timaq4ygg2iegci7:1234");

        let mut bytes = Vec::new();
        value.write_binary(&mut bytes);
        assert_eq!(hex::encode(&bytes), "9a18087306369043091f04d2");

        for bad in [
            "timaq4ygg2iegci7",
            "timaq4ygg2iegci:80",
            "timaq4ygg2iegci7:0",
            "timaq4ygg2iegci7:080",
            "TIMAQ4YGG2IEGCI7:80",
            "timaQ4ygg2iegci7:80",
        ] {
            assert!(text_value(ValueFormat::Onion, bad).is_err(), "{bad}");
        }
        assert!(OnionAddress::new([0; 10], 0).is_err());
    }

    #[test]
    fn test_missing_value() {
        assert!(matches!(
            text_value(ValueFormat::Port, "").unwrap_err(),
            MultiAddressError::InvalidFormat(_)
        ));
        let mut empty = std::iter::empty();
        assert_eq!(
            ValueFormat::None
                .read_text("http", &mut empty, &algorithms())
                .unwrap(),
            ProtocolValue::None
        );
    }

    #[test]
    fn test_truncated_binary_value() {
        for (format, bytes) in [
            (ValueFormat::Ip4, &[10u8, 1][..]),
            (ValueFormat::Port, &[0x71][..]),
            (ValueFormat::Text, &[0x05, b'a'][..]),
            (ValueFormat::Onion, &[0x9a; 11][..]),
        ] {
            let mut reader = bytes;
            assert!(
                matches!(
                    format.read_binary(&mut reader, &algorithms()).unwrap_err(),
                    MultiAddressError::InvalidData(_)
                ),
                "{format:?}"
            );
        }
    }

    #[test]
    fn test_layer_display_and_equality() {
        let tcp = NetworkProtocol::tcp(80);
        assert_eq!(tcp.to_string(), "/tcp/80");
        assert_eq!(NetworkProtocol::https().to_string(), "/https");
        assert_eq!(NetworkProtocol::dns("ipfs.io").unwrap().to_string(), "/dns/ipfs.io");
        assert!(NetworkProtocol::dns("").is_err());

        let alias = NetworkProtocol::from_parts(TCP, "alias", ProtocolValue::Port(80));
        assert_eq!(tcp, alias);
        assert_ne!(tcp, NetworkProtocol::udp(80));
    }

    #[test]
    fn test_new_checks_format() {
        let tcp = ProtocolDef::new("tcp", TCP, ValueFormat::Port);
        assert!(NetworkProtocol::new(&tcp, ProtocolValue::Port(8080)).is_ok());
        assert!(matches!(
            NetworkProtocol::new(&tcp, ProtocolValue::None).unwrap_err(),
            MultiAddressError::InvalidArgument(_)
        ));

        let dns = ProtocolDef::new("dns", DNS, ValueFormat::Text);
        assert!(matches!(
            NetworkProtocol::new(&dns, ProtocolValue::Text("a/b".into())).unwrap_err(),
            MultiAddressError::InvalidArgument(_)
        ));
    }
}
