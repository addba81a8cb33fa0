//! Network protocol registry
//!
//! Maps protocol names (and aliases) and codes to [`ProtocolDef`] entries.
//! Like [`AlgorithmRegistry`], clones share one table behind one lock. The
//! registry also carries the algorithm registry used for `/p2p` values.

use std::sync::{Arc, LazyLock, Mutex, MutexGuard, PoisonError};

use ipfs_multihash::AlgorithmRegistry;
use tracing::debug;

use crate::{
    MultiAddressError, Result,
    protocol::{self, ValueFormat},
};

static GLOBAL: LazyLock<ProtocolRegistry> =
    LazyLock::new(|| ProtocolRegistry::with_defaults(AlgorithmRegistry::global().clone()));

const BUILTIN: &[(&str, u64, ValueFormat)] = &[
    ("ip4", protocol::IP4, ValueFormat::Ip4),
    ("tcp", protocol::TCP, ValueFormat::Port),
    ("dccp", protocol::DCCP, ValueFormat::Port),
    ("ip6", protocol::IP6, ValueFormat::Ip6),
    ("dns", protocol::DNS, ValueFormat::Text),
    ("dns4", protocol::DNS4, ValueFormat::Text),
    ("dns6", protocol::DNS6, ValueFormat::Text),
    ("dnsaddr", protocol::DNSADDR, ValueFormat::Text),
    ("sctp", protocol::SCTP, ValueFormat::Port),
    ("udp", protocol::UDP, ValueFormat::Port),
    ("p2p-circuit", protocol::P2P_CIRCUIT, ValueFormat::None),
    ("udt", protocol::UDT, ValueFormat::None),
    ("utp", protocol::UTP, ValueFormat::None),
    ("p2p", protocol::P2P, ValueFormat::MultiHash),
    ("https", protocol::HTTPS, ValueFormat::None),
    ("onion", protocol::ONION, ValueFormat::Onion),
    ("quic", protocol::QUIC, ValueFormat::None),
    ("ws", protocol::WS, ValueFormat::None),
    ("wss", protocol::WSS, ValueFormat::None),
    ("http", protocol::HTTP, ValueFormat::None),
];

/// Older name for `/p2p`, still accepted in text
const BUILTIN_ALIASES: &[(&str, &str)] = &[("ipfs", "p2p")];

/// A registered protocol
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ProtocolDef {
    name: String,
    code: u64,
    format: ValueFormat,
}

impl ProtocolDef {
    pub fn new(name: &str, code: u64, format: ValueFormat) -> Self {
        ProtocolDef {
            name: name.to_string(),
            code,
            format,
        }
    }

    /// Canonical name
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn code(&self) -> u64 {
        self.code
    }

    pub fn format(&self) -> ValueFormat {
        self.format
    }
}

#[derive(Debug, Default)]
struct Table {
    protocols: Vec<ProtocolDef>,
    /// alias -> code of the canonical entry
    aliases: Vec<(String, u64)>,
}

impl Table {
    fn by_name(&self, name: &str) -> Option<&ProtocolDef> {
        self.protocols.iter().find(|p| p.name == name).or_else(|| {
            let (_, code) = self.aliases.iter().find(|(alias, _)| alias == name)?;
            self.by_code(*code)
        })
    }

    fn by_code(&self, code: u64) -> Option<&ProtocolDef> {
        self.protocols.iter().find(|p| p.code == code)
    }

    fn name_taken(&self, name: &str) -> bool {
        self.protocols.iter().any(|p| p.name == name)
            || self.aliases.iter().any(|(alias, _)| alias == name)
    }
}

/// Table of network protocols
///
/// ```
/// use ipfs_multiaddr::{ProtocolRegistry, ValueFormat};
/// use ipfs_multihash::AlgorithmRegistry;
///
/// let registry = ProtocolRegistry::with_defaults(AlgorithmRegistry::with_defaults());
/// let tcp = registry.by_name("tcp").unwrap();
/// assert_eq!(tcp.code(), 6);
/// assert_eq!(tcp.format(), ValueFormat::Port);
/// assert_eq!(registry.by_name("ipfs").unwrap().name(), "p2p");
/// ```
#[derive(Clone, Debug)]
pub struct ProtocolRegistry {
    algorithms: AlgorithmRegistry,
    table: Arc<Mutex<Table>>,
}

impl ProtocolRegistry {
    /// An empty registry
    pub fn new(algorithms: AlgorithmRegistry) -> Self {
        ProtocolRegistry {
            algorithms,
            table: Arc::new(Mutex::new(Table::default())),
        }
    }

    /// A registry holding the built-in protocols and the `ipfs` alias
    pub fn with_defaults(algorithms: AlgorithmRegistry) -> Self {
        let table = Table {
            protocols: BUILTIN
                .iter()
                .map(|(name, code, format)| ProtocolDef::new(name, *code, *format))
                .collect(),
            aliases: BUILTIN_ALIASES
                .iter()
                .filter_map(|(alias, name)| {
                    let code = BUILTIN.iter().find(|(n, _, _)| n == name)?.1;
                    Some((alias.to_string(), code))
                })
                .collect(),
        };
        ProtocolRegistry {
            algorithms,
            table: Arc::new(Mutex::new(table)),
        }
    }

    /// Process-wide registry with the built-in protocols, backed by
    /// [`AlgorithmRegistry::global`]
    pub fn global() -> &'static ProtocolRegistry {
        &GLOBAL
    }

    /// Algorithms used for multihash values
    pub fn algorithms(&self) -> &AlgorithmRegistry {
        &self.algorithms
    }

    /// Register a new protocol
    ///
    /// # Arguments
    /// * `name` - Unique, non-empty name without `/`
    /// * `code` - Unique multicodec code
    /// * `format` - How the protocol's value is written
    ///
    /// # Returns
    /// The registered protocol, or [`MultiAddressError::InvalidArgument`] if
    /// the name is malformed or the name or code is already taken.
    pub fn register(&self, name: &str, code: u64, format: ValueFormat) -> Result<ProtocolDef> {
        check_name(name)?;

        let mut lock = self.lock();
        if lock.name_taken(name) {
            return Err(MultiAddressError::InvalidArgument(format!(
                "protocol '{name}' is already registered"
            )));
        }
        if let Some(existing) = lock.by_code(code) {
            return Err(MultiAddressError::InvalidArgument(format!(
                "protocol code {code} is already registered as '{}'",
                existing.name
            )));
        }

        debug!("Registering protocol ({name}, {code}, {format:?})");
        let protocol = ProtocolDef::new(name, code, format);
        lock.protocols.push(protocol.clone());
        Ok(protocol)
    }

    /// Add another text name for a registered protocol
    pub fn register_alias(&self, alias: &str, name: &str) -> Result<()> {
        check_name(alias)?;

        let mut lock = self.lock();
        if lock.name_taken(alias) {
            return Err(MultiAddressError::InvalidArgument(format!(
                "protocol '{alias}' is already registered"
            )));
        }
        let Some(code) = lock.protocols.iter().find(|p| p.name == name).map(|p| p.code) else {
            return Err(MultiAddressError::UnknownProtocolName(name.to_string()));
        };

        debug!("Registering protocol alias ({alias} -> {name})");
        lock.aliases.push((alias.to_string(), code));
        Ok(())
    }

    /// Remove a protocol by canonical name, along with its aliases
    ///
    /// Returns true if it was registered.
    pub fn deregister(&self, name: &str) -> bool {
        let mut lock = self.lock();
        let Some(code) = lock.protocols.iter().find(|p| p.name == name).map(|p| p.code) else {
            return false;
        };
        lock.protocols.retain(|p| p.code != code);
        lock.aliases.retain(|(_, c)| *c != code);
        debug!("Deregistered protocol ({name}, {code})");
        true
    }

    /// Look up a protocol by canonical name or alias
    pub fn by_name(&self, name: &str) -> Option<ProtocolDef> {
        self.lock().by_name(name).cloned()
    }

    pub fn by_code(&self, code: u64) -> Option<ProtocolDef> {
        self.lock().by_code(code).cloned()
    }

    /// Snapshot of every registered protocol
    pub fn all(&self) -> Vec<ProtocolDef> {
        self.lock().protocols.clone()
    }

    /// Returns the number of registered protocols, aliases excluded
    pub fn len(&self) -> usize {
        self.lock().protocols.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().protocols.is_empty()
    }

    fn lock(&self) -> MutexGuard<'_, Table> {
        self.table.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

fn check_name(name: &str) -> Result<()> {
    if name.is_empty() || name.contains('/') {
        return Err(MultiAddressError::InvalidArgument(format!(
            "invalid protocol name '{name}'"
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn registry() -> ProtocolRegistry {
        ProtocolRegistry::with_defaults(AlgorithmRegistry::with_defaults())
    }

    #[test]
    fn test_defaults() {
        let registry = registry();
        for (name, code, format) in BUILTIN {
            let protocol = registry.by_name(name).unwrap();
            assert_eq!(protocol.code(), *code, "{name}");
            assert_eq!(protocol.format(), *format, "{name}");
            assert_eq!(registry.by_code(*code).unwrap(), protocol);
        }
        assert_eq!(registry.len(), BUILTIN.len());
        assert!(registry.by_name("garlic64").is_none());
        assert!(registry.by_code(1).is_none());
    }

    #[test]
    fn test_alias() {
        let registry = registry();
        let ipfs = registry.by_name("ipfs").unwrap();
        assert_eq!(ipfs.name(), "p2p");
        assert_eq!(ipfs.code(), protocol::P2P);
        assert!(registry.all().iter().all(|p| p.name() != "ipfs"));
    }

    #[test]
    fn test_register_and_deregister() {
        let registry = registry();
        let garlic = registry.register("garlic32", 447, ValueFormat::Text).unwrap();
        assert_eq!(registry.by_code(447).unwrap(), garlic);

        registry.register_alias("i2p", "garlic32").unwrap();
        assert_eq!(registry.by_name("i2p").unwrap(), garlic);

        assert!(registry.deregister("garlic32"));
        assert!(registry.by_name("garlic32").is_none());
        assert!(registry.by_name("i2p").is_none());
        assert!(!registry.deregister("garlic32"));
    }

    #[test]
    fn test_register_rejects() {
        let registry = registry();
        for (name, code) in [
            ("tcp", 9000),
            ("ipfs", 9001),
            ("tcp2", 6),
            ("", 9002),
            ("a/b", 9003),
        ] {
            assert!(
                matches!(
                    registry.register(name, code, ValueFormat::None).unwrap_err(),
                    MultiAddressError::InvalidArgument(_)
                ),
                "{name}"
            );
        }
        assert!(matches!(
            registry.register_alias("x", "missing").unwrap_err(),
            MultiAddressError::UnknownProtocolName(_)
        ));
        assert!(matches!(
            registry.register_alias("udp", "tcp").unwrap_err(),
            MultiAddressError::InvalidArgument(_)
        ));
    }

    #[test]
    fn test_empty() {
        let registry = ProtocolRegistry::new(AlgorithmRegistry::new());
        assert!(registry.is_empty());
        assert!(registry.by_name("tcp").is_none());
    }

    #[test]
    fn test_clones_share_state() {
        let registry = registry();
        let other = registry.clone();
        registry.register("memory", 777, ValueFormat::Port).unwrap();
        assert!(other.by_name("memory").is_some());
        assert!(ProtocolRegistry::global().by_name("memory").is_none());
    }
}
