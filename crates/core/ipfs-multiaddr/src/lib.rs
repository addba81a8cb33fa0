/*!
 * Layered, self-describing network addresses for IPFS
 *
 * A multiaddr is an ordered stack of protocol layers, outermost first:
 * `/ip4/10.1.10.10/tcp/29087/p2p/QmVcSqVEsvm5RR9mBLjwpb2XjFVn5bPdPL69mL8PH45pPC`.
 * Its binary form is the concatenation of `varint(code) || value` per layer.
 *
 * Protocols are resolved through a [`ProtocolRegistry`], so new protocols can
 * be added at runtime. Unlike hashing algorithms there is no fallback for an
 * unknown protocol: without its value format the rest of the address cannot
 * be read.
 *
 * See: <https://github.com/multiformats/multiaddr>
 */

pub mod multiaddr;
pub mod protocol;
pub mod registry;

pub use multiaddr::MultiAddress;
pub use protocol::{NetworkProtocol, OnionAddress, ProtocolValue, ValueFormat};
pub use registry::{ProtocolDef, ProtocolRegistry};

mod error;
pub use error::{MultiAddressError, Result};
