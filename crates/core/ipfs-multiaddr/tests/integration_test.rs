use std::{
    net::Ipv6Addr,
    sync::{
        Arc,
        atomic::{AtomicUsize, Ordering},
    },
};

use ipfs_multiaddr::{
    MultiAddress, MultiAddressError, NetworkProtocol, ProtocolRegistry, ProtocolValue, ValueFormat,
};
use ipfs_multihash::{AlgorithmRegistry, MultiHash};
use tracing_subscriber::filter;

fn init_logging() {
    // construct a subscriber that prints formatted traces to stdout
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter::EnvFilter::from_default_env())
        .try_init();
}

fn registry() -> ProtocolRegistry {
    ProtocolRegistry::with_defaults(AlgorithmRegistry::with_defaults())
}

#[test]
fn text_and_binary_forms_agree() {
    init_logging();
    let registry = registry();
    for text in [
        "/ip4/10.1.10.10/tcp/29087/p2p/QmVcSqVEsvm5RR9mBLjwpb2XjFVn5bPdPL69mL8PH45pPC",
        "/ip6/::1/udp/4001/quic",
        "/ip6/fe80::8823:6dff:fee7:f172/tcp/4001/ws",
        "/dns6/ipfs.io/tcp/443/https",
        "/dnsaddr/bootstrap.libp2p.io",
        "/ip4/127.0.0.1/udp/1234/utp",
        "/ip4/127.0.0.1/tcp/80/http",
        "/ip4/127.0.0.1/tcp/443/wss",
        "/ip4/127.0.0.1/sctp/5000",
        "/ip4/127.0.0.1/dccp/5000",
        "/ip4/127.0.0.1/udp/9000/udt",
        "/p2p/QmVcSqVEsvm5RR9mBLjwpb2XjFVn5bPdPL69mL8PH45pPC/p2p-circuit",
        "/onion/timaq4ygg2iegci7:80/http",
    ] {
        let addr = MultiAddress::parse(text, &registry).expect("Couldn't parse multiaddr");
        assert_eq!(addr.to_string(), text);

        let mut bytes = Vec::new();
        addr.write_to(&mut bytes).unwrap();
        let decoded = MultiAddress::read_from(&mut &bytes[..], &registry).unwrap();
        assert_eq!(decoded, addr, "{text}");
        assert_eq!(decoded.to_string(), text);
    }
}

#[test]
fn p2p_value_is_a_nested_multihash() {
    init_logging();
    let registry = registry();
    let peer = MultiHash::compute(b"peer key", registry.algorithms()).unwrap();

    let mut addr: MultiAddress = "/ip6/::1/tcp/4001".parse().unwrap();
    addr.push(NetworkProtocol::p2p(peer.clone()));

    let bytes = addr.to_bytes();
    // 0xa5 0x03 = 421, then the 34 byte multihash with its own length prefix
    let tail = &bytes[bytes.len() - 37..];
    assert_eq!(&tail[..3], &[0xa5, 0x03, 0x22]);
    assert_eq!(&tail[3..], peer.to_bytes().as_slice());

    let decoded = MultiAddress::decode(&bytes, &registry).unwrap();
    assert_eq!(decoded.peer_id(), Some(&peer));
    assert_eq!(
        decoded.protocols()[0].value(),
        &ProtocolValue::Ip6(Ipv6Addr::LOCALHOST)
    );
}

#[test]
fn nested_multihash_must_fill_its_length() {
    init_logging();
    let registry = registry();
    // p2p value declares 3 bytes but the multihash inside only covers 2
    let bytes = [0xa5, 0x03, 0x03, 0x00, 0x00, 0xff];
    assert!(matches!(
        MultiAddress::decode(&bytes, &registry).unwrap_err(),
        MultiAddressError::MultiHash(_)
    ));
}

#[test]
fn unknown_peer_algorithm_is_reported() {
    init_logging();
    let registry = registry();
    let seen = Arc::new(AtomicUsize::new(0));
    let counter = seen.clone();
    registry.algorithms().set_unknown_observer(move |alg| {
        assert_eq!(alg.name(), "ipfs-1");
        counter.fetch_add(1, Ordering::SeqCst);
    });

    // 01 02 0a 0b: code 1 is not registered
    let addr = MultiAddress::parse("/p2p/2Vg1Y", &registry).unwrap();
    assert_eq!(seen.load(Ordering::SeqCst), 1);
    assert_eq!(addr.peer_id().unwrap().algorithm().name(), "ipfs-1");

    let bytes = addr.to_bytes();
    assert_eq!(bytes, [0xa5, 0x03, 0x04, 0x01, 0x02, 0x0a, 0x0b]);
    MultiAddress::decode(&bytes, &registry).unwrap();
    assert_eq!(seen.load(Ordering::SeqCst), 2);

    // Known algorithms are not reported
    MultiAddress::parse(
        "/p2p/QmVcSqVEsvm5RR9mBLjwpb2XjFVn5bPdPL69mL8PH45pPC",
        &registry,
    )
    .unwrap();
    assert_eq!(seen.load(Ordering::SeqCst), 2);
}

#[test]
fn protocols_can_be_added_at_runtime() {
    init_logging();
    let registry = registry();
    assert!(matches!(
        MultiAddress::decode(&[0xbe, 0x03, 0x03, b'a', b'b', b'c'], &registry).unwrap_err(),
        MultiAddressError::UnknownProtocolCode(446)
    ));

    registry.register("garlic32", 446, ValueFormat::Text).unwrap();
    let addr = MultiAddress::decode(&[0xbe, 0x03, 0x03, b'a', b'b', b'c'], &registry).unwrap();
    assert_eq!(addr.to_string(), "/garlic32/abc");

    assert!(registry.deregister("garlic32"));
    assert!(matches!(
        MultiAddress::parse("/garlic32/abc", &registry).unwrap_err(),
        MultiAddressError::UnknownProtocolName(_)
    ));
}

#[test]
fn registry_is_shared_across_threads() {
    init_logging();
    let registry = registry();
    let handles: Vec<_> = (0..8u64)
        .map(|i| {
            let registry = registry.clone();
            std::thread::spawn(move || {
                let name = format!("proto-{i}");
                registry
                    .register(&name, 0x3f0000 + i, ValueFormat::Port)
                    .unwrap();
                let addr = MultiAddress::parse(&format!("/{name}/{i}"), &registry).unwrap();
                assert_eq!(addr.protocols()[0].code(), 0x3f0000 + i);
            })
        })
        .collect();
    for handle in handles {
        handle.join().unwrap();
    }
    assert_eq!(registry.all().len(), 28);
}
