//! Built-in hashing algorithms
//!
//! Codes and sizes follow the multicodec table.
//! See: <https://github.com/multiformats/multicodec/blob/master/table.csv>

use blake2::{Blake2b, Blake2b512, Blake2s256, digest::consts::U32};
use sha1::Sha1;
use sha2::{Digest, Sha256, Sha512};
use sha3::{
    Keccak224, Keccak256, Keccak384, Keccak512, Sha3_224, Sha3_256, Sha3_384, Sha3_512, Shake128,
    Shake256,
    digest::{ExtendableOutput, Update},
};

pub(crate) struct Builtin {
    pub name: &'static str,
    pub code: u64,
    pub digest_size: usize,
    pub compute: fn(&[u8]) -> Vec<u8>,
}

pub(crate) const BUILTIN: &[Builtin] = &[
    Builtin {
        name: "identity",
        code: 0x00,
        digest_size: 0,
        compute: identity,
    },
    Builtin {
        name: "sha1",
        code: 0x11,
        digest_size: 20,
        compute: digest::<Sha1>,
    },
    Builtin {
        name: "sha2-256",
        code: 0x12,
        digest_size: 32,
        compute: digest::<Sha256>,
    },
    Builtin {
        name: "sha2-512",
        code: 0x13,
        digest_size: 64,
        compute: digest::<Sha512>,
    },
    Builtin {
        name: "sha3-512",
        code: 0x14,
        digest_size: 64,
        compute: digest::<Sha3_512>,
    },
    Builtin {
        name: "sha3-384",
        code: 0x15,
        digest_size: 48,
        compute: digest::<Sha3_384>,
    },
    Builtin {
        name: "sha3-256",
        code: 0x16,
        digest_size: 32,
        compute: digest::<Sha3_256>,
    },
    Builtin {
        name: "sha3-224",
        code: 0x17,
        digest_size: 28,
        compute: digest::<Sha3_224>,
    },
    Builtin {
        name: "shake-128",
        code: 0x18,
        digest_size: 32,
        compute: shake_128,
    },
    Builtin {
        name: "shake-256",
        code: 0x19,
        digest_size: 64,
        compute: shake_256,
    },
    Builtin {
        name: "keccak-224",
        code: 0x1a,
        digest_size: 28,
        compute: digest::<Keccak224>,
    },
    Builtin {
        name: "keccak-256",
        code: 0x1b,
        digest_size: 32,
        compute: digest::<Keccak256>,
    },
    Builtin {
        name: "keccak-384",
        code: 0x1c,
        digest_size: 48,
        compute: digest::<Keccak384>,
    },
    Builtin {
        name: "keccak-512",
        code: 0x1d,
        digest_size: 64,
        compute: digest::<Keccak512>,
    },
    Builtin {
        name: "blake2b-256",
        code: 0xb220,
        digest_size: 32,
        compute: digest::<Blake2b<U32>>,
    },
    Builtin {
        name: "blake2b-512",
        code: 0xb240,
        digest_size: 64,
        compute: digest::<Blake2b512>,
    },
    Builtin {
        name: "blake2s-256",
        code: 0xb260,
        digest_size: 32,
        compute: digest::<Blake2s256>,
    },
];

fn identity(data: &[u8]) -> Vec<u8> {
    data.to_vec()
}

fn digest<D: Digest>(data: &[u8]) -> Vec<u8> {
    D::digest(data).to_vec()
}

fn shake_128(data: &[u8]) -> Vec<u8> {
    xof::<Shake128>(data, 32)
}

fn shake_256(data: &[u8]) -> Vec<u8> {
    xof::<Shake256>(data, 64)
}

fn xof<X: Default + Update + ExtendableOutput>(data: &[u8], len: usize) -> Vec<u8> {
    let mut hasher = X::default();
    hasher.update(data);
    let mut out = vec![0u8; len];
    hasher.finalize_xof_into(&mut out);
    out
}
