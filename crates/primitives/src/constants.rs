//! Constants that are fixed by the protocol and must be known at compile-time.

use std::sync::LazyLock;

use secp256k1::XOnlyPublicKey;

/// The x-coordinate of the BIP-341 NUMS point `H`.
///
/// Nobody knows the discrete log of this point, so a taproot output that uses it as the internal
/// key can only be spent via one of its script leaves.
/// See <https://github.com/bitcoin/bips/blob/master/bip-0341.mediawiki#constructing-and-spending-taproot-outputs>.
pub const UNSPENDABLE_PUBLIC_KEY_BYTES: [u8; 32] = [
    0x50, 0x92, 0x9b, 0x74, 0xc1, 0xa0, 0x49, 0x54, 0xb7, 0x8b, 0x4b, 0x60, 0x35, 0xe9, 0x7a, 0x5e,
    0x07, 0x8a, 0x5a, 0x0f, 0x28, 0xec, 0x96, 0xd5, 0x47, 0xbf, 0xee, 0x9a, 0xce, 0x80, 0x3a, 0xc0,
];

/// The unspendable internal key used for script-path-only taproot outputs.
pub static UNSPENDABLE_INTERNAL_KEY: LazyLock<XOnlyPublicKey> = LazyLock::new(|| {
    XOnlyPublicKey::from_slice(&UNSPENDABLE_PUBLIC_KEY_BYTES).expect("valid xonly public key")
});
