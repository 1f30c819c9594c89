//! Parsing of client-supplied keys, hashes and transaction ids.

use std::{fmt, str::FromStr};

use bitcoin::{
    hashes::{sha256, Hash},
    Txid,
};
use secp256k1::{Parity, PublicKey, XOnlyPublicKey};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::errors::KeyError;

/// A user's public key as submitted by a wallet.
///
/// Wallets hand out either the 33-byte compressed encoding or the 32-byte x-only encoding of their
/// key. Both are accepted and the original encoding is kept so that it can be echoed back.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UserPubkey {
    /// 33-byte SEC1 compressed key.
    Compressed(PublicKey),

    /// 32-byte BIP-340 x-only key.
    XOnly(XOnlyPublicKey),
}

impl UserPubkey {
    /// Parses a key from its raw bytes.
    pub fn from_slice(bytes: &[u8]) -> Result<Self, KeyError> {
        const FIELD: &str = "user pubkey";

        match bytes.len() {
            0 => Err(KeyError::Empty(FIELD)),
            33 => PublicKey::from_slice(bytes)
                .map(Self::Compressed)
                .map_err(|_| KeyError::InvalidPoint(FIELD)),
            32 => XOnlyPublicKey::from_slice(bytes)
                .map(Self::XOnly)
                .map_err(|_| KeyError::InvalidPoint(FIELD)),
            len => Err(KeyError::InvalidLength { field: FIELD, len }),
        }
    }

    /// The x-only form used by tapscript signature checks.
    pub fn x_only(&self) -> XOnlyPublicKey {
        match self {
            UserPubkey::Compressed(pk) => pk.x_only_public_key().0,
            UserPubkey::XOnly(xonly) => *xonly,
        }
    }

    /// The full public key used by segwit v0 signature checks.
    ///
    /// An x-only key has no parity information so the even point is assumed, as BIP-340 does.
    pub fn full(&self) -> PublicKey {
        match self {
            UserPubkey::Compressed(pk) => *pk,
            UserPubkey::XOnly(xonly) => xonly.public_key(Parity::Even),
        }
    }

    /// The key in the encoding it was submitted with.
    pub fn to_bytes(&self) -> Vec<u8> {
        match self {
            UserPubkey::Compressed(pk) => pk.serialize().to_vec(),
            UserPubkey::XOnly(xonly) => xonly.serialize().to_vec(),
        }
    }
}

impl From<PublicKey> for UserPubkey {
    fn from(value: PublicKey) -> Self {
        Self::Compressed(value)
    }
}

impl From<XOnlyPublicKey> for UserPubkey {
    fn from(value: XOnlyPublicKey) -> Self {
        Self::XOnly(value)
    }
}

impl FromStr for UserPubkey {
    type Err = KeyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let bytes = hex::decode(s).map_err(|_| KeyError::InvalidHex("user pubkey"))?;

        Self::from_slice(&bytes)
    }
}

impl fmt::Display for UserPubkey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&hex::encode(self.to_bytes()))
    }
}

impl Serialize for UserPubkey {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for UserPubkey {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;

        s.parse().map_err(serde::de::Error::custom)
    }
}

/// Parses a hex-encoded SHA-256 digest such as an HTLC hash commitment.
pub fn parse_sha256(field: &'static str, s: &str) -> Result<sha256::Hash, KeyError> {
    if s.is_empty() {
        return Err(KeyError::Empty(field));
    }

    let bytes = hex::decode(s).map_err(|_| KeyError::InvalidHex(field))?;
    let bytes: [u8; 32] = bytes
        .as_slice()
        .try_into()
        .map_err(|_| KeyError::InvalidLength {
            field,
            len: bytes.len(),
        })?;

    Ok(sha256::Hash::from_byte_array(bytes))
}

/// Parses a transaction id in its usual (reversed) 64-hex-char display form.
pub fn parse_txid(field: &'static str, s: &str) -> Result<Txid, KeyError> {
    if s.is_empty() {
        return Err(KeyError::Empty(field));
    }

    if s.len() != 64 {
        return Err(KeyError::InvalidLength { field, len: s.len() });
    }

    Txid::from_str(s).map_err(|_| KeyError::InvalidHex(field))
}
