//! Deterministic HTLC preimages.
//!
//! The preimage of a stake is `HMAC-SHA256(root_secret, stake_id)` and its commitment is the
//! SHA-256 of the preimage. Only the commitment is ever stored; the preimage is recomputed from
//! the stake id whenever it has to be released.

use std::fmt;

use bitcoin::hashes::{hmac, sha256, Hash, HashEngine};
use zeroize::{Zeroize, ZeroizeOnDrop};

use crate::errors::PreimageError;

/// Length of a hex encoded 32-byte root secret.
const HEX_SECRET_LEN: usize = 64;

/// Derives preimages and their commitments from a root secret.
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct PreimageCommitment {
    root_secret: Vec<u8>,
}

impl PreimageCommitment {
    /// Creates a new [`PreimageCommitment`] from raw secret bytes.
    pub fn new(root_secret: Vec<u8>) -> Result<Self, PreimageError> {
        if root_secret.is_empty() {
            return Err(PreimageError::MissingRootSecret);
        }

        Ok(Self { root_secret })
    }

    /// Creates a new [`PreimageCommitment`] from a configured secret string.
    ///
    /// A string of exactly 64 hex characters is decoded to its 32 bytes. Anything else is used
    /// as raw UTF-8 bytes.
    pub fn from_secret_str(secret: &str) -> Result<Self, PreimageError> {
        let bytes = match secret.len() {
            HEX_SECRET_LEN => hex::decode(secret).unwrap_or_else(|_| secret.as_bytes().to_vec()),
            _ => secret.as_bytes().to_vec(),
        };

        Self::new(bytes)
    }

    /// The preimage for the stake created by `signature`.
    pub fn derive_secret(&self, signature: &str) -> [u8; 32] {
        let mut engine = hmac::HmacEngine::<sha256::Hash>::new(&self.root_secret);
        engine.input(signature.as_bytes());

        hmac::Hmac::<sha256::Hash>::from_engine(engine).to_byte_array()
    }

    /// The commitment to `secret`.
    pub fn commit(secret: &[u8; 32]) -> sha256::Hash {
        sha256::Hash::hash(secret)
    }

    /// The commitment to the preimage of the stake created by `signature`.
    pub fn hash_for(&self, signature: &str) -> sha256::Hash {
        let mut secret = self.derive_secret(signature);
        let hash = Self::commit(&secret);
        secret.zeroize();

        hash
    }
}

impl fmt::Debug for PreimageCommitment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PreimageCommitment").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use super::*;

    const ROOT: &str = "0b0b0b0b0b0b0b0b0b0b0b0b0b0b0b0b0b0b0b0b0b0b0b0b0b0b0b0b0b0b0b0b";

    #[test]
    fn test_rfc4231_case_2() {
        // HMAC-SHA256 with key "Jefe" and data "what do ya want for nothing?".
        let commitment = PreimageCommitment::from_secret_str("Jefe").unwrap();

        assert_eq!(
            hex::encode(commitment.derive_secret("what do ya want for nothing?")),
            "5bdcc146bf60754e6a042426089575c75a003f089d2739839dec58b964ec3843"
        );
    }

    #[test]
    fn test_hex_root_secret_is_decoded() {
        let decoded = PreimageCommitment::from_secret_str(ROOT).unwrap();
        let raw = PreimageCommitment::new(vec![0x0b; 32]).unwrap();
        let utf8 = PreimageCommitment::new(ROOT.as_bytes().to_vec()).unwrap();

        assert_eq!(decoded.derive_secret("sig"), raw.derive_secret("sig"));
        assert_ne!(decoded.derive_secret("sig"), utf8.derive_secret("sig"));
    }

    #[test]
    fn test_missing_root_secret() {
        assert_eq!(
            PreimageCommitment::from_secret_str("").unwrap_err(),
            PreimageError::MissingRootSecret
        );
    }

    #[test]
    fn test_hash_is_lowercase_hex() {
        let commitment = PreimageCommitment::from_secret_str(ROOT).unwrap();
        let hash = commitment.hash_for("5VERv8NMvzbJMEkV8xnrLkEaWRtSz9CosKDYjCJjBRnb");
        let rendered = hash.to_string();

        assert_eq!(rendered.len(), 64);
        assert_eq!(rendered, rendered.to_lowercase());
    }

    proptest! {
        #[test]
        fn commitment_is_reproducible(signature in "[1-9A-HJ-NP-Za-km-z]{64,88}") {
            let commitment = PreimageCommitment::from_secret_str(ROOT).unwrap();
            let secret = commitment.derive_secret(&signature);

            prop_assert_eq!(PreimageCommitment::commit(&secret), commitment.hash_for(&signature));
            prop_assert_eq!(secret, commitment.derive_secret(&signature));
        }

        #[test]
        fn one_byte_changes_the_secret(signature in "[a-z]{16,32}", idx in 0usize..16) {
            let commitment = PreimageCommitment::from_secret_str(ROOT).unwrap();
            let mut tweaked = signature.clone().into_bytes();
            tweaked[idx] = if tweaked[idx] == b'a' { b'b' } else { b'a' };
            let tweaked = String::from_utf8(tweaked).unwrap();

            prop_assert_ne!(commitment.derive_secret(&signature), commitment.derive_secret(&tweaked));
        }
    }
}
