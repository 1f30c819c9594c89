//! The coordinator's signing key, derived from a seed.

use std::fmt;

use bitcoin::{
    bip32::Xpriv, Address, CompressedPublicKey, Network, NetworkKind, PublicKey, ScriptBuf,
};
use secp256k1::{SecretKey, SECP256K1};
use zeroize::{Zeroize, ZeroizeOnDrop};

use crate::errors::SignerError;

/// Coordinator keys derived from a master seed.
///
/// The master key itself is the signing key: the same public key is used on the cooperative
/// branch of every deposit script and owns the funding address that pays the fee inputs.
pub struct CoordinatorKeys {
    /// The master [`Xpriv`] of the seed.
    master: Xpriv,
}

impl CoordinatorKeys {
    /// Derives the keys from a raw seed.
    pub fn from_seed(seed: &[u8]) -> Result<Self, SignerError> {
        if seed.is_empty() {
            return Err(SignerError::InvalidSeed);
        }

        let master = Xpriv::new_master(NetworkKind::Main, seed)?;

        Ok(Self { master })
    }

    /// Derives the keys from a hex encoded seed.
    pub fn from_seed_hex(seed: &str) -> Result<Self, SignerError> {
        let mut bytes = hex::decode(seed.trim()).map_err(|_| SignerError::InvalidSeed)?;
        let keys = Self::from_seed(&bytes);
        bytes.zeroize();

        keys
    }

    /// The coordinator's public key.
    pub fn public_key(&self) -> secp256k1::PublicKey {
        self.master.private_key.public_key(SECP256K1)
    }

    pub(crate) const fn secret_key(&self) -> &SecretKey {
        &self.master.private_key
    }

    /// The public key in the form used by P2WPKH outputs.
    pub fn funding_pubkey(&self) -> CompressedPublicKey {
        CompressedPublicKey(self.public_key())
    }

    /// The address that holds the coordinator's fee UTXOs on `network`.
    pub fn funding_address(&self, network: Network) -> Address {
        Address::p2wpkh(&self.funding_pubkey(), network)
    }

    /// The locking script of [`Self::funding_address`].
    pub fn funding_script(&self) -> ScriptBuf {
        ScriptBuf::new_p2wpkh(&self.funding_pubkey().wpubkey_hash())
    }

    /// The key under which signatures of this coordinator are stored in a psbt.
    pub fn psbt_key(&self) -> PublicKey {
        PublicKey::new(self.public_key())
    }
}

impl fmt::Debug for CoordinatorKeys {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CoordinatorKeys")
            .field("public_key", &self.public_key())
            .finish_non_exhaustive()
    }
}

// Manual Drop implementation to zeroize keys on drop.
impl Drop for CoordinatorKeys {
    fn drop(&mut self) {
        self.zeroize();
    }
}

impl Zeroize for CoordinatorKeys {
    #[inline]
    fn zeroize(&mut self) {
        let Self { master } = self;

        // NOTE: `SecretKey::non_secure_erase` writes `1`s to the memory.
        master.private_key.non_secure_erase();
        master.depth.zeroize();
        {
            let fingerprint: &mut [u8; 4] = master.parent_fingerprint.as_mut();
            fingerprint.zeroize();
        }
        {
            let chaincode: &mut [u8; 32] = master.chain_code.as_mut();
            chaincode.zeroize();
        }
    }
}

impl ZeroizeOnDrop for CoordinatorKeys {}

#[cfg(test)]
mod tests {
    use super::*;

    const SEED: &str = "000102030405060708090a0b0c0d0e0f";

    #[test]
    fn test_derivation_is_deterministic() {
        let first = CoordinatorKeys::from_seed_hex(SEED).unwrap();
        let second = CoordinatorKeys::from_seed_hex(SEED).unwrap();

        assert_eq!(first.public_key(), second.public_key());
        assert_eq!(
            first.funding_address(Network::Testnet),
            second.funding_address(Network::Testnet)
        );
        assert!(first.funding_script().is_p2wpkh());
        assert_eq!(
            first.funding_address(Network::Regtest).script_pubkey(),
            first.funding_script()
        );
    }

    #[test]
    fn test_bip32_test_vector_1() {
        let keys = CoordinatorKeys::from_seed_hex(SEED).unwrap();

        assert_eq!(
            keys.public_key().to_string(),
            "0339a36013301597daef41fbe593a02cc513d0b55527ec2df1050e2e8ff49c85c2"
        );
    }

    #[test]
    fn test_invalid_seeds() {
        assert!(matches!(
            CoordinatorKeys::from_seed_hex("not hex"),
            Err(SignerError::InvalidSeed)
        ));
        assert!(matches!(
            CoordinatorKeys::from_seed_hex(""),
            Err(SignerError::InvalidSeed)
        ));
    }

    #[test]
    fn test_debug_hides_secret() {
        let keys = CoordinatorKeys::from_seed_hex(SEED).unwrap();
        let secret = hex::encode(keys.secret_key().secret_bytes());

        assert!(!format!("{keys:?}").contains(&secret));
    }

    #[test]
    fn test_zeroize() {
        let mut keys = CoordinatorKeys::from_seed_hex(SEED).unwrap();
        let original = keys.public_key();

        keys.zeroize();

        assert_eq!(*keys.master.chain_code.as_bytes(), [0u8; 32]);
        assert_ne!(keys.public_key(), original);
    }
}
