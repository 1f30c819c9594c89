//! Module to generate arbitrary bitcoin values for testing.

use bitcoin::{
    hashes::Hash,
    key::rand::{rngs::OsRng, Rng},
    secp256k1::{Keypair, PublicKey, SecretKey, SECP256K1},
    OutPoint, Txid,
};

/// Generates a random transaction ID.
pub fn generate_txid() -> Txid {
    let mut txid = [0u8; 32];
    OsRng.fill(&mut txid);

    Txid::from_byte_array(txid)
}

/// Generates a random outpoint.
pub fn generate_outpoint() -> OutPoint {
    OutPoint {
        txid: generate_txid(),
        vout: OsRng.gen_range(0..8),
    }
}

/// Generates a random keypair.
pub fn generate_keypair() -> Keypair {
    Keypair::new(SECP256K1, &mut OsRng)
}

/// Generates a random public key.
pub fn generate_pubkey() -> PublicKey {
    generate_keypair().public_key()
}

/// Generates a random hex seed for the coordinator key.
pub fn generate_seed_hex() -> String {
    let sk = SecretKey::new(&mut OsRng);

    sk.display_secret().to_string()
}
