//! Errors raised by the coordinator's secrets.

use bitcoin::{bip32, sighash::P2wpkhError};
use thiserror::Error;

/// Error while deriving the coordinator key or signing with it.
#[derive(Debug, Error)]
pub enum SignerError {
    /// The seed is not valid hex.
    #[error("seed is not valid hex")]
    InvalidSeed,

    /// The master key could not be derived from the seed.
    #[error("could not derive master key: {0}")]
    Derivation(#[from] bip32::Error),

    /// The sighash of a fee input could not be computed.
    #[error("could not compute sighash: {0}")]
    Sighash(#[from] P2wpkhError),

    /// Not every input but the deposit input could be signed.
    #[error("signed {signed} of {expected} fee inputs")]
    PartialSignFailure {
        /// Number of inputs signed.
        signed: usize,

        /// Number of inputs that needed a signature.
        expected: usize,
    },
}

/// Error while setting up the preimage commitment scheme.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PreimageError {
    /// No root secret was configured.
    #[error("preimage root secret is not configured")]
    MissingRootSecret,
}
