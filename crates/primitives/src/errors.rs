//! Errors raised while parsing inputs and building scripts, addresses and transactions.

use bitcoin::taproot::TaprootBuilderError;
use thiserror::Error;

/// Error while building a script, an address or a transaction.
#[derive(Debug, Clone, Error)]
pub enum TxBuilderError {
    /// A script-path-only taproot needs at least one leaf.
    #[error("no scripts provided for the taptree")]
    EmptyTapscript,

    /// Adding a leaf to the taptree failed.
    #[error("could not build taptree: {0}")]
    BuildTaptree(#[from] TaprootBuilderError),

    /// The taptree leaves do not form a complete tree.
    #[error("taptree is incomplete")]
    IncompleteTaptree,

    /// A leaf that should be part of the taptree is not.
    #[error("script is not a leaf of the taptree")]
    MissingLeaf,

    /// A key could not be used in the requested context.
    #[error("invalid key: {0}")]
    Key(#[from] KeyError),
}

/// Result type alias for [`TxBuilderError`].
pub type TxBuilderResult<T> = Result<T, TxBuilderError>;

/// Error while parsing client-supplied keys, hashes and ids.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum KeyError {
    /// No bytes were supplied.
    #[error("{0} is empty")]
    Empty(&'static str),

    /// The value is not valid hex.
    #[error("{0} is not valid hex")]
    InvalidHex(&'static str),

    /// The decoded value does not have an acceptable length.
    #[error("{field} has invalid length {len}")]
    InvalidLength {
        /// Name of the offending field.
        field: &'static str,

        /// Length of the decoded bytes.
        len: usize,
    },

    /// The bytes do not encode a point on the curve.
    #[error("{0} is not a valid secp256k1 public key")]
    InvalidPoint(&'static str),
}
