//! Error types for assembling and finalizing the lock transaction.

use bitcoin::{psbt::ExtractTxError, Amount};
use gbpl_custody_primitives::errors::TxBuilderError;
use thiserror::Error;

/// Errors that can occur while assembling the lock transaction.
#[derive(Debug, Error)]
pub enum AssembleError {
    /// The coordinator's fee UTXOs do not cover the fee surcharge and buffer.
    #[error("insufficient coordinator funds: need {required}, have {available}")]
    InsufficientFunds {
        /// Amount the fee inputs must cover.
        required: Amount,

        /// Total of the UTXOs that could be used.
        available: Amount,
    },

    /// Summing amounts reported by the explorer overflowed.
    #[error("amount overflow while {0}")]
    AmountOverflow(&'static str),

    /// The deposit or final-lock connector could not be built.
    #[error("could not build connector: {0}")]
    TxBuilder(#[from] TxBuilderError),

    /// The skeleton transaction could not be wrapped in a psbt.
    #[error("could not create psbt: {0}")]
    Psbt(#[from] bitcoin::psbt::Error),
}

/// Errors that can occur while finalizing the lock transaction.
#[derive(Debug, Error)]
pub enum FinalizeError {
    /// Input 0 carries no signature from the user.
    #[error("missing user signature on the deposit input")]
    MissingUserSignature,

    /// A fee input carries no signature from the key that owns it.
    #[error("missing signature on fee input {0}")]
    MissingFeeSignature(usize),

    /// A fee input does not say which output it spends.
    #[error("missing witness utxo on input {0}")]
    MissingWitnessUtxo(usize),

    /// The psbt has fewer inputs than a lock transaction.
    #[error("lock transaction has no inputs")]
    NoInputs,

    /// An input is still missing its final witness.
    #[error("input {0} is not finalized")]
    NotFinalized(usize),

    /// The deposit witness could not be built.
    #[error("could not build witness: {0}")]
    TxBuilder(#[from] TxBuilderError),

    /// The network transaction could not be extracted from the psbt.
    #[error("could not extract transaction: {0}")]
    Extract(#[from] ExtractTxError),
}
