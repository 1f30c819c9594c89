//! Errors of the token network client.

use gbpl_custody_stake::errors::TransferError;
use thiserror::Error;

/// Error while looking up or checking a token transfer.
#[derive(Debug, Error)]
pub enum LedgerError {
    /// The request could not be sent or its response could not be read.
    #[error("request to ledger failed: {0}")]
    Request(#[from] reqwest::Error),

    /// The node answered with a JSON-RPC error.
    #[error("ledger rpc error {code}: {message}")]
    Rpc {
        /// JSON-RPC error code.
        code: i64,

        /// Error message.
        message: String,
    },

    /// The node answered with something that does not have the expected shape.
    #[error("unexpected ledger response: {0}")]
    UnexpectedResponse(String),

    /// No confirmed transaction has this signature.
    #[error("transaction {0} not found")]
    TransactionNotFound(String),

    /// The transaction was included but failed.
    #[error("transaction {0} failed")]
    TransactionFailed(String),

    /// The vault token account is not touched by the transaction.
    #[error("vault address not found in transaction")]
    VaultNotInTransaction,

    /// The transaction carries no balance of the vault token account.
    #[error("vault token balance not found in transaction")]
    VaultBalanceMissing,

    /// The vault balance did not grow.
    #[error("no tokens were transferred into the vault")]
    NothingTransferred,

    /// No token account of the claimed owner paid into the vault.
    #[error("transfer was not made by {0}")]
    OwnerMismatch(String),

    /// A token amount is not a base-10 integer.
    #[error("invalid token amount: {0}")]
    InvalidAmount(String),
}

impl From<LedgerError> for TransferError {
    fn from(err: LedgerError) -> Self {
        match err {
            LedgerError::TransactionNotFound(_) => TransferError::NotFound(err.to_string()),
            LedgerError::TransactionFailed(_)
            | LedgerError::VaultNotInTransaction
            | LedgerError::VaultBalanceMissing
            | LedgerError::NothingTransferred
            | LedgerError::OwnerMismatch(_) => TransferError::Invalid(err.to_string()),
            LedgerError::Request(_)
            | LedgerError::Rpc { .. }
            | LedgerError::UnexpectedResponse(_)
            | LedgerError::InvalidAmount(_) => TransferError::Unavailable(err.to_string()),
        }
    }
}
