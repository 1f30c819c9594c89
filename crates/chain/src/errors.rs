//! Errors raised while talking to the block explorer.

use bitcoin::{Address, Txid};
use thiserror::Error;

/// Error while reading from or writing to the chain through the explorer.
#[derive(Debug, Error)]
pub enum ChainError {
    /// The request could not be sent or its response could not be read.
    #[error("request to explorer failed: {0}")]
    Request(#[from] reqwest::Error),

    /// The explorer answered a read with a non-success status.
    #[error("explorer returned status {status}: {message}")]
    HttpResponse {
        /// HTTP status code.
        status: u16,

        /// Body of the response.
        message: String,
    },

    /// The explorer answered with something that does not have the expected shape.
    #[error("unexpected explorer response: {0}")]
    UnexpectedResponse(String),

    /// The explorer refused to relay a transaction.
    ///
    /// The message is the explorer's own text, e.g. `non-BIP68-final` when a relative timelock is
    /// not yet satisfied.
    #[error("{message}")]
    BroadcastRejected {
        /// HTTP status code.
        status: u16,

        /// Body of the response, verbatim.
        message: String,
    },
}

impl ChainError {
    /// Whether repeating the same request may succeed.
    pub fn is_transient(&self) -> bool {
        match self {
            ChainError::Request(err) => err.is_timeout() || err.is_connect() || err.is_request(),
            ChainError::HttpResponse { status, .. } => *status == 429 || *status >= 500,
            ChainError::UnexpectedResponse(_) | ChainError::BroadcastRejected { .. } => false,
        }
    }

    /// Whether the explorer blamed the request itself, e.g. an unknown txid.
    pub fn is_client_error(&self) -> bool {
        match self {
            ChainError::HttpResponse { status, .. } | ChainError::BroadcastRejected { status, .. } => {
                (400..500).contains(status)
            }
            _ => false,
        }
    }
}

/// Result type alias for [`ChainError`].
pub type ChainResult<T> = Result<T, ChainError>;

/// Error while locating a user's deposit output.
#[derive(Debug, Error)]
pub enum LocateError {
    /// None of the outputs of the deposit transaction pays to the expected address.
    ///
    /// The user may have paid to a different address, or the transaction has not reached the
    /// explorer yet, in which case trying again later can succeed.
    #[error("deposit output to {address} not found in {txid}")]
    DepositNotFound {
        /// The deposit transaction.
        txid: Txid,

        /// The address that was expected to be paid.
        address: Address,
    },

    /// The deposit transaction could not be fetched.
    #[error("could not fetch deposit transaction: {0}")]
    Chain(#[from] ChainError),
}
