//! Errors of the stake lifecycle.

use gbpl_custody_db::errors::DbError;
use thiserror::Error;

use crate::record::{HtlcStatus, StakeStatus};

/// Errors that can occur while creating, transitioning or redeeming a stake.
#[derive(Debug, Error)]
pub enum StakeError {
    /// A stake id or network-2 signature contains characters outside `[A-Za-z0-9+/=]`.
    #[error("invalid stake id format: {0}")]
    InvalidStakeId(String),

    /// A token amount is not a base-10 integer.
    #[error("invalid token amount: {0}")]
    InvalidAmount(String),

    /// The stake period is not one of the offered periods.
    #[error("unsupported stake period: {0}")]
    UnknownPeriod(String),

    /// The status transition is not allowed.
    #[error("cannot move stake from {from} to {to}")]
    InvalidTransition {
        /// Current status.
        from: StakeStatus,
        /// Requested status.
        to: StakeStatus,
    },

    /// The htlc sub-state transition is not allowed.
    #[error("cannot move htlc from {from} to {to}")]
    InvalidHtlcTransition {
        /// Current htlc status.
        from: HtlcStatus,
        /// Requested htlc status.
        to: HtlcStatus,
    },

    /// Only active and pending stakes can be redeemed.
    #[error("cannot redeem stake in {0} status")]
    NotRedeemable(StakeStatus),

    /// The redeem message timestamp is outside the freshness window.
    #[error("signature expired or invalid timestamp")]
    StaleTimestamp,

    /// The redeem message does not match the expected layout.
    #[error("invalid message format")]
    MessageMismatch,

    /// The requester address is not a valid ed25519 public key.
    #[error("invalid address: {0}")]
    InvalidAddress(String),

    /// The signature over the redeem message does not verify.
    #[error("invalid signature")]
    InvalidSignature,

    /// The requester does not own the stake.
    #[error("user does not own this stake")]
    NotOwner,

    /// No record exists under the id.
    #[error("stake record not found: {0}")]
    NotFound(String),

    /// A stored record could not be decoded.
    #[error("corrupted stake record at {key}: {reason}")]
    Corrupted {
        /// Key of the record.
        key: String,
        /// Why decoding failed.
        reason: String,
    },

    /// The store failed.
    #[error("storage: {0}")]
    Db(#[from] DbError),
}

/// Failures reported by the network-2 collaborators.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransferError {
    /// The transaction does not exist or is not confirmed yet.
    #[error("transfer not found: {0}")]
    NotFound(String),

    /// The transaction exists but is not an acceptable transfer.
    #[error("invalid transfer: {0}")]
    Invalid(String),

    /// The network-2 node could not be reached or answered with an unexpected shape.
    #[error("ledger unavailable: {0}")]
    Unavailable(String),
}
