//! Error taxonomy of the coordinator.
//!
//! Every error raised by a lower layer is folded into one [`CoordinatorError`] variant, and each
//! variant maps to a single HTTP-like status code that is reported to the caller.

use gbpl_custody_chain::errors::{ChainError, LocateError};
use gbpl_custody_params::errors::ParamsError;
use gbpl_custody_primitives::errors::{KeyError, TxBuilderError};
use gbpl_custody_signer::errors::{PreimageError, SignerError};
use gbpl_custody_stake::errors::{StakeError, TransferError};
use gbpl_custody_tx_graph::errors::{AssembleError, FinalizeError};
use thiserror::Error;

/// Errors returned by the coordinator services.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CoordinatorError {
    /// A field is missing or malformed.
    #[error("{0}")]
    Validation(String),

    /// A secret or setting the request needs is not configured.
    #[error("server configuration error: {0}")]
    Configuration(String),

    /// The block explorer or the token network could not be reached or answered unexpectedly.
    #[error("{0}")]
    ExternalLookup(String),

    /// The coordinator's fee UTXOs fall short, or the deposit output was not found.
    #[error("{0}")]
    InsufficientFunds(String),

    /// A signature from the user does not verify.
    #[error("{0}")]
    SignatureVerification(String),

    /// The requester does not own the resource.
    #[error("{0}")]
    Unauthorized(String),

    /// The resource does not exist.
    #[error("{0}")]
    NotFound(String),

    /// The resource is not in a state that allows the request.
    #[error("{0}")]
    InvalidState(String),

    /// The explorer refused to relay the transaction. The message is the explorer's own text.
    #[error("{0}")]
    BroadcastRejected(String),

    /// The coordinator could not sign all of its inputs.
    #[error("{0}")]
    PartialSignFailure(String),

    /// The store failed or holds data that cannot be decoded.
    #[error("storage error: {0}")]
    Storage(String),
}

impl CoordinatorError {
    /// The status code reported for this error.
    pub const fn status_code(&self) -> u16 {
        match self {
            CoordinatorError::Validation(_)
            | CoordinatorError::InsufficientFunds(_)
            | CoordinatorError::InvalidState(_)
            | CoordinatorError::BroadcastRejected(_) => 400,
            CoordinatorError::SignatureVerification(_) => 401,
            CoordinatorError::Unauthorized(_) => 403,
            CoordinatorError::NotFound(_) => 404,
            CoordinatorError::Configuration(_)
            | CoordinatorError::ExternalLookup(_)
            | CoordinatorError::PartialSignFailure(_)
            | CoordinatorError::Storage(_) => 500,
        }
    }
}

/// Result type alias for [`CoordinatorError`].
pub type CoordinatorResult<T> = Result<T, CoordinatorError>;

impl From<KeyError> for CoordinatorError {
    fn from(err: KeyError) -> Self {
        CoordinatorError::Validation(err.to_string())
    }
}

impl From<ParamsError> for CoordinatorError {
    fn from(err: ParamsError) -> Self {
        CoordinatorError::Validation(err.to_string())
    }
}

impl From<TxBuilderError> for CoordinatorError {
    fn from(err: TxBuilderError) -> Self {
        CoordinatorError::Validation(err.to_string())
    }
}

impl From<ChainError> for CoordinatorError {
    fn from(err: ChainError) -> Self {
        match err {
            ChainError::BroadcastRejected { message, .. } => {
                CoordinatorError::BroadcastRejected(message)
            }
            err if err.is_client_error() => CoordinatorError::Validation(err.to_string()),
            err => CoordinatorError::ExternalLookup(err.to_string()),
        }
    }
}

impl From<LocateError> for CoordinatorError {
    fn from(err: LocateError) -> Self {
        match err {
            LocateError::DepositNotFound { .. } => {
                CoordinatorError::InsufficientFunds(err.to_string())
            }
            LocateError::Chain(err) => err.into(),
        }
    }
}

impl From<AssembleError> for CoordinatorError {
    fn from(err: AssembleError) -> Self {
        match err {
            AssembleError::InsufficientFunds { .. } => {
                CoordinatorError::InsufficientFunds(err.to_string())
            }
            AssembleError::AmountOverflow(_) => CoordinatorError::ExternalLookup(err.to_string()),
            AssembleError::TxBuilder(_) | AssembleError::Psbt(_) => {
                CoordinatorError::Validation(err.to_string())
            }
        }
    }
}

impl From<FinalizeError> for CoordinatorError {
    fn from(err: FinalizeError) -> Self {
        CoordinatorError::Validation(err.to_string())
    }
}

impl From<SignerError> for CoordinatorError {
    fn from(err: SignerError) -> Self {
        match err {
            SignerError::PartialSignFailure { .. } => {
                CoordinatorError::PartialSignFailure(err.to_string())
            }
            SignerError::InvalidSeed | SignerError::Derivation(_) => {
                CoordinatorError::Configuration(err.to_string())
            }
            SignerError::Sighash(_) => CoordinatorError::Validation(err.to_string()),
        }
    }
}

impl From<PreimageError> for CoordinatorError {
    fn from(err: PreimageError) -> Self {
        CoordinatorError::Configuration(err.to_string())
    }
}

impl From<StakeError> for CoordinatorError {
    fn from(err: StakeError) -> Self {
        match err {
            StakeError::InvalidStakeId(_)
            | StakeError::InvalidAmount(_)
            | StakeError::UnknownPeriod(_)
            | StakeError::MessageMismatch
            | StakeError::StaleTimestamp
            | StakeError::InvalidAddress(_) => CoordinatorError::Validation(err.to_string()),
            StakeError::InvalidSignature => {
                CoordinatorError::SignatureVerification(err.to_string())
            }
            StakeError::NotOwner => CoordinatorError::Unauthorized(err.to_string()),
            StakeError::NotFound(_) => CoordinatorError::NotFound(err.to_string()),
            StakeError::NotRedeemable(_)
            | StakeError::InvalidTransition { .. }
            | StakeError::InvalidHtlcTransition { .. } => {
                CoordinatorError::InvalidState(err.to_string())
            }
            StakeError::Corrupted { .. } | StakeError::Db(_) => {
                CoordinatorError::Storage(err.to_string())
            }
        }
    }
}

impl From<TransferError> for CoordinatorError {
    fn from(err: TransferError) -> Self {
        match err {
            TransferError::NotFound(_) | TransferError::Invalid(_) => {
                CoordinatorError::Validation(err.to_string())
            }
            TransferError::Unavailable(_) => CoordinatorError::ExternalLookup(err.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use bitcoin::Amount;
    use gbpl_custody_stake::record::StakeStatus;

    use super::*;

    #[test]
    fn test_status_codes() {
        let cases = [
            (CoordinatorError::from(KeyError::InvalidHex("txid")), 400),
            (
                AssembleError::InsufficientFunds {
                    required: Amount::from_sat(1_800),
                    available: Amount::from_sat(100),
                }
                .into(),
                400,
            ),
            (AssembleError::AmountOverflow("summing fee utxos").into(), 500),
            (StakeError::InvalidSignature.into(), 401),
            (StakeError::NotOwner.into(), 403),
            (StakeError::NotFound("sig".to_string()).into(), 404),
            (StakeError::NotRedeemable(StakeStatus::Completed).into(), 400),
            (PreimageError::MissingRootSecret.into(), 500),
            (
                SignerError::PartialSignFailure {
                    signed: 1,
                    expected: 2,
                }
                .into(),
                500,
            ),
            (TransferError::Unavailable("down".to_string()).into(), 500),
        ];

        for (err, code) in cases {
            assert_eq!(err.status_code(), code, "{err:?}");
        }
    }

    #[test]
    fn test_broadcast_rejection_keeps_explorer_text() {
        let err = CoordinatorError::from(ChainError::BroadcastRejected {
            status: 400,
            message: "sendrawtransaction RPC error: non-BIP68-final".to_string(),
        });

        assert_eq!(
            err,
            CoordinatorError::BroadcastRejected(
                "sendrawtransaction RPC error: non-BIP68-final".to_string()
            )
        );
        assert_eq!(err.status_code(), 400);
        assert_eq!(err.to_string(), "sendrawtransaction RPC error: non-BIP68-final");
    }

    #[test]
    fn test_explorer_failures() {
        let missing = CoordinatorError::from(ChainError::HttpResponse {
            status: 404,
            message: "Transaction not found".to_string(),
        });
        assert_eq!(missing.status_code(), 400);

        let down = CoordinatorError::from(ChainError::HttpResponse {
            status: 503,
            message: "unavailable".to_string(),
        });
        assert!(matches!(down, CoordinatorError::ExternalLookup(_)));
    }
}
