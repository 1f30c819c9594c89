//! Errors for the custody parameters.

use thiserror::Error;

/// Error while parsing or validating a parameter.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParamsError {
    /// The network name is not one of the supported networks.
    #[error("unsupported bitcoin network: {0}")]
    UnknownNetwork(String),

    /// The address kind is not one of the supported output types.
    #[error("unsupported address kind: {0}")]
    UnknownAddressKind(String),
}
