//! The connectors can each be spent in two different ways depending on the witness data. This
//! module contains the tagged unions that represent those ways.

use bitcoin::{ecdsa, taproot};

/// A signature over a connector input.
///
/// Taproot outputs are spent with BIP-340 signatures while segwit v0 outputs need ECDSA ones.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectorSignature {
    /// Signature for a tapscript leaf.
    Schnorr(taproot::Signature),

    /// Signature for a segwit v0 witness script.
    Ecdsa(ecdsa::Signature),
}

impl ConnectorSignature {
    /// Serializes the signature as it appears on the witness stack, sighash flag included.
    pub fn to_vec(&self) -> Vec<u8> {
        match self {
            ConnectorSignature::Schnorr(sig) => sig.to_vec(),
            ConnectorSignature::Ecdsa(sig) => sig.to_vec(),
        }
    }
}

impl From<taproot::Signature> for ConnectorSignature {
    fn from(value: taproot::Signature) -> Self {
        Self::Schnorr(value)
    }
}

impl From<ecdsa::Signature> for ConnectorSignature {
    fn from(value: ecdsa::Signature) -> Self {
        Self::Ecdsa(value)
    }
}

/// Ways to spend a deposit output.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DepositSpendPath {
    /// Cooperative spend signed by both the coordinator and the user.
    Coordinator {
        /// The user's signature.
        user_signature: ConnectorSignature,

        /// The coordinator's signature.
        coordinator_signature: ConnectorSignature,
    },

    /// User-only spend, valid once the deposit timeout has passed.
    Timeout {
        /// The user's signature.
        user_signature: ConnectorSignature,
    },
}

impl DepositSpendPath {
    /// The elements that go on the witness stack below the script, bottom first.
    ///
    /// NOTE: Order matters here. The coordinator signature is checked first so it has to sit on
    /// top of the user's.
    pub fn stack(&self) -> Vec<Vec<u8>> {
        match self {
            DepositSpendPath::Coordinator {
                user_signature,
                coordinator_signature,
            } => vec![user_signature.to_vec(), coordinator_signature.to_vec()],
            DepositSpendPath::Timeout { user_signature } => vec![user_signature.to_vec()],
        }
    }
}

/// Ways to spend a final-lock output.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LockSpendPath {
    /// Spend that reveals the HTLC preimage along with the user's signature.
    Preimage {
        /// The user's signature.
        user_signature: ConnectorSignature,

        /// The 32-byte preimage of the HTLC hash.
        preimage: [u8; 32],
    },

    /// User-only spend, valid once the relative timelock has passed.
    Csv {
        /// The user's signature.
        user_signature: ConnectorSignature,
    },
}

impl LockSpendPath {
    /// The elements that go on the witness stack below the script, bottom first.
    pub fn stack(&self) -> Vec<Vec<u8>> {
        match self {
            LockSpendPath::Preimage {
                user_signature,
                preimage,
            } => vec![user_signature.to_vec(), preimage.to_vec()],
            LockSpendPath::Csv { user_signature } => vec![user_signature.to_vec()],
        }
    }
}
