//! References to on-chain outputs that the coordinator spends.

use bitcoin::{Amount, OutPoint, Txid};
use serde::{Deserialize, Serialize};

/// A user's deposit output, resolved from the chain.
///
/// This is never taken from client input directly; it is only ever produced by looking up the
/// deposit transaction and matching its outputs against the recomputed deposit address.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DepositRef {
    /// The deposit transaction.
    pub txid: Txid,

    /// Index of the output paying to the deposit address.
    pub vout: u32,

    /// Value of that output.
    pub amount: Amount,
}

impl DepositRef {
    /// The outpoint of the deposit output.
    pub const fn outpoint(&self) -> OutPoint {
        OutPoint {
            txid: self.txid,
            vout: self.vout,
        }
    }
}

/// An unspent output of the coordinator's funding address.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FeeUtxo {
    /// Where the output lives.
    pub outpoint: OutPoint,

    /// Its value.
    pub amount: Amount,

    /// Whether the explorer has seen it in a block.
    pub confirmed: bool,
}

impl FeeUtxo {
    /// Creates a new [`FeeUtxo`].
    pub const fn new(outpoint: OutPoint, amount: Amount, confirmed: bool) -> Self {
        Self {
            outpoint,
            amount,
            confirmed,
        }
    }
}
