//! The explorer's JSON representations of transactions and UTXOs.
//!
//! Field names follow the esplora API so that responses deserialize as is.

use bitcoin::{Amount, OutPoint, ScriptBuf, Txid};
use gbpl_custody_primitives::types::FeeUtxo;
use serde::{Deserialize, Serialize};

/// Confirmation status of a transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct TxStatus {
    /// Whether the transaction is in a block.
    pub confirmed: bool,

    /// Height of that block.
    #[serde(default)]
    pub block_height: Option<u64>,
}

/// An output of a transaction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExplorerTxOut {
    /// The locking script.
    pub scriptpubkey: ScriptBuf,

    /// The address encoding of [`Self::scriptpubkey`], if it has one.
    ///
    /// This is informative only. Matching is done on the script.
    #[serde(default)]
    pub scriptpubkey_address: Option<String>,

    /// Value of the output.
    #[serde(with = "bitcoin::amount::serde::as_sat")]
    pub value: Amount,
}

/// A transaction as reported by the explorer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExplorerTx {
    /// Id of the transaction.
    pub txid: Txid,

    /// Its outputs, in order.
    pub vout: Vec<ExplorerTxOut>,

    /// Where it is on the chain.
    pub status: TxStatus,
}

/// An unspent output of an address.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExplorerUtxo {
    /// Transaction that created the output.
    pub txid: Txid,

    /// Index of the output in that transaction.
    pub vout: u32,

    /// Value of the output.
    #[serde(with = "bitcoin::amount::serde::as_sat")]
    pub value: Amount,

    /// Confirmation status of the creating transaction.
    pub status: TxStatus,
}

impl ExplorerUtxo {
    /// The outpoint of this UTXO.
    pub const fn outpoint(&self) -> OutPoint {
        OutPoint {
            txid: self.txid,
            vout: self.vout,
        }
    }
}

impl From<ExplorerUtxo> for FeeUtxo {
    fn from(value: ExplorerUtxo) -> Self {
        FeeUtxo::new(value.outpoint(), value.value, value.status.confirmed)
    }
}
