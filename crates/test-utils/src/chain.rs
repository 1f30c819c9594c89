//! An in-process stand-in for the block explorer.

use std::collections::HashMap;

use async_trait::async_trait;
use bitcoin::{Address, Amount, OutPoint, ScriptBuf, Transaction, Txid};
use gbpl_custody_chain::{
    errors::{ChainError, ChainResult},
    traits::ChainReader,
    types::{ExplorerTx, ExplorerTxOut, ExplorerUtxo, TxStatus},
};
use parking_lot::Mutex;

/// What esplora relays back from bitcoind for a transaction it already has.
const ALREADY_KNOWN: &str = r#"sendrawtransaction RPC error: {"code":-27,"message":"Transaction already in block chain"}"#;

#[derive(Debug, Default)]
struct State {
    txs: HashMap<Txid, ExplorerTx>,
    utxos: HashMap<ScriptBuf, Vec<ExplorerUtxo>>,
    broadcasts: Vec<Transaction>,
    rejection: Option<String>,
}

/// A [`ChainReader`] over transactions and UTXOs registered by the test.
///
/// Unknown transactions are answered like esplora does, with a 404. Broadcast transactions become
/// known as unconfirmed, and broadcasting one again is rejected like bitcoind rejects it.
#[derive(Debug, Default)]
pub struct FakeChainReader {
    state: Mutex<State>,
}

impl FakeChainReader {
    /// Creates an empty chain.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a confirmed transaction with the given outputs.
    pub fn add_tx(&self, txid: Txid, outputs: impl IntoIterator<Item = (ScriptBuf, Amount)>) {
        let vout = outputs
            .into_iter()
            .map(|(scriptpubkey, value)| ExplorerTxOut {
                scriptpubkey,
                scriptpubkey_address: None,
                value,
            })
            .collect();

        let tx = ExplorerTx {
            txid,
            vout,
            status: TxStatus {
                confirmed: true,
                block_height: Some(100),
            },
        };

        self.state.lock().txs.insert(txid, tx);
    }


    /// Registers a confirmed UTXO of `address`.
    pub fn add_utxo(&self, address: &Address, outpoint: OutPoint, value: Amount) {
        let utxo = ExplorerUtxo {
            txid: outpoint.txid,
            vout: outpoint.vout,
            value,
            status: TxStatus {
                confirmed: true,
                block_height: Some(100),
            },
        };

        self.state
            .lock()
            .utxos
            .entry(address.script_pubkey())
            .or_default()
            .push(utxo);
    }

    /// Makes every following broadcast fail with `message`.
    pub fn reject_broadcasts(&self, message: &str) {
        self.state.lock().rejection = Some(message.to_string());
    }

    /// The transactions broadcast so far.
    pub fn broadcasts(&self) -> Vec<Transaction> {
        self.state.lock().broadcasts.clone()
    }
}

#[async_trait]
impl ChainReader for FakeChainReader {
    async fn get_transaction(&self, txid: &Txid) -> ChainResult<ExplorerTx> {
        self.state
            .lock()
            .txs
            .get(txid)
            .cloned()
            .ok_or_else(|| ChainError::HttpResponse {
                status: 404,
                message: "Transaction not found".to_string(),
            })
    }

    async fn get_utxos(&self, address: &Address) -> ChainResult<Vec<ExplorerUtxo>> {
        Ok(self
            .state
            .lock()
            .utxos
            .get(&address.script_pubkey())
            .cloned()
            .unwrap_or_default())
    }

    async fn get_tip_height(&self) -> ChainResult<u64> {
        Ok(100)
    }

    async fn broadcast(&self, tx: &Transaction) -> ChainResult<Txid> {
        let mut state = self.state.lock();

        if let Some(message) = &state.rejection {
            return Err(ChainError::BroadcastRejected {
                status: 400,
                message: message.clone(),
            });
        }

        let txid = tx.compute_txid();
        if state.txs.contains_key(&txid) {
            return Err(ChainError::BroadcastRejected {
                status: 400,
                message: ALREADY_KNOWN.to_string(),
            });
        }

        state.txs.insert(txid, unconfirmed(tx));
        state.broadcasts.push(tx.clone());

        Ok(txid)
    }
}

fn unconfirmed(tx: &Transaction) -> ExplorerTx {
    ExplorerTx {
        txid: tx.compute_txid(),
        vout: tx
            .output
            .iter()
            .map(|output| ExplorerTxOut {
                scriptpubkey: output.script_pubkey.clone(),
                scriptpubkey_address: None,
                value: output.value,
            })
            .collect(),
        status: TxStatus {
            confirmed: false,
            block_height: None,
        },
    }
}
