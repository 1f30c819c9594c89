//! The interface to the chain that the rest of the workspace depends on.

use std::fmt::Debug;

use async_trait::async_trait;
use bitcoin::{Address, Transaction, Txid};

use crate::{
    errors::ChainResult,
    types::{ExplorerTx, ExplorerUtxo},
};

/// Thin client over a block explorer.
///
/// Implementations are expected to bound every call with a deadline. Reads may be retried, but a
/// broadcast must be attempted at most once per call.
#[async_trait]
pub trait ChainReader: Debug + Send + Sync {
    /// Fetches a transaction along with its confirmation status.
    async fn get_transaction(&self, txid: &Txid) -> ChainResult<ExplorerTx>;

    /// Lists the unspent outputs paying to `address`, in the order the explorer lists them.
    async fn get_utxos(&self, address: &Address) -> ChainResult<Vec<ExplorerUtxo>>;

    /// Height of the explorer's best block.
    async fn get_tip_height(&self) -> ChainResult<u64>;

    /// Relays a fully signed transaction and returns its txid.
    async fn broadcast(&self, tx: &Transaction) -> ChainResult<Txid>;
}
