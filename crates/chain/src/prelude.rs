//! Re-exports of the chain access types.

pub use crate::{
    errors::{ChainError, ChainResult, LocateError},
    esplora::{EsploraConfig, EsploraReader},
    locator::locate_deposit,
    traits::ChainReader,
    types::{ExplorerTx, ExplorerTxOut, ExplorerUtxo, TxStatus},
};
