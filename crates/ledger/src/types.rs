//! The parts of Solana JSON-RPC responses the client reads.

use serde::{Deserialize, Serialize};

/// A JSON-RPC request.
#[derive(Debug, Clone, Serialize)]
pub struct RpcRequest<'a, P> {
    /// Always `"2.0"`.
    pub jsonrpc: &'static str,

    /// Request id.
    pub id: u64,

    /// Method name.
    pub method: &'a str,

    /// Positional parameters.
    pub params: P,
}

impl<'a, P> RpcRequest<'a, P> {
    /// Creates a new request with id 1.
    pub const fn new(method: &'a str, params: P) -> Self {
        Self {
            jsonrpc: "2.0",
            id: 1,
            method,
            params,
        }
    }
}

/// A JSON-RPC response.
#[derive(Debug, Clone, Deserialize)]
pub struct RpcResponse<T> {
    /// Present on success. `null` results deserialize to `None` for optional `T`.
    pub result: Option<T>,

    /// Present on failure.
    pub error: Option<RpcErrorObject>,
}

/// A JSON-RPC error.
#[derive(Debug, Clone, Deserialize)]
pub struct RpcErrorObject {
    /// Error code.
    pub code: i64,

    /// Error message.
    pub message: String,
}

/// Result of `getTransaction` with `json` encoding.
#[derive(Debug, Clone, Deserialize)]
pub struct EncodedTransaction {
    /// Execution metadata.
    pub meta: Option<TransactionMeta>,

    /// The transaction itself.
    pub transaction: TransactionBody,
}

/// Execution metadata of a transaction.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionMeta {
    /// Set if the transaction failed.
    #[serde(default)]
    pub err: Option<serde_json::Value>,

    /// Token balances before execution.
    #[serde(default)]
    pub pre_token_balances: Vec<TokenBalance>,

    /// Token balances after execution.
    #[serde(default)]
    pub post_token_balances: Vec<TokenBalance>,

    /// Accounts loaded from address lookup tables.
    #[serde(default)]
    pub loaded_addresses: Option<LoadedAddresses>,
}

/// Accounts a versioned transaction loads from lookup tables.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct LoadedAddresses {
    /// Writable accounts, indexed after the static keys.
    #[serde(default)]
    pub writable: Vec<String>,

    /// Read-only accounts, indexed after the writable ones.
    #[serde(default)]
    pub readonly: Vec<String>,
}

/// The signed part of a transaction.
#[derive(Debug, Clone, Deserialize)]
pub struct TransactionBody {
    /// The message.
    pub message: TransactionMessage,
}

/// A transaction message.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionMessage {
    /// Static account keys.
    pub account_keys: Vec<String>,
}

/// The balance of one token account.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenBalance {
    /// Index of the token account in the transaction's account list.
    pub account_index: usize,

    /// The token mint.
    pub mint: String,

    /// Owner of the token account.
    #[serde(default)]
    pub owner: Option<String>,

    /// The balance.
    pub ui_token_amount: UiTokenAmount,
}

/// A token amount.
#[derive(Debug, Clone, Deserialize)]
pub struct UiTokenAmount {
    /// Amount in base units, as a decimal string.
    pub amount: String,
}

impl EncodedTransaction {
    /// All account keys in index order: static keys, then loaded writable and read-only ones.
    pub fn account_keys(&self) -> Vec<&str> {
        let loaded = self
            .meta
            .as_ref()
            .and_then(|meta| meta.loaded_addresses.as_ref());

        self.transaction
            .message
            .account_keys
            .iter()
            .chain(loaded.into_iter().flat_map(|l| l.writable.iter()))
            .chain(loaded.into_iter().flat_map(|l| l.readonly.iter()))
            .map(String::as_str)
            .collect()
    }
}
