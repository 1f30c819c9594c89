//! Types for the RPC server.
//!
//! Requests carry client input as submitted (hex strings, base64 PSBTs) so that parsing errors
//! are reported by the coordinator with its own error taxonomy.

use gbpl_custody_stake::record::StakeRecord;
use serde::{Deserialize, Serialize};

/// Request to build a deposit address.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DepositAddressRequest {
    /// The user's public key, compressed or x-only, hex encoded.
    pub user_pubkey_hex: String,

    /// Network the address is for. Must match the coordinator's network if set.
    #[serde(default)]
    pub network: Option<String>,

    /// `taproot` or `segwitV0`. Defaults to the configured deposit address kind.
    #[serde(default)]
    pub address_kind: Option<String>,
}

/// A deposit address and the script behind it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DepositAddressResponse {
    /// The address the user pays their collateral to.
    pub address: String,

    /// The deposit script, hex encoded.
    pub script_hex: String,

    /// The deposit script in ASM form.
    pub script_asm: String,

    /// The output type of the address.
    pub address_kind: String,
}

/// Request to assemble the lock transaction of a stake.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssembleLockRequest {
    /// The stake the deposit belongs to.
    pub stake_id: String,

    /// The key the user funded the deposit address with.
    pub user_pubkey_hex: String,

    /// The HTLC hash of the stake, hex encoded.
    pub htlc_hash: String,

    /// The transaction that pays to the deposit address.
    pub deposit_tx_id: String,

    /// Relative timelock in blocks on the user-only branch of the final-lock output.
    pub csv_blocks: u16,

    /// Network of the deposit. Must match the coordinator's network if set.
    #[serde(default)]
    pub network: Option<String>,
}

/// An assembled lock transaction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssembleLockResponse {
    /// Always `true`.
    pub success: bool,

    /// The PSBT with the coordinator's fee inputs signed.
    pub psbt_base64: String,
}

/// Request to finalize and broadcast a lock transaction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FinalizeLockRequest {
    /// The stake the deposit belongs to.
    pub stake_id: String,

    /// The transaction that pays to the deposit address.
    pub deposit_tx_id: String,

    /// The PSBT signed by the user, base64 encoded.
    pub psbt: String,

    /// Network of the deposit. Must match the coordinator's network if set.
    #[serde(default)]
    pub network: Option<String>,
}

/// A broadcast lock transaction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FinalizeLockResponse {
    /// Always `true`.
    pub success: bool,

    /// Id of the lock transaction.
    pub txid: String,
}

/// The coordinator key and what is known about a stake's bitcoin transactions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StakeBtcMetaResponse {
    /// Always `true`.
    pub success: bool,

    /// The coordinator's public key, compressed and hex encoded.
    pub pubkey_hex: String,

    /// Whether a deposit transaction has been recorded.
    pub has_tx: bool,

    /// The recorded deposit transaction.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub txid: Option<String>,

    /// The lock transaction that spent the deposit.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub final_txid: Option<String>,
}

/// Request to record a deposit transaction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SaveDepositTxRequest {
    /// The stake the deposit belongs to.
    pub stake_id: String,

    /// The key the user funded the deposit address with.
    pub btc_pubkey: String,

    /// The deposit transaction, 64 hex characters.
    pub txid: String,
}

/// A response that only reports success.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SuccessResponse {
    /// Always `true`.
    pub success: bool,
}

/// Request to create a stake.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateStakeRequest {
    /// The token-network address that paid into the vault.
    pub user_address: String,

    /// Signature of the transfer into the vault. Becomes the stake id.
    pub signature: String,

    /// `3m` or `6m`.
    pub stake_period: String,
}

/// A created stake.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateStakeResponse {
    /// Always `true`.
    pub success: bool,

    /// Set if the stake existed before the request.
    pub already_processed: bool,

    /// The stake.
    pub stake_record: StakeRecord,
}

/// Request to redeem a stake.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RedeemStakeRequest {
    /// The stake to redeem.
    pub stake_id: String,

    /// The owner's token-network address.
    pub user_address: String,

    /// Base64 ed25519 signature over `message`.
    pub signature: String,

    /// The signed redeem message.
    pub message: String,

    /// Milliseconds since the unix epoch, as embedded in `message`.
    pub timestamp: i64,
}

/// A redeemed stake.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RedeemStakeResponse {
    /// Always `true`.
    pub success: bool,

    /// Set if the stake had been redeemed before the request.
    pub already_processed: bool,

    /// The redeemed stake.
    pub stake_id: String,

    /// Tokens released back to the owner, in base units.
    pub gbpl_amount_raw: String,

    /// Reference of the token release, if one was made by this request.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transfer_signature: Option<String>,
}

/// Stake listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StakesResponse {
    /// Always `true`.
    pub success: bool,

    /// Stakes whose collateral has not been locked yet.
    pub stakes: Vec<StakeRecord>,

    /// Length of `stakes`.
    pub count: usize,

    /// Tokens staked over all time, in base units.
    pub total_gbpl_staked: String,

    /// Stakes of the requested user.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_stakes: Option<Vec<StakeRecord>>,

    /// Length of `user_stakes`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_stakes_count: Option<usize>,
}
