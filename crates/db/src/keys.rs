//! Key layout of the store.

/// Global total of staked tokens, as a decimal counter.
pub const STAKE_TOTAL_KEY: &str = "stake:total:gbpl";

/// Set of record keys of the stakes whose collateral is not locked yet.
pub const STAKE_PENDING_BTC_KEY: &str = "stake:pending:btc";

/// List of token releases waiting for the network-2 releaser.
pub const RELEASE_QUEUE_KEY: &str = "stake:release:queue";

/// Key of the stake record created by `signature`.
pub fn stake_record(signature: &str) -> String {
    format!("stake:record:{signature}")
}

/// Key of the set of record keys owned by `address`.
pub fn user_stakes(address: &str) -> String {
    format!("stake:user:{address}")
}

/// Key of the hash from bitcoin public key to deposit txid for a stake.
pub fn btc_deposit_tx(stake_id: &str) -> String {
    format!("stake:btc-deposit-tx:{stake_id}")
}

/// Key of the final-lock txid of a deposit.
pub fn btc_final_tx(deposit_txid: &str) -> String {
    format!("stake:btc-final-tx:{deposit_txid}")
}

/// Key of the unsigned txid of the lock transaction assembled for a deposit.
pub fn btc_assembled_tx(deposit_txid: &str) -> String {
    format!("stake:btc-assembled-tx:{deposit_txid}")
}

/// Dedupe marker of a redemption.
pub fn processed_redeem(stake_id: &str) -> String {
    format!("processed_redeem:{stake_id}")
}
