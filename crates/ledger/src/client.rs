//! [`TransferVerifier`] backed by a Solana JSON-RPC node.

use std::time::Duration;

use async_trait::async_trait;
use ethnum::U256;
use gbpl_custody_stake::{
    errors::TransferError,
    traits::{TransferVerifier, VerifiedTransfer},
};
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde_json::json;
use tracing::{debug, info, trace};

use crate::{
    errors::LedgerError,
    types::{EncodedTransaction, RpcRequest, RpcResponse, TokenBalance},
};

/// Connection settings for a [`SolanaTransferVerifier`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LedgerConfig {
    /// JSON-RPC endpoint, e.g. `https://api.devnet.solana.com`.
    pub rpc_url: String,

    /// The vault's token account that stakes are paid into.
    pub vault_token_account: String,

    /// Deadline for a single request.
    pub timeout: Duration,
}

/// Verifies stake transfers by reading confirmed transactions from a Solana node.
#[derive(Debug, Clone)]
pub struct SolanaTransferVerifier {
    client: Client,
    rpc_url: String,
    vault_token_account: String,
}

impl SolanaTransferVerifier {
    /// Creates a new [`SolanaTransferVerifier`].
    pub fn new(config: &LedgerConfig) -> Result<Self, LedgerError> {
        let client = Client::builder().timeout(config.timeout).build()?;

        Ok(Self {
            client,
            rpc_url: config.rpc_url.clone(),
            vault_token_account: config.vault_token_account.clone(),
        })
    }

    async fn call<T: DeserializeOwned>(
        &self,
        method: &str,
        params: serde_json::Value,
    ) -> Result<Option<T>, LedgerError> {
        trace!(%method, "calling ledger");

        let response: RpcResponse<T> = self
            .client
            .post(&self.rpc_url)
            .json(&RpcRequest::new(method, params))
            .send()
            .await?
            .error_for_status()?
            .json()
            .await
            .map_err(|e| LedgerError::UnexpectedResponse(format!("{method}: {e}")))?;

        if let Some(error) = response.error {
            return Err(LedgerError::Rpc {
                code: error.code,
                message: error.message,
            });
        }

        Ok(response.result)
    }

    /// Fetches the confirmed transaction with `signature`.
    pub async fn get_transaction(&self, signature: &str) -> Result<EncodedTransaction, LedgerError> {
        let params = json!([
            signature,
            {
                "commitment": "confirmed",
                "encoding": "json",
                "maxSupportedTransactionVersion": 0,
            }
        ]);

        self.call("getTransaction", params)
            .await?
            .ok_or_else(|| LedgerError::TransactionNotFound(signature.to_string()))
    }
}

#[async_trait]
impl TransferVerifier for SolanaTransferVerifier {
    async fn verify_transfer(
        &self,
        signature: &str,
        owner: &str,
    ) -> Result<VerifiedTransfer, TransferError> {
        let tx = self.get_transaction(signature).await?;
        let amount = vault_deposit(&tx, &self.vault_token_account, owner)?;

        info!(%signature, %owner, %amount, "verified transfer into vault");

        Ok(VerifiedTransfer {
            signature: signature.to_string(),
            amount,
            owner: owner.to_string(),
        })
    }
}

/// How much `owner` transferred into the token account `vault` in `tx`.
///
/// The amount is the growth of the vault balance. The transfer counts as made by `owner` if a
/// token account of the same mint owned by `owner` lost balance in the same transaction.
pub fn vault_deposit(tx: &EncodedTransaction, vault: &str, owner: &str) -> Result<U256, LedgerError> {
    let meta = tx
        .meta
        .as_ref()
        .ok_or_else(|| LedgerError::UnexpectedResponse("transaction has no meta".to_string()))?;

    if meta.err.as_ref().is_some_and(|err| !err.is_null()) {
        return Err(LedgerError::TransactionFailed(format!("{:?}", meta.err)));
    }

    let vault_index = tx
        .account_keys()
        .iter()
        .position(|key| *key == vault)
        .ok_or(LedgerError::VaultNotInTransaction)?;

    let find = |balances: &[TokenBalance], index: usize| {
        balances
            .iter()
            .find(|balance| balance.account_index == index)
            .cloned()
    };

    let (Some(vault_pre), Some(vault_post)) = (
        find(&meta.pre_token_balances, vault_index),
        find(&meta.post_token_balances, vault_index),
    ) else {
        return Err(LedgerError::VaultBalanceMissing);
    };

    let pre = parse_amount(&vault_pre.ui_token_amount.amount)?;
    let post = parse_amount(&vault_post.ui_token_amount.amount)?;
    let amount = match post.checked_sub(pre) {
        Some(amount) if amount > U256::ZERO => amount,
        _ => return Err(LedgerError::NothingTransferred),
    };

    let mut paid_by_owner = false;
    for source in &meta.pre_token_balances {
        if source.account_index == vault_index
            || source.mint != vault_post.mint
            || source.owner.as_deref() != Some(owner)
        {
            continue;
        }

        let before = parse_amount(&source.ui_token_amount.amount)?;
        let after = match find(&meta.post_token_balances, source.account_index) {
            Some(balance) => parse_amount(&balance.ui_token_amount.amount)?,
            None => U256::ZERO,
        };

        if after < before {
            paid_by_owner = true;
            break;
        }
    }

    if !paid_by_owner {
        debug!(%owner, "no token account of the owner paid into the vault");
        return Err(LedgerError::OwnerMismatch(owner.to_string()));
    }

    Ok(amount)
}

fn parse_amount(raw: &str) -> Result<U256, LedgerError> {
    U256::from_str_radix(raw, 10).map_err(|_| LedgerError::InvalidAmount(raw.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    const VAULT: &str = "Vau1tTokenAccount11111111111111111111111111";
    const OWNER: &str = "9xQeWvG816bUx9EPjHmaT23yvVM2ZWbrrpZb9PusVFin";
    const MINT: &str = "GbpLMint11111111111111111111111111111111111";

    fn balance(index: usize, owner: &str, amount: &str) -> serde_json::Value {
        json!({
            "accountIndex": index,
            "mint": MINT,
            "owner": owner,
            "uiTokenAmount": { "amount": amount, "decimals": 6, "uiAmountString": "0" }
        })
    }

    fn tx(err: serde_json::Value, pre: serde_json::Value, post: serde_json::Value) -> EncodedTransaction {
        let response = json!({
            "jsonrpc": "2.0",
            "id": 1,
            "result": {
                "slot": 1,
                "meta": {
                    "err": err,
                    "fee": 5000,
                    "preTokenBalances": pre,
                    "postTokenBalances": post,
                    "loadedAddresses": { "writable": [VAULT], "readonly": [] }
                },
                "transaction": {
                    "signatures": ["sig"],
                    "message": { "accountKeys": [OWNER, "UserTokenAccount", "TokenProgram"] }
                }
            }
        });

        serde_json::from_value::<RpcResponse<EncodedTransaction>>(response)
            .unwrap()
            .result
            .unwrap()
    }

    #[test]
    fn test_transfer_into_vault() {
        let tx = tx(
            serde_json::Value::Null,
            json!([balance(1, OWNER, "5000000"), balance(3, "vault-owner", "100")]),
            json!([balance(1, OWNER, "1000000"), balance(3, "vault-owner", "4000100")]),
        );

        assert_eq!(tx.account_keys()[3], VAULT);
        assert_eq!(vault_deposit(&tx, VAULT, OWNER).unwrap(), U256::from(4_000_000u32));
    }

    #[test]
    fn test_rejections() {
        let pre = json!([balance(1, OWNER, "5000000"), balance(3, "vault-owner", "100")]);
        let post = json!([balance(1, OWNER, "1000000"), balance(3, "vault-owner", "4000100")]);

        let failed = tx(json!({ "InstructionError": [0, "Custom"] }), pre.clone(), post.clone());
        assert!(matches!(
            vault_deposit(&failed, VAULT, OWNER),
            Err(LedgerError::TransactionFailed(_))
        ));

        let ok = tx(serde_json::Value::Null, pre.clone(), post.clone());
        assert!(matches!(
            vault_deposit(&ok, "SomeOtherAccount", OWNER),
            Err(LedgerError::VaultNotInTransaction)
        ));
        assert!(matches!(
            vault_deposit(&ok, VAULT, "someone-else"),
            Err(LedgerError::OwnerMismatch(_))
        ));

        let outflow = tx(serde_json::Value::Null, post, pre);
        assert!(matches!(
            vault_deposit(&outflow, VAULT, OWNER),
            Err(LedgerError::NothingTransferred)
        ));

        let no_balance = tx(
            serde_json::Value::Null,
            json!([balance(1, OWNER, "5000000")]),
            json!([balance(1, OWNER, "1000000")]),
        );
        assert!(matches!(
            vault_deposit(&no_balance, VAULT, OWNER),
            Err(LedgerError::VaultBalanceMissing)
        ));
    }

    #[test]
    fn test_missing_transaction_and_rpc_errors() {
        let missing: RpcResponse<EncodedTransaction> =
            serde_json::from_value(json!({ "jsonrpc": "2.0", "id": 1, "result": null })).unwrap();
        assert!(missing.result.is_none());
        assert!(missing.error.is_none());

        let failed: RpcResponse<EncodedTransaction> = serde_json::from_value(json!({
            "jsonrpc": "2.0",
            "id": 1,
            "error": { "code": -32602, "message": "Invalid param: WrongSize" }
        }))
        .unwrap();
        assert_eq!(failed.error.unwrap().code, -32602);
    }

    #[test]
    fn test_error_classification() {
        assert!(matches!(
            TransferError::from(LedgerError::TransactionNotFound("s".to_string())),
            TransferError::NotFound(_)
        ));
        assert!(matches!(
            TransferError::from(LedgerError::OwnerMismatch("o".to_string())),
            TransferError::Invalid(_)
        ));
        assert!(matches!(
            TransferError::from(LedgerError::UnexpectedResponse("x".to_string())),
            TransferError::Unavailable(_)
        ));
    }
}
