//! Collaborators on the token network.

use std::fmt::Debug;

use async_trait::async_trait;
use ethnum::U256;

use crate::{errors::TransferError, record::StakeRecord};

/// A token transfer into the vault, as observed on the token network.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerifiedTransfer {
    /// The signature of the transfer transaction.
    pub signature: String,

    /// Amount the vault balance grew by, in base units.
    pub amount: U256,

    /// The address that owned the source token account.
    pub owner: String,
}

/// Looks up and validates token transfers into the vault.
#[async_trait]
pub trait TransferVerifier: Debug + Send + Sync {
    /// Verifies that the transaction `signature` moved tokens owned by `owner` into the vault.
    ///
    /// The returned amount is the one observed on chain, never one asserted by the client.
    async fn verify_transfer(
        &self,
        signature: &str,
        owner: &str,
    ) -> Result<VerifiedTransfer, TransferError>;
}

/// Pays staked tokens back to their owner.
#[async_trait]
pub trait TokenVault: Debug + Send + Sync {
    /// Releases the principal of `record` to its owner and returns the transfer signature.
    async fn release(&self, record: &StakeRecord) -> Result<String, TransferError>;
}
