//! In-process stand-ins for the token network.

use std::collections::HashMap;

use async_trait::async_trait;
use ethnum::U256;
use gbpl_custody_stake::{
    errors::TransferError,
    record::StakeRecord,
    traits::{TokenVault, TransferVerifier, VerifiedTransfer},
};
use parking_lot::Mutex;

/// A [`TransferVerifier`] that knows a fixed set of transfers.
#[derive(Debug, Default)]
pub struct StaticTransferVerifier {
    transfers: Mutex<HashMap<String, VerifiedTransfer>>,
    calls: Mutex<usize>,
}

impl StaticTransferVerifier {
    /// Creates a verifier that knows no transfers.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a transfer of `amount` by `owner` under `signature`.
    pub fn with_transfer(self, signature: &str, owner: &str, amount: U256) -> Self {
        self.transfers.lock().insert(
            signature.to_string(),
            VerifiedTransfer {
                signature: signature.to_string(),
                amount,
                owner: owner.to_string(),
            },
        );

        self
    }

    /// How many times a transfer was looked up.
    pub fn calls(&self) -> usize {
        *self.calls.lock()
    }
}

#[async_trait]
impl TransferVerifier for StaticTransferVerifier {
    async fn verify_transfer(
        &self,
        signature: &str,
        owner: &str,
    ) -> Result<VerifiedTransfer, TransferError> {
        *self.calls.lock() += 1;

        let transfer = self
            .transfers
            .lock()
            .get(signature)
            .cloned()
            .ok_or_else(|| TransferError::NotFound(signature.to_string()))?;

        if transfer.owner != owner {
            return Err(TransferError::Invalid(format!(
                "transfer was not made by {owner}"
            )));
        }

        Ok(transfer)
    }
}

/// A [`TokenVault`] that records the stakes it released.
#[derive(Debug, Default)]
pub struct RecordingVault {
    released: Mutex<Vec<String>>,
    failure: Option<TransferError>,
}

impl RecordingVault {
    /// Creates a vault whose releases succeed.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a vault whose releases fail with `error`.
    pub fn failing(error: TransferError) -> Self {
        Self {
            released: Mutex::default(),
            failure: Some(error),
        }
    }

    /// Ids of the stakes released so far.
    pub fn released(&self) -> Vec<String> {
        self.released.lock().clone()
    }
}

#[async_trait]
impl TokenVault for RecordingVault {
    async fn release(&self, record: &StakeRecord) -> Result<String, TransferError> {
        if let Some(error) = &self.failure {
            return Err(error.clone());
        }

        self.released.lock().push(record.id().to_string());

        Ok(format!("release-{}", record.id()))
    }
}
