//! Token releases handed off to the network-2 releaser through the store.

use async_trait::async_trait;
use gbpl_custody_stake::{
    errors::TransferError, record::StakeRecord, repo::StakeRepo, traits::TokenVault,
};
use serde::{Deserialize, Serialize};
use tracing::info;

/// A request for the releaser to pay a stake's tokens back to its owner.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReleaseRequest {
    /// The redeemed stake.
    pub stake_id: String,

    /// Recipient of the tokens.
    pub user_address: String,

    /// Amount in base units, base-10.
    pub gbpl_amount_raw: String,
}

impl From<&StakeRecord> for ReleaseRequest {
    fn from(record: &StakeRecord) -> Self {
        Self {
            stake_id: record.id().to_string(),
            user_address: record.user_address().to_string(),
            gbpl_amount_raw: record.gbpl_amount_raw().to_string(),
        }
    }
}

/// A [`TokenVault`] that queues releases for an external releaser holding the vault key.
///
/// The returned reference is the position of the request in the queue.
#[derive(Debug, Clone)]
pub struct ReleaseQueue {
    repo: StakeRepo,
}

impl ReleaseQueue {
    /// Creates a new [`ReleaseQueue`].
    pub const fn new(repo: StakeRepo) -> Self {
        Self { repo }
    }
}

#[async_trait]
impl TokenVault for ReleaseQueue {
    async fn release(&self, record: &StakeRecord) -> Result<String, TransferError> {
        let request = serde_json::to_string(&ReleaseRequest::from(record))
            .map_err(|e| TransferError::Invalid(e.to_string()))?;

        let position = self
            .repo
            .enqueue_release(&request)
            .await
            .map_err(|e| TransferError::Unavailable(e.to_string()))?;

        info!(stake_id = %record.id(), %position, "queued token release");

        Ok(format!("queued:{position}"))
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use gbpl_custody_db::{inmemory::InMemoryStore, keys::RELEASE_QUEUE_KEY, store::KvStore};

    use super::*;
    use crate::test_utils::stake_record;

    #[tokio::test]
    async fn test_release_is_queued_in_order() {
        let store = Arc::new(InMemoryStore::new());
        let queue = ReleaseQueue::new(StakeRepo::new(store.clone()));

        let first = queue.release(&stake_record("Zmlyc3Q=")).await.unwrap();
        let second = queue.release(&stake_record("c2Vjb25k")).await.unwrap();

        assert_eq!(first, "queued:1");
        assert_eq!(second, "queued:2");

        let queued = store.lrange(RELEASE_QUEUE_KEY).await.unwrap();
        let requests = queued
            .iter()
            .map(|raw| serde_json::from_str::<ReleaseRequest>(raw).unwrap())
            .collect::<Vec<_>>();

        assert_eq!(requests[0].stake_id, "Zmlyc3Q=");
        assert_eq!(requests[1].stake_id, "c2Vjb25k");
        assert_eq!(requests[1].gbpl_amount_raw, "1000000000");
        assert!(queued[0].contains("\"gbplAmountRaw\":\"1000000000\""));
    }
}
