//! Typed access to stake records and the indexes around them.

use std::{str::FromStr, sync::Arc};

use bitcoin::Txid;
use ethnum::U256;
use gbpl_custody_db::{
    keys::{self, RELEASE_QUEUE_KEY, STAKE_PENDING_BTC_KEY, STAKE_TOTAL_KEY},
    store::KvStore,
};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::{
    errors::StakeError,
    record::{StakeRecord, StakeStatus},
};

/// Value of a redeem claim whose token release has not completed.
const REDEEM_CLAIMED: &str = "claimed";

/// What the coordinator remembers about the lock transaction it assembled for a deposit.
///
/// A finalize request must carry exactly this transaction; the user key is needed to rebuild the
/// deposit script when completing the witness of the deposit input.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssembledLock {
    /// The stake the lock transaction was assembled for.
    pub stake_id: String,

    /// Unsigned txid of the lock transaction.
    pub lock_txid: Txid,

    /// The user's bitcoin public key, hex encoded as submitted.
    pub user_pubkey: String,
}

/// Outcome of [`StakeRepo::insert`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Inserted {
    /// The record was written.
    Created(StakeRecord),

    /// A record with the same id already existed and is returned unchanged.
    Existing(StakeRecord),
}

impl Inserted {
    /// The stored record.
    pub fn record(&self) -> &StakeRecord {
        match self {
            Inserted::Created(record) | Inserted::Existing(record) => record,
        }
    }

    /// Whether the record had been stored before.
    pub const fn already_processed(&self) -> bool {
        matches!(self, Inserted::Existing(_))
    }
}

/// Stake records, their indexes and the bitcoin deposit index on top of a [`KvStore`].
#[derive(Debug, Clone)]
pub struct StakeRepo {
    store: Arc<dyn KvStore>,
}

impl StakeRepo {
    /// Creates a new [`StakeRepo`].
    pub fn new(store: Arc<dyn KvStore>) -> Self {
        Self { store }
    }

    /// Gets the record with `id`.
    pub async fn get(&self, id: &str) -> Result<Option<StakeRecord>, StakeError> {
        self.get_by_key(&keys::stake_record(id)).await
    }

    /// Gets the record with `id`, failing if there is none.
    pub async fn load(&self, id: &str) -> Result<StakeRecord, StakeError> {
        self.get(id)
            .await?
            .ok_or_else(|| StakeError::NotFound(id.to_string()))
    }

    async fn get_by_key(&self, key: &str) -> Result<Option<StakeRecord>, StakeError> {
        let Some(raw) = self.store.get(key).await? else {
            return Ok(None);
        };

        serde_json::from_str(&raw)
            .map(Some)
            .map_err(|e| StakeError::Corrupted {
                key: key.to_string(),
                reason: e.to_string(),
            })
    }

    async fn put(&self, record: &StakeRecord) -> Result<(), StakeError> {
        let key = keys::stake_record(record.id());
        let raw = encode(&key, record)?;

        self.store.set(&key, &raw).await?;

        Ok(())
    }

    /// Stores a new record unless one with the same id exists.
    ///
    /// The record key is claimed atomically, so of two concurrent inserts of the same id exactly
    /// one creates the record and updates the indexes and the global total.
    pub async fn insert(&self, record: StakeRecord) -> Result<Inserted, StakeError> {
        let key = keys::stake_record(record.id());
        let raw = encode(&key, &record)?;

        if !self.store.set_if_absent(&key, &raw).await? {
            debug!(stake_id = %record.id(), "stake already exists");
            let existing = self.load(record.id()).await?;

            return Ok(Inserted::Existing(existing));
        }

        self.store
            .sadd(&keys::user_stakes(record.user_address()), &key)
            .await?;
        if record.awaits_lock() {
            self.store.sadd(STAKE_PENDING_BTC_KEY, &key).await?;
        }
        let total = self
            .store
            .incr_by(STAKE_TOTAL_KEY, record.gbpl_amount_raw())
            .await?;

        info!(stake_id = %record.id(), amount = %record.gbpl_amount_raw(), %total, "stake created");

        Ok(Inserted::Created(record))
    }

    /// Marks the collateral of stake `id` as locked by `final_lock_txid`.
    pub async fn mark_locked(
        &self,
        id: &str,
        final_lock_txid: Txid,
    ) -> Result<StakeRecord, StakeError> {
        let mut record = self.load(id).await?;
        record.mark_locked(final_lock_txid)?;

        self.put(&record).await?;
        self.store
            .srem(STAKE_PENDING_BTC_KEY, &keys::stake_record(id))
            .await?;

        info!(stake_id = %id, %final_lock_txid, "stake collateral locked");

        Ok(record)
    }

    /// Marks `record` as redeemed and drops it from the user and pending indexes.
    ///
    /// The record itself is kept. The global total is not decremented. Completing a record that
    /// is already completed only drops it from the indexes again.
    pub async fn complete(&self, record: &mut StakeRecord) -> Result<(), StakeError> {
        let key = keys::stake_record(record.id());

        if record.status() != StakeStatus::Completed {
            record.complete()?;
            self.put(record).await?;
            info!(stake_id = %record.id(), "stake completed");
        }

        self.store
            .srem(&keys::user_stakes(record.user_address()), &key)
            .await?;
        self.store.srem(STAKE_PENDING_BTC_KEY, &key).await?;

        Ok(())
    }

    /// Claims the redemption of stake `id`. Returns `false` if it was claimed before.
    pub async fn claim_redeem(&self, id: &str) -> Result<bool, StakeError> {
        Ok(self
            .store
            .set_if_absent(&keys::processed_redeem(id), REDEEM_CLAIMED)
            .await?)
    }

    /// Records on the claim of stake `id` that its tokens were released under
    /// `transfer_signature`.
    pub async fn record_redeem_release(
        &self,
        id: &str,
        transfer_signature: &str,
    ) -> Result<(), StakeError> {
        self.store
            .set(&keys::processed_redeem(id), transfer_signature)
            .await?;

        Ok(())
    }

    /// The transfer that released the tokens of stake `id`, if the release went through.
    ///
    /// `None` while no claim exists or the claimed release has not completed.
    pub async fn redeem_release(&self, id: &str) -> Result<Option<String>, StakeError> {
        let claim = self.store.get(&keys::processed_redeem(id)).await?;

        Ok(claim.filter(|claim| claim != REDEEM_CLAIMED))
    }

    /// Gives up a claim taken with [`Self::claim_redeem`].
    pub async fn release_redeem_claim(&self, id: &str) -> Result<(), StakeError> {
        self.store.del(&keys::processed_redeem(id)).await?;

        Ok(())
    }

    /// Stakes whose collateral has not been locked yet.
    pub async fn pending_lock(&self) -> Result<Vec<StakeRecord>, StakeError> {
        let records = self.records_in(STAKE_PENDING_BTC_KEY).await?;

        Ok(records
            .into_iter()
            .filter(StakeRecord::awaits_lock)
            .collect())
    }

    /// The stakes in the index of `address`.
    pub async fn user_stakes(&self, address: &str) -> Result<Vec<StakeRecord>, StakeError> {
        self.records_in(&keys::user_stakes(address)).await
    }

    async fn records_in(&self, index: &str) -> Result<Vec<StakeRecord>, StakeError> {
        let mut records = Vec::new();

        for key in self.store.smembers(index).await? {
            match self.get_by_key(&key).await? {
                Some(record) => records.push(record),
                None => warn!(%index, %key, "index points at a missing stake record"),
            }
        }

        Ok(records)
    }

    /// Total amount ever staked.
    pub async fn total_staked(&self) -> Result<U256, StakeError> {
        match self.store.get(STAKE_TOTAL_KEY).await? {
            None => Ok(U256::ZERO),
            Some(raw) => U256::from_str_radix(&raw, 10).map_err(|e| StakeError::Corrupted {
                key: STAKE_TOTAL_KEY.to_string(),
                reason: e.to_string(),
            }),
        }
    }

    /// Records that the user with bitcoin key `btc_pubkey` funded stake `id` with `deposit_txid`.
    pub async fn save_deposit_tx(
        &self,
        id: &str,
        btc_pubkey: &str,
        deposit_txid: &Txid,
    ) -> Result<(), StakeError> {
        let txid = deposit_txid.to_string();

        self.store
            .sadd(&keys::user_stakes(btc_pubkey), &txid)
            .await?;
        self.store
            .hset(&keys::btc_deposit_tx(id), btc_pubkey, &txid)
            .await?;

        Ok(())
    }

    /// The deposit transaction the user with `btc_pubkey` sent for stake `id`.
    pub async fn deposit_tx(&self, id: &str, btc_pubkey: &str) -> Result<Option<Txid>, StakeError> {
        let key = keys::btc_deposit_tx(id);
        let raw = self.store.hget(&key, btc_pubkey).await?;

        raw.map(|raw| parse_txid(&key, &raw)).transpose()
    }

    /// The final-lock transaction that spent `deposit_txid`.
    pub async fn final_tx(&self, deposit_txid: &Txid) -> Result<Option<Txid>, StakeError> {
        self.get_txid(&keys::btc_final_tx(&deposit_txid.to_string()))
            .await
    }

    /// Records the final-lock transaction that spent `deposit_txid`.
    pub async fn set_final_tx(
        &self,
        deposit_txid: &Txid,
        final_txid: &Txid,
    ) -> Result<(), StakeError> {
        self.store
            .set(
                &keys::btc_final_tx(&deposit_txid.to_string()),
                &final_txid.to_string(),
            )
            .await?;

        Ok(())
    }

    /// The lock transaction last assembled for `deposit_txid`.
    pub async fn assembled_lock(
        &self,
        deposit_txid: &Txid,
    ) -> Result<Option<AssembledLock>, StakeError> {
        let key = keys::btc_assembled_tx(&deposit_txid.to_string());
        let Some(raw) = self.store.get(&key).await? else {
            return Ok(None);
        };

        serde_json::from_str(&raw)
            .map(Some)
            .map_err(|e| StakeError::Corrupted {
                key,
                reason: e.to_string(),
            })
    }

    /// Records the lock transaction assembled for `deposit_txid`, replacing any earlier one.
    pub async fn set_assembled_lock(
        &self,
        deposit_txid: &Txid,
        assembled: &AssembledLock,
    ) -> Result<(), StakeError> {
        let key = keys::btc_assembled_tx(&deposit_txid.to_string());
        let raw = serde_json::to_string(assembled).map_err(|e| StakeError::Corrupted {
            key: key.clone(),
            reason: e.to_string(),
        })?;

        self.store.set(&key, &raw).await?;

        Ok(())
    }

    /// Appends a token release request for the network-2 releaser.
    pub async fn enqueue_release(&self, request: &str) -> Result<usize, StakeError> {
        Ok(self.store.rpush(RELEASE_QUEUE_KEY, request).await?)
    }

    async fn get_txid(&self, key: &str) -> Result<Option<Txid>, StakeError> {
        let raw = self.store.get(key).await?;

        raw.map(|raw| parse_txid(key, &raw)).transpose()
    }
}

fn encode(key: &str, record: &StakeRecord) -> Result<String, StakeError> {
    serde_json::to_string(record).map_err(|e| StakeError::Corrupted {
        key: key.to_string(),
        reason: e.to_string(),
    })
}

fn parse_txid(key: &str, raw: &str) -> Result<Txid, StakeError> {
    Txid::from_str(raw).map_err(|e| StakeError::Corrupted {
        key: key.to_string(),
        reason: e.to_string(),
    })
}
