//! Handlers for the token side of a stake.

use std::{str::FromStr, sync::Arc};

use chrono::{DateTime, Utc};
use gbpl_custody_params::prelude::{AddressKind, RedeemParams};
use gbpl_custody_rpc::types::{
    CreateStakeRequest, CreateStakeResponse, RedeemStakeRequest, RedeemStakeResponse,
    StakesResponse,
};
use gbpl_custody_signer::prelude::PreimageCommitment;
use gbpl_custody_stake::{
    errors::StakeError,
    record::{validate_stake_id, StakePeriod, StakeRecord, StakeStatus},
    redeem::{decode_address, RedeemAuthorization},
    repo::{Inserted, StakeRepo},
    traits::{TokenVault, TransferVerifier},
};
use tracing::{error, info, warn};

use crate::errors::{CoordinatorError, CoordinatorResult};

/// Creates, redeems and lists stakes.
#[derive(Debug, Clone)]
pub struct StakeService {
    repo: StakeRepo,
    verifier: Arc<dyn TransferVerifier>,
    vault: Arc<dyn TokenVault>,

    /// Absent when no root secret is configured, in which case no stake can be created.
    preimages: Option<Arc<PreimageCommitment>>,

    /// Address family recorded on new stakes for their deposit.
    deposit_address_kind: AddressKind,

    redeem: RedeemParams,
}

impl StakeService {
    /// Creates a new [`StakeService`].
    pub fn new(
        repo: StakeRepo,
        verifier: Arc<dyn TransferVerifier>,
        vault: Arc<dyn TokenVault>,
        preimages: Option<Arc<PreimageCommitment>>,
        deposit_address_kind: AddressKind,
        redeem: RedeemParams,
    ) -> Self {
        Self {
            repo,
            verifier,
            vault,
            preimages,
            deposit_address_kind,
            redeem,
        }
    }

    /// Creates the stake backed by the vault transfer `request.signature`.
    ///
    /// The staked amount is the one observed on the token network. Creating the same stake again
    /// returns the stored record with `already_processed` set.
    pub async fn create_stake(
        &self,
        request: CreateStakeRequest,
        now: DateTime<Utc>,
    ) -> CoordinatorResult<CreateStakeResponse> {
        if request.user_address.is_empty() || request.signature.is_empty() {
            return Err(CoordinatorError::Validation(
                "missing required fields".to_string(),
            ));
        }

        validate_stake_id(&request.signature)?;
        let stake_period = StakePeriod::from_str(&request.stake_period)?;
        decode_address(&request.user_address)?;

        if let Some(existing) = self.repo.get(&request.signature).await? {
            return Ok(created(Inserted::Existing(existing)));
        }

        let preimages = self.preimages.as_deref().ok_or_else(|| {
            CoordinatorError::Configuration("PREIMAGE_ENCRYPTION_KEY is not set".to_string())
        })?;

        let transfer = self
            .verifier
            .verify_transfer(&request.signature, &request.user_address)
            .await?;

        let record = StakeRecord::new(
            request.signature.clone(),
            request.user_address,
            transfer.amount,
            stake_period,
            now,
            preimages.hash_for(&request.signature),
            self.deposit_address_kind,
        );

        Ok(created(self.repo.insert(record).await?))
    }

    /// Redeems a stake on behalf of its owner and releases the staked tokens.
    ///
    /// A stake is released at most once. Redeeming it again returns `already_processed`. If an
    /// earlier redemption released the tokens but failed to store the outcome, the retry
    /// completes the stake and returns the transfer reference of that release.
    pub async fn redeem_stake(
        &self,
        request: RedeemStakeRequest,
        now: DateTime<Utc>,
    ) -> CoordinatorResult<RedeemStakeResponse> {
        let auth = RedeemAuthorization {
            stake_id: request.stake_id,
            user_address: request.user_address,
            signature: request.signature,
            message: request.message,
            timestamp: request.timestamp,
        };

        auth.verify(now, self.redeem.freshness_window)?;
        validate_stake_id(&auth.stake_id)?;

        let mut record = self.repo.load(&auth.stake_id).await?;
        if record.user_address() != auth.user_address {
            return Err(StakeError::NotOwner.into());
        }

        if record.status() == StakeStatus::Completed {
            self.repo.complete(&mut record).await?;
            return Ok(redeemed(&record, true, None));
        }

        auth.authorize(&record)?;

        if !self.repo.claim_redeem(record.id()).await? {
            let Some(transfer_signature) = self.repo.redeem_release(record.id()).await? else {
                info!(stake_id = %record.id(), "redeem already in progress");
                return Ok(redeemed(&record, true, None));
            };

            info!(stake_id = %record.id(), %transfer_signature, "completing released stake");
            self.repo.complete(&mut record).await?;

            return Ok(redeemed(&record, true, Some(transfer_signature)));
        }

        let transfer_signature = match self.vault.release(&record).await {
            Ok(signature) => signature,
            Err(err) => {
                warn!(stake_id = %record.id(), %err, "token release failed");
                self.repo.release_redeem_claim(record.id()).await?;
                return Err(err.into());
            }
        };

        if let Err(err) = self.finish_redeem(&mut record, &transfer_signature).await {
            error!(
                stake_id = %record.id(),
                %transfer_signature,
                %err,
                "tokens released but the stake could not be completed"
            );
            return Err(err);
        }

        info!(stake_id = %record.id(), %transfer_signature, "stake redeemed");

        Ok(redeemed(&record, false, Some(transfer_signature)))
    }

    async fn finish_redeem(
        &self,
        record: &mut StakeRecord,
        transfer_signature: &str,
    ) -> CoordinatorResult<()> {
        self.repo
            .record_redeem_release(record.id(), transfer_signature)
            .await?;
        self.repo.complete(record).await?;

        Ok(())
    }

    /// The stakes awaiting their lock transaction, the total staked, and the stakes of
    /// `user_address` if given.
    pub async fn list_stakes(
        &self,
        user_address: Option<&str>,
    ) -> CoordinatorResult<StakesResponse> {
        let stakes = self.repo.pending_lock().await?;
        let total = self.repo.total_staked().await?;

        let user_stakes = match user_address {
            Some(address) => Some(self.repo.user_stakes(address).await?),
            None => None,
        };

        Ok(StakesResponse {
            success: true,
            count: stakes.len(),
            stakes,
            total_gbpl_staked: total.to_string(),
            user_stakes_count: user_stakes.as_ref().map(Vec::len),
            user_stakes,
        })
    }
}

fn created(inserted: Inserted) -> CreateStakeResponse {
    let already_processed = inserted.already_processed();
    let stake_record = match inserted {
        Inserted::Created(record) | Inserted::Existing(record) => record,
    };

    CreateStakeResponse {
        success: true,
        already_processed,
        stake_record,
    }
}

fn redeemed(
    record: &StakeRecord,
    already_processed: bool,
    transfer_signature: Option<String>,
) -> RedeemStakeResponse {
    RedeemStakeResponse {
        success: true,
        already_processed,
        stake_id: record.id().to_string(),
        gbpl_amount_raw: record.gbpl_amount_raw().to_string(),
        transfer_signature,
    }
}

#[cfg(test)]
mod tests {
    use base64::{engine::general_purpose::STANDARD, Engine};
    use ed25519_dalek::{Signer, SigningKey};
    use ethnum::U256;
    use gbpl_custody_stake::{errors::TransferError, redeem::redeem_message};
    use gbpl_custody_test_utils::prelude::*;

    use super::*;
    use crate::test_utils::{owner, owner_address, Harness, STAKE_AMOUNT, STAKE_ID};

    fn redeem_request(key: &SigningKey, stake_id: &str, timestamp: i64) -> RedeemStakeRequest {
        let address = bitcoin::base58::encode(key.verifying_key().as_bytes());
        let message = redeem_message(stake_id, &address, timestamp);

        RedeemStakeRequest {
            stake_id: stake_id.to_string(),
            user_address: address,
            signature: STANDARD.encode(key.sign(message.as_bytes()).to_bytes()),
            message,
            timestamp,
        }
    }

    fn create_request(signature: &str) -> CreateStakeRequest {
        CreateStakeRequest {
            user_address: owner_address(),
            signature: signature.to_string(),
            stake_period: "3m".to_string(),
        }
    }

    #[tokio::test]
    async fn test_create_stake_is_idempotent() {
        let harness = Harness::new();

        let first = harness
            .stake
            .create_stake(create_request(STAKE_ID), harness.now)
            .await
            .unwrap();
        let second = harness
            .stake
            .create_stake(create_request(STAKE_ID), harness.now + chrono::Duration::hours(1))
            .await
            .unwrap();

        assert!(!first.already_processed);
        assert!(second.already_processed);
        assert_eq!(first.stake_record, second.stake_record);
        assert_eq!(first.stake_record.gbpl_amount_raw(), STAKE_AMOUNT);
        assert_eq!(harness.verifier.calls(), 1);

        let listing = harness.stake.list_stakes(Some(&owner_address())).await.unwrap();
        assert_eq!(listing.count, 1);
        assert_eq!(listing.total_gbpl_staked, STAKE_AMOUNT.to_string());
        assert_eq!(listing.user_stakes_count, Some(1));
    }

    #[tokio::test]
    async fn test_create_stake_rejections() {
        let harness = Harness::new();

        let mut request = create_request("bad!signature");
        assert_eq!(
            harness
                .stake
                .create_stake(request.clone(), harness.now)
                .await
                .unwrap_err()
                .status_code(),
            400
        );

        request.signature = "dW5rbm93bg==".to_string();
        request.stake_period = "12m".to_string();
        assert!(matches!(
            harness.stake.create_stake(request.clone(), harness.now).await,
            Err(CoordinatorError::Validation(_))
        ));

        request.stake_period = "6m".to_string();
        assert!(matches!(
            harness.stake.create_stake(request, harness.now).await,
            Err(CoordinatorError::Validation(ref msg)) if msg.contains("not found")
        ));

        let keyless = harness.without_preimages();
        assert!(matches!(
            keyless.create_stake(create_request(STAKE_ID), harness.now).await,
            Err(CoordinatorError::Configuration(_))
        ));
    }

    #[tokio::test]
    async fn test_htlc_hash_commits_to_signature() {
        let harness = Harness::new();

        let response = harness
            .stake
            .create_stake(create_request(STAKE_ID), harness.now)
            .await
            .unwrap();

        let secret = harness.preimages.derive_secret(STAKE_ID);
        assert_eq!(
            response.stake_record.htlc_hash(),
            PreimageCommitment::commit(&secret)
        );
    }

    #[tokio::test]
    async fn test_redeem_releases_once() {
        let harness = Harness::new();
        harness
            .stake
            .create_stake(create_request(STAKE_ID), harness.now)
            .await
            .unwrap();

        let ts = harness.now.timestamp_millis() - 1_000;
        let response = harness
            .stake
            .redeem_stake(redeem_request(&owner(), STAKE_ID, ts), harness.now)
            .await
            .unwrap();

        assert!(!response.already_processed);
        assert_eq!(response.gbpl_amount_raw, STAKE_AMOUNT.to_string());
        assert_eq!(
            response.transfer_signature.as_deref(),
            Some(format!("release-{STAKE_ID}").as_str())
        );
        assert_eq!(harness.vault.released(), vec![STAKE_ID.to_string()]);

        let again = harness
            .stake
            .redeem_stake(redeem_request(&owner(), STAKE_ID, ts), harness.now)
            .await
            .unwrap();
        assert!(again.already_processed);
        assert!(again.transfer_signature.is_none());
        assert_eq!(harness.vault.released().len(), 1);

        let record = harness.repo.load(STAKE_ID).await.unwrap();
        assert_eq!(record.status(), StakeStatus::Completed);

        let listing = harness.stake.list_stakes(Some(&owner_address())).await.unwrap();
        assert_eq!(listing.count, 0);
        assert_eq!(listing.user_stakes_count, Some(0));
        assert_eq!(
            listing.total_gbpl_staked,
            STAKE_AMOUNT.to_string(),
            "redeeming does not reduce the total"
        );
    }

    #[tokio::test]
    async fn test_redeem_rejections() {
        let harness = Harness::new();
        harness
            .stake
            .create_stake(create_request(STAKE_ID), harness.now)
            .await
            .unwrap();

        let stale = harness.now - chrono::Duration::minutes(6);
        let err = harness
            .stake
            .redeem_stake(
                redeem_request(&owner(), STAKE_ID, stale.timestamp_millis()),
                harness.now,
            )
            .await
            .unwrap_err();
        assert_eq!(err.status_code(), 400);

        let ts = harness.now.timestamp_millis();
        let mut tampered = redeem_request(&owner(), STAKE_ID, ts);
        tampered.signature = redeem_request(&owner(), STAKE_ID, ts - 1).signature;
        let err = harness
            .stake
            .redeem_stake(tampered, harness.now)
            .await
            .unwrap_err();
        assert_eq!(err.status_code(), 401);

        let stranger = SigningKey::from_bytes(&[9u8; 32]);
        let err = harness
            .stake
            .redeem_stake(redeem_request(&stranger, STAKE_ID, ts), harness.now)
            .await
            .unwrap_err();
        assert_eq!(err.status_code(), 403, "valid signature of a non-owner");

        let err = harness
            .stake
            .redeem_stake(redeem_request(&owner(), "bWlzc2luZw==", ts), harness.now)
            .await
            .unwrap_err();
        assert_eq!(err.status_code(), 404);

        assert!(harness.vault.released().is_empty());
    }

    #[tokio::test]
    async fn test_failed_release_can_be_retried() {
        let harness = Harness::new();
        let failing = harness.with_vault(Arc::new(RecordingVault::failing(
            TransferError::Unavailable("vault offline".to_string()),
        )));

        harness
            .stake
            .create_stake(create_request(STAKE_ID), harness.now)
            .await
            .unwrap();

        let ts = harness.now.timestamp_millis();
        let err = failing
            .redeem_stake(redeem_request(&owner(), STAKE_ID, ts), harness.now)
            .await
            .unwrap_err();
        assert!(matches!(err, CoordinatorError::ExternalLookup(_)));
        assert_eq!(
            harness.repo.load(STAKE_ID).await.unwrap().status(),
            StakeStatus::Active
        );

        let response = harness
            .stake
            .redeem_stake(redeem_request(&owner(), STAKE_ID, ts), harness.now)
            .await
            .unwrap();
        assert!(!response.already_processed);
        assert_eq!(harness.vault.released().len(), 1);
    }

    #[tokio::test]
    async fn test_released_stake_completes_on_retry() {
        let harness = Harness::new();
        harness
            .stake
            .create_stake(create_request(STAKE_ID), harness.now)
            .await
            .unwrap();

        let ts = harness.now.timestamp_millis();
        harness
            .store
            .fail_writes(&gbpl_custody_db::keys::stake_record(""));
        let err = harness
            .stake
            .redeem_stake(redeem_request(&owner(), STAKE_ID, ts), harness.now)
            .await
            .unwrap_err();
        assert!(matches!(err, CoordinatorError::Storage(_)));
        assert_eq!(harness.vault.released().len(), 1);
        assert_eq!(
            harness.repo.load(STAKE_ID).await.unwrap().status(),
            StakeStatus::Active
        );

        harness.store.heal();
        let response = harness
            .stake
            .redeem_stake(redeem_request(&owner(), STAKE_ID, ts), harness.now)
            .await
            .expect("retry completes the released stake");

        assert!(response.already_processed);
        assert_eq!(
            response.transfer_signature.as_deref(),
            Some(format!("release-{STAKE_ID}").as_str())
        );
        assert_eq!(harness.vault.released().len(), 1, "tokens are released once");
        assert_eq!(
            harness.repo.load(STAKE_ID).await.unwrap().status(),
            StakeStatus::Completed
        );

        let listing = harness.stake.list_stakes(Some(&owner_address())).await.unwrap();
        assert_eq!(listing.count, 0);
        assert_eq!(listing.user_stakes_count, Some(0));
    }

    #[tokio::test]
    async fn test_large_amounts_accumulate() {
        let large = U256::from_words(1, 0);
        let harness = Harness::with_verifier(
            StaticTransferVerifier::new()
                .with_transfer("YQ==", &owner_address(), large)
                .with_transfer("Yg==", &owner_address(), large),
        );

        for signature in ["YQ==", "Yg=="] {
            harness
                .stake
                .create_stake(create_request(signature), harness.now)
                .await
                .unwrap();
        }

        let listing = harness.stake.list_stakes(None).await.unwrap();
        assert_eq!(listing.total_gbpl_staked, (large + large).to_string());
        assert!(listing.user_stakes.is_none());
    }
}
