//! Services wired to in-memory collaborators for tests.

use std::{sync::Arc, time::Duration};

use bitcoin::{base58, Address};
use chrono::{DateTime, Utc};
use ed25519_dalek::SigningKey;
use ethnum::U256;
use gbpl_custody_params::prelude::{AddressKind, BtcNetwork, LockParams, RedeemParams};
use gbpl_custody_signer::prelude::{CoordinatorKeys, CoordinatorSigner, PreimageCommitment};
use gbpl_custody_stake::{
    record::{StakePeriod, StakeRecord},
    repo::StakeRepo,
    traits::TokenVault,
};
use gbpl_custody_test_utils::prelude::*;
use gbpl_custody_tx_graph::leases::UtxoLeases;

use crate::{config::ServiceConfig, lock::LockService, stake::StakeService};

/// Amount of every stake created through the harness.
pub(crate) const STAKE_AMOUNT: U256 = U256::new(1_000_000_000);

/// A transfer the default verifier knows, made by [`owner`].
pub(crate) const STAKE_ID: &str = "NHJlZGVlbVNpZw==";

/// The token-network key that owns the stakes of the harness.
pub(crate) fn owner() -> SigningKey {
    SigningKey::from_bytes(&[7u8; 32])
}

pub(crate) fn owner_address() -> String {
    base58::encode(owner().verifying_key().as_bytes())
}

/// An active stake of [`owner`] with a throwaway HTLC hash.
pub(crate) fn stake_record(id: &str) -> StakeRecord {
    StakeRecord::new(
        id.to_string(),
        owner_address(),
        STAKE_AMOUNT,
        StakePeriod::ThreeMonths,
        DateTime::<Utc>::UNIX_EPOCH,
        PreimageCommitment::commit(&[1u8; 32]),
        AddressKind::Taproot,
    )
}

pub(crate) struct Harness {
    pub(crate) lock: LockService,
    pub(crate) stake: StakeService,
    pub(crate) chain: Arc<FakeChainReader>,
    pub(crate) signer: Arc<CoordinatorSigner>,
    pub(crate) preimages: Arc<PreimageCommitment>,
    pub(crate) repo: StakeRepo,

    /// The store behind [`Self::repo`], for injecting write failures.
    pub(crate) store: Arc<FaultyStore>,
    pub(crate) verifier: Arc<StaticTransferVerifier>,
    pub(crate) vault: Arc<RecordingVault>,

    /// The clock handed to time-dependent requests.
    pub(crate) now: DateTime<Utc>,

    config: ServiceConfig,
    leases: Arc<UtxoLeases>,
}

impl Harness {
    pub(crate) fn new() -> Self {
        Self::with_verifier(StaticTransferVerifier::new().with_transfer(
            STAKE_ID,
            &owner_address(),
            STAKE_AMOUNT,
        ))
    }

    pub(crate) fn with_verifier(verifier: StaticTransferVerifier) -> Self {
        let config = ServiceConfig {
            network: BtcNetwork::Testnet4,
            lock: LockParams::default(),
            redeem: RedeemParams::default(),
        };

        let store = Arc::new(FaultyStore::new());
        let repo = StakeRepo::new(store.clone());
        let chain = Arc::new(FakeChainReader::new());
        let leases = Arc::new(UtxoLeases::new(Duration::from_secs(60)));
        let keys = CoordinatorKeys::from_seed_hex(&generate_seed_hex()).unwrap();
        let signer = Arc::new(CoordinatorSigner::new(keys));
        let preimages = Arc::new(PreimageCommitment::from_secret_str("harness secret").unwrap());
        let verifier = Arc::new(verifier);
        let vault = Arc::new(RecordingVault::new());

        let lock = LockService::new(
            config.network,
            config.lock,
            chain.clone(),
            repo.clone(),
            leases.clone(),
            Some(signer.clone()),
        );
        let stake = StakeService::new(
            repo.clone(),
            verifier.clone(),
            vault.clone(),
            Some(preimages.clone()),
            config.lock.deposit_address_kind,
            config.redeem,
        );

        Self {
            lock,
            stake,
            chain,
            signer,
            preimages,
            repo,
            store,
            verifier,
            vault,
            now: DateTime::from_timestamp(1_750_000_000, 0).unwrap(),
            config,
            leases,
        }
    }

    /// The address the coordinator's fee UTXOs are held at.
    pub(crate) fn funding_address(&self) -> Address {
        self.signer
            .keys()
            .funding_address(self.config.network.address_network())
    }

    /// A lock service sharing this harness' state but without a coordinator key.
    pub(crate) fn without_signer(&self) -> LockService {
        LockService::new(
            self.config.network,
            self.config.lock,
            self.chain.clone(),
            self.repo.clone(),
            self.leases.clone(),
            None,
        )
    }

    /// A stake service sharing this harness' state but without a preimage root secret.
    pub(crate) fn without_preimages(&self) -> StakeService {
        self.stake_service(self.vault.clone(), None)
    }

    /// A stake service sharing this harness' state but releasing through `vault`.
    pub(crate) fn with_vault(&self, vault: Arc<dyn TokenVault>) -> StakeService {
        self.stake_service(vault, Some(self.preimages.clone()))
    }

    fn stake_service(
        &self,
        vault: Arc<dyn TokenVault>,
        preimages: Option<Arc<PreimageCommitment>>,
    ) -> StakeService {
        StakeService::new(
            self.repo.clone(),
            self.verifier.clone(),
            vault,
            preimages,
            self.config.lock.deposit_address_kind,
            self.config.redeem,
        )
    }
}

/// Stores an active stake of [`owner`] with id `id` whose HTLC hash commits to the harness'
/// preimage secret.
pub(crate) async fn create_stake(harness: &Harness, id: &str) -> StakeRecord {
    let record = StakeRecord::new(
        id.to_string(),
        owner_address(),
        STAKE_AMOUNT,
        StakePeriod::ThreeMonths,
        harness.now,
        harness.preimages.hash_for(id),
        AddressKind::Taproot,
    );

    harness.repo.insert(record).await.unwrap().record().clone()
}
