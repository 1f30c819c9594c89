//! Wires the coordinator services to their collaborators and serves them.

use std::{env, sync::Arc};

use anyhow::Context;
use gbpl_custody_chain::esplora::{EsploraConfig, EsploraReader};
use gbpl_custody_coordinator::{
    config::ServiceConfig, lock::LockService, stake::StakeService, vault::ReleaseQueue,
};
use gbpl_custody_db::prelude::{InMemoryStore, KvStore, SledStore, SledStoreConfig};
use gbpl_custody_ledger::client::{LedgerConfig, SolanaTransferVerifier};
use gbpl_custody_signer::prelude::{CoordinatorKeys, CoordinatorSigner, PreimageCommitment};
use gbpl_custody_stake::repo::StakeRepo;
use gbpl_custody_tx_graph::leases::UtxoLeases;
use tracing::{info, warn};

use crate::{
    config::{Config, StorageConfig},
    constants::{
        BITCOIN_KEY_ENVVAR, DEFAULT_EXPLORER_RETRY_COUNT, DEFAULT_EXPLORER_RETRY_INTERVAL,
        DEFAULT_EXPLORER_TIMEOUT, DEFAULT_LEASE_TTL, DEFAULT_LEDGER_TIMEOUT, PREIMAGE_KEY_ENVVAR,
    },
    params::Params,
    rpc_server::{start_rpc, CustodyRpc},
};

/// Bootstraps the coordinator by hooking up the store, the explorer and ledger clients, the
/// signer and the services, then serves the RPC API until shutdown.
pub(crate) async fn bootstrap(params: Params, config: Config) -> anyhow::Result<()> {
    info!(network = %config.network, "bootstrapping coordinator");

    let service_config = ServiceConfig {
        network: config.network,
        lock: params.lock,
        redeem: params.redeem,
    };

    let store = open_store(&config.storage)?;
    let repo = StakeRepo::new(store);

    let explorer_url = config
        .explorer
        .url
        .clone()
        .unwrap_or_else(|| config.network.default_explorer_url().to_string());
    let chain = EsploraReader::new(&EsploraConfig {
        url: explorer_url,
        timeout: config.explorer.timeout.unwrap_or(DEFAULT_EXPLORER_TIMEOUT),
        retry_count: config
            .explorer
            .retry_count
            .unwrap_or(DEFAULT_EXPLORER_RETRY_COUNT),
        retry_interval: config
            .explorer
            .retry_interval
            .unwrap_or(DEFAULT_EXPLORER_RETRY_INTERVAL),
    })
    .context("create explorer client")?;
    info!(url = %chain.base_url(), "reading the chain through explorer");

    let verifier = SolanaTransferVerifier::new(&LedgerConfig {
        rpc_url: config.ledger.rpc_url.clone(),
        vault_token_account: config.ledger.vault_token_account.clone(),
        timeout: config.ledger.timeout.unwrap_or(DEFAULT_LEDGER_TIMEOUT),
    })
    .context("create ledger client")?;

    let signer = load_signer()?;
    let preimages = load_preimages()?;
    let leases = UtxoLeases::new(config.lease_ttl.unwrap_or(DEFAULT_LEASE_TTL));

    let lock = LockService::new(
        service_config.network,
        service_config.lock,
        Arc::new(chain),
        repo.clone(),
        Arc::new(leases),
        signer,
    );
    let stake = StakeService::new(
        repo.clone(),
        Arc::new(verifier),
        Arc::new(ReleaseQueue::new(repo)),
        preimages,
        service_config.lock.deposit_address_kind,
        service_config.redeem,
    );

    let rpc_impl = CustodyRpc::new(lock, stake);
    start_rpc(&rpc_impl, &config.rpc_addr).await
}

fn open_store(config: &StorageConfig) -> anyhow::Result<Arc<dyn KvStore>> {
    match config {
        StorageConfig::InMemory => {
            warn!("using in-memory storage, stakes are lost on restart");
            Ok(Arc::new(InMemoryStore::new()))
        }
        StorageConfig::Sled { path } => {
            let store = SledStore::open(&SledStoreConfig { path: path.clone() })
                .with_context(|| format!("open sled database at {}", path.display()))?;

            Ok(Arc::new(store))
        }
    }
}

/// Reads the coordinator seed from the environment.
///
/// A missing seed is not fatal: requests that need the key fail until it is configured.
fn load_signer() -> anyhow::Result<Option<Arc<CoordinatorSigner>>> {
    let Some(seed) = env::var(BITCOIN_KEY_ENVVAR).ok().filter(|s| !s.is_empty()) else {
        warn!("{BITCOIN_KEY_ENVVAR} is not set, lock requests will be rejected");
        return Ok(None);
    };

    let keys = CoordinatorKeys::from_seed_hex(seed.trim())
        .with_context(|| format!("parse {BITCOIN_KEY_ENVVAR}"))?;
    info!(pubkey = %keys.public_key(), "loaded coordinator key");

    Ok(Some(Arc::new(CoordinatorSigner::new(keys))))
}

/// Reads the preimage root secret from the environment.
///
/// A missing secret is not fatal: stake creation fails until it is configured.
fn load_preimages() -> anyhow::Result<Option<Arc<PreimageCommitment>>> {
    let Some(secret) = env::var(PREIMAGE_KEY_ENVVAR).ok().filter(|s| !s.is_empty()) else {
        warn!("{PREIMAGE_KEY_ENVVAR} is not set, stakes cannot be created");
        return Ok(None);
    };

    let preimages = PreimageCommitment::from_secret_str(&secret)
        .with_context(|| format!("load {PREIMAGE_KEY_ENVVAR}"))?;

    Ok(Some(Arc::new(preimages)))
}
