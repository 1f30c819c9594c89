use std::{path::PathBuf, time::Duration};

use gbpl_custody_params::prelude::BtcNetwork;
use serde::{Deserialize, Serialize};

/// The configuration values that dictate the behavior of the coordinator.
///
/// Secrets are not part of this file. They are read from the environment at startup.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub(crate) struct Config {
    /// The bitcoin network the coordinator operates on.
    pub network: BtcNetwork,

    /// The RPC server addr for the coordinator.
    pub rpc_addr: String,

    /// The number of worker threads of the runtime.
    pub num_threads: Option<u8>,

    /// How long fee UTXOs stay reserved for an assembled lock transaction.
    ///
    /// Default is [`DEFAULT_LEASE_TTL`](crate::constants::DEFAULT_LEASE_TTL).
    pub lease_ttl: Option<Duration>,

    /// The block explorer the chain is read through.
    pub explorer: ExplorerConfig,

    /// Where stakes and indexes are kept.
    pub storage: StorageConfig,

    /// The token network node that stake transfers are verified against.
    pub ledger: LedgerClientConfig,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub(crate) struct ExplorerConfig {
    /// Base URL of an esplora-compatible explorer. Defaults to the public endpoint of the network.
    pub url: Option<String>,

    /// Deadline for a single request.
    pub timeout: Option<Duration>,

    /// How many times a failed read is attempted again.
    pub retry_count: Option<u8>,

    /// Delay between attempts.
    pub retry_interval: Option<Duration>,
}

/// The storage backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "backend", rename_all = "snake_case")]
pub(crate) enum StorageConfig {
    /// Everything is lost on restart.
    InMemory,

    /// A sled database at `path`.
    Sled { path: PathBuf },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub(crate) struct LedgerClientConfig {
    /// JSON-RPC endpoint of the token network node.
    pub rpc_url: String,

    /// The vault's token account that stakes are paid into.
    pub vault_token_account: String,

    /// Deadline for a single request.
    pub timeout: Option<Duration>,
}
