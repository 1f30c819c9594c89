use std::time::Duration;

/// Environment variable holding the hex seed of the coordinator's master key.
pub(crate) const BITCOIN_KEY_ENVVAR: &str = "BITCOIN_KEY";

/// Environment variable holding the root secret of the HTLC preimages.
pub(crate) const PREIMAGE_KEY_ENVVAR: &str = "PREIMAGE_ENCRYPTION_KEY";

pub(crate) const DEFAULT_THREAD_COUNT: u8 = 4;

pub(crate) const DEFAULT_EXPLORER_TIMEOUT: Duration = Duration::from_secs(20);

pub(crate) const DEFAULT_EXPLORER_RETRY_COUNT: u8 = 3;

pub(crate) const DEFAULT_EXPLORER_RETRY_INTERVAL: Duration = Duration::from_secs(1);

pub(crate) const DEFAULT_LEDGER_TIMEOUT: Duration = Duration::from_secs(20);

/// How long fee UTXOs stay reserved for an assembled but unbroadcast lock transaction.
pub(crate) const DEFAULT_LEASE_TTL: Duration = Duration::from_secs(10 * 60);
