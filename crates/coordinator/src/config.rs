//! Static configuration shared by the services.

use gbpl_custody_params::prelude::{BtcNetwork, LockParams, RedeemParams};

/// The static configuration of the coordinator services.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ServiceConfig {
    /// The bitcoin network to operate on.
    pub network: BtcNetwork,

    /// How lock transactions are built and funded.
    pub lock: LockParams,

    /// How redeem requests are authorized.
    pub redeem: RedeemParams,
}
