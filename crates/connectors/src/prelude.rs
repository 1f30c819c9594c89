//! Re-exports of the connectors and their spend paths.

pub use crate::{
    address::DerivedAddress,
    connector_deposit::ConnectorDeposit,
    connector_lock::ConnectorLock,
    spend_path::{ConnectorSignature, DepositSpendPath, LockSpendPath},
};
