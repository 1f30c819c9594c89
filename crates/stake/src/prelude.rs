//! Re-exports of the most commonly used stake types.

pub use crate::{
    errors::{StakeError, TransferError},
    record::{HtlcStatus, StakePeriod, StakeRecord, StakeStatus},
    redeem::RedeemAuthorization,
    repo::{AssembledLock, Inserted, StakeRepo},
    traits::{TokenVault, TransferVerifier, VerifiedTransfer},
};
