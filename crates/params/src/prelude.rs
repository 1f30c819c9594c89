//! Re-exports of the most commonly used parameter types.

pub use crate::{
    errors::ParamsError,
    lock::LockParams,
    network::BtcNetwork,
    redeem::RedeemParams,
    types::AddressKind,
};
