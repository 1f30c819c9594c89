//! The stake side of the custody protocol.
//!
//! A stake is created when a verified token transfer into the vault is observed on the token
//! network. Its record ties that transfer to the bitcoin collateral locked for it and gates
//! redemption on a signed, fresh request from the owner.

pub mod errors;
pub mod record;
pub mod redeem;
pub mod repo;
pub mod traits;

pub mod prelude;
