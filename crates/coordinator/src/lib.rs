//! The request handlers of the custody coordinator.
//!
//! [`LockService`](lock::LockService) handles the bitcoin side of a stake: deposit addresses,
//! assembling the lock transaction, and finalizing and broadcasting it once the user has signed.
//! [`StakeService`](stake::StakeService) handles the token side: creating stakes from verified
//! transfers into the vault and redeeming them.
//!
//! Every collaborator (chain reader, store, signer, token network) is injected, so the services
//! hold no global state.

pub mod config;
pub mod errors;
pub mod lock;
pub mod stake;
pub mod vault;

#[cfg(test)]
mod test_utils;
