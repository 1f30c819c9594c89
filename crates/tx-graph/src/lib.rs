//! Builds and finalizes the lock transaction that moves a user's deposit into the final-lock
//! output, funded by the coordinator.

pub mod errors;
pub mod fees;
pub mod leases;
pub mod transactions;
