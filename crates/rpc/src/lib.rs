//! Provides the JSON-RPC interface of the custody coordinator.
//!
//! The RPCs are split into two groups: the bitcoin side of a stake (deposit addresses and the
//! lock transaction) and the token side (creating, redeeming and listing stakes). All methods
//! live in the `custody` namespace.

pub mod traits;
pub mod types;
