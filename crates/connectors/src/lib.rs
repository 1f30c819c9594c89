//! This crate contains the connectors of the custody protocol.
//!
//! Connectors represent UTXOs with specific locking/spending conditions.
//! Each connector is pure in that it encapsulates the logic that goes into the locking script of
//! an output and the corresponding logic that goes into the witness when spending it. Everything
//! a connector needs (keys, hashes, timelocks) is handed to it by a caller that looked it up.
//!
//! Both connectors use the same selector idiom: `OP_DEPTH OP_1SUB OP_IF .. OP_ELSE .. OP_ENDIF`.
//! The privileged branch is taken when the witness carries one more element than the fallback
//! branch, so the witness shape alone picks the branch. The shapes are encoded in
//! [`DepositSpendPath`](spend_path::DepositSpendPath) and
//! [`LockSpendPath`](spend_path::LockSpendPath) so that callers never assemble them by hand.

pub mod address;
pub mod connector_deposit;
pub mod connector_lock;
pub mod spend_path;

pub mod prelude;
