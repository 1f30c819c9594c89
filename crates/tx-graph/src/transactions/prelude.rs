//! Re-exports of the transaction types.

pub use super::lock::*;
