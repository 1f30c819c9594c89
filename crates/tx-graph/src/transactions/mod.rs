//! Constructs and finalizes the transactions the coordinator takes part in.

pub mod lock;
pub mod prelude;
