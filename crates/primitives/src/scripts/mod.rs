//! Bitcoin scripts, addresses and transaction skeletons.

pub mod general;
pub mod prelude;
pub mod taproot;
