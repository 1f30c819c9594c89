//! Read access to the bitcoin chain through a block explorer, and the lookup of user deposits.
//!
//! The coordinator does not run a node. Everything it knows about the chain comes from a
//! third-party explorer that speaks the esplora HTTP API, which is treated as an oracle.

pub mod errors;
pub mod esplora;
pub mod locator;
pub mod traits;
pub mod types;

pub mod prelude;
