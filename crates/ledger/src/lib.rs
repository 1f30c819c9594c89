//! Client for the token network, a Solana cluster reached over JSON-RPC.
//!
//! Only what the coordinator needs is implemented: looking up a confirmed transaction and
//! deriving from its token balances how much was transferred into the vault and by whom.

pub mod client;
pub mod errors;
pub mod types;
