//! This crate contains the parameters that dictate how the custody coordinator builds, funds and
//! validates the bitcoin side of a stake.
//!
//! Every parameter has a default so that a coordinator can run off an empty params file.

mod default;

pub mod errors;
pub mod lock;
pub mod network;
pub mod prelude;
pub mod redeem;
pub mod types;
