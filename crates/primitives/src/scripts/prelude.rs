//! Re-exports of the script helpers.

pub use super::{general::*, taproot::*};
