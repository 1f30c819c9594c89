//! Re-exports of the test utilities.

pub use crate::{
    bitcoin::*,
    chain::FakeChainReader,
    stake::{RecordingVault, StaticTransferVerifier},
    store::FaultyStore,
};
