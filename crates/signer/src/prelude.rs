//! Re-exports of the signer types.

pub use crate::{
    errors::{PreimageError, SignerError},
    keys::CoordinatorKeys,
    preimage::PreimageCommitment,
    signer::CoordinatorSigner,
};
