//! Secret material held by the coordinator and the operations that use it.
//!
//! The coordinator has two secrets. A seed from which its single signing key is derived, used to
//! sign the fee inputs it contributes to lock transactions, and a root secret from which the HTLC
//! preimage of every stake is derived on demand, so that preimages never need to be stored.

pub mod errors;
pub mod keys;
pub mod preimage;
pub mod signer;

pub mod prelude;
