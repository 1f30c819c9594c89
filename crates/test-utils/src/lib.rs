//! This crate provides test utilities for the custody coordinator.
//!
//! It has generators for keys and ids, in-process fakes of the coordinator's external
//! collaborators (the block explorer, the token network and the token vault) so that request
//! handlers can be exercised without network access, and a store whose writes fail on demand.

pub mod bitcoin;
pub mod chain;
pub mod prelude;
pub mod stake;
pub mod store;
