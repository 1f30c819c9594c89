//! Storage for stake records and the indexes around them.
//!
//! The store is an opaque key-value store with string, hash, set and list values and a handful
//! of atomic single-key operations. Two implementations are provided: an in-memory one for tests
//! and ephemeral deployments, and a [`sled`]-backed persistent one.

pub mod errors;
pub mod inmemory;
pub mod keys;
pub mod persistent;
pub mod store;

pub mod prelude;
