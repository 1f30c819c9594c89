//! This crate contains general types and pure functions shared by every other crate in the
//! custody workspace: key parsing, the taproot and transaction helpers over [`bitcoin`], and the
//! references to on-chain outputs that the coordinator works with.
//!
//! It lies at the bottom of the crate-hierarchy in this workspace i.e., it does not depend on any
//! other crate in this workspace.

pub mod constants;
pub mod errors;
pub mod keys;
pub mod scripts;
pub mod types;
