//! Re-exports of the storage types.

pub use crate::{
    errors::{DbError, DbResult},
    inmemory::InMemoryStore,
    persistent::{SledStore, SledStoreConfig},
    store::KvStore,
};
