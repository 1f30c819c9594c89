//! The interface the rest of the workspace uses to reach the store.

use std::fmt::Debug;

use async_trait::async_trait;
use ethnum::U256;

use crate::errors::DbResult;

/// An associative store with redis-like string, hash, set and list values.
///
/// Every operation touches a single key and is atomic with respect to other operations on the
/// same key. Nothing is atomic across keys.
#[async_trait]
pub trait KvStore: Debug + Send + Sync {
    /// Gets the string stored at `key`.
    async fn get(&self, key: &str) -> DbResult<Option<String>>;

    /// Stores `value` at `key`, replacing whatever was there.
    async fn set(&self, key: &str, value: &str) -> DbResult<()>;

    /// Stores `value` at `key` only if the key does not exist.
    ///
    /// Returns whether the value was written.
    async fn set_if_absent(&self, key: &str, value: &str) -> DbResult<bool>;

    /// Removes `key` whatever its type. Returns whether it existed.
    async fn del(&self, key: &str) -> DbResult<bool>;

    /// Gets `field` of the hash at `key`.
    async fn hget(&self, key: &str, field: &str) -> DbResult<Option<String>>;

    /// Sets `field` of the hash at `key` to `value`.
    async fn hset(&self, key: &str, field: &str, value: &str) -> DbResult<()>;

    /// Adds `member` to the set at `key`. Returns whether it was not already a member.
    async fn sadd(&self, key: &str, member: &str) -> DbResult<bool>;

    /// Removes `member` from the set at `key`. Returns whether it was a member.
    async fn srem(&self, key: &str, member: &str) -> DbResult<bool>;

    /// Members of the set at `key`, in lexicographic order.
    async fn smembers(&self, key: &str) -> DbResult<Vec<String>>;

    /// Adds `amount` to the decimal counter at `key` and returns the new value.
    ///
    /// A missing key counts as zero.
    async fn incr_by(&self, key: &str, amount: U256) -> DbResult<U256>;

    /// Appends `value` to the list at `key` and returns the new length.
    async fn rpush(&self, key: &str, value: &str) -> DbResult<usize>;

    /// The whole list at `key`.
    async fn lrange(&self, key: &str) -> DbResult<Vec<String>>;
}

/// Parses a stored decimal counter.
pub(crate) fn parse_counter(key: &str, value: &str) -> DbResult<U256> {
    U256::from_str_radix(value, 10).map_err(|e| crate::errors::DbError::InvalidData {
        key: key.to_string(),
        reason: e.to_string(),
    })
}
