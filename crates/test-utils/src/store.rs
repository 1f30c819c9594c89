//! A store whose writes can be made to fail.

use async_trait::async_trait;
use ethnum::U256;
use gbpl_custody_db::{
    errors::{DbError, DbResult},
    inmemory::InMemoryStore,
    store::KvStore,
};
use parking_lot::Mutex;

/// An [`InMemoryStore`] that refuses writes to keys starting with a configured prefix.
///
/// Reads always go through, so a test can inspect what was written before the failure.
#[derive(Debug, Default)]
pub struct FaultyStore {
    inner: InMemoryStore,
    failing_prefix: Mutex<Option<String>>,
}

impl FaultyStore {
    /// Creates an empty store that accepts every write.
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes writes to keys starting with `prefix` fail until [`Self::heal`] is called.
    pub fn fail_writes(&self, prefix: &str) {
        *self.failing_prefix.lock() = Some(prefix.to_string());
    }

    /// Accepts every write again.
    pub fn heal(&self) {
        *self.failing_prefix.lock() = None;
    }

    fn check_write(&self, key: &str) -> DbResult<()> {
        match self.failing_prefix.lock().as_deref() {
            Some(prefix) if key.starts_with(prefix) => Err(DbError::InvalidData {
                key: key.to_string(),
                reason: "write refused".to_string(),
            }),
            _ => Ok(()),
        }
    }
}

#[async_trait]
impl KvStore for FaultyStore {
    async fn get(&self, key: &str) -> DbResult<Option<String>> {
        self.inner.get(key).await
    }

    async fn set(&self, key: &str, value: &str) -> DbResult<()> {
        self.check_write(key)?;
        self.inner.set(key, value).await
    }

    async fn set_if_absent(&self, key: &str, value: &str) -> DbResult<bool> {
        self.check_write(key)?;
        self.inner.set_if_absent(key, value).await
    }

    async fn del(&self, key: &str) -> DbResult<bool> {
        self.check_write(key)?;
        self.inner.del(key).await
    }

    async fn hget(&self, key: &str, field: &str) -> DbResult<Option<String>> {
        self.inner.hget(key, field).await
    }

    async fn hset(&self, key: &str, field: &str, value: &str) -> DbResult<()> {
        self.check_write(key)?;
        self.inner.hset(key, field, value).await
    }

    async fn sadd(&self, key: &str, member: &str) -> DbResult<bool> {
        self.check_write(key)?;
        self.inner.sadd(key, member).await
    }

    async fn srem(&self, key: &str, member: &str) -> DbResult<bool> {
        self.check_write(key)?;
        self.inner.srem(key, member).await
    }

    async fn smembers(&self, key: &str) -> DbResult<Vec<String>> {
        self.inner.smembers(key).await
    }

    async fn incr_by(&self, key: &str, amount: U256) -> DbResult<U256> {
        self.check_write(key)?;
        self.inner.incr_by(key, amount).await
    }

    async fn rpush(&self, key: &str, value: &str) -> DbResult<usize> {
        self.check_write(key)?;
        self.inner.rpush(key, value).await
    }

    async fn lrange(&self, key: &str) -> DbResult<Vec<String>> {
        self.inner.lrange(key).await
    }
}
