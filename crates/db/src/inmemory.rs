//! In-memory implementation of [`KvStore`].

use std::{
    collections::{BTreeMap, BTreeSet, HashMap},
    sync::Arc,
};

use async_trait::async_trait;
use ethnum::U256;
use tokio::sync::RwLock;
use tracing::trace;

use crate::{
    errors::{DbError, DbResult},
    store::{parse_counter, KvStore},
};

#[derive(Debug, Clone)]
enum Value {
    Str(String),
    Hash(BTreeMap<String, String>),
    Set(BTreeSet<String>),
    List(Vec<String>),
}

/// In-memory store. Clones share the same data.
#[derive(Debug, Clone, Default)]
pub struct InMemoryStore {
    /// key -> value
    entries: Arc<RwLock<HashMap<String, Value>>>,
}

impl InMemoryStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }
}

fn wrong_type(key: &str) -> DbError {
    DbError::WrongType(key.to_string())
}

#[async_trait]
impl KvStore for InMemoryStore {
    async fn get(&self, key: &str) -> DbResult<Option<String>> {
        match self.entries.read().await.get(key) {
            None => Ok(None),
            Some(Value::Str(value)) => Ok(Some(value.clone())),
            Some(_) => Err(wrong_type(key)),
        }
    }

    async fn set(&self, key: &str, value: &str) -> DbResult<()> {
        trace!(%key, "set");
        self.entries
            .write()
            .await
            .insert(key.to_string(), Value::Str(value.to_string()));

        Ok(())
    }

    async fn set_if_absent(&self, key: &str, value: &str) -> DbResult<bool> {
        let mut entries = self.entries.write().await;
        if entries.contains_key(key) {
            return Ok(false);
        }

        entries.insert(key.to_string(), Value::Str(value.to_string()));

        Ok(true)
    }

    async fn del(&self, key: &str) -> DbResult<bool> {
        Ok(self.entries.write().await.remove(key).is_some())
    }

    async fn hget(&self, key: &str, field: &str) -> DbResult<Option<String>> {
        match self.entries.read().await.get(key) {
            None => Ok(None),
            Some(Value::Hash(hash)) => Ok(hash.get(field).cloned()),
            Some(_) => Err(wrong_type(key)),
        }
    }

    async fn hset(&self, key: &str, field: &str, value: &str) -> DbResult<()> {
        let mut entries = self.entries.write().await;
        let entry = entries
            .entry(key.to_string())
            .or_insert_with(|| Value::Hash(BTreeMap::new()));

        match entry {
            Value::Hash(hash) => {
                hash.insert(field.to_string(), value.to_string());
                Ok(())
            }
            _ => Err(wrong_type(key)),
        }
    }

    async fn sadd(&self, key: &str, member: &str) -> DbResult<bool> {
        let mut entries = self.entries.write().await;
        let entry = entries
            .entry(key.to_string())
            .or_insert_with(|| Value::Set(BTreeSet::new()));

        match entry {
            Value::Set(set) => Ok(set.insert(member.to_string())),
            _ => Err(wrong_type(key)),
        }
    }

    async fn srem(&self, key: &str, member: &str) -> DbResult<bool> {
        let mut entries = self.entries.write().await;

        match entries.get_mut(key) {
            None => Ok(false),
            Some(Value::Set(set)) => {
                let removed = set.remove(member);
                if set.is_empty() {
                    entries.remove(key);
                }

                Ok(removed)
            }
            Some(_) => Err(wrong_type(key)),
        }
    }

    async fn smembers(&self, key: &str) -> DbResult<Vec<String>> {
        match self.entries.read().await.get(key) {
            None => Ok(vec![]),
            Some(Value::Set(set)) => Ok(set.iter().cloned().collect()),
            Some(_) => Err(wrong_type(key)),
        }
    }

    async fn incr_by(&self, key: &str, amount: U256) -> DbResult<U256> {
        let mut entries = self.entries.write().await;

        let current = match entries.get(key) {
            None => U256::ZERO,
            Some(Value::Str(value)) => parse_counter(key, value)?,
            Some(_) => return Err(wrong_type(key)),
        };

        let updated = current
            .checked_add(amount)
            .ok_or_else(|| DbError::Overflow(key.to_string()))?;
        entries.insert(key.to_string(), Value::Str(updated.to_string()));

        Ok(updated)
    }

    async fn rpush(&self, key: &str, value: &str) -> DbResult<usize> {
        let mut entries = self.entries.write().await;
        let entry = entries
            .entry(key.to_string())
            .or_insert_with(|| Value::List(Vec::new()));

        match entry {
            Value::List(list) => {
                list.push(value.to_string());
                Ok(list.len())
            }
            _ => Err(wrong_type(key)),
        }
    }

    async fn lrange(&self, key: &str) -> DbResult<Vec<String>> {
        match self.entries.read().await.get(key) {
            None => Ok(vec![]),
            Some(Value::List(list)) => Ok(list.clone()),
            Some(_) => Err(wrong_type(key)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_strings_and_set_if_absent() {
        let store = InMemoryStore::new();

        assert_eq!(store.get("k").await.unwrap(), None);
        assert!(store.set_if_absent("k", "first").await.unwrap());
        assert!(!store.set_if_absent("k", "second").await.unwrap());
        assert_eq!(store.get("k").await.unwrap().as_deref(), Some("first"));

        store.set("k", "third").await.unwrap();
        assert_eq!(store.get("k").await.unwrap().as_deref(), Some("third"));

        assert!(store.del("k").await.unwrap());
        assert!(!store.del("k").await.unwrap());
    }

    #[tokio::test]
    async fn test_hashes_and_sets() {
        let store = InMemoryStore::new();

        store.hset("h", "pk", "txid").await.unwrap();
        assert_eq!(store.hget("h", "pk").await.unwrap().as_deref(), Some("txid"));
        assert_eq!(store.hget("h", "other").await.unwrap(), None);

        assert!(store.sadd("s", "b").await.unwrap());
        assert!(store.sadd("s", "a").await.unwrap());
        assert!(!store.sadd("s", "a").await.unwrap());
        assert_eq!(store.smembers("s").await.unwrap(), vec!["a", "b"]);

        assert!(store.srem("s", "a").await.unwrap());
        assert!(!store.srem("s", "a").await.unwrap());
        assert_eq!(store.smembers("s").await.unwrap(), vec!["b"]);

        assert!(matches!(
            store.get("s").await,
            Err(DbError::WrongType(key)) if key == "s"
        ));
    }

    #[tokio::test]
    async fn test_incr_by_beyond_u64() {
        let store = InMemoryStore::new();
        let big = U256::from(u64::MAX);

        assert_eq!(store.incr_by("total", big).await.unwrap(), big);
        assert_eq!(
            store.incr_by("total", big).await.unwrap(),
            big + big
        );
        assert_eq!(
            store.get("total").await.unwrap().as_deref(),
            Some("36893488147419103230")
        );

        assert!(matches!(
            store.incr_by("total", U256::MAX).await,
            Err(DbError::Overflow(_))
        ));
    }

    #[tokio::test]
    async fn test_concurrent_set_if_absent_has_one_winner() {
        let store = InMemoryStore::new();

        let handles: Vec<_> = (0..16)
            .map(|i| {
                let store = store.clone();
                tokio::spawn(async move { store.set_if_absent("once", &i.to_string()).await })
            })
            .collect();

        let mut winners = 0;
        for handle in handles {
            if handle.await.unwrap().unwrap() {
                winners += 1;
            }
        }

        assert_eq!(winners, 1);
    }

    #[tokio::test]
    async fn test_lists() {
        let store = InMemoryStore::new();

        assert_eq!(store.rpush("q", "a").await.unwrap(), 1);
        assert_eq!(store.rpush("q", "b").await.unwrap(), 2);
        assert_eq!(store.lrange("q").await.unwrap(), vec!["a", "b"]);
        assert_eq!(store.lrange("missing").await.unwrap(), Vec::<String>::new());
    }
}
