//! [`sled`]-backed implementation of [`KvStore`].

use std::{
    fs,
    path::{Path, PathBuf},
};

use async_trait::async_trait;
use ethnum::U256;
use sled::{Db, Tree};
use tracing::{debug, trace};

use crate::{
    errors::{DbError, DbResult},
    store::{parse_counter, KvStore},
};

const STRINGS_TREE: &str = "strings";
const HASHES_TREE: &str = "hashes";
const SETS_TREE: &str = "sets";
const LISTS_TREE: &str = "lists";

/// Separates a key from a field or member in composite tree keys.
const SEPARATOR: char = '\u{0}';

/// Configuration for a [`SledStore`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SledStoreConfig {
    /// Directory of the database.
    pub path: PathBuf,
}

/// Persistent store with one sled tree per value type.
///
/// Hash fields and set members are stored as individual entries under `key\0field` so that
/// single-member operations are atomic without read-modify-write cycles.
#[derive(Debug, Clone)]
pub struct SledStore {
    strings: Tree,
    hashes: Tree,
    sets: Tree,
    lists: Tree,
}

impl SledStore {
    /// Opens or creates the database at the configured path.
    pub fn open(config: &SledStoreConfig) -> DbResult<Self> {
        if !config.path.exists() {
            fs::create_dir_all(&config.path).map_err(|e| DbError::Sled(e.into()))?;
        }

        debug!(path = %config.path.display(), "opening sled database");
        let db = sled::open(&config.path)?;

        Self::from_db(&db)
    }

    /// Opens a database that is removed when dropped.
    pub fn temporary() -> DbResult<Self> {
        let db = sled::Config::new().temporary(true).open()?;

        Self::from_db(&db)
    }

    fn from_db(db: &Db) -> DbResult<Self> {
        Ok(Self {
            strings: db.open_tree(STRINGS_TREE)?,
            hashes: db.open_tree(HASHES_TREE)?,
            sets: db.open_tree(SETS_TREE)?,
            lists: db.open_tree(LISTS_TREE)?,
        })
    }

    /// Flushes pending writes to disk.
    pub async fn flush(&self) -> DbResult<()> {
        for tree in [&self.strings, &self.hashes, &self.sets, &self.lists] {
            tree.flush_async().await?;
        }

        Ok(())
    }
}

fn composite(key: &str, field: &str) -> String {
    format!("{key}{SEPARATOR}{field}")
}

fn prefix(key: &str) -> String {
    format!("{key}{SEPARATOR}")
}

fn decode_string(key: &str, bytes: &[u8]) -> DbResult<String> {
    String::from_utf8(bytes.to_vec()).map_err(|e| DbError::InvalidData {
        key: key.to_string(),
        reason: e.to_string(),
    })
}

fn decode_list(key: &str, bytes: &[u8]) -> DbResult<Vec<String>> {
    serde_json::from_slice(bytes).map_err(|e| DbError::InvalidData {
        key: key.to_string(),
        reason: e.to_string(),
    })
}

fn remove_prefix(tree: &Tree, key: &str) -> DbResult<bool> {
    let mut removed = false;
    for entry in tree.scan_prefix(prefix(key)).keys() {
        tree.remove(entry?)?;
        removed = true;
    }

    Ok(removed)
}

#[async_trait]
impl KvStore for SledStore {
    async fn get(&self, key: &str) -> DbResult<Option<String>> {
        self.strings
            .get(key)?
            .map(|bytes| decode_string(key, &bytes))
            .transpose()
    }

    async fn set(&self, key: &str, value: &str) -> DbResult<()> {
        trace!(%key, "set");
        self.strings.insert(key, value.as_bytes())?;

        Ok(())
    }

    async fn set_if_absent(&self, key: &str, value: &str) -> DbResult<bool> {
        let swapped = self
            .strings
            .compare_and_swap(key, None as Option<&[u8]>, Some(value.as_bytes()))?;

        Ok(swapped.is_ok())
    }

    async fn del(&self, key: &str) -> DbResult<bool> {
        let mut removed = self.strings.remove(key)?.is_some();
        removed |= self.lists.remove(key)?.is_some();
        removed |= remove_prefix(&self.hashes, key)?;
        removed |= remove_prefix(&self.sets, key)?;

        Ok(removed)
    }

    async fn hget(&self, key: &str, field: &str) -> DbResult<Option<String>> {
        self.hashes
            .get(composite(key, field))?
            .map(|bytes| decode_string(key, &bytes))
            .transpose()
    }

    async fn hset(&self, key: &str, field: &str, value: &str) -> DbResult<()> {
        self.hashes.insert(composite(key, field), value.as_bytes())?;

        Ok(())
    }

    async fn sadd(&self, key: &str, member: &str) -> DbResult<bool> {
        let previous = self.sets.insert(composite(key, member), Vec::<u8>::new())?;

        Ok(previous.is_none())
    }

    async fn srem(&self, key: &str, member: &str) -> DbResult<bool> {
        Ok(self.sets.remove(composite(key, member))?.is_some())
    }

    async fn smembers(&self, key: &str) -> DbResult<Vec<String>> {
        let prefix = prefix(key);

        self.sets
            .scan_prefix(&prefix)
            .keys()
            .map(|entry| {
                let entry = entry?;
                let member = &entry[prefix.len()..];

                decode_string(key, member)
            })
            .collect()
    }

    async fn incr_by(&self, key: &str, amount: U256) -> DbResult<U256> {
        let mut failure = None;

        let updated = self.strings.update_and_fetch(key, |old| {
            failure = None;

            let current = match old.map(|bytes| {
                decode_string(key, bytes).and_then(|value| parse_counter(key, &value))
            }) {
                None => U256::ZERO,
                Some(Ok(current)) => current,
                Some(Err(e)) => {
                    failure = Some(e);
                    return old.map(<[u8]>::to_vec);
                }
            };

            match current.checked_add(amount) {
                Some(updated) => Some(updated.to_string().into_bytes()),
                None => {
                    failure = Some(DbError::Overflow(key.to_string()));
                    old.map(<[u8]>::to_vec)
                }
            }
        })?;

        if let Some(e) = failure {
            return Err(e);
        }

        let updated = updated.ok_or_else(|| DbError::InvalidData {
            key: key.to_string(),
            reason: "counter vanished during update".to_string(),
        })?;

        parse_counter(key, &decode_string(key, &updated)?)
    }

    async fn rpush(&self, key: &str, value: &str) -> DbResult<usize> {
        let mut failure = None;

        let updated = self.lists.update_and_fetch(key, |old| {
            failure = None;

            let mut list = match old.map(|bytes| decode_list(key, bytes)) {
                None => Vec::new(),
                Some(Ok(list)) => list,
                Some(Err(e)) => {
                    failure = Some(e);
                    return old.map(<[u8]>::to_vec);
                }
            };
            list.push(value.to_string());

            match serde_json::to_vec(&list) {
                Ok(bytes) => Some(bytes),
                Err(e) => {
                    failure = Some(DbError::InvalidData {
                        key: key.to_string(),
                        reason: e.to_string(),
                    });
                    old.map(<[u8]>::to_vec)
                }
            }
        })?;

        if let Some(e) = failure {
            return Err(e);
        }

        match updated {
            Some(bytes) => Ok(decode_list(key, &bytes)?.len()),
            None => Err(DbError::InvalidData {
                key: key.to_string(),
                reason: "list could not be encoded".to_string(),
            }),
        }
    }

    async fn lrange(&self, key: &str) -> DbResult<Vec<String>> {
        match self.lists.get(key)? {
            None => Ok(vec![]),
            Some(bytes) => decode_list(key, &bytes),
        }
    }
}

/// Opens the sled database under `datadir/sled`.
pub fn open_in_datadir(datadir: &Path) -> DbResult<SledStore> {
    SledStore::open(&SledStoreConfig {
        path: datadir.join("sled"),
    })
}
