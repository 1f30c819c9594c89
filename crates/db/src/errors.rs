//! Errors raised by the stores.

use thiserror::Error;

/// Errors that can occur when interacting with a store.
#[derive(Debug, Error)]
pub enum DbError {
    /// An error occurred in the sled database.
    #[error("sled: {0}")]
    Sled(#[from] sled::Error),

    /// A key holds a value of a different type than the operation expects.
    #[error("key {0} holds a value of the wrong type")]
    WrongType(String),

    /// A stored value could not be decoded.
    #[error("invalid data under {key}: {reason}")]
    InvalidData {
        /// The key the value is stored under.
        key: String,

        /// What is wrong with it.
        reason: String,
    },

    /// An increment would overflow the counter.
    #[error("counter {0} would overflow")]
    Overflow(String),
}

/// Wrapper type for results that can fail with a [`DbError`].
pub type DbResult<T> = Result<T, DbError>;
