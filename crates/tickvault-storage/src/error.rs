//! Storage error types.

use thiserror::Error;

use tickvault_core::CoreError;

/// Storage operation result type.
pub type StorageResult<T> = Result<T, StorageError>;

/// Storage error types.
///
/// An inverted load range (`start > end`) is not an error; it yields an
/// empty result.
#[derive(Debug, Error)]
pub enum StorageError {
    /// The underlying engine could not be opened or failed an I/O operation.
    #[error("Store unavailable: {0}")]
    StoreUnavailable(String),

    /// A transaction could not be started or committed.
    #[error("Transaction error: {0}")]
    Transaction(String),

    /// A record could not be encoded.
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Stored bytes do not match the expected schema.
    #[error("Decode error: {record} - {reason}")]
    Decode {
        /// The kind of record being decoded (e.g., "bar", "tick overview").
        record: &'static str,
        /// What did not match.
        reason: String,
    },

    /// A save was called with no records.
    #[error("Empty batch: no {record} records to save")]
    EmptyBatch {
        /// The kind of record being saved.
        record: &'static str,
    },

    /// Records of one save call belong to different partitions.
    #[error("Mixed partition: batch started with '{expected}' but contains '{found}'")]
    MixedPartition {
        /// Partition of the first record.
        expected: String,
        /// Partition of the offending record.
        found: String,
    },

    /// A value cannot be used as part of a storage key.
    #[error("Invalid key field: {field} '{value}' - {reason}")]
    InvalidKeyField {
        /// Which field was rejected.
        field: &'static str,
        /// The rejected value.
        value: String,
        /// Why it was rejected.
        reason: &'static str,
    },

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration error.
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Error from a core type.
    #[error(transparent)]
    Core(#[from] CoreError),
}

impl StorageError {
    /// Creates a decode error.
    pub fn decode(record: &'static str, reason: impl Into<String>) -> Self {
        StorageError::Decode {
            record,
            reason: reason.into(),
        }
    }

    /// Creates an invalid key field error.
    pub fn invalid_key_field(
        field: &'static str,
        value: impl Into<String>,
        reason: &'static str,
    ) -> Self {
        StorageError::InvalidKeyField {
            field,
            value: value.into(),
            reason,
        }
    }
}

impl From<redb::Error> for StorageError {
    fn from(err: redb::Error) -> Self {
        StorageError::StoreUnavailable(err.to_string())
    }
}

impl From<redb::DatabaseError> for StorageError {
    fn from(err: redb::DatabaseError) -> Self {
        StorageError::StoreUnavailable(err.to_string())
    }
}

impl From<redb::TableError> for StorageError {
    fn from(err: redb::TableError) -> Self {
        StorageError::StoreUnavailable(err.to_string())
    }
}

impl From<redb::TransactionError> for StorageError {
    fn from(err: redb::TransactionError) -> Self {
        StorageError::Transaction(err.to_string())
    }
}

impl From<redb::CommitError> for StorageError {
    fn from(err: redb::CommitError) -> Self {
        StorageError::Transaction(err.to_string())
    }
}

impl From<redb::StorageError> for StorageError {
    fn from(err: redb::StorageError) -> Self {
        StorageError::StoreUnavailable(err.to_string())
    }
}

impl From<toml::de::Error> for StorageError {
    fn from(err: toml::de::Error) -> Self {
        StorageError::Configuration(err.to_string())
    }
}
