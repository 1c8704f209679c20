use serde_json::Value;
use thiserror::Error;

use crate::schema::Record;

/// Store rejections carry a human-readable message which is surfaced to the
/// admin verbatim, prefixed with the schema title.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{0}")]
pub struct StoreError(pub String);

impl StoreError {
    pub fn new(message: impl Into<String>) -> Self {
        Self(message.into())
    }
}

/// Uniform query interface over one hosted table store. A handle is passed
/// to every record manager at construction; there is no global accessor.
///
/// Calls are all-or-nothing at the store's discretion: a failed bulk insert
/// inserts nothing.
pub trait RecordStore {
    async fn select(&self, table: &str) -> Result<Vec<Record>, StoreError>;

    /// Insert one or more records into `table`.
    async fn insert(&self, table: &str, records: Vec<Record>) -> Result<(), StoreError>;

    /// Delete every record whose `key_field` equals `key`.
    async fn delete(&self, table: &str, key_field: &str, key: &Value) -> Result<(), StoreError>;
}
