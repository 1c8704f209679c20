//! Generic record manager: list, create, delete and CSV bulk import/export
//! over one table, typed by a [`RecordSchema`].
//!
//! Each manager owns its own row page, form buffers and pasted import text;
//! nothing is shared between instances. Operations take `&mut self`, so two
//! calls on the same instance never overlap.

use serde_json::Value;
use thiserror::Error;
use tracing::debug;

use crate::bulk::{self, ImportError};
use crate::schema::{CoerceError, FormState, RawValue, Record, RecordSchema};
use crate::store::{RecordStore, StoreError};

/// Rows kept locally per schema: the first page of the table, refreshed
/// wholesale after every successful create or delete.
pub const PAGE_LIMIT: usize = 50;

#[derive(Debug, Error)]
pub enum ManagerError {
    #[error("{title}: load failed: {source}")]
    Load { title: &'static str, source: StoreError },
    #[error("{title}: create failed: {source}")]
    Create { title: &'static str, source: StoreError },
    #[error("{title}: invalid input: {source}")]
    Invalid { title: &'static str, source: CoerceError },
    #[error("{title}: delete failed: {source}")]
    Delete { title: &'static str, source: StoreError },
    #[error("{title}: import failed: {source}")]
    Import { title: &'static str, source: StoreError },
    #[error("{title}: {source}")]
    BadImportText { title: &'static str, source: ImportError },
}

/// What a CSV download hands back to the caller.
#[derive(Debug, Clone, serde::Serialize)]
pub struct CsvExport {
    pub filename: String,
    pub mime: &'static str,
    pub content: String,
}

pub struct RecordManager<S> {
    schema: RecordSchema,
    store: S,
    rows: Vec<Record>,
    form: FormState,
    import_text: String,
}

impl<S: RecordStore> RecordManager<S> {
    pub fn new(schema: RecordSchema, store: S) -> Self {
        Self {
            schema,
            store,
            rows: Vec::new(),
            form: FormState::new(),
            import_text: String::new(),
        }
    }

    pub fn schema(&self) -> &RecordSchema {
        &self.schema
    }

    pub fn rows(&self) -> &[Record] {
        &self.rows
    }

    pub fn form(&self) -> &FormState {
        &self.form
    }

    /// Replace the form buffers wholesale (the UI posts the whole form).
    /// Keys outside the schema are dropped.
    pub fn set_form(&mut self, form: FormState) {
        self.form = form
            .into_iter()
            .filter(|(k, _)| self.schema.fields.iter().any(|f| f.key == k.as_str()))
            .collect();
    }

    pub fn set_field(&mut self, key: &str, raw: RawValue) {
        if self.schema.fields.iter().any(|f| f.key == key) {
            self.form.insert(key.to_string(), raw);
        }
    }

    pub fn import_text(&self) -> &str {
        &self.import_text
    }

    pub fn set_import_text(&mut self, text: String) {
        self.import_text = text;
    }

    /// Fetch the first [`PAGE_LIMIT`] rows and replace the local page. On
    /// failure the page is left as it was.
    pub async fn load(&mut self) -> Result<(), ManagerError> {
        let mut rows = self
            .store
            .select(self.schema.table)
            .await
            .map_err(|source| ManagerError::Load { title: self.schema.title, source })?;
        rows.truncate(PAGE_LIMIT);
        self.rows = rows;
        Ok(())
    }

    /// Coerce the form into a record and insert it. A coercion error aborts
    /// before any store call; a successful insert clears the form and
    /// reloads the page.
    pub async fn create(&mut self) -> Result<(), ManagerError> {
        let record = self
            .schema
            .coerce_form(&self.form)
            .map_err(|source| ManagerError::Invalid { title: self.schema.title, source })?;
        self.store
            .insert(self.schema.table, vec![record])
            .await
            .map_err(|source| ManagerError::Create { title: self.schema.title, source })?;
        self.form.clear();
        debug!(table = self.schema.table, "record created");
        self.load().await
    }

    /// Delete the record whose primary key equals `key`, then reload. A
    /// failed delete leaves the page untouched and does not reload.
    pub async fn delete(&mut self, key: &Value) -> Result<(), ManagerError> {
        self.store
            .delete(self.schema.table, self.schema.id_field, key)
            .await
            .map_err(|source| ManagerError::Delete { title: self.schema.title, source })?;
        debug!(table = self.schema.table, %key, "record deleted");
        self.load().await
    }

    /// Render the current page as a downloadable CSV artifact.
    pub fn export_csv(&self) -> CsvExport {
        CsvExport {
            filename: bulk::export_filename(self.schema.table),
            mime: bulk::CSV_MIME,
            content: bulk::export(&self.schema.fields, &self.rows),
        }
    }

    /// Parse the pasted import text and bulk-insert the records in one store
    /// call. Failure leaves the pasted text intact; success clears it and
    /// reloads. Returns how many records were inserted.
    pub async fn import_csv(&mut self) -> Result<usize, ManagerError> {
        let records = bulk::parse_records(&self.import_text)
            .map_err(|source| ManagerError::BadImportText { title: self.schema.title, source })?;
        let count = records.len();
        self.store
            .insert(self.schema.table, records)
            .await
            .map_err(|source| ManagerError::Import { title: self.schema.title, source })?;
        self.import_text.clear();
        debug!(table = self.schema.table, count, "csv import complete");
        self.load().await?;
        Ok(count)
    }
}
