//! In-memory table store, the runnable stand-in for the hosted database.
//!
//! The store runs as a single task owning all tables; handles talk to it
//! over an mpsc channel and get replies on a oneshot, so every call is
//! all-or-nothing from the caller's point of view.

use std::collections::HashMap;

use serde_json::Value;
use tokio::sync::{mpsc, oneshot};
use tracing::debug;

use crate::schema::Record;
use crate::store::{RecordStore, StoreError};

pub enum StoreCommand {
    Select {
        table: String,
        respond_to: oneshot::Sender<Result<Vec<Record>, StoreError>>,
    },
    Insert {
        table: String,
        records: Vec<Record>,
        respond_to: oneshot::Sender<Result<(), StoreError>>,
    },
    Delete {
        table: String,
        key_field: String,
        key: Value,
        respond_to: oneshot::Sender<Result<(), StoreError>>,
    },
}

#[derive(Debug, Default)]
pub struct MemoryStore {
    tables: HashMap<String, TableData>,
}

#[derive(Debug, Default)]
struct TableData {
    rows: Vec<Record>,
    next_id: u64,
}

impl MemoryStore {
    /// A store with one empty table per name.
    pub fn with_tables<'a>(names: impl IntoIterator<Item = &'a str>) -> Self {
        let tables = names
            .into_iter()
            .map(|n| (n.to_string(), TableData { rows: Vec::new(), next_id: 1 }))
            .collect();
        Self { tables }
    }

    pub fn spawn(self) -> MemoryHandle {
        let (tx, rx) = mpsc::channel(1024);
        tokio::spawn(self.run(rx));
        MemoryHandle { tx }
    }

    pub async fn run(mut self, mut rx: mpsc::Receiver<StoreCommand>) {
        while let Some(cmd) = rx.recv().await {
            match cmd {
                StoreCommand::Select { table, respond_to } => {
                    let _ = respond_to.send(self.select_rows(&table));
                }
                StoreCommand::Insert { table, records, respond_to } => {
                    let _ = respond_to.send(self.insert_rows(&table, records));
                }
                StoreCommand::Delete { table, key_field, key, respond_to } => {
                    let _ = respond_to.send(self.delete_rows(&table, &key_field, &key));
                }
            }
        }
        debug!("memory store stopped");
    }

    fn table(&mut self, name: &str) -> Result<&mut TableData, StoreError> {
        self.tables
            .get_mut(name)
            .ok_or_else(|| StoreError::new(format!("table {name:?} does not exist")))
    }

    fn select_rows(&self, table: &str) -> Result<Vec<Record>, StoreError> {
        self.tables
            .get(table)
            .map(|t| t.rows.clone())
            .ok_or_else(|| StoreError::new(format!("table {table:?} does not exist")))
    }

    fn insert_rows(&mut self, table: &str, records: Vec<Record>) -> Result<(), StoreError> {
        let data = self.table(table)?;
        for mut record in records {
            // Every catalog table keys on "id"; assign one when the caller
            // left it out, like the hosted store would.
            let missing_id = matches!(record.get("id"), None | Some(Value::Null));
            if missing_id {
                record.insert("id".to_string(), Value::from(data.next_id));
                data.next_id += 1;
            }
            data.rows.push(record);
        }
        Ok(())
    }

    fn delete_rows(&mut self, table: &str, key_field: &str, key: &Value) -> Result<(), StoreError> {
        let data = self.table(table)?;
        // Deleting zero rows is not an error, matching hosted-store semantics.
        data.rows.retain(|r| r.get(key_field) != Some(key));
        Ok(())
    }
}

#[derive(Clone)]
pub struct MemoryHandle {
    tx: mpsc::Sender<StoreCommand>,
}

impl MemoryHandle {
    async fn request<T>(
        &self,
        cmd: StoreCommand,
        rx: oneshot::Receiver<Result<T, StoreError>>,
    ) -> Result<T, StoreError> {
        if self.tx.send(cmd).await.is_err() {
            return Err(StoreError::new("store unavailable"));
        }
        rx.await.unwrap_or_else(|_| Err(StoreError::new("store dropped the request")))
    }
}

impl RecordStore for MemoryHandle {
    async fn select(&self, table: &str) -> Result<Vec<Record>, StoreError> {
        let (respond_to, rx) = oneshot::channel();
        self.request(StoreCommand::Select { table: table.to_string(), respond_to }, rx)
            .await
    }

    async fn insert(&self, table: &str, records: Vec<Record>) -> Result<(), StoreError> {
        let (respond_to, rx) = oneshot::channel();
        self.request(
            StoreCommand::Insert { table: table.to_string(), records, respond_to },
            rx,
        )
        .await
    }

    async fn delete(&self, table: &str, key_field: &str, key: &Value) -> Result<(), StoreError> {
        let (respond_to, rx) = oneshot::channel();
        self.request(
            StoreCommand::Delete {
                table: table.to_string(),
                key_field: key_field.to_string(),
                key: key.clone(),
                respond_to,
            },
            rx,
        )
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn record(pairs: &[(&str, Value)]) -> Record {
        pairs.iter().map(|(k, v)| (k.to_string(), v.clone())).collect()
    }

    #[tokio::test]
    async fn insert_assigns_missing_ids() {
        let store = MemoryStore::with_tables(["resources"]).spawn();
        store
            .insert("resources", vec![record(&[("title", json!("NEET guide"))])])
            .await
            .unwrap();
        store
            .insert("resources", vec![record(&[("title", json!("JoSAA dates"))])])
            .await
            .unwrap();

        let rows = store.select("resources").await.unwrap();
        assert_eq!(rows[0].get("id"), Some(&json!(1)));
        assert_eq!(rows[1].get("id"), Some(&json!(2)));
    }

    #[tokio::test]
    async fn delete_matches_on_key_field() {
        let store = MemoryStore::with_tables(["college"]).spawn();
        store
            .insert(
                "college",
                vec![
                    record(&[("name", json!("GCT"))]),
                    record(&[("name", json!("PSG"))]),
                ],
            )
            .await
            .unwrap();

        store.delete("college", "id", &json!(1)).await.unwrap();
        let rows = store.select("college").await.unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].get("name"), Some(&json!("PSG")));

        // no match is still ok
        store.delete("college", "id", &json!(99)).await.unwrap();
        assert_eq!(store.select("college").await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn unknown_table_is_an_error() {
        let store = MemoryStore::default().spawn();
        let err = store.select("ghosts").await.unwrap_err();
        assert!(err.0.contains("ghosts"));
    }
}
