use std::collections::HashMap;

use axum::{
    Router,
    extract::State,
    extract::ws::{Message, WebSocket, WebSocketUpgrade},
    response::IntoResponse,
    routing::get,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tower_http::services::ServeDir;
use tracing::{info, warn};

use crate::catalog;
use crate::manager::{CsvExport, RecordManager};
use crate::memory::MemoryHandle;
use crate::schema::{FormState, RawValue, Record, RecordSchema};
use crate::store::RecordStore;

#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum AdminCommand {
    ListSchemas,
    Load { table: String },
    SetField { table: String, key: String, value: RawValue },
    Create { table: String, form: Option<FormState> },
    Delete { table: String, id: Value },
    ExportCsv { table: String },
    ImportCsv { table: String, text: String },
}

#[derive(Debug, Serialize)]
#[serde(untagged)]
pub enum AdminResponse {
    Schemas {
        ok: bool,
        schemas: Vec<RecordSchema>,
    },
    Ok {
        ok: bool,
    },
    Rows {
        ok: bool,
        table: String,
        rows: Vec<Record>,
        #[serde(skip_serializing_if = "Option::is_none")]
        imported: Option<usize>,
    },
    Csv {
        ok: bool,
        export: CsvExport,
    },
    Error {
        ok: bool,
        error: String,
    },
}

impl AdminResponse {
    fn error(message: impl Into<String>) -> Self {
        AdminResponse::Error { ok: false, error: message.into() }
    }

    fn rows(table: &str, rows: &[Record], imported: Option<usize>) -> Self {
        AdminResponse::Rows {
            ok: true,
            table: table.to_string(),
            rows: rows.to_vec(),
            imported,
        }
    }
}

/// One dashboard connection: a record manager per table the admin has
/// touched, each owning its page, form and import buffer exclusively.
pub struct Session<S> {
    store: S,
    managers: HashMap<String, RecordManager<S>>,
}

impl<S: RecordStore + Clone> Session<S> {
    pub fn new(store: S) -> Self {
        Self { store, managers: HashMap::new() }
    }

    fn manager(&mut self, table: &str) -> Result<&mut RecordManager<S>, String> {
        if !self.managers.contains_key(table) {
            let schema = catalog::find(table).ok_or_else(|| format!("unknown table: {table}"))?;
            self.managers
                .insert(table.to_string(), RecordManager::new(schema, self.store.clone()));
        }
        Ok(self.managers.get_mut(table).expect("just inserted"))
    }

    pub async fn apply(&mut self, cmd: AdminCommand) -> AdminResponse {
        match cmd {
            AdminCommand::ListSchemas => {
                AdminResponse::Schemas { ok: true, schemas: catalog::schemas() }
            }
            AdminCommand::Load { table } => {
                let mgr = match self.manager(&table) {
                    Ok(m) => m,
                    Err(e) => return AdminResponse::error(e),
                };
                match mgr.load().await {
                    Ok(()) => AdminResponse::rows(mgr.schema().table, mgr.rows(), None),
                    Err(e) => AdminResponse::error(e.to_string()),
                }
            }
            AdminCommand::SetField { table, key, value } => {
                let mgr = match self.manager(&table) {
                    Ok(m) => m,
                    Err(e) => return AdminResponse::error(e),
                };
                mgr.set_field(&key, value);
                AdminResponse::Ok { ok: true }
            }
            AdminCommand::Create { table, form } => {
                let mgr = match self.manager(&table) {
                    Ok(m) => m,
                    Err(e) => return AdminResponse::error(e),
                };
                // A posted form replaces the buffers; without one, create
                // uses whatever setField has accumulated.
                if let Some(form) = form {
                    mgr.set_form(form);
                }
                match mgr.create().await {
                    Ok(()) => AdminResponse::rows(mgr.schema().table, mgr.rows(), None),
                    Err(e) => AdminResponse::error(e.to_string()),
                }
            }
            AdminCommand::Delete { table, id } => {
                let mgr = match self.manager(&table) {
                    Ok(m) => m,
                    Err(e) => return AdminResponse::error(e),
                };
                match mgr.delete(&id).await {
                    Ok(()) => AdminResponse::rows(mgr.schema().table, mgr.rows(), None),
                    Err(e) => AdminResponse::error(e.to_string()),
                }
            }
            AdminCommand::ExportCsv { table } => {
                let mgr = match self.manager(&table) {
                    Ok(m) => m,
                    Err(e) => return AdminResponse::error(e),
                };
                AdminResponse::Csv { ok: true, export: mgr.export_csv() }
            }
            AdminCommand::ImportCsv { table, text } => {
                let mgr = match self.manager(&table) {
                    Ok(m) => m,
                    Err(e) => return AdminResponse::error(e),
                };
                mgr.set_import_text(text);
                match mgr.import_csv().await {
                    Ok(count) => AdminResponse::rows(mgr.schema().table, mgr.rows(), Some(count)),
                    Err(e) => AdminResponse::error(e.to_string()),
                }
            }
        }
    }
}

pub fn router(store: MemoryHandle) -> Router {
    Router::new()
        .route("/ws", get(ws_handler))
        .nest_service("/", ServeDir::new("web"))
        .with_state(store)
}

async fn ws_handler(ws: WebSocketUpgrade, State(store): State<MemoryHandle>) -> impl IntoResponse {
    ws.on_upgrade(|socket| handle_socket(socket, store))
}

async fn handle_socket(mut socket: WebSocket, store: MemoryHandle) {
    info!("admin connected");
    let mut session = Session::new(store);

    while let Some(Ok(msg)) = socket.recv().await {
        let Message::Text(text) = msg else {
            continue;
        };

        let response = match serde_json::from_str::<AdminCommand>(&text) {
            Ok(cmd) => session.apply(cmd).await,
            Err(e) => AdminResponse::error(format!("invalid command: {e}")),
        };

        let json = match serde_json::to_string(&response) {
            Ok(json) => json,
            Err(e) => {
                warn!("response encoding failed: {e}");
                break;
            }
        };
        if socket.send(Message::Text(json.into())).await.is_err() {
            break;
        }
    }
    info!("admin disconnected");
}
