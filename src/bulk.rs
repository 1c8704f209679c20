//! CSV bulk export/import for one schema's rows.
//!
//! Export is the dashboard download format: header line is the field keys
//! joined by commas, every data cell is double-quoted with internal quotes
//! doubled, composite values JSON-stringified. Import accepts pasted text,
//! quote-aware (quoted cells may contain commas and newlines), and parses
//! each cell opportunistically as JSON so numbers, booleans and JSON
//! literals come back typed.

use std::time::{SystemTime, UNIX_EPOCH};

use serde_json::Value;
use thiserror::Error;

use crate::schema::{FieldDef, Record};

pub const CSV_MIME: &str = "text/csv;charset=utf-8";

#[derive(Debug, Error, PartialEq)]
pub enum ImportError {
    #[error("paste a header line and at least one data row")]
    NoRows,
    #[error("malformed CSV: {0}")]
    Malformed(String),
}

/// `{table}_{unixMillis}.csv`
pub fn export_filename(table: &str) -> String {
    let millis = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis())
        .unwrap_or(0);
    format!("{table}_{millis}.csv")
}

pub fn export(fields: &[FieldDef], rows: &[Record]) -> String {
    let header: Vec<&str> = fields.iter().map(|f| f.key).collect();
    let mut out = header.join(",");
    for row in rows {
        out.push('\n');
        for (i, field) in fields.iter().enumerate() {
            if i > 0 {
                out.push(',');
            }
            out.push('"');
            out.push_str(&cell_text(row.get(field.key)).replace('"', "\"\""));
            out.push('"');
        }
    }
    out
}

fn cell_text(value: Option<&Value>) -> String {
    match value {
        None | Some(Value::Null) => String::new(),
        Some(Value::String(s)) => s.clone(),
        Some(Value::Bool(b)) => b.to_string(),
        Some(Value::Number(n)) => n.to_string(),
        // composites double-serialize
        Some(v) => v.to_string(),
    }
}

/// Parse pasted CSV text into records keyed by the header row. Rows shorter
/// than the header are zero-filled with empty strings. Header-only or empty
/// input is reported, not silently dropped.
pub fn parse_records(text: &str) -> Result<Vec<Record>, ImportError> {
    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .trim(csv::Trim::Headers)
        .from_reader(text.as_bytes());

    let headers: Vec<String> = match reader.headers() {
        Ok(h) => h.iter().map(|s| s.to_string()).collect(),
        Err(e) => return Err(ImportError::Malformed(e.to_string())),
    };

    let mut records = Vec::new();
    for row in reader.records() {
        let row = row.map_err(|e| ImportError::Malformed(e.to_string()))?;
        let mut record = Record::new();
        for (i, header) in headers.iter().enumerate() {
            let cell = row.get(i).unwrap_or("");
            record.insert(header.clone(), parse_cell(cell));
        }
        records.push(record);
    }

    if headers.is_empty() || records.is_empty() {
        return Err(ImportError::NoRows);
    }
    Ok(records)
}

/// A cell that parses as JSON keeps the parsed value, anything else stays a
/// raw string.
fn parse_cell(cell: &str) -> Value {
    serde_json::from_str(cell).unwrap_or_else(|_| Value::String(cell.to_string()))
}
