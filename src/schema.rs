use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

/// How a record field is edited, coerced and serialized.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldKind {
    Text,
    Number,
    Multiline,
    Json,
    Boolean,
}

#[derive(Debug, Clone, Serialize)]
pub struct FieldDef {
    pub key: &'static str,
    pub label: &'static str,
    pub kind: FieldKind,
}

impl FieldDef {
    pub const fn new(key: &'static str, label: &'static str, kind: FieldKind) -> Self {
        Self { key, label, kind }
    }
}

/// One record type: table name, primary key field and the ordered field list
/// that drives form rendering, coercion and CSV headers.
#[derive(Debug, Clone, Serialize)]
pub struct RecordSchema {
    pub title: &'static str,
    pub table: &'static str,
    pub id_field: &'static str,
    pub fields: Vec<FieldDef>,
}

impl RecordSchema {
    /// Coerce the raw form buffers into a typed record, in field order.
    /// Every schema key ends up in the record, absent buffers as null
    /// (booleans as false).
    pub fn coerce_form(&self, form: &FormState) -> Result<Record, CoerceError> {
        let mut record = Record::new();
        for field in &self.fields {
            let value = coerce(field, form.get(field.key))?;
            record.insert(field.key.to_string(), value);
        }
        Ok(record)
    }
}

/// Untyped record, keyed by field key. Field kinds are known only through
/// the schema.
pub type Record = serde_json::Map<String, Value>;

/// Raw edit buffers, one per field key. Checkbox fields buffer a bool,
/// everything else a string.
pub type FormState = HashMap<String, RawValue>;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RawValue {
    Bool(bool),
    Text(String),
}

#[derive(Debug, Error)]
pub enum CoerceError {
    #[error("{label}: invalid JSON: {message}")]
    Json { label: &'static str, message: String },
    #[error("{label}: not a number: {raw:?}")]
    Number { label: &'static str, raw: String },
}

fn coerce(field: &FieldDef, raw: Option<&RawValue>) -> Result<Value, CoerceError> {
    match field.kind {
        FieldKind::Json => match raw {
            Some(RawValue::Bool(b)) => Ok(Value::Bool(*b)),
            _ => {
                let s = raw_text(raw);
                if s.trim().is_empty() {
                    Ok(Value::Null)
                } else {
                    serde_json::from_str(s).map_err(|e| CoerceError::Json {
                        label: field.label,
                        message: e.to_string(),
                    })
                }
            }
        },
        FieldKind::Number => match raw {
            None => Ok(Value::Null),
            Some(RawValue::Bool(b)) => Err(CoerceError::Number {
                label: field.label,
                raw: b.to_string(),
            }),
            Some(RawValue::Text(s)) => {
                let s = s.trim();
                if s.is_empty() {
                    Ok(Value::Null)
                } else if let Ok(i) = s.parse::<i64>() {
                    Ok(Value::from(i))
                } else if let Ok(f) = s.parse::<f64>() {
                    Ok(Value::from(f))
                } else {
                    Err(CoerceError::Number {
                        label: field.label,
                        raw: s.to_string(),
                    })
                }
            }
        },
        FieldKind::Boolean => Ok(Value::Bool(match raw {
            None => false,
            Some(RawValue::Bool(b)) => *b,
            Some(RawValue::Text(s)) => !s.is_empty(),
        })),
        FieldKind::Text | FieldKind::Multiline => Ok(match raw {
            None => Value::Null,
            Some(RawValue::Bool(b)) => Value::String(b.to_string()),
            Some(RawValue::Text(s)) => Value::String(s.clone()),
        }),
    }
}

fn raw_text(raw: Option<&RawValue>) -> &str {
    match raw {
        Some(RawValue::Text(s)) => s,
        _ => "",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn field(kind: FieldKind) -> FieldDef {
        FieldDef::new("f", "Field", kind)
    }

    fn text(s: &str) -> Option<RawValue> {
        Some(RawValue::Text(s.to_string()))
    }

    #[test]
    fn json_empty_string_is_null() {
        let v = coerce(&field(FieldKind::Json), text("").as_ref()).unwrap();
        assert_eq!(v, Value::Null);
    }

    #[test]
    fn json_object_parses() {
        let v = coerce(&field(FieldKind::Json), text("{\"a\":1}").as_ref()).unwrap();
        assert_eq!(v, json!({"a": 1}));
    }

    #[test]
    fn json_garbage_is_an_error() {
        let err = coerce(&field(FieldKind::Json), text("{bad").as_ref()).unwrap_err();
        assert!(matches!(err, CoerceError::Json { label: "Field", .. }));
    }

    #[test]
    fn unset_boolean_is_false() {
        let v = coerce(&field(FieldKind::Boolean), None).unwrap();
        assert_eq!(v, Value::Bool(false));
    }

    #[test]
    fn number_parses_int_then_float() {
        assert_eq!(coerce(&field(FieldKind::Number), text("42").as_ref()).unwrap(), json!(42));
        assert_eq!(coerce(&field(FieldKind::Number), text("6.5").as_ref()).unwrap(), json!(6.5));
    }

    #[test]
    fn number_empty_is_null_and_garbage_errors() {
        assert_eq!(coerce(&field(FieldKind::Number), text("").as_ref()).unwrap(), Value::Null);
        let err = coerce(&field(FieldKind::Number), text("many").as_ref()).unwrap_err();
        assert!(matches!(err, CoerceError::Number { .. }));
    }

    #[test]
    fn unset_text_is_null() {
        assert_eq!(coerce(&field(FieldKind::Text), None).unwrap(), Value::Null);
    }

    #[test]
    fn coerce_form_covers_every_schema_key() {
        let schema = RecordSchema {
            title: "Things",
            table: "things",
            id_field: "id",
            fields: vec![
                FieldDef::new("name", "Name", FieldKind::Text),
                FieldDef::new("count", "Count", FieldKind::Number),
                FieldDef::new("active", "Active", FieldKind::Boolean),
            ],
        };
        let mut form = FormState::new();
        form.insert("name".into(), RawValue::Text("quiz".into()));

        let record = schema.coerce_form(&form).unwrap();
        assert_eq!(record.get("name"), Some(&json!("quiz")));
        assert_eq!(record.get("count"), Some(&Value::Null));
        assert_eq!(record.get("active"), Some(&Value::Bool(false)));
    }
}
