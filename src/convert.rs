//! Conversion utilities between Grist payloads and tool results.
//!
//! Reshapes raw Grist tables and records into the simplified output schema,
//! and extracts typed tool arguments from JSON argument maps.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value as JsonValue};

use crate::error::{McpError, Result};

/// Simplified table: Grist uses the table id as its name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Table {
    /// Table id
    pub id: String,
    /// Display name
    pub name: String,
}

/// Simplified record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Record {
    /// Row id
    pub id: i64,
    /// Field name to value
    pub fields: Map<String, JsonValue>,
}

/// Convert a raw Grist table to `{id, name}`. A missing id becomes `""`.
pub fn simplify_table(raw: &JsonValue) -> Table {
    let id = raw
        .get("id")
        .and_then(|v| v.as_str())
        .unwrap_or_default()
        .to_string();
    Table {
        name: id.clone(),
        id,
    }
}

/// Convert a raw Grist record to `{id, fields}`.
///
/// Missing ids become 0 and missing fields an empty map.
pub fn simplify_record(raw: &JsonValue) -> Record {
    Record {
        id: raw.get("id").and_then(|v| v.as_i64()).unwrap_or(0),
        fields: raw
            .get("fields")
            .and_then(|v| v.as_object())
            .cloned()
            .unwrap_or_default(),
    }
}

/// Keep only the requested fields. Names the record doesn't carry are dropped.
pub fn project_fields(record: Record, names: Option<&[String]>) -> Record {
    let Some(names) = names else {
        return record;
    };

    let mut fields = record.fields;
    let projected = names
        .iter()
        .filter_map(|name| fields.remove_entry(name.as_str()))
        .collect();

    Record {
        id: record.id,
        fields: projected,
    }
}

/// Extract `key` from a Grist envelope such as `{"records": [...]}`.
pub fn envelope_items<'a>(response: &'a JsonValue, key: &str) -> &'a [JsonValue] {
    response
        .get(key)
        .and_then(|v| v.as_array())
        .map(Vec::as_slice)
        .unwrap_or_default()
}

/// An array-typed argument as it arrives on the wire.
///
/// Some clients serialize arrays into JSON strings; both forms are accepted.
#[derive(Debug, Clone, PartialEq)]
pub enum RawArgument {
    /// A native JSON array
    Array(Vec<JsonValue>),
    /// A JSON-encoded array
    Encoded(String),
}

impl RawArgument {
    /// Classify an argument value; anything but an array or string is rejected.
    pub fn from_json(name: &str, value: JsonValue) -> Result<Self> {
        match value {
            JsonValue::Array(items) => Ok(RawArgument::Array(items)),
            JsonValue::String(s) => Ok(RawArgument::Encoded(s)),
            _ => Err(McpError::invalid_arg(name, "must be an array")),
        }
    }

    /// Decode into the array items.
    pub fn decode(self, name: &str) -> Result<Vec<JsonValue>> {
        match self {
            RawArgument::Array(items) => Ok(items),
            RawArgument::Encoded(s) => match serde_json::from_str::<JsonValue>(&s) {
                Ok(JsonValue::Array(items)) => Ok(items),
                Ok(_) => Err(McpError::invalid_arg(name, "must be an array")),
                Err(e) => Err(McpError::invalid_arg(name, format!("invalid JSON: {}", e))),
            },
        }
    }
}

/// Helper to get a required, non-empty array argument.
pub fn get_array_arg(args: &Map<String, JsonValue>, name: &str) -> Result<Vec<JsonValue>> {
    let value = match args.get(name) {
        None | Some(JsonValue::Null) => return Err(McpError::MissingArg(name.to_string())),
        Some(v) => v.clone(),
    };
    let items = RawArgument::from_json(name, value)?.decode(name)?;
    if items.is_empty() {
        return Err(McpError::invalid_arg(name, "must be a non-empty array"));
    }
    Ok(items)
}

/// Helper to get an optional array of strings.
pub fn get_optional_string_array(
    args: &Map<String, JsonValue>,
    name: &str,
) -> Result<Option<Vec<String>>> {
    let value = match args.get(name) {
        None | Some(JsonValue::Null) => return Ok(None),
        Some(v) => v.clone(),
    };
    RawArgument::from_json(name, value)?
        .decode(name)?
        .into_iter()
        .map(|item| match item {
            JsonValue::String(s) => Ok(s),
            _ => Err(McpError::invalid_arg(name, "must contain only strings")),
        })
        .collect::<Result<Vec<_>>>()
        .map(Some)
}

/// Helper to get an optional object argument; a JSON-encoded object is decoded.
pub fn get_optional_object(
    args: &Map<String, JsonValue>,
    name: &str,
) -> Result<Option<Map<String, JsonValue>>> {
    match args.get(name) {
        None | Some(JsonValue::Null) => Ok(None),
        Some(JsonValue::Object(map)) => Ok(Some(map.clone())),
        Some(JsonValue::String(s)) => match serde_json::from_str::<JsonValue>(s) {
            Ok(JsonValue::Object(map)) => Ok(Some(map)),
            Ok(_) => Err(McpError::invalid_arg(name, "must be an object")),
            Err(e) => Err(McpError::invalid_arg(name, format!("invalid JSON: {}", e))),
        },
        Some(_) => Err(McpError::invalid_arg(name, "must be an object")),
    }
}

/// Helper to get an optional string argument; other types are rejected.
pub fn get_optional_string(args: &Map<String, JsonValue>, name: &str) -> Result<Option<String>> {
    match args.get(name) {
        None | Some(JsonValue::Null) => Ok(None),
        Some(JsonValue::String(s)) => Ok(Some(s.clone())),
        Some(_) => Err(McpError::invalid_arg(name, "must be a string")),
    }
}

/// Helper to get a required, non-blank string argument.
pub fn get_string_arg(args: &Map<String, JsonValue>, name: &str) -> Result<String> {
    match get_optional_string(args, name)? {
        Some(s) if !s.trim().is_empty() => Ok(s.trim().to_string()),
        _ => Err(McpError::MissingArg(name.to_string())),
    }
}

/// Helper to get an optional integer argument.
pub fn get_optional_i64(args: &Map<String, JsonValue>, name: &str) -> Result<Option<i64>> {
    match args.get(name) {
        None | Some(JsonValue::Null) => Ok(None),
        Some(v) => v
            .as_i64()
            .map(Some)
            .ok_or_else(|| McpError::invalid_arg(name, "must be an integer")),
    }
}

/// Resolve the target table from `table_id`, or its alias `page_id`.
pub fn get_table_arg(args: &Map<String, JsonValue>) -> Result<String> {
    let name = ["table_id", "page_id"]
        .into_iter()
        .find(|key| !matches!(args.get(*key), None | Some(JsonValue::Null)))
        .ok_or_else(|| McpError::MissingArg("table_id".to_string()))?;

    match get_optional_string(args, name)? {
        Some(s) if !s.trim().is_empty() => Ok(s.trim().to_string()),
        _ => Err(McpError::invalid_arg(name, "must be a non-empty string")),
    }
}
