//! Record tools.
//!
//! Tools: grist_list_records, grist_create_records, grist_update_records, grist_delete_records
//!
//! Every argument is validated before the Grist request is issued.

use reqwest::Method;
use serde_json::{Map, Value as JsonValue};

use crate::convert::{
    envelope_items, get_array_arg, get_optional_i64, get_optional_object, get_optional_string,
    get_optional_string_array, get_table_arg, project_fields, simplify_record, Record,
};
use crate::error::{McpError, Result};
use crate::schema;
use crate::session::McpSession;
use crate::tools::{resolve_doc, ToolDef, ToolKind};

/// Rows returned when no limit is given.
pub const DEFAULT_LIMIT: i64 = 100;
/// Largest accepted limit.
pub const MAX_LIMIT: i64 = 500;

/// Get all record tool definitions.
pub fn tools() -> Vec<ToolDef> {
    vec![
        ToolDef::new(
            ToolKind::ListRecords,
            "Retrieve records from a table (or page) with optional filters, sort and limit \
             (default 100, max 500). Pass fields to return only some columns.",
            schema!(object {
                optional: {
                    "table_id": string,
                    "page_id": string,
                    "doc_id": string,
                    "limit": limit,
                    "filters": object,
                    "sort": string,
                    "fields": array_string
                }
            }),
        ),
        ToolDef::new(
            ToolKind::CreateRecords,
            "Create new records in a table. Each element of records is an object of field values. \
             Returns the created records with their ids.",
            schema!(object {
                required: { "records": array_object },
                optional: { "table_id": string, "page_id": string, "doc_id": string }
            }),
        ),
        ToolDef::new(
            ToolKind::UpdateRecords,
            "Update existing records by id. Each element needs an id and a fields object \
             with the values to change.",
            schema!(object {
                required: { "records": array_record },
                optional: { "table_id": string, "page_id": string, "doc_id": string }
            }),
        ),
        ToolDef::new(
            ToolKind::DeleteRecords,
            "Delete records from a table by id.",
            schema!(object {
                required: { "record_ids": array_integer },
                optional: { "table_id": string, "page_id": string, "doc_id": string }
            }),
        ),
    ]
}

fn records_path(table_id: &str) -> String {
    format!("/tables/{}/records", urlencoding::encode(table_id))
}

fn get_limit(args: &Map<String, JsonValue>) -> Result<i64> {
    let limit = get_optional_i64(args, "limit")
        .map_err(|_| McpError::invalid_arg("limit", "must be an integer between 1 and 500"))?
        .unwrap_or(DEFAULT_LIMIT);
    if !(1..=MAX_LIMIT).contains(&limit) {
        return Err(McpError::invalid_arg("limit", "must be between 1 and 500"));
    }
    Ok(limit)
}

/// Simplify the `records` envelope of a Grist response.
fn response_records(response: &JsonValue) -> Vec<Record> {
    envelope_items(response, "records")
        .iter()
        .map(simplify_record)
        .collect()
}

/// Dispatch a record tool call.
pub async fn dispatch(
    session: &McpSession,
    kind: ToolKind,
    args: Map<String, JsonValue>,
) -> Result<JsonValue> {
    match kind {
        ToolKind::ListRecords => {
            let table_id = get_table_arg(&args)?;
            let limit = get_limit(&args)?;
            let filters = get_optional_object(&args, "filters")?;
            let sort = get_optional_string(&args, "sort")?;
            let fields = get_optional_string_array(&args, "fields")?;
            let doc_id = resolve_doc(session, &args)?;

            let mut query = vec![("limit", limit.to_string())];
            if let Some(filters) = filters.filter(|f| !f.is_empty()) {
                query.push(("filter", JsonValue::Object(filters).to_string()));
            }
            if let Some(sort) = sort.filter(|s| !s.trim().is_empty()) {
                query.push(("sort", sort));
            }

            let response = session
                .client()
                .request(Method::GET, &doc_id, &records_path(&table_id), None, &query)
                .await?;

            let records: Vec<Record> = response_records(&response)
                .into_iter()
                .map(|record| project_fields(record, fields.as_deref()))
                .collect();

            Ok(serde_json::json!({
                "doc_id": doc_id,
                "table_id": table_id,
                "count": records.len(),
                "records": records
            }))
        }

        ToolKind::CreateRecords => {
            let table_id = get_table_arg(&args)?;
            let records = get_array_arg(&args, "records")?;
            let doc_id = resolve_doc(session, &args)?;

            let payload: Vec<JsonValue> = records
                .into_iter()
                .map(|fields| serde_json::json!({ "fields": fields }))
                .collect();
            let body = serde_json::json!({ "records": payload });

            let response = session
                .client()
                .request(Method::POST, &doc_id, &records_path(&table_id), Some(&body), &[])
                .await?;
            let created = response_records(&response);

            Ok(serde_json::json!({
                "doc_id": doc_id,
                "table_id": table_id,
                "count": created.len(),
                "created": created
            }))
        }

        ToolKind::UpdateRecords => {
            let table_id = get_table_arg(&args)?;
            let records = get_array_arg(&args, "records")?;
            for record in &records {
                let obj = record.as_object().ok_or_else(|| {
                    McpError::invalid_arg("records", "each record must be an object")
                })?;
                if !obj.contains_key("id") {
                    return Err(McpError::invalid_arg("records", "each record must have an 'id' field"));
                }
                if !obj.contains_key("fields") {
                    return Err(McpError::invalid_arg(
                        "records",
                        "each record must have a 'fields' object",
                    ));
                }
            }
            let doc_id = resolve_doc(session, &args)?;

            let updated = records.len();
            let body = serde_json::json!({ "records": records });
            session
                .client()
                .request(Method::PATCH, &doc_id, &records_path(&table_id), Some(&body), &[])
                .await?;

            Ok(serde_json::json!({
                "doc_id": doc_id,
                "table_id": table_id,
                "updated": updated,
                "success": true
            }))
        }

        ToolKind::DeleteRecords => {
            let table_id = get_table_arg(&args)?;
            let record_ids = get_array_arg(&args, "record_ids")?;
            if !record_ids.iter().all(|id| id.is_i64() || id.is_u64()) {
                return Err(McpError::invalid_arg("record_ids", "all record_ids must be integers"));
            }
            let doc_id = resolve_doc(session, &args)?;

            let deleted = record_ids.len();
            let body = serde_json::json!({ "records": record_ids });
            session
                .client()
                .request(Method::DELETE, &doc_id, &records_path(&table_id), Some(&body), &[])
                .await?;

            Ok(serde_json::json!({
                "doc_id": doc_id,
                "table_id": table_id,
                "deleted": deleted,
                "success": true
            }))
        }

        _ => Err(McpError::UnknownTool(kind.name().to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn args(value: JsonValue) -> Map<String, JsonValue> {
        match value {
            JsonValue::Object(map) => map,
            _ => panic!("expected object"),
        }
    }

    #[test]
    fn test_limit_defaults_and_bounds() {
        assert_eq!(get_limit(&args(json!({}))).unwrap(), DEFAULT_LIMIT);
        assert_eq!(get_limit(&args(json!({"limit": 1}))).unwrap(), 1);
        assert_eq!(get_limit(&args(json!({"limit": 500}))).unwrap(), 500);
        for bad in [json!(0), json!(501), json!(-3), json!("10"), json!(1.5)] {
            let err = get_limit(&args(json!({ "limit": bad }))).unwrap_err();
            assert!(err.is_validation(), "{:?}", err);
        }
    }

    #[test]
    fn test_records_path_encodes_table() {
        assert_eq!(records_path("Customers"), "/tables/Customers/records");
        assert_eq!(records_path("My Table"), "/tables/My%20Table/records");
    }
}
