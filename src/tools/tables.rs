//! Table tools.
//!
//! Tools: grist_list_tables, grist_list_pages

use reqwest::Method;
use serde_json::{Map, Value as JsonValue};

use crate::convert::{envelope_items, simplify_table, Table};
use crate::error::{McpError, Result};
use crate::schema;
use crate::session::McpSession;
use crate::tools::{resolve_doc, ToolDef, ToolKind};

/// Get all table tool definitions.
pub fn tools() -> Vec<ToolDef> {
    vec![
        ToolDef::new(
            ToolKind::ListTables,
            "List all tables in a Grist document. Uses the active document unless doc_id is given.",
            schema!(object {
                optional: { "doc_id": string }
            }),
        ),
        ToolDef::new(
            ToolKind::ListPages,
            "List the pages of a Grist document. A page_id can be passed wherever a \
             table_id is expected.",
            schema!(object {
                optional: { "doc_id": string }
            }),
        ),
    ]
}

/// Fetch the simplified tables of `doc_id`.
pub async fn list_tables(session: &McpSession, doc_id: &str) -> Result<Vec<Table>> {
    let response = session
        .client()
        .request(Method::GET, doc_id, "/tables", None, &[])
        .await?;
    Ok(envelope_items(&response, "tables")
        .iter()
        .map(simplify_table)
        .collect())
}

/// Dispatch a table tool call.
pub async fn dispatch(
    session: &McpSession,
    kind: ToolKind,
    args: Map<String, JsonValue>,
) -> Result<JsonValue> {
    match kind {
        ToolKind::ListTables => {
            let doc_id = resolve_doc(session, &args)?;
            let tables = list_tables(session, &doc_id).await?;
            Ok(serde_json::to_value(tables)?)
        }

        ToolKind::ListPages => {
            let doc_id = resolve_doc(session, &args)?;
            let pages: Vec<JsonValue> = list_tables(session, &doc_id)
                .await?
                .into_iter()
                .map(|table| {
                    serde_json::json!({
                        "page_id": table.id,
                        "name": table.name
                    })
                })
                .collect();
            Ok(serde_json::json!({
                "doc_id": doc_id,
                "count": pages.len(),
                "pages": pages
            }))
        }

        _ => Err(McpError::UnknownTool(kind.name().to_string())),
    }
}
