//! Document context tools.
//!
//! Tools: grist_list_docs, grist_set_context, grist_get_context

use serde_json::{Map, Value as JsonValue};

use crate::convert::get_string_arg;
use crate::error::{McpError, Result};
use crate::schema;
use crate::session::McpSession;
use crate::tools::{ToolDef, ToolKind};

/// Get all context tool definitions.
pub fn tools() -> Vec<ToolDef> {
    vec![
        ToolDef::new(
            ToolKind::ListDocs,
            "List the Grist documents this server may access. The entry marked active \
             is used by calls that don't pass a doc_id.",
            schema!(object {}),
        ),
        ToolDef::new(
            ToolKind::SetContext,
            "Switch the active Grist document. All subsequent calls without an explicit \
             doc_id target this document.",
            schema!(object {
                required: { "doc_id": string }
            }),
        ),
        ToolDef::new(
            ToolKind::GetContext,
            "Show the active document, the configured default, and the document \
             that calls without a doc_id will use.",
            schema!(object {}),
        ),
    ]
}

/// Dispatch a context tool call. None of these touch the network.
pub fn dispatch(
    session: &McpSession,
    kind: ToolKind,
    args: Map<String, JsonValue>,
) -> Result<JsonValue> {
    match kind {
        ToolKind::ListDocs => {
            let effective = session.effective_doc_id();
            let docs: Vec<JsonValue> = session
                .allowed_docs()?
                .into_iter()
                .map(|doc| {
                    let active = effective.as_deref() == Some(doc.id.as_str());
                    serde_json::json!({
                        "id": doc.id,
                        "name": doc.name,
                        "active": active
                    })
                })
                .collect();
            Ok(JsonValue::Array(docs))
        }

        ToolKind::SetContext => {
            let doc_id = get_string_arg(&args, "doc_id")?;
            let active = session.set_active_doc_id(&doc_id)?;
            Ok(serde_json::json!({
                "active_doc_id": active,
                "default_doc_id": session.default_doc_id()
            }))
        }

        ToolKind::GetContext => Ok(serde_json::json!({
            "active_doc_id": session.active_doc_id(),
            "default_doc_id": session.default_doc_id(),
            "effective_doc_id": session.effective_doc_id()
        })),

        _ => Err(McpError::UnknownTool(kind.name().to_string())),
    }
}
