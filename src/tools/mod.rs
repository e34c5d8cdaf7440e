//! Tool registry and category definitions.
//!
//! Provides the infrastructure for registering and dispatching MCP tools.

pub mod context;
pub mod records;
pub mod tables;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value as JsonValue};

use crate::convert::get_optional_string;
use crate::error::{McpError, Result};
use crate::session::McpSession;

/// A tool definition for the MCP tools/list response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolDef {
    /// Tool name (e.g., "grist_list_records")
    pub name: String,
    /// Tool description
    pub description: String,
    /// JSON Schema for the input parameters
    #[serde(rename = "inputSchema")]
    pub input_schema: JsonValue,
}

impl ToolDef {
    /// Create a new tool definition.
    pub fn new(kind: ToolKind, description: &str, input_schema: JsonValue) -> Self {
        Self {
            name: kind.name().to_string(),
            description: description.to_string(),
            input_schema,
        }
    }
}

/// Every tool the server exposes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ToolKind {
    /// grist_list_docs
    ListDocs,
    /// grist_set_context
    SetContext,
    /// grist_get_context
    GetContext,
    /// grist_list_tables
    ListTables,
    /// grist_list_pages
    ListPages,
    /// grist_list_records
    ListRecords,
    /// grist_create_records
    CreateRecords,
    /// grist_update_records
    UpdateRecords,
    /// grist_delete_records
    DeleteRecords,
}

impl ToolKind {
    /// All tools, in listing order.
    pub const ALL: [ToolKind; 9] = [
        ToolKind::ListDocs,
        ToolKind::SetContext,
        ToolKind::GetContext,
        ToolKind::ListTables,
        ToolKind::ListPages,
        ToolKind::ListRecords,
        ToolKind::CreateRecords,
        ToolKind::UpdateRecords,
        ToolKind::DeleteRecords,
    ];

    /// Wire name of the tool.
    pub fn name(self) -> &'static str {
        match self {
            ToolKind::ListDocs => "grist_list_docs",
            ToolKind::SetContext => "grist_set_context",
            ToolKind::GetContext => "grist_get_context",
            ToolKind::ListTables => "grist_list_tables",
            ToolKind::ListPages => "grist_list_pages",
            ToolKind::ListRecords => "grist_list_records",
            ToolKind::CreateRecords => "grist_create_records",
            ToolKind::UpdateRecords => "grist_update_records",
            ToolKind::DeleteRecords => "grist_delete_records",
        }
    }

    /// Look up a tool by wire name.
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.name() == name)
    }
}

/// Registry of all available tools.
pub struct ToolRegistry {
    tools: Vec<ToolDef>,
}

impl ToolRegistry {
    /// Create a new registry with all tools registered.
    pub fn new() -> Self {
        let mut tools = Vec::new();

        // Register all tool categories
        tools.extend(context::tools());
        tools.extend(tables::tools());
        tools.extend(records::tools());

        Self { tools }
    }

    /// Get all tool definitions.
    pub fn tools(&self) -> &[ToolDef] {
        &self.tools
    }

    /// Call a tool with raw `arguments` straight from the protocol layer.
    ///
    /// Missing or null arguments are treated as an empty object.
    pub async fn call_tool(
        &self,
        session: &McpSession,
        name: &str,
        arguments: Option<JsonValue>,
    ) -> Result<JsonValue> {
        let args = match arguments {
            None | Some(JsonValue::Null) => Map::new(),
            Some(JsonValue::Object(map)) => map,
            Some(_) => return Err(McpError::invalid_arg("arguments", "must be an object")),
        };
        self.dispatch(session, name, args).await
    }

    /// Dispatch a tool call to the appropriate handler.
    pub async fn dispatch(
        &self,
        session: &McpSession,
        name: &str,
        args: Map<String, JsonValue>,
    ) -> Result<JsonValue> {
        let kind = ToolKind::from_name(name).ok_or_else(|| McpError::UnknownTool(name.to_string()))?;
        tracing::debug!(tool = name, "dispatching tool call");

        match kind {
            ToolKind::ListDocs | ToolKind::SetContext | ToolKind::GetContext => {
                context::dispatch(session, kind, args)
            }
            ToolKind::ListTables | ToolKind::ListPages => {
                tables::dispatch(session, kind, args).await
            }
            ToolKind::ListRecords
            | ToolKind::CreateRecords
            | ToolKind::UpdateRecords
            | ToolKind::DeleteRecords => records::dispatch(session, kind, args).await,
        }
    }
}

/// Resolve the document for a call from its optional `doc_id` argument.
pub(crate) fn resolve_doc(session: &McpSession, args: &Map<String, JsonValue>) -> Result<String> {
    let requested = get_optional_string(args, "doc_id")?;
    session.resolve_doc_id(requested.as_deref())
}

impl Default for ToolRegistry {
    fn default() -> Self {
        Self::new()
    }
}

/// Helper macro for creating JSON Schema for tool input parameters.
#[macro_export]
macro_rules! schema {
    // Object with required and optional properties
    (object {
        required: { $($req_name:literal : $req_type:tt),* $(,)? },
        optional: { $($opt_name:literal : $opt_type:tt),* $(,)? }
    }) => {{
        let mut required = Vec::new();
        $(required.push($req_name);)*

        let mut props = serde_json::Map::new();
        $(props.insert($req_name.to_string(), schema!(@type $req_type));)*
        $(props.insert($opt_name.to_string(), schema!(@type $opt_type));)*

        serde_json::json!({
            "type": "object",
            "properties": props,
            "required": required
        })
    }};

    // Object with only required properties
    (object {
        required: { $($req_name:literal : $req_type:tt),* $(,)? }
    }) => {{
        let mut required = Vec::new();
        $(required.push($req_name);)*

        let mut props = serde_json::Map::new();
        $(props.insert($req_name.to_string(), schema!(@type $req_type));)*

        serde_json::json!({
            "type": "object",
            "properties": props,
            "required": required
        })
    }};

    // Object with only optional properties
    (object {
        optional: { $($opt_name:literal : $opt_type:tt),* $(,)? }
    }) => {{
        let mut props = serde_json::Map::new();
        $(props.insert($opt_name.to_string(), schema!(@type $opt_type));)*

        serde_json::json!({
            "type": "object",
            "properties": props,
            "required": []
        })
    }};

    // Empty object (no parameters)
    (object {}) => {{
        serde_json::json!({
            "type": "object",
            "properties": {},
            "required": []
        })
    }};

    // Type mappings
    (@type string) => { serde_json::json!({"type": "string"}) };
    (@type integer) => { serde_json::json!({"type": "integer"}) };
    (@type limit) => { serde_json::json!({"type": "integer", "minimum": 1, "maximum": 500}) };
    (@type object) => { serde_json::json!({"type": "object"}) };
    (@type array_string) => { serde_json::json!({"type": "array", "items": {"type": "string"}}) };
    (@type array_integer) => { serde_json::json!({"type": "array", "items": {"type": "integer"}}) };
    (@type array_object) => { serde_json::json!({"type": "array", "items": {"type": "object"}}) };
    (@type array_record) => {
        serde_json::json!({
            "type": "array",
            "items": {
                "type": "object",
                "properties": {
                    "id": {"type": "integer"},
                    "fields": {"type": "object"}
                },
                "required": ["id", "fields"]
            }
        })
    };
}
