//! # grist-mcp
//!
//! MCP (Model Context Protocol) server for Grist documents.
//!
//! This crate exposes Grist tables and records as tools for AI agents. It
//! implements the MCP protocol over stdin/stdout using JSON-RPC 2.0 and
//! forwards each tool call to the Grist REST API.
//!
//! ## Features
//!
//! - **9 tools**: list documents, set/get the active document, list tables and
//!   pages, and list/create/update/delete records
//! - **Document context**: calls target the explicit `doc_id`, else the active
//!   document, else the configured default
//! - **Allow-list**: optionally restrict which documents may be addressed
//! - **Lenient arguments**: array arguments may also be sent as JSON strings
//!
//! ## Usage
//!
//! The server is typically run as an executable and configured in AI tools like Claude Desktop:
//!
//! ```json
//! {
//!   "mcpServers": {
//!     "grist": {
//!       "command": "/path/to/grist-mcp",
//!       "env": { "GRIST_API_KEY": "...", "GRIST_DOC_ID": "..." }
//!     }
//!   }
//! }
//! ```
//!
//! ## Library Usage
//!
//! For testing or embedding, you can use the library API:
//!
//! ```no_run
//! use grist_mcp::{GristConfig, McpServer, McpSession};
//!
//! let config = GristConfig::default()
//!     .with_api_key("secret")
//!     .with_default_doc("docA");
//! let session = McpSession::new(config).expect("Failed to create session");
//! let server = McpServer::new(session);
//!
//! // Run the server (reads from stdin, writes to stdout)
//! // server.run().await.expect("Server error");
//! ```

#![warn(missing_docs)]

mod client;
mod config;
mod convert;
mod error;
mod server;
mod session;
mod tools;

pub use client::{status_error, GristClient};
pub use config::{parse_allowed_docs, AllowedDoc, GristConfig, DEFAULT_API_URL, DEFAULT_TIMEOUT};
pub use convert::{project_fields, simplify_record, simplify_table, RawArgument, Record, Table};
pub use error::{rpc_codes, McpError, Result};
pub use server::{JsonRpcError, JsonRpcRequest, JsonRpcResponse, McpServer};
pub use session::McpSession;
pub use tools::{ToolDef, ToolKind, ToolRegistry};
