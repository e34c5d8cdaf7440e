//! MCP server for Grist documents.
//!
//! Run with `GRIST_API_KEY=... grist-mcp --doc-id <DOC>`; every flag can also
//! be supplied through its environment variable.

use std::time::Duration;

use clap::Parser;
use grist_mcp::{parse_allowed_docs, GristConfig, McpServer, McpSession, DEFAULT_API_URL};
use tracing_subscriber::EnvFilter;

/// MCP server for Grist documents.
///
/// Exposes Grist tables and records as MCP tools for AI agents.
/// Communicates via JSON-RPC 2.0 over stdin/stdout.
#[derive(Parser)]
#[command(name = "grist-mcp")]
#[command(version, about, long_about = None)]
struct Args {
    /// Grist API key used as the bearer token.
    #[arg(long, env = "GRIST_API_KEY", hide_env_values = true)]
    api_key: Option<String>,

    /// Base URL of the Grist instance.
    #[arg(long, env = "GRIST_API_URL", default_value = DEFAULT_API_URL)]
    api_url: String,

    /// Document used when a call names none and no context is set.
    #[arg(long, env = "GRIST_DOC_ID")]
    doc_id: Option<String>,

    /// JSON array of allowed documents, e.g. '[{"id": "docA", "name": "Demo"}]'.
    #[arg(long, env = "GRIST_ALLOWED_DOCS_JSON")]
    allowed_docs: Option<String>,

    /// Timeout for each Grist request, in seconds.
    #[arg(long, env = "GRIST_TIMEOUT_SECS", default_value_t = 30)]
    timeout_secs: u64,

    /// Enable debug logging to stderr.
    #[arg(long, short)]
    verbose: bool,
}

fn main() {
    let args = Args::parse();

    // Set up logging
    if args.verbose {
        tracing_subscriber::fmt()
            .with_env_filter(EnvFilter::from_default_env().add_directive("grist_mcp=debug".parse().unwrap()))
            .with_writer(std::io::stderr)
            .init();
    }

    // Validate arguments
    let api_key = args.api_key.unwrap_or_default();
    if api_key.trim().is_empty() {
        eprintln!("Error: GRIST_API_KEY (or --api-key) is required");
        std::process::exit(1);
    }

    let allowed_docs = match parse_allowed_docs(args.allowed_docs.as_deref().unwrap_or_default()) {
        Ok(docs) => docs,
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    };

    let config = GristConfig::default()
        .with_api_key(api_key)
        .with_api_url(args.api_url)
        .with_default_doc(args.doc_id.unwrap_or_default())
        .with_allowed_docs(allowed_docs)
        .with_timeout(Duration::from_secs(args.timeout_secs));

    if config.default_doc_id.is_none() && config.allowed_docs.is_empty() {
        eprintln!("Error: GRIST_DOC_ID (or --doc-id) or GRIST_ALLOWED_DOCS_JSON is required");
        std::process::exit(1);
    }

    if let Some(default) = config.default_doc_id.as_deref() {
        if !config.allowed_docs.is_empty() && !config.allowed_docs.iter().any(|d| d.id == default) {
            tracing::warn!(doc_id = default, "default document is not in the allow-list");
        }
    }

    tracing::info!(api_url = %config.api_url, default_doc = ?config.default_doc_id, "starting grist-mcp");

    // Create session and server
    let session = match McpSession::new(config) {
        Ok(session) => session,
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    };
    let server = McpServer::new(session);

    let runtime = match tokio::runtime::Builder::new_current_thread().enable_all().build() {
        Ok(runtime) => runtime,
        Err(e) => {
            eprintln!("Error: Failed to start runtime: {}", e);
            std::process::exit(1);
        }
    };

    // Run the server
    if let Err(e) = runtime.block_on(server.run()) {
        eprintln!("Error: Server error: {}", e);
        std::process::exit(1);
    }
}
