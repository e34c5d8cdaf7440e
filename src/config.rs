//! Grist connection settings.
//!
//! The binary fills a [`GristConfig`] from flags and environment variables;
//! library users build one directly.

use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use std::time::Duration;

use crate::error::{McpError, Result};

/// Public Grist instance used when no base URL is configured.
pub const DEFAULT_API_URL: &str = "https://docs.getgrist.com";

/// Request timeout applied to every Grist call.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// One entry of the document allow-list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AllowedDoc {
    /// Grist document id
    pub id: String,
    /// Display name, defaults to the id
    pub name: String,
}

impl AllowedDoc {
    /// Create an entry; a blank name falls back to the id.
    pub fn new(id: &str, name: Option<&str>) -> Self {
        let id = id.trim().to_string();
        let name = match name.map(str::trim) {
            Some(n) if !n.is_empty() => n.to_string(),
            _ => id.clone(),
        };
        Self { id, name }
    }
}

/// Static configuration, read-only after startup.
#[derive(Debug, Clone)]
pub struct GristConfig {
    /// Bearer token for the Grist REST API
    pub api_key: Option<String>,
    /// Base URL of the Grist instance
    pub api_url: String,
    /// Document used when neither the call nor the context names one
    pub default_doc_id: Option<String>,
    /// Documents that may be addressed; empty permits any
    pub allowed_docs: Vec<AllowedDoc>,
    /// Per-request timeout
    pub timeout: Duration,
}

impl Default for GristConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            api_url: DEFAULT_API_URL.to_string(),
            default_doc_id: None,
            allowed_docs: Vec::new(),
            timeout: DEFAULT_TIMEOUT,
        }
    }
}

impl GristConfig {
    /// Set the API key. Blank keys count as absent.
    pub fn with_api_key(mut self, key: impl Into<String>) -> Self {
        self.api_key = non_blank(key.into());
        self
    }

    /// Set the base URL.
    pub fn with_api_url(mut self, url: impl Into<String>) -> Self {
        self.api_url = url.into();
        self
    }

    /// Set the default document id. Blank ids count as absent.
    pub fn with_default_doc(mut self, doc_id: impl Into<String>) -> Self {
        self.default_doc_id = non_blank(doc_id.into());
        self
    }

    /// Replace the allow-list.
    pub fn with_allowed_docs(mut self, docs: Vec<AllowedDoc>) -> Self {
        self.allowed_docs = docs;
        self
    }

    /// Set the request timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

fn non_blank(value: String) -> Option<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

/// Parse the JSON allow-list, e.g. `[{"id": "docA", "name": "Demo A"}]`.
///
/// Blank input yields an empty list.
pub fn parse_allowed_docs(raw: &str) -> Result<Vec<AllowedDoc>> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Ok(Vec::new());
    }

    let parsed: JsonValue = serde_json::from_str(raw).map_err(|e| {
        McpError::Configuration(format!("allowed docs is not valid JSON: {}", e))
    })?;

    let items = parsed.as_array().ok_or_else(|| {
        McpError::Configuration("allowed docs must be a JSON array".to_string())
    })?;

    items
        .iter()
        .map(|item| {
            let obj = item.as_object().ok_or_else(|| {
                McpError::Configuration("allowed docs items must be objects".to_string())
            })?;
            let id = obj
                .get("id")
                .and_then(|v| v.as_str())
                .filter(|s| !s.trim().is_empty())
                .ok_or_else(|| {
                    McpError::Configuration(
                        "each allowed docs item must include a non-empty string 'id'".to_string(),
                    )
                })?;
            Ok(AllowedDoc::new(id, obj.get("name").and_then(|v| v.as_str())))
        })
        .collect()
}
