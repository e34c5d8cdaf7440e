//! MCP session management.
//!
//! Holds the Grist client, the static configuration and the active document
//! context shared by every tool call.

use std::sync::{PoisonError, RwLock};

use crate::client::GristClient;
use crate::config::{AllowedDoc, GristConfig};
use crate::error::{McpError, Result};

/// MCP session state.
///
/// The active document id is the only mutable state. It is guarded so that
/// concurrent calls can share one session; the last `set_active_doc_id` wins.
pub struct McpSession {
    config: GristConfig,
    client: GristClient,
    active_doc: RwLock<Option<String>>,
}

impl McpSession {
    /// Create a new session with no active document.
    pub fn new(config: GristConfig) -> Result<Self> {
        let client = GristClient::new(&config)?;
        Ok(Self {
            config,
            client,
            active_doc: RwLock::new(None),
        })
    }

    /// The HTTP client for Grist calls.
    pub fn client(&self) -> &GristClient {
        &self.client
    }

    /// The configured default document, if any.
    pub fn default_doc_id(&self) -> Option<&str> {
        self.config.default_doc_id.as_deref()
    }

    /// Get the active document id.
    pub fn active_doc_id(&self) -> Option<String> {
        self.active_doc
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Active document if set, else the default. No allow-list check.
    pub fn effective_doc_id(&self) -> Option<String> {
        self.active_doc_id()
            .or_else(|| self.default_doc_id().map(str::to_string))
    }

    /// Resolve the document a call targets.
    ///
    /// Precedence: `request_doc_id`, then the active context, then the
    /// configured default. The first non-blank candidate wins and must be in
    /// the allow-list when one is configured.
    pub fn resolve_doc_id(&self, request_doc_id: Option<&str>) -> Result<String> {
        let active = self.active_doc_id();
        let effective = [request_doc_id, active.as_deref(), self.default_doc_id()]
            .into_iter()
            .flatten()
            .map(str::trim)
            .find(|candidate| !candidate.is_empty())
            .ok_or_else(|| {
                McpError::Configuration(
                    "GRIST_DOC_ID is not set and no doc_id was provided".to_string(),
                )
            })?;

        if !self.is_allowed(effective) {
            return Err(McpError::Permission("doc_id is not allowed".to_string()));
        }

        Ok(effective.to_string())
    }

    /// Switch the active document.
    ///
    /// The candidate goes through [`resolve_doc_id`](Self::resolve_doc_id);
    /// state is only changed when it resolves.
    pub fn set_active_doc_id(&self, doc_id: &str) -> Result<String> {
        let doc_id = doc_id.trim();
        if doc_id.is_empty() {
            return Err(McpError::MissingArg("doc_id".to_string()));
        }

        let resolved = self.resolve_doc_id(Some(doc_id))?;
        *self
            .active_doc
            .write()
            .unwrap_or_else(PoisonError::into_inner) = Some(resolved.clone());
        tracing::info!(doc_id = %resolved, "active document changed");
        Ok(resolved)
    }

    /// Documents a caller may address.
    ///
    /// Falls back to a single entry for the default document when no
    /// allow-list is configured.
    pub fn allowed_docs(&self) -> Result<Vec<AllowedDoc>> {
        if !self.config.allowed_docs.is_empty() {
            return Ok(self.config.allowed_docs.clone());
        }
        match self.default_doc_id() {
            Some(default) => Ok(vec![AllowedDoc::new(default, None)]),
            None => Err(McpError::Configuration(
                "no allowed docs configured and GRIST_DOC_ID is not set".to_string(),
            )),
        }
    }

    fn is_allowed(&self, doc_id: &str) -> bool {
        self.config.allowed_docs.is_empty()
            || self.config.allowed_docs.iter().any(|doc| doc.id == doc_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_session(default: Option<&str>, allowed: &[&str]) -> McpSession {
        let mut config = GristConfig::default().with_api_key("secret").with_allowed_docs(
            allowed.iter().map(|id| AllowedDoc::new(id, None)).collect(),
        );
        if let Some(default) = default {
            config = config.with_default_doc(default);
        }
        McpSession::new(config).expect("session")
    }

    #[test]
    fn test_resolve_uses_default_without_context() {
        let session = test_session(Some("D"), &[]);
        assert_eq!(session.resolve_doc_id(None).unwrap(), "D");
        assert_eq!(session.resolve_doc_id(Some("  ")).unwrap(), "D");
    }

    #[test]
    fn test_resolve_request_overrides_context_and_default() {
        let session = test_session(Some("D"), &[]);
        session.set_active_doc_id("C").unwrap();
        assert_eq!(session.resolve_doc_id(Some("X")).unwrap(), "X");
        assert_eq!(session.resolve_doc_id(Some(" X ")).unwrap(), "X");
        assert_eq!(session.resolve_doc_id(None).unwrap(), "C");
    }

    #[test]
    fn test_resolve_without_candidates_is_configuration_error() {
        let session = test_session(None, &[]);
        assert!(matches!(
            session.resolve_doc_id(None),
            Err(McpError::Configuration(_))
        ));
    }

    #[test]
    fn test_allow_list_applies_to_every_tier() {
        // Default outside the allow-list.
        let session = test_session(Some("other"), &["docA", "docB"]);
        assert!(matches!(session.resolve_doc_id(None), Err(McpError::Permission(_))));

        // Request tier.
        assert!(matches!(
            session.resolve_doc_id(Some("other")),
            Err(McpError::Permission(_))
        ));
        assert_eq!(session.resolve_doc_id(Some("docB")).unwrap(), "docB");

        // Context tier.
        session.set_active_doc_id("docA").unwrap();
        assert_eq!(session.resolve_doc_id(None).unwrap(), "docA");
    }

    #[test]
    fn test_rejected_set_keeps_previous_context() {
        let session = test_session(Some("docA"), &["docA", "docB"]);
        assert_eq!(session.active_doc_id(), None);

        session.set_active_doc_id("docB").unwrap();
        assert!(matches!(
            session.set_active_doc_id("docZ"),
            Err(McpError::Permission(_))
        ));
        assert_eq!(session.active_doc_id().as_deref(), Some("docB"));

        assert!(session.set_active_doc_id("   ").unwrap_err().is_validation());
        assert_eq!(session.active_doc_id().as_deref(), Some("docB"));
    }

    #[test]
    fn test_allowed_docs_falls_back_to_default() {
        let session = test_session(Some("D"), &[]);
        assert_eq!(session.allowed_docs().unwrap(), vec![AllowedDoc::new("D", None)]);

        let session = test_session(None, &[]);
        assert!(matches!(session.allowed_docs(), Err(McpError::Configuration(_))));

        let session = test_session(None, &["docA", "docB"]);
        let ids: Vec<String> = session.allowed_docs().unwrap().into_iter().map(|d| d.id).collect();
        assert_eq!(ids, vec!["docA", "docB"]);
    }

    #[test]
    fn test_effective_doc_prefers_context() {
        let session = test_session(Some("D"), &[]);
        assert_eq!(session.effective_doc_id().as_deref(), Some("D"));
        session.set_active_doc_id("C").unwrap();
        assert_eq!(session.effective_doc_id().as_deref(), Some("C"));
    }
}
