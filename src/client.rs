//! HTTP client for the Grist REST API.
//!
//! Every call is scoped to one document: `<api_url>/api/docs/<doc_id><path>`.

use reqwest::Method;
use serde_json::Value as JsonValue;

use crate::config::GristConfig;
use crate::error::{McpError, Result};

/// Authenticated client for one Grist instance.
pub struct GristClient {
    http: reqwest::Client,
    base_url: String,
    api_key: Option<String>,
}

impl GristClient {
    /// Create a client from the static configuration.
    ///
    /// A missing API key is not an error here; it is reported by the first request.
    pub fn new(config: &GristConfig) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| McpError::Internal(format!("failed to create HTTP client: {}", e)))?;

        // Ensure base_url doesn't have trailing slash
        let base_url = config.api_url.trim_end_matches('/').to_string();

        Ok(Self {
            http,
            base_url,
            api_key: config.api_key.clone(),
        })
    }

    /// Get the base URL of the Grist instance.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Full URL for `path` inside document `doc_id`.
    pub fn document_url(&self, doc_id: &str, path: &str) -> String {
        format!(
            "{}/api/docs/{}{}",
            self.base_url,
            urlencoding::encode(doc_id),
            path
        )
    }

    /// Issue one request and return the parsed JSON body.
    ///
    /// `query` is sent as URL parameters and `body` as a JSON payload. No retries.
    pub async fn request(
        &self,
        method: Method,
        doc_id: &str,
        path: &str,
        body: Option<&JsonValue>,
        query: &[(&str, String)],
    ) -> Result<JsonValue> {
        let api_key = self.api_key.as_deref().ok_or_else(|| {
            McpError::Configuration("GRIST_API_KEY is not set".to_string())
        })?;

        let url = self.document_url(doc_id, path);
        tracing::debug!(%method, doc_id, path, "grist request");

        let mut builder = self
            .http
            .request(method.clone(), &url)
            .bearer_auth(api_key)
            .header(reqwest::header::CONTENT_TYPE, "application/json");
        if !query.is_empty() {
            builder = builder.query(query);
        }
        if let Some(body) = body {
            builder = builder.json(body);
        }

        let response = builder.send().await.map_err(transport_error)?;
        let status = response.status().as_u16();
        let bytes = response.bytes().await.map_err(transport_error)?;
        tracing::debug!(%method, path, status, "grist response");

        if status >= 400 {
            return Err(status_error(status, path, &bytes));
        }

        serde_json::from_slice(&bytes).map_err(|e| McpError::MalformedResponse(e.to_string()))
    }
}

/// Map a reqwest failure that produced no HTTP response.
fn transport_error(err: reqwest::Error) -> McpError {
    if err.is_timeout() {
        McpError::Transport("timeout".to_string())
    } else if err.is_connect() {
        McpError::Transport("unreachable".to_string())
    } else {
        McpError::Transport(err.to_string())
    }
}

/// Map an HTTP error status (>= 400) to an error kind.
///
/// 404 names the last segment of `path`; other statuses pick up the body's
/// `error` or `message` field when the body is JSON.
pub fn status_error(status: u16, path: &str, body: &[u8]) -> McpError {
    match status {
        401 => McpError::Auth("invalid Grist API key".to_string()),
        403 => McpError::Permission(
            "insufficient permissions to perform this action on Grist document".to_string(),
        ),
        404 => {
            let resource = path
                .trim_matches('/')
                .rsplit('/')
                .next()
                .filter(|s| !s.is_empty())
                .unwrap_or("unknown");
            McpError::NotFound(resource.to_string())
        }
        _ => McpError::Remote {
            status,
            message: error_message(body),
        },
    }
}

fn error_message(body: &[u8]) -> Option<String> {
    let parsed: JsonValue = serde_json::from_slice(body).ok()?;
    let field = parsed.get("error").or_else(|| parsed.get("message"))?;
    Some(match field {
        JsonValue::String(s) => s.clone(),
        other => other.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client(url: &str) -> GristClient {
        GristClient::new(&GristConfig::default().with_api_url(url).with_api_key("secret"))
            .expect("client")
    }

    #[test]
    fn test_document_url_strips_trailing_slash() {
        let client = client("https://grist.example.com/");
        assert_eq!(client.base_url(), "https://grist.example.com");
        assert_eq!(
            client.document_url("docA", "/tables"),
            "https://grist.example.com/api/docs/docA/tables"
        );
    }

    #[test]
    fn test_status_error_auth_and_permission() {
        assert!(matches!(status_error(401, "/tables", b""), McpError::Auth(_)));
        assert!(matches!(status_error(403, "/tables", b""), McpError::Permission(_)));
    }

    #[test]
    fn test_status_error_not_found_names_last_segment() {
        assert_eq!(
            status_error(404, "/tables/Customers", b""),
            McpError::NotFound("Customers".to_string())
        );
        assert_eq!(
            status_error(404, "/tables/Customers/records/", b""),
            McpError::NotFound("records".to_string())
        );
        assert_eq!(status_error(404, "", b""), McpError::NotFound("unknown".to_string()));
    }

    #[test]
    fn test_status_error_extracts_body_message() {
        assert_eq!(
            status_error(400, "/tables/T/records", br#"{"error": "Invalid column \"X\""}"#),
            McpError::Remote {
                status: 400,
                message: Some("Invalid column \"X\"".to_string())
            }
        );
        assert_eq!(
            status_error(422, "/tables", br#"{"message": "bad filter"}"#),
            McpError::Remote {
                status: 422,
                message: Some("bad filter".to_string())
            }
        );
    }

    #[test]
    fn test_status_error_swallows_unparseable_body() {
        assert_eq!(
            status_error(502, "/tables", b"<html>Bad Gateway</html>"),
            McpError::Remote { status: 502, message: None }
        );
        assert_eq!(
            status_error(500, "/tables", br#"{"detail": "x"}"#),
            McpError::Remote { status: 500, message: None }
        );
    }

    #[tokio::test]
    async fn test_missing_api_key_fails_before_network() {
        // Port 9 on a documentation address; never contacted.
        let config = GristConfig::default().with_api_url("http://192.0.2.1:9");
        let client = GristClient::new(&config).unwrap();
        let err = client
            .request(Method::GET, "docA", "/tables", None, &[])
            .await
            .unwrap_err();
        assert!(matches!(err, McpError::Configuration(_)));
    }
}
