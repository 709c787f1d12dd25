use super::{ApiResponse, HttpMethod, RequestDescriptor, Transport, TransportFailure};
use crate::config::FrontappConfig;
use crate::credentials::CredentialProvider;
use crate::error::{DispatchError, DispatchResult};
use async_trait::async_trait;
use reqwest::header::ACCEPT;
use serde_json::{Map, Value, json};
use std::sync::Arc;
use url::Url;

const ERROR_EXCERPT_LEN: usize = 256;

/// Transport backed by `reqwest`.
///
/// Sends JSON bodies, appends the descriptor's query to the URL and
/// attaches `Authorization: Bearer <token>` from the credential provider.
#[derive(Clone)]
pub struct HttpTransport {
    client: reqwest::Client,
    credentials: Arc<dyn CredentialProvider>,
}

impl HttpTransport {
    pub fn new(
        config: &FrontappConfig,
        credentials: Arc<dyn CredentialProvider>,
    ) -> DispatchResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout())
            .build()
            .map_err(|e| DispatchError::Config {
                key: "timeout_secs".to_string(),
                reason: e.to_string(),
            })?;
        Ok(Self {
            client,
            credentials,
        })
    }

    pub fn with_client(client: reqwest::Client, credentials: Arc<dyn CredentialProvider>) -> Self {
        Self {
            client,
            credentials,
        }
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn send(&self, request: &RequestDescriptor) -> Result<ApiResponse, TransportFailure> {
        let token = self
            .credentials
            .bearer_token()
            .await
            .map_err(|e| TransportFailure::Credentials(e.to_string()))?;

        let url = with_query(&request.url, request.query.as_ref());

        let mut builder = match request.method {
            HttpMethod::Get => self.client.get(url),
            HttpMethod::Post => self.client.post(url),
            HttpMethod::Patch => self.client.patch(url),
            HttpMethod::Delete => self.client.delete(url),
        };
        builder = builder
            .bearer_auth(token)
            .header(ACCEPT, "application/json");

        if let Some(body) = &request.body {
            builder = builder.json(body);
        }

        tracing::debug!(
            method = %request.method,
            path = %request.path(),
            "Sending Frontapp request"
        );

        let resp = builder
            .send()
            .await
            .map_err(|e| TransportFailure::Network(e.to_string()))?;

        let status = resp.status();
        let text = resp
            .text()
            .await
            .map_err(|e| TransportFailure::Network(e.to_string()))?;

        if !status.is_success() {
            let message = if text.trim().is_empty() {
                status.canonical_reason().unwrap_or("Unknown status").to_string()
            } else {
                excerpt(&text)
            };
            return Err(TransportFailure::Status {
                status: status.as_u16(),
                message,
            });
        }

        Ok(ApiResponse {
            status: status.as_u16(),
            body: decode_body(&text),
        })
    }
}

/// Empty bodies (204 No Content) become `{}`; anything that is not JSON is
/// kept as a string.
pub fn decode_body(text: &str) -> Value {
    if text.trim().is_empty() {
        return json!({});
    }
    serde_json::from_str(text).unwrap_or_else(|_| Value::String(text.to_string()))
}

/// Flattens a query object onto the URL in bracket notation: nested objects
/// become `parent[child]` and arrays repeat `key[]`. Nulls are skipped.
pub fn with_query(url: &Url, query: Option<&Map<String, Value>>) -> Url {
    let mut url = url.clone();
    let Some(query) = query.filter(|q| !q.is_empty()) else {
        return url;
    };

    let mut flat = Vec::new();
    for (key, value) in query {
        flatten_query(key.clone(), value, &mut flat);
    }
    if !flat.is_empty() {
        url.query_pairs_mut().extend_pairs(flat);
    }
    url
}

fn flatten_query(key: String, value: &Value, out: &mut Vec<(String, String)>) {
    match value {
        Value::Null => {}
        Value::Object(map) => {
            for (child, nested) in map {
                flatten_query(format!("{}[{}]", key, child), nested, out);
            }
        }
        Value::Array(items) => {
            // Keys already written as `x[]` are not bracketed twice.
            let key = if key.ends_with("[]") {
                key
            } else {
                format!("{}[]", key)
            };
            for item in items {
                flatten_query(key.clone(), item, out);
            }
        }
        Value::String(s) => out.push((key, s.clone())),
        other => out.push((key, other.to_string())),
    }
}

fn excerpt(text: &str) -> String {
    let trimmed = text.trim();
    match trimmed.char_indices().nth(ERROR_EXCERPT_LEN) {
        Some((idx, _)) => format!("{}...", &trimmed[..idx]),
        None => trimmed.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_body() {
        assert_eq!(decode_body(""), json!({}));
        assert_eq!(decode_body("  \n"), json!({}));
        assert_eq!(decode_body(r#"{"id": "tag_1"}"#), json!({"id": "tag_1"}));
        assert_eq!(decode_body("plain text"), json!("plain text"));
    }

    #[test]
    fn test_with_query() {
        let base = Url::parse("https://api.frontapp.com/conversations").unwrap();
        let query = json!({
            "limit": 10,
            "q[statuses][]": ["open", "archived"],
            "skip": null
        });
        let url = with_query(&base, query.as_object());
        let pairs: Vec<(String, String)> = url
            .query_pairs()
            .map(|(k, v)| (k.into_owned(), v.into_owned()))
            .collect();

        assert!(pairs.contains(&("limit".to_string(), "10".to_string())));
        assert!(pairs.contains(&("q[statuses][]".to_string(), "open".to_string())));
        assert!(pairs.contains(&("q[statuses][]".to_string(), "archived".to_string())));
        assert!(!pairs.iter().any(|(k, _)| k == "skip"));
    }

    #[test]
    fn test_with_query_nested_filter_uses_brackets() {
        let base = Url::parse("https://api.frontapp.com/conversations").unwrap();
        let query = json!({
            "q": {"statuses": ["open", "unassigned"], "tag_id": "tag_1"},
            "limit": 5
        });
        let url = with_query(&base, query.as_object());
        let pairs: Vec<(String, String)> = url
            .query_pairs()
            .map(|(k, v)| (k.into_owned(), v.into_owned()))
            .collect();

        assert!(pairs.contains(&("limit".to_string(), "5".to_string())));
        assert!(pairs.contains(&("q[statuses][]".to_string(), "open".to_string())));
        assert!(pairs.contains(&("q[statuses][]".to_string(), "unassigned".to_string())));
        assert!(pairs.contains(&("q[tag_id]".to_string(), "tag_1".to_string())));
        assert!(!pairs.iter().any(|(k, _)| k == "q"));
    }

    #[test]
    fn test_with_query_all_null_leaves_url_alone() {
        let base = Url::parse("https://api.frontapp.com/conversations").unwrap();
        let query = json!({"q": {"statuses": null}});
        assert_eq!(with_query(&base, query.as_object()).query(), None);
    }

    #[test]
    fn test_with_query_empty_leaves_url_alone() {
        let base = Url::parse("https://api.frontapp.com/tags").unwrap();
        let empty = Map::new();
        assert_eq!(with_query(&base, Some(&empty)).as_str(), "https://api.frontapp.com/tags");
        assert_eq!(with_query(&base, None).query(), None);
    }

    #[test]
    fn test_excerpt_truncates() {
        let long = "x".repeat(ERROR_EXCERPT_LEN + 10);
        let short = excerpt(&long);
        assert!(short.ends_with("..."));
        assert_eq!(short.len(), ERROR_EXCERPT_LEN + 3);
    }
}
