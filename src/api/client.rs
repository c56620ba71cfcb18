use std::sync::Arc;
use std::time::Duration;

use parking_lot::RwLock;

use reqwest::multipart::Form;
use reqwest::{Client, Method, RequestBuilder};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;

use super::error::{ClientError, Operation, Result};

const USER_AGENT: &str = concat!("docsearch/", env!("CARGO_PKG_VERSION"));

/// Thin JSON-over-HTTP transport for the search backend.
///
/// Every call resolves to exactly one of: the decoded body, an application
/// error carrying the server's `detail`, or a transport error.
///
/// Clones share one bearer token, so a login or logout through any clone is
/// seen by every façade holding the client.
#[derive(Debug, Clone)]
pub struct ApiClient {
    client: Client,
    base_url: String,
    token: Arc<RwLock<Option<String>>>,
}

impl ApiClient {
    pub fn new(base_url: &str, timeout: Option<Duration>) -> Result<Self> {
        // Normalize URL - ensure no trailing slash
        let base_url = base_url.trim().trim_end_matches('/').to_string();

        if !base_url.starts_with("http://") && !base_url.starts_with("https://") {
            return Err(ClientError::validation(format!(
                "Invalid API URL '{base_url}': must start with http:// or https://"
            )));
        }

        let mut builder = Client::builder().user_agent(USER_AGENT);
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder.build().map_err(ClientError::ClientBuild)?;

        Ok(Self {
            client,
            base_url,
            token: Arc::new(RwLock::new(None)),
        })
    }

    /// Attach (or clear) the bearer token sent with every request.
    pub fn with_token(self, token: Option<String>) -> Self {
        self.set_token(token);
        self
    }

    pub fn set_token(&self, token: Option<String>) {
        *self.token.write() = token.filter(|t| !t.is_empty());
    }

    pub fn has_token(&self) -> bool {
        self.token.read().is_some()
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        tracing::debug!(%method, path, "Sending request");
        let request = self.client.request(method, self.url(path));
        match self.token.read().as_deref() {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }

    pub async fn get_json<T: DeserializeOwned>(&self, op: Operation, path: &str) -> Result<T> {
        self.send(op, self.request(Method::GET, path)).await
    }

    pub async fn post_json<B, T>(&self, op: Operation, path: &str, body: &B) -> Result<T>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        self.send(op, self.request(Method::POST, path).json(body))
            .await
    }

    pub async fn post_multipart<T: DeserializeOwned>(
        &self,
        op: Operation,
        path: &str,
        form: Form,
    ) -> Result<T> {
        self.send(op, self.request(Method::POST, path).multipart(form))
            .await
    }

    pub async fn delete_json<T: DeserializeOwned>(&self, op: Operation, path: &str) -> Result<T> {
        self.send(op, self.request(Method::DELETE, path)).await
    }

    async fn send<T: DeserializeOwned>(&self, op: Operation, request: RequestBuilder) -> Result<T> {
        let response = request
            .send()
            .await
            .map_err(|source| ClientError::transport(op, source))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|source| ClientError::transport(op, source))?;

        if !status.is_success() {
            let detail =
                extract_detail(&body).unwrap_or_else(|| op.fallback_message().to_string());
            tracing::warn!(status = status.as_u16(), ?op, %detail, "Request failed");
            return Err(ClientError::Application {
                status: status.as_u16(),
                detail,
            });
        }

        serde_json::from_str(&body).map_err(|e| {
            tracing::warn!(?op, "Undecodable response body: {}", e);
            ClientError::Decode(e.to_string())
        })
    }
}

/// Pull the human-readable message out of a FastAPI error body.
///
/// `detail` is either a string or, for request validation failures, a list of
/// `{ "msg": ... }` objects.
pub fn extract_detail(body: &str) -> Option<String> {
    let value: Value = serde_json::from_str(body).ok()?;
    match value.get("detail")? {
        Value::String(detail) if !detail.trim().is_empty() => Some(detail.clone()),
        Value::Array(items) => {
            let messages: Vec<&str> = items
                .iter()
                .filter_map(|item| item.get("msg").and_then(Value::as_str))
                .collect();
            if messages.is_empty() {
                None
            } else {
                Some(messages.join("; "))
            }
        }
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn string_detail_is_returned_verbatim() {
        let body = r#"{"detail": "Incorrect email or password"}"#;
        assert_eq!(
            extract_detail(body).as_deref(),
            Some("Incorrect email or password")
        );
    }

    #[test]
    fn validation_details_are_joined() {
        let body = r#"{"detail": [
            {"loc": ["body", "email"], "msg": "value is not a valid email address"},
            {"loc": ["body", "password"], "msg": "String should have at least 8 characters"}
        ]}"#;
        assert_eq!(
            extract_detail(body).as_deref(),
            Some("value is not a valid email address; String should have at least 8 characters")
        );
    }

    #[test]
    fn missing_or_blank_detail_yields_none() {
        assert!(extract_detail("<html>502 Bad Gateway</html>").is_none());
        assert!(extract_detail(r#"{"error": "boom"}"#).is_none());
        assert!(extract_detail(r#"{"detail": "  "}"#).is_none());
    }

    #[test]
    fn base_url_is_normalized() {
        let api = ApiClient::new("http://localhost:8000/", None).unwrap();
        assert_eq!(api.base_url(), "http://localhost:8000");
        assert_eq!(api.url("/search"), "http://localhost:8000/search");
    }

    #[test]
    fn rejects_non_http_urls() {
        let err = ApiClient::new("localhost:8000", None).unwrap_err();
        assert!(err.is_validation());
    }

    #[test]
    fn empty_token_is_not_attached() {
        let api = ApiClient::new("http://localhost:8000", None)
            .unwrap()
            .with_token(Some(String::new()));
        assert!(!api.has_token());
    }

    #[test]
    fn clones_share_the_token() {
        let api = ApiClient::new("http://localhost:8000", None).unwrap();
        let facade_copy = api.clone();
        api.set_token(Some("tok".into()));
        assert!(facade_copy.has_token());
        facade_copy.set_token(None);
        assert!(!api.has_token());
        api.set_token(Some(String::new()));
        assert!(!api.has_token());
    }

    #[test]
    fn builder_failure_is_not_reported_as_network_error() {
        let source = Client::builder()
            .user_agent("bad\nagent")
            .build()
            .unwrap_err();
        let err = ClientError::ClientBuild(source);
        assert!(!err.is_transport());
        assert!(err.to_string().starts_with("Could not set up the HTTP client"));
    }
}
