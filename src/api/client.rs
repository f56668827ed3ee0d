//! HTTP client for the DocChat backend
//!
//! [`ApiClient`] owns the base URL, the request timeout, and the optional
//! bearer token. Every request goes through [`ApiClient::execute`], which
//! maps non-success statuses to [`DocchatError`] values.

use crate::config::ApiConfig;
use crate::error::{DocchatError, Result};

use reqwest::{Client, Method, RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::time::Duration;
use url::Url;

/// Path of the login endpoint; a 401 here means bad credentials, not an
/// expired session.
pub(crate) const LOGIN_PATH: &str = "/auth/token";

/// Typed client for the backend REST API
///
/// # Examples
///
/// ```no_run
/// use docchat::api::ApiClient;
/// use docchat::config::ApiConfig;
///
/// # async fn example() -> docchat::error::Result<()> {
/// let client = ApiClient::new(&ApiConfig::default())?.with_token(Some("tok".into()));
/// let sessions = client.list_sessions().await?;
/// println!("{} sessions", sessions.len());
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct ApiClient {
    http: Client,
    base_url: String,
    token: Option<String>,
}

impl ApiClient {
    /// Build a client from configuration
    ///
    /// # Errors
    ///
    /// Returns error if the underlying HTTP client cannot be constructed
    pub fn new(config: &ApiConfig) -> Result<Self> {
        let http = Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .build()
            .map_err(DocchatError::Http)?;

        Ok(Self {
            http,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            token: None,
        })
    }

    /// Attach (or drop) the bearer token sent with every request.
    pub fn with_token(mut self, token: Option<String>) -> Self {
        self.token = token;
        self
    }

    pub fn set_token(&mut self, token: Option<String>) {
        self.token = token;
    }

    pub fn token(&self) -> Option<&str> {
        self.token.as_deref()
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub(crate) fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Start a request with the bearer header applied.
    pub(crate) fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let builder = self.http.request(method, self.url(path));
        match &self.token {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        }
    }

    /// Send a request and turn error statuses into [`DocchatError`].
    ///
    /// A 401 on any path other than the login endpoint becomes
    /// [`DocchatError::SessionExpired`].
    pub(crate) async fn execute(&self, path: &str, builder: RequestBuilder) -> Result<Response> {
        tracing::debug!("Sending request to {}", path);
        let response = builder.send().await.map_err(DocchatError::Http)?;
        let status = response.status();

        if status.is_success() {
            return Ok(response);
        }

        if status == StatusCode::UNAUTHORIZED && !path.starts_with(LOGIN_PATH) {
            tracing::warn!("Backend rejected the stored token for {}", path);
            return Err(DocchatError::SessionExpired.into());
        }

        let body = response.text().await.unwrap_or_default();
        let detail = extract_detail(&body).unwrap_or_else(|| {
            status
                .canonical_reason()
                .unwrap_or("request failed")
                .to_string()
        });
        tracing::debug!("Request to {} failed with {}: {}", path, status, detail);

        Err(DocchatError::Api {
            status: status.as_u16(),
            detail,
        }
        .into())
    }

    pub(crate) async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        let response = self.execute(path, self.request(Method::GET, path)).await?;
        decode(response).await
    }

    pub(crate) async fn send_json<B, T>(&self, method: Method, path: &str, body: &B) -> Result<T>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let builder = self.request(method, path).json(body);
        let response = self.execute(path, builder).await?;
        decode(response).await
    }

    /// Send a request whose response body is ignored.
    pub(crate) async fn send_unit(&self, builder: RequestBuilder, path: &str) -> Result<()> {
        self.execute(path, builder).await?;
        Ok(())
    }
}

/// Join `segments` into an absolute path, percent-encoding each one so a
/// caller-supplied id always stays a single segment.
///
/// # Errors
///
/// Returns [`DocchatError::Validation`] for an empty, `.` or `..` segment
pub(crate) fn endpoint(segments: &[&str]) -> Result<String> {
    if let Some(bad) = segments
        .iter()
        .find(|s| matches!(**s, "" | "." | ".."))
    {
        return Err(DocchatError::Validation(format!("Invalid id in request path: {:?}", bad)).into());
    }

    let mut url = Url::parse("http://localhost/")
        .map_err(|e| DocchatError::Config(format!("Invalid endpoint base: {}", e)))?;
    url.path_segments_mut()
        .map_err(|_| DocchatError::Config("Endpoint base cannot hold a path".to_string()))?
        .clear()
        .extend(segments);
    Ok(url.path().to_string())
}

async fn decode<T: DeserializeOwned>(response: Response) -> Result<T> {
    let bytes = response.bytes().await.map_err(DocchatError::Http)?;
    let value = serde_json::from_slice(&bytes).map_err(DocchatError::Serialization)?;
    Ok(value)
}

/// Pull a readable message out of a FastAPI error body.
///
/// `detail` is either a string or a list of validation errors carrying a
/// `msg` field each.
pub(crate) fn extract_detail(body: &str) -> Option<String> {
    let value: serde_json::Value = serde_json::from_str(body).ok()?;
    match value.get("detail")? {
        serde_json::Value::String(s) => Some(s.clone()),
        serde_json::Value::Array(items) => {
            let msgs: Vec<&str> = items
                .iter()
                .filter_map(|item| item.get("msg").and_then(|m| m.as_str()))
                .collect();
            if msgs.is_empty() {
                None
            } else {
                Some(msgs.join("; "))
            }
        }
        other => Some(other.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_endpoint_keeps_ids_in_one_segment() {
        assert_eq!(endpoint(&["chat", "42", "message"]).unwrap(), "/chat/42/message");
        assert_eq!(
            endpoint(&["chat", "history", "1/../../admin/stats"]).unwrap(),
            "/chat/history/1%2F..%2F..%2Fadmin%2Fstats"
        );
        assert_eq!(endpoint(&["chat", "a?b#c"]).unwrap(), "/chat/a%3Fb%23c");
    }

    #[test]
    fn test_endpoint_rejects_dot_segments() {
        for bad in ["", ".", ".."] {
            assert!(endpoint(&["chat", bad]).is_err(), "{:?} accepted", bad);
        }
    }

    #[test]
    fn test_base_url_trailing_slash_trimmed() {
        let config = ApiConfig {
            base_url: "http://localhost:8000/api/".to_string(),
            timeout_seconds: 5,
        };
        let client = ApiClient::new(&config).unwrap();
        assert_eq!(client.url("/chat/all"), "http://localhost:8000/api/chat/all");
    }

    #[test]
    fn test_with_token() {
        let client = ApiClient::new(&ApiConfig::default())
            .unwrap()
            .with_token(Some("abc".to_string()));
        assert_eq!(client.token(), Some("abc"));
    }

    #[test]
    fn test_extract_detail_string() {
        assert_eq!(
            extract_detail(r#"{"detail":"Chat not found"}"#).as_deref(),
            Some("Chat not found")
        );
    }

    #[test]
    fn test_extract_detail_validation_list() {
        let body = r#"{"detail":[{"loc":["body","email"],"msg":"invalid email"},{"msg":"too short"}]}"#;
        assert_eq!(
            extract_detail(body).as_deref(),
            Some("invalid email; too short")
        );
    }

    #[test]
    fn test_extract_detail_not_json() {
        assert!(extract_detail("Internal Server Error").is_none());
        assert!(extract_detail(r#"{"message":"x"}"#).is_none());
    }
}
