//! Shared HTTP client for the upstream services
//!
//! One `reqwest::Client` (and therefore one connection pool) is built per
//! process and cloned into every client. Timeouts are applied per request,
//! since each call site has its own bound.

use augur_utils::redaction::{redact_secrets, sanitize_body};
use reqwest::{Client, RequestBuilder, Response};
use std::time::Duration;
use tracing::debug;

use crate::LlmSetupError;

/// Connect timeout applied to every request
const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// A request that produced no HTTP response
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum TransportFailure {
    Timeout(Duration),
    Network(String),
}

/// Cheap to clone; clones share the connection pool.
#[derive(Debug, Clone)]
pub struct HttpClient {
    client: Client,
}

impl HttpClient {
    /// # Errors
    ///
    /// Returns `LlmSetupError::HttpClient` if the TLS backend cannot be
    /// initialised.
    pub fn new() -> Result<Self, LlmSetupError> {
        let client = Client::builder()
            .connect_timeout(DEFAULT_CONNECT_TIMEOUT)
            .pool_idle_timeout(Duration::from_secs(90))
            .pool_max_idle_per_host(10)
            .build()
            .map_err(|e| LlmSetupError::HttpClient(redact_secrets(&e.to_string())))?;
        Ok(Self { client })
    }

    pub(crate) fn inner(&self) -> &Client {
        &self.client
    }

    /// Send a request bounded by `timeout`. No retries.
    pub(crate) async fn send(
        &self,
        request: RequestBuilder,
        timeout: Duration,
        service: &str,
    ) -> Result<Response, TransportFailure> {
        debug!(service = service, timeout_secs = timeout.as_secs(), "Sending HTTP request");
        request.timeout(timeout).send().await.map_err(|e| {
            if e.is_timeout() {
                TransportFailure::Timeout(timeout)
            } else {
                TransportFailure::Network(format!("{service} request failed: {}", redact_secrets(&e.to_string())))
            }
        })
    }
}

/// Read an error response body for inclusion in an error, redacted and
/// truncated. Unreadable bodies become an empty string.
pub(crate) async fn error_body(response: Response) -> String {
    match response.text().await {
        Ok(body) => sanitize_body(&body),
        Err(_) => String::new(),
    }
}

/// Join a service root and an API path with exactly one slash
pub(crate) fn join_url(base: &str, path: &str) -> String {
    format!("{}/{}", base.trim_end_matches('/'), path.trim_start_matches('/'))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_http_client_construction() {
        assert!(HttpClient::new().is_ok());
    }

    #[test]
    fn test_join_url() {
        assert_eq!(
            join_url("https://api.example.com/", "key/api/v1/text2image/run"),
            "https://api.example.com/key/api/v1/text2image/run"
        );
        assert_eq!(join_url("http://h:1", "/a/b"), "http://h:1/a/b");
    }

    #[tokio::test]
    async fn test_network_failure_is_redacted() {
        let client = HttpClient::new().unwrap();
        let request = client.inner().get("http://127.0.0.1:1/?api_key=supersecret");
        let err = client
            .send(request, Duration::from_secs(2), "probe")
            .await
            .unwrap_err();
        match err {
            TransportFailure::Network(msg) => {
                assert!(msg.starts_with("probe request failed"));
                assert!(!msg.contains("supersecret"));
            }
            TransportFailure::Timeout(_) => {}
        }
    }
}
