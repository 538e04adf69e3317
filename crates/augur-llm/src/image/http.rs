//! HTTP implementation of [`ImageApi`] for the Kandinsky text2image service

use async_trait::async_trait;
use augur_config::ImageConfig;
use augur_utils::error::SubmitError;
use augur_utils::redaction::sanitize_body;
use augur_utils::types::JobId;
use reqwest::RequestBuilder;
use reqwest::multipart::{Form, Part};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;

use super::api::{ImageApi, JobSnapshot, StatusCheckError, WireStatus};
use crate::LlmSetupError;
use crate::http_client::{HttpClient, TransportFailure, error_body, join_url};

const RUN_PATH: &str = "key/api/v1/text2image/run";
const STATUS_PATH: &str = "key/api/v1/text2image/status";

#[derive(Debug, Clone)]
pub struct HttpImageApi {
    http: HttpClient,
    base_url: String,
    api_key: String,
    secret: String,
    model_id: String,
    submit_timeout: Duration,
    poll_timeout: Duration,
}

impl HttpImageApi {
    /// # Errors
    ///
    /// `LlmSetupError::MissingConfig` when the key, secret or base URL is unset.
    pub fn from_config(http: HttpClient, config: &ImageConfig) -> Result<Self, LlmSetupError> {
        let required = |value: &Option<String>, key: &'static str| {
            value
                .clone()
                .filter(|v| !v.trim().is_empty())
                .ok_or(LlmSetupError::MissingConfig(key))
        };
        Ok(Self {
            http,
            api_key: required(&config.api_key, "image.api_key")?,
            secret: required(&config.secret, "image.secret")?,
            base_url: required(&config.base_url, "image.base_url")?,
            model_id: config.model_id.clone(),
            submit_timeout: config.submit_timeout(),
            poll_timeout: config.poll_timeout(),
        })
    }

    fn authorize(&self, request: RequestBuilder) -> RequestBuilder {
        request
            .header("X-Key", format!("Key {}", self.api_key))
            .header("X-Secret", format!("Secret {}", self.secret))
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateParams<'a> {
    #[serde(rename = "type")]
    kind: &'static str,
    num_images: u32,
    width: u32,
    height: u32,
    generate_params: Query<'a>,
}

#[derive(Debug, Serialize)]
struct Query<'a> {
    query: &'a str,
}

#[derive(Debug, Deserialize)]
struct SubmitResponse {
    #[serde(default)]
    uuid: Option<String>,
}

#[async_trait]
impl ImageApi for HttpImageApi {
    async fn submit(&self, prompt: &str, width: u32, height: u32) -> Result<JobId, SubmitError> {
        let params = GenerateParams {
            kind: "GENERATE",
            num_images: 1,
            width,
            height,
            generate_params: Query { query: prompt },
        };
        let params_json = serde_json::to_string(&params).map_err(|e| SubmitError::Decode(e.to_string()))?;
        let params_part = Part::text(params_json)
            .mime_str("application/json")
            .map_err(|e| SubmitError::Decode(format!("invalid params part: {e}")))?;
        let form = Form::new()
            .part("params", params_part)
            .text("model_id", self.model_id.clone());

        let request = self
            .authorize(self.http.inner().post(join_url(&self.base_url, RUN_PATH)))
            .multipart(form);

        let response = self
            .http
            .send(request, self.submit_timeout, "image submit")
            .await
            .map_err(|failure| match failure {
                TransportFailure::Timeout(after) => SubmitError::Network(format!("timed out after {after:?}")),
                TransportFailure::Network(msg) => SubmitError::Network(msg),
            })?;

        let status = response.status().as_u16();
        if !matches!(status, 200 | 201) {
            return Err(SubmitError::BadStatus {
                status,
                body: error_body(response).await,
            });
        }

        let body = response
            .text()
            .await
            .map_err(|e| SubmitError::Network(format!("failed to read response body: {e}")))?;
        let parsed: SubmitResponse = serde_json::from_str(&body)
            .map_err(|e| SubmitError::Decode(format!("{e}; body: {}", sanitize_body(&body))))?;

        let uuid = parsed
            .uuid
            .filter(|id| !id.trim().is_empty())
            .ok_or_else(|| SubmitError::Decode(format!("response has no uuid; body: {}", sanitize_body(&body))))?;
        debug!(job_id = %uuid, "Image job submitted");
        Ok(JobId::new(uuid))
    }

    async fn status(&self, job_id: &JobId) -> Result<JobSnapshot, StatusCheckError> {
        let url = join_url(&self.base_url, &format!("{STATUS_PATH}/{job_id}"));
        let request = self.authorize(self.http.inner().get(url));

        let response = self
            .http
            .send(request, self.poll_timeout, "image status")
            .await
            .map_err(|failure| match failure {
                TransportFailure::Timeout(after) => StatusCheckError::Transient(format!("timed out after {after:?}")),
                TransportFailure::Network(msg) => StatusCheckError::Transient(msg),
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = error_body(response).await;
            return Err(StatusCheckError::Transient(format!("status {}: {body}", status.as_u16())));
        }

        let body = response
            .text()
            .await
            .map_err(|e| StatusCheckError::Transient(format!("failed to read response body: {e}")))?;
        let wire: WireStatus = serde_json::from_str(&body)
            .map_err(|e| StatusCheckError::Decode(format!("{e}; body: {}", sanitize_body(&body))))?;
        Ok(wire.into())
    }
}
