use async_trait::async_trait;
use augur_config::ImageConfig;
use augur_utils::error::{ImageError, PollError, SubmitError};
use augur_utils::types::{ImageJob, JobId, JobStatus};
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use tracing::{debug, info, warn};

use super::api::{ImageApi, StatusCheckError};
use super::backoff::BackoffPolicy;
use super::http::HttpImageApi;
use crate::LlmSetupError;
use crate::http_client::HttpClient;

/// Turns a prompt into image bytes
#[async_trait]
pub trait ImageGenerator: Send + Sync {
    /// Submit a job and wait for it to reach a terminal state.
    ///
    /// # Errors
    ///
    /// `ImageError::Submit` when the job could not be started,
    /// `ImageError::Poll` when it failed, was censored or never finished.
    async fn generate_image(&self, prompt: &str) -> Result<Vec<u8>, ImageError>;
}

/// Two-phase image client: submit, then poll with exponential backoff
#[derive(Debug, Clone)]
pub struct ImageGenerationClient<A = HttpImageApi> {
    api: A,
    backoff: BackoffPolicy,
    width: u32,
    height: u32,
}

impl ImageGenerationClient<HttpImageApi> {
    /// # Errors
    ///
    /// See [`HttpImageApi::from_config`].
    pub fn from_config(http: HttpClient, config: &ImageConfig) -> Result<Self, LlmSetupError> {
        Ok(Self::new(
            HttpImageApi::from_config(http, config)?,
            BackoffPolicy::from_config(config),
            config.width,
            config.height,
        ))
    }
}

impl<A: ImageApi> ImageGenerationClient<A> {
    #[must_use]
    pub fn new(api: A, backoff: BackoffPolicy, width: u32, height: u32) -> Self {
        Self {
            api,
            backoff,
            width,
            height,
        }
    }

    #[must_use]
    pub fn backoff(&self) -> &BackoffPolicy {
        &self.backoff
    }

    /// # Errors
    ///
    /// See [`SubmitError`].
    pub async fn submit(&self, prompt: &str, width: u32, height: u32) -> Result<JobId, SubmitError> {
        self.api.submit(prompt, width, height).await
    }

    /// Poll a job until it is done, failed or censored, or attempts run out.
    ///
    /// # Errors
    ///
    /// See [`PollError`].
    pub async fn poll_until_done(&self, job_id: &JobId) -> Result<Vec<u8>, PollError> {
        for attempt in 0..self.backoff.max_attempts {
            tokio::time::sleep(self.backoff.delay_for(attempt)).await;

            let snapshot = match self.api.status(job_id).await {
                Ok(snapshot) => snapshot,
                Err(StatusCheckError::Transient(reason)) => {
                    warn!(job_id = %job_id, attempt = attempt + 1, error = %reason, "Status check failed, retrying");
                    continue;
                }
                Err(StatusCheckError::Decode(reason)) => return Err(PollError::Decode(reason)),
            };

            match snapshot.status {
                JobStatus::Pending => {
                    debug!(job_id = %job_id, attempt = attempt + 1, "Image job pending");
                }
                JobStatus::Done => {
                    let encoded = snapshot
                        .images
                        .first()
                        .ok_or_else(|| PollError::Failed("job finished without an image".to_string()))?;
                    let bytes = STANDARD
                        .decode(encoded.trim())
                        .map_err(|e| PollError::Decode(format!("invalid base64 image: {e}")))?;
                    info!(job_id = %job_id, attempts = attempt + 1, "Image job done");
                    return Ok(bytes);
                }
                JobStatus::Failed => {
                    let reason = snapshot
                        .error_description
                        .unwrap_or_else(|| "unknown error".to_string());
                    return Err(PollError::Failed(reason));
                }
                JobStatus::Censored => return Err(PollError::Censored),
            }
        }

        warn!(job_id = %job_id, attempts = self.backoff.max_attempts, "Image job did not finish");
        Err(PollError::Timeout {
            attempts: self.backoff.max_attempts,
        })
    }

    /// Submit `prompt` and poll it, returning the finished job record.
    ///
    /// # Errors
    ///
    /// `ImageError::Submit` or `ImageError::Poll`, as for
    /// [`ImageGenerator::generate_image`].
    pub async fn run_job(&self, prompt: &str) -> Result<ImageJob, ImageError> {
        let job_id = self.submit(prompt, self.width, self.height).await?;
        let mut job = ImageJob::submitted(prompt, job_id);
        match self.poll_until_done(&job.job_id).await {
            Ok(bytes) => {
                job.observe(JobStatus::Done, Some(bytes));
                Ok(job)
            }
            Err(error) => {
                let status = if error == PollError::Censored {
                    JobStatus::Censored
                } else {
                    JobStatus::Failed
                };
                job.observe(status, None);
                debug!(job_id = %job.job_id, status = %job.status(), prompt_chars = job.prompt.chars().count(), "Image job ended without an image");
                Err(error.into())
            }
        }
    }
}

#[async_trait]
impl<A: ImageApi> ImageGenerator for ImageGenerationClient<A> {
    async fn generate_image(&self, prompt: &str) -> Result<Vec<u8>, ImageError> {
        self.run_job(prompt)
            .await?
            .into_payload()
            .ok_or_else(|| ImageError::Poll(PollError::Failed("job finished without an image".to_string())))
    }
}
