use async_trait::async_trait;
use augur_utils::error::SubmitError;
use augur_utils::types::{JobId, JobStatus};
use serde::Deserialize;
use thiserror::Error;

/// One status query's view of a job
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobSnapshot {
    pub status: JobStatus,
    /// Base64-encoded images, present once the job is done
    pub images: Vec<String>,
    pub error_description: Option<String>,
}

impl JobSnapshot {
    #[must_use]
    pub fn pending() -> Self {
        Self {
            status: JobStatus::Pending,
            images: Vec::new(),
            error_description: None,
        }
    }

    #[must_use]
    pub fn done(image_base64: impl Into<String>) -> Self {
        Self {
            status: JobStatus::Done,
            images: vec![image_base64.into()],
            error_description: None,
        }
    }

    #[must_use]
    pub fn failed(reason: impl Into<String>) -> Self {
        Self {
            status: JobStatus::Failed,
            images: Vec::new(),
            error_description: Some(reason.into()),
        }
    }
}

/// A status query that did not yield a snapshot
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StatusCheckError {
    /// Network failure or non-2xx status; the poll loop tries again
    #[error("status check failed: {0}")]
    Transient(String),

    /// 2xx body that is not status JSON; ends the poll loop
    #[error("undecodable status: {0}")]
    Decode(String),
}

/// The remote image job API
#[async_trait]
pub trait ImageApi: Send + Sync {
    /// Start a job and return its handle
    async fn submit(&self, prompt: &str, width: u32, height: u32) -> Result<JobId, SubmitError>;

    /// Query a job once
    async fn status(&self, job_id: &JobId) -> Result<JobSnapshot, StatusCheckError>;
}

/// Status payload as sent by the service
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct WireStatus {
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub images: Option<Vec<String>>,
    #[serde(default)]
    pub error_description: Option<String>,
    #[serde(default)]
    pub censored: bool,
}

impl From<WireStatus> for JobSnapshot {
    fn from(wire: WireStatus) -> Self {
        let status = if wire.censored {
            JobStatus::Censored
        } else {
            match wire.status.to_ascii_uppercase().as_str() {
                "DONE" => JobStatus::Done,
                "FAIL" | "FAILED" => JobStatus::Failed,
                "CENSORED" => JobStatus::Censored,
                _ => JobStatus::Pending,
            }
        };
        Self {
            status,
            images: wire.images.unwrap_or_default(),
            error_description: wire.error_description.filter(|d| !d.trim().is_empty()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(json: &str) -> JobSnapshot {
        serde_json::from_str::<WireStatus>(json).unwrap().into()
    }

    #[test]
    fn test_wire_status_mapping() {
        assert_eq!(parse(r#"{"status":"INITIAL"}"#).status, JobStatus::Pending);
        assert_eq!(parse(r#"{"status":"PROCESSING"}"#).status, JobStatus::Pending);
        assert_eq!(parse(r#"{"status":"FAIL","errorDescription":"x"}"#).status, JobStatus::Failed);
        assert_eq!(parse(r#"{"status":"CENSORED"}"#).status, JobStatus::Censored);

        let done = parse(r#"{"uuid":"u","status":"DONE","images":["aGk="],"censored":false}"#);
        assert_eq!(done, JobSnapshot::done("aGk="));
    }

    #[test]
    fn test_censored_flag_overrides_status() {
        let snapshot = parse(r#"{"status":"DONE","images":["aGk="],"censored":true}"#);
        assert_eq!(snapshot.status, JobStatus::Censored);
    }

    #[test]
    fn test_failed_keeps_description() {
        let snapshot = parse(r#"{"status":"FAILED","errorDescription":"queue overflow"}"#);
        assert_eq!(snapshot, JobSnapshot::failed("queue overflow"));
    }
}
