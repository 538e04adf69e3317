//! The engine driving the real two-phase image client against an in-memory
//! job service.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;

use augur_engine::llm::{BackoffPolicy, ImageApi, ImageGenerationClient, JobSnapshot, StatusCheckError, TextGenerator};
use augur_engine::types::{JobId, Profile, Topic};
use augur_engine::{PredictionEngine, split};
use augur_utils::error::{GenError, PredictionError, SubmitError};

struct Narrator;

#[async_trait]
impl TextGenerator for Narrator {
    async fn generate(&self, _prompt: &str) -> Result<String, GenError> {
        Ok("The Hermit walks alone.\n\n***\n\nThe Lovers meet.\n\n***\n\nThe World opens.".to_string())
    }
}

/// Each job reports pending `pending_polls` times, then done with the prompt as image bytes
struct InMemoryJobs {
    pending_polls: u32,
    jobs: Mutex<HashMap<String, (String, u32)>>,
    next_id: AtomicU32,
    refuse_containing: Option<&'static str>,
}

impl InMemoryJobs {
    fn new(pending_polls: u32) -> Self {
        Self {
            pending_polls,
            jobs: Mutex::new(HashMap::new()),
            next_id: AtomicU32::new(1),
            refuse_containing: None,
        }
    }
}

#[async_trait]
impl ImageApi for InMemoryJobs {
    async fn submit(&self, prompt: &str, width: u32, height: u32) -> Result<JobId, SubmitError> {
        assert_eq!((width, height), (64, 64));
        if self.refuse_containing.is_some_and(|needle| prompt.contains(needle)) {
            return Err(SubmitError::BadStatus {
                status: 400,
                body: "prompt rejected".to_string(),
            });
        }
        let id = format!("job-{}", self.next_id.fetch_add(1, Ordering::SeqCst));
        self.jobs.lock().unwrap().insert(id.clone(), (prompt.to_string(), 0));
        Ok(JobId::new(id))
    }

    async fn status(&self, job_id: &JobId) -> Result<JobSnapshot, StatusCheckError> {
        let mut jobs = self.jobs.lock().unwrap();
        let Some((prompt, polls)) = jobs.get_mut(job_id.as_str()) else {
            return Err(StatusCheckError::Transient("404 unknown job".to_string()));
        };
        *polls += 1;
        if *polls <= self.pending_polls {
            return Ok(JobSnapshot::pending());
        }
        Ok(JobSnapshot::done(STANDARD.encode(prompt.as_bytes())))
    }
}

fn fast_backoff() -> BackoffPolicy {
    BackoffPolicy {
        initial: Duration::from_millis(1),
        multiplier: 1.5,
        max_delay: Duration::from_millis(5),
        max_attempts: 5,
    }
}

fn engine(jobs: InMemoryJobs) -> PredictionEngine {
    let images = ImageGenerationClient::new(jobs, fast_backoff(), 64, 64);
    PredictionEngine::new(Arc::new(Narrator), Arc::new(images))
}

fn profile() -> Profile {
    Profile::new("Mira", "01.01.2000", "Where am I heading?", Topic::Decision)
}

#[tokio::test]
async fn test_end_to_end_bundle() {
    let bundle = engine(InMemoryJobs::new(2)).request_prediction(&profile()).await.unwrap();

    assert_eq!(bundle.segments, split(&bundle.text).into_inner());
    assert_eq!(bundle.segments[1], "The Lovers meet.");
    assert!(bundle.prompts[0].contains("hermit"));
    assert!(bundle.prompts[1].contains("lovers"));
    assert!(bundle.prompts[2].contains("dancer"));
    for (image, prompt) in bundle.images.iter().zip(&bundle.prompts) {
        assert_eq!(image.as_deref(), Some(prompt.as_bytes()));
    }
    assert!(bundle.is_complete());
}

#[tokio::test]
async fn test_slow_jobs_time_out() {
    let err = engine(InMemoryJobs::new(100)).request_prediction(&profile()).await.unwrap_err();
    let PredictionError::Images(fan_out) = err else {
        panic!("expected image failure");
    };
    assert_eq!(fan_out.failures().len(), 3);
    assert!(fan_out.to_string().contains("max attempts reached (5)"));
}

#[tokio::test]
async fn test_rejected_submit_is_reported_for_its_slot() {
    let mut jobs = InMemoryJobs::new(0);
    jobs.refuse_containing = Some("lovers");
    let err = engine(jobs).request_prediction(&profile()).await.unwrap_err();
    assert_eq!(
        err.to_string(),
        "Error generating images: error generating image 2: submit failed: unexpected status 400: prompt rejected"
    );
}
