//! Concurrent image generation
//!
//! [`FanOutCoordinator::run`] spawns one task per prompt, waits for every
//! task to finish and places each result at its prompt's index. There is no
//! early cancellation: a failing slot does not stop its siblings. Failures are
//! collected into a shared list and reported together, ordered by index.

use std::sync::{Arc, Mutex, PoisonError};

use tokio::task::JoinSet;
use tracing::{Instrument, debug, warn};

use augur_llm::ImageGenerator;
use augur_utils::error::{FanOutError, ImageError, ImageFailure, PollError};
use augur_utils::logging::image_job_span;

#[derive(Clone)]
pub struct FanOutCoordinator {
    generator: Arc<dyn ImageGenerator>,
}

impl std::fmt::Debug for FanOutCoordinator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FanOutCoordinator").finish_non_exhaustive()
    }
}

impl FanOutCoordinator {
    #[must_use]
    pub fn new(generator: Arc<dyn ImageGenerator>) -> Self {
        Self { generator }
    }

    /// Generate one image per prompt, concurrently.
    ///
    /// # Errors
    ///
    /// Returns a [`FanOutError`] listing every failed index when any job
    /// fails. Images from successful slots are discarded in that case.
    pub async fn run<const N: usize>(&self, prompts: [String; N]) -> Result<[Vec<u8>; N], FanOutError> {
        let failures: Arc<Mutex<Vec<ImageFailure>>> = Arc::new(Mutex::new(Vec::new()));
        let mut workers = JoinSet::new();

        for (index, prompt) in prompts.into_iter().enumerate() {
            let generator = Arc::clone(&self.generator);
            let failures = Arc::clone(&failures);
            workers.spawn(
                async move {
                    debug!("Image job started");
                    match generator.generate_image(&prompt).await {
                        Ok(bytes) => {
                            debug!(bytes = bytes.len(), "Image job finished");
                            Some((index, bytes))
                        }
                        Err(error) => {
                            warn!(error = %error, "Image job failed");
                            failures
                                .lock()
                                .unwrap_or_else(PoisonError::into_inner)
                                .push(ImageFailure { index, error });
                            None
                        }
                    }
                }
                .instrument(image_job_span(index)),
            );
        }

        let mut slots: [Option<Vec<u8>>; N] = std::array::from_fn(|_| None);
        while let Some(joined) = workers.join_next().await {
            match joined {
                Ok(Some((index, bytes))) => slots[index] = Some(bytes),
                Ok(None) => {}
                Err(join_error) => warn!(error = %join_error, "Image worker aborted"),
            }
        }

        let mut failures = std::mem::take(&mut *failures.lock().unwrap_or_else(PoisonError::into_inner));

        // A worker that panicked left neither an image nor a failure behind.
        for (index, slot) in slots.iter().enumerate() {
            if slot.is_none() && !failures.iter().any(|f| f.index == index) {
                failures.push(ImageFailure {
                    index,
                    error: ImageError::Poll(PollError::Failed("image worker aborted".to_string())),
                });
            }
        }

        if let Some(error) = FanOutError::new(failures) {
            return Err(error);
        }
        Ok(slots.map(Option::unwrap_or_default))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use augur_utils::error::SubmitError;
    use std::time::Duration;
    use tokio::sync::Barrier;

    /// Echoes the prompt as bytes; prompts starting with `fail` or `panic` misbehave
    struct EchoGenerator;

    #[async_trait]
    impl ImageGenerator for EchoGenerator {
        async fn generate_image(&self, prompt: &str) -> Result<Vec<u8>, ImageError> {
            if let Some(reason) = prompt.strip_prefix("fail:") {
                return Err(ImageError::Poll(PollError::Failed(reason.to_string())));
            }
            if prompt == "refuse" {
                return Err(ImageError::Submit(SubmitError::BadStatus {
                    status: 401,
                    body: "unauthorized".to_string(),
                }));
            }
            if prompt == "panic" {
                panic!("generator exploded");
            }
            Ok(prompt.as_bytes().to_vec())
        }
    }

    fn coordinator() -> FanOutCoordinator {
        FanOutCoordinator::new(Arc::new(EchoGenerator))
    }

    fn prompts(items: [&str; 3]) -> [String; 3] {
        items.map(str::to_string)
    }

    #[tokio::test]
    async fn test_results_keep_their_index() {
        let images = coordinator().run(prompts(["a", "bb", "ccc"])).await.unwrap();
        assert_eq!(images, [b"a".to_vec(), b"bb".to_vec(), b"ccc".to_vec()]);
    }

    #[tokio::test]
    async fn test_single_failure_fails_whole_fan_out() {
        let err = coordinator()
            .run(prompts(["a", "fail:model overloaded", "c"]))
            .await
            .unwrap_err();
        assert_eq!(err.failures().len(), 1);
        assert_eq!(err.failures()[0].index, 1);
        assert_eq!(
            err.to_string(),
            "error generating image 2: generation failed: model overloaded"
        );
    }

    #[tokio::test]
    async fn test_every_failure_is_reported_in_index_order() {
        let err = coordinator()
            .run(prompts(["fail:first", "b", "refuse"]))
            .await
            .unwrap_err();
        let indices: Vec<usize> = err.failures().iter().map(|f| f.index).collect();
        assert_eq!(indices, [0, 2]);
        let message = err.to_string();
        assert!(message.contains("error generating image 1: generation failed: first"));
        assert!(message.contains("; error generating image 3: submit failed: unexpected status 401"));
    }

    #[tokio::test]
    async fn test_panicking_worker_is_reported() {
        let err = coordinator().run(prompts(["a", "b", "panic"])).await.unwrap_err();
        assert_eq!(err.failures().len(), 1);
        assert_eq!(err.failures()[0].index, 2);
        assert!(err.to_string().contains("image worker aborted"));
    }

    struct RendezvousGenerator {
        barrier: Barrier,
    }

    #[async_trait]
    impl ImageGenerator for RendezvousGenerator {
        async fn generate_image(&self, prompt: &str) -> Result<Vec<u8>, ImageError> {
            self.barrier.wait().await;
            Ok(prompt.as_bytes().to_vec())
        }
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_jobs_run_concurrently() {
        // Completes only if all three jobs are in flight at the same time.
        let generator = Arc::new(RendezvousGenerator {
            barrier: Barrier::new(3),
        });
        let coordinator = FanOutCoordinator::new(generator);
        let images = tokio::time::timeout(Duration::from_secs(5), coordinator.run(prompts(["x", "y", "z"])))
            .await
            .expect("fan-out did not run jobs concurrently")
            .unwrap();
        assert_eq!(images[2], b"z".to_vec());
    }
}
