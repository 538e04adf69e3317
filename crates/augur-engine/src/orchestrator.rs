//! Prediction orchestration
//!
//! [`PredictionEngine`] runs one reading through a fixed sequence of
//! [`Stage`]s. Each stage runs only after the previous one succeeded; the
//! first failure ends the request and is returned unchanged, wrapped in a
//! [`PredictionError`]. The engine holds no per-request state, so a single
//! instance is shared by every request in the process.

use std::fmt;
use std::sync::Arc;
use std::time::Instant;

use tracing::{Instrument, debug, info};
use uuid::Uuid;

use augur_config::Config;
use augur_llm::{ChatCompletionClient, HttpClient, ImageGenerationClient, ImageGenerator, LlmSetupError, TextGenerator};
use augur_utils::error::{GenError, PredictionError};
use augur_utils::logging::{log_prediction_error, log_stage, prediction_span};
use augur_utils::types::{GenerationResult, Profile, ResultBundle, SEGMENT_COUNT, Segments};

use crate::fanout::FanOutCoordinator;
use crate::image_prompt::{ImagePromptSource, ImagePromptTable};
use crate::narrative::NarrativePromptBuilder;
use crate::splitter::split;

/// Pipeline stages, in execution order
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Received,
    TextGenerating,
    Segmenting,
    ImagePromptDerivation,
    ImageFanOut,
    Assembling,
    Completed,
    Failed,
}

impl Stage {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Received => "received",
            Self::TextGenerating => "text_generating",
            Self::Segmenting => "segmenting",
            Self::ImagePromptDerivation => "image_prompt_derivation",
            Self::ImageFanOut => "image_fan_out",
            Self::Assembling => "assembling",
            Self::Completed => "completed",
            Self::Failed => "failed",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Turns a [`Profile`] into a [`ResultBundle`].
///
/// Cheap to clone; clones share the underlying clients.
#[derive(Clone)]
pub struct PredictionEngine {
    text: Arc<dyn TextGenerator>,
    fanout: FanOutCoordinator,
    prompts: Arc<dyn ImagePromptSource>,
    narrative: NarrativePromptBuilder,
}

impl fmt::Debug for PredictionEngine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PredictionEngine")
            .field("narrative", &self.narrative)
            .finish_non_exhaustive()
    }
}

impl PredictionEngine {
    /// Engine over the given clients with the built-in tarot prompt table.
    #[must_use]
    pub fn new(text: Arc<dyn TextGenerator>, images: Arc<dyn ImageGenerator>) -> Self {
        Self {
            text,
            fanout: FanOutCoordinator::new(images),
            prompts: Arc::new(ImagePromptTable::tarot()),
            narrative: NarrativePromptBuilder::default(),
        }
    }

    /// Engine over the HTTP clients described by `config`.
    ///
    /// Both clients share one connection pool.
    ///
    /// # Errors
    ///
    /// Returns `LlmSetupError` if a required credential or endpoint is
    /// missing, or the HTTP client cannot be built.
    pub fn from_config(config: &Config) -> Result<Self, LlmSetupError> {
        let http = HttpClient::new()?;
        let text = ChatCompletionClient::from_config(http.clone(), &config.text)?;
        let images = ImageGenerationClient::from_config(http, &config.image)?;
        Ok(Self::new(Arc::new(text), Arc::new(images)))
    }

    /// Replace the image prompt rules
    #[must_use]
    pub fn with_prompt_source(mut self, prompts: Arc<dyn ImagePromptSource>) -> Self {
        self.prompts = prompts;
        self
    }

    #[must_use]
    pub fn with_narrative(mut self, narrative: NarrativePromptBuilder) -> Self {
        self.narrative = narrative;
        self
    }

    /// Run one reading end to end.
    ///
    /// # Errors
    ///
    /// - `PredictionError::Text` when the narrative cannot be generated
    /// - `PredictionError::Images` when any of the three images fails; no
    ///   partial bundle is returned
    pub async fn request_prediction(&self, profile: &Profile) -> Result<ResultBundle, PredictionError> {
        let request_id = Uuid::new_v4().to_string();
        let span = prediction_span(&request_id, profile.topic.as_str());
        self.run(&request_id, profile).instrument(span).await
    }

    async fn run(&self, request_id: &str, profile: &Profile) -> Result<ResultBundle, PredictionError> {
        let started = Instant::now();
        log_stage(request_id, Stage::Received.as_str());

        let result = self.stages(request_id, profile).await;
        let elapsed_ms = started.elapsed().as_millis();

        match &result {
            Ok(_) => {
                log_stage(request_id, Stage::Completed.as_str());
                info!(request_id = %request_id, duration_ms = %elapsed_ms, "Prediction completed");
            }
            Err((stage, error)) => {
                log_stage(request_id, Stage::Failed.as_str());
                log_prediction_error(request_id, stage.as_str(), &error.to_string(), elapsed_ms);
            }
        }
        result.map_err(|(_, error)| error)
    }

    async fn stages(&self, request_id: &str, profile: &Profile) -> Result<ResultBundle, (Stage, PredictionError)> {
        log_stage(request_id, Stage::TextGenerating.as_str());
        let text = self
            .generate_text(profile)
            .await
            .map_err(|e| (Stage::TextGenerating, PredictionError::from(e)))?;

        log_stage(request_id, Stage::Segmenting.as_str());
        let segments = split(&text);
        debug!(lengths = ?segments.iter().map(String::len).collect::<Vec<_>>(), "Narrative split");
        let generation = GenerationResult { text, segments };

        log_stage(request_id, Stage::ImagePromptDerivation.as_str());
        let prompts = self.derive_prompts(&generation.segments);

        log_stage(request_id, Stage::ImageFanOut.as_str());
        let images = self
            .fanout
            .run(prompts.clone())
            .await
            .map_err(|e| (Stage::ImageFanOut, PredictionError::from(e)))?;

        log_stage(request_id, Stage::Assembling.as_str());
        Ok(ResultBundle {
            text: generation.text,
            segments: generation.segments.into_inner(),
            images: images.map(Some),
            prompts,
            errors: Vec::new(),
        })
    }

    /// Render the narrative prompt and generate the text.
    ///
    /// # Errors
    ///
    /// Propagates the text client's `GenError`.
    pub async fn generate_text(&self, profile: &Profile) -> Result<String, GenError> {
        let prompt = self.narrative.build(profile);
        debug!(prompt_chars = prompt.chars().count(), "Narrative prompt rendered");
        self.text.generate(&prompt).await
    }

    /// One image prompt per segment, index-aligned
    #[must_use]
    pub fn derive_prompts(&self, segments: &Segments) -> [String; SEGMENT_COUNT] {
        std::array::from_fn(|i| self.prompts.derive(&segments[i]))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use augur_utils::error::{ImageError, PollError};
    use augur_utils::test_support::{png_bytes, sample_profile, three_part_narrative};
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct FixedText {
        reply: Result<String, GenError>,
        prompts: Mutex<Vec<String>>,
    }

    impl FixedText {
        fn ok(text: impl Into<String>) -> Arc<Self> {
            Arc::new(Self {
                reply: Ok(text.into()),
                prompts: Mutex::new(Vec::new()),
            })
        }

        fn err(error: GenError) -> Arc<Self> {
            Arc::new(Self {
                reply: Err(error),
                prompts: Mutex::new(Vec::new()),
            })
        }
    }

    #[async_trait]
    impl TextGenerator for FixedText {
        async fn generate(&self, prompt: &str) -> Result<String, GenError> {
            self.prompts.lock().unwrap().push(prompt.to_string());
            self.reply.clone()
        }
    }

    /// Returns a PNG stub, or fails for prompts containing `fail_on`
    struct StubImages {
        fail_on: Option<&'static str>,
        calls: AtomicUsize,
    }

    impl StubImages {
        fn new(fail_on: Option<&'static str>) -> Arc<Self> {
            Arc::new(Self {
                fail_on,
                calls: AtomicUsize::new(0),
            })
        }
    }

    #[async_trait]
    impl ImageGenerator for StubImages {
        async fn generate_image(&self, prompt: &str) -> Result<Vec<u8>, ImageError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.fail_on.is_some_and(|needle| prompt.contains(needle)) {
                return Err(ImageError::Poll(PollError::Censored));
            }
            let mut bytes = png_bytes();
            bytes.extend_from_slice(prompt.as_bytes());
            Ok(bytes)
        }
    }

    #[test]
    fn test_stage_names() {
        assert_eq!(Stage::ImagePromptDerivation.to_string(), "image_prompt_derivation");
        assert_eq!(Stage::ImageFanOut.as_str(), "image_fan_out");
    }

    #[tokio::test]
    async fn test_bundle_is_index_aligned() {
        let text = FixedText::ok(three_part_narrative());
        let images = StubImages::new(None);
        let engine = PredictionEngine::new(text.clone(), images.clone());

        let bundle = engine.request_prediction(&sample_profile()).await.unwrap();

        assert!(bundle.is_complete());
        assert_eq!(bundle.text, three_part_narrative());
        assert!(bundle.segments[0].starts_with("The Tower"));
        assert!(bundle.prompts[0].starts_with("A crumbling tower"));
        assert!(bundle.prompts[1].starts_with("A serene figure"));
        assert!(bundle.prompts[2].starts_with("A bright sun"));
        for (image, prompt) in bundle.images.iter().zip(&bundle.prompts) {
            let image = image.as_ref().unwrap();
            assert!(image.starts_with(&png_bytes()));
            assert!(image.ends_with(prompt.as_bytes()));
        }
        assert_eq!(images.calls.load(Ordering::SeqCst), 3);

        let sent = text.prompts.lock().unwrap();
        assert_eq!(sent.len(), 1);
        assert!(sent[0].contains("Anna"));
    }

    #[tokio::test]
    async fn test_text_failure_skips_images() {
        let images = StubImages::new(None);
        let engine = PredictionEngine::new(FixedText::err(GenError::EmptyResponse), images.clone());

        let err = engine.request_prediction(&sample_profile()).await.unwrap_err();

        assert_eq!(err, PredictionError::Text(GenError::EmptyResponse));
        assert_eq!(images.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_image_failure_returns_no_bundle() {
        let engine = PredictionEngine::new(FixedText::ok(three_part_narrative()), StubImages::new(Some("serene")));

        let err = engine.request_prediction(&sample_profile()).await.unwrap_err();

        let PredictionError::Images(fan_out) = &err else {
            panic!("expected image failure, got {err:?}");
        };
        assert_eq!(fan_out.failures().len(), 1);
        assert_eq!(fan_out.failures()[0].index, 1);
        assert_eq!(
            err.to_string(),
            "Error generating images: error generating image 2: image was censored"
        );
    }

    #[tokio::test]
    async fn test_custom_prompt_source() {
        struct Constant;
        impl ImagePromptSource for Constant {
            fn derive(&self, _segment: &str) -> String {
                "constant".to_string()
            }
        }

        let engine = PredictionEngine::new(FixedText::ok("one\n\ntwo\n\nthree"), StubImages::new(None))
            .with_prompt_source(Arc::new(Constant));
        let bundle = engine.request_prediction(&sample_profile()).await.unwrap();
        assert_eq!(bundle.prompts, ["constant", "constant", "constant"]);
        assert_eq!(bundle.segments, ["one", "two", "three"]);
    }

    #[test]
    fn test_from_config_requires_credentials() {
        let config = Config::default();
        assert!(matches!(
            PredictionEngine::from_config(&config),
            Err(LlmSetupError::MissingConfig(_))
        ));
    }
}
