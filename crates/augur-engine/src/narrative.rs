//! Narrative prompt rendering

use augur_utils::types::{Profile, SEGMENT_COUNT};

/// Renders a [`Profile`] into the user prompt for the text model.
///
/// The prompt asks for exactly three parts (past, present, future) separated
/// by a line holding only `***`, each naming the tarot card drawn for it, so
/// that the splitter's first strategy and the image prompt table both have
/// something to work with.
#[derive(Debug, Clone)]
pub struct NarrativePromptBuilder {
    language: String,
}

impl Default for NarrativePromptBuilder {
    fn default() -> Self {
        Self {
            language: "English".to_string(),
        }
    }
}

impl NarrativePromptBuilder {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Ask the model to answer in another language
    #[must_use]
    pub fn with_language(mut self, language: impl Into<String>) -> Self {
        self.language = language.into();
        self
    }

    #[must_use]
    pub fn build(&self, profile: &Profile) -> String {
        let mut prompt = format!(
            "Give a tarot reading for {name}, born {birth}.\n\
             Question: \"{question}\"\n\
             Area of life: {topic}\n",
            name = profile.name.trim(),
            birth = profile.birth_date.trim(),
            question = profile.question.trim(),
            topic = profile.topic.label(),
        );

        if profile.topic.wants_partner()
            && let Some((partner, partner_birth)) = profile.partner()
        {
            prompt.push_str(&format!("Partner: {partner}, born {partner_birth}.\n"));
        }

        prompt.push_str(&format!(
            "\nDraw {SEGMENT_COUNT} cards and write the reading in exactly {SEGMENT_COUNT} parts:\n\
             1. The past: the card drawn and what led to this question.\n\
             2. The present: the card drawn and the forces at work now.\n\
             3. The future: the card drawn, the likely outcome and concrete advice.\n\
             Name each card in its part. Separate the parts with a line containing only ***, \
             with a blank line before and after it. Do not add headings or an introduction.\n\
             Answer directly, in a vivid and warm voice, in {language}.",
            language = self.language,
        ));

        prompt
    }
}
