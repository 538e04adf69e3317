//! Core data model shared by every augur crate
//!
//! A request enters as a [`Profile`], becomes a [`GenerationResult`] once the
//! narrative is generated and split, fans out into three [`ImageJob`]s, and
//! leaves as a [`ResultBundle`].

use chrono::NaiveDate;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::{ImageFailure, ProfileError};

/// Number of narrative segments (and therefore images) per reading
pub const SEGMENT_COUNT: usize = 3;

/// Birth dates are exchanged as `DD.MM.YYYY`
pub const BIRTH_DATE_FORMAT: &str = "%d.%m.%Y";

static BIRTH_DATE_SHAPE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\d{2}\.\d{2}\.\d{4}$").unwrap());

/// Life area the question is about
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Topic {
    /// Love and relationships
    Love,
    /// Health
    Health,
    /// Career and money
    Career,
    /// Making a decision
    Decision,
}

impl Topic {
    /// All topics in menu order
    pub const ALL: [Topic; 4] = [Topic::Love, Topic::Health, Topic::Career, Topic::Decision];

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Love => "love",
            Self::Health => "health",
            Self::Career => "career",
            Self::Decision => "decision",
        }
    }

    /// Human-readable label used in prompts and conversation replies
    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            Self::Love => "love and relationships",
            Self::Health => "health",
            Self::Career => "career and money",
            Self::Decision => "making a decision",
        }
    }

    /// Whether readings on this topic ask about a partner
    #[must_use]
    pub fn wants_partner(self) -> bool {
        matches!(self, Self::Love)
    }
}

impl fmt::Display for Topic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Topic {
    type Err = ProfileError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "love" => Ok(Self::Love),
            "health" => Ok(Self::Health),
            "career" => Ok(Self::Career),
            "decision" => Ok(Self::Decision),
            other => Err(ProfileError::UnknownTopic(other.to_string())),
        }
    }
}

/// Parse and validate a `DD.MM.YYYY` date.
///
/// # Errors
///
/// Returns `ProfileError::InvalidDate` when the shape is wrong or the date
/// does not exist on the calendar (e.g. `31.02.1990`).
pub fn parse_birth_date(field: &'static str, value: &str) -> Result<NaiveDate, ProfileError> {
    let value = value.trim();
    if !BIRTH_DATE_SHAPE.is_match(value) {
        return Err(ProfileError::InvalidDate {
            field,
            value: value.to_string(),
        });
    }
    NaiveDate::parse_from_str(value, BIRTH_DATE_FORMAT).map_err(|_| ProfileError::InvalidDate {
        field,
        value: value.to_string(),
    })
}

/// The user-supplied input for one reading.
///
/// Accepts the legacy `mode` and `partnerBirth` field names on the wire.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Profile {
    pub name: String,
    /// `DD.MM.YYYY`
    pub birth_date: String,
    pub question: String,
    #[serde(alias = "mode")]
    pub topic: Topic,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub partner_name: Option<String>,
    #[serde(default, alias = "partnerBirth", skip_serializing_if = "Option::is_none")]
    pub partner_birth_date: Option<String>,
}

impl Profile {
    #[must_use]
    pub fn new(
        name: impl Into<String>,
        birth_date: impl Into<String>,
        question: impl Into<String>,
        topic: Topic,
    ) -> Self {
        Self {
            name: name.into(),
            birth_date: birth_date.into(),
            question: question.into(),
            topic,
            partner_name: None,
            partner_birth_date: None,
        }
    }

    #[must_use]
    pub fn with_partner(mut self, name: impl Into<String>, birth_date: impl Into<String>) -> Self {
        self.partner_name = Some(name.into());
        self.partner_birth_date = Some(birth_date.into());
        self
    }

    /// Check the profile before it reaches the orchestration core.
    ///
    /// # Errors
    ///
    /// Returns the first problem found: a blank required field, a malformed
    /// birth date, or a malformed partner birth date.
    pub fn validate(&self) -> Result<(), ProfileError> {
        if self.name.trim().is_empty() {
            return Err(ProfileError::MissingField("name"));
        }
        parse_birth_date("birthDate", &self.birth_date)?;
        if self.question.trim().is_empty() {
            return Err(ProfileError::MissingField("question"));
        }
        if let Some(partner_birth) = self.partner_birth_date.as_deref()
            && !partner_birth.trim().is_empty()
        {
            parse_birth_date("partnerBirthDate", partner_birth)?;
        }
        Ok(())
    }

    /// Partner name and birth date, when both are present and non-blank
    #[must_use]
    pub fn partner(&self) -> Option<(&str, &str)> {
        match (self.partner_name.as_deref(), self.partner_birth_date.as_deref()) {
            (Some(name), Some(birth)) if !name.trim().is_empty() && !birth.trim().is_empty() => {
                Some((name.trim(), birth.trim()))
            }
            _ => None,
        }
    }
}

/// Exactly three non-blank narrative segments, in reading order.
///
/// The only constructor fills blank parts from caller-supplied fallbacks, so a
/// `Segments` value can never hold an empty segment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct Segments([String; SEGMENT_COUNT]);

impl Segments {
    /// Build segments, trimming each part and replacing blank parts with the
    /// fallback at the same index.
    #[must_use]
    pub fn with_fallbacks(parts: [String; SEGMENT_COUNT], fallbacks: [&str; SEGMENT_COUNT]) -> Self {
        debug_assert!(fallbacks.iter().all(|f| !f.trim().is_empty()));
        let mut index = 0;
        Self(parts.map(|part| {
            let fallback = fallbacks[index];
            index += 1;
            let trimmed = part.trim();
            if trimmed.is_empty() {
                fallback.trim().to_string()
            } else {
                trimmed.to_string()
            }
        }))
    }

    #[must_use]
    pub fn as_array(&self) -> &[String; SEGMENT_COUNT] {
        &self.0
    }

    pub fn iter(&self) -> std::slice::Iter<'_, String> {
        self.0.iter()
    }

    #[must_use]
    pub fn into_inner(self) -> [String; SEGMENT_COUNT] {
        self.0
    }
}

impl std::ops::Index<usize> for Segments {
    type Output = String;

    fn index(&self, index: usize) -> &Self::Output {
        &self.0[index]
    }
}

/// Generated narrative plus its three-way split
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenerationResult {
    pub text: String,
    pub segments: Segments,
}

/// Opaque handle returned by the image service on submit
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct JobId(String);

impl JobId {
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for JobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Lifecycle of a remote image job
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobStatus {
    Pending,
    Done,
    Failed,
    Censored,
}

impl JobStatus {
    /// Terminal states admit no further transition
    #[must_use]
    pub fn is_terminal(self) -> bool {
        !matches!(self, Self::Pending)
    }
}

impl fmt::Display for JobStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Pending => write!(f, "pending"),
            Self::Done => write!(f, "done"),
            Self::Failed => write!(f, "failed"),
            Self::Censored => write!(f, "censored"),
        }
    }
}

/// One image generation job, from submit to its terminal state
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageJob {
    pub prompt: String,
    pub job_id: JobId,
    status: JobStatus,
    payload: Option<Vec<u8>>,
}

impl ImageJob {
    /// A freshly submitted job is pending
    #[must_use]
    pub fn submitted(prompt: impl Into<String>, job_id: JobId) -> Self {
        Self {
            prompt: prompt.into(),
            job_id,
            status: JobStatus::Pending,
            payload: None,
        }
    }

    #[must_use]
    pub fn status(&self) -> JobStatus {
        self.status
    }

    #[must_use]
    pub fn payload(&self) -> Option<&[u8]> {
        self.payload.as_deref()
    }

    /// Record a polled status. Returns `false` (and changes nothing) once the
    /// job has reached a terminal state.
    pub fn observe(&mut self, status: JobStatus, payload: Option<Vec<u8>>) -> bool {
        if self.status.is_terminal() {
            return false;
        }
        self.status = status;
        if status == JobStatus::Done {
            self.payload = payload;
        }
        true
    }

    /// Consume the job, yielding the payload of a finished job
    #[must_use]
    pub fn into_payload(self) -> Option<Vec<u8>> {
        self.payload
    }
}

/// Everything one reading produces, index-aligned
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResultBundle {
    /// The full narrative as returned by the text service
    pub text: String,
    pub segments: [String; SEGMENT_COUNT],
    pub images: [Option<Vec<u8>>; SEGMENT_COUNT],
    pub prompts: [String; SEGMENT_COUNT],
    /// Per-slot failures kept alongside a partial result. The engine fails
    /// the whole reading on any image failure, so bundles it returns carry
    /// none.
    pub errors: Vec<ImageFailure>,
}

impl ResultBundle {
    /// True when every slot holds non-empty image bytes
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.images.iter().all(|img| img.as_ref().is_some_and(|b| !b.is_empty()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_topic_round_trips_through_str() {
        for topic in Topic::ALL {
            assert_eq!(topic.as_str().parse::<Topic>().unwrap(), topic);
        }
        assert!(matches!(
            "astrology".parse::<Topic>(),
            Err(ProfileError::UnknownTopic(t)) if t == "astrology"
        ));
    }

    #[test]
    fn test_profile_accepts_legacy_field_names() {
        let json = r#"{"name":"Ann","birthDate":"01.02.1990","question":"Will it work?","mode":"love","partnerName":"Bo","partnerBirth":"03.04.1991"}"#;
        let profile: Profile = serde_json::from_str(json).unwrap();
        assert_eq!(profile.topic, Topic::Love);
        assert_eq!(profile.partner(), Some(("Bo", "03.04.1991")));
    }

    #[test]
    fn test_validate_rejects_impossible_dates() {
        let profile = Profile::new("Ann", "31.02.1990", "q", Topic::Health);
        assert!(matches!(
            profile.validate(),
            Err(ProfileError::InvalidDate { field: "birthDate", .. })
        ));

        let profile = Profile::new("Ann", "1990-02-01", "q", Topic::Health);
        assert!(profile.validate().is_err());
    }

    #[test]
    fn test_validate_checks_partner_birth_date() {
        let profile = Profile::new("Ann", "01.02.1990", "q", Topic::Love).with_partner("Bo", "99.99.1999");
        assert!(matches!(
            profile.validate(),
            Err(ProfileError::InvalidDate { field: "partnerBirthDate", .. })
        ));
    }

    #[test]
    fn test_validate_requires_name_and_question() {
        let profile = Profile::new("  ", "01.02.1990", "q", Topic::Career);
        assert!(matches!(profile.validate(), Err(ProfileError::MissingField("name"))));

        let profile = Profile::new("Ann", "01.02.1990", "", Topic::Career);
        assert!(matches!(profile.validate(), Err(ProfileError::MissingField("question"))));
    }

    #[test]
    fn test_segments_fill_blank_parts() {
        let segments = Segments::with_fallbacks(
            ["  a ".to_string(), "\n\n".to_string(), "c".to_string()],
            ["x", "y", "z"],
        );
        assert_eq!(segments.as_array(), &["a".to_string(), "y".to_string(), "c".to_string()]);
    }

    #[test]
    fn test_image_job_is_immutable_after_terminal_state() {
        let mut job = ImageJob::submitted("prompt", JobId::new("abc"));
        assert!(job.observe(JobStatus::Pending, None));
        assert!(job.observe(JobStatus::Done, Some(vec![1, 2, 3])));
        assert!(!job.observe(JobStatus::Failed, None));
        assert_eq!(job.status(), JobStatus::Done);
        assert_eq!(job.payload(), Some(&[1u8, 2, 3][..]));
    }

    #[test]
    fn test_bundle_completeness_depends_on_images() {
        let mut bundle = ResultBundle {
            text: "a\n\nb\n\nc".to_string(),
            segments: ["a".to_string(), "b".to_string(), "c".to_string()],
            images: [Some(vec![1]), Some(vec![2]), Some(vec![3])],
            prompts: ["p".to_string(), "p".to_string(), "p".to_string()],
            errors: Vec::new(),
        };
        assert!(bundle.is_complete());

        bundle.images[1] = Some(Vec::new());
        assert!(!bundle.is_complete());
        bundle.images[1] = None;
        assert!(!bundle.is_complete());
    }
}
