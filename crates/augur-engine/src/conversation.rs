//! Turn-by-turn profile collection
//!
//! A [`Conversation`] asks for one [`Profile`] field per turn, validating each
//! answer before moving on. Partner details are asked only for topics that
//! want them. The conversation holds no I/O and no shared state; whoever owns
//! the session keeps the value and feeds it messages.

use serde::Serialize;

use augur_utils::types::{Profile, Topic, parse_birth_date};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ConversationStep {
    /// Nothing asked yet
    Start,
    Name,
    BirthDate,
    Topic,
    PartnerName,
    PartnerBirthDate,
    Question,
    /// The profile has been handed out
    Complete,
}

/// Outcome of one message
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Turn {
    pub reply: String,
    /// Set on the turn that completed the profile
    pub profile: Option<Profile>,
}

impl Turn {
    fn ask(reply: impl Into<String>) -> Self {
        Self {
            reply: reply.into(),
            profile: None,
        }
    }

    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.profile.is_some()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Conversation {
    step: ConversationStep,
    name: String,
    birth_date: String,
    topic: Option<Topic>,
    partner_name: Option<String>,
    partner_birth_date: Option<String>,
}

impl Default for Conversation {
    fn default() -> Self {
        Self::new()
    }
}

impl Conversation {
    #[must_use]
    pub fn new() -> Self {
        Self {
            step: ConversationStep::Start,
            name: String::new(),
            birth_date: String::new(),
            topic: None,
            partner_name: None,
            partner_birth_date: None,
        }
    }

    #[must_use]
    pub fn step(&self) -> ConversationStep {
        self.step
    }

    /// Feed one user message and get the next reply.
    ///
    /// The first message of a conversation only opens it. After completion,
    /// the next message starts a fresh conversation.
    pub fn advance(&mut self, message: &str) -> Turn {
        let message = message.trim();
        match self.step {
            ConversationStep::Start | ConversationStep::Complete => {
                *self = Self::new();
                self.step = ConversationStep::Name;
                Turn::ask("Welcome. The cards are ready. What is your name?")
            }
            ConversationStep::Name => {
                if message.is_empty() {
                    return Turn::ask("Please tell me your name.");
                }
                self.name = message.to_string();
                self.step = ConversationStep::BirthDate;
                Turn::ask(format!("Nice to meet you, {message}. What is your date of birth? (DD.MM.YYYY)"))
            }
            ConversationStep::BirthDate => {
                if parse_birth_date("birthDate", message).is_err() {
                    return Turn::ask("That date does not look right. Please use DD.MM.YYYY, for example 15.03.1990.");
                }
                self.birth_date = message.to_string();
                self.step = ConversationStep::Topic;
                Turn::ask(topic_menu())
            }
            ConversationStep::Topic => {
                let Some(topic) = parse_topic_answer(message) else {
                    return Turn::ask(format!("I did not recognise that area. {}", topic_menu()));
                };
                self.topic = Some(topic);
                if topic.wants_partner() {
                    self.step = ConversationStep::PartnerName;
                    Turn::ask("What is your partner's name?")
                } else {
                    self.step = ConversationStep::Question;
                    Turn::ask(format!("You chose {}. What is your question?", topic.label()))
                }
            }
            ConversationStep::PartnerName => {
                if message.is_empty() {
                    return Turn::ask("Please tell me your partner's name.");
                }
                self.partner_name = Some(message.to_string());
                self.step = ConversationStep::PartnerBirthDate;
                Turn::ask("What is your partner's date of birth? (DD.MM.YYYY)")
            }
            ConversationStep::PartnerBirthDate => {
                if parse_birth_date("partnerBirthDate", message).is_err() {
                    return Turn::ask("That date does not look right. Please use DD.MM.YYYY.");
                }
                self.partner_birth_date = Some(message.to_string());
                self.step = ConversationStep::Question;
                Turn::ask("What is your question?")
            }
            ConversationStep::Question => {
                if message.is_empty() {
                    return Turn::ask("Please ask your question.");
                }
                let profile = self.finish(message);
                self.step = ConversationStep::Complete;
                Turn {
                    reply: "The cards are laid out. Reading your fate...".to_string(),
                    profile: Some(profile),
                }
            }
        }
    }

    fn finish(&self, question: &str) -> Profile {
        let profile = Profile::new(
            self.name.clone(),
            self.birth_date.clone(),
            question,
            self.topic.unwrap_or(Topic::Decision),
        );
        match (&self.partner_name, &self.partner_birth_date) {
            (Some(name), Some(birth)) => profile.with_partner(name.clone(), birth.clone()),
            _ => profile,
        }
    }
}

fn topic_menu() -> String {
    let options: Vec<String> = Topic::ALL
        .iter()
        .enumerate()
        .map(|(i, topic)| format!("{}. {}", i + 1, topic.label()))
        .collect();
    format!("Which area of life is your question about? {}", options.join(", "))
}

/// Accepts a menu number, a topic name or its label
fn parse_topic_answer(answer: &str) -> Option<Topic> {
    if let Ok(number) = answer.parse::<usize>() {
        return number.checked_sub(1).and_then(|i| Topic::ALL.get(i)).copied();
    }
    if let Ok(topic) = answer.parse::<Topic>() {
        return Some(topic);
    }
    let lowered = answer.to_lowercase();
    Topic::ALL.into_iter().find(|topic| topic.label() == lowered)
}
