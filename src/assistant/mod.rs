//! Generative-text assistant used to draft emergency messages and answer
//! donor questions.
//!
//! The backend is an opaque [`TextGenerator`]. Every failure degrades to a
//! fixed fallback string, so callers always get something to show and the
//! repository is never involved.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use thiserror::Error;
use tracing::{debug, instrument, warn};

use crate::domain::{BloodGroup, Urgency};

pub const MESSAGE_MISSING_KEY: &str = "API Key missing. Cannot generate message.";
pub const MESSAGE_EMPTY: &str = "Error generating message.";
pub const MESSAGE_FAILED: &str = "Urgent help needed! Please donate blood.";

pub const ANSWER_MISSING_KEY: &str = "API Key missing.";
pub const ANSWER_EMPTY: &str = "I couldn't generate a response.";
pub const ANSWER_FAILED: &str = "Sorry, I'm having trouble connecting to the knowledge base right now.";

#[derive(Debug, Clone, Error, PartialEq)]
pub enum AssistantError {
    #[error("No API key configured")]
    MissingApiKey,
    #[error("Generator did not answer within {0:?}")]
    Timeout(Duration),
    #[error("Generator failed: {0}")]
    Backend(String),
    #[error("Malformed generator response: {0}")]
    MalformedResponse(String),
}

/// "Compose text from prompt" capability.
#[async_trait]
pub trait TextGenerator: Send + Sync {
    async fn generate(&self, prompt: &str) -> Result<String, AssistantError>;
}

/// Generator used when no backend is configured.
#[derive(Debug, Clone, Copy, Default)]
pub struct UnconfiguredGenerator;

#[async_trait]
impl TextGenerator for UnconfiguredGenerator {
    async fn generate(&self, _prompt: &str) -> Result<String, AssistantError> {
        Err(AssistantError::MissingApiKey)
    }
}

#[derive(Debug, Deserialize)]
struct EmergencyMessage {
    title: Option<String>,
    description: Option<String>,
}

#[derive(Clone)]
pub struct Assistant {
    generator: Arc<dyn TextGenerator>,
    timeout: Duration,
}

impl Assistant {
    pub fn new(generator: Arc<dyn TextGenerator>, timeout: Duration) -> Self {
        Self { generator, timeout }
    }

    async fn generate(&self, prompt: &str) -> Result<String, AssistantError> {
        match tokio::time::timeout(self.timeout, self.generator.generate(prompt)).await {
            Ok(result) => result,
            Err(_) => Err(AssistantError::Timeout(self.timeout)),
        }
    }

    /// Drafts the description shown with a new request.
    #[instrument(skip(self))]
    pub async fn compose_emergency_message(
        &self,
        blood_group: BloodGroup,
        hospital: &str,
        urgency: Urgency,
        units: u32,
    ) -> String {
        let prompt = emergency_prompt(blood_group, hospital, urgency, units);
        let outcome = self.generate(&prompt).await.and_then(|text| parse_emergency_message(&text));

        match outcome {
            Ok(Some(message)) => {
                debug!(chars = message.len(), "Emergency message composed");
                message
            }
            Ok(None) => {
                warn!("Generator returned no text");
                MESSAGE_EMPTY.to_string()
            }
            Err(AssistantError::MissingApiKey) => MESSAGE_MISSING_KEY.to_string(),
            Err(e) => {
                warn!(error = %e, "Emergency message generation failed");
                MESSAGE_FAILED.to_string()
            }
        }
    }

    /// Answers a free-text question about donating.
    #[instrument(skip(self, question))]
    pub async fn answer_question(&self, question: &str) -> String {
        match self.generate(&question_prompt(question)).await {
            Ok(text) if text.trim().is_empty() => {
                warn!("Generator returned no text");
                ANSWER_EMPTY.to_string()
            }
            Ok(text) => text,
            Err(AssistantError::MissingApiKey) => ANSWER_MISSING_KEY.to_string(),
            Err(e) => {
                warn!(error = %e, "Question answering failed");
                ANSWER_FAILED.to_string()
            }
        }
    }
}

fn emergency_prompt(blood_group: BloodGroup, hospital: &str, urgency: Urgency, units: u32) -> String {
    format!(
        "You coordinate blood donations for a college campus app.\n\
         Write a short push notification title (at most 140 characters) and a \
         description (at most 300 characters) asking students to donate.\n\n\
         Blood group: {blood_group}\n\
         Hospital: {hospital}\n\
         Urgency: {urgency}\n\
         Units needed: {units}\n\n\
         Reply with a JSON object with the keys \"title\" and \"description\"."
    )
}

fn question_prompt(question: &str) -> String {
    format!(
        "You help students using Campus Blood Connect, a blood donation app.\n\
         Answer briefly and accurately. Questions are about eligibility, the \
         donation process or health advice. Keep the tone encouraging.\n\n\
         Question: \"{question}\""
    )
}

/// `description`, else `title`. Blank text is `Ok(None)`.
fn parse_emergency_message(text: &str) -> Result<Option<String>, AssistantError> {
    if text.trim().is_empty() {
        return Ok(None);
    }
    let message: EmergencyMessage =
        serde_json::from_str(text).map_err(|e| AssistantError::MalformedResponse(e.to_string()))?;

    message
        .description
        .filter(|description| !description.trim().is_empty())
        .or(message.title.filter(|title| !title.trim().is_empty()))
        .map(Some)
        .ok_or_else(|| AssistantError::MalformedResponse("no title or description".to_string()))
}
