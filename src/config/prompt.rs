use serde::Deserialize;
use std::error::Error;
use std::fmt;
use std::fs;
use std::path::Path;
use std::sync::Arc;
use log::{ info, warn };

use crate::models::chat::ChatMessage;

const DEFAULT_TUTOR_PROMPT: &str =
    "You are a curious learner. A student will teach you a concept. \
Act as if you know nothing about the topic, keep replies to one or two sentences, \
and ask questions that make the student define terms, give examples and explain \
how things connect. Do not supply facts yourself.";

const DEFAULT_EVALUATION_PROMPT: &str =
    "You are a teacher assessing how well a student explained a concept to someone \
with no prior knowledge. Consider clarity, audience-appropriate language, logical flow, \
use of examples and handling of misconceptions. Reply with \"Pass\" or \"Fail\" followed \
by a two to three sentence justification.";

pub const NO_EVALUATION: &str = "No evaluation available";

#[derive(Debug)]
pub enum PromptError {
    IoError(std::io::Error),
    JsonError(serde_json::Error),
    EmptyPrompt(&'static str),
}

impl fmt::Display for PromptError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PromptError::IoError(e) => write!(f, "Prompt file IO error: {}", e),
            PromptError::JsonError(e) => write!(f, "Prompt JSON parsing error: {}", e),
            PromptError::EmptyPrompt(key) => write!(f, "Prompt '{}' is empty", key),
        }
    }
}

impl Error for PromptError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            PromptError::IoError(e) => Some(e),
            PromptError::JsonError(e) => Some(e),
            _ => None,
        }
    }
}

impl From<std::io::Error> for PromptError {
    fn from(err: std::io::Error) -> Self {
        PromptError::IoError(err)
    }
}

impl From<serde_json::Error> for PromptError {
    fn from(err: serde_json::Error) -> Self {
        PromptError::JsonError(err)
    }
}

/// System prompts for the tutor persona and the evaluation job.
#[derive(Deserialize, Debug, Clone, PartialEq)]
pub struct PromptConfig {
    #[serde(default = "default_tutor")]
    pub tutor_system: String,
    #[serde(default = "default_evaluation")]
    pub evaluation_system: String,
}

fn default_tutor() -> String {
    DEFAULT_TUTOR_PROMPT.to_string()
}

fn default_evaluation() -> String {
    DEFAULT_EVALUATION_PROMPT.to_string()
}

impl Default for PromptConfig {
    fn default() -> Self {
        Self {
            tutor_system: default_tutor(),
            evaluation_system: default_evaluation(),
        }
    }
}

impl PromptConfig {
    fn validate(&self) -> Result<(), PromptError> {
        if self.tutor_system.trim().is_empty() {
            return Err(PromptError::EmptyPrompt("tutor_system"));
        }
        if self.evaluation_system.trim().is_empty() {
            return Err(PromptError::EmptyPrompt("evaluation_system"));
        }
        Ok(())
    }
}

/// Loads prompts from `path`, falling back to the built-in prompts when the
/// file does not exist.
pub fn load_prompts<P: AsRef<Path>>(path: P) -> Result<Arc<PromptConfig>, PromptError> {
    let path = path.as_ref();
    if !path.exists() {
        warn!("Prompts file '{}' not found, using built-in prompts", path.display());
        return Ok(Arc::new(PromptConfig::default()));
    }
    let file_content = fs::read_to_string(path)?;
    let config: PromptConfig = serde_json::from_str(&file_content)?;
    config.validate()?;
    info!("Loaded prompts from '{}'", path.display());
    Ok(Arc::new(config))
}

/// Tutor system prompt followed by the student's transcript.
pub fn tutor_messages(config: &PromptConfig, transcript: &[ChatMessage]) -> Vec<ChatMessage> {
    let mut messages = Vec::with_capacity(transcript.len() + 1);
    messages.push(ChatMessage::system(config.tutor_system.clone()));
    messages.extend(transcript.iter().cloned());
    messages
}

/// Renders a transcript as `role: content` lines.
pub fn format_transcript(transcript: &[ChatMessage]) -> String {
    transcript
        .iter()
        .map(|msg| format!("{}: {}", msg.role, msg.content))
        .collect::<Vec<_>>()
        .join("\n")
}

pub fn evaluation_messages(config: &PromptConfig, transcript: &[ChatMessage]) -> Vec<ChatMessage> {
    vec![
        ChatMessage::system(config.evaluation_system.clone()),
        ChatMessage::user(format_transcript(transcript))
    ]
}

/// Text sent to the embedding model: message contents separated by spaces.
pub fn embedding_text(transcript: &[ChatMessage]) -> String {
    transcript
        .iter()
        .map(|msg| msg.content.as_str())
        .collect::<Vec<_>>()
        .join(" ")
}
