use chrono::{ DateTime, Utc };
use serde::{ Serialize, Deserialize };
use std::fmt;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::System => "system",
            Role::User => "user",
            Role::Assistant => "assistant",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
}

impl ChatMessage {
    pub fn new(role: Role, content: impl Into<String>) -> Self {
        Self { role, content: content.into() }
    }

    pub fn system(content: impl Into<String>) -> Self {
        Self::new(Role::System, content)
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self::new(Role::User, content)
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self::new(Role::Assistant, content)
    }
}

/// A persisted transcript. `embedding` is empty until the embedding job has
/// run and `evaluation` is `None` until the evaluation job has run.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Conversation {
    pub id: String,
    pub messages: Vec<ChatMessage>,
    pub timestamp: DateTime<Utc>,
    #[serde(default)]
    pub embedding: Vec<f32>,
    pub is_student_response: bool,
    #[serde(default)]
    pub evaluation: Option<String>,
}

impl Conversation {
    pub fn needs_evaluation(&self) -> bool {
        self.evaluation.as_deref().map_or(true, |e| e.is_empty())
    }

    pub fn needs_embedding(&self) -> bool {
        self.embedding.is_empty()
    }

    /// First message content, used as the label of a plotted point.
    pub fn preview(&self) -> &str {
        self.messages.first().map(|m| m.content.as_str()).unwrap_or("")
    }
}

#[derive(Clone, Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewConversation {
    pub messages: Vec<ChatMessage>,
    #[serde(default)]
    pub is_student_response: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn role_uses_lowercase_wire_names() {
        let msg: ChatMessage = serde_json::from_str(r#"{"role":"assistant","content":"hi"}"#).unwrap();
        assert_eq!(msg.role, Role::Assistant);
        assert_eq!(serde_json::to_value(Role::System).unwrap(), "system");
    }

    #[test]
    fn unknown_role_is_rejected() {
        assert!(serde_json::from_str::<ChatMessage>(r#"{"role":"tool","content":"x"}"#).is_err());
    }

    #[test]
    fn conversation_pending_flags() {
        let mut conv = Conversation {
            id: "a".into(),
            messages: vec![ChatMessage::user("photosynthesis is...")],
            timestamp: Utc::now(),
            embedding: Vec::new(),
            is_student_response: true,
            evaluation: None,
        };
        assert!(conv.needs_embedding());
        assert!(conv.needs_evaluation());
        assert_eq!(conv.preview(), "photosynthesis is...");

        conv.evaluation = Some(String::new());
        assert!(conv.needs_evaluation());
        conv.evaluation = Some("Pass".into());
        conv.embedding = vec![0.1, 0.2];
        assert!(!conv.needs_evaluation());
        assert!(!conv.needs_embedding());
    }

    #[test]
    fn conversation_serializes_camel_case() {
        let conv = Conversation {
            id: "a".into(),
            messages: Vec::new(),
            timestamp: Utc::now(),
            embedding: Vec::new(),
            is_student_response: false,
            evaluation: None,
        };
        let json = serde_json::to_value(&conv).unwrap();
        assert_eq!(json["isStudentResponse"], false);
        assert!(json["evaluation"].is_null());
        assert_eq!(conv.preview(), "");
    }
}
