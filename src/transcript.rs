//! Conversation history: messages and the append-only transcript log.
//!
//! The log is ordered strictly by append. The only in-place change it allows
//! is the system entry at index 0, which belongs to
//! [`crate::pipeline::inject`] and is refreshed before every send.

use crate::error::ChatPdfError;
use serde::{de, Deserialize, Deserializer, Serialize};
use std::fmt;

/// Who authored a message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Role::System => "system",
            Role::User => "user",
            Role::Assistant => "assistant",
        })
    }
}

/// One conversation turn. Immutable once created.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    role: Role,
    content: String,
}

impl Message {
    pub fn new(role: Role, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
        }
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

    pub fn role(&self) -> Role {
        self.role
    }

    pub fn content(&self) -> &str {
        &self.content
    }
}

/// Ordered record of user, assistant and system turns.
///
/// Deserialising enforces the same shape `append` does: at most one system
/// entry, and only at index 0.
#[derive(Debug, Clone, Default, Serialize)]
pub struct TranscriptLog {
    messages: Vec<Message>,
}

impl TranscriptLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a user or assistant message.
    ///
    /// System messages are rejected: the single system entry is inserted and
    /// refreshed by [`crate::pipeline::inject::prepare_transcript`].
    pub fn append(&mut self, message: Message) -> Result<(), ChatPdfError> {
        if message.role == Role::System {
            return Err(ChatPdfError::SystemMessageAppend);
        }
        self.messages.push(message);
        Ok(())
    }

    /// Messages in stored order, for display.
    pub fn render(&self) -> &[Message] {
        &self.messages
    }

    /// The system entry, if one has been injected.
    pub fn system(&self) -> Option<&Message> {
        self.messages.first().filter(|m| m.role == Role::System)
    }

    /// Messages after the system entry.
    pub fn turns(&self) -> &[Message] {
        let skip = usize::from(self.system().is_some());
        &self.messages[skip..]
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    /// Insert or replace the system entry at index 0.
    pub(crate) fn set_system(&mut self, content: &str) {
        match self.messages.first_mut() {
            Some(first) if first.role == Role::System => {
                if first.content != content {
                    first.content = content.to_string();
                }
            }
            _ => self.messages.insert(0, Message::system(content)),
        }
    }
}

impl<'de> Deserialize<'de> for TranscriptLog {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        struct Raw {
            messages: Vec<Message>,
        }

        let Raw { messages } = Raw::deserialize(deserializer)?;
        if let Some(pos) = messages
            .iter()
            .skip(1)
            .position(|m| m.role == Role::System)
        {
            return Err(de::Error::custom(format!(
                "system message at index {}; only index 0 may hold one",
                pos + 1
            )));
        }
        Ok(Self { messages })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn append_preserves_call_order() {
        let mut log = TranscriptLog::new();
        log.append(Message::user("first")).unwrap();
        log.append(Message::assistant("second")).unwrap();
        log.append(Message::user("third")).unwrap();

        let contents: Vec<&str> = log.render().iter().map(Message::content).collect();
        assert_eq!(contents, vec!["first", "second", "third"]);
    }

    #[test]
    fn system_append_is_rejected() {
        let mut log = TranscriptLog::new();
        let err = log.append(Message::system("ctx")).unwrap_err();
        assert!(matches!(err, ChatPdfError::SystemMessageAppend));
        assert!(log.is_empty());
    }

    #[test]
    fn turns_skip_system_entry() {
        let mut log = TranscriptLog::new();
        log.append(Message::user("q")).unwrap();
        log.set_system("ctx");
        assert_eq!(log.len(), 2);
        assert_eq!(log.system().map(Message::content), Some("ctx"));
        assert_eq!(log.turns(), &[Message::user("q")]);
    }

    #[test]
    fn role_serialises_lowercase() {
        let json = serde_json::to_string(&Message::assistant("hi")).unwrap();
        assert_eq!(json, r#"{"role":"assistant","content":"hi"}"#);
    }

    #[test]
    fn saved_log_loads_back() {
        let mut log = TranscriptLog::new();
        log.append(Message::user("q")).unwrap();
        log.append(Message::assistant("a")).unwrap();
        log.set_system("ctx");

        let json = serde_json::to_string(&log).unwrap();
        let loaded: TranscriptLog = serde_json::from_str(&json).unwrap();
        assert_eq!(loaded.render(), log.render());
    }

    #[test]
    fn misplaced_system_entry_is_refused_on_load() {
        let json = r#"{"messages":[
            {"role":"user","content":"q"},
            {"role":"system","content":"sneaked in"}
        ]}"#;
        let err = serde_json::from_str::<TranscriptLog>(json).unwrap_err();
        assert!(err.to_string().contains("index 1"), "got: {err}");

        let two_systems = r#"{"messages":[
            {"role":"system","content":"a"},
            {"role":"system","content":"b"}
        ]}"#;
        assert!(serde_json::from_str::<TranscriptLog>(two_systems).is_err());
    }
}
