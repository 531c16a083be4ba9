//! Handbook assistant conversation state.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::session::new_session_id;

/// Speaker of a chat turn
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatRole {
    System,
    User,
    Assistant,
}

impl ChatRole {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::System => "system",
            Self::User => "user",
            Self::Assistant => "assistant",
        }
    }
}

/// One message of a conversation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatTurn {
    pub role: ChatRole,
    pub content: String,
}

impl ChatTurn {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::Assistant,
            content: content.into(),
        }
    }
}

/// Conversation with the handbook assistant
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatSession {
    pub id: String,
    /// Lowest-rated chapters at chat start, used to personalize answers
    pub focus_chapters: Vec<String>,
    pub history: Vec<ChatTurn>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl ChatSession {
    pub fn new(focus_chapters: Vec<String>) -> Self {
        let now = Utc::now();
        Self {
            id: new_session_id(),
            focus_chapters,
            history: Vec::new(),
            created_at: now,
            updated_at: now,
        }
    }

    pub fn push(&mut self, turn: ChatTurn) {
        self.history.push(turn);
        self.updated_at = Utc::now();
    }

    /// The last `limit` turns, oldest first
    pub fn recent(&self, limit: usize) -> &[ChatTurn] {
        let start = self.history.len().saturating_sub(limit);
        &self.history[start..]
    }
}

/// A piece of the handbook stored in the vector index
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HandbookChunk {
    pub id: usize,
    pub text: String,
}

/// A chunk returned by similarity search
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoredChunk {
    pub chunk: HandbookChunk,
    pub score: f32,
}
