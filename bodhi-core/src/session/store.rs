//! Session data structures

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Number of seed turns every session starts with
pub const SEED_TURNS: usize = 2;

/// Who produced a turn
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

/// The fixed instruction/acknowledgment pair that opens every session
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Persona {
    pub instruction: String,
    pub acknowledgment: String,
}

impl Persona {
    pub fn new(instruction: impl Into<String>, acknowledgment: impl Into<String>) -> Self {
        Self {
            instruction: instruction.into(),
            acknowledgment: acknowledgment.into(),
        }
    }
}

/// A conversation session
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Session {
    /// Session key (client-supplied session id)
    pub key: String,
    /// Turns in the session, seed pair first
    messages: Vec<ChatMessage>,
    /// Session creation time
    pub created_at: DateTime<Utc>,
    /// Last update time
    pub updated_at: DateTime<Utc>,
}

impl Session {
    /// Create a new session seeded with the persona pair
    pub fn new(key: impl Into<String>, persona: &Persona) -> Self {
        let now = Utc::now();
        Self {
            key: key.into(),
            messages: vec![
                ChatMessage::new(Role::User, persona.instruction.clone()),
                ChatMessage::new(Role::Assistant, persona.acknowledgment.clone()),
            ],
            created_at: now,
            updated_at: now,
        }
    }

    /// Append one completed exchange
    pub fn add_exchange(&mut self, user: impl Into<String>, assistant: impl Into<String>) {
        self.messages.push(ChatMessage::new(Role::User, user));
        self.messages.push(ChatMessage::new(Role::Assistant, assistant));
        self.updated_at = Utc::now();
    }

    /// Full history for LLM context, seed pair included
    pub fn history(&self) -> &[ChatMessage] {
        &self.messages
    }

    /// Number of turns after the seed pair
    pub fn exchange_turns(&self) -> usize {
        self.messages.len() - SEED_TURNS
    }
}

/// A chat message
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatMessage {
    /// Message role
    pub role: Role,
    /// Message content
    pub content: String,
    /// Message timestamp
    pub timestamp: DateTime<Utc>,
}

impl ChatMessage {
    /// Create a new chat message
    pub fn new(role: Role, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
            timestamp: Utc::now(),
        }
    }
}
