//! UI-agnostic conversation types
//!
//! This module contains the message model shared by the conversation state
//! machine, the chat gateway and whichever front end renders the stream.

use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};

/// The role of a chat message sender
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Model,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Model => "model",
        }
    }
}

/// A citation returned alongside a model answer
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Source {
    pub title: String,
    pub uri: String,
}

/// What a message carries: either a finished text or the transient typing marker
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum MessageBody {
    Typing,
    Text { text: String, sources: Vec<Source> },
}

/// A chat message in the conversation stream
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub id: String,
    pub role: Role,
    pub timestamp: DateTime<Local>,
    pub body: MessageBody,
}

impl Message {
    pub fn user(id: impl Into<String>, text: impl Into<String>) -> Self {
        Self::text(id, Role::User, text, Vec::new())
    }

    pub fn model(id: impl Into<String>, text: impl Into<String>, sources: Vec<Source>) -> Self {
        Self::text(id, Role::Model, text, sources)
    }

    pub fn typing(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            role: Role::Model,
            timestamp: Local::now(),
            body: MessageBody::Typing,
        }
    }

    fn text(id: impl Into<String>, role: Role, text: impl Into<String>, sources: Vec<Source>) -> Self {
        Self {
            id: id.into(),
            role,
            timestamp: Local::now(),
            body: MessageBody::Text {
                text: text.into(),
                sources,
            },
        }
    }

    pub fn is_typing(&self) -> bool {
        matches!(self.body, MessageBody::Typing)
    }

    /// Message text; empty for the typing placeholder.
    pub fn text_content(&self) -> &str {
        match &self.body {
            MessageBody::Typing => "",
            MessageBody::Text { text, .. } => text,
        }
    }

    pub fn sources(&self) -> &[Source] {
        match &self.body {
            MessageBody::Typing => &[],
            MessageBody::Text { sources, .. } => sources,
        }
    }
}

/// One prior turn as sent to the chat gateway
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryTurn {
    pub role: Role,
    pub text: String,
}
