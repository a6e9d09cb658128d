//! Completion API boundary
//!
//! The tournament never talks to the network directly. Every model decision
//! goes through a [`CompletionClient`], which turns a list of chat messages
//! into the model's raw text reply or a [`TransportError`].

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;

/// Chat role of a prompt message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

/// One message of a chat prompt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: Role::System,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }
}

/// How much instruction the model gets.
///
/// `Verbose` explains the rules and lets the model think out loud before its
/// final answer line. `Minimal` is for reasoning models that think
/// internally and only need to emit the coordinates.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PromptMode {
    #[default]
    Verbose,
    Minimal,
}

/// A single completion call.
#[derive(Debug, Clone)]
pub struct CompletionRequest {
    pub model: String,
    pub messages: Vec<ChatMessage>,
    pub max_tokens: u32,
    pub mode: PromptMode,
    /// Optional reasoning-effort hint ("low", "medium", "high")
    pub reasoning_effort: Option<String>,
    /// Budget for this call; the caller abandons it after this long
    pub timeout: Duration,
}

/// A failed completion call. Never a model mistake: the model did not get to
/// answer.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TransportError {
    #[error("request timed out after {0:?}")]
    Timeout(Duration),

    #[error("API returned status {status}: {body}")]
    Status { status: u16, body: String },

    #[error("network error: {0}")]
    Network(String),

    #[error("malformed API response: {0}")]
    MalformedResponse(String),
}

/// Anything that can answer a chat prompt on behalf of a model.
#[async_trait]
pub trait CompletionClient: Send + Sync {
    /// Return the model's raw text reply.
    async fn complete(&self, request: &CompletionRequest) -> Result<String, TransportError>;
}
