//! Move request protocol: prompt, call, classify

use chrono::Utc;
use std::sync::Arc;
use std::time::Duration;
use tictactoe_core::{Game, Move};
use tracing::{debug, warn};

use crate::client::{CompletionClient, CompletionRequest, PromptMode, TransportError};
use crate::parser::{last_non_blank_line, parse_move};
use crate::prompt::build_messages;
use crate::records::{Conversation, InvalidReason};

/// Per-call settings shared by every move request.
#[derive(Debug, Clone)]
pub struct MoveSettings {
    /// Budget for a single model reply
    pub timeout: Duration,
    pub max_tokens: u32,
    pub mode: PromptMode,
    pub reasoning_effort: Option<String>,
}

impl Default for MoveSettings {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(60),
            max_tokens: 1024,
            mode: PromptMode::Verbose,
            reasoning_effort: None,
        }
    }
}

/// What a single turn attempt produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TurnDecision {
    /// Well-formed, in-range coordinates. Occupancy is still unchecked.
    Move(Move),
    /// The model answered, but not with a usable move.
    Invalid { reason: InvalidReason, detail: String },
    /// The model never answered (timeout, HTTP or network failure).
    Transport(String),
}

/// A turn attempt together with its transcript.
#[derive(Debug, Clone)]
pub struct TurnAttempt {
    pub decision: TurnDecision,
    pub conversation: Conversation,
}

/// Asks models for moves through a [`CompletionClient`].
pub struct MoveProtocol {
    client: Arc<dyn CompletionClient>,
    settings: MoveSettings,
}

impl MoveProtocol {
    pub fn new(client: Arc<dyn CompletionClient>, settings: MoveSettings) -> Self {
        Self { client, settings }
    }

    pub fn settings(&self) -> &MoveSettings {
        &self.settings
    }

    /// Request a move from `model` for the side to move in `game`.
    pub async fn request_move(&self, model: &str, game: &Game) -> TurnAttempt {
        let player = game.current_player();
        let request = CompletionRequest {
            model: model.to_string(),
            messages: build_messages(game, self.settings.mode),
            max_tokens: self.settings.max_tokens,
            mode: self.settings.mode,
            reasoning_effort: self.settings.reasoning_effort.clone(),
            timeout: self.settings.timeout,
        };
        let timestamp = Utc::now();

        let reply = match tokio::time::timeout(self.settings.timeout, self.client.complete(&request)).await {
            Ok(result) => result,
            Err(_) => Err(TransportError::Timeout(self.settings.timeout)),
        };

        let (decision, response, error) = match reply {
            Ok(text) => {
                let decision = classify_reply(&text);
                let error = match &decision {
                    TurnDecision::Invalid { reason, detail } => Some(format!("{reason}: {detail}")),
                    _ => None,
                };
                (decision, Some(text), error)
            }
            Err(e) => {
                warn!(model, %player, error = %e, "completion request failed");
                let detail = e.to_string();
                (TurnDecision::Transport(detail.clone()), None, Some(detail))
            }
        };

        debug!(model, %player, ?decision, "turn attempt classified");

        TurnAttempt {
            decision,
            conversation: Conversation {
                model: model.to_string(),
                player,
                messages: request.messages,
                response,
                error,
                timestamp,
            },
        }
    }
}

/// Turn a raw reply into a decision, keeping the offending line as detail.
pub fn classify_reply(text: &str) -> TurnDecision {
    match parse_move(text) {
        Ok(mv) => TurnDecision::Move(mv),
        Err(reason) => {
            let detail = match last_non_blank_line(text) {
                Some(line) => line.to_string(),
                None => reason.to_string(),
            };
            TurnDecision::Invalid { reason, detail }
        }
    }
}

#[cfg(test)]
#[path = "protocol_tests.rs"]
mod protocol_tests;
