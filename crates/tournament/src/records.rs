//! Persisted match records and the outcome log entries derived from them

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicI64, Ordering};
use tictactoe_core::{MoveRecord, Player};

use crate::client::ChatMessage;

/// Why a turn (and therefore the match) was declared invalid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InvalidReason {
    Blank,
    InvalidSyntax,
    OutsideBoard,
    NegativeCoordinates,
    OccupiedCell,
    ApiError,
}

impl InvalidReason {
    /// True for mistakes in the model's text, false for transport/system
    /// failures.
    pub fn is_model_error(self) -> bool {
        !matches!(self, InvalidReason::ApiError)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            InvalidReason::Blank => "blank",
            InvalidReason::InvalidSyntax => "invalid_syntax",
            InvalidReason::OutsideBoard => "outside_board",
            InvalidReason::NegativeCoordinates => "negative_coordinates",
            InvalidReason::OccupiedCell => "occupied_cell",
            InvalidReason::ApiError => "api_error",
        }
    }
}

impl std::fmt::Display for InvalidReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Terminal classification of a match.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Outcome {
    PlayerAWins,
    PlayerBWins,
    Draw,
    Invalid,
}

/// Audit trail of one turn attempt: exactly what was sent and received.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Conversation {
    pub model: String,
    pub player: Player,
    pub messages: Vec<ChatMessage>,
    /// Raw reply, absent when the transport failed
    pub response: Option<String>,
    pub error: Option<String>,
    pub timestamp: DateTime<Utc>,
}

/// Diagnostic for a rejected move.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InvalidMoveRecord {
    pub model: String,
    pub player: Player,
    pub reason: InvalidReason,
    pub detail: String,
    /// 1-based number of the move that was attempted
    pub move_number: usize,
}

/// Full record of one match attempt, persisted verbatim.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MatchResult {
    pub match_id: String,
    /// Model playing X (moves first)
    pub model_a: String,
    /// Model playing O
    pub model_b: String,
    pub outcome: Outcome,
    pub winner: Option<String>,
    pub invalid_reason: Option<InvalidReason>,
    pub moves: Vec<MoveRecord>,
    pub conversations: Vec<Conversation>,
    pub invalid_moves: Vec<InvalidMoveRecord>,
    pub duration_ms: u64,
    pub started_at: DateTime<Utc>,
}

impl MatchResult {
    pub fn is_valid(&self) -> bool {
        self.outcome != Outcome::Invalid
    }

    /// Slim projection appended to the tournament outcome log.
    pub fn to_outcome(&self) -> MatchOutcome {
        MatchOutcome {
            match_id: self.match_id.clone(),
            model_a: self.model_a.clone(),
            model_b: self.model_b.clone(),
            outcome: self.outcome,
            winner: self.winner.clone(),
            invalid_reason: self.invalid_reason,
            record: self.match_id.clone(),
            timestamp: self.started_at,
        }
    }
}

/// One entry of the append-only outcome log.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchOutcome {
    pub match_id: String,
    pub model_a: String,
    pub model_b: String,
    pub outcome: Outcome,
    pub winner: Option<String>,
    #[serde(default)]
    pub invalid_reason: Option<InvalidReason>,
    /// Key of the full match record in the store
    pub record: String,
    pub timestamp: DateTime<Utc>,
}

static LAST_ID_MILLIS: AtomicI64 = AtomicI64::new(0);

/// Milliseconds since the epoch, strictly increasing across calls in this
/// process.
fn unique_epoch_millis() -> i64 {
    let now = Utc::now().timestamp_millis();
    let mut last = LAST_ID_MILLIS.load(Ordering::Relaxed);
    loop {
        let next = now.max(last + 1);
        match LAST_ID_MILLIS.compare_exchange_weak(last, next, Ordering::SeqCst, Ordering::Relaxed)
        {
            Ok(_) => return next,
            Err(current) => last = current,
        }
    }
}

/// `<model_a>-vs-<model_b>-<epoch-millis>`, unique for every call.
pub fn new_match_id(model_a: &str, model_b: &str) -> String {
    format!("{}-vs-{}-{}", model_a, model_b, unique_epoch_millis())
}
