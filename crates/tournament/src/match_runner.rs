//! Match runner for playing one game between two models

use chrono::Utc;
use std::time::Instant;
use tictactoe_core::{Game, InvalidCell, Player, Terminal};
use tracing::{debug, info, warn};

use crate::protocol::{MoveProtocol, TurnDecision};
use crate::records::{
    new_match_id, Conversation, InvalidMoveRecord, InvalidReason, MatchResult, Outcome,
};

/// Plays single games, model A as X and model B as O.
pub struct MatchRunner {
    protocol: MoveProtocol,
}

/// Mutable state of a match in progress.
struct MatchState {
    game: Game,
    conversations: Vec<Conversation>,
    invalid_moves: Vec<InvalidMoveRecord>,
    invalid_reason: Option<InvalidReason>,
}

impl MatchState {
    fn reject(&mut self, model: &str, player: Player, reason: InvalidReason, detail: String) {
        self.invalid_moves.push(InvalidMoveRecord {
            model: model.to_string(),
            player,
            reason,
            detail,
            move_number: self.game.moves().len() + 1,
        });
        self.invalid_reason = Some(reason);
    }
}

impl MatchRunner {
    pub fn new(protocol: MoveProtocol) -> Self {
        Self { protocol }
    }

    /// Play one game to completion, or until the first invalid turn.
    ///
    /// Always returns a full record: a transport failure or a bad move ends
    /// the match as `Outcome::Invalid` with the transcript so far.
    pub async fn play(&self, model_a: &str, model_b: &str) -> MatchResult {
        let match_id = new_match_id(model_a, model_b);
        let started_at = Utc::now();
        let clock = Instant::now();

        info!(%match_id, model_a, model_b, "match started");

        let mut state = MatchState {
            game: Game::new(),
            conversations: Vec::new(),
            invalid_moves: Vec::new(),
            invalid_reason: None,
        };

        while !state.game.is_over() {
            let player = state.game.current_player();
            let model = match player {
                Player::X => model_a,
                Player::O => model_b,
            };

            let attempt = self.protocol.request_move(model, &state.game).await;
            state.conversations.push(attempt.conversation);

            match attempt.decision {
                TurnDecision::Transport(detail) => {
                    warn!(%match_id, model, error = %detail, "api error, abandoning match");
                    state.reject(model, player, InvalidReason::ApiError, detail);
                    break;
                }
                TurnDecision::Invalid { reason, detail } => {
                    warn!(%match_id, model, %reason, %detail, "invalid move");
                    state.reject(model, player, reason, detail);
                    break;
                }
                TurnDecision::Move(mv) => match state.game.apply_move(mv.row, mv.col) {
                    Ok(()) => debug!(%match_id, model, %player, %mv, "move applied"),
                    Err(err) => {
                        let reason = match err {
                            InvalidCell::OutOfRange { .. } => InvalidReason::OutsideBoard,
                            InvalidCell::Occupied { .. } | InvalidCell::GameOver => {
                                InvalidReason::OccupiedCell
                            }
                        };
                        warn!(%match_id, model, %reason, %mv, "move rejected by board");
                        state.reject(model, player, reason, format!("{mv}: {err}"));
                        break;
                    }
                },
            }
        }

        let (outcome, winner) = match (state.invalid_reason, state.game.check_terminal()) {
            (Some(_), _) => (Outcome::Invalid, None),
            (None, Some(Terminal::Win(Player::X))) => (Outcome::PlayerAWins, Some(model_a.to_string())),
            (None, Some(Terminal::Win(Player::O))) => (Outcome::PlayerBWins, Some(model_b.to_string())),
            (None, Some(Terminal::Draw)) => (Outcome::Draw, None),
            // The loop only exits early with an invalid reason set.
            (None, None) => (Outcome::Invalid, None),
        };

        let duration_ms = clock.elapsed().as_millis() as u64;
        info!(
            %match_id,
            ?outcome,
            winner = winner.as_deref().unwrap_or("-"),
            moves = state.game.moves().len(),
            duration_ms,
            "match finished"
        );

        MatchResult {
            match_id,
            model_a: model_a.to_string(),
            model_b: model_b.to_string(),
            outcome,
            winner,
            invalid_reason: state.invalid_reason,
            moves: state.game.into_moves(),
            conversations: state.conversations,
            invalid_moves: state.invalid_moves,
            duration_ms,
            started_at,
        }
    }
}

#[cfg(test)]
#[path = "match_runner_tests.rs"]
mod match_runner_tests;
