//! Round-robin tournament orchestration
//!
//! Every ordered pair of distinct models plays once per round. Each pairing
//! is replayed until one attempt finishes as a win or draw:
//!
//! - model mistakes (blank, syntax, range, occupied) retry immediately and
//!   never touch the retry budget;
//! - API failures and crashed matches count against the budget, back off
//!   exponentially, and pause for the operator when the budget runs out.
//!
//! Every attempt is persisted before the retry decision is made.

use chrono::{DateTime, Utc};
use futures::FutureExt;
use serde::{Deserialize, Serialize};
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use thiserror::Error;
use tictactoe_core::Player;
use tracing::{error, info, warn};

use crate::backoff::RetryPolicy;
use crate::gate::{GateError, OperatorGate, PauseContext};
use crate::match_runner::MatchRunner;
use crate::records::{new_match_id, InvalidMoveRecord, InvalidReason, MatchResult, Outcome};
use crate::stats::{aggregate, TournamentStats};
use crate::storage::{ResultStore, StoreError};

/// Fatal orchestration errors. Model and API failures are retried, never
/// surfaced here.
#[derive(Error, Debug)]
pub enum TournamentError {
    #[error("failed to persist tournament data: {0}")]
    Store(#[from] StoreError),

    #[error("retry budget exhausted for {model_a} vs {model_b} and no operator acknowledged: {source}")]
    OperatorUnavailable {
        model_a: String,
        model_b: String,
        #[source]
        source: GateError,
    },
}

/// One scheduled game: `model_a` plays X, `model_b` plays O.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Matchup {
    pub round: u32,
    pub model_a: String,
    pub model_b: String,
}

/// All ordered pairs of distinct models, repeated for each round.
pub fn schedule(models: &[String], rounds: u32) -> Vec<Matchup> {
    let mut matchups = Vec::with_capacity(models.len() * models.len().saturating_sub(1) * rounds as usize);
    for round in 1..=rounds {
        for (i, a) in models.iter().enumerate() {
            for (j, b) in models.iter().enumerate() {
                if i != j {
                    matchups.push(Matchup {
                        round,
                        model_a: a.clone(),
                        model_b: b.clone(),
                    });
                }
            }
        }
    }
    matchups
}

/// Tournament-wide settings.
#[derive(Debug, Clone)]
pub struct TournamentSettings {
    pub models: Vec<String>,
    pub rounds: u32,
    pub retry: RetryPolicy,
}

/// What a finished tournament run did.
#[derive(Debug, Clone)]
pub struct TournamentSummary {
    pub scheduled: usize,
    /// Attempts of any kind, including retries
    pub attempts: u32,
    pub model_errors: u32,
    pub system_errors: u32,
    pub operator_pauses: u32,
    /// Aggregate over the whole outcome log, earlier runs included
    pub stats: TournamentStats,
}

/// Runs a tournament end to end.
pub struct Tournament {
    settings: TournamentSettings,
    runner: MatchRunner,
    store: Arc<dyn ResultStore>,
    gate: Arc<dyn OperatorGate>,
}

impl Tournament {
    pub fn new(
        settings: TournamentSettings,
        runner: MatchRunner,
        store: Arc<dyn ResultStore>,
        gate: Arc<dyn OperatorGate>,
    ) -> Self {
        Self {
            settings,
            runner,
            store,
            gate,
        }
    }

    pub fn store(&self) -> &dyn ResultStore {
        self.store.as_ref()
    }

    /// Play the whole schedule, then recompute statistics from the log.
    pub async fn run(&self) -> Result<TournamentSummary, TournamentError> {
        let matchups = schedule(&self.settings.models, self.settings.rounds);
        let mut summary = TournamentSummary {
            scheduled: matchups.len(),
            attempts: 0,
            model_errors: 0,
            system_errors: 0,
            operator_pauses: 0,
            stats: aggregate(&self.settings.models, &[]),
        };

        info!(
            models = self.settings.models.len(),
            rounds = self.settings.rounds,
            matches = matchups.len(),
            "tournament started"
        );

        for (index, matchup) in matchups.iter().enumerate() {
            info!(
                round = matchup.round,
                game = index + 1,
                of = matchups.len(),
                model_a = %matchup.model_a,
                model_b = %matchup.model_b,
                "starting matchup"
            );
            self.play_until_accepted(matchup, &mut summary).await?;
        }

        summary.stats = self.recompute_statistics().await?;
        info!(
            attempts = summary.attempts,
            model_errors = summary.model_errors,
            system_errors = summary.system_errors,
            "tournament finished"
        );
        Ok(summary)
    }

    /// Fold the full outcome log and overwrite the statistics artifact.
    pub async fn recompute_statistics(&self) -> Result<TournamentStats, TournamentError> {
        let outcomes = self.store.load_outcomes().await?;
        let stats = aggregate(&self.settings.models, &outcomes);
        self.store.persist_statistics(&stats).await?;
        Ok(stats)
    }

    async fn play_until_accepted(
        &self,
        matchup: &Matchup,
        summary: &mut TournamentSummary,
    ) -> Result<MatchResult, TournamentError> {
        let mut failures = 0u32;
        let mut attempt = 0u32;

        loop {
            attempt += 1;
            summary.attempts += 1;

            let result = self.attempt_match(matchup).await;
            self.persist(&result).await?;

            let reason = match (result.outcome, result.invalid_reason) {
                (Outcome::Invalid, reason) => reason.unwrap_or(InvalidReason::ApiError),
                _ => {
                    info!(
                        match_id = %result.match_id,
                        attempt,
                        outcome = ?result.outcome,
                        winner = result.winner.as_deref().unwrap_or("-"),
                        "match accepted"
                    );
                    return Ok(result);
                }
            };

            if reason.is_model_error() {
                summary.model_errors += 1;
                warn!(
                    match_id = %result.match_id,
                    model_a = %matchup.model_a,
                    model_b = %matchup.model_b,
                    attempt,
                    %reason,
                    "invalid move, replaying immediately"
                );
                continue;
            }

            summary.system_errors += 1;
            failures += 1;
            let last_error = last_error_detail(&result);
            warn!(
                match_id = %result.match_id,
                model_a = %matchup.model_a,
                model_b = %matchup.model_b,
                attempt,
                retry = failures,
                max_retries = self.settings.retry.max_retries,
                error = %last_error,
                "system failure"
            );

            if self.settings.retry.exhausted(failures) {
                let context = PauseContext {
                    model_a: matchup.model_a.clone(),
                    model_b: matchup.model_b.clone(),
                    round: matchup.round,
                    failures,
                    last_error,
                };
                summary.operator_pauses += 1;
                if let Err(source) = self.gate.wait_for_acknowledgement(&context).await {
                    error!(model_a = %matchup.model_a, model_b = %matchup.model_b, error = %source, "no operator acknowledgement, stopping tournament");
                    return Err(TournamentError::OperatorUnavailable {
                        model_a: matchup.model_a.clone(),
                        model_b: matchup.model_b.clone(),
                        source,
                    });
                }
                info!(model_a = %matchup.model_a, model_b = %matchup.model_b, "operator acknowledged, resetting retry budget");
                failures = 0;
            } else {
                let delay = self.settings.retry.delay_for(failures);
                info!(delay_ms = delay.as_millis() as u64, "backing off before retry");
                tokio::time::sleep(delay).await;
            }
        }
    }

    /// Run one match, turning a panic inside the runner into an api_error
    /// record so the attempt is still persisted.
    async fn attempt_match(&self, matchup: &Matchup) -> MatchResult {
        let started_at = Utc::now();
        let play = self.runner.play(&matchup.model_a, &matchup.model_b);
        match AssertUnwindSafe(play).catch_unwind().await {
            Ok(result) => result,
            Err(panic) => {
                let detail = panic_message(panic.as_ref());
                error!(model_a = %matchup.model_a, model_b = %matchup.model_b, error = %detail, "match runner crashed");
                crashed_match(matchup, started_at, detail)
            }
        }
    }

    async fn persist(&self, result: &MatchResult) -> Result<(), TournamentError> {
        self.store.persist_match(result).await?;
        self.store.append_outcome(&result.to_outcome()).await?;
        Ok(())
    }
}

fn last_error_detail(result: &MatchResult) -> String {
    result
        .invalid_moves
        .last()
        .map(|m| m.detail.clone())
        .unwrap_or_else(|| "unknown failure".to_string())
}

fn panic_message(panic: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = panic.downcast_ref::<&str>() {
        format!("match runner panicked: {s}")
    } else if let Some(s) = panic.downcast_ref::<String>() {
        format!("match runner panicked: {s}")
    } else {
        "match runner panicked".to_string()
    }
}

/// Record for an attempt that never produced its own.
fn crashed_match(matchup: &Matchup, started_at: DateTime<Utc>, detail: String) -> MatchResult {
    MatchResult {
        match_id: new_match_id(&matchup.model_a, &matchup.model_b),
        model_a: matchup.model_a.clone(),
        model_b: matchup.model_b.clone(),
        outcome: Outcome::Invalid,
        winner: None,
        invalid_reason: Some(InvalidReason::ApiError),
        moves: Vec::new(),
        conversations: Vec::new(),
        invalid_moves: vec![InvalidMoveRecord {
            model: matchup.model_a.clone(),
            player: Player::X,
            reason: InvalidReason::ApiError,
            detail,
            move_number: 0,
        }],
        duration_ms: (Utc::now() - started_at).num_milliseconds().max(0) as u64,
        started_at,
    }
}

#[cfg(test)]
#[path = "tournament_tests.rs"]
mod tournament_tests;
