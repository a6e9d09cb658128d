//! Win-rate statistics folded from the outcome log
//!
//! Statistics are never updated incrementally: they are recomputed from the
//! full outcome log every time, so the log stays the single source of truth.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::records::{MatchOutcome, Outcome};

/// Results of one model against one opponent.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HeadToHead {
    pub wins: u32,
    pub losses: u32,
    pub draws: u32,
    pub invalid: u32,
}

impl HeadToHead {
    pub fn total(&self) -> u32 {
        self.wins + self.losses + self.draws + self.invalid
    }
}

/// Aggregate record of one model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelStats {
    pub model: String,
    pub total: u32,
    pub wins: u32,
    pub losses: u32,
    pub draws: u32,
    pub invalid: u32,
    /// wins / (total - invalid), 0 when no valid games were played
    pub win_rate: f64,
    /// 1-based leaderboard position
    pub rank: u32,
    pub opponents: BTreeMap<String, HeadToHead>,
}

impl ModelStats {
    fn new(model: &str) -> Self {
        Self {
            model: model.to_string(),
            total: 0,
            wins: 0,
            losses: 0,
            draws: 0,
            invalid: 0,
            win_rate: 0.0,
            rank: 0,
            opponents: BTreeMap::new(),
        }
    }

    pub fn valid_games(&self) -> u32 {
        self.total - self.invalid
    }

    fn record(&mut self, opponent: &str, result: SideResult) {
        let h2h = self.opponents.entry(opponent.to_string()).or_default();
        self.total += 1;
        match result {
            SideResult::Win => {
                self.wins += 1;
                h2h.wins += 1;
            }
            SideResult::Loss => {
                self.losses += 1;
                h2h.losses += 1;
            }
            SideResult::Draw => {
                self.draws += 1;
                h2h.draws += 1;
            }
            SideResult::Invalid => {
                self.invalid += 1;
                h2h.invalid += 1;
            }
        }
    }
}

/// Statistics artifact for a whole tournament.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TournamentStats {
    /// Timestamp of the newest outcome folded in
    pub last_outcome_at: Option<DateTime<Utc>>,
    pub total_matches: u32,
    pub valid_matches: u32,
    pub models: BTreeMap<String, ModelStats>,
    /// Model ids in rank order
    pub leaderboard: Vec<String>,
}

impl TournamentStats {
    /// Models in rank order.
    pub fn ranked(&self) -> Vec<&ModelStats> {
        self.leaderboard
            .iter()
            .filter_map(|m| self.models.get(m))
            .collect()
    }
}

#[derive(Debug, Clone, Copy)]
enum SideResult {
    Win,
    Loss,
    Draw,
    Invalid,
}

/// Fold `outcomes` into per-model and head-to-head records.
///
/// `models` seeds zeroed entries so configured models that never completed a
/// match still appear; models found only in the log are added as well.
/// Ranking is by win rate, then wins, both descending. Exact ties keep
/// their seeding order and still get distinct sequential ranks.
pub fn aggregate(models: &[String], outcomes: &[MatchOutcome]) -> TournamentStats {
    let mut order: Vec<String> = Vec::new();
    let mut stats: BTreeMap<String, ModelStats> = BTreeMap::new();

    let mut ensure = |model: &str, stats: &mut BTreeMap<String, ModelStats>| {
        if !stats.contains_key(model) {
            stats.insert(model.to_string(), ModelStats::new(model));
            order.push(model.to_string());
        }
    };

    for model in models {
        ensure(model, &mut stats);
    }

    let mut valid_matches = 0;
    for outcome in outcomes {
        ensure(&outcome.model_a, &mut stats);
        ensure(&outcome.model_b, &mut stats);

        let (a, b) = match outcome.outcome {
            Outcome::PlayerAWins => (SideResult::Win, SideResult::Loss),
            Outcome::PlayerBWins => (SideResult::Loss, SideResult::Win),
            Outcome::Draw => (SideResult::Draw, SideResult::Draw),
            Outcome::Invalid => (SideResult::Invalid, SideResult::Invalid),
        };
        if outcome.outcome != Outcome::Invalid {
            valid_matches += 1;
        }

        if let Some(s) = stats.get_mut(&outcome.model_a) {
            s.record(&outcome.model_b, a);
        }
        if let Some(s) = stats.get_mut(&outcome.model_b) {
            s.record(&outcome.model_a, b);
        }
    }

    for s in stats.values_mut() {
        let valid = s.valid_games();
        s.win_rate = if valid == 0 {
            0.0
        } else {
            s.wins as f64 / valid as f64
        };
    }

    // Stable sort keeps seeding order for exact ties.
    order.sort_by(|x, y| {
        let (x, y) = (&stats[x], &stats[y]);
        y.win_rate
            .partial_cmp(&x.win_rate)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then(y.wins.cmp(&x.wins))
    });
    for (i, model) in order.iter().enumerate() {
        if let Some(s) = stats.get_mut(model) {
            s.rank = i as u32 + 1;
        }
    }

    TournamentStats {
        last_outcome_at: outcomes.iter().map(|o| o.timestamp).max(),
        total_matches: outcomes.len() as u32,
        valid_matches,
        models: stats,
        leaderboard: order,
    }
}

#[cfg(test)]
#[path = "stats_tests.rs"]
mod stats_tests;
