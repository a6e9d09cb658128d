//! Plain-text reports over tournament statistics and match records

use tictactoe_core::Game;

use crate::records::{MatchResult, Outcome};
use crate::stats::TournamentStats;

/// Ranked table of every model.
pub fn leaderboard_report(stats: &TournamentStats) -> String {
    let mut report = String::new();
    report.push_str("=== Leaderboard ===\n");
    report.push_str(&format!(
        "Matches: {} ({} valid)\n\n",
        stats.total_matches, stats.valid_matches
    ));
    report.push_str(&format!(
        "{:>4}  {:<30} {:>6} {:>5} {:>5} {:>5} {:>5} {:>8}\n",
        "Rank", "Model", "Games", "W", "L", "D", "Inv", "Win %"
    ));
    report.push_str(&"-".repeat(78));
    report.push('\n');

    for s in stats.ranked() {
        report.push_str(&format!(
            "{:>4}  {:<30} {:>6} {:>5} {:>5} {:>5} {:>5} {:>7.1}%\n",
            s.rank,
            s.model,
            s.total,
            s.wins,
            s.losses,
            s.draws,
            s.invalid,
            s.win_rate * 100.0
        ));
    }
    report
}

/// Per-opponent records, models in rank order.
pub fn head_to_head_report(stats: &TournamentStats) -> String {
    let mut report = String::new();
    report.push_str("=== Head to head ===\n");
    report.push_str(&format!(
        "{:<30} vs {:<30} {:>5}-{:<5}-{:<5} {:>5}\n",
        "Model", "Opponent", "W", "L", "D", "Inv"
    ));
    report.push_str(&"-".repeat(86));
    report.push('\n');

    for s in stats.ranked() {
        for (opponent, h2h) in &s.opponents {
            report.push_str(&format!(
                "{:<30} vs {:<30} {:>5}-{:<5}-{:<5} {:>5}\n",
                s.model, opponent, h2h.wins, h2h.losses, h2h.draws, h2h.invalid
            ));
        }
    }
    report
}

/// Summary of one persisted match: players, result, move list and final board.
pub fn match_report(record: &MatchResult) -> String {
    let mut report = String::new();
    report.push_str(&format!("=== Match {} ===\n", record.match_id));
    report.push_str(&format!("X: {}\n", record.model_a));
    report.push_str(&format!("O: {}\n", record.model_b));
    report.push_str(&format!(
        "Started: {}  Duration: {} ms\n",
        record.started_at.to_rfc3339(),
        record.duration_ms
    ));

    let result = match (record.outcome, record.winner.as_deref()) {
        (Outcome::Draw, _) => "draw".to_string(),
        (Outcome::Invalid, _) => format!(
            "invalid ({})",
            record
                .invalid_reason
                .map(|r| r.as_str())
                .unwrap_or("unknown")
        ),
        (_, Some(winner)) => format!("{winner} wins"),
        (_, None) => "unknown".to_string(),
    };
    report.push_str(&format!("Result: {result}\n\n"));

    let mut game = Game::new();
    for (i, mv) in record.moves.iter().enumerate() {
        report.push_str(&format!("{:>2}. {} {},{}\n", i + 1, mv.player, mv.row, mv.col));
        if game.apply_move(mv.row, mv.col).is_err() {
            break;
        }
    }
    for invalid in &record.invalid_moves {
        report.push_str(&format!(
            "Move {} by {} rejected: {} ({})\n",
            invalid.move_number, invalid.model, invalid.reason, invalid.detail
        ));
    }
    report.push_str(&format!("\n{}\n", game.board()));
    report
}

pub fn print_leaderboard(stats: &TournamentStats) {
    println!("{}", leaderboard_report(stats));
}

pub fn print_report(stats: &TournamentStats) {
    print_leaderboard(stats);
    println!("{}", head_to_head_report(stats));
}
