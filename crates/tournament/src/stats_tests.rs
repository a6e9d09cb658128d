use super::*;
use chrono::TimeZone;

fn outcome(a: &str, b: &str, outcome: Outcome, n: i64) -> MatchOutcome {
    let winner = match outcome {
        Outcome::PlayerAWins => Some(a.to_string()),
        Outcome::PlayerBWins => Some(b.to_string()),
        _ => None,
    };
    let id = format!("{a}-vs-{b}-{n}");
    MatchOutcome {
        match_id: id.clone(),
        model_a: a.to_string(),
        model_b: b.to_string(),
        outcome,
        winner,
        invalid_reason: None,
        record: id,
        timestamp: Utc.timestamp_millis_opt(1_700_000_000_000 + n).unwrap(),
    }
}

fn models(names: &[&str]) -> Vec<String> {
    names.iter().map(|s| s.to_string()).collect()
}

#[test]
fn test_win_rate_and_ranking() {
    // A beats B twice, draws once; B beats A once.
    let log = vec![
        outcome("A", "B", Outcome::PlayerAWins, 1),
        outcome("B", "A", Outcome::PlayerBWins, 2),
        outcome("A", "B", Outcome::Draw, 3),
        outcome("B", "A", Outcome::PlayerAWins, 4),
    ];
    let stats = aggregate(&models(&["A", "B"]), &log);

    let a = &stats.models["A"];
    assert_eq!((a.wins, a.losses, a.draws, a.invalid, a.total), (2, 1, 1, 0, 4));
    assert!((a.win_rate - 0.5).abs() < 1e-9);

    let b = &stats.models["B"];
    assert_eq!((b.wins, b.losses, b.draws), (1, 2, 1));
    assert!((b.win_rate - 0.25).abs() < 1e-9);

    assert_eq!(stats.leaderboard, vec!["A", "B"]);
    assert_eq!(a.rank, 1);
    assert_eq!(b.rank, 2);
    assert_eq!(stats.total_matches, 4);
    assert_eq!(stats.valid_matches, 4);
}

#[test]
fn test_invalid_games_excluded_from_denominator() {
    // A: 2 wins, 1 loss over valid games; one invalid attempt.
    let log = vec![
        outcome("A", "B", Outcome::PlayerAWins, 1),
        outcome("A", "B", Outcome::PlayerAWins, 2),
        outcome("B", "A", Outcome::PlayerAWins, 3),
        outcome("A", "B", Outcome::Invalid, 4),
    ];
    let stats = aggregate(&models(&["A", "B"]), &log);

    let a = &stats.models["A"];
    assert_eq!(a.total, 4);
    assert_eq!(a.invalid, 1);
    assert!((a.win_rate - 2.0 / 3.0).abs() < 1e-9);
    assert_eq!(stats.models["B"].invalid, 1);
    assert_eq!(stats.valid_matches, 3);
}

#[test]
fn test_head_to_head_is_symmetric() {
    let log = vec![
        outcome("A", "B", Outcome::PlayerAWins, 1),
        outcome("B", "C", Outcome::Draw, 2),
        outcome("C", "A", Outcome::Invalid, 3),
        outcome("A", "C", Outcome::PlayerBWins, 4),
    ];
    let stats = aggregate(&models(&["A", "B", "C"]), &log);

    for (x, sx) in &stats.models {
        for (y, h) in &sx.opponents {
            let mirror = stats.models[y].opponents[x];
            assert_eq!(h.wins, mirror.losses, "{x} vs {y}");
            assert_eq!(h.losses, mirror.wins, "{x} vs {y}");
            assert_eq!(h.draws, mirror.draws, "{x} vs {y}");
            assert_eq!(h.invalid, mirror.invalid, "{x} vs {y}");

            let played = log
                .iter()
                .filter(|o| {
                    (o.model_a == *x && o.model_b == *y) || (o.model_a == *y && o.model_b == *x)
                })
                .count() as u32;
            assert_eq!(h.total(), played);
        }
    }
    assert_eq!(stats.models["A"].opponents["C"].losses, 1);
    assert_eq!(stats.models["A"].opponents["C"].invalid, 1);
}

#[test]
fn test_zero_valid_games_has_zero_win_rate() {
    let log = vec![outcome("A", "B", Outcome::Invalid, 1)];
    let stats = aggregate(&models(&["A", "B", "C"]), &log);

    assert_eq!(stats.models["A"].win_rate, 0.0);
    assert_eq!(stats.models["C"].total, 0);
    assert_eq!(stats.models["C"].win_rate, 0.0);
}

#[test]
fn test_ties_get_sequential_ranks() {
    let log = vec![
        outcome("A", "B", Outcome::Draw, 1),
        outcome("B", "A", Outcome::Draw, 2),
    ];
    let stats = aggregate(&models(&["A", "B"]), &log);

    assert_eq!(stats.models["A"].rank, 1);
    assert_eq!(stats.models["B"].rank, 2);
}

#[test]
fn test_wins_break_win_rate_ties() {
    // Both at 100%, but B has more wins.
    let log = vec![
        outcome("A", "C", Outcome::PlayerAWins, 1),
        outcome("B", "C", Outcome::PlayerAWins, 2),
        outcome("C", "B", Outcome::PlayerBWins, 3),
    ];
    let stats = aggregate(&models(&["A", "B", "C"]), &log);

    assert_eq!(stats.leaderboard, vec!["B", "A", "C"]);
}

#[test]
fn test_unknown_models_in_log_are_added() {
    let log = vec![outcome("A", "Z", Outcome::PlayerBWins, 1)];
    let stats = aggregate(&models(&["A", "B"]), &log);

    assert!(stats.models.contains_key("Z"));
    assert_eq!(stats.models["Z"].rank, 1);
    assert_eq!(stats.leaderboard.len(), 3);
}

#[test]
fn test_recompute_is_idempotent() {
    let log = vec![
        outcome("A", "B", Outcome::PlayerAWins, 1),
        outcome("B", "A", Outcome::Draw, 2),
        outcome("A", "B", Outcome::Invalid, 3),
    ];
    let first = aggregate(&models(&["A", "B"]), &log);
    let second = aggregate(&models(&["A", "B"]), &log);

    assert_eq!(first, second);
    assert_eq!(
        serde_json::to_string(&first).unwrap(),
        serde_json::to_string(&second).unwrap()
    );
}
