use super::*;
use crate::fakes::{CountingGate, FirstEmptyClient, Reply, ScriptedClient};
use crate::gate::LineGate;
use crate::protocol::{MoveProtocol, MoveSettings};
use crate::storage::MemoryStore;
use std::collections::HashMap;
use std::time::Duration;

struct Harness {
    tournament: Tournament,
    store: Arc<MemoryStore>,
    gate: Arc<CountingGate>,
}

fn harness(
    client: Arc<dyn crate::client::CompletionClient>,
    models: &[&str],
    retry: RetryPolicy,
    store: MemoryStore,
) -> Harness {
    let store = Arc::new(store);
    let gate = Arc::new(CountingGate::new());
    let settings = TournamentSettings {
        models: models.iter().map(|m| m.to_string()).collect(),
        rounds: 1,
        retry,
    };
    let runner = MatchRunner::new(MoveProtocol::new(client, MoveSettings::default()));
    Harness {
        tournament: Tournament::new(settings, runner, store.clone(), gate.clone()),
        store,
        gate,
    }
}

fn retry(max_retries: u32) -> RetryPolicy {
    RetryPolicy {
        max_retries,
        base_delay_ms: 1000,
        multiplier: 2.0,
        max_delay_ms: None,
        jitter: 0.0,
    }
}

#[test]
fn test_schedule_is_all_ordered_pairs_per_round() {
    let models: Vec<String> = ["a", "b", "c"].iter().map(|s| s.to_string()).collect();
    let matchups = schedule(&models, 2);

    assert_eq!(matchups.len(), 12);
    assert!(matchups.iter().all(|m| m.model_a != m.model_b));

    let mut counts: HashMap<(String, String), u32> = HashMap::new();
    for m in &matchups {
        *counts.entry((m.model_a.clone(), m.model_b.clone())).or_default() += 1;
    }
    assert_eq!(counts.len(), 6);
    assert!(counts.values().all(|&c| c == 2));

    assert!(matchups[..6].iter().all(|m| m.round == 1));
    assert!(matchups[6..].iter().all(|m| m.round == 2));
    assert_eq!((matchups[0].model_a.as_str(), matchups[0].model_b.as_str()), ("a", "b"));
}

#[test]
fn test_schedule_degenerate_inputs() {
    assert!(schedule(&["solo".to_string()], 3).is_empty());
    assert!(schedule(&["a".to_string(), "b".to_string()], 0).is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_budget_exhaustion_pauses_once_then_resets() {
    let client = ScriptedClient::new().script("A", vec![Reply::api_failure(); 3]);
    let h = harness(Arc::new(client), &["A", "B"], retry(3), MemoryStore::new());

    let start = tokio::time::Instant::now();
    let summary = h.tournament.run().await.unwrap();
    let waited = start.elapsed();

    assert_eq!(h.gate.pauses(), 1);
    let context = &h.gate.contexts()[0];
    assert_eq!(context.failures, 3);
    assert_eq!((context.model_a.as_str(), context.model_b.as_str()), ("A", "B"));
    assert!(context.last_error.contains("503"));

    // Backoff after failures 1 and 2 only; the third goes to the operator.
    assert!(waited >= Duration::from_millis(3000), "waited {waited:?}");
    assert!(waited < Duration::from_millis(4000), "waited {waited:?}");

    assert_eq!(summary.scheduled, 2);
    assert_eq!(summary.attempts, 5);
    assert_eq!(summary.system_errors, 3);
    assert_eq!(summary.model_errors, 0);
    assert_eq!(summary.operator_pauses, 1);

    // Every attempt persisted, failed ones included.
    assert_eq!(h.store.match_count(), 5);
    let outcomes = h.store.load_outcomes().await.unwrap();
    assert_eq!(outcomes.len(), 5);
    assert!(outcomes[..3]
        .iter()
        .all(|o| o.invalid_reason == Some(InvalidReason::ApiError)));
    assert_eq!(outcomes[3].outcome, Outcome::PlayerAWins);
}

#[tokio::test(start_paused = true)]
async fn test_model_errors_retry_immediately_without_budget() {
    let client = ScriptedClient::new().script(
        "A",
        vec![
            Reply::text("hello"),
            Reply::text("   "),
            Reply::text("5,5"),
            Reply::text("-1,0"),
        ],
    );
    let h = harness(Arc::new(client), &["A", "B"], retry(1), MemoryStore::new());

    let start = tokio::time::Instant::now();
    let summary = h.tournament.run().await.unwrap();

    assert_eq!(start.elapsed(), Duration::ZERO);
    assert_eq!(h.gate.pauses(), 0);
    assert_eq!(summary.model_errors, 4);
    assert_eq!(summary.system_errors, 0);
    assert_eq!(summary.attempts, 6);

    let reasons: Vec<_> = h
        .store
        .load_outcomes()
        .await
        .unwrap()
        .iter()
        .filter_map(|o| o.invalid_reason)
        .collect();
    assert_eq!(
        reasons,
        vec![
            InvalidReason::InvalidSyntax,
            InvalidReason::Blank,
            InvalidReason::OutsideBoard,
            InvalidReason::NegativeCoordinates,
        ]
    );
}

#[tokio::test(start_paused = true)]
async fn test_retry_counter_resets_after_each_pause() {
    let client = ScriptedClient::new().script("A", vec![Reply::api_failure(); 5]);
    let h = harness(Arc::new(client), &["A", "B"], retry(2), MemoryStore::new());

    let start = tokio::time::Instant::now();
    let summary = h.tournament.run().await.unwrap();

    // fail(1s) fail->pause fail(1s) fail->pause fail(1s) ok
    assert_eq!(h.gate.pauses(), 2);
    assert_eq!(start.elapsed(), Duration::from_millis(3000));
    assert_eq!(summary.attempts, 7);
}

#[tokio::test(start_paused = true)]
async fn test_closed_operator_input_stops_the_tournament() {
    let client = ScriptedClient::new().script("A", vec![Reply::api_failure(); 3]);
    let store = Arc::new(MemoryStore::new());
    let settings = TournamentSettings {
        models: vec!["A".to_string(), "B".to_string()],
        rounds: 1,
        retry: retry(3),
    };
    let runner = MatchRunner::new(MoveProtocol::new(Arc::new(client), MoveSettings::default()));
    let gate = Arc::new(LineGate::new(std::io::Cursor::new(Vec::new())));
    let tournament = Tournament::new(settings, runner, store.clone(), gate);

    match tournament.run().await {
        Err(TournamentError::OperatorUnavailable { model_a, model_b, source }) => {
            assert_eq!((model_a.as_str(), model_b.as_str()), ("A", "B"));
            assert!(matches!(source, GateError::Closed));
        }
        other => panic!("expected the run to stop, got {other:?}"),
    }

    // The failed attempts are on record; nothing was played past the pause.
    let outcomes = store.load_outcomes().await.unwrap();
    assert_eq!(outcomes.len(), 3);
    assert!(outcomes
        .iter()
        .all(|o| o.invalid_reason == Some(InvalidReason::ApiError)));
    assert!(store.statistics().is_none());
}

#[tokio::test(start_paused = true)]
async fn test_crashed_runner_is_a_persisted_system_error() {
    let client = ScriptedClient::new().script("B", vec![Reply::Panic]);
    let h = harness(Arc::new(client), &["A", "B"], retry(3), MemoryStore::new());

    let summary = h.tournament.run().await.unwrap();

    assert_eq!(summary.system_errors, 1);
    assert_eq!(h.gate.pauses(), 0);

    let outcomes = h.store.load_outcomes().await.unwrap();
    assert_eq!(outcomes.len(), 3);
    assert_eq!(outcomes[0].invalid_reason, Some(InvalidReason::ApiError));

    let crashed = h.store.load_match(&outcomes[0].match_id).await.unwrap();
    assert!(crashed.invalid_moves[0].detail.contains("panicked"));
    assert_ne!(outcomes[0].match_id, outcomes[1].match_id);
}

#[tokio::test]
async fn test_statistics_recomputed_from_full_log() {
    // An earlier run already recorded B beating A.
    let earlier = harness(
        Arc::new(FirstEmptyClient),
        &["B", "A"],
        retry(3),
        MemoryStore::new(),
    );
    earlier.tournament.run().await.unwrap();
    let prior = earlier.store.load_outcomes().await.unwrap();
    assert_eq!(prior.len(), 2);

    let h = harness(
        Arc::new(FirstEmptyClient),
        &["A", "B"],
        retry(3),
        MemoryStore::with_outcomes(prior),
    );
    let summary = h.tournament.run().await.unwrap();

    assert_eq!(summary.stats.total_matches, 4);
    assert_eq!(summary.stats.models["A"].total, 4);
    assert_eq!(h.store.statistics(), Some(summary.stats.clone()));
}

#[tokio::test]
async fn test_two_model_first_empty_tournament() {
    let h = harness(Arc::new(FirstEmptyClient), &["A", "B"], retry(3), MemoryStore::new());

    let summary = h.tournament.run().await.unwrap();

    // The first mover wins every game with first-empty play.
    let outcomes = h.store.load_outcomes().await.unwrap();
    assert_eq!(outcomes.len(), 2);
    assert!(outcomes.iter().all(|o| o.outcome == Outcome::PlayerAWins));
    assert_eq!(outcomes[0].winner.as_deref(), Some("A"));
    assert_eq!(outcomes[1].winner.as_deref(), Some("B"));

    let a = &summary.stats.models["A"];
    assert_eq!((a.wins, a.losses, a.draws, a.invalid), (1, 1, 0, 0));
    assert_eq!(a.win_rate, 0.5);
    assert_eq!(a.opponents["B"].total(), 2);
    assert_eq!(summary.stats.leaderboard, vec!["A", "B"]);
}
