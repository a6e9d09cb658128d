//! Full tournament against the on-disk store with scripted models.

use std::sync::Arc;
use tournament::fakes::{CountingGate, Reply, ScriptedClient};
use tournament::{
    InvalidReason, JsonFileStore, MatchRunner, MoveProtocol, MoveSettings, Outcome, ResultStore,
    RetryPolicy, Tournament, TournamentSettings, TournamentStats,
};

fn fast_retry() -> RetryPolicy {
    RetryPolicy {
        max_retries: 2,
        base_delay_ms: 5,
        multiplier: 2.0,
        max_delay_ms: Some(20),
        jitter: 0.0,
    }
}

fn build(client: ScriptedClient, models: &[&str], store: JsonFileStore, gate: Arc<CountingGate>) -> Tournament {
    let settings = TournamentSettings {
        models: models.iter().map(|m| m.to_string()).collect(),
        rounds: 1,
        retry: fast_retry(),
    };
    let runner = MatchRunner::new(MoveProtocol::new(Arc::new(client), MoveSettings::default()));
    Tournament::new(settings, runner, Arc::new(store), gate)
}

#[tokio::test]
async fn test_tournament_writes_every_attempt_to_disk() {
    let dir = tempfile::tempdir().unwrap();
    let root = dir.path().join("logs");

    // alpha's first reply is prose, then the API fails once; after that
    // everyone plays the first empty cell.
    let client = ScriptedClient::new().script(
        "vendor/alpha",
        vec![Reply::text("I think the centre is best."), Reply::api_failure()],
    );
    let gate = Arc::new(CountingGate::new());
    let tournament = build(
        client,
        &["vendor/alpha", "beta", "gamma"],
        JsonFileStore::new(&root),
        gate.clone(),
    );

    let summary = tournament.run().await.unwrap();

    assert_eq!(summary.scheduled, 6);
    assert_eq!(summary.model_errors, 1);
    assert_eq!(summary.system_errors, 1);
    assert_eq!(summary.attempts, 8);
    assert_eq!(gate.pauses(), 0);

    let store = JsonFileStore::new(&root);
    let outcomes = store.load_outcomes().await.unwrap();
    assert_eq!(outcomes.len(), 8);
    assert_eq!(outcomes[0].invalid_reason, Some(InvalidReason::InvalidSyntax));
    assert_eq!(outcomes[1].invalid_reason, Some(InvalidReason::ApiError));
    assert_eq!(outcomes[2].outcome, Outcome::PlayerAWins);

    let files = std::fs::read_dir(store.matches_dir()).unwrap().count();
    assert_eq!(files, 8);
    for outcome in &outcomes {
        let record = store.load_match(&outcome.record).await.unwrap();
        assert_eq!(record.outcome, outcome.outcome);
    }

    let raw = std::fs::read_to_string(store.statistics_path()).unwrap();
    let on_disk: TournamentStats = serde_json::from_str(&raw).unwrap();
    assert_eq!(on_disk, summary.stats);

    // First-empty play means X always wins: every model goes 2-2.
    for model in ["vendor/alpha", "beta", "gamma"] {
        let s = &on_disk.models[model];
        assert_eq!((s.wins, s.losses), (2, 2), "{model}");
    }
    assert_eq!(on_disk.models["vendor/alpha"].invalid, 2);
    assert_eq!(on_disk.models["beta"].invalid, 2);
    assert_eq!(on_disk.models["gamma"].invalid, 0);
    assert_eq!(on_disk.valid_matches, 6);
}

#[tokio::test]
async fn test_second_run_extends_the_log() {
    let dir = tempfile::tempdir().unwrap();
    let gate = Arc::new(CountingGate::new());

    for _ in 0..2 {
        let tournament = build(
            ScriptedClient::new(),
            &["a", "b"],
            JsonFileStore::new(dir.path()),
            gate.clone(),
        );
        tournament.run().await.unwrap();
    }

    let store = JsonFileStore::new(dir.path());
    let outcomes = store.load_outcomes().await.unwrap();
    assert_eq!(outcomes.len(), 4);

    let mut ids: Vec<_> = outcomes.iter().map(|o| o.match_id.clone()).collect();
    ids.sort();
    ids.dedup();
    assert_eq!(ids.len(), 4);

    let raw = std::fs::read_to_string(store.statistics_path()).unwrap();
    let stats: TournamentStats = serde_json::from_str(&raw).unwrap();
    assert_eq!(stats.total_matches, 4);
    assert_eq!(stats.models["a"].win_rate, 0.5);
}
