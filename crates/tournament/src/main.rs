//! Tournament CLI
//!
//! Run round-robin tic-tac-toe tournaments between LLMs and inspect results.
//!
//! ## Commands
//!
//! - `run`: play every ordered pair of configured models
//! - `stats`: recompute and print the leaderboard from an outcome log
//! - `show`: print one persisted match attempt

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{info, Level};

use tournament::{
    aggregate, init_tracing, match_report, print_report, Config, JsonFileStore, MatchRunner,
    MoveProtocol, OpenAiClient, ResultStore, StdinGate, Tournament, API_KEY_ENV,
};

const DEFAULT_CONFIG: &str = "tournament.toml";

#[derive(Parser)]
#[command(name = "tournament")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Round-robin tic-tac-toe tournaments between language models", long_about = None)]
struct Cli {
    /// Debug-level logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Emit JSON-formatted log lines
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Play a tournament
    Run {
        /// Config file
        #[arg(short, long, default_value = DEFAULT_CONFIG)]
        config: PathBuf,

        /// Override `tournament.rounds`
        #[arg(short, long)]
        rounds: Option<u32>,

        /// Override `tournament.output_dir`
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// API key, takes precedence over the config file
        #[arg(long, env = API_KEY_ENV, hide_env_values = true)]
        api_key: Option<String>,
    },

    /// Recompute statistics from the outcome log and print the leaderboard
    Stats {
        /// Config file, used for the model list and output directory if present
        #[arg(short, long, default_value = DEFAULT_CONFIG)]
        config: PathBuf,

        /// Log directory (default: the config's output_dir)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Print one match record
    Show {
        /// Match id as found in outcomes.jsonl
        match_id: String,

        /// Log directory
        #[arg(short, long, default_value = "tournament_logs")]
        output: PathBuf,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let level = if cli.verbose { Level::DEBUG } else { Level::INFO };
    init_tracing(cli.json, level);

    match cli.command {
        Commands::Run {
            config,
            rounds,
            output,
            api_key,
        } => cmd_run(&config, rounds, output, api_key).await,
        Commands::Stats { config, output } => cmd_stats(&config, output).await,
        Commands::Show { match_id, output } => cmd_show(&match_id, &output).await,
    }
}

async fn cmd_run(
    config_path: &Path,
    rounds: Option<u32>,
    output: Option<PathBuf>,
    api_key: Option<String>,
) -> Result<()> {
    let mut config = Config::load(config_path)
        .with_context(|| format!("Failed to load {}", config_path.display()))?
        .with_api_key_override(api_key);
    if let Some(rounds) = rounds {
        config.tournament.rounds = rounds;
    }
    if let Some(output) = output {
        config.tournament.output_dir = output;
    }
    config.validate().context("Invalid configuration")?;

    let client = OpenAiClient::new(&config.api.base_url, &config.api.api_key)
        .context("Failed to build HTTP client")?;
    let protocol = MoveProtocol::new(Arc::new(client), config.move_settings());
    let store = JsonFileStore::new(&config.tournament.output_dir);

    info!(
        config = %config_path.display(),
        output = %store.root().display(),
        mode = ?config.api.mode,
        "loaded configuration"
    );

    let tournament = Tournament::new(
        config.tournament_settings(),
        MatchRunner::new(protocol),
        Arc::new(store),
        Arc::new(StdinGate::stdin()),
    );
    let summary = tournament.run().await.context("Tournament aborted")?;

    println!();
    println!("=== Tournament complete ===");
    println!(
        "Scheduled: {}, attempts: {}, model errors: {}, system errors: {}, operator pauses: {}",
        summary.scheduled,
        summary.attempts,
        summary.model_errors,
        summary.system_errors,
        summary.operator_pauses
    );
    println!();
    print_report(&summary.stats);
    Ok(())
}

async fn cmd_stats(config_path: &Path, output: Option<PathBuf>) -> Result<()> {
    // The config is optional here; without it models come from the log alone.
    let config = if config_path.exists() {
        Some(
            Config::load(config_path)
                .with_context(|| format!("Failed to load {}", config_path.display()))?,
        )
    } else {
        None
    };

    let output = output
        .or_else(|| config.as_ref().map(|c| c.tournament.output_dir.clone()))
        .unwrap_or_else(|| PathBuf::from("tournament_logs"));
    let models = config.map(|c| c.models).unwrap_or_default();

    let store = JsonFileStore::new(&output);
    let outcomes = store
        .load_outcomes()
        .await
        .with_context(|| format!("Failed to read outcome log in {}", output.display()))?;
    if outcomes.is_empty() && models.is_empty() {
        println!("No tournament data found in {}. Run a tournament first!", output.display());
        return Ok(());
    }

    let stats = aggregate(&models, &outcomes);
    store
        .persist_statistics(&stats)
        .await
        .context("Failed to write statistics")?;
    print_report(&stats);
    Ok(())
}

async fn cmd_show(match_id: &str, output: &Path) -> Result<()> {
    let store = JsonFileStore::new(output);
    let record = store
        .load_match(match_id)
        .await
        .with_context(|| format!("Failed to load match {match_id}"))?;
    println!("{}", match_report(&record));
    Ok(())
}
