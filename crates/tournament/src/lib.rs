//! Round-robin tic-tac-toe tournaments between language models
//!
//! This crate provides infrastructure for:
//! - Asking a model for its next move over an OpenAI-compatible chat API
//! - Parsing free-form replies into board coordinates
//! - Playing matches and replaying failed attempts with backoff
//! - Persisting every attempt and folding the outcome log into win rates
//!
//! # Usage
//!
//! ```bash
//! # Play every ordered pair of models from tournament.toml once
//! cargo run -p tournament -- run --config tournament.toml
//!
//! # Three rounds, JSON logs, results under ./runs/evening
//! cargo run -p tournament -- --json run --rounds 3 --output runs/evening
//!
//! # Leaderboard from an existing log directory
//! cargo run -p tournament -- stats --output runs/evening
//!
//! # Inspect one match attempt
//! cargo run -p tournament -- show openai/gpt-4o-mini-vs-google/gemini-flash-1718000000000
//! ```

pub mod backoff;
pub mod client;
pub mod config;
pub mod fakes;
pub mod gate;
pub mod match_runner;
pub mod openai;
pub mod parser;
pub mod prompt;
pub mod protocol;
pub mod records;
pub mod report;
pub mod stats;
pub mod storage;
pub mod telemetry;
pub mod tournament;

pub use backoff::RetryPolicy;
pub use client::*;
pub use config::{Config, ConfigError, API_KEY_ENV};
pub use gate::{GateError, LineGate, OperatorGate, PauseContext, StdinGate};
pub use match_runner::MatchRunner;
pub use openai::OpenAiClient;
pub use parser::parse_move;
pub use protocol::*;
pub use records::*;
pub use report::*;
pub use stats::*;
pub use storage::*;
pub use telemetry::init_tracing;
pub use tournament::*;
