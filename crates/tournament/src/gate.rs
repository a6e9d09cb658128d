//! Operator intervention point
//!
//! When a matchup keeps failing for system reasons, the tournament stops and
//! waits here until a human has looked at the problem.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::io::{BufRead, BufReader, Stdin, Write};
use std::sync::{Arc, Mutex};
use thiserror::Error;
use tracing::error;

/// The operator could not be asked, so the tournament must not go on.
#[derive(Error, Debug)]
pub enum GateError {
    #[error("operator input closed before acknowledgement")]
    Closed,

    #[error("failed to read operator acknowledgement: {0}")]
    Read(#[from] std::io::Error),

    #[error("acknowledgement task failed: {0}")]
    Task(String),
}

/// What the operator is being asked to look at.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PauseContext {
    pub model_a: String,
    pub model_b: String,
    pub round: u32,
    /// Consecutive system failures that triggered the pause
    pub failures: u32,
    pub last_error: String,
}

/// Blocks the tournament until someone acknowledges the failure.
///
/// `Ok` means a human answered. Anything else ends the tournament.
#[async_trait]
pub trait OperatorGate: Send + Sync {
    async fn wait_for_acknowledgement(&self, context: &PauseContext) -> Result<(), GateError>;
}

/// Waits for one line on a reader, normally the controlling terminal.
pub struct LineGate<R> {
    reader: Arc<Mutex<R>>,
}

/// Gate reading the process's stdin.
pub type StdinGate = LineGate<BufReader<Stdin>>;

impl LineGate<BufReader<Stdin>> {
    pub fn stdin() -> Self {
        Self::new(BufReader::new(std::io::stdin()))
    }
}

impl<R: BufRead + Send + 'static> LineGate<R> {
    pub fn new(reader: R) -> Self {
        Self {
            reader: Arc::new(Mutex::new(reader)),
        }
    }
}

#[async_trait]
impl<R: BufRead + Send + 'static> OperatorGate for LineGate<R> {
    async fn wait_for_acknowledgement(&self, context: &PauseContext) -> Result<(), GateError> {
        error!(
            model_a = %context.model_a,
            model_b = %context.model_b,
            round = context.round,
            failures = context.failures,
            last_error = %context.last_error,
            "retry budget exhausted, waiting for operator"
        );

        let prompt = format!(
            "\n{} consecutive API failures for {} vs {} (round {}).\nLast error: {}\n\
             Fix the problem, then press Enter to continue...",
            context.failures, context.model_a, context.model_b, context.round, context.last_error
        );

        let reader = Arc::clone(&self.reader);
        let read = tokio::task::spawn_blocking(move || {
            let mut stdout = std::io::stdout();
            writeln!(stdout, "{prompt}").ok();
            stdout.flush().ok();
            let mut line = String::new();
            let mut reader = reader.lock().unwrap_or_else(|e| e.into_inner());
            reader.read_line(&mut line)
        })
        .await
        .map_err(|e| GateError::Task(e.to_string()))?;

        match read? {
            0 => Err(GateError::Closed),
            _ => Ok(()),
        }
    }
}
