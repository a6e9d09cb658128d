//! Deterministic stand-ins for the completion API and the operator (testing
//! only)
//!
//! Nothing in the `tournament` binary uses these. `ScriptedClient` can be told
//! to panic so tests can exercise crash handling; never wire it into a real
//! run.

use async_trait::async_trait;
use regex::Regex;
use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{LazyLock, Mutex};

use crate::client::{CompletionClient, CompletionRequest, Role, TransportError};
use crate::gate::{GateError, OperatorGate, PauseContext};

static AVAILABLE_CELL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"Available moves: \((\d),(\d)\)").expect("available pattern"));

/// Reply with the first empty cell listed in the prompt, row-major.
pub fn first_empty_reply(request: &CompletionRequest) -> String {
    request
        .messages
        .iter()
        .rev()
        .find(|m| m.role == Role::User)
        .and_then(|m| AVAILABLE_CELL.captures(&m.content))
        .map(|caps| format!("{},{}", &caps[1], &caps[2]))
        .unwrap_or_default()
}

/// Plays the first empty cell for every model.
#[derive(Debug, Default)]
pub struct FirstEmptyClient;

#[async_trait]
impl CompletionClient for FirstEmptyClient {
    async fn complete(&self, request: &CompletionRequest) -> Result<String, TransportError> {
        Ok(first_empty_reply(request))
    }
}

/// One scripted answer.
#[derive(Debug, Clone)]
pub enum Reply {
    Text(String),
    Fail(TransportError),
    Panic,
}

impl Reply {
    pub fn text(s: &str) -> Self {
        Reply::Text(s.to_string())
    }

    pub fn api_failure() -> Self {
        Reply::Fail(TransportError::Status {
            status: 503,
            body: "service unavailable".to_string(),
        })
    }
}

/// Answers from a per-model queue, then falls back to first-empty play.
#[derive(Debug, Default)]
pub struct ScriptedClient {
    scripts: Mutex<HashMap<String, VecDeque<Reply>>>,
    calls: AtomicU32,
}

impl ScriptedClient {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue replies for `model`, consumed one per request.
    pub fn script(self, model: &str, replies: Vec<Reply>) -> Self {
        self.scripts
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .entry(model.to_string())
            .or_default()
            .extend(replies);
        self
    }

    pub fn calls(&self) -> u32 {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl CompletionClient for ScriptedClient {
    async fn complete(&self, request: &CompletionRequest) -> Result<String, TransportError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let next = self
            .scripts
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .get_mut(&request.model)
            .and_then(VecDeque::pop_front);

        match next {
            Some(Reply::Text(text)) => Ok(text),
            Some(Reply::Fail(err)) => Err(err),
            Some(Reply::Panic) => panic!("scripted panic for {}", request.model),
            None => Ok(first_empty_reply(request)),
        }
    }
}

/// Operator gate that acknowledges immediately and counts pauses.
#[derive(Debug, Default)]
pub struct CountingGate {
    pauses: AtomicU32,
    contexts: Mutex<Vec<PauseContext>>,
}

impl CountingGate {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn pauses(&self) -> u32 {
        self.pauses.load(Ordering::SeqCst)
    }

    pub fn contexts(&self) -> Vec<PauseContext> {
        self.contexts.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }
}

#[async_trait]
impl OperatorGate for CountingGate {
    async fn wait_for_acknowledgement(&self, context: &PauseContext) -> Result<(), GateError> {
        self.pauses.fetch_add(1, Ordering::SeqCst);
        self.contexts
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(context.clone());
        Ok(())
    }
}
