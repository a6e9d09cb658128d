//! OpenAI-compatible chat-completions client (OpenRouter, OpenAI, local
//! servers speaking the same protocol).

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::client::{ChatMessage, CompletionClient, CompletionRequest, TransportError};

/// HTTP client for `POST {base_url}/chat/completions`.
pub struct OpenAiClient {
    base_url: String,
    api_key: String,
    http_client: reqwest::Client,
}

#[derive(Serialize)]
struct ChatRequestBody<'a> {
    model: &'a str,
    messages: &'a [ChatMessage],
    max_tokens: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    reasoning: Option<ReasoningHint<'a>>,
}

#[derive(Serialize)]
struct ReasoningHint<'a> {
    effort: &'a str,
}

#[derive(Deserialize)]
struct ChatResponseBody {
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: ResponseMessage,
}

#[derive(Deserialize)]
struct ResponseMessage {
    content: Option<String>,
}

impl OpenAiClient {
    pub fn new(base_url: &str, api_key: &str) -> Result<Self, TransportError> {
        let http_client = reqwest::Client::builder()
            .user_agent(concat!("llm-tictactoe-tournament/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| TransportError::Network(e.to_string()))?;

        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
            http_client,
        })
    }

    fn endpoint(&self) -> String {
        format!("{}/chat/completions", self.base_url)
    }
}

#[async_trait]
impl CompletionClient for OpenAiClient {
    async fn complete(&self, request: &CompletionRequest) -> Result<String, TransportError> {
        let body = ChatRequestBody {
            model: &request.model,
            messages: &request.messages,
            max_tokens: request.max_tokens,
            reasoning: request
                .reasoning_effort
                .as_deref()
                .map(|effort| ReasoningHint { effort }),
        };

        debug!(model = %request.model, mode = ?request.mode, "sending completion request");

        let response = self
            .http_client
            .post(self.endpoint())
            .bearer_auth(&self.api_key)
            .timeout(request.timeout)
            .json(&body)
            .send()
            .await
            .map_err(|e| classify(e, request))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(TransportError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let parsed: ChatResponseBody = response.json().await.map_err(|e| {
            if e.is_timeout() {
                TransportError::Timeout(request.timeout)
            } else {
                TransportError::MalformedResponse(e.to_string())
            }
        })?;

        let choice = parsed
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| TransportError::MalformedResponse("no choices in response".into()))?;

        // A null content is an empty reply, which the parser reports as blank.
        Ok(choice.message.content.unwrap_or_default())
    }
}

fn classify(err: reqwest::Error, request: &CompletionRequest) -> TransportError {
    if err.is_timeout() {
        TransportError::Timeout(request.timeout)
    } else {
        TransportError::Network(err.to_string())
    }
}
