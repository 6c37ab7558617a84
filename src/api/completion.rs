//! Clients for the chat completion service that answers general questions about the ledger.

use crate::api::Completion;
use crate::config::CompletionConfig;
use crate::Result;
use anyhow::{bail, Context};
use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

/// What a completion call is given: the fixed system instruction, the financial context and the
/// user's message.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct CompletionRequest {
    pub system_instruction: String,
    pub context: String,
    pub message: String,
}

/// Calls an OpenAI-compatible `chat/completions` endpoint.
pub(super) struct HttpCompletion {
    client: reqwest::Client,
    endpoint: String,
    model: String,
    api_key: String,
}

impl HttpCompletion {
    /// Reads the API key from the environment variable named in `config`.
    pub(super) fn new(config: &CompletionConfig) -> Result<Self> {
        let api_key = std::env::var(&config.api_key_env).with_context(|| {
            format!(
                "The completion API key is missing, set the {} environment variable",
                config.api_key_env
            )
        })?;
        Ok(Self::with_key(config, api_key))
    }

    fn with_key(config: &CompletionConfig, api_key: String) -> Self {
        Self {
            client: reqwest::Client::new(),
            endpoint: config.endpoint.clone(),
            model: config.model.clone(),
            api_key,
        }
    }
}

#[async_trait::async_trait]
impl Completion for HttpCompletion {
    async fn complete(&self, request: &CompletionRequest) -> Result<String> {
        let body = ChatRequest {
            model: &self.model,
            messages: vec![
                ChatMessage::system(&request.system_instruction),
                ChatMessage::system(&request.context),
                ChatMessage::user(&request.message),
            ],
        };
        debug!("Sending chat completion request to {}", self.endpoint);

        let response = self
            .client
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
            .context("Unable to reach the completion service")?;

        if !response.status().is_success() {
            let status = response.status();
            let text = response.text().await.unwrap_or_default();
            bail!("The completion service returned {status}: {text}");
        }

        let reply: ChatResponse = response
            .json()
            .await
            .context("Unable to parse the completion response")?;
        trace!("{reply:?}");
        reply
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .context("The completion response has no message")
    }
}

/// Answers without any network calls, so the whole app can run in test mode.
pub(super) struct TestCompletion;

#[async_trait::async_trait]
impl Completion for TestCompletion {
    async fn complete(&self, request: &CompletionRequest) -> Result<String> {
        let context_lines = request.context.lines().count();
        Ok(format!(
            "Test reply to '{}' ({context_lines} lines of context)",
            request.message
        ))
    }
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'static str,
    content: &'a str,
}

impl<'a> ChatMessage<'a> {
    fn system(content: &'a str) -> Self {
        Self {
            role: "system",
            content,
        }
    }

    fn user(content: &'a str) -> Self {
        Self {
            role: "user",
            content,
        }
    }
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ReplyMessage,
}

#[derive(Debug, Deserialize)]
struct ReplyMessage {
    content: Option<String>,
}
