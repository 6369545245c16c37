//! HTTP chat-completions oracle.
//!
//! Speaks the OpenAI chat-completions dialect (OpenAI, Groq, Mistral and any
//! compatible server) and the Anthropic messages API.

use std::env;
use std::thread;
use std::time::Duration;

use anyhow::{Context, Result, anyhow, bail};
use reqwest::StatusCode;
use reqwest::blocking::{Client, Response};
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument, warn};

use crate::io::config::{OracleSettings, Provider};
use crate::io::oracle::{Oracle, OracleRequest};

const ANTHROPIC_VERSION: &str = "2023-06-01";
const ANTHROPIC_DEFAULT_MAX_TOKENS: u32 = 1024;
const RETRY_BASE_DELAY: Duration = Duration::from_millis(500);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Dialect {
    OpenAi,
    Anthropic,
}

/// Oracle backed by a remote chat endpoint.
pub struct ChatOracle {
    client: Client,
    dialect: Dialect,
    base_url: String,
    api_key: String,
    model: String,
    temperature: f32,
    max_tokens: Option<u32>,
    max_retries: u32,
}

/// Failure of a single HTTP attempt.
#[derive(Debug)]
enum AttemptError {
    /// Transport failure, rate limit or server error.
    Transient(anyhow::Error),
    Fatal(anyhow::Error),
}

fn is_retryable(status: StatusCode) -> bool {
    status == StatusCode::TOO_MANY_REQUESTS || status.is_server_error()
}

fn check_status(response: Response, what: &str) -> Result<Response, AttemptError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let text = response.text().unwrap_or_default();
    let err = anyhow!("{what} failed with status {status}: {text}");
    if is_retryable(status) {
        Err(AttemptError::Transient(err))
    } else {
        Err(AttemptError::Fatal(err))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct ChatMessage {
    role: String,
    content: String,
}

#[derive(Serialize)]
struct OpenAiRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage>,
    temperature: f32,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u32>,
}

#[derive(Deserialize)]
struct OpenAiResponse {
    choices: Vec<OpenAiChoice>,
}

#[derive(Deserialize)]
struct OpenAiChoice {
    message: ChatMessage,
}

#[derive(Serialize)]
struct AnthropicRequest<'a> {
    model: &'a str,
    system: &'a str,
    messages: Vec<ChatMessage>,
    temperature: f32,
    max_tokens: u32,
}

#[derive(Deserialize)]
struct AnthropicResponse {
    content: Vec<AnthropicBlock>,
}

#[derive(Deserialize)]
struct AnthropicBlock {
    #[serde(default)]
    text: Option<String>,
}

impl ChatOracle {
    /// Build a client for `settings`, reading the API key from the environment.
    pub fn from_settings(settings: &OracleSettings) -> Result<Self> {
        let provider = settings.resolved_provider();
        let key_env = settings
            .api_key_env
            .as_deref()
            .or_else(|| provider.default_api_key_env())
            .ok_or_else(|| anyhow!("{}: missing api_key_env", settings.model))?;
        let api_key = env::var(key_env)
            .with_context(|| format!("{}: environment variable {key_env} is not set", settings.model))?;
        Self::with_api_key(settings, api_key)
    }

    fn with_api_key(settings: &OracleSettings, api_key: String) -> Result<Self> {
        let provider = settings.resolved_provider();
        let dialect = match provider {
            Provider::Anthropic => Dialect::Anthropic,
            Provider::OpenAi | Provider::Groq | Provider::Mistral => Dialect::OpenAi,
            Provider::Command => bail!("{}: command provider is not a chat endpoint", settings.model),
        };
        let base_url = settings
            .base_url
            .as_deref()
            .or_else(|| provider.default_base_url())
            .ok_or_else(|| anyhow!("{}: missing base_url", settings.model))?
            .trim_end_matches('/')
            .to_string();

        // `None` disables the blocking client's built-in default timeout.
        let client = Client::builder()
            .timeout(settings.timeout_secs.map(Duration::from_secs))
            .build()
            .context("build http client")?;

        Ok(Self {
            client,
            dialect,
            base_url,
            api_key,
            model: settings.model.clone(),
            temperature: settings.temperature,
            max_tokens: settings.max_tokens,
            max_retries: settings.max_retries,
        })
    }

    fn messages(request: &OracleRequest, include_system: bool) -> Vec<ChatMessage> {
        let mut messages = Vec::with_capacity(2);
        if include_system {
            messages.push(ChatMessage {
                role: "system".to_string(),
                content: request.system.clone(),
            });
        }
        messages.push(ChatMessage {
            role: "user".to_string(),
            content: request.user.clone(),
        });
        messages
    }

    fn send_openai(&self, request: &OracleRequest) -> Result<String, AttemptError> {
        let body = OpenAiRequest {
            model: &self.model,
            messages: Self::messages(request, true),
            temperature: self.temperature,
            max_tokens: self.max_tokens,
        };
        let response = self
            .client
            .post(format!("{}/chat/completions", self.base_url))
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .context("send chat completion request")
            .map_err(AttemptError::Transient)?;
        let response = check_status(response, "chat completion")?;
        let parsed: OpenAiResponse = response
            .json()
            .context("parse chat completion response")
            .map_err(AttemptError::Fatal)?;
        parsed
            .choices
            .into_iter()
            .next()
            .map(|choice| choice.message.content)
            .context("no choices in chat completion response")
            .map_err(AttemptError::Fatal)
    }

    fn send_anthropic(&self, request: &OracleRequest) -> Result<String, AttemptError> {
        let body = AnthropicRequest {
            model: &self.model,
            system: &request.system,
            messages: Self::messages(request, false),
            temperature: self.temperature.min(1.0),
            max_tokens: self.max_tokens.unwrap_or(ANTHROPIC_DEFAULT_MAX_TOKENS),
        };
        let response = self
            .client
            .post(format!("{}/messages", self.base_url))
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", ANTHROPIC_VERSION)
            .json(&body)
            .send()
            .context("send messages request")
            .map_err(AttemptError::Transient)?;
        let response = check_status(response, "messages request")?;
        let parsed: AnthropicResponse = response
            .json()
            .context("parse messages response")
            .map_err(AttemptError::Fatal)?;
        parsed
            .content
            .into_iter()
            .find_map(|block| block.text)
            .context("no text block in messages response")
            .map_err(AttemptError::Fatal)
    }
}

impl Oracle for ChatOracle {
    #[instrument(skip_all, fields(model = %self.model))]
    fn complete(&self, request: &OracleRequest) -> Result<String> {
        let mut attempt = 0u32;
        loop {
            let result = match self.dialect {
                Dialect::OpenAi => self.send_openai(request),
                Dialect::Anthropic => self.send_anthropic(request),
            };
            match result {
                Ok(text) => {
                    debug!(attempt, bytes = text.len(), "oracle responded");
                    return Ok(text);
                }
                Err(AttemptError::Transient(err)) if attempt < self.max_retries => {
                    let delay = RETRY_BASE_DELAY * 2u32.saturating_pow(attempt);
                    warn!(attempt, error = %format!("{err:#}"), ?delay, "oracle request failed, retrying");
                    thread::sleep(delay);
                    attempt += 1;
                }
                Err(AttemptError::Transient(err) | AttemptError::Fatal(err)) => {
                    return Err(err.context(format!("{}: request failed", self.model)));
                }
            }
        }
    }
}
