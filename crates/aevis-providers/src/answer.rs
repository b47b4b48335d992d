//! Chat-completions client for answer generation.
//!
//! Wraps `reqwest` around an OpenAI-compatible gateway: one endpoint, the
//! target platform selected by `model_ref`. Non-2xx statuses are mapped to
//! typed [`ProviderError`] variants so callers can distinguish rate limiting
//! from hard API failures.

use std::time::Duration;

use reqwest::{Client, StatusCode, Url};
use serde::{Deserialize, Serialize};

use crate::error::ProviderError;

const DEFAULT_BASE_URL: &str = "https://openrouter.ai/api/";
const COMPLETIONS_PATH: &str = "v1/chat/completions";

/// A generated answer plus the token usage the gateway reported for it.
#[derive(Debug, Clone)]
pub struct Answer {
    pub text: String,
    pub tokens_used: u64,
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
    #[serde(default)]
    usage: Option<ChatUsage>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatResponseMessage,
}

#[derive(Deserialize)]
struct ChatResponseMessage {
    content: Option<String>,
}

#[derive(Deserialize)]
struct ChatUsage {
    #[serde(default)]
    total_tokens: u64,
}

/// Client for an OpenAI-compatible chat-completions API.
///
/// Use [`AnswerClient::new`] for production or [`AnswerClient::with_base_url`]
/// to point at a mock server in tests.
pub struct AnswerClient {
    client: Client,
    api_key: String,
    completions_url: Url,
}

impl AnswerClient {
    /// Creates a new client pointed at the default gateway.
    ///
    /// # Errors
    ///
    /// Returns [`ProviderError::Http`] if the underlying `reqwest::Client`
    /// cannot be constructed.
    pub fn new(api_key: &str, timeout_secs: u64) -> Result<Self, ProviderError> {
        Self::with_base_url(api_key, timeout_secs, DEFAULT_BASE_URL)
    }

    /// Creates a new client with a custom base URL (for testing with wiremock,
    /// or for self-hosted gateways).
    ///
    /// # Errors
    ///
    /// Returns [`ProviderError::Http`] if the underlying `reqwest::Client`
    /// cannot be constructed, or [`ProviderError::Api`] if `base_url` is not
    /// a valid URL.
    pub fn with_base_url(
        api_key: &str,
        timeout_secs: u64,
        base_url: &str,
    ) -> Result<Self, ProviderError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .connect_timeout(Duration::from_secs(10))
            .user_agent("aevis/0.1 (visibility-monitoring)")
            .build()?;

        // Normalise: ensure the base URL ends with exactly one slash so that
        // joining the completions path appends rather than replaces the last
        // path segment.
        let normalised = format!("{}/", base_url.trim_end_matches('/'));
        let completions_url = Url::parse(&normalised)
            .and_then(|u| u.join(COMPLETIONS_PATH))
            .map_err(|e| ProviderError::Api {
                status: 0,
                message: format!("invalid base URL '{base_url}': {e}"),
            })?;

        Ok(Self {
            client,
            api_key: api_key.to_owned(),
            completions_url,
        })
    }

    /// Sends `prompt` to the model behind `model_ref` and returns the
    /// generated answer text with token usage.
    ///
    /// # Errors
    ///
    /// - [`ProviderError::RateLimited`] on HTTP 429.
    /// - [`ProviderError::Api`] on any other non-2xx status.
    /// - [`ProviderError::Http`] on network failure or timeout.
    /// - [`ProviderError::Deserialize`] if the body does not match the
    ///   chat-completions shape.
    /// - [`ProviderError::EmptyResponse`] if the response carries no choices
    ///   or no message content.
    pub async fn generate(&self, model_ref: &str, prompt: &str) -> Result<Answer, ProviderError> {
        let request = ChatRequest {
            model: model_ref,
            messages: vec![ChatMessage {
                role: "user",
                content: prompt,
            }],
        };

        let response = self
            .client
            .post(self.completions_url.clone())
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        if status == StatusCode::TOO_MANY_REQUESTS {
            let retry_after_secs = response
                .headers()
                .get(reqwest::header::RETRY_AFTER)
                .and_then(|v| v.to_str().ok())
                .and_then(|v| v.parse::<u64>().ok())
                .unwrap_or(0);
            return Err(ProviderError::RateLimited { retry_after_secs });
        }

        let body = response.text().await?;
        if !status.is_success() {
            return Err(ProviderError::Api {
                status: status.as_u16(),
                message: truncate_body(&body),
            });
        }

        let parsed: ChatResponse =
            serde_json::from_str(&body).map_err(|e| ProviderError::Deserialize {
                context: format!("chat completion for model '{model_ref}'"),
                source: e,
            })?;

        let text = parsed
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .ok_or_else(|| {
                ProviderError::EmptyResponse(format!("model '{model_ref}' returned no content"))
            })?;

        let tokens_used = parsed.usage.map_or(0, |u| u.total_tokens);

        Ok(Answer { text, tokens_used })
    }
}

/// Trims an error body to a loggable length.
fn truncate_body(body: &str) -> String {
    const MAX: usize = 300;
    if body.len() <= MAX {
        body.to_owned()
    } else {
        let mut end = MAX;
        while !body.is_char_boundary(end) {
            end -= 1;
        }
        format!("{}…", &body[..end])
    }
}
