use thiserror::Error;

#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("provider returned HTTP 429 (retry after {retry_after_secs}s)")]
    RateLimited { retry_after_secs: u64 },

    #[error("provider API error (HTTP {status}): {message}")]
    Api { status: u16, message: String },

    #[error("failed to deserialize provider response ({context}): {source}")]
    Deserialize {
        context: String,
        source: serde_json::Error,
    },

    #[error("provider response missing expected content ({0})")]
    EmptyResponse(String),
}
