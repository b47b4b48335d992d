//! Web-search collaborator injected for platforms without native retrieval.
//!
//! Fetches result snippets for a query and renders them as a plain-text
//! context block the prober appends to the prompt.

use std::time::Duration;

use reqwest::{Client, StatusCode, Url};
use serde::Deserialize;

use crate::error::ProviderError;

const DEFAULT_BASE_URL: &str = "https://api.search.brave.com/";
const SEARCH_PATH: &str = "res/v1/web/search";

#[derive(Deserialize)]
struct SearchResponse {
    #[serde(default)]
    web: Option<WebResults>,
}

#[derive(Deserialize)]
struct WebResults {
    #[serde(default)]
    results: Vec<WebResult>,
}

#[derive(Deserialize)]
struct WebResult {
    #[serde(default)]
    title: String,
    #[serde(default)]
    description: String,
    #[serde(default)]
    url: String,
}

/// Client for the web-search API used to ground search-tool platforms.
pub struct SearchClient {
    client: Client,
    api_key: String,
    search_url: Url,
}

impl SearchClient {
    /// Creates a new client pointed at the production search API.
    ///
    /// # Errors
    ///
    /// Returns [`ProviderError::Http`] if the underlying `reqwest::Client`
    /// cannot be constructed.
    pub fn new(api_key: &str, timeout_secs: u64) -> Result<Self, ProviderError> {
        Self::with_base_url(api_key, timeout_secs, DEFAULT_BASE_URL)
    }

    /// Creates a new client with a custom base URL (for testing with wiremock).
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

        let normalised = format!("{}/", base_url.trim_end_matches('/'));
        let search_url = Url::parse(&normalised)
            .and_then(|u| u.join(SEARCH_PATH))
            .map_err(|e| ProviderError::Api {
                status: 0,
                message: format!("invalid base URL '{base_url}': {e}"),
            })?;

        Ok(Self {
            client,
            api_key: api_key.to_owned(),
            search_url,
        })
    }

    /// Searches for `query` and returns up to `max_results` snippets rendered
    /// as a plain-text context block, one result per line.
    ///
    /// Returns an empty string when the API reports no web results; an empty
    /// context block is a valid (if unhelpful) grounding.
    ///
    /// # Errors
    ///
    /// - [`ProviderError::RateLimited`] on HTTP 429.
    /// - [`ProviderError::Api`] on any other non-2xx status.
    /// - [`ProviderError::Http`] on network failure or timeout.
    /// - [`ProviderError::Deserialize`] if the body does not parse.
    pub async fn search_context(
        &self,
        query: &str,
        max_results: usize,
    ) -> Result<String, ProviderError> {
        let mut url = self.search_url.clone();
        url.query_pairs_mut().append_pair("q", query);

        let response = self
            .client
            .get(url)
            .header("X-Subscription-Token", &self.api_key)
            .send()
            .await?;

        let status = response.status();
        if status == StatusCode::TOO_MANY_REQUESTS {
            return Err(ProviderError::RateLimited {
                retry_after_secs: 0,
            });
        }

        let body = response.text().await?;
        if !status.is_success() {
            return Err(ProviderError::Api {
                status: status.as_u16(),
                message: body.chars().take(300).collect(),
            });
        }

        let parsed: SearchResponse =
            serde_json::from_str(&body).map_err(|e| ProviderError::Deserialize {
                context: format!("web search for '{query}'"),
                source: e,
            })?;

        let results = parsed.web.map(|w| w.results).unwrap_or_default();
        let block = results
            .iter()
            .take(max_results)
            .map(|r| format!("- {}: {} ({})", r.title, r.description, r.url))
            .collect::<Vec<_>>()
            .join("\n");

        Ok(block)
    }
}
