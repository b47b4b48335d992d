//! Single-slot probing: one query against one platform.
//!
//! [`probe`] owns the per-slot failure policy: every outcome (success,
//! provider error, rate limit, or deadline) is captured on the returned
//! [`ProbeResult`]. It never returns an error to the dispatcher.

use std::time::Duration;

use aevis_core::PlatformSpec;
use aevis_providers::{retry_with_backoff, AnswerClient, ProviderError, SearchClient};

use crate::types::{ErrorKind, ProbeResult, Query};

/// Search results injected into the prompt for search-tool platforms.
const SEARCH_CONTEXT_RESULTS: usize = 5;

/// Shared probe dependencies and tuning, borrowed for the run.
#[derive(Clone, Copy)]
pub struct ProbeContext<'a> {
    pub answer: &'a AnswerClient,
    pub search: Option<&'a SearchClient>,
    /// Deadline for one slot, covering retries.
    pub probe_timeout: Duration,
    pub max_retries: u32,
    pub backoff_base_ms: u64,
}

/// Probes one `(query, platform)` slot. Always returns a [`ProbeResult`].
///
/// Platforms with `requires_search_tool` get a search-context block appended
/// to the prompt first; a search failure degrades to a bare prompt with a
/// warning rather than failing the slot. The answer call runs under the
/// per-slot deadline with transient-error retries inside it, so a slot
/// resolves no later than `probe_timeout` regardless of retry behavior.
pub async fn probe(ctx: ProbeContext<'_>, query: &Query, platform: &PlatformSpec) -> ProbeResult {
    let prompt = build_prompt(ctx, query, platform).await;

    let call = retry_with_backoff(ctx.max_retries, ctx.backoff_base_ms, || {
        ctx.answer.generate(&platform.model_ref, &prompt)
    });

    match tokio::time::timeout(ctx.probe_timeout, call).await {
        Ok(Ok(answer)) => {
            tracing::debug!(
                platform = %platform.id,
                tokens = answer.tokens_used,
                "probe succeeded"
            );
            ProbeResult::success(query.clone(), &platform.id, answer.text, answer.tokens_used)
        }
        Ok(Err(e)) => {
            let kind = error_kind(&e);
            tracing::warn!(
                platform = %platform.id,
                query = %query.text,
                error = %e,
                "probe failed"
            );
            ProbeResult::failure(query.clone(), &platform.id, kind)
        }
        Err(_elapsed) => {
            tracing::warn!(
                platform = %platform.id,
                query = %query.text,
                timeout_secs = ctx.probe_timeout.as_secs(),
                "probe timed out"
            );
            ProbeResult::failure(query.clone(), &platform.id, ErrorKind::Timeout)
        }
    }
}

async fn build_prompt(
    ctx: ProbeContext<'_>,
    query: &Query,
    platform: &PlatformSpec,
) -> String {
    if !platform.requires_search_tool {
        return query.text.clone();
    }

    let Some(search) = ctx.search else {
        tracing::warn!(
            platform = %platform.id,
            "platform requires a search tool but no search client is configured"
        );
        return query.text.clone();
    };

    match search
        .search_context(&query.text, SEARCH_CONTEXT_RESULTS)
        .await
    {
        Ok(context) if !context.is_empty() => format!(
            "{}\n\nUse the following web search results as context:\n{context}",
            query.text
        ),
        Ok(_) => query.text.clone(),
        Err(e) => {
            tracing::warn!(
                platform = %platform.id,
                error = %e,
                "search context fetch failed, probing without it"
            );
            query.text.clone()
        }
    }
}

fn error_kind(err: &ProviderError) -> ErrorKind {
    match err {
        ProviderError::RateLimited { .. } => ErrorKind::RateLimited,
        ProviderError::Http(e) if e.is_timeout() => ErrorKind::Timeout,
        ProviderError::Http(_)
        | ProviderError::Api { .. }
        | ProviderError::Deserialize { .. }
        | ProviderError::EmptyResponse(_) => ErrorKind::Provider,
    }
}
