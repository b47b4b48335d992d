//! Full visibility run orchestration.
//!
//! 1. Generate the query battery (generative path with template fallback).
//! 2. Dispatch the `queries × platforms` matrix concurrently.
//! 3. Score every successful response for mentions.
//! 4. Fold everything into a [`VisibilityReport`].

use std::time::Duration;

use aevis_core::{AppConfig, CompanyProfile, Mode, PlatformSpec};
use aevis_providers::{AnswerClient, SearchClient};

use crate::aggregator::{aggregate, BandThresholds};
use crate::dispatcher::dispatch;
use crate::error::EngineError;
use crate::prober::ProbeContext;
use crate::queries::generate_queries;
use crate::scorer::{score, ScoringWeights};
use crate::types::{SlotOutcome, VisibilityReport};

/// Tuning for one visibility run, usually derived from [`AppConfig`].
#[derive(Debug, Clone)]
pub struct EngineOptions {
    pub mode: Mode,
    pub query_count: usize,
    pub max_concurrent_probes: usize,
    pub probe_timeout: Duration,
    pub max_retries: u32,
    pub backoff_base_ms: u64,
    pub results_cap: usize,
    pub weights: ScoringWeights,
    pub thresholds: BandThresholds,
}

impl EngineOptions {
    /// Builds run options from the application config for the given mode,
    /// validating the scoring configuration.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::InvalidScoringConfig`] if weights or band
    /// thresholds fail validation.
    pub fn from_config(config: &AppConfig, mode: Mode) -> Result<Self, EngineError> {
        let weights = ScoringWeights::default();
        weights.validate()?;
        let thresholds = BandThresholds::default();
        thresholds.validate()?;

        let query_count = match mode {
            Mode::Fast => config.query_count_fast,
            Mode::Full => config.query_count_full,
        };

        Ok(Self {
            mode,
            query_count,
            max_concurrent_probes: config.max_concurrent_probes,
            probe_timeout: Duration::from_secs(config.probe_timeout_secs),
            max_retries: config.max_retries,
            backoff_base_ms: config.retry_backoff_base_ms,
            results_cap: config.report_results_cap,
            weights,
            thresholds,
        })
    }
}

/// Runs the complete visibility measurement for one company.
///
/// # Errors
///
/// - [`EngineError::EmptyCompanyName`] if the profile has a blank name.
/// - [`EngineError::NoPlatforms`] if the platform set is empty.
/// - [`EngineError::AllPlatformsFailed`] if every probe slot errored.
///
/// Partial platform failures never error: they surface in the report's
/// per-platform error counts.
pub async fn run_visibility(
    answer: &AnswerClient,
    search: Option<&SearchClient>,
    profile: &CompanyProfile,
    platforms: &[PlatformSpec],
    options: &EngineOptions,
) -> Result<VisibilityReport, EngineError> {
    if profile.name.trim().is_empty() {
        return Err(EngineError::EmptyCompanyName);
    }
    if platforms.is_empty() {
        return Err(EngineError::NoPlatforms);
    }

    let queries = generate_queries(answer, profile, options.query_count).await;
    tracing::info!(
        company = %profile.name,
        mode = %options.mode,
        queries = queries.len(),
        platforms = platforms.len(),
        "starting visibility run"
    );

    let ctx = ProbeContext {
        answer,
        search,
        probe_timeout: options.probe_timeout,
        max_retries: options.max_retries,
        backoff_base_ms: options.backoff_base_ms,
    };

    let results = dispatch(ctx, &queries, platforms, options.max_concurrent_probes).await?;

    let outcomes: Vec<SlotOutcome> = results
        .into_iter()
        .map(|result| match result.error {
            Some(kind) => SlotOutcome::Errored {
                query: result.query,
                platform_id: result.platform_id,
                kind,
            },
            None => {
                let response = result.response_text.unwrap_or_default();
                let analysis = score(
                    &result.query,
                    &result.platform_id,
                    &response,
                    &profile.name,
                    &profile.competitors,
                    &options.weights,
                );
                SlotOutcome::Scored {
                    analysis,
                    tokens_used: result.tokens_used,
                }
            }
        })
        .collect();

    let report = aggregate(
        &profile.name,
        options.mode,
        &queries,
        platforms,
        outcomes,
        &options.thresholds,
        options.results_cap,
    );

    tracing::info!(
        company = %profile.name,
        run_id = %report.run_id,
        visibility_score = report.visibility_score,
        quality_score = report.quality_score,
        band = %report.band,
        total_mentions = report.total_mentions,
        "visibility run complete"
    );

    Ok(report)
}
