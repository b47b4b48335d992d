//! Scan command: visibility runs for one or many companies.
//!
//! Companies in a batch are processed in bounded parallel groups, one level
//! above the per-probe concurrency bound inside the engine. A single
//! company's failure is logged and summarized; only an all-companies failure
//! fails the command.

use std::path::Path;

use aevis_core::{AppConfig, CompanyProfile, Mode, PlatformSpec};
use aevis_engine::{run_visibility, EngineOptions, VisibilityReport};
use aevis_providers::{AnswerClient, SearchClient};
use futures::stream::{self, StreamExt};

/// Runs visibility scans for every company in the profiles file.
pub async fn run_scan(
    config: &AppConfig,
    profile_path: &Path,
    mode: Mode,
    output: Option<&Path>,
    output_dir: &Path,
) -> anyhow::Result<()> {
    let profiles = aevis_core::load_profiles(profile_path)?;
    let registry = aevis_core::load_platforms(&config.platforms_path)?;
    let platforms = registry.platforms_for(mode);

    let answer = build_answer_client(config)?;
    let search = build_search_client(config, &platforms)?;
    let options = EngineOptions::from_config(config, mode)?;

    let companies = profiles.companies;
    if output.is_some() && companies.len() > 1 {
        anyhow::bail!("--output only applies to a single-company profiles file; use --output-dir");
    }

    let company_count = companies.len();
    tracing::info!(
        companies = company_count,
        platforms = platforms.len(),
        %mode,
        "starting scan"
    );

    let results: Vec<(CompanyProfile, anyhow::Result<VisibilityReport>)> =
        stream::iter(companies)
            .map(|company| {
                let answer = &answer;
                let search = search.as_ref();
                let platforms = &platforms;
                let options = &options;
                async move {
                    let outcome = run_visibility(answer, search, &company, platforms, options)
                        .await
                        .map_err(anyhow::Error::from);
                    (company, outcome)
                }
            })
            .buffer_unordered(config.max_concurrent_companies)
            .collect()
            .await;

    let mut failed = 0usize;
    for (company, outcome) in &results {
        match outcome {
            Ok(report) => {
                write_report(company, report, company_count, output, output_dir)?;
                tracing::info!(
                    company = %company.name,
                    visibility_score = report.visibility_score,
                    band = %report.band,
                    total_mentions = report.total_mentions,
                    "scan finished"
                );
            }
            Err(e) => {
                tracing::error!(company = %company.name, error = %e, "scan failed");
                failed += 1;
            }
        }
    }

    if failed == company_count {
        anyhow::bail!("all {failed} companies failed to scan");
    }
    if failed > 0 {
        tracing::warn!(failed, total = company_count, "some companies failed to scan");
    }

    Ok(())
}

/// Prints the configured platforms for both modes.
///
/// Reads only the registry file; no provider credentials are required.
pub fn list_platforms(platforms_path: &Path) -> anyhow::Result<()> {
    let registry = aevis_core::load_platforms(platforms_path)?;
    for mode in [Mode::Fast, Mode::Full] {
        println!("{mode}:");
        for platform in registry.platforms_for(mode) {
            let retrieval = if platform.has_native_search {
                "native search"
            } else {
                "search tool"
            };
            println!("  {} ({}, {})", platform.id, platform.model_ref, retrieval);
        }
    }
    Ok(())
}

fn build_answer_client(config: &AppConfig) -> anyhow::Result<AnswerClient> {
    let client = match &config.answer_base_url {
        Some(base) => {
            AnswerClient::with_base_url(&config.answer_api_key, config.request_timeout_secs, base)?
        }
        None => AnswerClient::new(&config.answer_api_key, config.request_timeout_secs)?,
    };
    Ok(client)
}

/// Builds the search collaborator when any selected platform needs it.
///
/// A missing key degrades those platforms to bare prompts; the prober logs
/// a warning per affected slot.
fn build_search_client(
    config: &AppConfig,
    platforms: &[PlatformSpec],
) -> anyhow::Result<Option<SearchClient>> {
    if !platforms.iter().any(|p| p.requires_search_tool) {
        return Ok(None);
    }
    let Some(key) = &config.search_api_key else {
        tracing::warn!(
            "some platforms require a search tool but AEVIS_SEARCH_API_KEY is not set; \
             probing them without search context"
        );
        return Ok(None);
    };
    let client = match &config.search_base_url {
        Some(base) => SearchClient::with_base_url(key, config.request_timeout_secs, base)?,
        None => SearchClient::new(key, config.request_timeout_secs)?,
    };
    Ok(Some(client))
}

fn write_report(
    company: &CompanyProfile,
    report: &VisibilityReport,
    company_count: usize,
    output: Option<&Path>,
    output_dir: &Path,
) -> anyhow::Result<()> {
    let json = serde_json::to_string_pretty(report)?;

    if company_count == 1 {
        match output {
            Some(path) => std::fs::write(path, json)?,
            None => println!("{json}"),
        }
        return Ok(());
    }

    std::fs::create_dir_all(output_dir)?;
    let path = output_dir.join(format!("{}.json", company.slug()));
    std::fs::write(&path, json)?;
    tracing::debug!(path = %path.display(), "report written");
    Ok(())
}
