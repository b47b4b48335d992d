//! Probe query generation.
//!
//! The generative path asks the answer gateway for dimension-tagged queries;
//! any failure there (network, malformed output, too few usable lines) falls
//! back to deterministic per-dimension templates. Generation never fails:
//! the caller always gets at least `min(count, |dimensions|)` queries.

use aevis_core::CompanyProfile;
use aevis_providers::AnswerClient;

use crate::types::{Dimension, Query};

/// Model used for query generation, independent of the probed platforms.
const QUERY_GEN_MODEL: &str = "openai/gpt-4o-mini";

/// Lines shorter than this are treated as noise from the generative model.
const MIN_QUERY_LEN: usize = 8;

/// Generates `count` probe queries for `profile`, spread across all
/// dimensions roughly evenly.
///
/// Attempts the generative path first; tops up from the template fallback
/// when the model fails, returns malformed output, or produces fewer usable
/// lines than requested. Duplicate query text is removed.
pub async fn generate_queries(
    client: &AnswerClient,
    profile: &CompanyProfile,
    count: usize,
) -> Vec<Query> {
    let mut queries = match client.generate(QUERY_GEN_MODEL, &generation_prompt(profile, count)).await
    {
        Ok(answer) => {
            let parsed = parse_generated(&answer.text);
            tracing::debug!(
                company = %profile.name,
                requested = count,
                parsed = parsed.len(),
                "generative query path produced queries"
            );
            parsed
        }
        Err(e) => {
            tracing::warn!(
                company = %profile.name,
                error = %e,
                "query generation model failed, using template fallback"
            );
            Vec::new()
        }
    };

    // Dedupe before the shortfall check: a model that repeats itself is a
    // failed generation and must be topped up, not passed through.
    dedupe_by_text(&mut queries);
    if queries.len() < count {
        queries.extend(fallback_queries(profile, count.max(Dimension::ALL.len())));
        dedupe_by_text(&mut queries);
    }

    queries.truncate(count.max(1));
    queries
}

/// Deterministic template queries, cycling through all dimensions evenly.
///
/// Never fails and never returns an empty set; distinct templates bound the
/// output, so very large `count` values return every distinct query available
/// (always at least one per dimension).
#[must_use]
pub fn fallback_queries(profile: &CompanyProfile, count: usize) -> Vec<Query> {
    let mut queries = Vec::new();
    let mut round = 0usize;
    // Three template rounds per dimension is the full distinct set.
    while queries.len() < count && round < 3 {
        for dimension in Dimension::ALL {
            if queries.len() >= count {
                break;
            }
            queries.push(Query::new(template(profile, dimension, round), dimension));
        }
        round += 1;
    }
    dedupe_by_text(&mut queries);
    queries
}

fn template(profile: &CompanyProfile, dimension: Dimension, round: usize) -> String {
    let name = profile.name.trim();
    let industry = profile.industry_label();
    let offering = profile
        .services
        .first()
        .or_else(|| profile.products.first())
        .map_or_else(|| industry.to_owned(), |s| s.clone());
    let pain_point = profile
        .pain_points
        .first()
        .map_or_else(|| format!("common {industry} problems"), |p| p.clone());

    match (dimension, round) {
        (Dimension::Branded, 0) => format!("What is {name} and what does it offer?"),
        (Dimension::Branded, 1) => format!("Is {name} a reputable {industry} company?"),
        (Dimension::Branded, _) => format!("What do customers say about {name}?"),

        (Dimension::ServiceSpecific, 0) => {
            format!("Which companies offer the best {offering}?")
        }
        (Dimension::ServiceSpecific, 1) => {
            format!("Who are the top providers of {offering}?")
        }
        (Dimension::ServiceSpecific, _) => {
            format!("Where can I find reliable {offering} vendors?")
        }

        (Dimension::Comparison, 0) => {
            format!("How does {name} compare to other {industry} companies?")
        }
        (Dimension::Comparison, 1) => {
            format!("What are the main alternatives to {name}?")
        }
        (Dimension::Comparison, _) => {
            format!("Which {industry} companies compete with {name}?")
        }

        (Dimension::Recommendation, 0) => {
            format!("Which {industry} company would you recommend?")
        }
        (Dimension::Recommendation, 1) => {
            format!("What is the best {industry} company for a small business?")
        }
        (Dimension::Recommendation, _) => {
            format!("Who should I choose for {offering}?")
        }

        (Dimension::ProblemSolving, 0) => format!("How do I deal with {pain_point}?"),
        (Dimension::ProblemSolving, 1) => {
            format!("What tools help with {pain_point}?")
        }
        (Dimension::ProblemSolving, _) => {
            format!("Which companies solve {pain_point} well?")
        }

        (Dimension::Trend, 0) => format!("What are the latest trends in {industry}?"),
        (Dimension::Trend, 1) => {
            format!("How is the {industry} market changing this year?")
        }
        (Dimension::Trend, _) => {
            format!("Which {industry} companies are growing fastest?")
        }
    }
}

/// Prompt instructing the model to emit `dimension: query` lines.
fn generation_prompt(profile: &CompanyProfile, count: usize) -> String {
    let tags = Dimension::ALL
        .iter()
        .map(|d| d.tag())
        .collect::<Vec<_>>()
        .join(", ");
    format!(
        "Generate {count} natural-language search queries a potential customer \
         of a {industry} company like \"{name}\" might ask an AI assistant. \
         Spread them evenly across these categories: {tags}. \
         Output one query per line in the form `category: query text` with no \
         other commentary. Do not mention \"{name}\" except in branded or \
         comparison queries.",
        industry = profile.industry_label(),
        name = profile.name.trim(),
    )
}

/// Parses `dimension: query` lines, tolerating list numbering and bullets.
/// Unknown tags and too-short lines are dropped.
fn parse_generated(text: &str) -> Vec<Query> {
    let mut queries = Vec::new();
    for line in text.lines() {
        let line = line
            .trim()
            .trim_start_matches(['-', '*', '•'])
            .trim_start_matches(|c: char| c.is_ascii_digit())
            .trim_start_matches(['.', ')'])
            .trim();
        let Some((tag, rest)) = line.split_once(':') else {
            continue;
        };
        let Some(dimension) = Dimension::from_tag(tag) else {
            continue;
        };
        let query_text = rest.trim().trim_matches('`').trim();
        if query_text.len() < MIN_QUERY_LEN {
            continue;
        }
        queries.push(Query::new(query_text, dimension));
    }
    queries
}

/// Removes duplicate query text (exact match), keeping first occurrence.
fn dedupe_by_text(queries: &mut Vec<Query>) {
    let mut seen = std::collections::HashSet::new();
    queries.retain(|q| seen.insert(q.text.clone()));
}
