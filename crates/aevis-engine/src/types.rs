use std::collections::BTreeMap;

use aevis_core::Mode;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Semantic category of a probe query, used for reporting breakdowns.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum Dimension {
    Branded,
    ServiceSpecific,
    Comparison,
    Recommendation,
    ProblemSolving,
    Trend,
}

impl Dimension {
    pub const ALL: [Dimension; 6] = [
        Dimension::Branded,
        Dimension::ServiceSpecific,
        Dimension::Comparison,
        Dimension::Recommendation,
        Dimension::ProblemSolving,
        Dimension::Trend,
    ];

    /// Stable lowercase tag, matching the serde representation.
    #[must_use]
    pub fn tag(self) -> &'static str {
        match self {
            Dimension::Branded => "branded",
            Dimension::ServiceSpecific => "service_specific",
            Dimension::Comparison => "comparison",
            Dimension::Recommendation => "recommendation",
            Dimension::ProblemSolving => "problem_solving",
            Dimension::Trend => "trend",
        }
    }

    /// Parses the lowercase tag form, tolerating hyphens for underscores.
    #[must_use]
    pub fn from_tag(tag: &str) -> Option<Self> {
        let normalised = tag.trim().to_lowercase().replace('-', "_");
        Dimension::ALL
            .into_iter()
            .find(|d| d.tag() == normalised)
    }
}

impl std::fmt::Display for Dimension {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.tag())
    }
}

/// One probe query, generated once per run and immutable after that.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Query {
    pub text: String,
    pub dimension: Dimension,
}

impl Query {
    #[must_use]
    pub fn new(text: impl Into<String>, dimension: Dimension) -> Self {
        Self {
            text: text.into(),
            dimension,
        }
    }
}

/// Why a probe slot failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    Timeout,
    Provider,
    RateLimited,
}

/// Outcome of probing one `(query, platform)` pair.
///
/// Exactly one of `response_text` / `error` is populated; the constructors
/// are the only way to build one, so the invariant holds by construction.
#[derive(Debug, Clone)]
pub struct ProbeResult {
    pub query: Query,
    pub platform_id: String,
    pub response_text: Option<String>,
    pub tokens_used: u64,
    pub error: Option<ErrorKind>,
}

impl ProbeResult {
    #[must_use]
    pub fn success(query: Query, platform_id: &str, text: String, tokens_used: u64) -> Self {
        Self {
            query,
            platform_id: platform_id.to_owned(),
            response_text: Some(text),
            tokens_used,
            error: None,
        }
    }

    #[must_use]
    pub fn failure(query: Query, platform_id: &str, kind: ErrorKind) -> Self {
        Self {
            query,
            platform_id: platform_id.to_owned(),
            response_text: None,
            tokens_used: 0,
            error: Some(kind),
        }
    }

    #[must_use]
    pub fn is_error(&self) -> bool {
        self.error.is_some()
    }
}

/// How prominently a response mentioned the company, best first.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum MentionType {
    None,
    MentionedInContext,
    ListedOption,
    TopOption,
    PrimaryRecommendation,
}

/// Per-response mention analysis, derived purely from the response text.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MentionAnalysis {
    pub query: Query,
    pub platform_id: String,
    pub raw_mention_count: usize,
    pub capped_mention_count: usize,
    pub quality_score: f64,
    pub mention_type: MentionType,
    /// 1-based position within a list structure, when one was detected.
    pub position: Option<usize>,
    pub context_snippet: String,
    pub competitor_mentions: BTreeMap<String, usize>,
}

/// One scored slot of the `queries × platforms` matrix, as fed to the
/// aggregator. Errored slots carry no analysis; they count as "no mention"
/// without shrinking the denominator.
#[derive(Debug, Clone)]
pub enum SlotOutcome {
    Scored {
        analysis: MentionAnalysis,
        tokens_used: u64,
    },
    Errored {
        query: Query,
        platform_id: String,
        kind: ErrorKind,
    },
}

/// Running per-platform counters, owned exclusively by the aggregator fold.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PlatformStats {
    pub mentions: u64,
    pub quality_sum: f64,
    pub responses: u64,
    pub errors: u64,
    pub tokens_used: u64,
}

/// Running per-dimension counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DimensionStats {
    pub mentions: u64,
    pub queries: u64,
}

/// Categorical visibility band derived from the visibility score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Band {
    Excellent,
    Good,
    Fair,
    Limited,
    Poor,
}

impl std::fmt::Display for Band {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            Band::Excellent => "excellent",
            Band::Good => "good",
            Band::Fair => "fair",
            Band::Limited => "limited",
            Band::Poor => "poor",
        };
        write!(f, "{label}")
    }
}

/// Final immutable snapshot of one visibility run, handed to the result sink.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VisibilityReport {
    pub run_id: Uuid,
    pub company: String,
    pub mode: Mode,
    pub generated_at: DateTime<Utc>,
    pub visibility_score: f64,
    pub quality_score: f64,
    pub band: Band,
    pub total_mentions: u64,
    pub total_slots: usize,
    pub platform_stats: BTreeMap<String, PlatformStats>,
    pub dimension_stats: BTreeMap<Dimension, DimensionStats>,
    /// Bounded, order-stable prefix of individual analyses for auditability.
    pub query_results: Vec<MentionAnalysis>,
}
