//! Order-insensitive aggregation of scored probe slots into a report.
//!
//! The fold is pure and commutative over the slot set: the dispatcher hands
//! over a completed collection, and any arrival order produces the same
//! [`VisibilityReport`] for the same set of outcomes.

use std::collections::BTreeMap;

use aevis_core::{Mode, PlatformSpec};
use chrono::Utc;
use uuid::Uuid;

use crate::error::EngineError;
use crate::types::{
    Band, DimensionStats, PlatformStats, Query, SlotOutcome, VisibilityReport,
};

/// Visibility-score cutoffs for each band, checked top-down.
///
/// Must be strictly decreasing within `(0, 100]`; scores below `limited`
/// classify as [`Band::Poor`], so every score in `[0, 100]` maps to exactly
/// one band.
#[derive(Debug, Clone)]
pub struct BandThresholds {
    pub excellent: f64,
    pub good: f64,
    pub fair: f64,
    pub limited: f64,
}

impl Default for BandThresholds {
    fn default() -> Self {
        Self {
            excellent: 80.0,
            good: 60.0,
            fair: 40.0,
            limited: 20.0,
        }
    }
}

impl BandThresholds {
    /// Checks strict monotonicity and range.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::InvalidScoringConfig`] describing the violation.
    pub fn validate(&self) -> Result<(), EngineError> {
        let ordered = self.excellent > self.good
            && self.good > self.fair
            && self.fair > self.limited
            && self.limited > 0.0
            && self.excellent <= 100.0;
        if ordered {
            Ok(())
        } else {
            Err(EngineError::InvalidScoringConfig(
                "band thresholds must satisfy 100 >= excellent > good > fair > limited > 0"
                    .to_owned(),
            ))
        }
    }

    /// Maps a visibility score to its band. Total over `[0, 100]`.
    #[must_use]
    pub fn classify(&self, score: f64) -> Band {
        if score >= self.excellent {
            Band::Excellent
        } else if score >= self.good {
            Band::Good
        } else if score >= self.fair {
            Band::Fair
        } else if score >= self.limited {
            Band::Limited
        } else {
            Band::Poor
        }
    }
}

/// Folds every slot outcome into the final [`VisibilityReport`].
///
/// Errored slots count toward the denominator as "no mention": a platform
/// outage lowers visibility instead of hiding it, and shows up in that
/// platform's error count. `DimensionStats.queries` counts each generated
/// query once, independent of platform outcomes.
#[must_use]
pub fn aggregate(
    company: &str,
    mode: Mode,
    queries: &[Query],
    platforms: &[PlatformSpec],
    outcomes: Vec<SlotOutcome>,
    thresholds: &BandThresholds,
    results_cap: usize,
) -> VisibilityReport {
    let mut platform_stats: BTreeMap<String, PlatformStats> = platforms
        .iter()
        .map(|p| (p.id.clone(), PlatformStats::default()))
        .collect();
    let mut dimension_stats: BTreeMap<_, DimensionStats> = BTreeMap::new();

    for query in queries {
        dimension_stats.entry(query.dimension).or_default().queries += 1;
    }

    let mut mentioning_slots = 0u64;
    let mut quality_total = 0.0f64;
    let mut analyses = Vec::new();

    for outcome in outcomes {
        match outcome {
            SlotOutcome::Errored {
                platform_id, ..
            } => {
                platform_stats.entry(platform_id).or_default().errors += 1;
            }
            SlotOutcome::Scored {
                analysis,
                tokens_used,
            } => {
                let stats = platform_stats.entry(analysis.platform_id.clone()).or_default();
                stats.responses += 1;
                stats.tokens_used += tokens_used;
                if analysis.capped_mention_count > 0 {
                    stats.mentions += analysis.capped_mention_count as u64;
                    stats.quality_sum += analysis.quality_score;
                    dimension_stats
                        .entry(analysis.query.dimension)
                        .or_default()
                        .mentions += analysis.capped_mention_count as u64;
                    mentioning_slots += 1;
                    quality_total += analysis.quality_score;
                }
                analyses.push(analysis);
            }
        }
    }

    let total_mentions: u64 = platform_stats.values().map(|s| s.mentions).sum();
    let total_slots = queries.len() * platforms.len();

    #[allow(clippy::cast_precision_loss)]
    let visibility_score = if total_slots == 0 {
        0.0
    } else {
        (total_mentions as f64 / total_slots as f64 * 100.0).min(100.0)
    };

    #[allow(clippy::cast_precision_loss)]
    let quality_score = if mentioning_slots == 0 {
        0.0
    } else {
        quality_total / mentioning_slots as f64
    };

    // Stable audit prefix regardless of arrival order.
    analyses.sort_by(|a, b| {
        (a.query.text.as_str(), a.platform_id.as_str())
            .cmp(&(b.query.text.as_str(), b.platform_id.as_str()))
    });
    analyses.truncate(results_cap);

    VisibilityReport {
        run_id: Uuid::new_v4(),
        company: company.to_owned(),
        mode,
        generated_at: Utc::now(),
        visibility_score,
        quality_score,
        band: thresholds.classify(visibility_score),
        total_mentions,
        total_slots,
        platform_stats,
        dimension_stats,
        query_results: analyses,
    }
}
