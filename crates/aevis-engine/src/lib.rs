//! Visibility scoring engine for aevis.
//!
//! Generates a battery of probe queries for a company, dispatches each query
//! to each configured answer platform concurrently, scores every response for
//! mentions of the company, and folds the results into a single
//! [`VisibilityReport`] with platform-level and dimension-level breakdowns.

pub mod aggregator;
pub mod dispatcher;
pub mod error;
pub mod pipeline;
pub mod prober;
pub mod queries;
pub mod scorer;
pub mod types;

pub use aggregator::{aggregate, BandThresholds};
pub use dispatcher::dispatch;
pub use error::EngineError;
pub use pipeline::{run_visibility, EngineOptions};
pub use prober::{probe, ProbeContext};
pub use queries::generate_queries;
pub use scorer::{score, ScoringWeights, MENTION_CAP};
pub use types::{
    Band, Dimension, DimensionStats, ErrorKind, MentionAnalysis, MentionType, PlatformStats,
    ProbeResult, Query, SlotOutcome, VisibilityReport,
};
