use thiserror::Error;

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("all {attempted} probe slots failed, no platform returned a response")]
    AllPlatformsFailed { attempted: usize },

    #[error("company name must be non-empty")]
    EmptyCompanyName,

    #[error("no platforms configured for the selected mode")]
    NoPlatforms,

    #[error("invalid scoring configuration: {0}")]
    InvalidScoringConfig(String),
}
