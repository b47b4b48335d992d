//! Shared configuration and domain inputs for aevis.
//!
//! Holds the environment-driven [`AppConfig`], the YAML platform registry,
//! and the [`CompanyProfile`] input consumed by the visibility engine.

use thiserror::Error;

pub mod app_config;
pub mod config;
pub mod platforms;
pub mod profile;

pub use app_config::AppConfig;
pub use config::{load_app_config, load_app_config_from_env, platforms_path_from_env};
pub use platforms::{load_platforms, Mode, PlatformSpec, PlatformsFile};
pub use profile::{load_profiles, CompanyProfile, ProfilesFile};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required environment variable: {0}")]
    MissingEnvVar(String),

    #[error("invalid value for {var}: {reason}")]
    InvalidEnvVar { var: String, reason: String },

    #[error("failed to read platforms file at {path}: {source}")]
    PlatformsFileIo {
        path: String,
        source: std::io::Error,
    },

    #[error("failed to parse platforms file: {0}")]
    PlatformsFileParse(serde_yaml::Error),

    #[error("failed to read profiles file at {path}: {source}")]
    ProfilesFileIo {
        path: String,
        source: std::io::Error,
    },

    #[error("failed to parse profiles file: {0}")]
    ProfilesFileParse(serde_yaml::Error),

    #[error("validation error: {0}")]
    Validation(String),
}
