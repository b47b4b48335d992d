use std::collections::HashSet;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::ConfigError;

/// A company whose answer-engine visibility is being measured.
///
/// Produced fully-formed by an external enrichment step; consumed read-only.
/// Only `name` is required to be non-empty; the engine uses the rest as
/// hints for query generation and competitor tracking.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompanyProfile {
    pub name: String,
    #[serde(default)]
    pub website: Option<String>,
    #[serde(default)]
    pub industry: Option<String>,
    #[serde(default)]
    pub products: Vec<String>,
    #[serde(default)]
    pub services: Vec<String>,
    #[serde(default)]
    pub pain_points: Vec<String>,
    #[serde(default)]
    pub competitors: Vec<String>,
}

impl CompanyProfile {
    /// Generate a URL-safe slug from the company name.
    #[must_use]
    pub fn slug(&self) -> String {
        self.name
            .to_lowercase()
            .chars()
            .map(|c| {
                if c.is_ascii_alphanumeric() || c == '-' {
                    c
                } else if c == ' ' {
                    '-'
                } else {
                    '\0'
                }
            })
            .filter(|&c| c != '\0')
            .collect::<String>()
            .split('-')
            .filter(|s| !s.is_empty())
            .collect::<Vec<_>>()
            .join("-")
    }

    /// Industry label used in generated query text, defaulting when absent.
    #[must_use]
    pub fn industry_label(&self) -> &str {
        self.industry.as_deref().unwrap_or("business")
    }
}

#[derive(Debug, Deserialize)]
pub struct ProfilesFile {
    pub companies: Vec<CompanyProfile>,
}

/// Load and validate company profiles from a YAML file.
///
/// # Errors
///
/// Returns `ConfigError` if the file cannot be read, parsed, or fails validation.
pub fn load_profiles(path: &Path) -> Result<ProfilesFile, ConfigError> {
    let content = std::fs::read_to_string(path).map_err(|e| ConfigError::ProfilesFileIo {
        path: path.display().to_string(),
        source: e,
    })?;

    let profiles_file: ProfilesFile =
        serde_yaml::from_str(&content).map_err(ConfigError::ProfilesFileParse)?;

    validate_profiles(&profiles_file)?;

    Ok(profiles_file)
}

fn validate_profiles(profiles_file: &ProfilesFile) -> Result<(), ConfigError> {
    if profiles_file.companies.is_empty() {
        return Err(ConfigError::Validation(
            "profiles file must contain at least one company".to_string(),
        ));
    }

    let mut seen_slugs = HashSet::new();

    for company in &profiles_file.companies {
        if company.name.trim().is_empty() {
            return Err(ConfigError::Validation(
                "company name must be non-empty".to_string(),
            ));
        }

        let slug = company.slug();
        if !seen_slugs.insert(slug.clone()) {
            return Err(ConfigError::Validation(format!(
                "duplicate company slug: '{}' (from company '{}')",
                slug, company.name
            )));
        }
    }

    Ok(())
}
