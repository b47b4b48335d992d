use std::collections::HashSet;
use std::path::Path;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::ConfigError;

/// Coverage tier for a visibility run.
///
/// `Fast` probes the small low-latency platform subset with a reduced query
/// count; `Full` probes every configured platform with the full query count.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    Fast,
    Full,
}

impl std::fmt::Display for Mode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Mode::Fast => write!(f, "fast"),
            Mode::Full => write!(f, "full"),
        }
    }
}

impl FromStr for Mode {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "fast" => Ok(Mode::Fast),
            "full" => Ok(Mode::Full),
            other => Err(ConfigError::Validation(format!(
                "unknown mode '{other}'; expected 'fast' or 'full'"
            ))),
        }
    }
}

/// One target answer platform, resolved from `platforms.yaml` at startup.
///
/// `has_native_search` means the platform's model answers with its own
/// retrieval; `requires_search_tool` means the prober must pair the call
/// with the injected web-search collaborator. A platform declares exactly
/// one of the two.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlatformSpec {
    pub id: String,
    pub model_ref: String,
    pub has_native_search: bool,
    pub requires_search_tool: bool,
    /// Whether this platform is probed in fast mode. Full mode probes all.
    #[serde(default)]
    pub fast_mode: bool,
}

#[derive(Debug, Deserialize)]
pub struct PlatformsFile {
    pub platforms: Vec<PlatformSpec>,
}

impl PlatformsFile {
    /// Returns the platforms included in the given mode.
    ///
    /// `Full` returns the complete configured set; `Fast` returns only the
    /// platforms flagged `fast_mode` (validation guarantees at least one).
    #[must_use]
    pub fn platforms_for(&self, mode: Mode) -> Vec<PlatformSpec> {
        match mode {
            Mode::Full => self.platforms.clone(),
            Mode::Fast => self
                .platforms
                .iter()
                .filter(|p| p.fast_mode)
                .cloned()
                .collect(),
        }
    }
}

/// Load and validate the platform registry from a YAML file.
///
/// # Errors
///
/// Returns `ConfigError` if the file cannot be read, parsed, or fails validation.
pub fn load_platforms(path: &Path) -> Result<PlatformsFile, ConfigError> {
    let content = std::fs::read_to_string(path).map_err(|e| ConfigError::PlatformsFileIo {
        path: path.display().to_string(),
        source: e,
    })?;

    let platforms_file: PlatformsFile =
        serde_yaml::from_str(&content).map_err(ConfigError::PlatformsFileParse)?;

    validate_platforms(&platforms_file)?;

    Ok(platforms_file)
}

fn validate_platforms(platforms_file: &PlatformsFile) -> Result<(), ConfigError> {
    if platforms_file.platforms.is_empty() {
        return Err(ConfigError::Validation(
            "platforms file must configure at least one platform".to_string(),
        ));
    }

    let mut seen_ids = HashSet::new();
    let mut has_fast = false;

    for platform in &platforms_file.platforms {
        if platform.id.trim().is_empty() {
            return Err(ConfigError::Validation(
                "platform id must be non-empty".to_string(),
            ));
        }
        if platform.model_ref.trim().is_empty() {
            return Err(ConfigError::Validation(format!(
                "platform '{}' has an empty model_ref",
                platform.id
            )));
        }

        if platform.has_native_search == platform.requires_search_tool {
            return Err(ConfigError::Validation(format!(
                "platform '{}' must set exactly one of has_native_search / requires_search_tool",
                platform.id
            )));
        }

        let lower_id = platform.id.to_lowercase();
        if !seen_ids.insert(lower_id) {
            return Err(ConfigError::Validation(format!(
                "duplicate platform id: '{}'",
                platform.id
            )));
        }

        has_fast |= platform.fast_mode;
    }

    if !has_fast {
        return Err(ConfigError::Validation(
            "at least one platform must be flagged fast_mode".to_string(),
        ));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn platform(id: &str, native: bool, fast: bool) -> PlatformSpec {
        PlatformSpec {
            id: id.to_string(),
            model_ref: format!("{id}-model"),
            has_native_search: native,
            requires_search_tool: !native,
            fast_mode: fast,
        }
    }

    #[test]
    fn mode_parses_case_insensitively() {
        assert_eq!("fast".parse::<Mode>().unwrap(), Mode::Fast);
        assert_eq!("Full".parse::<Mode>().unwrap(), Mode::Full);
    }

    #[test]
    fn mode_rejects_unknown() {
        let err = "turbo".parse::<Mode>().unwrap_err();
        assert!(err.to_string().contains("unknown mode"));
    }

    #[test]
    fn fast_mode_filters_platforms() {
        let file = PlatformsFile {
            platforms: vec![
                platform("perplexity", true, true),
                platform("chatgpt", true, false),
                platform("gemini", false, false),
            ],
        };
        let fast = file.platforms_for(Mode::Fast);
        assert_eq!(fast.len(), 1);
        assert_eq!(fast[0].id, "perplexity");
    }

    #[test]
    fn full_mode_returns_all_platforms() {
        let file = PlatformsFile {
            platforms: vec![
                platform("perplexity", true, true),
                platform("chatgpt", true, false),
                platform("gemini", false, false),
            ],
        };
        assert_eq!(file.platforms_for(Mode::Full).len(), 3);
    }

    #[test]
    fn validate_rejects_empty_registry() {
        let file = PlatformsFile { platforms: vec![] };
        let err = validate_platforms(&file).unwrap_err();
        assert!(err.to_string().contains("at least one platform"));
    }

    #[test]
    fn validate_rejects_empty_id() {
        let file = PlatformsFile {
            platforms: vec![platform("  ", true, true)],
        };
        let err = validate_platforms(&file).unwrap_err();
        assert!(err.to_string().contains("non-empty"));
    }

    #[test]
    fn validate_rejects_duplicate_id() {
        let file = PlatformsFile {
            platforms: vec![platform("ChatGPT", true, true), platform("chatgpt", true, false)],
        };
        let err = validate_platforms(&file).unwrap_err();
        assert!(err.to_string().contains("duplicate platform id"));
    }

    #[test]
    fn validate_rejects_conflicting_search_flags() {
        let mut bad = platform("claude", false, true);
        bad.has_native_search = true;
        bad.requires_search_tool = true;
        let file = PlatformsFile {
            platforms: vec![bad],
        };
        let err = validate_platforms(&file).unwrap_err();
        assert!(err.to_string().contains("exactly one"));
    }

    #[test]
    fn validate_rejects_no_fast_platform() {
        let file = PlatformsFile {
            platforms: vec![platform("chatgpt", true, false)],
        };
        let err = validate_platforms(&file).unwrap_err();
        assert!(err.to_string().contains("fast_mode"));
    }

    #[test]
    fn load_platforms_from_real_file() {
        let path = Path::new(env!("CARGO_MANIFEST_DIR"))
            .join("..")
            .join("..")
            .join("config")
            .join("platforms.yaml");
        assert!(
            path.exists(),
            "platforms.yaml missing at {path:?}, required for this test"
        );
        let result = load_platforms(&path);
        assert!(result.is_ok(), "failed to load platforms.yaml: {result:?}");
        let file = result.unwrap();
        assert!(!file.platforms.is_empty());
        assert!(!file.platforms_for(Mode::Fast).is_empty());
    }
}
