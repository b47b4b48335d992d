use std::path::PathBuf;

use crate::app_config::AppConfig;
use crate::ConfigError;

const DEFAULT_PLATFORMS_PATH: &str = "./config/platforms.yaml";

/// Resolves the platform registry path from `AEVIS_PLATFORMS_PATH`, falling
/// back to the default. For callers that need the registry without the rest
/// of the configuration.
#[must_use]
pub fn platforms_path_from_env() -> PathBuf {
    std::env::var("AEVIS_PLATFORMS_PATH")
        .map_or_else(|_| PathBuf::from(DEFAULT_PLATFORMS_PATH), PathBuf::from)
}

/// Load application configuration from environment variables.
///
/// Calls `dotenvy::dotenv().ok()` to load `.env` files before reading env vars.
///
/// # Errors
///
/// Returns `ConfigError` if required env vars are missing or values are invalid.
pub fn load_app_config() -> Result<AppConfig, ConfigError> {
    dotenvy::dotenv().ok();
    load_app_config_from_env()
}

/// Load application configuration from environment variables already in the process.
///
/// Unlike [`load_app_config`], this does NOT load `.env` files, which keeps it usable for testing
/// or when the caller manages env setup.
///
/// # Errors
///
/// Returns `ConfigError` if required env vars are missing or values are invalid.
pub fn load_app_config_from_env() -> Result<AppConfig, ConfigError> {
    build_app_config(|key| std::env::var(key))
}

/// Build application configuration using the provided env-var lookup function.
///
/// This is the core parsing/validation logic, decoupled from the actual environment
/// so it can be tested with a pure `HashMap` lookup, no `set_var`/`remove_var` needed.
fn build_app_config<F>(lookup: F) -> Result<AppConfig, ConfigError>
where
    F: Fn(&str) -> Result<String, std::env::VarError>,
{
    let require = |var: &str| -> Result<String, ConfigError> {
        lookup(var).map_err(|_| ConfigError::MissingEnvVar(var.to_string()))
    };

    let or_default = |var: &str, default: &str| -> String {
        lookup(var).unwrap_or_else(|_| default.to_string())
    };

    let parse_u32 = |var: &str, default: &str| -> Result<u32, ConfigError> {
        let raw = or_default(var, default);
        raw.parse::<u32>().map_err(|e| ConfigError::InvalidEnvVar {
            var: var.to_string(),
            reason: e.to_string(),
        })
    };

    let parse_u64 = |var: &str, default: &str| -> Result<u64, ConfigError> {
        let raw = or_default(var, default);
        raw.parse::<u64>().map_err(|e| ConfigError::InvalidEnvVar {
            var: var.to_string(),
            reason: e.to_string(),
        })
    };

    let parse_usize = |var: &str, default: &str| -> Result<usize, ConfigError> {
        let raw = or_default(var, default);
        raw.parse::<usize>()
            .map_err(|e| ConfigError::InvalidEnvVar {
                var: var.to_string(),
                reason: e.to_string(),
            })
    };

    let parse_nonzero_usize = |var: &str, default: &str| -> Result<usize, ConfigError> {
        let value = parse_usize(var, default)?;
        if value == 0 {
            return Err(ConfigError::InvalidEnvVar {
                var: var.to_string(),
                reason: "must be at least 1".to_string(),
            });
        }
        Ok(value)
    };

    let answer_api_key = require("AEVIS_ANSWER_API_KEY")?;
    let search_api_key = lookup("AEVIS_SEARCH_API_KEY").ok();
    let answer_base_url = lookup("AEVIS_ANSWER_BASE_URL").ok();
    let search_base_url = lookup("AEVIS_SEARCH_BASE_URL").ok();

    let log_level = or_default("AEVIS_LOG_LEVEL", "info");
    let platforms_path = PathBuf::from(or_default("AEVIS_PLATFORMS_PATH", DEFAULT_PLATFORMS_PATH));

    let request_timeout_secs = parse_u64("AEVIS_REQUEST_TIMEOUT_SECS", "30")?;
    let probe_timeout_secs = parse_u64("AEVIS_PROBE_TIMEOUT_SECS", "45")?;
    let max_concurrent_probes = parse_nonzero_usize("AEVIS_MAX_CONCURRENT_PROBES", "5")?;
    let max_concurrent_companies = parse_nonzero_usize("AEVIS_MAX_CONCURRENT_COMPANIES", "2")?;
    let max_retries = parse_u32("AEVIS_MAX_RETRIES", "2")?;
    let retry_backoff_base_ms = parse_u64("AEVIS_RETRY_BACKOFF_BASE_MS", "1000")?;
    let query_count_fast = parse_nonzero_usize("AEVIS_QUERY_COUNT_FAST", "6")?;
    let query_count_full = parse_nonzero_usize("AEVIS_QUERY_COUNT_FULL", "18")?;
    let report_results_cap = parse_usize("AEVIS_REPORT_RESULTS_CAP", "50")?;

    Ok(AppConfig {
        answer_api_key,
        search_api_key,
        answer_base_url,
        search_base_url,
        log_level,
        platforms_path,
        request_timeout_secs,
        probe_timeout_secs,
        max_concurrent_probes,
        max_concurrent_companies,
        max_retries,
        retry_backoff_base_ms,
        query_count_fast,
        query_count_full,
        report_results_cap,
    })
}
