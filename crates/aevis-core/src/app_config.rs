use std::path::PathBuf;

#[derive(Clone)]
pub struct AppConfig {
    pub answer_api_key: String,
    pub search_api_key: Option<String>,
    pub answer_base_url: Option<String>,
    pub search_base_url: Option<String>,
    pub log_level: String,
    pub platforms_path: PathBuf,
    pub request_timeout_secs: u64,
    pub probe_timeout_secs: u64,
    pub max_concurrent_probes: usize,
    pub max_concurrent_companies: usize,
    pub max_retries: u32,
    pub retry_backoff_base_ms: u64,
    pub query_count_fast: usize,
    pub query_count_full: usize,
    pub report_results_cap: usize,
}

impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field("answer_api_key", &"[redacted]")
            .field(
                "search_api_key",
                &self.search_api_key.as_ref().map(|_| "[redacted]"),
            )
            .field("answer_base_url", &self.answer_base_url)
            .field("search_base_url", &self.search_base_url)
            .field("log_level", &self.log_level)
            .field("platforms_path", &self.platforms_path)
            .field("request_timeout_secs", &self.request_timeout_secs)
            .field("probe_timeout_secs", &self.probe_timeout_secs)
            .field("max_concurrent_probes", &self.max_concurrent_probes)
            .field("max_concurrent_companies", &self.max_concurrent_companies)
            .field("max_retries", &self.max_retries)
            .field("retry_backoff_base_ms", &self.retry_backoff_base_ms)
            .field("query_count_fast", &self.query_count_fast)
            .field("query_count_full", &self.query_count_full)
            .field("report_results_cap", &self.report_results_cap)
            .finish()
    }
}
