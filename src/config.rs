// Global configuration constants plus the per-run crawl configuration.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

use crate::relevance::DEFAULT_KEYWORD_PATTERN;
use crate::url_utils::DEFAULT_DENY_FILETYPES;

pub struct Config;

impl Config {
    // Identity
    pub const DEFAULT_USER_AGENT: &'static str = "ModelCardBot/0.1 (+research; polite crawl)";

    // Crawl budgets
    pub const MAX_PAGES_TOTAL: usize = 150;
    pub const MAX_PAGES_PER_DOMAIN: usize = 50;
    pub const MAX_DEPTH: u32 = 3;
    pub const TIME_BUDGET_SECS: u64 = 120;

    // Politeness and network
    pub const CRAWL_DELAY_MS: u64 = 1000;
    pub const FETCH_TIMEOUT_SECS: u64 = 10;

    // Page summaries
    pub const BODY_PREVIEW_CHARS: usize = 500;
    pub const SHORT_CONTENT_CHARS: usize = 100;
    pub const MAX_FILENAME_CHARS: usize = 60;
    pub const UNKNOWN_MODEL_NAME: &'static str = "Unknown Model";
    pub const DEFAULT_DEVELOPER_NAME: &'static str = "Unknown Developer";

    // Extraction
    pub const GEMINI_API_KEY_ENV: &'static str = "GEMINI_API_KEY";
    pub const GEMINI_BASE_URL: &'static str = "https://generativelanguage.googleapis.com/v1beta";
    pub const GEMINI_MODEL: &'static str = "gemini-2.0-flash";
    pub const EXTRACTION_TIMEOUT_SECS: u64 = 60;
    pub const FIELDS_FILE: &'static str = "list_of_wanted_fields.csv";
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error reading {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Invalid config file: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Invalid pattern: {0}")]
    Pattern(#[from] regex::Error),
}

/// Static crawl configuration, read once at startup.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CrawlerConfig {
    /// Seed URLs, crawled first and in order
    pub seeds: Vec<String>,
    /// Registrable domains the crawl may visit; empty allows all
    pub allowed_domains: Vec<String>,
    pub keyword_pattern: String,
    /// File extensions never fetched
    pub deny_filetypes: Vec<String>,
    pub max_pages_total: usize,
    pub max_pages_per_domain: usize,
    pub max_depth: u32,
    pub time_budget_secs: u64,
    pub crawl_delay_ms: u64,
    pub timeout_secs: u64,
    pub user_agent: String,
    /// Where extracted cards and logs are written
    pub output_dir: PathBuf,
    pub fields_file: PathBuf,
    pub gemini_model: String,
    pub gemini_base_url: String,
}

impl Default for CrawlerConfig {
    fn default() -> Self {
        Self {
            seeds: vec![
                "https://developers.google.com/health-ai-developer-foundations/".to_string(),
                "https://huggingface.co/google/derm-foundation".to_string(),
                concat!(
                    "https://research.google/blog/",
                    "health-specific-embedding-tools-for-dermatology-and-pathology/"
                )
                .to_string(),
            ],
            allowed_domains: vec![
                "google.com".to_string(),
                "huggingface.co".to_string(),
                "research.google".to_string(),
            ],
            keyword_pattern: DEFAULT_KEYWORD_PATTERN.to_string(),
            deny_filetypes: DEFAULT_DENY_FILETYPES.iter().map(|s| s.to_string()).collect(),
            max_pages_total: Config::MAX_PAGES_TOTAL,
            max_pages_per_domain: Config::MAX_PAGES_PER_DOMAIN,
            max_depth: Config::MAX_DEPTH,
            time_budget_secs: Config::TIME_BUDGET_SECS,
            crawl_delay_ms: Config::CRAWL_DELAY_MS,
            timeout_secs: Config::FETCH_TIMEOUT_SECS,
            user_agent: Config::DEFAULT_USER_AGENT.to_string(),
            output_dir: PathBuf::from("./output"),
            fields_file: PathBuf::from(Config::FIELDS_FILE),
            gemini_model: Config::GEMINI_MODEL.to_string(),
            gemini_base_url: Config::GEMINI_BASE_URL.to_string(),
        }
    }
}

impl CrawlerConfig {
    /// Load a JSON config file. Missing keys keep their defaults.
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json_str(&raw)
    }

    pub fn from_json_str(raw: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(raw)?)
    }

    pub fn politeness_delay(&self) -> Duration {
        Duration::from_millis(self.crawl_delay_ms)
    }

    pub fn fetch_timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn time_budget(&self) -> Duration {
        Duration::from_secs(self.time_budget_secs)
    }
}
