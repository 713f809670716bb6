pub mod bfs_crawler;
pub mod cli;
pub mod config;
pub mod export;
pub mod extraction;
pub mod frontier;
pub mod logging;
pub mod model_store;
pub mod models;
pub mod network;
pub mod parser;
pub mod pipeline;
pub mod relevance;
pub mod robots;
pub mod url_utils;

// Re-export main types for library usage
pub use bfs_crawler::{BfsCrawler, BfsCrawlerResult, CrawlStats, StopReason};
pub use config::{Config, ConfigError, CrawlerConfig};
pub use extraction::{ExtractedCard, ExtractionError, Extractor, GeminiExtractor};
pub use frontier::{Frontier, FrontierEntry};
pub use model_store::{FsModelStore, HttpModelStore, ModelStore, StoreError};
pub use models::{CrawledPage, ExtractionHints, PageRecord, PageSummary};
pub use network::{FetchError, FetchResult, HttpClient, PageFetcher};
pub use parser::extract_links;
pub use pipeline::{lookup_or_generate, LookupOutcome, ModelRequest};
pub use relevance::RelevanceClassifier;
pub use robots::{RobotsCache, RobotsPolicy};
pub use url_utils::UrlFilter;
