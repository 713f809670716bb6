use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Instant, SystemTime, UNIX_EPOCH};
use tokio::sync::watch;
use tokio::time::sleep;

use crate::config::{ConfigError, CrawlerConfig};
use crate::export;
use crate::extraction::{display_extraction, Extractor};
use crate::frontier::Frontier;
use crate::models::{CrawledPage, ExtractionHints, PageRecord};
use crate::network::{FetchError, PageFetcher};
use crate::relevance::RelevanceClassifier;
use crate::robots::RobotsCache;
use crate::url_utils::{self, UrlFilter};

pub const PROGRESS_INTERVAL: usize = 10;

/// Why a crawl run ended. All of these are normal terminal states.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum StopReason {
    FrontierExhausted,
    PageBudgetReached,
    TimeBudgetReached,
    /// A shutdown was requested between pages.
    Interrupted,
}

impl std::fmt::Display for StopReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            StopReason::FrontierExhausted => "frontier exhausted",
            StopReason::PageBudgetReached => "page budget reached",
            StopReason::TimeBudgetReached => "time budget reached",
            StopReason::Interrupted => "interrupted",
        };
        f.write_str(s)
    }
}

/// Counters for one run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CrawlStats {
    pub fetch_attempts: usize,
    pub fetched: usize,
    pub fetch_failures: usize,
    pub relevant: usize,
    pub extracted: usize,
    pub extraction_failures: usize,
    pub saved: usize,
    pub save_failures: usize,
    pub enqueued: usize,
    pub skipped_depth: usize,
    pub skipped_filter: usize,
    pub skipped_domain_budget: usize,
    pub skipped_robots: usize,
    /// Successful fetches per domain key
    pub per_domain: BTreeMap<String, usize>,
}

impl std::fmt::Display for CrawlStats {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} fetched ({} failed), {} relevant, {} extracted, {} saved",
            self.fetched, self.fetch_failures, self.relevant, self.extracted, self.saved
        )
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BfsCrawlerResult {
    pub stop_reason: StopReason,
    pub stats: CrawlStats,
    pub duration_secs: f64,
    /// URLs in the order they were fetched
    pub fetched_urls: Vec<String>,
    pub pages: Vec<CrawledPage>,
    pub saved_files: Vec<PathBuf>,
    /// Entries still queued when the run stopped
    pub frontier_remaining: usize,
}

/// Single-owner breadth-first crawler.
///
/// All run state lives here; one instance is one run. Work proceeds one
/// fetch at a time with a fixed politeness delay after every fetched page.
pub struct BfsCrawler {
    config: CrawlerConfig,
    filter: UrlFilter,
    classifier: RelevanceClassifier,
    frontier: Frontier,
    robots: RobotsCache,
    fetcher: Arc<dyn PageFetcher>,
    extractor: Arc<dyn Extractor>,
    hints: ExtractionHints,
    shutdown: Option<watch::Receiver<bool>>,
    domain_counts: HashMap<String, usize>,
    stats: CrawlStats,
    fetched_urls: Vec<String>,
    pages: Vec<CrawledPage>,
    saved_files: Vec<PathBuf>,
}

impl BfsCrawler {
    /// Build a crawler and queue the configured seeds at depth 0.
    pub fn new(
        config: CrawlerConfig,
        fetcher: Arc<dyn PageFetcher>,
        extractor: Arc<dyn Extractor>,
    ) -> Result<Self, ConfigError> {
        let filter = UrlFilter::new(&config.allowed_domains, &config.deny_filetypes)?;
        let classifier = RelevanceClassifier::new(&config.keyword_pattern)?;
        let robots = RobotsCache::new(&config.user_agent);

        let mut frontier = Frontier::new();
        for seed in &config.seeds {
            frontier.push(url_utils::normalize(seed), 0);
        }

        Ok(Self {
            config,
            filter,
            classifier,
            frontier,
            robots,
            fetcher,
            extractor,
            hints: ExtractionHints::default(),
            shutdown: None,
            domain_counts: HashMap::new(),
            stats: CrawlStats::default(),
            fetched_urls: Vec::new(),
            pages: Vec::new(),
            saved_files: Vec::new(),
        })
    }

    /// Model/developer names forwarded to extraction instead of page-derived guesses.
    pub fn with_hints(mut self, hints: ExtractionHints) -> Self {
        self.hints = hints;
        self
    }

    /// Stop before the next page once `true` is sent on the channel.
    pub fn with_shutdown(mut self, shutdown: watch::Receiver<bool>) -> Self {
        self.shutdown = Some(shutdown);
        self
    }

    fn shutdown_requested(&self) -> bool {
        self.shutdown.as_ref().is_some_and(|rx| *rx.borrow())
    }

    pub fn config(&self) -> &CrawlerConfig {
        &self.config
    }

    pub fn frontier(&self) -> &Frontier {
        &self.frontier
    }

    /// Drive the crawl until the frontier or a budget runs out.
    pub async fn run(mut self) -> BfsCrawlerResult {
        let start = Instant::now();
        let time_budget = self.config.time_budget();

        tracing::info!(
            seeds = self.frontier.len(),
            max_pages = self.config.max_pages_total,
            max_per_domain = self.config.max_pages_per_domain,
            max_depth = self.config.max_depth,
            "crawl starting"
        );

        let stop_reason = loop {
            if self.shutdown_requested() {
                break StopReason::Interrupted;
            }
            if start.elapsed() >= time_budget {
                break StopReason::TimeBudgetReached;
            }
            if self.stats.fetched >= self.config.max_pages_total {
                break StopReason::PageBudgetReached;
            }
            let Some(entry) = self.frontier.pop() else {
                break StopReason::FrontierExhausted;
            };

            let url = url_utils::normalize(&entry.url);
            if self.process(&url, entry.depth).await {
                if self.stats.fetched % PROGRESS_INTERVAL == 0 {
                    tracing::info!("Progress: {} | {}", self.stats, self.frontier.stats());
                }
                sleep(self.config.politeness_delay()).await;
            }
        };

        let duration = start.elapsed();
        tracing::info!(
            reason = %stop_reason,
            secs = duration.as_secs_f64(),
            "crawl finished: {}",
            self.stats
        );

        BfsCrawlerResult {
            stop_reason,
            stats: self.stats,
            duration_secs: duration.as_secs_f64(),
            fetched_urls: self.fetched_urls,
            pages: self.pages,
            saved_files: self.saved_files,
            frontier_remaining: self.frontier.len(),
        }
    }

    /// One frontier entry. Returns true when a page was actually fetched.
    async fn process(&mut self, url: &str, depth: u32) -> bool {
        if depth > self.config.max_depth {
            self.stats.skipped_depth += 1;
            return false;
        }
        if !self.filter.allowed(url) {
            self.stats.skipped_filter += 1;
            return false;
        }
        let (Some(domain), Some(origin)) = (url_utils::domain_key(url), url_utils::origin(url))
        else {
            self.stats.skipped_filter += 1;
            return false;
        };
        if self.domain_count(&domain) >= self.config.max_pages_per_domain {
            self.stats.skipped_domain_budget += 1;
            return false;
        }

        self.robots.get_policy(&origin, self.fetcher.as_ref()).await;
        if !self.robots.can_fetch(url) {
            tracing::debug!(url, "disallowed by robots.txt");
            self.stats.skipped_robots += 1;
            return false;
        }

        self.stats.fetch_attempts += 1;
        let fetched = match self.fetcher.fetch(url).await {
            Ok(fetched) => fetched,
            Err(e) => {
                self.record_fetch_failure(url, &e);
                return false;
            }
        };

        *self.domain_counts.entry(domain.clone()).or_insert(0) += 1;
        *self.stats.per_domain.entry(domain.clone()).or_insert(0) += 1;
        self.stats.fetched += 1;
        self.fetched_urls.push(url.to_string());

        let mut page =
            PageRecord::from_html(url, &fetched.final_url, &fetched.body, fetched.byte_len);
        page.relevant = self.classifier.is_relevant(&page.title, &page.body_text);
        tracing::info!(url, depth, relevant = page.relevant, title = %page.title, "fetched");

        let saved_as = if page.relevant {
            self.stats.relevant += 1;
            self.extract_and_save(&page, &domain).await
        } else {
            None
        };

        self.pages.push(CrawledPage {
            url: url.to_string(),
            depth,
            domain,
            status_code: fetched.status_code,
            title: page.title.clone(),
            content_size: page.raw_length,
            relevant: page.relevant,
            saved_as: saved_as.map(|p| p.display().to_string()),
            crawled_at: unix_now().as_secs(),
        });

        self.enqueue_links(url, depth, &page.links);
        true
    }

    fn record_fetch_failure(&mut self, url: &str, error: &FetchError) {
        self.stats.fetch_failures += 1;
        match error {
            FetchError::UnsupportedContentType(_) => {
                tracing::debug!(url, error = %error, "skipping non-HTML page")
            }
            _ => tracing::warn!(url, error = %error, "fetch failed, skipping"),
        }
    }

    async fn extract_and_save(&mut self, page: &PageRecord, domain: &str) -> Option<PathBuf> {
        let summary = page.summary(unix_now().as_secs_f64());
        let hints = self.hints.or_page_defaults(&page.title, Some(domain));

        let outcome = self.extractor.extract(&summary, &hints).await;
        tracing::info!("{}", display_extraction(&outcome));

        let card = match outcome {
            Ok(card) => card,
            Err(e) => {
                self.stats.extraction_failures += 1;
                tracing::warn!(url = %page.url, error = %e, "extraction failed");
                return None;
            }
        };
        self.stats.extracted += 1;

        match export::save_extracted(&card, &self.config.output_dir, &page.title) {
            Ok(path) => {
                tracing::info!(path = %path.display(), "saved extracted card");
                self.stats.saved += 1;
                self.saved_files.push(path.clone());
                Some(path)
            }
            Err(e) => {
                self.stats.save_failures += 1;
                tracing::error!(url = %page.url, error = %e, "failed to save extracted card");
                None
            }
        }
    }

    /// Resolve, filter, and queue outbound links one level deeper.
    /// Robots and budgets are left to pop time.
    fn enqueue_links(&mut self, base_url: &str, depth: u32, links: &[String]) {
        let child_depth = depth + 1;
        if child_depth > self.config.max_depth {
            return;
        }
        for link in links {
            if url_utils::is_skippable_scheme(link) {
                continue;
            }
            let Ok(absolute) = url_utils::convert_to_absolute_url(link, base_url) else {
                continue;
            };
            if url_utils::is_skippable_scheme(&absolute) {
                continue;
            }
            let normalized = url_utils::normalize(&absolute);
            if !self.filter.allowed(&normalized) {
                continue;
            }
            if self.frontier.push(normalized, child_depth) {
                self.stats.enqueued += 1;
            }
        }
    }

    fn domain_count(&self, domain: &str) -> usize {
        self.domain_counts.get(domain).copied().unwrap_or(0)
    }
}

fn unix_now() -> std::time::Duration {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extraction::{ExtractedCard, ExtractionError};
    use crate::models::PageSummary;
    use crate::network::FetchResult;
    use async_trait::async_trait;
    use parking_lot::Mutex;
    use tempfile::TempDir;

    #[derive(Default)]
    struct FakeSite {
        pages: HashMap<String, Result<String, FetchError>>,
        robots: HashMap<String, String>,
        fetches: Mutex<Vec<String>>,
    }

    impl FakeSite {
        fn page(mut self, url: &str, html: &str) -> Self {
            self.pages.insert(url.to_string(), Ok(html.to_string()));
            self
        }

        fn failing(mut self, url: &str, error: FetchError) -> Self {
            self.pages.insert(url.to_string(), Err(error));
            self
        }

        fn robots(mut self, origin: &str, body: &str) -> Self {
            self.robots.insert(format!("{}/robots.txt", origin), body.to_string());
            self
        }
    }

    #[async_trait]
    impl PageFetcher for FakeSite {
        async fn fetch(&self, url: &str) -> Result<FetchResult, FetchError> {
            self.fetches.lock().push(url.to_string());
            match self.pages.get(url) {
                Some(Ok(html)) => Ok(FetchResult::html(url, html.clone())),
                Some(Err(e)) => Err(e.clone()),
                None => Err(FetchError::NetworkError("404".to_string())),
            }
        }

        async fn fetch_text(&self, url: &str) -> Result<String, FetchError> {
            self.robots
                .get(url)
                .cloned()
                .ok_or_else(|| FetchError::NetworkError("connection refused".to_string()))
        }
    }

    #[derive(Default)]
    struct RecordingExtractor {
        calls: Mutex<Vec<(PageSummary, ExtractionHints)>>,
        fail: bool,
    }

    #[async_trait]
    impl Extractor for RecordingExtractor {
        async fn extract(
            &self,
            page: &PageSummary,
            hints: &ExtractionHints,
        ) -> Result<ExtractedCard, ExtractionError> {
            self.calls.lock().push((page.clone(), hints.clone()));
            if self.fail {
                return Err(ExtractionError::EmptyResponse);
            }
            let card = crate::extraction::parse_card(r#"{"name": "card"}"#)?;
            Ok(card.annotate(page, hints, self.method_name()))
        }

        fn method_name(&self) -> &str {
            "test"
        }
    }

    fn config(seeds: &[&str], output: &TempDir) -> CrawlerConfig {
        CrawlerConfig {
            seeds: seeds.iter().map(|s| s.to_string()).collect(),
            allowed_domains: vec!["example.com".to_string()],
            crawl_delay_ms: 0,
            output_dir: output.path().to_path_buf(),
            ..CrawlerConfig::default()
        }
    }

    fn html(title: &str, body: &str, links: &[&str]) -> String {
        let anchors: String = links
            .iter()
            .map(|l| format!("<a href=\"{}\">link</a>", l))
            .collect();
        format!(
            "<html><head><title>{}</title></head><body><p>{}</p>{}</body></html>",
            title, body, anchors
        )
    }

    async fn crawl(
        config: CrawlerConfig,
        site: Arc<FakeSite>,
        extractor: Arc<RecordingExtractor>,
    ) -> BfsCrawlerResult {
        BfsCrawler::new(config, site, extractor).unwrap().run().await
    }

    #[tokio::test]
    async fn test_breadth_first_order_and_dedup() {
        let out = TempDir::new().unwrap();
        let site = Arc::new(
            FakeSite::default()
                .page(
                    "https://example.com/",
                    &html("Home", "weather", &["/a", "/b", "/a#dup", "/"]),
                )
                .page("https://example.com/a", &html("A", "weather", &["/c", "/b"]))
                .page("https://example.com/b", &html("B", "weather", &["/c"]))
                .page("https://example.com/c", &html("C", "weather", &[])),
        );
        let result = crawl(
            config(&["https://example.com/"], &out),
            site.clone(),
            Arc::default(),
        )
        .await;

        assert_eq!(
            result.fetched_urls,
            vec![
                "https://example.com/",
                "https://example.com/a",
                "https://example.com/b",
                "https://example.com/c"
            ]
        );
        assert_eq!(*site.fetches.lock(), result.fetched_urls);
        assert_eq!(result.stop_reason, StopReason::FrontierExhausted);
        assert_eq!(result.stats.enqueued, 3);
    }

    #[tokio::test]
    async fn test_depth_zero_fetches_only_seed() {
        let out = TempDir::new().unwrap();
        let seed = "https://huggingface.co/google/derm-foundation";
        let site = Arc::new(FakeSite::default().page(
            seed,
            &html(
                "Derm Foundation Model Card",
                "health",
                &["/google/derm-foundation/tree/main", "https://huggingface.co/docs"],
            ),
        ));
        let mut cfg = config(&[seed], &out);
        cfg.allowed_domains = vec!["huggingface.co".to_string()];
        cfg.max_depth = 0;

        let result = crawl(cfg, site.clone(), Arc::default()).await;

        assert_eq!(site.fetches.lock().len(), 1);
        assert_eq!(result.stats.fetch_attempts, 1);
        assert_eq!(result.stats.enqueued, 0);
        assert_eq!(result.frontier_remaining, 0);
    }

    #[tokio::test]
    async fn test_depth_limit_is_never_exceeded() {
        let out = TempDir::new().unwrap();
        let site = Arc::new(
            FakeSite::default()
                .page("https://example.com/0", &html("0", "x", &["/1"]))
                .page("https://example.com/1", &html("1", "x", &["/2"]))
                .page("https://example.com/2", &html("2", "x", &["/3"]))
                .page("https://example.com/3", &html("3", "x", &[])),
        );
        let mut cfg = config(&["https://example.com/0"], &out);
        cfg.max_depth = 1;

        let result = crawl(cfg, site, Arc::default()).await;

        assert_eq!(
            result.fetched_urls,
            vec!["https://example.com/0", "https://example.com/1"]
        );
        assert!(result.pages.iter().all(|p| p.depth <= 1));
    }

    #[tokio::test]
    async fn test_global_and_domain_budgets() {
        let out = TempDir::new().unwrap();
        let links: Vec<String> = (0..10).map(|i| format!("/p{}", i)).collect();
        let link_refs: Vec<&str> = links.iter().map(String::as_str).collect();
        let mut site =
            FakeSite::default().page("https://example.com/", &html("Home", "x", &link_refs));
        for link in &links {
            site = site.page(&format!("https://example.com{}", link), &html("P", "x", &[]));
        }
        let site = Arc::new(site);

        let mut cfg = config(&["https://example.com/"], &out);
        cfg.max_pages_per_domain = 4;
        let result = crawl(cfg, site.clone(), Arc::default()).await;
        assert_eq!(result.stats.fetched, 4);
        assert_eq!(result.stats.per_domain.get("example.com"), Some(&4));
        assert!(result.stats.skipped_domain_budget > 0);

        let mut cfg = config(&["https://example.com/"], &out);
        cfg.max_pages_total = 3;
        let result = crawl(cfg, site, Arc::default()).await;
        assert_eq!(result.stats.fetched, 3);
        assert_eq!(result.stop_reason, StopReason::PageBudgetReached);
    }

    #[tokio::test]
    async fn test_timeout_is_not_counted_or_retried() {
        let out = TempDir::new().unwrap();
        let site = Arc::new(
            FakeSite::default()
                .page(
                    "https://example.com/",
                    &html("Home", "x", &["/slow", "/ok"]),
                )
                .failing("https://example.com/slow", FetchError::Timeout)
                .page("https://example.com/ok", &html("Ok", "x", &["/slow"])),
        );

        let result = crawl(
            config(&["https://example.com/"], &out),
            site.clone(),
            Arc::default(),
        )
        .await;

        let slow_attempts = site
            .fetches
            .lock()
            .iter()
            .filter(|u| u.as_str() == "https://example.com/slow")
            .count();
        assert_eq!(slow_attempts, 1);
        assert_eq!(result.stats.fetch_failures, 1);
        assert_eq!(result.stats.fetched, 2);
        assert_eq!(result.stats.per_domain.get("example.com"), Some(&2));
        assert!(!result.fetched_urls.contains(&"https://example.com/slow".to_string()));
    }

    #[tokio::test]
    async fn test_robots_failure_permits_everything() {
        let out = TempDir::new().unwrap();
        let site = Arc::new(
            FakeSite::default()
                .page("https://example.com/", &html("Home", "x", &["/private/page"]))
                .page("https://example.com/private/page", &html("Private", "x", &[])),
        );

        let result = crawl(config(&["https://example.com/"], &out), site, Arc::default()).await;

        assert_eq!(result.stats.fetched, 2);
        assert_eq!(result.stats.skipped_robots, 0);
    }

    #[tokio::test]
    async fn test_robots_disallow_is_respected() {
        let out = TempDir::new().unwrap();
        let site = Arc::new(
            FakeSite::default()
                .robots("https://example.com", "User-agent: *\nDisallow: /private/\n")
                .page("https://example.com/", &html("Home", "x", &["/private/page", "/open"]))
                .page("https://example.com/private/page", &html("Private", "x", &[]))
                .page("https://example.com/open", &html("Open", "x", &[])),
        );

        let result = crawl(
            config(&["https://example.com/"], &out),
            site.clone(),
            Arc::default(),
        )
        .await;

        assert_eq!(
            result.fetched_urls,
            vec!["https://example.com/", "https://example.com/open"]
        );
        assert_eq!(result.stats.skipped_robots, 1);
        assert!(!site
            .fetches
            .lock()
            .contains(&"https://example.com/private/page".to_string()));
    }

    #[tokio::test]
    async fn test_filtered_links_are_not_enqueued() {
        let out = TempDir::new().unwrap();
        let site = Arc::new(FakeSite::default().page(
            "https://example.com/",
            &html(
                "Home",
                "x",
                &[
                    "mailto:team@example.com",
                    "javascript:void(0)",
                    "/paper.PDF",
                    "https://other.com/page",
                    "/kept",
                ],
            ),
        ));

        let result = crawl(config(&["https://example.com/"], &out), site, Arc::default()).await;

        assert_eq!(result.stats.enqueued, 1);
        assert_eq!(result.stats.fetch_failures, 1);
    }

    #[tokio::test]
    async fn test_relevant_pages_are_extracted_and_saved() {
        let out = TempDir::new().unwrap();
        let site = Arc::new(
            FakeSite::default()
                .page(
                    "https://example.com/",
                    &html("Derm Foundation Model Card", "health", &["/weather"]),
                )
                .page("https://example.com/weather", &html("Weather", "Sunny skies", &[])),
        );
        let extractor = Arc::new(RecordingExtractor::default());

        let result = crawl(config(&["https://example.com/"], &out), site, extractor.clone()).await;

        assert_eq!(result.stats.relevant, 1);
        assert_eq!(result.stats.saved, 1);
        let saved = out.path().join("extracted_Derm_Foundation_Model_Card.json");
        assert_eq!(result.saved_files, vec![saved.clone()]);
        assert!(saved.exists());

        let calls = extractor.calls.lock();
        assert_eq!(calls.len(), 1);
        let (summary, hints) = &calls[0];
        assert_eq!(summary.url, "https://example.com/");
        assert_eq!(hints.model_name.as_deref(), Some("Derm Foundation Model Card"));
        assert_eq!(hints.developer_name.as_deref(), Some("example.com"));
    }

    #[tokio::test]
    async fn test_user_hints_override_page_defaults() {
        let out = TempDir::new().unwrap();
        let site = Arc::new(
            FakeSite::default().page("https://example.com/", &html("Model Card", "health", &[])),
        );
        let extractor = Arc::new(RecordingExtractor::default());
        let hints = ExtractionHints::new(Some("DermaSensor".into()), Some("Google".into()));

        BfsCrawler::new(config(&["https://example.com/"], &out), site, extractor.clone())
            .unwrap()
            .with_hints(hints.clone())
            .run()
            .await;

        assert_eq!(extractor.calls.lock()[0].1, hints);
    }

    #[tokio::test]
    async fn test_extraction_failure_does_not_stop_crawl() {
        let out = TempDir::new().unwrap();
        let site = Arc::new(
            FakeSite::default()
                .page("https://example.com/", &html("Model Card", "health", &["/next"]))
                .page("https://example.com/next", &html("Docs", "documentation", &[])),
        );
        let extractor = Arc::new(RecordingExtractor {
            fail: true,
            ..Default::default()
        });

        let result = crawl(config(&["https://example.com/"], &out), site, extractor).await;

        assert_eq!(result.stats.fetched, 2);
        assert_eq!(result.stats.extraction_failures, 2);
        assert_eq!(result.stats.saved, 0);
        assert!(result.saved_files.is_empty());
    }

    #[tokio::test]
    async fn test_zero_time_budget_stops_immediately() {
        let out = TempDir::new().unwrap();
        let site = Arc::new(
            FakeSite::default().page("https://example.com/", &html("Home", "x", &[])),
        );
        let mut cfg = config(&["https://example.com/"], &out);
        cfg.time_budget_secs = 0;

        let result = crawl(cfg, site.clone(), Arc::default()).await;

        assert_eq!(result.stop_reason, StopReason::TimeBudgetReached);
        assert!(site.fetches.lock().is_empty());
        assert_eq!(result.frontier_remaining, 1);
    }

    struct StopAfterFirstFetch {
        site: FakeSite,
        shutdown: watch::Sender<bool>,
    }

    #[async_trait]
    impl PageFetcher for StopAfterFirstFetch {
        async fn fetch(&self, url: &str) -> Result<FetchResult, FetchError> {
            let _ = self.shutdown.send(true);
            self.site.fetch(url).await
        }

        async fn fetch_text(&self, url: &str) -> Result<String, FetchError> {
            self.site.fetch_text(url).await
        }
    }

    #[tokio::test]
    async fn test_shutdown_keeps_partial_result() {
        let out = TempDir::new().unwrap();
        let (tx, rx) = watch::channel(false);
        let fetcher = Arc::new(StopAfterFirstFetch {
            site: FakeSite::default()
                .page("https://example.com/", &html("Home", "x", &["/a", "/b"]))
                .page("https://example.com/a", &html("A", "x", &[])),
            shutdown: tx,
        });

        let result = BfsCrawler::new(
            config(&["https://example.com/"], &out),
            fetcher,
            Arc::new(RecordingExtractor::default()),
        )
        .unwrap()
        .with_shutdown(rx)
        .run()
        .await;

        assert_eq!(result.stop_reason, StopReason::Interrupted);
        assert_eq!(result.fetched_urls, vec!["https://example.com/"]);
        assert_eq!(result.pages.len(), 1);
        assert_eq!(result.frontier_remaining, 2);
    }

    #[test]
    fn test_invalid_keyword_pattern_is_rejected() {
        let out = TempDir::new().unwrap();
        let mut cfg = config(&[], &out);
        cfg.keyword_pattern = "(unclosed".to_string();
        let built = BfsCrawler::new(
            cfg,
            Arc::new(FakeSite::default()),
            Arc::new(RecordingExtractor::default()),
        );
        assert!(matches!(built, Err(ConfigError::Pattern(_))));
    }
}
