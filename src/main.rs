use modelcard_crawler::bfs_crawler::{BfsCrawler, BfsCrawlerResult};
use modelcard_crawler::cli::{Cli, Commands, CrawlArgs};
use modelcard_crawler::config::{ConfigError, CrawlerConfig};
use modelcard_crawler::export::{self, ExportError};
use modelcard_crawler::extraction::{ExtractionError, GeminiExtractor};
use modelcard_crawler::logging::{self, LoggingError};
use modelcard_crawler::model_store::{FsModelStore, HttpModelStore, ModelStore, StoreError};
use modelcard_crawler::models::ExtractionHints;
use modelcard_crawler::network::{FetchError, HttpClient};
use modelcard_crawler::pipeline::{self, LookupOutcome, ModelRequest};
use std::process::ExitCode;
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::watch;

const CRAWL_LOG_FILE: &str = "crawl_log.jsonl";

#[derive(Error, Debug)]
pub enum MainError {
    #[error("Config error: {0}")]
    Config(#[from] ConfigError),

    #[error("Network error: {0}")]
    Network(#[from] FetchError),

    #[error("Extractor error: {0}")]
    Extraction(#[from] ExtractionError),

    #[error("Export error: {0}")]
    Export(#[from] ExportError),

    #[error("Model store error: {0}")]
    Store(#[from] StoreError),

    #[error("Logging error: {0}")]
    Logging(#[from] LoggingError),
}

impl MainError {
    /// 3 = I/O or config error, 4 = network error. Usage errors exit 2 inside clap.
    pub fn exit_code(&self) -> u8 {
        match self {
            MainError::Network(_) | MainError::Store(StoreError::Unavailable(_)) => 4,
            MainError::Extraction(ExtractionError::Http(_)) => 4,
            _ => 3,
        }
    }
}

/// First Ctrl+C stops the crawl after the current page. Second Ctrl+C exits immediately.
fn setup_shutdown_handler() -> watch::Receiver<bool> {
    let (shutdown_tx, shutdown_rx) = watch::channel(false);

    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            println!("\nReceived Ctrl+C, finishing the current page...");
            println!("Press Ctrl+C again to force quit");
            let _ = shutdown_tx.send(true);

            if tokio::signal::ctrl_c().await.is_ok() {
                eprintln!("\nForce quit requested, exiting immediately...");
                std::process::exit(130);
            }
        }
    });

    shutdown_rx
}

/// Wire the HTTP fetcher and Gemini extractor into a crawler for `config`.
fn build_crawler(config: CrawlerConfig) -> Result<BfsCrawler, MainError> {
    let http = Arc::new(HttpClient::new(&config.user_agent, config.fetch_timeout())?);
    let extractor = GeminiExtractor::from_config(&config)?;
    if !extractor.has_api_key() {
        tracing::warn!("GEMINI_API_KEY is not set; relevant pages are crawled but not extracted");
    }
    Ok(BfsCrawler::new(config, http, Arc::new(extractor))?.with_shutdown(setup_shutdown_handler()))
}

fn report(
    result: &BfsCrawlerResult,
    config: &CrawlerConfig,
    args: &CrawlArgs,
) -> Result<(), MainError> {
    if args.export_jsonl {
        let path = config.output_dir.join(CRAWL_LOG_FILE);
        export::export_to_jsonl_file(result.pages.iter().cloned(), &path)?;
        println!("Exported crawl log to: {}", path.display());
    }

    println!(
        "Stopped ({}) after {:.1}s: {}",
        result.stop_reason, result.duration_secs, result.stats
    );
    for (domain, count) in &result.stats.per_domain {
        println!("  {}: {} pages", domain, count);
    }
    for path in &result.saved_files {
        println!("  saved {}", path.display());
    }
    Ok(())
}

async fn run_crawl_command(
    args: CrawlArgs,
    model_name: Option<String>,
    developer_name: Option<String>,
) -> Result<(), MainError> {
    let config = args.to_config()?;
    let _log_guard = logging::init_logging_in_dir(&config.output_dir)?;

    println!(
        "Crawling {} seed(s) (max {} pages, depth {}, {}ms delay)",
        config.seeds.len(),
        config.max_pages_total,
        config.max_depth,
        config.crawl_delay_ms
    );

    let crawler = build_crawler(config.clone())?
        .with_hints(ExtractionHints::new(model_name, developer_name));

    let result = crawler.run().await;
    report(&result, &config, &args)
}

async fn run_lookup_command(
    args: CrawlArgs,
    model_name: String,
    developer_name: String,
    store_url: Option<String>,
) -> Result<(), MainError> {
    let config = args.to_config()?;
    let _log_guard = logging::init_logging_in_dir(&config.output_dir)?;

    let store: Box<dyn ModelStore> = match store_url {
        Some(url) => Box::new(HttpModelStore::new(&url, config.fetch_timeout())?),
        None => Box::new(FsModelStore::new(&config.output_dir)),
    };
    tracing::info!("Checking {}", store.describe());

    let request = ModelRequest::new(model_name, Some(developer_name));
    let crawler = build_crawler(config.clone())?;

    match pipeline::lookup_or_generate(store.as_ref(), crawler, &request).await {
        LookupOutcome::Existing(record) => {
            println!("Found existing card for {}:", request.model_name);
            println!("{}", serde_json::to_string_pretty(&record).unwrap_or_default());
        }
        LookupOutcome::Generated { record, result } => {
            report(&result, &config, &args)?;
            match record {
                Some(record) => {
                    println!("Generated card for {}:", request.model_name);
                    println!("{}", serde_json::to_string_pretty(&record).unwrap_or_default());
                }
                None => println!("No card found for {} after crawling", request.model_name),
            }
        }
    }
    Ok(())
}

async fn run(cli: Cli) -> Result<(), MainError> {
    match cli.command {
        Commands::Crawl {
            crawl,
            model_name,
            developer_name,
        } => run_crawl_command(crawl, model_name, developer_name).await,

        Commands::Lookup {
            crawl,
            model_name,
            developer_name,
            store_url,
        } => run_lookup_command(crawl, model_name, developer_name, store_url).await,
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse_args();

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitCode::from(e.exit_code())
        }
    }
}
