use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

use crate::config::{Config, ConfigError, CrawlerConfig};

/// Command line interface for the model card crawler.
#[derive(Parser, Debug)]
#[command(name = "modelcard_crawler")]
#[command(about = "A polite breadth-first crawler that extracts AI model cards")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Crawl from the configured seeds and extract cards from relevant pages.
    Crawl {
        #[command(flatten)]
        crawl: CrawlArgs,

        #[arg(long, help = "Model name passed to the extractor for every page")]
        model_name: Option<String>,

        #[arg(long, help = "Developer name passed to the extractor for every page")]
        developer_name: Option<String>,
    },

    /// Return an existing card for a model, crawling for one if none is stored.
    Lookup {
        #[command(flatten)]
        crawl: CrawlArgs,

        #[arg(long, help = "Model to look up")]
        model_name: String,

        #[arg(long, default_value = Config::DEFAULT_DEVELOPER_NAME)]
        developer_name: String,

        #[arg(
            long,
            env = "MODEL_STORE_URL",
            help = "Base URL of an HTTP card store; defaults to cards in the output directory"
        )]
        store_url: Option<String>,
    },
}

/// Options shared by every command that may crawl.
#[derive(Args, Debug, Clone, Default)]
pub struct CrawlArgs {
    #[arg(short, long, help = "JSON config file; flags override its values")]
    pub config: Option<PathBuf>,

    #[arg(
        short,
        long = "seed",
        help = "Seed URL (repeatable); replaces the configured seeds"
    )]
    pub seeds: Vec<String>,

    #[arg(
        long = "allow-domain",
        help = "Allowed registrable domain (repeatable); replaces the configured set"
    )]
    pub allowed_domains: Vec<String>,

    #[arg(long, help = "Maximum pages fetched in total")]
    pub max_pages: Option<usize>,

    #[arg(long, help = "Maximum pages fetched per domain")]
    pub max_pages_per_domain: Option<usize>,

    #[arg(long, help = "Maximum link depth from a seed")]
    pub max_depth: Option<u32>,

    #[arg(long, help = "Wall-clock budget for the crawl in seconds")]
    pub time_budget_secs: Option<u64>,

    #[arg(long, help = "Delay after each fetched page in milliseconds")]
    pub delay_ms: Option<u64>,

    #[arg(short, long, help = "Request timeout in seconds")]
    pub timeout: Option<u64>,

    #[arg(short, long, help = "User agent string for requests")]
    pub user_agent: Option<String>,

    #[arg(short, long, help = "Directory for extracted cards and logs")]
    pub output_dir: Option<PathBuf>,

    #[arg(long, help = "CSV listing the fields to extract")]
    pub fields_file: Option<PathBuf>,

    #[arg(long, help = "Also write a crawl_log.jsonl of every fetched page")]
    pub export_jsonl: bool,
}

impl CrawlArgs {
    /// Load the config file (or defaults) and apply command line overrides.
    pub fn to_config(&self) -> Result<CrawlerConfig, ConfigError> {
        let mut config = match &self.config {
            Some(path) => CrawlerConfig::from_json_file(path)?,
            None => CrawlerConfig::default(),
        };
        self.apply(&mut config);
        Ok(config)
    }

    pub fn apply(&self, config: &mut CrawlerConfig) {
        if !self.seeds.is_empty() {
            config.seeds = self.seeds.clone();
        }
        if !self.allowed_domains.is_empty() {
            config.allowed_domains = self.allowed_domains.clone();
        }
        if let Some(v) = self.max_pages {
            config.max_pages_total = v;
        }
        if let Some(v) = self.max_pages_per_domain {
            config.max_pages_per_domain = v;
        }
        if let Some(v) = self.max_depth {
            config.max_depth = v;
        }
        if let Some(v) = self.time_budget_secs {
            config.time_budget_secs = v;
        }
        if let Some(v) = self.delay_ms {
            config.crawl_delay_ms = v;
        }
        if let Some(v) = self.timeout {
            config.timeout_secs = v;
        }
        if let Some(v) = &self.user_agent {
            config.user_agent = v.clone();
        }
        if let Some(v) = &self.output_dir {
            config.output_dir = v.clone();
        }
        if let Some(v) = &self.fields_file {
            config.fields_file = v.clone();
        }
    }
}

impl Cli {
    /// On error, clap prints help and exits with code 2 (usage error).
    pub fn parse_args() -> Self {
        Self::parse()
    }
}
