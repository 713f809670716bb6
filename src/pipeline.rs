//! Look up a model card, crawling for it only when the store has none.

use serde_json::Value;

use crate::bfs_crawler::{BfsCrawler, BfsCrawlerResult};
use crate::config::Config;
use crate::model_store::ModelStore;
use crate::models::ExtractionHints;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelRequest {
    pub model_name: String,
    pub developer_name: String,
}

impl ModelRequest {
    pub fn new(model_name: impl Into<String>, developer_name: Option<String>) -> Self {
        Self {
            model_name: model_name.into(),
            developer_name: developer_name
                .filter(|d| !d.trim().is_empty())
                .unwrap_or_else(|| Config::DEFAULT_DEVELOPER_NAME.to_string()),
        }
    }

    pub fn hints(&self) -> ExtractionHints {
        ExtractionHints::new(
            Some(self.model_name.clone()),
            Some(self.developer_name.clone()),
        )
    }
}

#[derive(Debug)]
pub enum LookupOutcome {
    /// The store already had a card.
    Existing(Value),
    /// A crawl ran; `record` is the store's answer afterwards.
    Generated {
        record: Option<Value>,
        result: BfsCrawlerResult,
    },
}

impl LookupOutcome {
    pub fn record(&self) -> Option<&Value> {
        match self {
            LookupOutcome::Existing(record) => Some(record),
            LookupOutcome::Generated { record, .. } => record.as_ref(),
        }
    }
}

async fn find(store: &dyn ModelStore, name: &str) -> Option<Value> {
    match store.find_by_name(name).await {
        Ok(record) => record,
        Err(e) => {
            tracing::warn!(store = %store.describe(), error = %e, "model store lookup failed");
            None
        }
    }
}

/// Return the stored card for `request`, or run `crawler` with the request's
/// names as extraction hints and look again.
pub async fn lookup_or_generate(
    store: &dyn ModelStore,
    crawler: BfsCrawler,
    request: &ModelRequest,
) -> LookupOutcome {
    if let Some(existing) = find(store, &request.model_name).await {
        tracing::info!(model = %request.model_name, "model card already exists");
        return LookupOutcome::Existing(existing);
    }

    tracing::info!(
        model = %request.model_name,
        developer = %request.developer_name,
        "no stored card, starting crawl"
    );
    let result = crawler.with_hints(request.hints()).run().await;
    let record = find(store, &request.model_name).await;
    if record.is_none() {
        tracing::warn!(model = %request.model_name, "crawl finished without a stored card");
    }
    LookupOutcome::Generated { record, result }
}
