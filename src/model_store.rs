//! Existence check against previously generated model cards.

use async_trait::async_trait;
use serde_json::Value;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;
use url::Url;

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Store unavailable: {0}")]
    Unavailable(String),

    #[error("Invalid store URL: {0}")]
    InvalidUrl(String),

    #[error("Store returned {status}")]
    Status { status: u16 },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

#[async_trait]
pub trait ModelStore: Send + Sync {
    /// Look up a stored card by exact model name.
    async fn find_by_name(&self, name: &str) -> Result<Option<Value>, StoreError>;

    fn describe(&self) -> String;
}

/// Card records served over HTTP at `{base}/record/{name}`; 404 means absent.
pub struct HttpModelStore {
    client: reqwest::Client,
    base_url: Url,
}

impl HttpModelStore {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, StoreError> {
        let base_url = Url::parse(base_url).map_err(|e| StoreError::InvalidUrl(e.to_string()))?;
        if base_url.cannot_be_a_base() {
            return Err(StoreError::InvalidUrl(base_url.to_string()));
        }
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| StoreError::Unavailable(e.to_string()))?;
        Ok(Self { client, base_url })
    }

    pub fn record_url(&self, name: &str) -> Result<Url, StoreError> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| StoreError::InvalidUrl(self.base_url.to_string()))?
            .pop_if_empty()
            .push("record")
            .push(name);
        Ok(url)
    }
}

#[async_trait]
impl ModelStore for HttpModelStore {
    async fn find_by_name(&self, name: &str) -> Result<Option<Value>, StoreError> {
        let url = self.record_url(name)?;
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| StoreError::Unavailable(e.to_string()))?;

        match response.status() {
            reqwest::StatusCode::NOT_FOUND => Ok(None),
            status if status.is_success() => {
                let body = response
                    .json::<Value>()
                    .await
                    .map_err(|e| StoreError::Unavailable(e.to_string()))?;
                Ok(Some(body))
            }
            status => Err(StoreError::Status {
                status: status.as_u16(),
            }),
        }
    }

    fn describe(&self) -> String {
        format!("http store at {}", self.base_url)
    }
}

/// Cards previously saved by the crawler as `extracted_*.json` files.
pub struct FsModelStore {
    dir: PathBuf,
}

impl FsModelStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Identity keys only; `provided_model_name` echoes the crawl's hint, not the card's model.
    fn matches(card: &Value, name: &str) -> bool {
        ["name", "model_name"]
            .iter()
            .filter_map(|key| card.get(key).and_then(Value::as_str))
            .any(|value| value.trim() == name.trim())
    }
}

#[async_trait]
impl ModelStore for FsModelStore {
    async fn find_by_name(&self, name: &str) -> Result<Option<Value>, StoreError> {
        if !self.dir.exists() {
            return Ok(None);
        }

        let mut paths: Vec<PathBuf> = std::fs::read_dir(&self.dir)?
            .filter_map(|entry| entry.ok().map(|e| e.path()))
            .filter(|path| {
                path.file_name()
                    .and_then(|n| n.to_str())
                    .is_some_and(|n| n.starts_with("extracted_") && n.ends_with(".json"))
            })
            .collect();
        paths.sort();

        for path in paths {
            let card = match std::fs::read_to_string(&path)
                .ok()
                .and_then(|raw| serde_json::from_str::<Value>(&raw).ok())
            {
                Some(card) => card,
                None => {
                    tracing::debug!(path = %path.display(), "skipping unreadable card file");
                    continue;
                }
            };
            if Self::matches(&card, name) {
                return Ok(Some(card));
            }
        }
        Ok(None)
    }

    fn describe(&self) -> String {
        format!("card files in {}", self.dir.display())
    }
}
