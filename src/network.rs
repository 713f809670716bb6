use async_trait::async_trait;
use std::time::Duration;

use crate::url_utils;

/// Anything that can retrieve pages for the crawler.
///
/// The crawler only ever talks to this trait so a run can be driven by an
/// in-memory site in tests.
#[async_trait]
pub trait PageFetcher: Send + Sync {
    /// GET an HTML page. Non-HTML responses are rejected.
    async fn fetch(&self, url: &str) -> Result<FetchResult, FetchError>;

    /// GET any text resource (robots.txt). Non-2xx statuses are errors.
    async fn fetch_text(&self, url: &str) -> Result<String, FetchError>;
}

/// HTTP client for making web requests
#[derive(Debug, Clone)]
pub struct HttpClient {
    client: reqwest::Client,
    user_agent: String,
    timeout: Duration,
}

impl HttpClient {
    /// One identifying user agent and one bounded timeout for every request.
    pub fn new(user_agent: &str, timeout: Duration) -> Result<Self, FetchError> {
        let client = reqwest::Client::builder()
            .user_agent(user_agent)
            .timeout(timeout)
            .connect_timeout(timeout)
            .redirect(reqwest::redirect::Policy::limited(5))
            .build()
            .map_err(|e| FetchError::NetworkError(e.to_string()))?;

        Ok(Self {
            client,
            user_agent: user_agent.to_string(),
            timeout,
        })
    }

    pub fn user_agent(&self) -> &str {
        &self.user_agent
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    async fn get(&self, url: &str) -> Result<reqwest::Response, FetchError> {
        self.client
            .get(url)
            .header(
                "Accept",
                "text/html,application/xhtml+xml,application/xml;q=0.9,*/*;q=0.8",
            )
            .header("Accept-Language", "en-US,en;q=0.5")
            .send()
            .await
            .map_err(Self::classify_error)
    }

    fn classify_error(error: reqwest::Error) -> FetchError {
        if error.is_timeout() {
            return FetchError::Timeout;
        }
        FetchError::NetworkError(error.to_string())
    }
}

#[async_trait]
impl PageFetcher for HttpClient {
    async fn fetch(&self, url: &str) -> Result<FetchResult, FetchError> {
        let response = self.get(url).await?;

        let status_code = response.status().as_u16();
        let final_url = response.url().to_string();
        let content_type = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|h| h.to_str().ok())
            .map(|s| s.to_string())
            .unwrap_or_default();

        if !url_utils::is_html_content_type(&content_type) {
            return Err(FetchError::UnsupportedContentType(content_type));
        }

        let bytes = response.bytes().await.map_err(Self::classify_error)?;

        Ok(FetchResult {
            url: url.to_string(),
            final_url,
            status_code,
            content_type,
            byte_len: bytes.len(),
            body: String::from_utf8_lossy(&bytes).into_owned(),
        })
    }

    async fn fetch_text(&self, url: &str) -> Result<String, FetchError> {
        let response = self.get(url).await?;
        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::HttpStatus(status.as_u16()));
        }
        response.text().await.map_err(Self::classify_error)
    }
}

/// Result of a successful HTML fetch
#[derive(Debug, Clone)]
pub struct FetchResult {
    /// URL that was requested
    pub url: String,
    /// URL after redirects
    pub final_url: String,
    pub status_code: u16,
    pub content_type: String,
    /// Raw response size in bytes
    pub byte_len: usize,
    pub body: String,
}

impl FetchResult {
    /// Build an HTML result without a network round trip.
    pub fn html(url: &str, body: impl Into<String>) -> Self {
        let body = body.into();
        Self {
            url: url.to_string(),
            final_url: url.to_string(),
            status_code: 200,
            content_type: "text/html; charset=utf-8".to_string(),
            byte_len: body.len(),
            body,
        }
    }
}

/// Reasons a URL is skipped at fetch time. None of them are retried.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FetchError {
    #[error("Request timeout")]
    Timeout,

    #[error("Network error: {0}")]
    NetworkError(String),

    #[error("Unsupported content type: {0:?}")]
    UnsupportedContentType(String),

    #[error("HTTP status {0}")]
    HttpStatus(u16),
}
