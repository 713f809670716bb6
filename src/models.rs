use serde::{Deserialize, Serialize};

use crate::config::Config;
use crate::parser::{self, ParsedPage};

/// Everything the crawler learns about one fetched page.
/// Handed to extraction when relevant, otherwise dropped.
#[derive(Debug, Clone, PartialEq)]
pub struct PageRecord {
    pub url: String,
    pub final_url: String,
    pub title: String,
    /// Raw HTML size in bytes
    pub raw_length: usize,
    pub body_text: String,
    pub body_preview: String,
    pub meta_description: Option<String>,
    pub links: Vec<String>,
    pub relevant: bool,
}

impl PageRecord {
    /// Parse the HTML and drop the DOM before returning.
    pub fn from_html(url: &str, final_url: &str, html: &str, raw_length: usize) -> Self {
        let page = ParsedPage::parse(html);
        let body_text = page.body_text();
        Self {
            url: url.to_string(),
            final_url: final_url.to_string(),
            title: page.title(),
            raw_length,
            body_preview: parser::preview(&body_text, Config::BODY_PREVIEW_CHARS),
            body_text,
            meta_description: page.meta_description(),
            links: page.links(),
            relevant: false,
        }
    }

    pub fn summary(&self, timestamp: f64) -> PageSummary {
        PageSummary {
            url: self.url.clone(),
            title: self.title.clone(),
            current_url: self.final_url.clone(),
            page_source_length: self.raw_length,
            timestamp,
            meta_description: self.meta_description.clone(),
            body_text_length: self.body_text.chars().count(),
            body_text_preview: self.body_preview.clone(),
        }
    }
}

/// Typed payload passed across the extraction boundary.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PageSummary {
    pub url: String,
    pub title: String,
    pub current_url: String,
    pub page_source_length: usize,
    /// Unix seconds with sub-second precision
    pub timestamp: f64,
    pub meta_description: Option<String>,
    pub body_text_length: usize,
    pub body_text_preview: String,
}

impl PageSummary {
    /// Text sent to the model: the preview, prefixed by the title when the preview is short.
    pub fn extraction_content(&self) -> String {
        if self.body_text_preview.chars().count() < Config::SHORT_CONTENT_CHARS {
            format!("{} {}", self.title, self.body_text_preview)
        } else {
            self.body_text_preview.clone()
        }
    }
}

/// Optional context for the extractor.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtractionHints {
    pub model_name: Option<String>,
    pub developer_name: Option<String>,
}

impl ExtractionHints {
    pub fn new(model_name: Option<String>, developer_name: Option<String>) -> Self {
        Self {
            model_name: model_name.filter(|s| !s.trim().is_empty()),
            developer_name: developer_name.filter(|s| !s.trim().is_empty()),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.model_name.is_none() && self.developer_name.is_none()
    }

    /// Fill missing hints from what the page itself says.
    pub fn or_page_defaults(&self, title: &str, domain_key: Option<&str>) -> Self {
        let model_name = self.model_name.clone().or_else(|| {
            Some(if title.is_empty() {
                Config::UNKNOWN_MODEL_NAME.to_string()
            } else {
                title.to_string()
            })
        });
        let developer_name = self
            .developer_name
            .clone()
            .or_else(|| domain_key.map(str::to_string));
        Self {
            model_name,
            developer_name,
        }
    }
}

/// One line of the crawl log export.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CrawledPage {
    pub url: String,
    pub depth: u32,
    pub domain: String,
    pub status_code: u16,
    pub title: String,
    pub content_size: usize,
    pub relevant: bool,
    /// File written for this page, when extraction succeeded
    pub saved_as: Option<String>,
    pub crawled_at: u64,
}
