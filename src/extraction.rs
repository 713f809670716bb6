//! Model card extraction through a hosted generative model.
//!
//! The crawler treats extraction as an opaque call: it hands over a
//! [`PageSummary`] plus optional hints and gets back either an
//! [`ExtractedCard`] or an [`ExtractionError`]. Neither outcome can stop
//! the crawl.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::path::Path;
use std::time::Duration;
use thiserror::Error;

use crate::config::{Config, CrawlerConfig};
use crate::models::{ExtractionHints, PageSummary};

/// Keys added by the extractor on top of the model's fields.
pub const METADATA_KEYS: &[&str] = &[
    "extraction_timestamp",
    "source_url",
    "extraction_method",
    "provided_model_name",
    "provided_developer_name",
];

#[derive(Error, Debug)]
pub enum ExtractionError {
    #[error("No API key found in ${0}")]
    MissingApiKey(&'static str),

    #[error("Failed to load wanted fields: {0}")]
    NoFields(String),

    #[error("Request failed: {0}")]
    Http(String),

    #[error("API returned {status}: {body}")]
    Api { status: u16, body: String },

    #[error("Empty response from model")]
    EmptyResponse,

    #[error("Failed to parse JSON response: {reason}")]
    InvalidJson { reason: String, raw: String },
}

/// Structured fields for one page, annotated with extraction metadata.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ExtractedCard {
    fields: Map<String, Value>,
}

impl ExtractedCard {
    pub fn new(fields: Map<String, Value>) -> Self {
        Self { fields }
    }

    /// Attach provenance so a saved card can be traced back to its page.
    pub fn annotate(mut self, page: &PageSummary, hints: &ExtractionHints, method: &str) -> Self {
        self.fields
            .insert("extraction_timestamp".into(), Value::from(page.timestamp));
        self.fields
            .insert("source_url".into(), Value::from(page.url.clone()));
        self.fields
            .insert("extraction_method".into(), Value::from(method));
        self.fields.insert(
            "provided_model_name".into(),
            hints.model_name.clone().map_or(Value::Null, Value::from),
        );
        self.fields.insert(
            "provided_developer_name".into(),
            hints.developer_name.clone().map_or(Value::Null, Value::from),
        );
        self
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.fields.get(key)
    }

    pub fn fields(&self) -> &Map<String, Value> {
        &self.fields
    }

    pub fn source_url(&self) -> Option<&str> {
        self.fields.get("source_url").and_then(Value::as_str)
    }
}

#[async_trait]
pub trait Extractor: Send + Sync {
    async fn extract(
        &self,
        page: &PageSummary,
        hints: &ExtractionHints,
    ) -> Result<ExtractedCard, ExtractionError>;

    /// Recorded as `extraction_method` on every card.
    fn method_name(&self) -> &str;
}

/// Read the first non-comment row of the wanted-fields CSV.
pub fn load_wanted_fields<P: AsRef<Path>>(path: P) -> Result<Vec<String>, ExtractionError> {
    let path = path.as_ref();
    let raw = std::fs::read_to_string(path)
        .map_err(|e| ExtractionError::NoFields(format!("{}: {}", path.display(), e)))?;
    let fields = parse_wanted_fields(&raw);
    if fields.is_empty() {
        return Err(ExtractionError::NoFields(format!(
            "{} has no field row",
            path.display()
        )));
    }
    Ok(fields)
}

fn parse_wanted_fields(raw: &str) -> Vec<String> {
    raw.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with("//"))
        .map(|line| {
            split_csv_row(line)
                .into_iter()
                .map(|f| f.trim().to_string())
                .filter(|f| !f.is_empty())
                .collect::<Vec<_>>()
        })
        .find(|fields| !fields.is_empty())
        .unwrap_or_default()
}

/// Split one CSV line. Quoted fields may contain commas; `""` is an escaped quote.
/// Quoted fields spanning lines are not supported.
fn split_csv_row(line: &str) -> Vec<String> {
    let mut fields = Vec::new();
    let mut field = String::new();
    let mut in_quotes = false;
    let mut chars = line.chars().peekable();

    while let Some(ch) = chars.next() {
        match ch {
            '"' if in_quotes && chars.peek() == Some(&'"') => {
                chars.next();
                field.push('"');
            }
            '"' => in_quotes = !in_quotes,
            ',' if !in_quotes => fields.push(std::mem::take(&mut field)),
            _ => field.push(ch),
        }
    }
    fields.push(field);
    fields
}

pub fn build_prompt(content: &str, fields: &[String], hints: &ExtractionHints) -> String {
    let mut prompt = String::new();
    prompt.push_str(
        "You are extracting information from web content to fill in an AI model card.\n\n",
    );
    prompt.push_str("Website content:\n");
    prompt.push_str(content);
    prompt.push_str("\n\n");

    if !hints.is_empty() {
        prompt.push_str("Additional context:\n");
        prompt.push_str(&format!(
            "- Provided model name: {}\n- Provided developer name: {}\n",
            hints.model_name.as_deref().unwrap_or("Not provided"),
            hints.developer_name.as_deref().unwrap_or("Not provided"),
        ));
        prompt.push_str("Use it to validate or supplement what the content says.\n\n");
    }

    prompt.push_str("Fields to extract:\n");
    prompt.push_str(&fields.join(", "));
    prompt.push_str(
        "\n\nReturn one JSON object keyed by exactly these field names. \
         Use \"Not found\" only when no reasonable inference can be made. \
         Dates as YYYY-MM-DD. Respond with JSON only.\n",
    );
    prompt
}

/// Remove a surrounding Markdown code fence, with or without a `json` tag.
pub fn strip_code_fences(text: &str) -> &str {
    let mut text = text.trim();
    if let Some(rest) = text.strip_prefix("```json") {
        text = rest;
    } else if let Some(rest) = text.strip_prefix("```") {
        text = rest;
    }
    if let Some(rest) = text.strip_suffix("```") {
        text = rest;
    }
    text.trim()
}

/// Parse model output into a field map. Anything but a JSON object is an error.
pub fn parse_card(raw: &str) -> Result<ExtractedCard, ExtractionError> {
    let cleaned = strip_code_fences(raw);
    match serde_json::from_str::<Value>(cleaned) {
        Ok(Value::Object(fields)) => Ok(ExtractedCard::new(fields)),
        Ok(other) => Err(ExtractionError::InvalidJson {
            reason: format!("expected an object, got {}", json_kind(&other)),
            raw: raw.to_string(),
        }),
        Err(e) => Err(ExtractionError::InvalidJson {
            reason: e.to_string(),
            raw: raw.to_string(),
        }),
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

/// Gemini `generateContent` client.
pub struct GeminiExtractor {
    client: reqwest::Client,
    api_key: Option<String>,
    endpoint: String,
    fields_file: std::path::PathBuf,
}

#[derive(Serialize)]
struct GenerateRequest<'a> {
    contents: [Content<'a>; 1],
}

#[derive(Serialize)]
struct Content<'a> {
    parts: [Part<'a>; 1],
}

#[derive(Serialize)]
struct Part<'a> {
    text: &'a str,
}

#[derive(Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Deserialize)]
struct Candidate {
    content: Option<CandidateContent>,
}

#[derive(Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<CandidatePart>,
}

#[derive(Deserialize)]
struct CandidatePart {
    #[serde(default)]
    text: String,
}

impl GenerateResponse {
    fn text(&self) -> String {
        self.candidates
            .first()
            .and_then(|c| c.content.as_ref())
            .map(|c| c.parts.iter().map(|p| p.text.as_str()).collect())
            .unwrap_or_default()
    }
}

impl GeminiExtractor {
    /// A missing key is not an error here; every extraction reports it instead.
    pub fn new(
        api_key: Option<String>,
        base_url: &str,
        model: &str,
        fields_file: impl Into<std::path::PathBuf>,
    ) -> Result<Self, ExtractionError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(Config::EXTRACTION_TIMEOUT_SECS))
            .build()
            .map_err(|e| ExtractionError::Http(e.to_string()))?;
        Ok(Self {
            client,
            api_key: api_key.filter(|k| !k.trim().is_empty()),
            endpoint: format!(
                "{}/models/{}:generateContent",
                base_url.trim_end_matches('/'),
                model
            ),
            fields_file: fields_file.into(),
        })
    }

    pub fn from_config(config: &CrawlerConfig) -> Result<Self, ExtractionError> {
        Self::new(
            std::env::var(Config::GEMINI_API_KEY_ENV).ok(),
            &config.gemini_base_url,
            &config.gemini_model,
            config.fields_file.clone(),
        )
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    pub fn has_api_key(&self) -> bool {
        self.api_key.is_some()
    }
}

#[async_trait]
impl Extractor for GeminiExtractor {
    async fn extract(
        &self,
        page: &PageSummary,
        hints: &ExtractionHints,
    ) -> Result<ExtractedCard, ExtractionError> {
        let api_key = self
            .api_key
            .as_deref()
            .ok_or(ExtractionError::MissingApiKey(Config::GEMINI_API_KEY_ENV))?;
        let fields = load_wanted_fields(&self.fields_file)?;
        let prompt = build_prompt(&page.extraction_content(), &fields, hints);

        tracing::debug!(url = %page.url, fields = fields.len(), "sending extraction request");

        let request = GenerateRequest {
            contents: [Content {
                parts: [Part { text: &prompt }],
            }],
        };
        let mut endpoint =
            url::Url::parse(&self.endpoint).map_err(|e| ExtractionError::Http(e.to_string()))?;
        endpoint.query_pairs_mut().append_pair("key", api_key);

        let response = self
            .client
            .post(endpoint)
            .json(&request)
            .send()
            .await
            .map_err(|e| ExtractionError::Http(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "<body unavailable>".to_string());
            return Err(ExtractionError::Api {
                status: status.as_u16(),
                body,
            });
        }

        let parsed: GenerateResponse = response
            .json()
            .await
            .map_err(|e| ExtractionError::Http(e.to_string()))?;
        let text = parsed.text();
        if text.trim().is_empty() {
            return Err(ExtractionError::EmptyResponse);
        }

        Ok(parse_card(&text)?.annotate(page, hints, self.method_name()))
    }

    fn method_name(&self) -> &str {
        "Gemini API"
    }
}

/// Render an extraction outcome for the log.
pub fn display_extraction(outcome: &Result<ExtractedCard, ExtractionError>) -> String {
    let mut out = String::from("Extracted Model Card Information:\n");
    match outcome {
        Err(ExtractionError::InvalidJson { reason, raw }) => {
            out.push_str(&format!("  Error: {}\n  Raw response: {}\n", reason, raw));
        }
        Err(e) => out.push_str(&format!("  Error: {}\n", e)),
        Ok(card) => {
            for (key, value) in card.fields() {
                if METADATA_KEYS.contains(&key.as_str()) {
                    continue;
                }
                out.push_str(&format!("  {}: {}\n", title_case(key), display_value(value)));
            }
            out.push_str("Metadata:\n");
            for key in [
                "source_url",
                "extraction_method",
                "provided_model_name",
                "provided_developer_name",
            ] {
                let value = card.get(key).map_or("N/A".to_string(), display_value);
                out.push_str(&format!("  {}: {}\n", title_case(key), value));
            }
            let when = card
                .get("extraction_timestamp")
                .and_then(Value::as_f64)
                .and_then(|ts| chrono::DateTime::from_timestamp(ts as i64, 0))
                .map_or("N/A".to_string(), |dt| dt.format("%Y-%m-%d %H:%M:%S").to_string());
            out.push_str(&format!("  Timestamp: {}\n", when));
        }
    }
    out
}

fn display_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => "N/A".to_string(),
        other => other.to_string(),
    }
}

fn title_case(key: &str) -> String {
    key.split('_')
        .filter(|w| !w.is_empty())
        .map(|w| {
            let mut chars = w.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect::<String>(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}
