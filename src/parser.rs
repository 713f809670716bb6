use scraper::{Html, Selector};

const HIDDEN_TEXT_TAGS: &[&str] = &["script", "style", "noscript", "template"];

/// A parsed HTML document with the handful of fields the crawler reads.
pub struct ParsedPage {
    document: Html,
}

impl ParsedPage {
    pub fn parse(html_body: &str) -> Self {
        Self {
            document: Html::parse_document(html_body),
        }
    }

    /// Trimmed `<title>` text, empty when the page has none.
    pub fn title(&self) -> String {
        let Ok(selector) = Selector::parse("title") else {
            return String::new();
        };
        self.document
            .select(&selector)
            .next()
            .map(|el| el.text().collect::<String>().trim().to_string())
            .unwrap_or_default()
    }

    /// `<meta name="description">` content, if present and non-empty.
    pub fn meta_description(&self) -> Option<String> {
        let selector = Selector::parse(r#"meta[name="description"]"#).ok()?;
        self.document
            .select(&selector)
            .filter_map(|el| el.value().attr("content"))
            .map(|c| c.trim().to_string())
            .find(|c| !c.is_empty())
    }

    /// Visible text, one trimmed non-empty text node per line.
    pub fn body_text(&self) -> String {
        let mut lines = Vec::new();
        for node in self.document.root_element().descendants() {
            let Some(text) = node.value().as_text() else {
                continue;
            };
            let hidden = node.ancestors().any(|ancestor| {
                ancestor
                    .value()
                    .as_element()
                    .is_some_and(|el| HIDDEN_TEXT_TAGS.contains(&el.name()))
            });
            if hidden {
                continue;
            }
            let trimmed = text.trim();
            if !trimmed.is_empty() {
                lines.push(trimmed);
            }
        }
        lines.join("\n")
    }

    /// Every non-empty `href` on an `<a>` tag, in document order.
    pub fn links(&self) -> Vec<String> {
        let Ok(selector) = Selector::parse("a[href]") else {
            return Vec::new();
        };
        self.document
            .select(&selector)
            .filter_map(|el| el.value().attr("href"))
            .map(str::trim)
            .filter(|href| !href.is_empty())
            .map(str::to_string)
            .collect()
    }
}

/// Extract all hyperlink URLs from HTML content
///
/// # Examples
/// ```
/// use modelcard_crawler::parser::extract_links;
///
/// let html = r#"<html><body><a href="https://example.com">Link</a></body></html>"#;
/// let links = extract_links(html);
/// assert_eq!(links, vec!["https://example.com"]);
/// ```
pub fn extract_links(html_body: &str) -> Vec<String> {
    ParsedPage::parse(html_body).links()
}

/// First `max_chars` characters, with "..." appended when text was cut.
pub fn preview(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => format!("{}...", &text[..idx]),
        None => text.to_string(),
    }
}
