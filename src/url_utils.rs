//! URL utilities for consistent crawling behavior across modules.

use regex::{Regex, RegexBuilder};
use std::collections::HashSet;
use url::Url;

use crate::config::Config;

/// Non-HTML file extensions skipped by default.
pub const DEFAULT_DENY_FILETYPES: &[&str] = &[
    "jpg", "jpeg", "png", "gif", "svg", "pdf", "zip", "tar", "gz", "mp4", "pptx", "docx", "xlsx",
];

/// Strip the fragment so `page#a` and `page#b` dedupe to one URL.
pub fn normalize(url: &str) -> String {
    match Url::parse(url.trim()) {
        Ok(mut parsed) => {
            parsed.set_fragment(None);
            parsed.to_string()
        }
        Err(_) => url
            .trim()
            .split_once('#')
            .map(|(head, _)| head)
            .unwrap_or(url.trim())
            .to_string(),
    }
}

/// Last two labels of a hostname; fallback when the PSL has no opinion.
pub fn get_root_domain(hostname: &str) -> String {
    let parts: Vec<&str> = hostname.split('.').collect();
    if parts.len() >= 2 {
        format!("{}.{}", parts[parts.len() - 2], parts[parts.len() - 1])
    } else {
        hostname.to_string()
    }
}

/// Extract registrable domain (eTLD+1) using Public Suffix List.
/// Handles multi-label TLDs: www.example.co.uk -> example.co.uk
pub fn get_registrable_domain(hostname: &str) -> String {
    let hostname = hostname.trim_end_matches('.').to_ascii_lowercase();
    match psl::domain(hostname.as_bytes()) {
        Some(domain) => String::from_utf8_lossy(domain.as_bytes()).to_string(),
        None => get_root_domain(&hostname),
    }
}

/// Domain key used for the allow-set and per-domain budgets.
/// IP literals are their own key.
pub fn domain_key(url: &str) -> Option<String> {
    let parsed = Url::parse(url).ok()?;
    match parsed.host()? {
        url::Host::Domain(host) => Some(get_registrable_domain(host)),
        url::Host::Ipv4(ip) => Some(ip.to_string()),
        url::Host::Ipv6(ip) => Some(ip.to_string()),
    }
}

/// `scheme://host[:port]`, the key for per-origin robots policies.
pub fn origin(url: &str) -> Option<String> {
    let parsed = Url::parse(url).ok()?;
    let host = parsed.host_str()?;
    Some(match parsed.port() {
        Some(port) => format!("{}://{}:{}", parsed.scheme(), host, port),
        None => format!("{}://{}", parsed.scheme(), host),
    })
}

pub fn robots_url(url: &str) -> Option<String> {
    origin(url).map(|o| format!("{}/robots.txt", o))
}

pub fn convert_to_absolute_url(link: &str, base_url: &str) -> Result<String, String> {
    let base = Url::parse(base_url).map_err(|e| e.to_string())?;
    let absolute_url = base.join(link).map_err(|e| e.to_string())?;
    Ok(absolute_url.to_string())
}

/// Links that never lead to a crawlable page.
pub fn is_skippable_scheme(url: &str) -> bool {
    let lower = url.trim_start().to_ascii_lowercase();
    lower.starts_with("mailto:") || lower.starts_with("javascript:")
}

pub fn is_html_content_type(content_type: &str) -> bool {
    let lower = content_type.to_ascii_lowercase();
    lower.starts_with("text/html") || lower.starts_with("application/xhtml+xml")
}

/// Turn a page title into a filesystem-safe stem.
pub fn sanitize_filename(title: &str) -> String {
    let mut out = String::with_capacity(title.len());
    let mut in_gap = false;
    for c in title.chars() {
        if c.is_ascii_alphanumeric() {
            out.push(c);
            in_gap = false;
        } else if !in_gap {
            out.push('_');
            in_gap = true;
        }
    }
    let truncated: String = out.chars().take(Config::MAX_FILENAME_CHARS).collect();
    if truncated.is_empty() {
        "page".to_string()
    } else {
        truncated
    }
}

/// Domain allow-set plus file-type denylist.
#[derive(Debug, Clone)]
pub struct UrlFilter {
    allowed_domains: HashSet<String>,
    deny_filetypes: Option<Regex>,
}

impl UrlFilter {
    pub fn new<D, E>(allowed_domains: D, deny_extensions: E) -> Result<Self, regex::Error>
    where
        D: IntoIterator,
        D::Item: AsRef<str>,
        E: IntoIterator,
        E::Item: AsRef<str>,
    {
        let allowed_domains = allowed_domains
            .into_iter()
            .map(|d| d.as_ref().trim().to_ascii_lowercase())
            .filter(|d| !d.is_empty())
            .collect();

        let extensions: Vec<String> = deny_extensions
            .into_iter()
            .map(|e| regex::escape(e.as_ref().trim().trim_start_matches('.')))
            .filter(|e| !e.is_empty())
            .collect();

        let deny_filetypes = if extensions.is_empty() {
            None
        } else {
            let pattern = format!(r"\.({})([?#].*)?$", extensions.join("|"));
            Some(RegexBuilder::new(&pattern).case_insensitive(true).build()?)
        };

        Ok(Self {
            allowed_domains,
            deny_filetypes,
        })
    }

    /// An empty allow-set lets every domain through.
    pub fn is_permissive(&self) -> bool {
        self.allowed_domains.is_empty()
    }

    pub fn is_denied_filetype(&self, url: &str) -> bool {
        self.deny_filetypes
            .as_ref()
            .is_some_and(|re| re.is_match(url))
    }

    pub fn allowed(&self, url: &str) -> bool {
        if self.is_denied_filetype(url) {
            return false;
        }
        if self.is_permissive() {
            return true;
        }
        domain_key(url).is_some_and(|key| self.allowed_domains.contains(&key))
    }
}
