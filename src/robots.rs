use robotstxt::DefaultMatcher;
use std::collections::HashMap;

use crate::network::{FetchError, PageFetcher};
use crate::url_utils;

/// Cached crawl permission for one origin.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RobotsPolicy {
    /// robots.txt was unreachable; treat every path as allowed.
    PermitAll,
    /// Raw robots.txt body, matched lazily per URL.
    Rules(String),
}

impl RobotsPolicy {
    pub fn is_allowed(&self, url: &str, agent: &str) -> bool {
        match self {
            RobotsPolicy::PermitAll => true,
            RobotsPolicy::Rules(body) => {
                let mut matcher = DefaultMatcher::default();
                matcher.one_agent_allowed_by_robots(body, agent, url)
            }
        }
    }
}

/// Per-origin robots.txt cache, scoped to a single crawl run.
#[derive(Debug)]
pub struct RobotsCache {
    agent: String,
    policies: HashMap<String, RobotsPolicy>,
}

impl RobotsCache {
    pub fn new(user_agent: &str) -> Self {
        Self {
            agent: agent_token(user_agent),
            policies: HashMap::new(),
        }
    }

    /// Product token the robots.txt groups are matched against.
    pub fn agent(&self) -> &str {
        &self.agent
    }

    pub fn len(&self) -> usize {
        self.policies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.policies.is_empty()
    }

    pub fn cached(&self, origin: &str) -> Option<&RobotsPolicy> {
        self.policies.get(origin)
    }

    /// Return the cached policy for `origin`, fetching `{origin}/robots.txt` on first use.
    /// Any fetch failure is cached as [`RobotsPolicy::PermitAll`].
    pub async fn get_policy(&mut self, origin: &str, fetcher: &dyn PageFetcher) -> &RobotsPolicy {
        if !self.policies.contains_key(origin) {
            let fetched = match url_utils::robots_url(origin) {
                Some(robots_url) => fetcher.fetch_text(&robots_url).await,
                None => Err(FetchError::NetworkError(format!("bad origin {:?}", origin))),
            };
            let policy = match fetched {
                Ok(body) => {
                    tracing::debug!(origin, bytes = body.len(), "cached robots.txt");
                    RobotsPolicy::Rules(body)
                }
                Err(e) => {
                    tracing::debug!(origin, error = %e, "robots.txt unavailable, permitting all");
                    RobotsPolicy::PermitAll
                }
            };
            self.policies.insert(origin.to_string(), policy);
        }
        &self.policies[origin]
    }

    /// Consult the cached policy for the URL's origin. Unknown origins are permitted.
    pub fn can_fetch(&self, url: &str) -> bool {
        url_utils::origin(url)
            .and_then(|origin| self.policies.get(&origin))
            .map_or(true, |policy| policy.is_allowed(url, &self.agent))
    }
}

/// "ModelCardBot/0.1 (+research)" -> "ModelCardBot"
fn agent_token(user_agent: &str) -> String {
    let token: String = user_agent
        .trim()
        .chars()
        .take_while(|c| c.is_ascii_alphanumeric() || *c == '-' || *c == '_')
        .collect();
    if token.is_empty() {
        "*".to_string()
    } else {
        token
    }
}
