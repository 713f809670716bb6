use std::collections::{HashSet, VecDeque};

/// One unit of crawl work. Consumed exactly once by the crawler.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FrontierEntry {
    pub url: String,
    pub depth: u32,
}

/// FIFO frontier with a run-scoped seen-set.
///
/// URLs are marked seen when pushed, not when popped, so a link discovered
/// on many pages before it is processed only occupies one queue slot.
#[derive(Debug, Default)]
pub struct Frontier {
    queue: VecDeque<FrontierEntry>,
    seen: HashSet<String>,
}

impl Frontier {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue `url` at `depth` unless it was queued before. Returns whether it was added.
    pub fn push(&mut self, url: impl Into<String>, depth: u32) -> bool {
        let url = url.into();
        if !self.seen.insert(url.clone()) {
            return false;
        }
        self.queue.push_back(FrontierEntry { url, depth });
        true
    }

    pub fn pop(&mut self) -> Option<FrontierEntry> {
        self.queue.pop_front()
    }

    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    pub fn len(&self) -> usize {
        self.queue.len()
    }

    pub fn contains(&self, url: &str) -> bool {
        self.seen.contains(url)
    }

    /// Number of distinct URLs ever pushed during this run.
    pub fn seen_count(&self) -> usize {
        self.seen.len()
    }

    pub fn stats(&self) -> FrontierStats {
        FrontierStats {
            total_queued: self.queue.len(),
            total_seen: self.seen.len(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct FrontierStats {
    pub total_queued: usize,
    pub total_seen: usize,
}

impl std::fmt::Display for FrontierStats {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Frontier: {} queued URLs, {} seen",
            self.total_queued, self.total_seen
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fifo_order() {
        let mut frontier = Frontier::new();
        assert!(frontier.push("https://example.com/a", 0));
        assert!(frontier.push("https://example.com/b", 1));
        assert!(frontier.push("https://example.com/c", 1));

        let order: Vec<String> = std::iter::from_fn(|| frontier.pop().map(|e| e.url)).collect();
        assert_eq!(
            order,
            vec![
                "https://example.com/a",
                "https://example.com/b",
                "https://example.com/c"
            ]
        );
        assert!(frontier.is_empty());
    }

    #[test]
    fn test_duplicates_rejected_before_pop() {
        let mut frontier = Frontier::new();
        assert!(frontier.push("https://dup.test/", 0));
        assert!(!frontier.push("https://dup.test/", 2));
        assert_eq!(frontier.len(), 1);

        let entry = frontier.pop().unwrap();
        assert_eq!(entry.depth, 0);

        // Still rejected after the entry was consumed.
        assert!(!frontier.push("https://dup.test/", 1));
        assert!(frontier.is_empty());
        assert_eq!(frontier.seen_count(), 1);
        assert!(frontier.contains("https://dup.test/"));
    }

    #[test]
    fn test_stats_display() {
        let mut frontier = Frontier::new();
        frontier.push("https://a.test/", 0);
        frontier.push("https://b.test/", 0);
        frontier.pop();
        assert_eq!(
            frontier.stats().to_string(),
            "Frontier: 1 queued URLs, 2 seen"
        );
    }
}
