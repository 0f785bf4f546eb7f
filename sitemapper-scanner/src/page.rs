use crate::error::FetchError;
use crate::normalize::normalize_link;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::debug;
use url::Url;

/// A single node of the site graph.
///
/// A page is written only by the worker visiting it and is read-only once it
/// has been handed back to the orchestrator.
#[derive(Debug, Clone)]
pub struct Page {
    pub url: Url,
    pub visited: bool,
    pub broken: bool,
    /// Normalized in-site path -> number of anchors pointing at it.
    pub links: HashMap<String, usize>,
    pub last_error: Option<Arc<FetchError>>,
}

impl Page {
    /// A new, unvisited page.
    pub fn new(url: Url) -> Self {
        Self {
            url,
            visited: false,
            broken: false,
            links: HashMap::new(),
            last_error: None,
        }
    }

    /// The normalized path this page is tracked under.
    pub fn path(&self) -> &str {
        self.url.path()
    }

    /// Normalize each raw href against this page's URL and count the
    /// accepted paths. Rejected links are dropped.
    pub fn add_links<I, S>(&mut self, links: I)
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        for link in links {
            match normalize_link(&self.url, link.as_ref()) {
                Ok(path) => *self.links.entry(path).or_insert(0) += 1,
                Err(e) => debug!("Skipping link on {}: {}", self.url, e),
            }
        }
    }

    /// Record a failed fetch. A broken page never carries links.
    pub fn mark_broken(&mut self, error: FetchError) {
        self.broken = true;
        self.links.clear();
        self.last_error = Some(Arc::new(error));
    }
}
