use crate::view::GraphView;
use sitemapper_scanner::Page;
use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};
use url::Url;

/// Shared handle on the pages of one site, keyed by normalized path.
///
/// Clones share the same map. Readers can take snapshots at any time,
/// including mid-crawl; only the orchestrating [`SiteMap`](crate::SiteMap)
/// adds or updates pages.
#[derive(Debug, Clone)]
pub struct SiteGraph {
    root: Url,
    pages: Arc<RwLock<HashMap<String, Page>>>,
}

impl SiteGraph {
    pub(crate) fn new(root: Url, seed: Page) -> Self {
        let pages = HashMap::from([(seed.path().to_string(), seed)]);
        Self {
            root,
            pages: Arc::new(RwLock::new(pages)),
        }
    }

    /// Scheme, host and port of the site.
    pub fn root(&self) -> &Url {
        &self.root
    }

    /// The site origin without a path, e.g. `http://example.com`.
    pub fn origin(&self) -> String {
        self.root.origin().ascii_serialization()
    }

    pub fn len(&self) -> usize {
        self.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.read().is_empty()
    }

    pub fn contains(&self, path: &str) -> bool {
        self.read().contains_key(path)
    }

    pub fn get(&self, path: &str) -> Option<Page> {
        self.read().get(path).cloned()
    }

    /// Known paths in sorted order.
    pub fn paths(&self) -> Vec<String> {
        let mut paths: Vec<String> = self.read().keys().cloned().collect();
        paths.sort();
        paths
    }

    pub fn visited_count(&self) -> usize {
        self.read().values().filter(|page| page.visited).count()
    }

    /// A point-in-time copy of every page.
    pub fn snapshot(&self) -> HashMap<String, Page> {
        self.read().clone()
    }

    /// The node/edge projection served to the visualization.
    pub fn view(&self) -> GraphView {
        GraphView::from_pages(&self.read())
    }

    /// Create an unvisited page for every path in `links` not already known
    /// and return copies of the new pages for the frontier. This is the only
    /// place pages are added.
    pub(crate) fn add_pages(&self, links: &HashMap<String, usize>) -> Vec<Page> {
        let mut pages = self.write();
        let mut added = Vec::new();

        for path in links.keys() {
            if pages.contains_key(path) {
                continue;
            }
            let mut url = self.root.clone();
            url.set_path(path);
            let page = Page::new(url);
            pages.insert(path.clone(), page.clone());
            added.push(page);
        }

        added
    }

    /// Store a page handed back by a worker over its unvisited entry.
    pub(crate) fn complete(&self, page: Page) {
        self.write().insert(page.path().to_string(), page);
    }

    pub(crate) fn unvisited(&self) -> Vec<Page> {
        self.read()
            .values()
            .filter(|page| !page.visited)
            .cloned()
            .collect()
    }

    fn read(&self) -> RwLockReadGuard<'_, HashMap<String, Page>> {
        self.pages.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, HashMap<String, Page>> {
        self.pages.write().unwrap_or_else(PoisonError::into_inner)
    }
}
