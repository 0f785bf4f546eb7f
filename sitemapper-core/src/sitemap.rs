use crate::error::{CrawlError, Result};
use crate::graph::SiteGraph;
use crate::metrics::{CrawlRecorder, NoopRecorder};
use sitemapper_scanner::{Fetcher, FetcherConfig, Page, WorkerPool};
use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};
use url::{ParseError, Url};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CrawlState {
    /// Built but not yet run
    Ready,
    Running,
    Completed,
    Cancelled,
}

/// Builds the link graph of one site.
///
/// The `SiteMap` owns the page map for the duration of [`run`](Self::run):
/// it is the only writer, so every normalized path maps to exactly one page
/// however many workers discover it concurrently.
pub struct SiteMap {
    graph: SiteGraph,
    workers: usize,
    fetcher_config: FetcherConfig,
    recorder: Arc<dyn CrawlRecorder>,
    state: CrawlState,
}

impl SiteMap {
    /// A site map seeded with `start`. A missing scheme defaults to `http`
    /// and a missing path to `/`.
    pub fn new(start: &str, workers: usize) -> Result<Self> {
        if workers < 1 {
            return Err(CrawlError::InvalidConfiguration(
                "workers for a SiteMap must be > 0".to_string(),
            ));
        }

        let mut start = parse_start_url(start)?;
        start.set_fragment(None);

        let mut root = start.clone();
        root.set_path("/");
        root.set_query(None);

        Ok(Self {
            graph: SiteGraph::new(root, Page::new(start)),
            workers,
            fetcher_config: FetcherConfig::default(),
            recorder: Arc::new(NoopRecorder),
            state: CrawlState::Ready,
        })
    }

    pub fn with_fetch_timeout(mut self, timeout: Duration) -> Self {
        self.fetcher_config.timeout = timeout;
        self
    }

    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.fetcher_config.user_agent = user_agent.into();
        self
    }

    pub fn with_recorder(mut self, recorder: Arc<dyn CrawlRecorder>) -> Self {
        self.recorder = recorder;
        self
    }

    /// Scheme, host and port of the site being mapped.
    pub fn url(&self) -> &Url {
        self.graph.root()
    }

    /// A read handle on the pages, usable while the crawl runs.
    pub fn graph(&self) -> SiteGraph {
        self.graph.clone()
    }

    pub fn workers(&self) -> usize {
        self.workers
    }

    pub fn state(&self) -> CrawlState {
        self.state
    }

    /// Crawl until every known page has been visited or `cancel` fires.
    ///
    /// On cancellation the workers are told to stop, in-flight fetches are
    /// abandoned and [`CrawlError::Cancelled`] is returned. The pages gathered
    /// so far stay readable through [`graph`](Self::graph).
    pub async fn run(&mut self, cancel: CancellationToken) -> Result<()> {
        if self.state != CrawlState::Ready {
            return Err(CrawlError::AlreadyStarted);
        }
        let fetcher = Fetcher::with_config(self.fetcher_config.clone())?;
        self.state = CrawlState::Running;

        info!(
            "Crawling site {} with {} workers",
            self.graph.origin(),
            self.workers
        );

        let capacity = self.workers * 2;
        let (frontier, frontier_rx) = mpsc::channel(capacity);
        let (completed_tx, mut completed) = mpsc::channel(capacity);
        let pool = WorkerPool::start(self.workers, fetcher, frontier_rx, completed_tx);

        // Pages waiting for room on the frontier. They count as known, so the
        // crawl cannot complete while any remain.
        let mut backlog: VecDeque<Page> = self.graph.unvisited().into();
        let mut visited = 0;

        loop {
            let known = self.graph.len();
            self.recorder.set_page_count(known);

            if visited == known {
                pool.shutdown().await;
                self.state = CrawlState::Completed;
                info!("Crawl complete. Visited {} pages", visited);
                return Ok(());
            }

            tokio::select! {
                biased;

                _ = cancel.cancelled() => {
                    pool.stop();
                    self.state = CrawlState::Cancelled;
                    warn!("Crawl cancelled after visiting {} of {} pages", visited, known);
                    return Err(CrawlError::Cancelled { visited, known });
                }

                page = completed.recv() => {
                    let Some(page) = page else {
                        self.state = CrawlState::Cancelled;
                        return Err(CrawlError::WorkersExited { pending: known - visited });
                    };
                    visited += 1;
                    self.recorder.increment_visited();

                    let discovered = self.graph.add_pages(&page.links);
                    debug!(
                        "Visited {} ({} links, {} new pages)",
                        page.path(),
                        page.links.len(),
                        discovered.len()
                    );
                    self.graph.complete(page);
                    backlog.extend(discovered);
                }

                permit = frontier.reserve(), if !backlog.is_empty() => {
                    let Ok(permit) = permit else {
                        self.state = CrawlState::Cancelled;
                        return Err(CrawlError::WorkersExited { pending: known - visited });
                    };
                    if let Some(page) = backlog.pop_front() {
                        permit.send(page);
                    }
                }
            }
        }
    }
}

/// Parse the seed URL, retrying with `http://` when no scheme was given.
fn parse_start_url(start: &str) -> Result<Url> {
    let invalid = |url: &str, reason: String| CrawlError::InvalidUrl {
        url: url.to_string(),
        reason,
    };

    let url = match Url::parse(start) {
        Ok(url) if url.scheme() == "http" || url.scheme() == "https" => url,
        // "localhost:8080" parses with "localhost" as the scheme
        Ok(_) if looks_like_host_port(start) => parse_with_default_scheme(start)?,
        Ok(url) => {
            return Err(invalid(start, format!("unsupported scheme {:?}", url.scheme())));
        }
        Err(ParseError::RelativeUrlWithoutBase) => parse_with_default_scheme(start)?,
        Err(e) => return Err(invalid(start, e.to_string())),
    };

    if !url.has_host() {
        return Err(invalid(start, "no host".to_string()));
    }

    Ok(url)
}

/// `host:8080` or `host:/path`, as opposed to `mailto:someone`.
fn looks_like_host_port(start: &str) -> bool {
    !start.contains("://")
        && start
            .split_once(':')
            .is_some_and(|(_, rest)| rest.starts_with(|c: char| c.is_ascii_digit() || c == '/'))
}

fn parse_with_default_scheme(start: &str) -> Result<Url> {
    info!("No URL scheme specified using 'http'");
    let with_scheme = format!("http://{}", start);
    Url::parse(&with_scheme).map_err(|e| CrawlError::InvalidUrl {
        url: with_scheme,
        reason: e.to_string(),
    })
}
