use sitemapper_scanner::FetchError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum CrawlError {
    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),

    #[error("Failed to parse page {url:?}: {reason}")]
    InvalidUrl { url: String, reason: String },

    #[error("Crawl cancelled after visiting {visited} of {known} known pages")]
    Cancelled { visited: usize, known: usize },

    #[error(transparent)]
    Client(#[from] FetchError),

    #[error("Crawl already started")]
    AlreadyStarted,

    #[error("All workers exited with {pending} pages outstanding")]
    WorkersExited { pending: usize },
}

impl CrawlError {
    /// True when the crawl stopped early but the graph built so far is valid.
    pub fn is_incomplete(&self) -> bool {
        matches!(self, CrawlError::Cancelled { .. })
    }
}

pub type Result<T> = std::result::Result<T, CrawlError>;
