use reqwest::StatusCode;
use thiserror::Error;

/// Why a single page could not be fetched. Every variant is handled the same
/// way by the crawl: the page is marked broken and the cause is kept.
#[derive(Error, Debug)]
pub enum FetchError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Status code {}", .0.as_u16())]
    Status(StatusCode),

    #[error("Failed to build HTTP client: {0}")]
    Client(#[source] reqwest::Error),
}

/// Why a raw href was not accepted as an in-site path.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LinkError {
    #[error("malformed link {link:?}: {source}")]
    Malformed {
        link: String,
        #[source]
        source: url::ParseError,
    },

    #[error("unsupported scheme {0:?}")]
    UnsupportedScheme(String),

    #[error("link to another host {0:?}")]
    CrossSite(String),

    #[error("link to the page itself")]
    SelfLink,
}

pub type Result<T> = std::result::Result<T, FetchError>;
