use crate::error::{FetchError, Result};
use crate::page::Page;
use reqwest::Client;
use scraper::{ElementRef, Html};
use std::time::{Duration, Instant};
use tracing::{debug, warn};
use url::Url;

pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(5);
pub const DEFAULT_USER_AGENT: &str = concat!("sitemapper/", env!("CARGO_PKG_VERSION"));

/// Settings for the HTTP client shared by every worker.
#[derive(Debug, Clone)]
pub struct FetcherConfig {
    pub timeout: Duration,
    pub user_agent: String,
}

impl Default for FetcherConfig {
    fn default() -> Self {
        Self {
            timeout: DEFAULT_TIMEOUT,
            user_agent: DEFAULT_USER_AGENT.to_string(),
        }
    }
}

/// Issues GET requests and turns the responses into page links.
#[derive(Debug, Clone)]
pub struct Fetcher {
    client: Client,
}

impl Fetcher {
    pub fn new() -> Result<Self> {
        Self::with_config(FetcherConfig::default())
    }

    pub fn with_timeout(timeout: Duration) -> Result<Self> {
        Self::with_config(FetcherConfig {
            timeout,
            ..FetcherConfig::default()
        })
    }

    pub fn with_config(config: FetcherConfig) -> Result<Self> {
        let client = Client::builder()
            .user_agent(config.user_agent)
            .timeout(config.timeout)
            .pool_idle_timeout(Duration::from_secs(90))
            .redirect(reqwest::redirect::Policy::limited(5))
            .build()
            .map_err(FetchError::Client)?;

        Ok(Self { client })
    }

    /// GET `url` and return the body. Transport errors and any status outside
    /// 200-299 are failures.
    pub async fn fetch(&self, url: &Url) -> Result<String> {
        let response = self.client.get(url.as_str()).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status(status));
        }

        Ok(response.text().await?)
    }

    /// Fetch the page and fill in its links, or mark it broken.
    pub async fn visit(&self, page: &mut Page) {
        page.visited = true;

        let start = Instant::now();
        match self.fetch(&page.url).await {
            Ok(body) => {
                let links = extract_links(&body);
                debug!(
                    "Fetched {} in {:?}, {} anchors",
                    page.url,
                    start.elapsed(),
                    links.len()
                );
                page.add_links(links);
            }
            Err(e) => {
                warn!("Broken page {}: {}", page.url, e);
                page.mark_broken(e);
            }
        }
    }
}

/// Every `href` of every `<a>` element, in document order. Duplicates are
/// kept.
pub fn extract_links(html: &str) -> Vec<String> {
    let document = Html::parse_document(html);

    document
        .root_element()
        .descendants()
        .filter_map(ElementRef::wrap)
        .filter(|element| element.value().name() == "a")
        .filter_map(|element| element.value().attr("href"))
        .map(str::to_string)
        .collect()
}
