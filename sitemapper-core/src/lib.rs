pub mod error;
pub mod graph;
pub mod metrics;
pub mod report;
pub mod sitemap;
pub mod view;

pub use error::CrawlError;
pub use graph::SiteGraph;
pub use metrics::{CrawlRecorder, CrawlStats, NoopRecorder, ProgressRecorder};
pub use sitemap::{CrawlState, SiteMap};
pub use view::GraphView;

pub use sitemapper_scanner::Page;
