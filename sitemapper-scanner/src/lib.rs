pub mod error;
pub mod fetcher;
pub mod normalize;
pub mod page;
pub mod pool;

pub use error::{FetchError, LinkError};
pub use fetcher::{Fetcher, FetcherConfig, extract_links};
pub use normalize::normalize_link;
pub use page::Page;
pub use pool::WorkerPool;
