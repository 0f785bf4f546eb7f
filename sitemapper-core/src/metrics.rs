use indicatif::{ProgressBar, ProgressStyle};
use std::sync::atomic::{AtomicUsize, Ordering};

/// Receives crawl progress from the orchestrator.
///
/// `set_page_count` is called on every pass of the drain loop with the number
/// of known pages, `increment_visited` once per completed page.
pub trait CrawlRecorder: Send + Sync {
    fn set_page_count(&self, count: usize);
    fn increment_visited(&self);
}

/// Discards everything.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopRecorder;

impl CrawlRecorder for NoopRecorder {
    fn set_page_count(&self, _count: usize) {}
    fn increment_visited(&self) {}
}

/// Page count gauge and visited counter held in atomics.
#[derive(Debug, Default)]
pub struct CrawlStats {
    page_count: AtomicUsize,
    visited: AtomicUsize,
}

impl CrawlStats {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn page_count(&self) -> usize {
        self.page_count.load(Ordering::Relaxed)
    }

    pub fn visited(&self) -> usize {
        self.visited.load(Ordering::Relaxed)
    }
}

impl CrawlRecorder for CrawlStats {
    fn set_page_count(&self, count: usize) {
        self.page_count.store(count, Ordering::Relaxed);
    }

    fn increment_visited(&self) {
        self.visited.fetch_add(1, Ordering::Relaxed);
    }
}

/// Shows crawl progress as a terminal progress bar: the length tracks the
/// known pages, the position the visited ones.
pub struct ProgressRecorder {
    bar: ProgressBar,
}

impl ProgressRecorder {
    pub fn new() -> Self {
        let bar = ProgressBar::new(1);
        bar.set_style(
            ProgressStyle::with_template(
                "{spinner:.cyan} [{elapsed_precise}] {bar:40.cyan/blue} {pos}/{len} pages visited",
            )
            .unwrap_or_else(|_| ProgressStyle::default_bar()),
        );
        Self { bar }
    }

    pub fn hidden() -> Self {
        Self {
            bar: ProgressBar::hidden(),
        }
    }

    pub fn finish(&self) {
        self.bar.finish();
    }

    pub fn position(&self) -> u64 {
        self.bar.position()
    }

    pub fn length(&self) -> Option<u64> {
        self.bar.length()
    }
}

impl Default for ProgressRecorder {
    fn default() -> Self {
        Self::new()
    }
}

impl CrawlRecorder for ProgressRecorder {
    fn set_page_count(&self, count: usize) {
        self.bar.set_length(count as u64);
    }

    fn increment_visited(&self) {
        self.bar.inc(1);
    }
}
