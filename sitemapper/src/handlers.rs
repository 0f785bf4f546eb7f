use crate::server;
use anyhow::{Context, Result};
use colored::Colorize;
use sitemapper_core::report::{generate_dot_report, generate_sitemap_report};
use sitemapper_core::{CrawlError, ProgressRecorder, SiteGraph, SiteMap};
use std::fs;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReportFormat {
    Text,
    Json,
    Dot,
}

impl ReportFormat {
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "text" => Some(ReportFormat::Text),
            "json" => Some(ReportFormat::Json),
            "dot" | "graphviz" => Some(ReportFormat::Dot),
            _ => None,
        }
    }
}

/// Options for one mapping run
#[derive(Debug, Clone)]
pub struct MapOptions {
    pub url: String,
    pub workers: usize,
    pub timeout: Duration,
    /// Where to serve the JSON view, `None` to not serve it
    pub listen: Option<SocketAddr>,
    /// Keep serving after the crawl until interrupted
    pub serve_after_crawl: bool,
    pub format: ReportFormat,
    pub output: Option<PathBuf>,
    pub quiet: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MapOutcome {
    pub pages: usize,
    pub broken: usize,
    pub completed: bool,
}

/// Install the fmt subscriber, honouring `RUST_LOG` and defaulting to info.
pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

/// Resolves on Ctrl-C or, on unix, SIGTERM.
pub async fn wait_for_signal() {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{SignalKind, signal};
        match signal(SignalKind::terminate()) {
            Ok(mut terminate) => {
                tokio::select! {
                    _ = tokio::signal::ctrl_c() => {}
                    _ = terminate.recv() => {}
                }
                return;
            }
            Err(e) => warn!("Unable to listen for SIGTERM: {}", e),
        }
    }

    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("Unable to listen for Ctrl-C: {}", e);
        std::future::pending::<()>().await;
    }
}

/// Cancel each token in turn as interrupts arrive: the first stops the
/// crawl, the second stops the server.
pub async fn forward_signals(tokens: Vec<CancellationToken>) {
    for token in tokens {
        wait_for_signal().await;
        info!("Received shutdown signal");
        token.cancel();
    }
}

/// Crawl the site, write the report and optionally serve the JSON view.
///
/// `interrupt` cancels the crawl; once a crawl has finished it also stops
/// the server. After a cancelled crawl the server runs until `shutdown`.
pub async fn handle_map(
    options: MapOptions,
    interrupt: CancellationToken,
    shutdown: CancellationToken,
) -> Result<MapOutcome> {
    let recorder = Arc::new(if options.quiet {
        ProgressRecorder::hidden()
    } else {
        ProgressRecorder::new()
    });

    let mut site = SiteMap::new(&options.url, options.workers)
        .with_context(|| format!("Unable to map {}", options.url))?
        .with_fetch_timeout(options.timeout)
        .with_recorder(recorder.clone());
    let graph = site.graph();

    let server = match options.listen {
        Some(addr) => {
            let listener = TcpListener::bind(addr)
                .await
                .with_context(|| format!("Failed to listen on {}", addr))?;
            let local = listener.local_addr()?;
            let server_stop = CancellationToken::new();
            let handle = tokio::spawn(server::serve(listener, graph.clone(), server_stop.clone()));
            info!("The sitemap results are available at http://{}/json", local);
            Some((handle, server_stop))
        }
        None => None,
    };

    let mapped = crawl_and_report(&mut site, &options, &interrupt).await;
    recorder.finish();

    // The server is stopped and joined on every exit, including errors
    let completed = match server {
        Some((handle, server_stop)) => {
            if let (Ok(completed), true) = (&mapped, options.serve_after_crawl) {
                println!("{} Serving the sitemap, press Ctrl-C to exit", "→".blue());
                if *completed {
                    interrupt.cancelled().await;
                } else {
                    shutdown.cancelled().await;
                }
            }
            server_stop.cancel();
            let served = handle.await;
            let completed = mapped?;
            served.context("Server task failed")?.context("Server error")?;
            completed
        }
        None => mapped?,
    };

    let snapshot = graph.snapshot();
    Ok(MapOutcome {
        pages: snapshot.len(),
        broken: snapshot.values().filter(|page| page.broken).count(),
        completed,
    })
}

/// Run the crawl and write the report. Returns whether the crawl completed.
async fn crawl_and_report(
    site: &mut SiteMap,
    options: &MapOptions,
    interrupt: &CancellationToken,
) -> Result<bool> {
    let graph = site.graph();
    info!("Crawling site {}", graph.origin());

    let completed = match site.run(interrupt.clone()).await {
        Ok(()) => true,
        Err(e @ CrawlError::Cancelled { .. }) => {
            warn!("Site crawling unfinished: {}", e);
            false
        }
        Err(e) => return Err(e).context("Crawl failed"),
    };

    let report = render_report(&graph, options.format)?;
    write_report(&report, options.output.as_deref())?;
    Ok(completed)
}

pub fn render_report(graph: &SiteGraph, format: ReportFormat) -> Result<String> {
    let report = match format {
        ReportFormat::Text => generate_sitemap_report(graph),
        ReportFormat::Json => graph
            .view()
            .to_json_pretty()
            .context("Failed to serialize sitemap as JSON")?,
        ReportFormat::Dot => generate_dot_report(graph),
    };
    Ok(report)
}

/// Write to `output`, or stdout when no path is given.
pub fn write_report(report: &str, output: Option<&Path>) -> Result<()> {
    match output {
        Some(path) => {
            fs::write(path, report)
                .with_context(|| format!("Failed to write report to {}", path.display()))?;
            println!(
                "{} Report saved to {}",
                "✓".green().bold(),
                path.display().to_string().bright_white()
            );
        }
        None => print!("{}", report),
    }
    Ok(())
}
