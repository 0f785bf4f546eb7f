// Read-only HTTP endpoint for the site graph

use axum::{Json, Router, extract::State, routing::get};
use sitemapper_core::{GraphView, SiteGraph};
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tower_http::trace::TraceLayer;

pub fn router(graph: SiteGraph) -> Router {
    Router::new()
        .route("/json", get(sitemap_json))
        .route("/health", get(health))
        .layer(TraceLayer::new_for_http())
        .with_state(graph)
}

/// Serve the graph until `shutdown` fires. Works during and after the crawl.
pub async fn serve(
    listener: TcpListener,
    graph: SiteGraph,
    shutdown: CancellationToken,
) -> std::io::Result<()> {
    axum::serve(listener, router(graph))
        .with_graceful_shutdown(async move { shutdown.cancelled().await })
        .await
}

async fn sitemap_json(State(graph): State<SiteGraph>) -> Json<GraphView> {
    Json(graph.view())
}

async fn health() -> &'static str {
    "ok"
}
