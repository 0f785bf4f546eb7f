// Tests for crawling a site end to end against a mock server

use sitemapper_core::{CrawlError, CrawlState, CrawlStats, SiteGraph, SiteMap, view::BROKEN_COLOR};
use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio_util::sync::CancellationToken;
use wiremock::{
    Mock, MockServer, ResponseTemplate,
    matchers::{header, method, path},
};

// ============================================================================
// Fixtures
// ============================================================================

fn anchors(links: &[&str]) -> String {
    let mut html = String::from("<html><body>");
    for link in links {
        html.push_str(&format!(r#"<a href="{}">{}</a>"#, link, link));
    }
    html.push_str("</body></html>");
    html
}

async fn mount_page(server: &MockServer, route: &str, links: &[&str]) {
    mount_slow_page(server, route, links, Duration::ZERO).await;
}

async fn mount_slow_page(server: &MockServer, route: &str, links: &[&str], delay: Duration) {
    Mock::given(method("GET"))
        .and(path(route))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("content-type", "text/html")
                .set_body_string(anchors(links))
                .set_delay(delay),
        )
        .mount(server)
        .await;
}

fn paths(graph: &SiteGraph) -> BTreeSet<String> {
    graph.paths().into_iter().collect()
}

fn set(items: &[&str]) -> BTreeSet<String> {
    items.iter().map(|s| s.to_string()).collect()
}

/// Run the crawl to completion, failing the test if it takes too long.
async fn crawl(site: &mut SiteMap) {
    tokio::time::timeout(Duration::from_secs(10), site.run(CancellationToken::new()))
        .await
        .expect("crawl did not terminate")
        .expect("crawl failed");
}

fn assert_closed(graph: &SiteGraph) {
    let pages = graph.snapshot();
    for (key, page) in &pages {
        assert_eq!(key, page.path(), "page stored under the wrong key");
        assert!(page.visited, "{} never visited", key);
        if page.broken {
            assert!(page.links.is_empty(), "broken page {} has links", key);
        }
        for target in page.links.keys() {
            assert!(pages.contains_key(target), "dangling edge {} -> {}", key, target);
        }
    }
}

// ============================================================================
// Completed crawls
// ============================================================================

#[tokio::test]
async fn test_crawl_scenario_with_broken_page() {
    let server = MockServer::start().await;
    mount_page(&server, "/", &["/a", "/b"]).await;
    mount_page(&server, "/a", &["/", "/c"]).await;
    mount_page(&server, "/b", &[]).await;
    // /c is not mounted, wiremock answers 404

    let mut site = SiteMap::new(&server.uri(), 2).unwrap();
    crawl(&mut site).await;
    let graph = site.graph();

    assert_eq!(site.state(), CrawlState::Completed);
    assert_eq!(paths(&graph), set(&["/", "/a", "/b", "/c"]));
    assert_closed(&graph);

    let c = graph.get("/c").unwrap();
    assert!(c.broken);
    assert!(c.links.is_empty());
    assert!(c.last_error.is_some());
    assert!(!graph.get("/b").unwrap().broken);

    let view = graph.view();
    let edges: BTreeSet<(String, String)> = view
        .edges
        .iter()
        .map(|e| (e.source.clone(), e.target.clone()))
        .collect();
    let want: BTreeSet<(String, String)> = [("/", "/a"), ("/", "/b"), ("/a", "/"), ("/a", "/c")]
        .iter()
        .map(|(s, t)| (s.to_string(), t.to_string()))
        .collect();
    assert_eq!(view.edges.len(), 4);
    assert_eq!(edges, want);

    let node = view.nodes.iter().find(|n| n.id == "/c").unwrap();
    assert_eq!(node.color, BROKEN_COLOR);
    assert!(view.nodes.iter().filter(|n| n.id != "/c").all(|n| n.color.is_empty()));
}

#[tokio::test]
async fn test_crawl_from_inner_start_page() {
    let server = MockServer::start().await;
    mount_page(&server, "/", &["hello-world", "values", "variables"]).await;
    mount_page(&server, "/hello-world", &["./", "values", "https://twitter.com/x"]).await;
    mount_page(&server, "/values", &["/", "variables", "mailto:me@example.com"]).await;
    mount_page(&server, "/variables", &["/", "constants"]).await;

    let start = format!("{}/hello-world", server.uri());
    let mut site = SiteMap::new(&start, 2).unwrap();
    crawl(&mut site).await;
    let pages = site.graph().snapshot();

    let want: HashMap<&str, Vec<&str>> = HashMap::from([
        ("/", vec!["/hello-world", "/values", "/variables"]),
        ("/hello-world", vec!["/", "/values"]),
        ("/values", vec!["/", "/variables"]),
        ("/variables", vec!["/", "/constants"]),
        ("/constants", vec![]),
    ]);
    assert_eq!(pages.len(), want.len());
    for (path, targets) in want {
        let page = &pages[path];
        let mut got: Vec<&str> = page.links.keys().map(String::as_str).collect();
        got.sort();
        assert_eq!(got, targets, "links of {}", path);
        assert!(page.links.values().all(|count| *count == 1));
    }
    assert!(pages["/constants"].broken);
}

#[tokio::test]
async fn test_crawl_terminates_on_cycle() {
    let server = MockServer::start().await;
    mount_page(&server, "/", &["/a"]).await;
    mount_page(&server, "/a", &["/"]).await;

    let mut site = SiteMap::new(&server.uri(), 3).unwrap();
    crawl(&mut site).await;

    assert_eq!(paths(&site.graph()), set(&["/", "/a"]));
    assert_closed(&site.graph());
}

#[tokio::test]
async fn test_single_page_site() {
    let server = MockServer::start().await;
    mount_page(&server, "/", &["#top", "/", "https://elsewhere.example/"]).await;

    let mut site = SiteMap::new(&server.uri(), 1).unwrap();
    crawl(&mut site).await;

    let graph = site.graph();
    assert_eq!(graph.len(), 1);
    assert!(graph.get("/").unwrap().links.is_empty());
    assert!(graph.view().edges.is_empty());
}

#[tokio::test]
async fn test_broken_seed_page() {
    let server = MockServer::start().await;

    let mut site = SiteMap::new(&server.uri(), 1).unwrap();
    crawl(&mut site).await;

    let seed = site.graph().get("/").unwrap();
    assert!(seed.visited);
    assert!(seed.broken);
}

#[tokio::test]
async fn test_duplicate_links_counted() {
    let server = MockServer::start().await;
    mount_page(&server, "/", &["/a", "/a", "/b"]).await;
    mount_page(&server, "/a", &[]).await;
    mount_page(&server, "/b", &[]).await;

    let mut site = SiteMap::new(&server.uri(), 2).unwrap();
    crawl(&mut site).await;

    let root = site.graph().get("/").unwrap();
    assert_eq!(root.links.get("/a"), Some(&2));
    assert_eq!(root.links.get("/b"), Some(&1));
    assert_eq!(site.graph().view().edges.len(), 2);
}

#[tokio::test]
async fn test_trailing_slash_pages_are_distinct() {
    let server = MockServer::start().await;
    mount_page(&server, "/", &["/docs", "/docs/"]).await;
    mount_page(&server, "/docs", &["/docs/"]).await;
    mount_page(&server, "/docs/", &["/docs"]).await;

    let mut site = SiteMap::new(&server.uri(), 2).unwrap();
    crawl(&mut site).await;

    assert_eq!(paths(&site.graph()), set(&["/", "/docs", "/docs/"]));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_no_duplicate_pages_for_any_worker_count() {
    let server = MockServer::start().await;

    // Every page links to every other page, so workers race to discover them
    let routes: Vec<String> = (1..=12).map(|i| format!("/p{}", i)).collect();
    let mut all: Vec<&str> = routes.iter().map(String::as_str).collect();
    all.push("/");
    mount_page(&server, "/", &all).await;
    for route in &routes {
        mount_slow_page(&server, route, &all, Duration::from_millis(5)).await;
    }

    let mut want = set(&all);
    want.insert("/".to_string());

    for workers in [1, 2, 3, 4, 8, 16, 32] {
        let stats = Arc::new(CrawlStats::new());
        let mut site = SiteMap::new(&server.uri(), workers)
            .unwrap()
            .with_recorder(stats.clone());
        crawl(&mut site).await;

        let graph = site.graph();
        assert_eq!(paths(&graph), want, "{} workers", workers);
        assert_eq!(graph.len(), 13, "{} workers", workers);
        assert_eq!(graph.visited_count(), 13, "{} workers", workers);
        assert_closed(&graph);
        assert_eq!(stats.visited(), 13, "{} workers", workers);
        assert_eq!(stats.page_count(), 13, "{} workers", workers);
    }
}

#[tokio::test]
async fn test_wide_fan_out_larger_than_queues() {
    let server = MockServer::start().await;

    // A wide fan-out fills the bounded frontier, which must not stall the crawl
    let routes: Vec<String> = (0..50).map(|i| format!("/item/{}", i)).collect();
    let links: Vec<&str> = routes.iter().map(String::as_str).collect();
    mount_page(&server, "/", &links).await;
    for route in &routes {
        mount_page(&server, route, &["/"]).await;
    }

    let mut site = SiteMap::new(&server.uri(), 1).unwrap();
    crawl(&mut site).await;

    assert_eq!(site.graph().len(), 51);
    assert_closed(&site.graph());
}

#[tokio::test]
async fn test_crawl_sends_configured_user_agent() {
    let server = MockServer::start().await;
    for (route, links) in [("/", vec!["/a"]), ("/a", vec![])] {
        Mock::given(method("GET"))
            .and(path(route))
            .and(header("user-agent", "sitemapper-test/1.0"))
            .respond_with(ResponseTemplate::new(200).set_body_string(anchors(&links)))
            .expect(1)
            .mount(&server)
            .await;
    }

    let mut site = SiteMap::new(&server.uri(), 2)
        .unwrap()
        .with_user_agent("sitemapper-test/1.0");
    crawl(&mut site).await;
    let graph = site.graph();

    // Requests without the header fall through to a 404
    assert_eq!(paths(&graph), set(&["/", "/a"]));
    assert!(graph.snapshot().values().all(|page| !page.broken));
}

#[tokio::test]
async fn test_run_twice_rejected() {
    let server = MockServer::start().await;
    mount_page(&server, "/", &[]).await;

    let mut site = SiteMap::new(&server.uri(), 1).unwrap();
    crawl(&mut site).await;

    let err = site.run(CancellationToken::new()).await.unwrap_err();
    assert!(matches!(err, CrawlError::AlreadyStarted));
    assert_eq!(site.state(), CrawlState::Completed);
}

// ============================================================================
// Cancellation
// ============================================================================

#[tokio::test]
async fn test_cancel_before_run() {
    let server = MockServer::start().await;
    mount_page(&server, "/", &["/a"]).await;

    let cancel = CancellationToken::new();
    cancel.cancel();

    let mut site = SiteMap::new(&server.uri(), 2).unwrap();
    let err = site.run(cancel).await.unwrap_err();

    assert!(err.is_incomplete());
    assert!(matches!(err, CrawlError::Cancelled { visited: 0, known: 1 }));
    assert_eq!(site.state(), CrawlState::Cancelled);
    assert_eq!(site.graph().len(), 1);
}

#[tokio::test]
async fn test_cancel_during_fetch() {
    let server = MockServer::start().await;
    mount_slow_page(&server, "/", &["/a"], Duration::from_millis(500)).await;
    mount_page(&server, "/a", &[]).await;

    let cancel = CancellationToken::new();
    let trigger = cancel.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(50)).await;
        trigger.cancel();
    });

    let mut site = SiteMap::new(&server.uri(), 2).unwrap();
    let graph = site.graph();
    let err = site.run(cancel).await.unwrap_err();
    assert!(matches!(err, CrawlError::Cancelled { visited: 0, known: 1 }));

    // The abandoned fetch never lands in the graph
    tokio::time::sleep(Duration::from_millis(700)).await;
    assert_eq!(graph.len(), 1);
    assert!(!graph.get("/").unwrap().visited);
}

#[tokio::test]
async fn test_cancel_mid_crawl_keeps_partial_graph() {
    let server = MockServer::start().await;
    let slow: Vec<String> = (1..=5).map(|i| format!("/slow{}", i)).collect();
    let links: Vec<&str> = slow.iter().map(String::as_str).collect();
    mount_page(&server, "/", &links).await;
    for route in &slow {
        mount_slow_page(&server, route, &["/never"], Duration::from_secs(3)).await;
    }

    let cancel = CancellationToken::new();
    let mut site = SiteMap::new(&server.uri(), 2).unwrap();
    let graph = site.graph();

    let watcher = {
        let graph = graph.clone();
        let cancel = cancel.clone();
        tokio::spawn(async move {
            while graph.visited_count() < 1 {
                tokio::time::sleep(Duration::from_millis(10)).await;
            }
            cancel.cancel();
        })
    };

    let started = Instant::now();
    let err = site.run(cancel).await.unwrap_err();
    watcher.await.unwrap();

    assert!(started.elapsed() < Duration::from_secs(2), "cancel waited on fetches");
    assert!(matches!(err, CrawlError::Cancelled { visited: 1, known: 6 }));
    assert!(err.to_string().contains("1 of 6"));

    // Partial graph stays readable and stops growing
    tokio::time::sleep(Duration::from_millis(300)).await;
    assert_eq!(graph.len(), 6);
    assert_eq!(graph.visited_count(), 1);
    assert!(!graph.contains("/never"));
    assert_eq!(graph.view().nodes.len(), 6);
}

#[tokio::test]
async fn test_cancel_with_pages_waiting_for_frontier() {
    let server = MockServer::start().await;
    let slow: Vec<String> = (1..=8).map(|i| format!("/slow{}", i)).collect();
    let links: Vec<&str> = slow.iter().map(String::as_str).collect();
    mount_page(&server, "/", &links).await;
    for route in &slow {
        mount_slow_page(&server, route, &[], Duration::from_secs(3)).await;
    }

    // One worker and a frontier of two leave most pages in the backlog
    let cancel = CancellationToken::new();
    let mut site = SiteMap::new(&server.uri(), 1).unwrap();
    let graph = site.graph();

    let watcher = {
        let graph = graph.clone();
        let cancel = cancel.clone();
        tokio::spawn(async move {
            while graph.visited_count() < 1 {
                tokio::time::sleep(Duration::from_millis(10)).await;
            }
            tokio::time::sleep(Duration::from_millis(100)).await;
            cancel.cancel();
        })
    };

    let started = Instant::now();
    let err = tokio::time::timeout(Duration::from_secs(5), site.run(cancel))
        .await
        .expect("cancel did not stop the crawl")
        .unwrap_err();
    watcher.await.unwrap();

    assert!(started.elapsed() < Duration::from_secs(2), "cancel waited on the backlog");
    assert!(matches!(err, CrawlError::Cancelled { visited: 1, known: 9 }));
    assert_eq!(site.state(), CrawlState::Cancelled);

    tokio::time::sleep(Duration::from_millis(300)).await;
    assert_eq!(graph.len(), 9);
    assert_eq!(graph.visited_count(), 1);
}

#[tokio::test]
async fn test_view_readable_mid_crawl() {
    let server = MockServer::start().await;
    mount_page(&server, "/", &["/slow"]).await;
    mount_slow_page(&server, "/slow", &[], Duration::from_millis(400)).await;

    let mut site = SiteMap::new(&server.uri(), 1).unwrap();
    let graph = site.graph();
    let run = tokio::spawn(async move {
        site.run(CancellationToken::new()).await.map(|_| site)
    });

    while graph.len() < 2 {
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    let view = graph.view();
    assert_eq!(view.nodes.len(), 2);
    assert!(!graph.get("/slow").unwrap().visited);

    let site = run.await.unwrap().unwrap();
    assert_eq!(site.state(), CrawlState::Completed);
    assert!(graph.get("/slow").unwrap().visited);
}
