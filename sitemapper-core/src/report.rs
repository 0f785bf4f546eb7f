// Text and DOT renderings of a site graph

use crate::graph::SiteGraph;
use colored::Colorize;
use petgraph::dot::Dot;
use petgraph::graphmap::DiGraphMap;
use sitemapper_scanner::Page;
use std::collections::HashMap;

/// Directed graph of paths, weighted by how many anchors link source to
/// target.
pub fn link_digraph(pages: &HashMap<String, Page>) -> DiGraphMap<&str, usize> {
    let mut graph = DiGraphMap::new();
    for (path, page) in pages {
        graph.add_node(path.as_str());
        for (target, count) in &page.links {
            graph.add_edge(path.as_str(), target.as_str(), *count);
        }
    }
    graph
}

/// Graphviz rendering of the site, edge labels are link counts.
pub fn generate_dot_report(graph: &SiteGraph) -> String {
    let pages = graph.snapshot();
    let digraph = link_digraph(&pages);
    format!("{:?}", Dot::new(&digraph))
}

/// One line per link, broken pages flagged, sorted by path.
pub fn generate_sitemap_report(graph: &SiteGraph) -> String {
    let pages = graph.snapshot();
    let mut paths: Vec<&String> = pages.keys().collect();
    paths.sort();

    let broken = pages.values().filter(|page| page.broken).count();
    let mut report = format!("Site {} - {} pages", graph.origin(), pages.len());
    if broken > 0 {
        report.push_str(&format!(" ({} broken)", broken));
    }
    report.push('\n');

    for path in paths {
        let page = &pages[path];
        if page.broken {
            report.push_str(&format!("\t{} -> {}\n", path, "! Broken".red().bold()));
            continue;
        }
        let mut targets: Vec<&String> = page.links.keys().collect();
        targets.sort();
        for target in targets {
            report.push_str(&format!("\t{} -> {}\n", path, target));
        }
    }

    report
}

#[cfg(test)]
mod tests {
    use super::*;
    use url::Url;

    fn pages() -> HashMap<String, Page> {
        let root = Url::parse("http://testsite.com/").unwrap();
        let mut home = Page::new(root.clone());
        home.visited = true;
        home.links = [("/a".to_string(), 2), ("/b".to_string(), 1)].into();
        let mut a = Page::new(root.join("/a").unwrap());
        a.visited = true;
        a.links = [("/".to_string(), 1)].into();
        let mut b = Page::new(root.join("/b").unwrap());
        b.visited = true;
        b.broken = true;

        [("/".to_string(), home), ("/a".to_string(), a), ("/b".to_string(), b)].into()
    }

    #[test]
    fn test_link_digraph_weights() {
        let pages = pages();
        let graph = link_digraph(&pages);

        assert_eq!(graph.node_count(), 3);
        assert_eq!(graph.edge_count(), 3);
        assert_eq!(graph.edge_weight("/", "/a"), Some(&2));
        assert_eq!(graph.edge_weight("/a", "/"), Some(&1));
        assert!(graph.edge_weight("/b", "/").is_none());
    }
}
