use rand::Rng;
use serde::{Deserialize, Serialize};
use sitemapper_scanner::Page;
use std::collections::HashMap;

/// Node color used for pages whose fetch failed.
pub const BROKEN_COLOR: &str = "#ec5148";

/// Nodes are placed at random within this square.
const CANVAS_SIZE: i32 = 1000;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Node {
    pub color: String,
    pub id: String,
    pub label: String,
    pub size: i32,
    pub x: i32,
    pub y: i32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Edge {
    pub id: String,
    pub source: String,
    pub target: String,
}

/// Node/edge projection of a site graph in the shape sigma.js expects.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GraphView {
    pub nodes: Vec<Node>,
    pub edges: Vec<Edge>,
}

impl GraphView {
    /// One node per page and one edge per distinct link target. Link counts
    /// are not reflected, only whether a link exists.
    pub fn from_pages(pages: &HashMap<String, Page>) -> Self {
        let mut rng = rand::rng();
        let mut paths: Vec<&String> = pages.keys().collect();
        paths.sort();

        let mut view = GraphView::default();
        for path in paths {
            let page = &pages[path];
            view.nodes.push(Node {
                color: if page.broken {
                    BROKEN_COLOR.to_string()
                } else {
                    String::new()
                },
                id: path.clone(),
                label: path.clone(),
                size: 0,
                x: rng.random_range(0..CANVAS_SIZE),
                y: rng.random_range(0..CANVAS_SIZE),
            });

            let mut targets: Vec<&String> = page.links.keys().collect();
            targets.sort();
            view.edges.extend(targets.into_iter().map(|target| Edge {
                id: format!("{}->{}", path, target),
                source: path.clone(),
                target: target.clone(),
            }));
        }

        view
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }

    pub fn to_json_pretty(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}
