//! Undirected co-authorship graph
//!
//! A simple graph over author ids: no self loops, at most one edge per pair.
//! Repeated insertions of an edge are no-ops for the edge set but bump the
//! pair's weight, which ends up as the number of shared papers.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// Edge between two co-authors, endpoints in ascending order
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct CoauthorEdge {
    pub source: String,
    pub target: String,
    /// Number of papers the two authors share
    pub weight: u32,
}

/// Node entry of a [`GraphSnapshot`]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GraphNode {
    pub id: String,
    pub degree: usize,
}

/// Serializable graph for an external layout or rendering step
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GraphSnapshot {
    pub nodes: Vec<GraphNode>,
    pub edges: Vec<CoauthorEdge>,
}

fn edge_key(a: &str, b: &str) -> (String, String) {
    if a <= b {
        (a.to_string(), b.to_string())
    } else {
        (b.to_string(), a.to_string())
    }
}

/// In-memory co-authorship graph
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CoauthorGraph {
    /// Adjacency: author id -> co-author ids
    adjacency: BTreeMap<String, BTreeSet<String>>,

    /// Shared-paper count per unordered pair
    weights: BTreeMap<(String, String), u32>,
}

impl CoauthorGraph {
    /// Create an empty graph
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an isolated node; no-op if present
    pub fn add_node(&mut self, id: &str) {
        if !self.adjacency.contains_key(id) {
            self.adjacency.insert(id.to_string(), BTreeSet::new());
        }
    }

    /// Add an undirected edge, creating missing endpoints.
    ///
    /// Returns `true` if the edge is new. Self loops are ignored.
    pub fn add_edge(&mut self, a: &str, b: &str) -> bool {
        if a == b {
            self.add_node(a);
            return false;
        }

        *self.weights.entry(edge_key(a, b)).or_insert(0) += 1;

        let inserted = self
            .adjacency
            .entry(a.to_string())
            .or_default()
            .insert(b.to_string());
        self.adjacency
            .entry(b.to_string())
            .or_default()
            .insert(a.to_string());
        inserted
    }

    /// Connect every pair of `authors`
    pub fn add_clique<S: AsRef<str>>(&mut self, authors: &[S]) {
        if let [only] = authors {
            self.add_node(only.as_ref());
            return;
        }
        for (i, a) in authors.iter().enumerate() {
            for b in &authors[i + 1..] {
                self.add_edge(a.as_ref(), b.as_ref());
            }
        }
    }

    pub fn contains_node(&self, id: &str) -> bool {
        self.adjacency.contains_key(id)
    }

    pub fn contains_edge(&self, a: &str, b: &str) -> bool {
        self.adjacency.get(a).is_some_and(|n| n.contains(b))
    }

    /// Node ids in ascending order
    pub fn nodes(&self) -> impl Iterator<Item = &str> {
        self.adjacency.keys().map(String::as_str)
    }

    /// Co-authors of `id` in ascending order
    pub fn neighbors(&self, id: &str) -> impl Iterator<Item = &str> {
        self.adjacency
            .get(id)
            .into_iter()
            .flat_map(|n| n.iter().map(String::as_str))
    }

    /// Edges with canonical (ascending) endpoints, sorted
    pub fn edges(&self) -> Vec<CoauthorEdge> {
        self.weights
            .iter()
            .map(|((source, target), &weight)| CoauthorEdge {
                source: source.clone(),
                target: target.clone(),
                weight,
            })
            .collect()
    }

    pub fn node_count(&self) -> usize {
        self.adjacency.len()
    }

    pub fn edge_count(&self) -> usize {
        self.weights.len()
    }

    pub fn degree(&self, id: &str) -> usize {
        self.adjacency.get(id).map_or(0, BTreeSet::len)
    }

    /// Shared-paper count of a pair, 0 if not connected
    pub fn edge_weight(&self, a: &str, b: &str) -> u32 {
        self.weights.get(&edge_key(a, b)).copied().unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.adjacency.is_empty()
    }

    /// Induced subgraph of the `n` highest-degree authors, ties by ascending id
    pub fn top_by_degree(&self, n: usize) -> CoauthorGraph {
        let mut ranked: Vec<(&String, usize)> = self
            .adjacency
            .iter()
            .map(|(id, neighbors)| (id, neighbors.len()))
            .collect();
        // Stable sort keeps the ascending-id order among equal degrees
        ranked.sort_by(|a, b| b.1.cmp(&a.1));

        let keep: BTreeSet<&String> = ranked.into_iter().take(n).map(|(id, _)| id).collect();

        let mut sub = CoauthorGraph::new();
        for id in &keep {
            sub.add_node(id);
        }
        for ((a, b), &weight) in &self.weights {
            if keep.contains(a) && keep.contains(b) {
                sub.adjacency.entry(a.clone()).or_default().insert(b.clone());
                sub.adjacency.entry(b.clone()).or_default().insert(a.clone());
                sub.weights.insert((a.clone(), b.clone()), weight);
            }
        }
        sub
    }

    /// Serializable copy of the graph
    pub fn snapshot(&self) -> GraphSnapshot {
        GraphSnapshot {
            nodes: self
                .adjacency
                .iter()
                .map(|(id, neighbors)| GraphNode {
                    id: id.clone(),
                    degree: neighbors.len(),
                })
                .collect(),
            edges: self.edges(),
        }
    }
}

impl From<&GraphSnapshot> for CoauthorGraph {
    fn from(snapshot: &GraphSnapshot) -> Self {
        let mut graph = CoauthorGraph::new();
        for node in &snapshot.nodes {
            graph.add_node(&node.id);
        }
        for edge in &snapshot.edges {
            if edge.source == edge.target || edge.weight == 0 {
                continue;
            }
            graph.add_edge(&edge.source, &edge.target);
            graph
                .weights
                .insert(edge_key(&edge.source, &edge.target), edge.weight);
        }
        graph
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_add_edge_is_simple() {
        let mut graph = CoauthorGraph::new();
        assert!(graph.add_edge("a", "b"));
        assert!(!graph.add_edge("b", "a"));
        assert!(!graph.add_edge("a", "a"));

        assert_eq!(graph.node_count(), 2);
        assert_eq!(graph.edge_count(), 1);
        assert_eq!(graph.degree("a"), 1);
        assert_eq!(graph.edge_weight("b", "a"), 2);
        assert!(graph.contains_edge("b", "a"));
    }

    #[test]
    fn test_clique() {
        let mut graph = CoauthorGraph::new();
        graph.add_clique(&["x", "y", "z"]);
        graph.add_clique(&["solo"]);

        assert_eq!(graph.node_count(), 4);
        assert_eq!(graph.edge_count(), 3);
        assert_eq!(graph.degree("solo"), 0);
        assert_eq!(graph.neighbors("y").collect::<Vec<_>>(), vec!["x", "z"]);
    }

    #[test]
    fn test_edges_are_canonical() {
        let mut graph = CoauthorGraph::new();
        graph.add_edge("b", "a");
        graph.add_edge("c", "b");

        let edges: Vec<(String, String)> = graph
            .edges()
            .into_iter()
            .map(|e| (e.source, e.target))
            .collect();
        assert_eq!(
            edges,
            vec![("a".into(), "b".into()), ("b".into(), "c".into())]
        );
    }

    #[test]
    fn test_top_by_degree() {
        let mut graph = CoauthorGraph::new();
        // hub connects to everyone, "b" and "c" also share an edge
        for leaf in ["a", "b", "c", "d"] {
            graph.add_edge("hub", leaf);
        }
        graph.add_edge("b", "c");

        let top = graph.top_by_degree(3);
        assert_eq!(top.nodes().collect::<Vec<_>>(), vec!["b", "c", "hub"]);
        assert_eq!(top.edge_count(), 3);
        assert!(!top.contains_node("a"));

        assert!(graph.top_by_degree(0).is_empty());
        assert_eq!(graph.top_by_degree(100), graph);
    }

    #[test]
    fn test_snapshot_roundtrip_keeps_weights() {
        let mut graph = CoauthorGraph::new();
        graph.add_clique(&["a", "b", "c"]);
        graph.add_edge("a", "b");
        graph.add_node("lonely");

        let snapshot = graph.snapshot();
        let json = serde_json::to_string(&snapshot).unwrap();
        let parsed: GraphSnapshot = serde_json::from_str(&json).unwrap();

        assert_eq!(parsed.nodes.len(), 4);
        assert_eq!(CoauthorGraph::from(&parsed), graph);
    }
}
