//! Undirected graph keyed by node id.
//!
//! A thin layer over petgraph's `UnGraph` that remembers which `NodeIndex`
//! each id was given, so walks (sequences of ids) can be mapped back onto the
//! graph by community detectors and walk generators.

use petgraph::graph::{NodeIndex, UnGraph};
use std::collections::HashMap;
use std::fmt::Debug;
use std::hash::Hash;

/// Bound for anything usable as a node id.
pub trait NodeId: Clone + Eq + Hash + Debug + Send + Sync {}

impl<T: Clone + Eq + Hash + Debug + Send + Sync> NodeId for T {}

/// An undirected graph whose nodes carry ids of type `N`.
///
/// # Example
///
/// ```rust
/// use commune::Graph;
///
/// let g = Graph::from_edges([(0u32, 1u32), (1, 2), (2, 3), (3, 0)]);
/// assert_eq!(g.node_count(), 4);
/// assert_eq!(g.edge_count(), 4);
/// ```
#[derive(Debug, Clone)]
pub struct Graph<N: NodeId> {
    inner: UnGraph<N, ()>,
    index: HashMap<N, NodeIndex>,
}

impl<N: NodeId> Default for Graph<N> {
    fn default() -> Self {
        Self::new()
    }
}

impl<N: NodeId> Graph<N> {
    /// Create an empty graph.
    pub fn new() -> Self {
        Self {
            inner: UnGraph::new_undirected(),
            index: HashMap::new(),
        }
    }

    /// Build a graph from an edge list, creating nodes on first sight.
    pub fn from_edges<I>(edges: I) -> Self
    where
        I: IntoIterator<Item = (N, N)>,
    {
        let mut g = Self::new();
        for (a, b) in edges {
            g.add_edge(a, b);
        }
        g
    }

    /// Add a node if absent; returns its petgraph index.
    pub fn add_node(&mut self, id: N) -> NodeIndex {
        if let Some(&ix) = self.index.get(&id) {
            return ix;
        }
        let ix = self.inner.add_node(id.clone());
        self.index.insert(id, ix);
        ix
    }

    /// Add an undirected edge. Parallel edges are collapsed.
    pub fn add_edge(&mut self, a: N, b: N) {
        let ia = self.add_node(a);
        let ib = self.add_node(b);
        if self.inner.find_edge(ia, ib).is_none() {
            self.inner.add_edge(ia, ib, ());
        }
    }

    /// Number of nodes.
    pub fn node_count(&self) -> usize {
        self.inner.node_count()
    }

    /// Number of edges.
    pub fn edge_count(&self) -> usize {
        self.inner.edge_count()
    }

    /// Petgraph index of a node id.
    pub fn node_index(&self, id: &N) -> Option<NodeIndex> {
        self.index.get(id).copied()
    }

    /// Id stored at a petgraph index.
    pub fn id(&self, ix: NodeIndex) -> Option<&N> {
        self.inner.node_weight(ix)
    }

    /// Ids in insertion order.
    pub fn ids(&self) -> impl Iterator<Item = &N> + '_ {
        self.inner.node_indices().map(move |ix| &self.inner[ix])
    }

    /// Neighbor ids of a node; empty if the id is unknown.
    pub fn neighbors<'a>(&'a self, id: &N) -> impl Iterator<Item = &'a N> + 'a {
        self.node_index(id)
            .into_iter()
            .flat_map(move |ix| self.inner.neighbors(ix))
            .map(move |nx| &self.inner[nx])
    }

    /// Borrow the underlying petgraph graph.
    pub fn as_petgraph(&self) -> &UnGraph<N, ()> {
        &self.inner
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn duplicate_edges_collapse() {
        let g = Graph::from_edges([("a", "b"), ("b", "a"), ("a", "b")]);
        assert_eq!(g.node_count(), 2);
        assert_eq!(g.edge_count(), 1);
    }

    #[test]
    fn neighbors_of_unknown_id_is_empty() {
        let g = Graph::from_edges([(1u32, 2u32)]);
        assert_eq!(g.neighbors(&7).count(), 0);
        let mut n: Vec<_> = g.neighbors(&1).copied().collect();
        n.sort_unstable();
        assert_eq!(n, vec![2]);
    }
}
