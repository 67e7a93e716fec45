//! Community detection traits.

use super::Detection;
use crate::config::DetectionParams;
use crate::error::Result;
use crate::graph::{Graph, NodeId};

/// A hard graph partitioner.
pub trait Partitioner {
    /// Partition a graph.
    ///
    /// Returns one community id per node, in the graph's node order. Ids are
    /// dense, starting at 0 and numbered by first appearance.
    fn partition<N: NodeId>(&self, graph: &Graph<N>, seed: u64) -> Result<Vec<usize>>;
}

/// A community detection strategy.
///
/// Produces the membership matrix `phi` (communities × nodes), one community
/// label for every position of every walk, and the id → `phi` column map.
/// Implementations must label every occurrence of every walk node.
pub trait CommunityDetection<N: NodeId> {
    /// Run detection over `graph` and the walks drawn from it.
    fn detect(
        &self,
        graph: &Graph<N>,
        node_walks: &[Vec<N>],
        params: &DetectionParams,
    ) -> Result<Detection<N>>;
}

/// Renumber labels densely in order of first appearance.
pub(crate) fn relabel_by_first_seen(labels: &[usize]) -> Vec<usize> {
    let mut remap = std::collections::HashMap::new();
    labels
        .iter()
        .map(|&l| {
            let next = remap.len();
            *remap.entry(l).or_insert(next)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn relabel_is_dense_and_ordered() {
        assert_eq!(relabel_by_first_seen(&[7, 7, 3, 9, 3]), vec![0, 0, 1, 2, 1]);
        assert!(relabel_by_first_seen(&[]).is_empty());
    }
}
