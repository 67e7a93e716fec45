//! Label propagation partitioning.
//!
//! Very fast O(E) algorithm where nodes adopt the most common
//! label among their neighbors.

use super::traits::{relabel_by_first_seen, Partitioner};
use crate::error::{Error, Result};
use crate::graph::{Graph, NodeId};
use petgraph::graph::NodeIndex;
use rand::prelude::*;
use std::collections::BTreeMap;

/// Label propagation partitioner.
#[derive(Debug, Clone)]
pub struct LabelPropagation {
    /// Maximum iterations.
    max_iter: usize,
}

impl LabelPropagation {
    /// Create a new label propagation partitioner.
    pub fn new() -> Self {
        Self { max_iter: 100 }
    }

    /// Set maximum iterations.
    pub fn with_max_iter(mut self, max_iter: usize) -> Self {
        self.max_iter = max_iter;
        self
    }
}

impl Default for LabelPropagation {
    fn default() -> Self {
        Self::new()
    }
}

impl Partitioner for LabelPropagation {
    fn partition<N: NodeId>(&self, graph: &Graph<N>, seed: u64) -> Result<Vec<usize>> {
        let g = graph.as_petgraph();
        let n = g.node_count();
        if n == 0 {
            return Err(Error::EmptyInput);
        }

        let mut labels: Vec<usize> = (0..n).collect();
        let mut rng = StdRng::seed_from_u64(seed);
        let mut order: Vec<usize> = (0..n).collect();

        for iter in 0..self.max_iter {
            let mut changed = false;
            order.shuffle(&mut rng);

            for &node in &order {
                let mut counts: BTreeMap<usize, usize> = BTreeMap::new();
                for neighbor in g.neighbors(NodeIndex::new(node)) {
                    *counts.entry(labels[neighbor.index()]).or_insert(0) += 1;
                }
                let Some(&max_count) = counts.values().max() else {
                    continue;
                };

                // Keep the current label when it is among the winners.
                if counts.get(&labels[node]) == Some(&max_count) {
                    continue;
                }
                let candidates: Vec<usize> = counts
                    .iter()
                    .filter(|&(_, &c)| c == max_count)
                    .map(|(&label, _)| label)
                    .collect();
                let new_label = candidates[rng.random_range(0..candidates.len())];

                labels[node] = new_label;
                changed = true;
            }

            if !changed {
                tracing::debug!(iterations = iter + 1, "label propagation converged");
                break;
            }
        }

        Ok(relabel_by_first_seen(&labels))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn disconnected_edges_split() -> Result<()> {
        let g = Graph::from_edges([(0u32, 1u32), (2, 3)]);
        let communities = LabelPropagation::new().partition(&g, 42)?;

        assert_eq!(communities[0], communities[1]);
        assert_eq!(communities[2], communities[3]);
        assert_ne!(communities[0], communities[2]);
        assert_eq!(communities[0], 0);
        Ok(())
    }

    #[test]
    fn same_seed_same_partition() -> Result<()> {
        let g = Graph::from_edges([
            (0u32, 1u32),
            (1, 2),
            (0, 2),
            (2, 3),
            (3, 4),
            (4, 5),
            (3, 5),
        ]);
        let a = LabelPropagation::new().partition(&g, 9)?;
        let b = LabelPropagation::new().partition(&g, 9)?;
        assert_eq!(a, b);
        Ok(())
    }

    #[test]
    fn empty_graph_is_error() {
        let g: Graph<u32> = Graph::new();
        assert!(matches!(
            LabelPropagation::new().partition(&g, 0),
            Err(Error::EmptyInput)
        ));
    }
}
