//! Truncated random walks: DeepWalk with restart, or node2vec.
//!
//! Each of `num_walks` iterations shuffles the nodes and starts one walk from
//! every node. The step rule comes from [`WalkStrategy`]:
//!
//! - DeepWalk jumps back to the start node with probability `restart`,
//!   otherwise it moves to a uniform neighbor.
//! - node2vec biases each step by where the walk just came from, sampling by
//!   rejection so a step costs O(1) expected draws.
//!
//! A walk that reaches a node with no neighbors stops early; pad it later
//! with [`equalize_walks`](crate::corpus::equalize_walks).
//!
//! Iteration `i` draws from its own RNG seeded with `seed + i`, so the corpus
//! does not depend on how iterations are scheduled across threads.

use crate::config::{WalkConfig, WalkStrategy};
use crate::error::{Error, Result};
use crate::graph::{Graph, NodeId};
use petgraph::graph::{NodeIndex, UnGraph};
use rand::prelude::*;
use std::collections::HashSet;

#[cfg(feature = "parallel")]
use rayon::prelude::*;

/// Generate `num_walks × node_count` walks with the configured strategy.
///
/// # Example
///
/// ```rust
/// use commune::config::WalkConfig;
/// use commune::{walk::generate_walks, Graph};
///
/// let g = Graph::from_edges([(0u32, 1u32), (1, 2), (2, 3), (3, 0)]);
/// let config = WalkConfig::default().with_num_walks(2).with_walk_length(5);
/// let walks = generate_walks(&g, &config).unwrap();
/// assert_eq!(walks.len(), 8);
/// assert!(walks.iter().all(|w| w.len() == 5));
///
/// let biased = generate_walks(&g, &config.with_node2vec(0.5, 2.0)).unwrap();
/// assert_eq!(biased.len(), 8);
/// ```
pub fn generate_walks<N: NodeId>(graph: &Graph<N>, config: &WalkConfig) -> Result<Vec<Vec<N>>> {
    config.validate()?;
    if graph.node_count() == 0 {
        return Err(Error::EmptyInput);
    }

    let g = graph.as_petgraph();
    let nodes: Vec<NodeIndex> = g.node_indices().collect();
    let iteration = |i: usize| -> Vec<Vec<N>> {
        let mut rng = StdRng::seed_from_u64(config.seed.wrapping_add(i as u64));
        let mut order = nodes.clone();
        order.shuffle(&mut rng);
        order
            .iter()
            .map(|&start| {
                let steps = match config.strategy {
                    WalkStrategy::DeepWalk { restart } => {
                        restart_walk(g, start, config.walk_length, restart, &mut rng)
                    }
                    WalkStrategy::Node2Vec { p, q } => {
                        biased_walk(g, start, config.walk_length, p, q, &mut rng)
                    }
                };
                steps.into_iter().map(|ix| g[ix].clone()).collect()
            })
            .collect()
    };

    #[cfg(feature = "parallel")]
    let walks: Vec<Vec<N>> = (0..config.num_walks)
        .into_par_iter()
        .flat_map_iter(iteration)
        .collect();

    #[cfg(not(feature = "parallel"))]
    let walks: Vec<Vec<N>> = (0..config.num_walks).flat_map(iteration).collect();

    tracing::debug!(
        walks = walks.len(),
        walk_length = config.walk_length,
        strategy = config.strategy.name(),
        "generated random walks"
    );
    Ok(walks)
}

fn restart_walk<N, R: Rng>(
    g: &UnGraph<N, ()>,
    start: NodeIndex,
    walk_length: usize,
    restart: f64,
    rng: &mut R,
) -> Vec<NodeIndex> {
    let mut walk = Vec::with_capacity(walk_length);
    walk.push(start);

    let mut current = start;
    let mut neighbors: Vec<NodeIndex> = Vec::new();
    while walk.len() < walk_length {
        neighbors.clear();
        neighbors.extend(g.neighbors(current));
        let Some(&next) = neighbors.choose(rng) else {
            break;
        };
        current = if restart > 0.0 && rng.random::<f64>() < restart {
            start
        } else {
            next
        };
        walk.push(current);
    }
    walk
}

/// Second-order walk. The first step is uniform; later steps accept a
/// uniform candidate with probability `weight / max_weight`, where the
/// weight is `1/p` for the previous node, 1 for its neighbors and `1/q`
/// otherwise.
fn biased_walk<N, R: Rng>(
    g: &UnGraph<N, ()>,
    start: NodeIndex,
    walk_length: usize,
    p: f64,
    q: f64,
    rng: &mut R,
) -> Vec<NodeIndex> {
    let max_weight = (1.0 / p).max(1.0).max(1.0 / q);
    let mut walk = Vec::with_capacity(walk_length);
    walk.push(start);

    let mut current = start;
    let mut previous: Option<NodeIndex> = None;
    let mut previous_neighbors: HashSet<NodeIndex> = HashSet::new();
    let mut neighbors: Vec<NodeIndex> = Vec::new();
    while walk.len() < walk_length {
        neighbors.clear();
        neighbors.extend(g.neighbors(current));
        let Some(&first) = neighbors.choose(rng) else {
            break;
        };

        let mut next = first;
        if let Some(prev) = previous {
            loop {
                let weight = if next == prev {
                    1.0 / p
                } else if previous_neighbors.contains(&next) {
                    1.0
                } else {
                    1.0 / q
                };
                if rng.random::<f64>() < weight / max_weight {
                    break;
                }
                next = neighbors[rng.random_range(0..neighbors.len())];
            }
        }

        previous = Some(current);
        previous_neighbors.clear();
        previous_neighbors.extend(neighbors.iter().copied());
        current = next;
        walk.push(current);
    }
    walk
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ring() -> Graph<u32> {
        Graph::from_edges([(0, 1), (1, 2), (2, 3), (3, 0)])
    }

    fn long_ring(n: u32) -> Graph<u32> {
        Graph::from_edges((0..n).map(|i| (i, (i + 1) % n)))
    }

    /// Share of steps (after the first) that return to the node two back.
    fn backtrack_rate(walks: &[Vec<u32>]) -> f64 {
        let (mut back, mut steps) = (0usize, 0usize);
        for walk in walks {
            for w in walk.windows(3) {
                steps += 1;
                if w[0] == w[2] {
                    back += 1;
                }
            }
        }
        back as f64 / steps as f64
    }

    #[test]
    fn walks_follow_edges() -> Result<()> {
        let g = ring();
        for config in [
            WalkConfig::default().with_num_walks(3).with_walk_length(10),
            WalkConfig::default()
                .with_num_walks(3)
                .with_walk_length(10)
                .with_node2vec(0.5, 2.0),
        ] {
            let walks = generate_walks(&g, &config)?;
            assert_eq!(walks.len(), 12);
            for walk in &walks {
                assert_eq!(walk.len(), 10);
                for pair in walk.windows(2) {
                    assert!(g.neighbors(&pair[0]).any(|n| *n == pair[1]));
                }
            }
        }
        Ok(())
    }

    #[test]
    fn every_node_starts_once_per_iteration() -> Result<()> {
        let walks = generate_walks(&ring(), &WalkConfig::default().with_num_walks(1))?;
        let mut starts: Vec<u32> = walks.iter().map(|w| w[0]).collect();
        starts.sort_unstable();
        assert_eq!(starts, vec![0, 1, 2, 3]);
        Ok(())
    }

    #[test]
    fn isolated_nodes_stop_early() -> Result<()> {
        let mut g = ring();
        g.add_node(9);
        for config in [
            WalkConfig::default().with_num_walks(1).with_walk_length(6),
            WalkConfig::default()
                .with_num_walks(1)
                .with_walk_length(6)
                .with_node2vec(2.0, 0.5),
        ] {
            let walks = generate_walks(&g, &config)?;
            let lone: Vec<_> = walks.iter().filter(|w| w[0] == 9).collect();
            assert_eq!(lone, vec![&vec![9]]);
        }
        Ok(())
    }

    #[test]
    fn full_restart_bounces_to_start() -> Result<()> {
        let g = Graph::from_edges([(0u32, 1u32), (1, 2)]);
        let config = WalkConfig::default()
            .with_num_walks(1)
            .with_walk_length(5)
            .with_restart(1.0);
        for walk in generate_walks(&g, &config)? {
            assert!(walk.iter().all(|&n| n == walk[0]));
        }
        Ok(())
    }

    #[test]
    fn return_parameter_controls_backtracking() -> Result<()> {
        // Every node on a ring of 8 has two neighbors and no triangles, so a
        // step either backtracks (weight 1/p) or moves on (weight 1/q).
        let g = long_ring(8);
        let base = WalkConfig::default()
            .with_num_walks(20)
            .with_walk_length(20)
            .with_seed(123);

        let local = backtrack_rate(&generate_walks(&g, &base.with_node2vec(0.5, 2.0))?);
        let outward = backtrack_rate(&generate_walks(&g, &base.with_node2vec(2.0, 0.5))?);
        let uniform = backtrack_rate(&generate_walks(&g, &base.with_node2vec(1.0, 1.0))?);

        // Expected rates: 0.8, 0.2 and 0.5.
        assert!(local > 0.7, "local = {local}");
        assert!(outward < 0.3, "outward = {outward}");
        assert!((0.4..0.6).contains(&uniform), "uniform = {uniform}");
        Ok(())
    }

    #[test]
    fn triangles_get_unit_weight() -> Result<()> {
        // From 1 having come from 0: back to 0 has weight 1/p, to 2 (a
        // neighbor of 0) weight 1, and to 3 weight 1/q. A tiny q makes 3
        // dominate.
        let g = Graph::from_edges([(0u32, 1u32), (0, 2), (1, 2), (1, 3)]);
        let config = WalkConfig::default()
            .with_num_walks(50)
            .with_walk_length(3)
            .with_node2vec(100.0, 0.01);
        let walks = generate_walks(&g, &config)?;
        let third: Vec<u32> = walks
            .iter()
            .filter(|w| w[0] == 0 && w[1] == 1)
            .map(|w| w[2])
            .collect();
        assert!(!third.is_empty());
        let to_far = third.iter().filter(|&&n| n == 3).count();
        assert!(to_far * 10 >= third.len() * 9, "third steps = {third:?}");
        Ok(())
    }

    #[test]
    fn same_seed_same_corpus() -> Result<()> {
        for config in [
            WalkConfig::default().with_num_walks(4).with_seed(7),
            WalkConfig::default()
                .with_num_walks(4)
                .with_seed(7)
                .with_node2vec(0.5, 2.0),
        ] {
            assert_eq!(generate_walks(&ring(), &config)?, generate_walks(&ring(), &config)?);
        }
        Ok(())
    }

    #[test]
    fn bad_parameters_are_rejected() {
        let g = ring();
        assert!(generate_walks(&g, &WalkConfig::default().with_walk_length(0)).is_err());
        assert!(generate_walks(&g, &WalkConfig::default().with_restart(1.5)).is_err());
        assert!(generate_walks(&g, &WalkConfig::default().with_node2vec(-1.0, 1.0)).is_err());
        assert!(matches!(
            generate_walks(&Graph::<u32>::new(), &WalkConfig::default()),
            Err(Error::EmptyInput)
        ));
    }
}
