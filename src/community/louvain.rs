//! Louvain modularity partitioning.
//!
//! Multi-level greedy modularity optimization (Blondel et al. 2008):
//!
//! 1. **Local moving**: every node starts alone and repeatedly joins the
//!    neighboring community with the best modularity gain.
//! 2. **Aggregation**: communities collapse into single nodes; edges between
//!    them are summed, edges inside become self-loops.
//! 3. Repeat on the collapsed graph until modularity stops improving.
//!
//! Neighbor communities are scanned in ascending id order and only strict
//! gains move a node, so the partition is a pure function of the graph.
//!
//! Blondel et al. (2008). "Fast unfolding of communities in large networks."
//! Journal of Statistical Mechanics: Theory and Experiment, P10008.

use super::traits::{relabel_by_first_seen, Partitioner};
use crate::error::{Error, Result};
use crate::graph::{Graph, NodeId};
use petgraph::visit::EdgeRef;
use std::collections::{BTreeMap, HashMap};

/// Louvain partitioner.
#[derive(Debug, Clone)]
pub struct Louvain {
    /// Resolution parameter (gamma).
    resolution: f64,
    /// Maximum sweeps of local moving per level.
    max_iter: usize,
    /// Maximum levels of aggregation.
    max_levels: usize,
    /// Minimum modularity improvement to continue.
    min_modularity_gain: f64,
}

impl Louvain {
    /// Create a new Louvain partitioner with default settings.
    pub fn new() -> Self {
        Self {
            resolution: 1.0,
            max_iter: 100,
            max_levels: 10,
            min_modularity_gain: 1e-7,
        }
    }

    /// Set resolution parameter.
    ///
    /// Higher values produce smaller communities.
    pub fn with_resolution(mut self, resolution: f64) -> Self {
        self.resolution = resolution;
        self
    }

    /// Set maximum sweeps per level.
    pub fn with_max_iter(mut self, max_iter: usize) -> Self {
        self.max_iter = max_iter;
        self
    }

    /// Set maximum aggregation levels.
    pub fn with_max_levels(mut self, levels: usize) -> Self {
        self.max_levels = levels;
        self
    }
}

impl Default for Louvain {
    fn default() -> Self {
        Self::new()
    }
}

/// Weighted graph at one aggregation level.
#[derive(Debug, Clone)]
struct Level {
    n: usize,
    /// Each undirected edge once, `i < j`.
    edges: Vec<(usize, usize, f64)>,
    self_loops: Vec<f64>,
}

impl Level {
    fn total_weight(&self) -> f64 {
        self.edges.iter().map(|e| e.2).sum::<f64>() + self.self_loops.iter().sum::<f64>()
    }

    fn degrees(&self) -> Vec<f64> {
        let mut degrees = vec![0.0; self.n];
        for &(i, j, w) in &self.edges {
            degrees[i] += w;
            degrees[j] += w;
        }
        for (i, &sl) in self.self_loops.iter().enumerate() {
            degrees[i] += 2.0 * sl;
        }
        degrees
    }

    /// `Q = Σ_c [ in_c / m - γ (σ_c / 2m)² ]`, with `in_c` the weight inside
    /// community `c` and `σ_c` its total degree.
    fn modularity(&self, communities: &[usize], resolution: f64) -> f64 {
        let m = self.total_weight();
        if m == 0.0 {
            return 0.0;
        }
        let k = communities.iter().max().map_or(0, |&c| c + 1);
        let mut inside = vec![0.0; k];
        let mut sigma = vec![0.0; k];
        for &(i, j, w) in &self.edges {
            if communities[i] == communities[j] {
                inside[communities[i]] += w;
            }
        }
        for (i, &sl) in self.self_loops.iter().enumerate() {
            inside[communities[i]] += sl;
        }
        for (i, d) in self.degrees().into_iter().enumerate() {
            sigma[communities[i]] += d;
        }
        inside
            .iter()
            .zip(&sigma)
            .map(|(&in_c, &s)| in_c / m - resolution * (s / (2.0 * m)).powi(2))
            .sum()
    }

    /// Collapse communities into nodes. Returns the new level and, for each
    /// new node, the old nodes it absorbed.
    fn aggregate(&self, communities: &[usize]) -> (Level, Vec<Vec<usize>>) {
        let dense = relabel_by_first_seen(communities);
        let n_new = dense.iter().max().map_or(0, |&m| m + 1);

        let mut members = vec![Vec::new(); n_new];
        for (node, &c) in dense.iter().enumerate() {
            members[c].push(node);
        }

        let mut self_loops = vec![0.0; n_new];
        for (i, &sl) in self.self_loops.iter().enumerate() {
            self_loops[dense[i]] += sl;
        }
        let mut between: BTreeMap<(usize, usize), f64> = BTreeMap::new();
        for &(i, j, w) in &self.edges {
            let (ci, cj) = (dense[i], dense[j]);
            if ci == cj {
                self_loops[ci] += w;
            } else {
                *between.entry((ci.min(cj), ci.max(cj))).or_insert(0.0) += w;
            }
        }

        let level = Level {
            n: n_new,
            edges: between.into_iter().map(|((i, j), w)| (i, j, w)).collect(),
            self_loops,
        };
        (level, members)
    }
}

impl Louvain {
    /// Local moving phase. Returns the partition and whether any node moved.
    fn local_moving(&self, level: &Level) -> (Vec<usize>, bool) {
        let n = level.n;
        let m = level.total_weight();
        if m == 0.0 {
            return ((0..n).collect(), false);
        }

        let mut adj: Vec<BTreeMap<usize, f64>> = vec![BTreeMap::new(); n];
        for &(i, j, w) in &level.edges {
            *adj[i].entry(j).or_insert(0.0) += w;
            *adj[j].entry(i).or_insert(0.0) += w;
        }
        let degrees = level.degrees();

        let mut communities: Vec<usize> = (0..n).collect();
        let mut community_degrees = degrees.clone();
        let mut any_moved = false;

        for _ in 0..self.max_iter {
            let mut moved = false;

            for node in 0..n {
                let current = communities[node];
                let ki = degrees[node];
                community_degrees[current] -= ki;

                let mut links: BTreeMap<usize, f64> = BTreeMap::new();
                for (&neighbor, &w) in &adj[node] {
                    *links.entry(communities[neighbor]).or_insert(0.0) += w;
                }

                // Staying alone scores 0; only strict gains move the node.
                let mut best = current;
                let mut best_gain = 0.0;
                for (&target, &ki_in) in &links {
                    let sigma_tot = community_degrees[target];
                    let gain = ki_in / m - self.resolution * sigma_tot * ki / (2.0 * m * m);
                    if gain > best_gain {
                        best_gain = gain;
                        best = target;
                    }
                }

                community_degrees[best] += ki;
                if best != current {
                    communities[node] = best;
                    moved = true;
                    any_moved = true;
                }
            }

            if !moved {
                break;
            }
        }

        (communities, any_moved)
    }
}

impl Partitioner for Louvain {
    fn partition<N: NodeId>(&self, graph: &Graph<N>, _seed: u64) -> Result<Vec<usize>> {
        let g = graph.as_petgraph();
        let n = g.node_count();
        if n == 0 {
            return Err(Error::EmptyInput);
        }
        if g.edge_count() == 0 {
            return Ok((0..n).collect());
        }

        let mut edges: HashMap<(usize, usize), f64> = HashMap::new();
        let mut self_loops = vec![0.0; n];
        for edge in g.edge_references() {
            let (i, j) = (edge.source().index(), edge.target().index());
            if i == j {
                self_loops[i] += 1.0;
            } else {
                *edges.entry((i.min(j), i.max(j))).or_insert(0.0) += 1.0;
            }
        }
        let mut edges: Vec<(usize, usize, f64)> =
            edges.into_iter().map(|((i, j), w)| (i, j, w)).collect();
        edges.sort_by_key(|e| (e.0, e.1));

        let mut level = Level {
            n,
            edges,
            self_loops,
        };

        // assignment[v] = node of the current level that original node v sits in.
        let mut assignment: Vec<usize> = (0..n).collect();
        let mut prev_modularity = f64::NEG_INFINITY;

        for depth in 0..self.max_levels {
            let (partition, moved) = self.local_moving(&level);
            if !moved {
                break;
            }

            let q = level.modularity(&partition, self.resolution);
            if q - prev_modularity < self.min_modularity_gain {
                break;
            }
            prev_modularity = q;

            let (next, members) = level.aggregate(&partition);
            tracing::debug!(
                depth,
                nodes = level.n,
                communities = next.n,
                modularity = q,
                "louvain level"
            );

            let mut owner = vec![0; level.n];
            for (new_node, old_nodes) in members.iter().enumerate() {
                for &old in old_nodes {
                    owner[old] = new_node;
                }
            }
            for a in assignment.iter_mut() {
                *a = owner[*a];
            }

            if next.n == level.n {
                break;
            }
            level = next;
        }

        Ok(relabel_by_first_seen(&assignment))
    }
}
