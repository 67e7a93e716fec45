//! Detection strategies and their output.

use super::label_prop::LabelPropagation;
use super::louvain::Louvain;
use super::membership::{self, argmax, argmin};
use super::traits::{CommunityDetection, Partitioner};
use crate::config::DetectionParams;
use crate::error::{Error, Result};
use crate::graph::{Graph, NodeId};
use ndarray::Array2;
use rand::prelude::*;
use std::collections::HashMap;

/// Output of a detection strategy.
#[derive(Debug, Clone)]
pub struct Detection<N: NodeId> {
    phi: Array2<f64>,
    community_walks: Vec<Vec<usize>>,
    node_index: HashMap<N, usize>,
    ids: Vec<N>,
}

impl<N: NodeId> Detection<N> {
    /// Membership matrix, communities × nodes.
    pub fn phi(&self) -> &Array2<f64> {
        &self.phi
    }

    /// One label per position of every walk, aligned with the node walks.
    pub fn community_walks(&self) -> &[Vec<usize>] {
        &self.community_walks
    }

    /// Id → `phi` column.
    pub fn node_index(&self) -> &HashMap<N, usize> {
        &self.node_index
    }

    /// Column of one id.
    pub fn column(&self, id: &N) -> Option<usize> {
        self.node_index.get(id).copied()
    }

    /// Ids in column order.
    pub fn ids(&self) -> &[N] {
        &self.ids
    }

    /// Community count K.
    pub fn num_communities(&self) -> usize {
        self.phi.nrows()
    }

    /// Community with the most weight for a node.
    pub fn dominant_community(&self, id: &N) -> Option<usize> {
        self.column_values(id).map(|c| argmax(&c))
    }

    /// Community with the least weight for a node.
    pub fn weakest_community(&self, id: &N) -> Option<usize> {
        self.column_values(id).map(|c| argmin(&c))
    }

    /// A node's membership weights, one per community.
    pub fn column_values(&self, id: &N) -> Option<Vec<f64>> {
        self.column(id).map(|j| self.phi.column(j).to_vec())
    }

    /// Take the labeled walks, dropping the rest.
    pub fn into_community_walks(self) -> Vec<Vec<usize>> {
        self.community_walks
    }
}

/// Labels computed outside the crate, e.g. topic assignments or HMM states.
///
/// `community_walks` must match the node walks in shape. `None` entries are
/// filled by the labeling policy from `phi`.
#[derive(Debug, Clone)]
pub struct AssignedLabels<N: NodeId> {
    /// Membership matrix, communities × nodes.
    pub phi: Array2<f64>,
    /// Id → `phi` column. Must cover every column exactly once.
    pub node_index: HashMap<N, usize>,
    /// Per-position labels, possibly with gaps.
    pub community_walks: Vec<Vec<Option<usize>>>,
}

/// The available detection strategies.
#[derive(Debug, Clone)]
pub enum Detector<N: NodeId> {
    /// Modularity partition of the graph.
    Louvain(Louvain),
    /// Neighbor-majority partition of the graph.
    LabelPropagation(LabelPropagation),
    /// Precomputed overlapping communities, one member list per community.
    Overlapping(Vec<Vec<N>>),
    /// Precomputed membership and per-position labels.
    Assigned(AssignedLabels<N>),
}

impl<N: NodeId> Detector<N> {
    /// Default-configured graph strategy by name.
    ///
    /// ```rust
    /// use commune::community::Detector;
    ///
    /// assert!(Detector::<u32>::from_name("louvain").is_ok());
    /// assert!(Detector::<u32>::from_name("bigclam").is_err());
    /// ```
    pub fn from_name(name: &str) -> Result<Self> {
        match name {
            "louvain" => Ok(Detector::Louvain(Louvain::new())),
            "label_propagation" => Ok(Detector::LabelPropagation(LabelPropagation::new())),
            other => Err(Error::UnknownMethod(other.to_string())),
        }
    }

    /// Strategy name, for logs.
    pub fn name(&self) -> &'static str {
        match self {
            Detector::Louvain(_) => "louvain",
            Detector::LabelPropagation(_) => "label_propagation",
            Detector::Overlapping(_) => "overlapping",
            Detector::Assigned(_) => "assigned",
        }
    }
}

impl<N: NodeId> CommunityDetection<N> for Detector<N> {
    fn detect(
        &self,
        graph: &Graph<N>,
        node_walks: &[Vec<N>],
        params: &DetectionParams,
    ) -> Result<Detection<N>> {
        match self {
            Detector::Louvain(p) => p.detect(graph, node_walks, params),
            Detector::LabelPropagation(p) => p.detect(graph, node_walks, params),
            Detector::Overlapping(communities) => {
                detect_overlapping(communities, graph, node_walks, params)
            }
            Detector::Assigned(assigned) => detect_assigned(assigned, graph, node_walks, params),
        }
    }
}

impl<N: NodeId> CommunityDetection<N> for Louvain {
    fn detect(
        &self,
        graph: &Graph<N>,
        node_walks: &[Vec<N>],
        params: &DetectionParams,
    ) -> Result<Detection<N>> {
        detect_partition(self, graph, node_walks, params)
    }
}

impl<N: NodeId> CommunityDetection<N> for LabelPropagation {
    fn detect(
        &self,
        graph: &Graph<N>,
        node_walks: &[Vec<N>],
        params: &DetectionParams,
    ) -> Result<Detection<N>> {
        detect_partition(self, graph, node_walks, params)
    }
}

fn detect_partition<N: NodeId, P: Partitioner>(
    partitioner: &P,
    graph: &Graph<N>,
    node_walks: &[Vec<N>],
    params: &DetectionParams,
) -> Result<Detection<N>> {
    let partition = partitioner.partition(graph, params.seed)?;
    let k = partition.iter().max().map_or(0, |&m| m + 1);
    let (ids, node_index) = membership::column_index(graph, node_walks);

    let mut phi = Array2::zeros((k, ids.len()));
    for (col, &c) in partition.iter().enumerate() {
        phi[[c, col]] = 1.0;
    }
    finish(phi, None, ids, node_index, graph, node_walks, params)
}

fn detect_overlapping<N: NodeId>(
    communities: &[Vec<N>],
    graph: &Graph<N>,
    node_walks: &[Vec<N>],
    params: &DetectionParams,
) -> Result<Detection<N>> {
    let (ids, node_index) = membership::column_index(graph, node_walks);
    let mut phi = Array2::zeros((communities.len(), ids.len()));
    for (c, members) in communities.iter().enumerate() {
        for id in members {
            if let Some(&col) = node_index.get(id) {
                phi[[c, col]] = 1.0;
            }
        }
    }
    finish(phi, None, ids, node_index, graph, node_walks, params)
}

fn detect_assigned<N: NodeId>(
    assigned: &AssignedLabels<N>,
    graph: &Graph<N>,
    node_walks: &[Vec<N>],
    params: &DetectionParams,
) -> Result<Detection<N>> {
    let cols = assigned.phi.ncols();
    let mut slots: Vec<Option<N>> = vec![None; cols];
    for (id, &col) in &assigned.node_index {
        match slots.get_mut(col) {
            Some(slot @ None) => *slot = Some(id.clone()),
            _ => {
                return Err(Error::InvalidParameter {
                    name: "node_index",
                    message: "must map ids one-to-one onto phi columns",
                })
            }
        }
    }
    let mut ids: Vec<N> = slots.into_iter().collect::<Option<_>>().ok_or(
        Error::InvalidParameter {
            name: "node_index",
            message: "must cover every phi column",
        },
    )?;

    check_shape(node_walks, &assigned.community_walks)?;

    let mut node_index = assigned.node_index.clone();
    membership::extend_index(&mut ids, &mut node_index, node_walks);
    let phi = membership::pad_columns(assigned.phi.clone(), ids.len());

    finish(
        phi,
        Some(assigned.community_walks.as_slice()),
        ids,
        node_index,
        graph,
        node_walks,
        params,
    )
}

fn check_shape<N, L>(node_walks: &[Vec<N>], label_walks: &[Vec<L>]) -> Result<()> {
    if node_walks.len() != label_walks.len() {
        return Err(Error::LengthMismatch {
            walk: None,
            expected: node_walks.len(),
            found: label_walks.len(),
        });
    }
    for (w, (nodes, labels)) in node_walks.iter().zip(label_walks).enumerate() {
        if nodes.len() != labels.len() {
            return Err(Error::LengthMismatch {
                walk: Some(w),
                expected: nodes.len(),
                found: labels.len(),
            });
        }
    }
    Ok(())
}

/// Complete, normalize, and label.
fn finish<N: NodeId>(
    mut phi: Array2<f64>,
    assigned: Option<&[Vec<Option<usize>>]>,
    ids: Vec<N>,
    node_index: HashMap<N, usize>,
    graph: &Graph<N>,
    node_walks: &[Vec<N>],
    params: &DetectionParams,
) -> Result<Detection<N>> {
    let mut rng = StdRng::seed_from_u64(params.seed);
    membership::complete(&mut phi, graph, &ids, &node_index, &mut rng)?;
    membership::normalize(&mut phi, params.normalization);
    let community_walks =
        membership::label_walks(&phi, &node_index, node_walks, assigned, &mut rng)?;

    tracing::info!(
        communities = phi.nrows(),
        nodes = ids.len(),
        walks = community_walks.len(),
        "community detection finished"
    );

    Ok(Detection {
        phi,
        community_walks,
        node_index,
        ids,
    })
}
