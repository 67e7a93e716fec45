//! Community detection.
//!
//! A detection strategy looks at the graph and the node walks and returns a
//! [`Detection`]: a membership matrix `phi` (communities × nodes) plus one
//! community label for every position of every walk. The labeled walks line
//! up with the node walks and feed the community pass of the trainer.
//!
//! ## Strategies
//!
//! [`Detector`] is the closed set of strategies:
//!
//! - **Louvain**: multi-level modularity optimization. Hard partition.
//! - **Label propagation**: nodes adopt the majority label of their
//!   neighbors. Hard partition, O(E) per sweep.
//! - **Overlapping**: member lists computed elsewhere; a node may sit in
//!   several communities.
//! - **Assigned**: per-position labels computed elsewhere, with gaps.
//!
//! ## The Modularity Objective
//!
//! ```text
//! Q = (1/2m) × Σ[A_ij - γ(k_i × k_j)/(2m)] × δ(c_i, c_j)
//! ```
//!
//! Where m is the total edge weight, k_i the degree of node i, and γ the
//! resolution. Larger γ yields smaller communities.
//!
//! ## From membership to labels
//!
//! Every node that occurs in a walk gets a `phi` column. A column left empty
//! by the strategy is filled from the majority of its labeled neighbors, or
//! drawn uniformly when it has none. Each position is then labeled: a one-hot
//! column gives its community; otherwise the previous label in the walk is
//! kept while the node has weight there; otherwise a community is sampled
//! from the column.
//!
//! ## Usage
//!
//! ```rust
//! use commune::community::{CommunityDetection, Detector};
//! use commune::config::DetectionParams;
//! use commune::Graph;
//!
//! let graph = Graph::from_edges([(0u32, 1u32), (1, 2), (2, 3), (3, 0)]);
//! let walks = vec![vec![0, 1, 2, 3], vec![2, 3, 0, 1]];
//!
//! let detector = Detector::from_name("louvain").unwrap();
//! let detection = detector.detect(&graph, &walks, &DetectionParams::default()).unwrap();
//! assert_eq!(detection.community_walks()[1].len(), 4);
//! ```
//!
//! ## References
//!
//! - Blondel et al. (2008). "Fast unfolding of communities in large networks."
//! - Raghavan, Albert, Kumara (2007). "Near linear time algorithm to detect
//!   community structures in large-scale networks."

mod detector;
mod label_prop;
mod louvain;
mod membership;
mod traits;

pub use detector::{AssignedLabels, Detection, Detector};
pub(crate) use membership::{argmax, argmin};
pub use label_prop::LabelPropagation;
pub use louvain::Louvain;
pub use traits::{CommunityDetection, Partitioner};
