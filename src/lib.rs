//! # commune
//!
//! Community-aware node embeddings: random walks over a graph, a pluggable
//! community detection step, and a concurrent skip-gram trainer that learns
//! node vectors and community vectors side by side.
//!
//! The pieces compose bottom-up:
//!
//! - [`graph`]: undirected graph keyed by node id.
//! - [`walk`]: DeepWalk and node2vec corpus generation.
//! - [`corpus`]: walk equalization, text I/O, and node/community alignment.
//! - [`vocab`]: frequency-sorted node vocabulary.
//! - [`community`]: detection strategies producing `phi` and labeled walks.
//! - [`embedding`]: the four shared training matrices.
//! - [`train`]: producer / worker / coordinator skip-gram passes.
//! - [`output`]: text writers and node+community concatenation.
//! - [`pipeline`]: all of the above in one call.
//!
//! ```rust
//! use commune::community::Detector;
//! use commune::config::{PipelineConfig, TrainingConfig, WalkConfig};
//! use commune::{pipeline, Graph};
//!
//! let graph = Graph::from_edges([(0u32, 1u32), (1, 2), (0, 2), (2, 3), (3, 4), (4, 5), (3, 5)]);
//! let walks = WalkConfig::default().with_num_walks(2).with_walk_length(10);
//! let config = PipelineConfig::new().with_training(TrainingConfig::new().with_dims(16, 16));
//!
//! let model = pipeline::fit_graph(&graph, &walks, &Detector::from_name("louvain").unwrap(), &config).unwrap();
//! assert_eq!(model.embeddings().nodes().ncols(), 16);
//! ```

pub mod community;
pub mod config;
pub mod corpus;
pub mod embedding;
/// Error types used across `commune`.
pub mod error;
pub mod graph;
pub mod output;
pub mod pipeline;
pub mod train;
pub mod vocab;
pub mod walk;

#[cfg(test)]
mod pipeline_tests;

pub use community::{CommunityDetection, Detection, Detector};
pub use config::{
    DetectionParams, PhiNormalization, PipelineConfig, TrainingConfig, WalkConfig, WalkStrategy,
};
pub use corpus::{align, equalize_walks, AlignedCorpus};
pub use embedding::{allocate_embeddings, EmbeddingStore, Embeddings};
pub use error::{Error, Result};
pub use graph::{Graph, NodeId};
pub use output::Concatenation;
pub use pipeline::{fit, fit_graph, FittedModel};
pub use train::{ExpectedTotals, Trainer, TrainingReport};
pub use vocab::{build_vocabulary, Vocabulary};
