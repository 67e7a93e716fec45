//! End-to-end fitting: walks in, trained embeddings out.
//!
//! ```text
//! walks ─▶ equalize ─▶ vocabulary ─▶ detect ─▶ align ─▶ allocate
//!                                                          │
//!        FittedModel ◀── freeze ◀── community pass ◀── node pass
//! ```

use crate::community::{CommunityDetection, Detection, Detector};
use crate::config::{PipelineConfig, WalkConfig};
use crate::corpus::{align, equalize_walks, token_count};
use crate::embedding::{allocate_embeddings, Embeddings};
use crate::error::{Error, Result};
use crate::graph::{Graph, NodeId};
use crate::output::{self, Concatenation};
use crate::train::{ExpectedTotals, Trainer, TrainingReport};
use crate::vocab::{build_vocabulary, Vocabulary};
use crate::walk::generate_walks;
use ndarray::{Array2, ArrayView1};
use std::fmt::Display;
use std::io::Write;

/// Everything a fit produces.
#[derive(Debug, Clone)]
pub struct FittedModel<N: NodeId> {
    vocab: Vocabulary<N>,
    detection: Detection<N>,
    embeddings: Embeddings,
    node_report: TrainingReport,
    community_report: TrainingReport,
}

/// Fit node and community embeddings to `node_walks` over `graph`.
pub fn fit<N: NodeId>(
    graph: &Graph<N>,
    mut node_walks: Vec<Vec<N>>,
    detector: &Detector<N>,
    config: &PipelineConfig,
) -> Result<FittedModel<N>> {
    let training = &config.training;
    training.validate()?;

    let walk_length = match config.walk_length {
        Some(l) => l,
        None => node_walks
            .iter()
            .map(Vec::len)
            .max()
            .ok_or(Error::EmptyCorpus)?,
    };
    equalize_walks(&mut node_walks, walk_length)?;

    let vocab = build_vocabulary(&node_walks)?;
    tracing::info!(
        walks = node_walks.len(),
        tokens = token_count(&node_walks),
        walk_length,
        nodes = vocab.len(),
        method = detector.name(),
        "fitting"
    );

    let detection = detector.detect(graph, &node_walks, &config.detection)?;
    let corpus = align(&node_walks, detection.community_walks())?;

    let store = allocate_embeddings(
        &vocab,
        training.node_dim,
        detection.num_communities(),
        training.community_dim,
        training.seed,
    )?;

    let trainer = Trainer::new(&vocab, &store, training.clone());
    let totals = ExpectedTotals::of_walks(&node_walks);
    let node_report = trainer.train_nodes(&node_walks, totals)?;
    let community_report = trainer.train_communities(&corpus, totals)?;

    Ok(FittedModel {
        embeddings: store.freeze(),
        vocab,
        detection,
        node_report,
        community_report,
    })
}

/// Generate random walks over `graph` with `walks.strategy`, then [`fit`]
/// to them.
pub fn fit_graph<N: NodeId>(
    graph: &Graph<N>,
    walks: &WalkConfig,
    detector: &Detector<N>,
    config: &PipelineConfig,
) -> Result<FittedModel<N>> {
    let node_walks = generate_walks(graph, walks)?;
    let mut config = config.clone();
    config.walk_length.get_or_insert(walks.walk_length);
    fit(graph, node_walks, detector, &config)
}

impl<N: NodeId> FittedModel<N> {
    /// Node vocabulary, in row order.
    pub fn vocab(&self) -> &Vocabulary<N> {
        &self.vocab
    }

    /// Community detection output.
    pub fn detection(&self) -> &Detection<N> {
        &self.detection
    }

    /// Trained matrices.
    pub fn embeddings(&self) -> &Embeddings {
        &self.embeddings
    }

    /// Report of the node pass.
    pub fn node_report(&self) -> &TrainingReport {
        &self.node_report
    }

    /// Report of the community pass.
    pub fn community_report(&self) -> &TrainingReport {
        &self.community_report
    }

    /// Embedding of one node.
    pub fn node_vector(&self, id: &N) -> Option<ArrayView1<'_, f32>> {
        let i = self.vocab.index_of(id)? as usize;
        Some(self.embeddings.nodes().row(i))
    }

    /// Embedding of one community.
    pub fn community_vector(&self, community: usize) -> Option<ArrayView1<'_, f32>> {
        (community < self.embeddings.communities().nrows())
            .then(|| self.embeddings.communities().row(community))
    }

    /// Node vectors with a community vector appended.
    pub fn concatenated(&self, strategy: Concatenation) -> Result<Array2<f32>> {
        output::concatenate(&self.vocab, &self.embeddings, &self.detection, strategy)
    }
}

impl<N: NodeId + Display> FittedModel<N> {
    /// Write node embeddings.
    pub fn write_node_embeddings<W: Write>(&self, writer: W) -> Result<()> {
        output::write_node_embeddings(writer, &self.vocab, &self.embeddings)
    }

    /// Write community embeddings.
    pub fn write_community_embeddings<W: Write>(&self, writer: W) -> Result<()> {
        output::write_community_embeddings(writer, &self.embeddings)
    }

    /// Write concatenated node and community embeddings.
    pub fn write_concatenated<W: Write>(&self, writer: W, strategy: Concatenation) -> Result<()> {
        output::write_concatenated(writer, &self.vocab, &self.embeddings, &self.detection, strategy)
    }
}
