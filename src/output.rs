//! Text output for trained matrices.
//!
//! Format: a header line `"<rows> <dim>"`, then one line per row holding the
//! row id and `dim` values with six decimals, separated by single spaces.
//! Node rows follow vocabulary order (most frequent first); community rows
//! are numbered `0..K`.

use crate::community::{argmax, argmin, Detection};
use crate::embedding::Embeddings;
use crate::error::{Error, Result};
use crate::graph::NodeId;
use crate::vocab::Vocabulary;
use ndarray::{Array2, ArrayView1, ArrayView2};
use serde::{Deserialize, Serialize};
use std::fmt::Display;
use std::io::Write;

/// How a node's community vector is chosen for concatenation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Concatenation {
    /// Community with the largest membership weight.
    Max,
    /// Community with the smallest membership weight.
    Min,
    /// Membership-weighted mean of all community vectors.
    #[default]
    Average,
}

/// Write `matrix` with one id per row.
pub fn write_matrix<W, I, D>(mut writer: W, ids: I, matrix: ArrayView2<'_, f32>) -> Result<()>
where
    W: Write,
    I: IntoIterator<Item = D>,
    D: Display,
{
    let (rows, dim) = matrix.dim();
    writeln!(writer, "{rows} {dim}")?;
    let mut written = 0;
    for (id, row) in ids.into_iter().zip(matrix.rows()) {
        write_row(&mut writer, id, row)?;
        written += 1;
    }
    if written != rows {
        return Err(Error::DimensionMismatch {
            expected: rows,
            found: written,
        });
    }
    writer.flush()?;
    Ok(())
}

fn write_row<W: Write, D: Display>(writer: &mut W, id: D, row: ArrayView1<'_, f32>) -> Result<()> {
    write!(writer, "{id}")?;
    for v in row {
        write!(writer, " {v:.6}")?;
    }
    writeln!(writer)?;
    Ok(())
}

/// Write node embeddings in vocabulary order.
pub fn write_node_embeddings<W, N>(writer: W, vocab: &Vocabulary<N>, embeddings: &Embeddings) -> Result<()>
where
    W: Write,
    N: NodeId + Display,
{
    write_matrix(
        writer,
        vocab.entries().iter().map(|e| &e.id),
        embeddings.nodes().view(),
    )
}

/// Write community embeddings, ids `0..K`.
pub fn write_community_embeddings<W: Write>(writer: W, embeddings: &Embeddings) -> Result<()> {
    let k = embeddings.communities().nrows();
    write_matrix(writer, 0..k, embeddings.communities().view())
}

/// Node vector followed by a community vector chosen by `strategy`, one row
/// per vocabulary entry.
pub fn concatenate<N: NodeId>(
    vocab: &Vocabulary<N>,
    embeddings: &Embeddings,
    detection: &Detection<N>,
    strategy: Concatenation,
) -> Result<Array2<f32>> {
    let nodes = embeddings.nodes();
    let communities = embeddings.communities();
    if communities.nrows() != detection.num_communities() {
        return Err(Error::DimensionMismatch {
            expected: detection.num_communities(),
            found: communities.nrows(),
        });
    }
    if nodes.nrows() != vocab.len() {
        return Err(Error::DimensionMismatch {
            expected: vocab.len(),
            found: nodes.nrows(),
        });
    }

    let (d, dc) = (nodes.ncols(), communities.ncols());
    let mut out = Array2::zeros((vocab.len(), d + dc));
    for (i, entry) in vocab.entries().iter().enumerate() {
        let weights = detection.column_values(&entry.id).ok_or_else(|| {
            Error::precondition(format!("node {:?} has no community membership", entry.id))
        })?;

        let mut row = out.row_mut(i);
        row.slice_mut(ndarray::s![..d]).assign(&nodes.row(i));
        let mut tail = row.slice_mut(ndarray::s![d..]);
        match strategy {
            Concatenation::Max => tail.assign(&communities.row(argmax(&weights))),
            Concatenation::Min => tail.assign(&communities.row(argmin(&weights))),
            Concatenation::Average => {
                let total: f64 = weights.iter().sum();
                if total > 0.0 {
                    for (k, &w) in weights.iter().enumerate() {
                        if w > 0.0 {
                            tail.scaled_add((w / total) as f32, &communities.row(k));
                        }
                    }
                }
            }
        }
    }
    Ok(out)
}

/// Write [`concatenate`] output in vocabulary order.
pub fn write_concatenated<W, N>(
    writer: W,
    vocab: &Vocabulary<N>,
    embeddings: &Embeddings,
    detection: &Detection<N>,
    strategy: Concatenation,
) -> Result<()>
where
    W: Write,
    N: NodeId + Display,
{
    let matrix = concatenate(vocab, embeddings, detection, strategy)?;
    write_matrix(writer, vocab.entries().iter().map(|e| &e.id), matrix.view())
}
