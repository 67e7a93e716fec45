//! Turning per-node membership into per-position labels.
//!
//! Three steps run after a strategy has produced raw membership:
//!
//! 1. [`complete`] gives every column with no community one, taken from the
//!    labeled graph neighbors or, failing that, drawn uniformly.
//! 2. [`normalize`] rescales `phi` per node or per community.
//! 3. [`label_walks`] picks one community for every walk position.

use crate::config::PhiNormalization;
use crate::error::{Error, Result};
use crate::graph::{Graph, NodeId};
use ndarray::Array2;
use rand::prelude::*;
use std::collections::HashMap;

#[cfg(feature = "parallel")]
use rayon::prelude::*;

/// Column order for `phi`: graph ids first, then walk-only ids by first sight.
pub(crate) fn column_index<N: NodeId>(
    graph: &Graph<N>,
    node_walks: &[Vec<N>],
) -> (Vec<N>, HashMap<N, usize>) {
    let mut ids: Vec<N> = graph.ids().cloned().collect();
    let mut index: HashMap<N, usize> = ids
        .iter()
        .enumerate()
        .map(|(i, id)| (id.clone(), i))
        .collect();
    extend_index(&mut ids, &mut index, node_walks);
    (ids, index)
}

/// Append any walk id missing from `index` as a new column.
pub(crate) fn extend_index<N: NodeId>(
    ids: &mut Vec<N>,
    index: &mut HashMap<N, usize>,
    node_walks: &[Vec<N>],
) {
    for id in node_walks.iter().flatten() {
        if !index.contains_key(id) {
            index.insert(id.clone(), ids.len());
            ids.push(id.clone());
        }
    }
}

/// Widen `phi` with zero columns up to `cols`.
pub(crate) fn pad_columns(phi: Array2<f64>, cols: usize) -> Array2<f64> {
    let (k, n) = phi.dim();
    if n >= cols {
        return phi;
    }
    let mut wide = Array2::zeros((k, cols));
    wide.slice_mut(ndarray::s![.., ..n]).assign(&phi);
    wide
}

/// Give every empty column exactly one community.
///
/// Columns are visited in order. An empty column takes the argmax of the
/// summed columns of its labeled neighbors (lowest id on ties); columns
/// completed earlier count as labeled. With no labeled neighbor the community
/// is drawn uniformly from `rng`. Returns how many columns were filled.
pub(crate) fn complete<N: NodeId, R: Rng>(
    phi: &mut Array2<f64>,
    graph: &Graph<N>,
    ids: &[N],
    index: &HashMap<N, usize>,
    rng: &mut R,
) -> Result<usize> {
    let k = phi.nrows();
    if k == 0 {
        return Err(Error::DetectionFailure("no communities found".into()));
    }

    let mut filled = 0;
    let mut votes = vec![0.0f64; k];
    for (col, id) in ids.iter().enumerate() {
        if phi.column(col).iter().any(|&w| w > 0.0) {
            continue;
        }

        votes.fill(0.0);
        let mut labeled = false;
        for neighbor in graph.neighbors(id) {
            let Some(&j) = index.get(neighbor) else {
                continue;
            };
            let column = phi.column(j);
            if column.iter().any(|&w| w > 0.0) {
                labeled = true;
                for (v, &w) in votes.iter_mut().zip(column.iter()) {
                    *v += w;
                }
            }
        }

        let community = if labeled {
            argmax(&votes)
        } else {
            rng.random_range(0..k)
        };
        phi[[community, col]] = 1.0;
        filled += 1;
    }

    if filled > 0 {
        tracing::debug!(filled, "completed membership for unlabeled nodes");
    }
    Ok(filled)
}

/// Rescale `phi` in place.
pub(crate) fn normalize(phi: &mut Array2<f64>, mode: PhiNormalization) {
    match mode {
        PhiNormalization::None => {}
        PhiNormalization::PerNode => {
            let sums = axis_sums(phi, ndarray::Axis(0));
            for (mut column, s) in phi.columns_mut().into_iter().zip(sums) {
                if s > 0.0 {
                    column.mapv_inplace(|w| w / s);
                }
            }
        }
        PhiNormalization::PerCommunity => {
            let sums = axis_sums(phi, ndarray::Axis(1));
            for (mut row, s) in phi.rows_mut().into_iter().zip(sums) {
                if s > 0.0 {
                    row.mapv_inplace(|w| w / s);
                }
            }
        }
    }
}

/// Sum along `axis`: `Axis(0)` gives one sum per column.
fn axis_sums(phi: &Array2<f64>, axis: ndarray::Axis) -> Vec<f64> {
    let lanes = phi.len_of(ndarray::Axis(1 - axis.index()));

    #[cfg(feature = "parallel")]
    {
        (0..lanes)
            .into_par_iter()
            .map(|i| phi.index_axis(ndarray::Axis(1 - axis.index()), i).sum())
            .collect()
    }

    #[cfg(not(feature = "parallel"))]
    {
        (0..lanes)
            .map(|i| phi.index_axis(ndarray::Axis(1 - axis.index()), i).sum())
            .collect()
    }
}

/// Label every position of every walk.
///
/// A valid `assigned` label wins. Otherwise a one-hot column gives its
/// community, then the previous label is kept while the node has positive
/// weight there, then a community is sampled in proportion to the column.
pub(crate) fn label_walks<N: NodeId, R: Rng>(
    phi: &Array2<f64>,
    index: &HashMap<N, usize>,
    node_walks: &[Vec<N>],
    assigned: Option<&[Vec<Option<usize>>]>,
    rng: &mut R,
) -> Result<Vec<Vec<usize>>> {
    let k = phi.nrows();
    if k == 0 {
        return Err(Error::DetectionFailure("no communities to label with".into()));
    }
    let mut walks = Vec::with_capacity(node_walks.len());

    for (w, walk) in node_walks.iter().enumerate() {
        let prior = assigned.and_then(|a| a.get(w));
        let mut labels = Vec::with_capacity(walk.len());
        let mut previous: Option<usize> = None;

        for (t, id) in walk.iter().enumerate() {
            let col = *index
                .get(id)
                .ok_or_else(|| Error::precondition(format!("walk node {id:?} has no phi column")))?;
            let column = phi.column(col);

            let given = prior.and_then(|p| p.get(t).copied().flatten());
            let label = match given.filter(|&c| c < k) {
                Some(c) => c,
                None => {
                    let mut support = column.iter().enumerate().filter(|&(_, &w)| w > 0.0);
                    match (support.next(), support.next()) {
                        (Some((only, _)), None) => only,
                        (None, _) => rng.random_range(0..k),
                        _ => match previous.filter(|&p| column[p] > 0.0) {
                            Some(p) => p,
                            None => sample(column.iter().copied(), rng),
                        },
                    }
                }
            };

            labels.push(label);
            previous = Some(label);
        }
        walks.push(labels);
    }

    Ok(walks)
}

/// Draw an index in proportion to non-negative `weights`.
fn sample<R: Rng>(weights: impl Iterator<Item = f64> + Clone, rng: &mut R) -> usize {
    let total: f64 = weights.clone().filter(|w| *w > 0.0).sum();
    let mut r = rng.random::<f64>() * total;
    let mut last = 0;
    for (i, w) in weights.enumerate() {
        if w <= 0.0 {
            continue;
        }
        last = i;
        if r < w {
            return i;
        }
        r -= w;
    }
    last
}

/// Index of the largest value; the first one wins ties.
pub(crate) fn argmax(values: &[f64]) -> usize {
    let mut best = 0;
    for (i, &v) in values.iter().enumerate() {
        if v > values[best] {
            best = i;
        }
    }
    best
}

/// Index of the smallest value; the first one wins ties.
pub(crate) fn argmin(values: &[f64]) -> usize {
    let mut best = 0;
    for (i, &v) in values.iter().enumerate() {
        if v < values[best] {
            best = i;
        }
    }
    best
}
