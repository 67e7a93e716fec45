//! Skip-gram negative sampling kernels.
//!
//! One training instance is a binary logistic regression: an input row
//! should score high against its positive target and low against `negative`
//! rows drawn from a unigram^0.75 noise distribution. For each target `y`:
//!
//! ```text
//! f = x · y
//! g = (label - σ(f)) * alpha        label is 1 for the positive, 0 for noise
//! work += g * y
//! y    += g * x
//! ```
//!
//! and finally `x += work`. Scores with `|f| >= MAX_EXP` are saturated and
//! skipped.

use crate::embedding::{EmbeddingStore, RowArena};
use rand::prelude::*;

/// Scores beyond this magnitude contribute no gradient.
pub const MAX_EXP: f32 = 6.0;

/// Upper end of the cumulative noise table.
const TABLE_DOMAIN: u64 = (1 << 31) - 1;

/// Exponent applied to raw counts.
pub const NOISE_POWER: f64 = 0.75;

/// Cumulative unigram^0.75 table. Entries with zero count are never drawn.
#[derive(Debug, Clone)]
pub struct NoiseTable {
    cumulative: Vec<u64>,
}

impl NoiseTable {
    /// Build from raw counts, one per label.
    pub fn new(counts: &[u64]) -> Self {
        let powered: Vec<f64> = counts.iter().map(|&c| (c as f64).powf(NOISE_POWER)).collect();
        let total: f64 = powered.iter().sum();

        let mut cumulative = Vec::with_capacity(counts.len());
        let mut running = 0.0;
        for p in powered {
            running += p;
            let scaled = if total > 0.0 {
                (running / total * TABLE_DOMAIN as f64).round() as u64
            } else {
                0
            };
            cumulative.push(scaled);
        }
        Self { cumulative }
    }

    /// Number of labels.
    pub fn len(&self) -> usize {
        self.cumulative.len()
    }

    /// True if the table has no labels.
    pub fn is_empty(&self) -> bool {
        self.cumulative.is_empty()
    }

    /// Draw one label, or `None` if every count was zero.
    #[inline]
    pub fn sample<R: Rng>(&self, rng: &mut R) -> Option<usize> {
        let last = *self.cumulative.last()?;
        if last == 0 {
            return None;
        }
        let r = rng.random_range(0..last);
        Some(self.cumulative.partition_point(|&c| c <= r))
    }
}

/// Logistic function.
#[inline]
pub fn sigmoid(x: f32) -> f32 {
    1.0 / (1.0 + (-x).exp())
}

/// Per-worker buffers, reused across instances.
#[derive(Debug)]
pub struct Scratch {
    input: Vec<f32>,
    work: Vec<f32>,
}

impl Scratch {
    /// Buffers for rows of width `dim`.
    pub fn new(dim: usize) -> Self {
        Self {
            input: vec![0.0; dim],
            work: vec![0.0; dim],
        }
    }
}

/// Where the accumulated input gradient is written.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flush {
    /// Per-scalar atomic adds.
    Atomic,
    /// Under a row lease.
    Leased,
}

/// One side of an objective: input matrix, output matrix, noise over the
/// output rows.
pub struct Pairing<'a> {
    /// Rows the instance reads and flushes into.
    pub input: &'a RowArena,
    /// Positive and noise target rows.
    pub output: &'a RowArena,
    /// Distribution over `output` rows.
    pub noise: &'a NoiseTable,
    /// How the input row is updated.
    pub flush: Flush,
}

/// Train one instance: `input_row` against `target` plus `negative` noise
/// rows. Noise draws equal to `target` are skipped.
#[inline]
pub fn train_instance<R: Rng>(
    pairing: &Pairing<'_>,
    input_row: usize,
    target: usize,
    negative: usize,
    alpha: f32,
    rng: &mut R,
    scratch: &mut Scratch,
) {
    let Scratch { input, work } = scratch;
    pairing.input.read_row(input_row, input);
    work.fill(0.0);

    update(pairing.output, target, 1.0, alpha, input, work);
    for _ in 0..negative {
        match pairing.noise.sample(rng) {
            Some(noise) if noise != target => update(pairing.output, noise, 0.0, alpha, input, work),
            _ => {}
        }
    }

    match pairing.flush {
        Flush::Atomic => pairing.input.add_row(input_row, work, 1.0),
        Flush::Leased => pairing.input.lease(input_row).add(work, 1.0),
    }
}

#[inline]
fn update(output: &RowArena, row: usize, label: f32, alpha: f32, input: &[f32], work: &mut [f32]) {
    let f = output.dot(row, input);
    if f <= -MAX_EXP || f >= MAX_EXP {
        return;
    }
    let g = (label - sigmoid(f)) * alpha;
    output.axpy_into(row, g, work);
    output.add_row(row, input, g);
}

/// Positions `t'` with `0 < |t - t'| <= window`.
#[inline]
pub fn context(t: usize, len: usize, window: usize) -> impl Iterator<Item = usize> {
    let lo = t.saturating_sub(window);
    let hi = (t + window + 1).min(len);
    (lo..hi).filter(move |&c| c != t)
}

/// A training objective over one kind of walk token.
pub trait Objective: Sync {
    /// What a walk position holds after encoding.
    type Token: Copy + Send;

    /// Width of the rows the scratch buffers must hold.
    fn dim(&self) -> usize;

    /// Train every instance of one walk.
    fn train_walk<R: Rng>(&self, walk: &[Self::Token], alpha: f32, rng: &mut R, scratch: &mut Scratch);
}

/// Plain skip-gram over node walks: a context node predicts the center node.
pub struct NodeObjective<'a> {
    pub(crate) store: &'a EmbeddingStore,
    pub(crate) noise: NoiseTable,
    pub(crate) window: usize,
    pub(crate) negative: usize,
}

impl Objective for NodeObjective<'_> {
    type Token = u32;

    fn dim(&self) -> usize {
        self.store.node_dim()
    }

    fn train_walk<R: Rng>(&self, walk: &[u32], alpha: f32, rng: &mut R, scratch: &mut Scratch) {
        let pairing = Pairing {
            input: self.store.node_input(),
            output: self.store.node_output(),
            noise: &self.noise,
            flush: Flush::Atomic,
        };
        for (t, &center) in walk.iter().enumerate() {
            for c in context(t, walk.len(), self.window) {
                let input = walk[c] as usize;
                train_instance(&pairing, input, center as usize, self.negative, alpha, rng, scratch);
            }
        }
    }
}

/// Community-aware skip-gram over aligned `(node, community)` walks.
///
/// A context node predicts the community at the center position. With
/// `node_noise` set, the mirrored instance also runs: the center community
/// predicts the context node.
pub struct CommunityObjective<'a> {
    pub(crate) store: &'a EmbeddingStore,
    pub(crate) community_noise: NoiseTable,
    pub(crate) node_noise: Option<NoiseTable>,
    pub(crate) window: usize,
    pub(crate) negative: usize,
}

impl Objective for CommunityObjective<'_> {
    type Token = (u32, u32);

    fn dim(&self) -> usize {
        self.store.node_dim()
    }

    fn train_walk<R: Rng>(&self, walk: &[(u32, u32)], alpha: f32, rng: &mut R, scratch: &mut Scratch) {
        let forward = Pairing {
            input: self.store.node_input(),
            output: self.store.community_output(),
            noise: &self.community_noise,
            flush: Flush::Atomic,
        };
        let mirrored = self.node_noise.as_ref().map(|noise| Pairing {
            input: self.store.community_input(),
            output: self.store.node_output(),
            noise,
            flush: Flush::Leased,
        });

        for (t, &(_, community)) in walk.iter().enumerate() {
            for c in context(t, walk.len(), self.window) {
                let node = walk[c].0 as usize;
                train_instance(&forward, node, community as usize, self.negative, alpha, rng, scratch);
                if let Some(mirrored) = &mirrored {
                    train_instance(mirrored, community as usize, node, self.negative, alpha, rng, scratch);
                }
            }
        }
    }
}
