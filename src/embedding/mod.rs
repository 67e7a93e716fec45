//! Embedding store: the four trainable matrices.
//!
//! | Matrix | Shape | Initial value | Role |
//! |--------|-------|---------------|------|
//! | node input | N × D | seeded uniform | node embeddings |
//! | node output | N × D | zeros | node-side noise targets |
//! | community input | K × D_c | seeded uniform | community embeddings |
//! | community output | K × D_c | zeros | community-side noise targets |
//!
//! Seeding is per row: row `r` of a seeded matrix is drawn from an RNG whose
//! seed mixes the run seed with `r`, so the same seed and vocabulary always
//! produce bit-identical initial vectors, regardless of thread count.

mod arena;

pub use arena::{RowArena, RowLease};

use crate::error::{Error, Result};
use crate::graph::NodeId;
use crate::vocab::Vocabulary;
use ndarray::Array2;
use rand::prelude::*;
use rand_distr::{Distribution, Uniform};

const COMMUNITY_SALT: u64 = 0x9e37_79b9_7f4a_7c15;

/// Shared mutable matrices for training.
#[derive(Debug)]
pub struct EmbeddingStore {
    node_input: RowArena,
    node_output: RowArena,
    community_input: RowArena,
    community_output: RowArena,
}

/// Allocate and seed the four matrices for `vocab` and `community_count`
/// communities.
pub fn allocate_embeddings<N: NodeId>(
    vocab: &Vocabulary<N>,
    node_dim: usize,
    community_count: usize,
    community_dim: usize,
    seed: u64,
) -> Result<EmbeddingStore> {
    if node_dim == 0 {
        return Err(Error::InvalidParameter {
            name: "node_dim",
            message: "must be > 0",
        });
    }
    if community_dim == 0 {
        return Err(Error::InvalidParameter {
            name: "community_dim",
            message: "must be > 0",
        });
    }

    let n = vocab.len();
    Ok(EmbeddingStore {
        node_input: RowArena::from_fn(n, node_dim, |r, row| seeded_row(seed, r, row)),
        node_output: RowArena::zeros(n, node_dim),
        community_input: RowArena::from_fn(community_count, community_dim, |r, row| {
            seeded_row(seed ^ COMMUNITY_SALT, r, row)
        }),
        community_output: RowArena::zeros(community_count, community_dim),
    })
}

/// SplitMix64 finalizer over `(seed, row)`.
fn row_seed(seed: u64, row: usize) -> u64 {
    let mut z = seed.wrapping_add((row as u64 + 1).wrapping_mul(0x9e37_79b9_7f4a_7c15));
    z = (z ^ (z >> 30)).wrapping_mul(0xbf58_476d_1ce4_e5b9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94d0_49bb_1331_11eb);
    z ^ (z >> 31)
}

fn seeded_row(seed: u64, row: usize, out: &mut [f32]) {
    let mut rng = StdRng::seed_from_u64(row_seed(seed, row));
    let half = 0.5 / out.len() as f32;
    match Uniform::new(-half, half) {
        Ok(dist) => out.iter_mut().for_each(|v| *v = dist.sample(&mut rng)),
        Err(_) => out.fill(0.0),
    }
}

impl EmbeddingStore {
    /// Node input vectors (N × D).
    pub fn node_input(&self) -> &RowArena {
        &self.node_input
    }

    /// Node output vectors (N × D).
    pub fn node_output(&self) -> &RowArena {
        &self.node_output
    }

    /// Community input vectors (K × D_c).
    pub fn community_input(&self) -> &RowArena {
        &self.community_input
    }

    /// Community output vectors (K × D_c).
    pub fn community_output(&self) -> &RowArena {
        &self.community_output
    }

    /// Vocabulary size N.
    pub fn node_count(&self) -> usize {
        self.node_input.rows()
    }

    /// Community count K.
    pub fn community_count(&self) -> usize {
        self.community_output.rows()
    }

    /// Node width D.
    pub fn node_dim(&self) -> usize {
        self.node_input.dim()
    }

    /// Community width D_c.
    pub fn community_dim(&self) -> usize {
        self.community_output.dim()
    }

    /// End training: copy every matrix into read-only dense form.
    pub fn freeze(self) -> Embeddings {
        Embeddings {
            node_input: self.node_input.to_array(),
            node_output: self.node_output.to_array(),
            community_input: self.community_input.to_array(),
            community_output: self.community_output.to_array(),
        }
    }
}

/// Trained matrices, frozen after training.
#[derive(Debug, Clone, PartialEq)]
pub struct Embeddings {
    node_input: Array2<f32>,
    node_output: Array2<f32>,
    community_input: Array2<f32>,
    community_output: Array2<f32>,
}

impl Embeddings {
    /// Node embeddings, one row per vocabulary index.
    pub fn nodes(&self) -> &Array2<f32> {
        &self.node_input
    }

    /// Node output (context) vectors.
    pub fn node_context(&self) -> &Array2<f32> {
        &self.node_output
    }

    /// Community embeddings, one row per community.
    pub fn communities(&self) -> &Array2<f32> {
        &self.community_input
    }

    /// Community output vectors.
    pub fn community_context(&self) -> &Array2<f32> {
        &self.community_output
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::vocab::build_vocabulary;

    fn ring_vocab() -> Vocabulary<u32> {
        build_vocabulary(&[vec![0u32, 1, 2, 3], vec![1, 2, 3, 0]]).unwrap()
    }

    #[test]
    fn same_seed_is_bit_identical() -> Result<()> {
        let vocab = ring_vocab();
        let a = allocate_embeddings(&vocab, 16, 2, 16, 7)?.freeze();
        let b = allocate_embeddings(&vocab, 16, 2, 16, 7)?.freeze();
        let bits = |m: &Array2<f32>| m.iter().map(|v| v.to_bits()).collect::<Vec<_>>();
        assert_eq!(bits(a.nodes()), bits(b.nodes()));
        assert_eq!(bits(a.communities()), bits(b.communities()));

        let c = allocate_embeddings(&vocab, 16, 2, 16, 8)?.freeze();
        assert_ne!(bits(a.nodes()), bits(c.nodes()));
        Ok(())
    }

    #[test]
    fn shapes_and_ranges() -> Result<()> {
        let vocab = ring_vocab();
        let store = allocate_embeddings(&vocab, 8, 3, 4, 1)?;
        assert_eq!(store.node_count(), 4);
        assert_eq!(store.community_count(), 3);
        assert_eq!(store.node_dim(), 8);
        assert_eq!(store.community_dim(), 4);
        assert_eq!(store.node_output().row(2), vec![0.0; 8]);

        let frozen = store.freeze();
        assert_eq!(frozen.nodes().dim(), (4, 8));
        assert_eq!(frozen.communities().dim(), (3, 4));
        assert_eq!(frozen.community_context().dim(), (3, 4));
        assert!(frozen.nodes().iter().all(|v| v.abs() <= 0.5 / 8.0));
        // Rows are not all the same vector.
        assert_ne!(frozen.nodes().row(0), frozen.nodes().row(1));
        Ok(())
    }

    #[test]
    fn zero_dim_is_rejected() {
        let vocab = ring_vocab();
        assert!(allocate_embeddings(&vocab, 0, 2, 4, 1).is_err());
        assert!(allocate_embeddings(&vocab, 4, 2, 0, 1).is_err());
    }
}
