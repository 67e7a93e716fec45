//! Node vocabulary.
//!
//! Indices are dense and frequency-sorted: index 0 is the most frequent node.
//! Ties keep first-seen order, so two builds over the same corpus always agree.

use crate::error::{Error, Result};
use crate::graph::NodeId;
use std::collections::HashMap;

/// One vocabulary entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VocabEntry<N> {
    /// Node id.
    pub id: N,
    /// Raw occurrences in the corpus.
    pub count: u64,
}

/// Bijection between node ids and dense indices `[0, N)`.
#[derive(Debug, Clone)]
pub struct Vocabulary<N: NodeId> {
    entries: Vec<VocabEntry<N>>,
    index: HashMap<N, u32>,
}

/// Count every node in `walks` and assign frequency-sorted indices.
///
/// # Example
///
/// ```rust
/// use commune::build_vocabulary;
///
/// let walks = vec![vec!["b", "a", "a"], vec!["c", "b", "a"]];
/// let vocab = build_vocabulary(&walks).unwrap();
/// assert_eq!(vocab.index_of(&"a"), Some(0));
/// assert_eq!(vocab.index_of(&"b"), Some(1));
/// assert_eq!(vocab.index_of(&"c"), Some(2));
/// ```
pub fn build_vocabulary<N: NodeId>(walks: &[Vec<N>]) -> Result<Vocabulary<N>> {
    if walks.is_empty() {
        return Err(Error::EmptyCorpus);
    }

    // First-seen order, then counts.
    let mut seen: HashMap<&N, usize> = HashMap::new();
    let mut order: Vec<(&N, u64)> = Vec::new();
    for node in walks.iter().flatten() {
        match seen.get(node) {
            Some(&slot) => order[slot].1 += 1,
            None => {
                seen.insert(node, order.len());
                order.push((node, 1));
            }
        }
    }
    if order.is_empty() {
        return Err(Error::EmptyCorpus);
    }

    // Stable sort keeps first-seen order among equal counts.
    order.sort_by(|a, b| b.1.cmp(&a.1));

    let entries: Vec<VocabEntry<N>> = order
        .into_iter()
        .map(|(id, count)| VocabEntry {
            id: id.clone(),
            count,
        })
        .collect();
    let index = entries
        .iter()
        .enumerate()
        .map(|(i, e)| (e.id.clone(), i as u32))
        .collect();

    Ok(Vocabulary { entries, index })
}

impl<N: NodeId> Vocabulary<N> {
    /// Number of distinct nodes.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True if the vocabulary holds no nodes.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Dense index of a node.
    pub fn index_of(&self, id: &N) -> Option<u32> {
        self.index.get(id).copied()
    }

    /// Node id at an index.
    pub fn id(&self, index: usize) -> Option<&N> {
        self.entries.get(index).map(|e| &e.id)
    }

    /// Raw count at an index (0 if out of range).
    pub fn count(&self, index: usize) -> u64 {
        self.entries.get(index).map_or(0, |e| e.count)
    }

    /// Entries in index order (descending frequency).
    pub fn entries(&self) -> &[VocabEntry<N>] {
        &self.entries
    }

    /// Counts in index order, for building noise tables.
    pub fn counts(&self) -> Vec<u64> {
        self.entries.iter().map(|e| e.count).collect()
    }

    /// Sum of all counts.
    pub fn total_tokens(&self) -> u64 {
        self.entries.iter().map(|e| e.count).sum()
    }
}
