//! Pairing node walks with community walks.

use crate::error::{Error, Result};

/// A node corpus and a community corpus checked to line up walk for walk.
///
/// Pairs are zipped on demand by [`AlignedCorpus::iter`], which may be called
/// any number of times.
#[derive(Debug)]
pub struct AlignedCorpus<'a, N> {
    nodes: &'a [Vec<N>],
    communities: &'a [Vec<usize>],
}

impl<N> Clone for AlignedCorpus<'_, N> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<N> Copy for AlignedCorpus<'_, N> {}

/// Pair two corpora after checking that walk counts and every walk length
/// agree.
///
/// # Example
///
/// ```rust
/// use commune::corpus::align;
///
/// let nodes = vec![vec![0, 1, 2, 3], vec![1, 2, 3, 0]];
/// let comms = vec![vec![0, 0, 1, 1], vec![0, 1, 1, 0]];
/// let corpus = align(&nodes, &comms).unwrap();
///
/// let first: Vec<_> = corpus.iter().next().unwrap();
/// assert_eq!(first, vec![(&0, 0), (&1, 0), (&2, 1), (&3, 1)]);
/// ```
pub fn align<'a, N>(
    node_walks: &'a [Vec<N>],
    community_walks: &'a [Vec<usize>],
) -> Result<AlignedCorpus<'a, N>> {
    if node_walks.len() != community_walks.len() {
        return Err(Error::LengthMismatch {
            walk: None,
            expected: node_walks.len(),
            found: community_walks.len(),
        });
    }
    for (i, (n, c)) in node_walks.iter().zip(community_walks).enumerate() {
        if n.len() != c.len() {
            return Err(Error::LengthMismatch {
                walk: Some(i),
                expected: n.len(),
                found: c.len(),
            });
        }
    }
    Ok(AlignedCorpus {
        nodes: node_walks,
        communities: community_walks,
    })
}

impl<'a, N> AlignedCorpus<'a, N> {
    /// Number of walks.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// True if there are no walks.
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Total positions across all walks.
    pub fn total_tokens(&self) -> usize {
        self.nodes.iter().map(Vec::len).sum()
    }

    /// The node side.
    pub fn node_walks(&self) -> &'a [Vec<N>] {
        self.nodes
    }

    /// The community side.
    pub fn community_walks(&self) -> &'a [Vec<usize>] {
        self.communities
    }

    /// Fresh pass over the aligned walks, in walk order.
    pub fn iter(&self) -> AlignedWalks<'a, N> {
        AlignedWalks {
            nodes: self.nodes.iter(),
            communities: self.communities.iter(),
        }
    }
}

impl<'a, N> IntoIterator for &AlignedCorpus<'a, N> {
    type Item = Vec<(&'a N, usize)>;
    type IntoIter = AlignedWalks<'a, N>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// Iterator over aligned walks; each item is one walk's `(node, community)`
/// pairs.
#[derive(Debug, Clone)]
pub struct AlignedWalks<'a, N> {
    nodes: std::slice::Iter<'a, Vec<N>>,
    communities: std::slice::Iter<'a, Vec<usize>>,
}

impl<'a, N> Iterator for AlignedWalks<'a, N> {
    type Item = Vec<(&'a N, usize)>;

    fn next(&mut self) -> Option<Self::Item> {
        let nodes = self.nodes.next()?;
        let comms = self.communities.next()?;
        Some(nodes.iter().zip(comms.iter().copied()).collect())
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.nodes.size_hint()
    }
}

impl<N> ExactSizeIterator for AlignedWalks<'_, N> {}
