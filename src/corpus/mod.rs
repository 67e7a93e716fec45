//! Walk corpora.
//!
//! A corpus is a list of walks, each an ordered sequence of node ids. Two
//! corpora travel through the pipeline side by side:
//!
//! ```text
//! node walks       [0, 1, 2, 3]   [1, 2, 3, 0]
//! community walks  [0, 0, 1, 1]   [0, 1, 1, 0]
//!                    │                │
//!                    ▼ align          ▼
//! aligned          [(0,0),(1,0),(2,1),(3,1)]  [(1,0),(2,1),(3,1),(0,0)]
//! ```
//!
//! The trainer slides a window over each aligned walk, so walks must be
//! equal length position for position. [`equalize_walks`] pads short walks
//! (random walks stop early on isolated nodes) and [`align`] checks the
//! pairing.

mod align;

pub use align::{align, AlignedCorpus, AlignedWalks};

use crate::error::{Error, Result};
use std::io::{BufRead, Write};

/// Bring every walk to exactly `walk_length` elements.
///
/// Short walks are padded by repeating their last element; long walks are
/// truncated. An empty walk has nothing to repeat and is rejected.
pub fn equalize_walks<N: Clone>(walks: &mut [Vec<N>], walk_length: usize) -> Result<()> {
    if walk_length == 0 {
        return Err(Error::InvalidParameter {
            name: "walk_length",
            message: "must be > 0",
        });
    }
    for (i, walk) in walks.iter_mut().enumerate() {
        let last = walk.last().cloned().ok_or(Error::EmptyWalk { walk: i })?;
        walk.resize(walk_length, last);
    }
    Ok(())
}

/// Total number of tokens across walks.
pub fn token_count<N>(walks: &[Vec<N>]) -> usize {
    walks.iter().map(Vec::len).sum()
}

/// Read a whitespace-separated corpus, one walk per line. Blank lines are
/// skipped.
pub fn read_walks<R: BufRead>(reader: R) -> Result<Vec<Vec<String>>> {
    let mut walks = Vec::new();
    for line in reader.lines() {
        let line = line?;
        let walk: Vec<String> = line.split_whitespace().map(str::to_owned).collect();
        if !walk.is_empty() {
            walks.push(walk);
        }
    }
    Ok(walks)
}

/// Write one walk per line, tokens separated by single spaces.
pub fn write_walks<W, N>(mut writer: W, walks: &[Vec<N>]) -> Result<()>
where
    W: Write,
    N: std::fmt::Display,
{
    for walk in walks {
        let mut first = true;
        for token in walk {
            if !first {
                write!(writer, " ")?;
            }
            write!(writer, "{token}")?;
            first = false;
        }
        writeln!(writer)?;
    }
    writer.flush()?;
    Ok(())
}
