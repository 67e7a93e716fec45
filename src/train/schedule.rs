//! Learning-rate decay and progress accounting.

use serde::{Deserialize, Serialize};

/// Linear decay from `start` to `end`, driven by progress in `[0, 1]`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LearningRateSchedule {
    start: f32,
    end: f32,
}

impl LearningRateSchedule {
    /// Create a schedule. `end` should not exceed `start`.
    pub fn new(start: f32, end: f32) -> Self {
        Self { start, end }
    }

    /// Rate of the first job.
    pub fn start(&self) -> f32 {
        self.start
    }

    /// `max(end, start - (start - end) * progress)`.
    pub fn rate_at(&self, progress: f64) -> f32 {
        let (start, end) = (self.start as f64, self.end as f64);
        let decayed = start - (start - end) * progress;
        (decayed as f32).max(self.end)
    }
}

/// Corpus size the scheduler measures progress against, for one epoch.
///
/// At least one total is required. When both are present, progress is
/// measured in examples (walks).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExpectedTotals {
    /// Walks per epoch.
    pub examples: Option<u64>,
    /// Raw tokens per epoch.
    pub tokens: Option<u64>,
}

impl ExpectedTotals {
    /// Only the walk count is known.
    pub fn examples(examples: u64) -> Self {
        Self {
            examples: Some(examples),
            tokens: None,
        }
    }

    /// Only the token count is known.
    pub fn tokens(tokens: u64) -> Self {
        Self {
            examples: None,
            tokens: Some(tokens),
        }
    }

    /// Both totals of an in-memory corpus.
    pub fn of_walks<T>(walks: &[Vec<T>]) -> Self {
        Self {
            examples: Some(walks.len() as u64),
            tokens: Some(walks.iter().map(|w| w.len() as u64).sum()),
        }
    }

    /// True if neither total was supplied.
    pub fn is_empty(&self) -> bool {
        self.examples.is_none() && self.tokens.is_none()
    }

    /// Totals over `epochs` passes.
    pub fn scaled(&self, epochs: usize) -> Self {
        let e = epochs as u64;
        Self {
            examples: self.examples.map(|x| x * e),
            tokens: self.tokens.map(|x| x * e),
        }
    }

    /// Fraction done after `examples` walks holding `tokens` raw tokens.
    pub fn progress(&self, examples: u64, tokens: u64) -> f64 {
        let (done, total) = match (self.examples, self.tokens) {
            (Some(total), _) => (examples, total),
            (None, Some(total)) => (tokens, total),
            (None, None) => return 0.0,
        };
        if total == 0 {
            1.0
        } else {
            done as f64 / total as f64
        }
    }
}
