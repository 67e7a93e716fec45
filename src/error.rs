use thiserror::Error;

/// Result alias for `commune`.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors returned by corpus, detection, and training primitives.
#[derive(Debug, Error)]
pub enum Error {
    /// Required configuration or state was missing before training started.
    #[error("precondition failed: {0}")]
    Precondition(String),

    /// No walks (or no tokens) were provided.
    #[error("empty corpus: at least one non-empty walk is required")]
    EmptyCorpus,

    /// A walk had no elements, so it cannot be padded to the walk length.
    #[error("walk {walk} is empty and cannot be equalized")]
    EmptyWalk {
        /// Index of the offending walk.
        walk: usize,
    },

    /// Node and community corpora do not line up.
    ///
    /// `walk` is `None` when the number of walks differs, otherwise the index
    /// of the first walk pair with differing lengths.
    #[error("length mismatch{}: expected {expected}, found {found}", walk_suffix(.walk))]
    LengthMismatch {
        /// Offending walk, if the mismatch is per-walk.
        walk: Option<usize>,
        /// Length on the node side.
        expected: usize,
        /// Length on the community side.
        found: usize,
    },

    /// Matrix rows or ids do not match in count.
    #[error("dimension mismatch: expected {expected}, found {found}")]
    DimensionMismatch {
        /// Expected count.
        expected: usize,
        /// Found count.
        found: usize,
    },

    /// Invalid parameter value.
    #[error("invalid parameter '{name}': {message}")]
    InvalidParameter {
        /// Parameter name.
        name: &'static str,
        /// Error message.
        message: &'static str,
    },

    /// A detection method name did not match any known strategy.
    #[error("unknown community detection method '{0}'")]
    UnknownMethod(String),

    /// A detection strategy could not produce any community at all.
    #[error("community detection failed: {0}")]
    DetectionFailure(String),

    /// Input graph was empty.
    #[error("empty input provided")]
    EmptyInput,

    /// I/O error while reading corpora or writing embeddings.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// Malformed configuration document.
    #[error("config error: {0}")]
    Config(#[from] serde_json::Error),
}

fn walk_suffix(walk: &Option<usize>) -> String {
    match walk {
        Some(w) => format!(" in walk {w}"),
        None => " in walk count".to_string(),
    }
}

impl Error {
    pub(crate) fn precondition(msg: impl Into<String>) -> Self {
        Error::Precondition(msg.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn length_mismatch_display_names_the_walk() {
        let err = Error::LengthMismatch {
            walk: Some(1),
            expected: 4,
            found: 3,
        };
        assert_eq!(
            err.to_string(),
            "length mismatch in walk 1: expected 4, found 3"
        );

        let err = Error::LengthMismatch {
            walk: None,
            expected: 2,
            found: 1,
        };
        assert!(err.to_string().contains("walk count"));
    }
}
