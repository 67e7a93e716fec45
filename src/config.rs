//! Training, detection, and walk configuration.
//!
//! Every config derives `serde` so a run can be described by a JSON document,
//! and carries `with_*` builders for programmatic use. Missing JSON fields fall
//! back to [`Default`].

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Hyperparameters for both skip-gram passes and the job scheduler.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrainingConfig {
    /// Node embedding width (D).
    pub node_dim: usize,
    /// Community embedding width (D_c).
    pub community_dim: usize,
    /// Context radius on each side of a position.
    pub window: usize,
    /// Noise labels drawn per positive target.
    pub negative: usize,
    /// Worker thread count.
    pub workers: usize,
    /// Upper bound on raw tokens per job.
    pub batch_words: usize,
    /// Learning rate of the first job.
    pub start_rate: f32,
    /// Floor of the linear decay.
    pub end_rate: f32,
    /// Passes over the corpus.
    pub epochs: usize,
    /// Job queue capacity is `queue_factor * workers`.
    pub queue_factor: usize,
    /// Seconds between progress log lines.
    pub report_delay_secs: f64,
    /// Seed for embedding initialization and worker RNGs.
    pub seed: u64,
    /// Also train community input vectors (community predicts context node).
    pub train_community_input: bool,
}

impl Default for TrainingConfig {
    fn default() -> Self {
        Self {
            node_dim: 128,
            community_dim: 128,
            window: 10,
            negative: 5,
            workers: 3,
            batch_words: 10_000,
            start_rate: 0.025,
            end_rate: 0.0001,
            epochs: 1,
            queue_factor: 2,
            report_delay_secs: 1.0,
            seed: 1,
            train_community_input: true,
        }
    }
}

impl TrainingConfig {
    /// Create a config with default settings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a JSON document; absent fields keep their defaults.
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Set both embedding widths.
    pub fn with_dims(mut self, node_dim: usize, community_dim: usize) -> Self {
        self.node_dim = node_dim;
        self.community_dim = community_dim;
        self
    }

    /// Set context window radius.
    pub fn with_window(mut self, window: usize) -> Self {
        self.window = window;
        self
    }

    /// Set negative sample count.
    pub fn with_negative(mut self, negative: usize) -> Self {
        self.negative = negative;
        self
    }

    /// Set worker thread count.
    pub fn with_workers(mut self, workers: usize) -> Self {
        self.workers = workers;
        self
    }

    /// Set the per-job token budget.
    pub fn with_batch_words(mut self, batch_words: usize) -> Self {
        self.batch_words = batch_words;
        self
    }

    /// Set start and end learning rates.
    pub fn with_rates(mut self, start_rate: f32, end_rate: f32) -> Self {
        self.start_rate = start_rate;
        self.end_rate = end_rate;
        self
    }

    /// Set number of passes over the corpus.
    pub fn with_epochs(mut self, epochs: usize) -> Self {
        self.epochs = epochs;
        self
    }

    /// Set random seed.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Toggle the mirrored community-input objective.
    pub fn with_community_input_training(mut self, enabled: bool) -> Self {
        self.train_community_input = enabled;
        self
    }

    /// Capacity of the job queue.
    pub fn job_queue_capacity(&self) -> usize {
        self.queue_factor * self.workers
    }

    /// Capacity of the progress queue.
    pub fn progress_queue_capacity(&self) -> usize {
        (self.queue_factor + 1) * self.workers
    }

    /// Check parameter ranges.
    pub fn validate(&self) -> Result<()> {
        if self.node_dim == 0 {
            return Err(Error::InvalidParameter {
                name: "node_dim",
                message: "must be > 0",
            });
        }
        if self.community_dim == 0 {
            return Err(Error::InvalidParameter {
                name: "community_dim",
                message: "must be > 0",
            });
        }
        if self.workers == 0 {
            return Err(Error::InvalidParameter {
                name: "workers",
                message: "must be > 0",
            });
        }
        if self.queue_factor == 0 {
            return Err(Error::InvalidParameter {
                name: "queue_factor",
                message: "must be > 0",
            });
        }
        if self.batch_words == 0 {
            return Err(Error::InvalidParameter {
                name: "batch_words",
                message: "must be > 0",
            });
        }
        if self.epochs == 0 {
            return Err(Error::InvalidParameter {
                name: "epochs",
                message: "must be > 0",
            });
        }
        if !(self.end_rate >= 0.0 && self.start_rate >= self.end_rate) {
            return Err(Error::InvalidParameter {
                name: "start_rate",
                message: "rates must satisfy start_rate >= end_rate >= 0",
            });
        }
        self.report_delay()?;
        Ok(())
    }

    /// Interval between progress log lines.
    ///
    /// Fails for negative, non-finite, or out-of-range values.
    pub fn report_delay(&self) -> Result<Duration> {
        Duration::try_from_secs_f64(self.report_delay_secs).map_err(|_| Error::InvalidParameter {
            name: "report_delay_secs",
            message: "must be a finite, non-negative number of seconds",
        })
    }
}

/// How `phi` is normalized after membership is complete.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PhiNormalization {
    /// Leave raw membership weights.
    None,
    /// Each node column sums to 1.
    #[default]
    PerNode,
    /// Each community row sums to 1.
    PerCommunity,
}

/// Parameters shared by every detection strategy.
///
/// Method-specific knobs (resolution, iteration caps) live on the strategy
/// values themselves.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DetectionParams {
    /// Seed for the labeling policy and the random fallback.
    pub seed: u64,
    /// Normalization applied to `phi`.
    pub normalization: PhiNormalization,
}

impl Default for DetectionParams {
    fn default() -> Self {
        Self {
            seed: 42,
            normalization: PhiNormalization::PerNode,
        }
    }
}

impl DetectionParams {
    /// Set random seed.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Set phi normalization.
    pub fn with_normalization(mut self, normalization: PhiNormalization) -> Self {
        self.normalization = normalization;
        self
    }
}

/// How each walk chooses its next node.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "method")]
pub enum WalkStrategy {
    /// Uniform neighbor steps, jumping back to the start node with
    /// probability `restart` at each step.
    #[serde(rename = "deepwalk")]
    DeepWalk {
        /// Restart probability in `[0, 1]`.
        restart: f64,
    },
    /// Second-order biased steps (node2vec).
    ///
    /// Relative to the node just left, stepping back has weight `1 / p`,
    /// stepping to one of its neighbors has weight 1, and stepping further
    /// away has weight `1 / q`.
    #[serde(rename = "node2vec")]
    Node2Vec {
        /// Return parameter. Below 1 favors backtracking.
        p: f64,
        /// In-out parameter. Above 1 keeps walks local.
        q: f64,
    },
}

impl Default for WalkStrategy {
    fn default() -> Self {
        WalkStrategy::DeepWalk { restart: 0.0 }
    }
}

impl WalkStrategy {
    /// Default-configured strategy by name: `deepwalk` or `node2vec`.
    pub fn from_name(name: &str) -> Result<Self> {
        match name {
            "deepwalk" => Ok(WalkStrategy::DeepWalk { restart: 0.0 }),
            "node2vec" => Ok(WalkStrategy::Node2Vec { p: 1.0, q: 1.0 }),
            other => Err(Error::UnknownMethod(other.to_string())),
        }
    }

    /// Strategy name, for logs.
    pub fn name(&self) -> &'static str {
        match self {
            WalkStrategy::DeepWalk { .. } => "deepwalk",
            WalkStrategy::Node2Vec { .. } => "node2vec",
        }
    }
}

/// Random walk corpus settings.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WalkConfig {
    /// Walks started from every node.
    pub num_walks: usize,
    /// Length of each walk.
    pub walk_length: usize,
    /// Step rule.
    pub strategy: WalkStrategy,
    /// Random seed.
    pub seed: u64,
}

impl Default for WalkConfig {
    fn default() -> Self {
        Self {
            num_walks: 10,
            walk_length: 80,
            strategy: WalkStrategy::default(),
            seed: 42,
        }
    }
}

impl WalkConfig {
    /// Set walks per node.
    pub fn with_num_walks(mut self, num_walks: usize) -> Self {
        self.num_walks = num_walks;
        self
    }

    /// Set walk length.
    pub fn with_walk_length(mut self, walk_length: usize) -> Self {
        self.walk_length = walk_length;
        self
    }

    /// Set the step rule.
    pub fn with_strategy(mut self, strategy: WalkStrategy) -> Self {
        self.strategy = strategy;
        self
    }

    /// DeepWalk with the given restart probability.
    pub fn with_restart(self, restart: f64) -> Self {
        self.with_strategy(WalkStrategy::DeepWalk { restart })
    }

    /// node2vec with return parameter `p` and in-out parameter `q`.
    pub fn with_node2vec(self, p: f64, q: f64) -> Self {
        self.with_strategy(WalkStrategy::Node2Vec { p, q })
    }

    /// Set random seed.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Check lengths and strategy parameters.
    pub fn validate(&self) -> Result<()> {
        if self.walk_length == 0 {
            return Err(Error::InvalidParameter {
                name: "walk_length",
                message: "must be > 0",
            });
        }
        match self.strategy {
            WalkStrategy::DeepWalk { restart } if !(0.0..=1.0).contains(&restart) => {
                Err(Error::InvalidParameter {
                    name: "restart",
                    message: "must be in [0, 1]",
                })
            }
            WalkStrategy::Node2Vec { p, .. } if !(p.is_finite() && p > 0.0) => {
                Err(Error::InvalidParameter {
                    name: "p",
                    message: "must be finite and > 0",
                })
            }
            WalkStrategy::Node2Vec { q, .. } if !(q.is_finite() && q > 0.0) => {
                Err(Error::InvalidParameter {
                    name: "q",
                    message: "must be finite and > 0",
                })
            }
            _ => Ok(()),
        }
    }
}

/// Settings for [`fit`](crate::pipeline::fit).
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Walk length to equalize to. `None` uses the longest walk.
    pub walk_length: Option<usize>,
    /// Community detection parameters.
    pub detection: DetectionParams,
    /// Trainer hyperparameters.
    pub training: TrainingConfig,
}

impl PipelineConfig {
    /// Create a config with default settings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a JSON document; absent fields keep their defaults.
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.training.validate()?;
        Ok(config)
    }

    /// Set the equalized walk length.
    pub fn with_walk_length(mut self, walk_length: usize) -> Self {
        self.walk_length = Some(walk_length);
        self
    }

    /// Set detection parameters.
    pub fn with_detection(mut self, detection: DetectionParams) -> Self {
        self.detection = detection;
        self
    }

    /// Set trainer hyperparameters.
    pub fn with_training(mut self, training: TrainingConfig) -> Self {
        self.training = training;
        self
    }
}
