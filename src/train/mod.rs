//! Concurrent skip-gram training.
//!
//! One producer, `workers` worker threads, and the calling thread as progress
//! coordinator, connected by two bounded channels:
//!
//! ```text
//!             jobs (queue_factor × workers)            progress ((queue_factor + 1) × workers)
//! producer ──────────────────────────────▶ workers ─────────────────────────────────────▶ coordinator
//!   walks → jobs of ≤ batch_words tokens     SGD on shared rows                          totals, logging
//! ```
//!
//! The producer tags every job with the learning rate current at the time it
//! is queued, then decays the rate by how much of the expected corpus has been
//! queued. After the last job it sends exactly one stop message per worker.
//!
//! Two passes share this machinery:
//!
//! - [`Trainer::train_nodes`]: plain skip-gram on node walks.
//! - [`Trainer::train_communities`]: a context node predicts the community
//!   of the center position, and (optionally) the center community predicts
//!   the context node.
//!
//! Workers write straight into the [`EmbeddingStore`] without locking whole
//! matrices. Concurrent updates to the same row may interleave.

mod schedule;
mod sgns;

pub use schedule::{ExpectedTotals, LearningRateSchedule};
pub use sgns::{sigmoid, NoiseTable, MAX_EXP, NOISE_POWER};

use crate::config::TrainingConfig;
use crate::corpus::AlignedCorpus;
use crate::embedding::EmbeddingStore;
use crate::error::{Error, Result};
use crate::graph::NodeId;
use crate::vocab::Vocabulary;
use crossbeam::channel::{bounded, Receiver, Sender};
use rand::prelude::*;
use sgns::{CommunityObjective, NodeObjective, Objective, Scratch};
use std::time::{Duration, Instant};
use tracing::{debug, info, trace, warn};

/// Lifecycle of one training run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchedulerState {
    /// Preconditions checked, no thread started.
    NotStarted,
    /// Producer and workers running.
    Running,
    /// At least one worker has shut down.
    Draining,
    /// All workers finished.
    Complete,
}

/// Lifecycle of one worker thread.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkerState {
    /// Blocked on the job queue.
    WaitingForJob,
    /// Training a job.
    ProcessingJob,
    /// Received a stop message or lost the producer.
    ShuttingDown,
}

/// Reported totals that differ from the expected ones.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProgressMismatch {
    /// Expected walks over all epochs.
    pub expected_examples: Option<u64>,
    /// Walks actually trained.
    pub examples: u64,
    /// Expected raw tokens over all epochs.
    pub expected_tokens: Option<u64>,
    /// Raw tokens actually trained.
    pub raw_tokens: u64,
}

/// Summary of one training pass.
#[derive(Debug, Clone, PartialEq)]
pub struct TrainingReport {
    /// Final scheduler state.
    pub state: SchedulerState,
    /// Jobs queued by the producer.
    pub jobs: u64,
    /// Walks trained.
    pub examples: u64,
    /// Tokens that mapped to a vocabulary row (and a valid community).
    pub effective_tokens: u64,
    /// All tokens seen, including dropped ones.
    pub raw_tokens: u64,
    /// Rate the next job would have received.
    pub final_rate: f32,
    /// Wall time.
    pub elapsed: Duration,
    /// Set when the reported totals disagree with the expected ones.
    pub mismatch: Option<ProgressMismatch>,
}

impl TrainingReport {
    /// Effective tokens per second of wall time.
    pub fn tokens_per_sec(&self) -> f64 {
        let secs = self.elapsed.as_secs_f64();
        if secs > 0.0 {
            self.effective_tokens as f64 / secs
        } else {
            0.0
        }
    }
}

/// A walk after id → index mapping.
struct Encoded<T> {
    tokens: Vec<T>,
    raw: u64,
}

struct Job<T> {
    walks: Vec<Vec<T>>,
    effective: u64,
    raw: u64,
}

impl<T> Default for Job<T> {
    fn default() -> Self {
        Self {
            walks: Vec::new(),
            effective: 0,
            raw: 0,
        }
    }
}

impl<T> Job<T> {
    fn push(&mut self, walk: Encoded<T>) {
        self.effective += walk.tokens.len() as u64;
        self.raw += walk.raw;
        self.walks.push(walk.tokens);
    }
}

enum Message<T> {
    Job(Job<T>, f32),
    Stop,
}

enum Report {
    Progress { examples: u64, effective: u64, raw: u64 },
    Finished { worker: usize },
}

/// Runs the skip-gram passes over a shared [`EmbeddingStore`].
#[derive(Debug)]
pub struct Trainer<'a, N: NodeId> {
    vocab: &'a Vocabulary<N>,
    store: &'a EmbeddingStore,
    config: TrainingConfig,
}

impl<'a, N: NodeId> Trainer<'a, N> {
    /// Create a trainer. Nothing is checked until a pass starts.
    pub fn new(vocab: &'a Vocabulary<N>, store: &'a EmbeddingStore, config: TrainingConfig) -> Self {
        Self {
            vocab,
            store,
            config,
        }
    }

    /// Configuration in use.
    pub fn config(&self) -> &TrainingConfig {
        &self.config
    }

    /// Skip-gram over node walks, updating node input and output rows.
    ///
    /// Ids missing from the vocabulary are skipped but still count as raw
    /// tokens. `totals` describes one epoch.
    pub fn train_nodes(&self, walks: &[Vec<N>], totals: ExpectedTotals) -> Result<TrainingReport> {
        self.check_common(totals)?;

        let vocab = self.vocab;
        let objective = NodeObjective {
            store: self.store,
            noise: NoiseTable::new(&vocab.counts()),
            window: self.config.window,
            negative: self.config.negative,
        };
        let source = || {
            walks.iter().map(move |walk| Encoded {
                tokens: walk.iter().filter_map(|id| vocab.index_of(id)).collect(),
                raw: walk.len() as u64,
            })
        };
        self.run("nodes", &objective, totals, source)
    }

    /// Community-aware skip-gram over an aligned corpus.
    ///
    /// Positions whose node is missing from the vocabulary, or whose label is
    /// not below the community count, are skipped but still count as raw
    /// tokens. `totals` describes one epoch.
    pub fn train_communities(
        &self,
        corpus: &AlignedCorpus<'_, N>,
        totals: ExpectedTotals,
    ) -> Result<TrainingReport> {
        self.check_common(totals)?;
        let k = self.store.community_count();
        if k == 0 {
            return Err(Error::precondition("community output matrix has no rows"));
        }
        if self.store.node_dim() != self.store.community_dim() {
            return Err(Error::precondition(format!(
                "community pass needs equal widths, got node_dim {} and community_dim {}",
                self.store.node_dim(),
                self.store.community_dim()
            )));
        }

        let mut label_counts = vec![0u64; k];
        for &c in corpus.community_walks().iter().flatten() {
            if let Some(slot) = label_counts.get_mut(c) {
                *slot += 1;
            }
        }

        let vocab = self.vocab;
        let objective = CommunityObjective {
            store: self.store,
            community_noise: NoiseTable::new(&label_counts),
            node_noise: self
                .config
                .train_community_input
                .then(|| NoiseTable::new(&vocab.counts())),
            window: self.config.window,
            negative: self.config.negative,
        };
        let source = || {
            corpus.iter().map(move |pairs| Encoded {
                raw: pairs.len() as u64,
                tokens: pairs
                    .into_iter()
                    .filter_map(|(id, c)| {
                        let node = vocab.index_of(id)?;
                        (c < k).then_some((node, c as u32))
                    })
                    .collect(),
            })
        };
        self.run("communities", &objective, totals, source)
    }

    fn check_common(&self, totals: ExpectedTotals) -> Result<()> {
        self.config.validate()?;
        if self.vocab.is_empty() {
            return Err(Error::precondition("vocabulary is empty"));
        }
        if self.vocab.len() != self.store.node_count() {
            return Err(Error::precondition(format!(
                "vocabulary has {} nodes but the store has {} node rows",
                self.vocab.len(),
                self.store.node_count()
            )));
        }
        if totals.is_empty() {
            return Err(Error::precondition(
                "expected totals need an example count or a token count",
            ));
        }
        Ok(())
    }

    fn run<O, S, I>(
        &self,
        pass: &'static str,
        objective: &O,
        totals: ExpectedTotals,
        source: S,
    ) -> Result<TrainingReport>
    where
        O: Objective,
        S: Fn() -> I + Sync,
        I: Iterator<Item = Encoded<O::Token>>,
    {
        let config = &self.config;
        let workers = config.workers;
        let expected = totals.scaled(config.epochs);
        let schedule = LearningRateSchedule::new(config.start_rate, config.end_rate);
        let report_delay = config.report_delay()?;

        let (job_tx, job_rx) = bounded::<Message<O::Token>>(config.job_queue_capacity());
        let (progress_tx, progress_rx) = bounded::<Report>(config.progress_queue_capacity());

        info!(
            pass,
            workers,
            window = config.window,
            negative = config.negative,
            epochs = config.epochs,
            rate = config.start_rate,
            "training started"
        );

        let started = Instant::now();
        let mut state = SchedulerState::NotStarted;
        let mut tally = Tally::default();

        let produced = std::thread::scope(|s| {
            let source = &source;
            let producer = s.spawn(move || {
                let mut producer = Producer::new(job_tx, schedule, expected, config.batch_words);
                'epochs: for epoch in 0..config.epochs {
                    for walk in source() {
                        if !producer.push(walk) {
                            break 'epochs;
                        }
                    }
                    if !producer.flush() {
                        break;
                    }
                    debug!(pass, epoch, queued = producer.queued, "epoch queued");
                }
                producer.finish(workers)
            });

            for worker in 0..workers {
                let jobs = job_rx.clone();
                let progress = progress_tx.clone();
                let seed = config.seed;
                s.spawn(move || work(worker, objective, seed, jobs, progress));
            }
            drop(job_rx);
            drop(progress_tx);
            transition(&mut state, SchedulerState::Running);

            let mut finished = 0;
            let mut last_log = Instant::now();
            while finished < workers {
                let Ok(report) = progress_rx.recv() else {
                    break;
                };
                match report {
                    Report::Progress {
                        examples,
                        effective,
                        raw,
                    } => {
                        tally.examples += examples;
                        tally.effective += effective;
                        tally.raw += raw;
                        if last_log.elapsed() >= report_delay {
                            let elapsed = started.elapsed().as_secs_f64().max(f64::EPSILON);
                            info!(
                                pass,
                                percent = 100.0 * expected.progress(tally.examples, tally.raw),
                                examples = tally.examples,
                                tokens_per_sec = (tally.effective as f64 / elapsed) as u64,
                                "training progress"
                            );
                            last_log = Instant::now();
                        }
                    }
                    Report::Finished { worker } => {
                        if finished == 0 {
                            transition(&mut state, SchedulerState::Draining);
                        }
                        finished += 1;
                        debug!(pass, worker, finished, "worker finished");
                    }
                }
            }

            producer
                .join()
                .unwrap_or_else(|panic| std::panic::resume_unwind(panic))
        });
        transition(&mut state, SchedulerState::Complete);

        let elapsed = started.elapsed();
        if produced.jobs == 0 {
            warn!(pass, "training on an empty corpus");
        } else if produced.jobs < 10 * workers as u64 {
            warn!(
                pass,
                jobs = produced.jobs,
                workers,
                "under 10 jobs per worker: consider a smaller batch_words"
            );
        }

        let mismatch = tally.mismatch(&expected);
        if let Some(m) = &mismatch {
            warn!(
                pass,
                examples = m.examples,
                expected_examples = ?m.expected_examples,
                raw_tokens = m.raw_tokens,
                expected_tokens = ?m.expected_tokens,
                "trained totals differ from the expected totals"
            );
        }

        let report = TrainingReport {
            state,
            jobs: produced.jobs,
            examples: tally.examples,
            effective_tokens: tally.effective,
            raw_tokens: tally.raw,
            final_rate: produced.final_rate,
            elapsed,
            mismatch,
        };
        info!(
            pass,
            examples = report.examples,
            effective_tokens = report.effective_tokens,
            raw_tokens = report.raw_tokens,
            secs = elapsed.as_secs_f64(),
            tokens_per_sec = report.tokens_per_sec() as u64,
            "training finished"
        );
        Ok(report)
    }
}

fn transition(state: &mut SchedulerState, next: SchedulerState) {
    trace!(from = ?*state, to = ?next, "scheduler state");
    *state = next;
}

#[derive(Debug, Default)]
struct Tally {
    examples: u64,
    effective: u64,
    raw: u64,
}

impl Tally {
    fn mismatch(&self, expected: &ExpectedTotals) -> Option<ProgressMismatch> {
        let examples_off = expected.examples.is_some_and(|e| e != self.examples);
        let tokens_off = expected.tokens.is_some_and(|t| t != self.raw);
        (examples_off || tokens_off).then(|| ProgressMismatch {
            expected_examples: expected.examples,
            examples: self.examples,
            expected_tokens: expected.tokens,
            raw_tokens: self.raw,
        })
    }
}

struct Produced {
    jobs: u64,
    final_rate: f32,
}

/// Batches walks into jobs and keeps the rate schedule.
struct Producer<T> {
    jobs: Sender<Message<T>>,
    schedule: LearningRateSchedule,
    expected: ExpectedTotals,
    batch_words: u64,
    rate: f32,
    pushed_examples: u64,
    pushed_tokens: u64,
    queued: u64,
    pending: Job<T>,
}

impl<T> Producer<T> {
    fn new(
        jobs: Sender<Message<T>>,
        schedule: LearningRateSchedule,
        expected: ExpectedTotals,
        batch_words: usize,
    ) -> Self {
        Self {
            jobs,
            schedule,
            expected,
            batch_words: batch_words as u64,
            rate: schedule.start(),
            pushed_examples: 0,
            pushed_tokens: 0,
            queued: 0,
            pending: Job::default(),
        }
    }

    /// Add a walk, queueing the pending job first if the walk does not fit.
    /// Returns false once the workers are gone.
    fn push(&mut self, walk: Encoded<T>) -> bool {
        if !self.pending.walks.is_empty() && self.pending.raw + walk.raw > self.batch_words {
            if !self.flush() {
                return false;
            }
        }
        self.pending.push(walk);
        true
    }

    /// Queue the pending job, if any, and advance the rate.
    fn flush(&mut self) -> bool {
        if self.pending.walks.is_empty() {
            return true;
        }
        let job = std::mem::take(&mut self.pending);
        let examples = job.walks.len() as u64;
        let raw = job.raw;
        if self.jobs.send(Message::Job(job, self.rate)).is_err() {
            return false;
        }

        self.queued += 1;
        self.pushed_examples += examples;
        self.pushed_tokens += raw;
        let progress = self.expected.progress(self.pushed_examples, self.pushed_tokens);
        self.rate = self.schedule.rate_at(progress);
        debug!(
            job = self.queued,
            examples,
            raw,
            progress,
            next_rate = self.rate,
            "job queued"
        );
        true
    }

    /// Queue what is left and stop every worker.
    fn finish(mut self, workers: usize) -> Produced {
        self.flush();
        for _ in 0..workers {
            if self.jobs.send(Message::Stop).is_err() {
                break;
            }
        }
        Produced {
            jobs: self.queued,
            final_rate: self.rate,
        }
    }
}

fn work<O: Objective>(
    worker: usize,
    objective: &O,
    seed: u64,
    jobs: Receiver<Message<O::Token>>,
    progress: Sender<Report>,
) {
    let mut rng = StdRng::seed_from_u64(seed ^ worker as u64);
    let mut scratch = Scratch::new(objective.dim());
    let mut state = WorkerState::WaitingForJob;

    while let Ok(message) = jobs.recv() {
        match message {
            Message::Stop => {
                set_worker_state(worker, &mut state, WorkerState::ShuttingDown);
                let _ = progress.send(Report::Finished { worker });
                break;
            }
            Message::Job(job, alpha) => {
                set_worker_state(worker, &mut state, WorkerState::ProcessingJob);
                for walk in &job.walks {
                    objective.train_walk(walk, alpha, &mut rng, &mut scratch);
                }
                let report = Report::Progress {
                    examples: job.walks.len() as u64,
                    effective: job.effective,
                    raw: job.raw,
                };
                if progress.send(report).is_err() {
                    break;
                }
                set_worker_state(worker, &mut state, WorkerState::WaitingForJob);
            }
        }
    }
    debug!(worker, "worker exited");
}

fn set_worker_state(worker: usize, state: &mut WorkerState, next: WorkerState) {
    trace!(worker, from = ?*state, to = ?next, "worker state");
    *state = next;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::corpus::align;
    use crate::embedding::allocate_embeddings;
    use crate::vocab::build_vocabulary;

    fn encoded(len: usize) -> Encoded<u32> {
        Encoded {
            tokens: (0..len as u32).collect(),
            raw: len as u64,
        }
    }

    fn drain(rx: &Receiver<Message<u32>>) -> (Vec<(Vec<usize>, f32)>, usize) {
        let mut jobs = Vec::new();
        let mut stops = 0;
        while let Ok(message) = rx.try_recv() {
            match message {
                Message::Job(job, rate) => jobs.push((job.walks.iter().map(Vec::len).collect(), rate)),
                Message::Stop => stops += 1,
            }
        }
        (jobs, stops)
    }

    #[test]
    fn producer_batches_by_raw_tokens() {
        let (tx, rx) = bounded(64);
        let schedule = LearningRateSchedule::new(0.025, 0.0001);
        let mut producer = Producer::new(tx, schedule, ExpectedTotals::examples(5), 10);
        for len in [4, 4, 4, 25, 3] {
            assert!(producer.push(encoded(len)));
        }
        let produced = producer.finish(3);

        let (jobs, stops) = drain(&rx);
        let shapes: Vec<Vec<usize>> = jobs.iter().map(|j| j.0.clone()).collect();
        // The oversized walk sits alone; no job is empty.
        assert_eq!(shapes, vec![vec![4, 4], vec![4], vec![25], vec![3]]);
        assert_eq!(produced.jobs, 4);
        assert_eq!(stops, 3);
    }

    #[test]
    fn producer_rates_decay_from_start() {
        let (tx, rx) = bounded(64);
        let schedule = LearningRateSchedule::new(0.1, 0.01);
        let mut producer = Producer::new(tx, schedule, ExpectedTotals::tokens(40), 10);
        for _ in 0..4 {
            producer.push(encoded(10));
        }
        let produced = producer.finish(1);

        let (jobs, _) = drain(&rx);
        let rates: Vec<f32> = jobs.iter().map(|j| j.1).collect();
        assert_eq!(rates[0], 0.1);
        assert!(rates.windows(2).all(|w| w[0] > w[1]));
        assert_eq!(produced.final_rate, 0.01);
    }

    #[test]
    fn empty_producer_still_stops_every_worker() {
        let (tx, rx) = bounded(64);
        let producer: Producer<u32> = Producer::new(
            tx,
            LearningRateSchedule::new(0.025, 0.0001),
            ExpectedTotals::examples(0),
            100,
        );
        let produced = producer.finish(4);
        let (jobs, stops) = drain(&rx);
        assert!(jobs.is_empty());
        assert_eq!(stops, 4);
        assert_eq!(produced.jobs, 0);
    }

    fn ring() -> (Vec<Vec<u32>>, Vec<Vec<usize>>) {
        (
            vec![vec![0, 1, 2, 3], vec![1, 2, 3, 0]],
            vec![vec![0, 0, 1, 1], vec![0, 1, 1, 0]],
        )
    }

    fn config() -> TrainingConfig {
        TrainingConfig::new()
            .with_dims(8, 8)
            .with_window(1)
            .with_negative(2)
            .with_workers(2)
            .with_batch_words(4)
    }

    #[test]
    fn community_pass_moves_vectors() -> Result<()> {
        let (nodes, communities) = ring();
        let vocab = build_vocabulary(&nodes)?;
        let store = allocate_embeddings(&vocab, 8, 2, 8, 1)?;
        let before = store.node_input().to_array();

        let corpus = align(&nodes, &communities)?;
        let trainer = Trainer::new(&vocab, &store, config());
        let report = trainer.train_communities(&corpus, ExpectedTotals::of_walks(&nodes))?;

        assert_eq!(report.state, SchedulerState::Complete);
        assert_eq!(report.examples, 2);
        assert_eq!(report.raw_tokens, 8);
        assert_eq!(report.effective_tokens, 8);
        assert_eq!(report.jobs, 2);
        assert!(report.mismatch.is_none());
        assert_ne!(store.node_input().to_array(), before);
        assert!(store.community_output().to_array().iter().any(|&v| v != 0.0));
        Ok(())
    }

    #[test]
    fn out_of_range_labels_are_dropped_but_counted() -> Result<()> {
        let nodes = vec![vec![0u32, 1, 2]];
        let communities = vec![vec![0, 5, 1]];
        let vocab = build_vocabulary(&nodes)?;
        let store = allocate_embeddings(&vocab, 4, 2, 4, 1)?;
        let corpus = align(&nodes, &communities)?;
        let report = Trainer::new(&vocab, &store, config().with_dims(4, 4))
            .train_communities(&corpus, ExpectedTotals::of_walks(&nodes))?;
        assert_eq!(report.raw_tokens, 3);
        assert_eq!(report.effective_tokens, 2);
        Ok(())
    }

    #[test]
    fn node_pass_with_epochs() -> Result<()> {
        let (nodes, _) = ring();
        let vocab = build_vocabulary(&nodes)?;
        let store = allocate_embeddings(&vocab, 8, 2, 8, 1)?;
        let report = Trainer::new(&vocab, &store, config().with_epochs(3))
            .train_nodes(&nodes, ExpectedTotals::of_walks(&nodes))?;
        assert_eq!(report.examples, 6);
        assert_eq!(report.raw_tokens, 24);
        assert!(report.mismatch.is_none());
        assert!(store.node_output().to_array().iter().any(|&v| v != 0.0));
        Ok(())
    }

    #[test]
    fn wrong_totals_are_reported_not_fatal() -> Result<()> {
        let (nodes, _) = ring();
        let vocab = build_vocabulary(&nodes)?;
        let store = allocate_embeddings(&vocab, 8, 2, 8, 1)?;
        let report = Trainer::new(&vocab, &store, config())
            .train_nodes(&nodes, ExpectedTotals::examples(5))?;
        assert_eq!(
            report.mismatch,
            Some(ProgressMismatch {
                expected_examples: Some(5),
                examples: 2,
                expected_tokens: None,
                raw_tokens: 8,
            })
        );
        Ok(())
    }

    #[test]
    fn empty_corpus_terminates() -> Result<()> {
        let (nodes, _) = ring();
        let vocab = build_vocabulary(&nodes)?;
        let store = allocate_embeddings(&vocab, 8, 2, 8, 1)?;
        let empty: Vec<Vec<u32>> = Vec::new();
        let report = Trainer::new(&vocab, &store, config().with_workers(4))
            .train_nodes(&empty, ExpectedTotals::examples(0))?;
        assert_eq!(report.state, SchedulerState::Complete);
        assert_eq!(report.jobs, 0);
        assert_eq!(report.examples, 0);

        let no_labels: Vec<Vec<usize>> = Vec::new();
        let corpus = align(&empty, &no_labels)?;
        let report = Trainer::new(&vocab, &store, config().with_workers(4))
            .train_communities(&corpus, ExpectedTotals::examples(0))?;
        assert_eq!(report.state, SchedulerState::Complete);
        assert_eq!(report.jobs, 0);
        assert_eq!(report.raw_tokens, 0);
        Ok(())
    }

    #[test]
    fn oversized_report_delay_is_an_error() -> Result<()> {
        let (nodes, _) = ring();
        let vocab = build_vocabulary(&nodes)?;
        let store = allocate_embeddings(&vocab, 8, 2, 8, 1)?;
        let mut slow = config();
        slow.report_delay_secs = 1e20;
        let err = Trainer::new(&vocab, &store, slow)
            .train_nodes(&nodes, ExpectedTotals::of_walks(&nodes))
            .unwrap_err();
        assert!(matches!(err, Error::InvalidParameter { name: "report_delay_secs", .. }));
        Ok(())
    }

    #[test]
    fn preconditions_fail_before_training() -> Result<()> {
        let (nodes, communities) = ring();
        let vocab = build_vocabulary(&nodes)?;
        let corpus = align(&nodes, &communities)?;
        let totals = ExpectedTotals::of_walks(&nodes);

        // No totals.
        let store = allocate_embeddings(&vocab, 8, 2, 8, 1)?;
        let err = Trainer::new(&vocab, &store, config())
            .train_nodes(&nodes, ExpectedTotals::default())
            .unwrap_err();
        assert!(matches!(err, Error::Precondition(_)));

        // No community rows.
        let store = allocate_embeddings(&vocab, 8, 0, 8, 1)?;
        let err = Trainer::new(&vocab, &store, config())
            .train_communities(&corpus, totals)
            .unwrap_err();
        assert!(matches!(err, Error::Precondition(_)));

        // Widths differ.
        let store = allocate_embeddings(&vocab, 8, 2, 4, 1)?;
        let err = Trainer::new(&vocab, &store, config())
            .train_communities(&corpus, totals)
            .unwrap_err();
        assert!(matches!(err, Error::Precondition(_)));

        // Store built for a different vocabulary.
        let other = build_vocabulary(&[vec![7u32, 8]])?;
        let store = allocate_embeddings(&other, 8, 2, 8, 1)?;
        let err = Trainer::new(&vocab, &store, config())
            .train_nodes(&nodes, totals)
            .unwrap_err();
        assert!(matches!(err, Error::Precondition(_)));
        Ok(())
    }

    #[test]
    fn mirrored_objective_trains_community_input() -> Result<()> {
        let (nodes, communities) = ring();
        let vocab = build_vocabulary(&nodes)?;
        let corpus = align(&nodes, &communities)?;
        let totals = ExpectedTotals::of_walks(&nodes);

        let on = allocate_embeddings(&vocab, 8, 2, 8, 1)?;
        let before = on.community_input().to_array();
        Trainer::new(&vocab, &on, config()).train_communities(&corpus, totals)?;
        assert_ne!(on.community_input().to_array(), before);

        let off = allocate_embeddings(&vocab, 8, 2, 8, 1)?;
        Trainer::new(&vocab, &off, config().with_community_input_training(false))
            .train_communities(&corpus, totals)?;
        assert_eq!(off.community_input().to_array(), before);
        Ok(())
    }
}
