use crate::error::PlateEvalError;
use crate::synthesis::dataset_writer::{DatasetWriter, PlateSample};
use crossbeam::channel::bounded;
use rand::SeedableRng;
use rand::rngs::StdRng;
use std::path::PathBuf;
use std::thread;
use std::time::{SystemTime, UNIX_EPOCH};
use tracing::{debug, info, warn};

/// Renders synthetic plates. Implementations draw all randomness from the worker's `rng`.
pub trait PlateSampleGenerator: Sync {
    fn generate(&self, rng: &mut StdRng) -> Result<PlateSample, PlateEvalError>;
}

#[derive(Clone, Debug, PartialEq)]
pub struct GenerationConfig {
    pub output_dir: PathBuf,
    pub sample_count: usize,
    pub workers: usize,
    /// Capacity of both the task queue and the result queue.
    pub queue_capacity: usize,
    /// Fixed seed for reproducible runs; worker `i` is seeded with `base_seed + i`.
    pub base_seed: Option<u64>,
}

impl GenerationConfig {
    pub fn new(output_dir: PathBuf, sample_count: usize) -> Self {
        let workers = thread::available_parallelism().map_or(1, |n| n.get());
        GenerationConfig {
            output_dir,
            sample_count,
            workers,
            queue_capacity: 2 * workers,
            base_seed: None,
        }
    }
}

#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct GenerationSummary {
    pub written: usize,
    pub failed: usize,
}

/// Seed of one worker: wall clock milliseconds plus process id plus worker index, modulo 2^32.
pub fn worker_seed(base_seed: Option<u64>, worker_index: usize) -> u64 {
    match base_seed {
        Some(seed) => seed.wrapping_add(worker_index as u64),
        None => {
            let millis = SystemTime::now()
                .duration_since(UNIX_EPOCH)
                .map_or(0, |d| d.as_millis() as u64);
            millis
                .wrapping_add(std::process::id() as u64)
                .wrapping_add(worker_index as u64)
                % (1 << 32)
        }
    }
}

/// Generates `sample_count` samples on a fixed pool of workers and writes them to disk.
///
/// Tasks flow through a bounded queue to the workers, results through a second bounded queue
/// to a single writer. Files are numbered in completion order, so which sample ends up as
/// `00000000` is not deterministic even with a fixed seed. A sample whose generation fails is
/// logged and counted; a failed write stops the run.
pub fn generate_dataset<G: PlateSampleGenerator>(
    generator: &G,
    config: &GenerationConfig,
) -> Result<GenerationSummary, PlateEvalError> {
    if config.workers == 0 {
        return Err(PlateEvalError::invalid_config("at least one worker is required"));
    }
    let mut writer = DatasetWriter::new(&config.output_dir)?;
    let capacity = config.queue_capacity.max(1);
    let (task_tx, task_rx) = bounded::<usize>(capacity);
    let (result_tx, result_rx) = bounded::<(usize, Result<PlateSample, PlateEvalError>)>(capacity);

    let summary = thread::scope(|scope| {
        let sample_count = config.sample_count;
        scope.spawn(move || {
            for task in 0..sample_count {
                if task_tx.send(task).is_err() {
                    break;
                }
            }
        });

        for worker_index in 0..config.workers {
            let task_rx = task_rx.clone();
            let result_tx = result_tx.clone();
            let seed = worker_seed(config.base_seed, worker_index);
            scope.spawn(move || {
                debug!(worker_index, seed, "worker started");
                let mut rng = StdRng::seed_from_u64(seed);
                for task in task_rx {
                    if result_tx.send((task, generator.generate(&mut rng))).is_err() {
                        break;
                    }
                }
            });
        }
        drop(task_rx);
        drop(result_tx);

        let mut summary = GenerationSummary::default();
        for (task, result) in result_rx {
            match result {
                Ok(sample) => {
                    writer.write(&sample)?;
                    summary.written += 1;
                }
                Err(e) => {
                    warn!(task, error = %e, "sample generation failed");
                    summary.failed += 1;
                }
            }
        }
        Ok::<_, PlateEvalError>(summary)
    })?;

    info!(
        written = summary.written,
        failed = summary.failed,
        output_dir = %config.output_dir.display(),
        "dataset generated"
    );
    Ok(summary)
}
