use rayon::prelude::*;

use crate::foundation::error::{VoxframeError, VoxframeResult};
use crate::pipeline::progress::{CancellationToken, ProgressReporter};

/// Threading and batching controls for the execution pass.
#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct ExecutionOpts {
    /// Run independent work units on a worker pool when `true`.
    pub parallel: bool,
    /// Optional explicit worker thread count.
    pub threads: Option<usize>,
    /// Scanlines per work unit for scanline-partitioned stages.
    pub rows_per_batch: usize,
}

impl Default for ExecutionOpts {
    fn default() -> Self {
        Self {
            parallel: true,
            threads: None,
            rows_per_batch: 16,
        }
    }
}

impl ExecutionOpts {
    /// Sequential execution on the calling thread.
    pub fn sequential() -> Self {
        Self {
            parallel: false,
            ..Self::default()
        }
    }
}

/// Everything the execution pass needs besides region metadata: the worker pool,
/// cancellation and progress reporting.
#[derive(Debug)]
pub struct ExecutionContext {
    pool: Option<rayon::ThreadPool>,
    rows_per_batch: usize,
    cancel: CancellationToken,
    progress: ProgressReporter,
}

impl ExecutionContext {
    /// Build a context, creating a dedicated pool when `opts.parallel` is set.
    pub fn new(opts: &ExecutionOpts) -> VoxframeResult<Self> {
        let pool = if opts.parallel {
            Some(build_thread_pool(opts.threads)?)
        } else {
            None
        };
        Ok(Self {
            pool,
            rows_per_batch: opts.rows_per_batch.max(1),
            ..Self::sequential()
        })
    }

    /// Context running every unit on the calling thread.
    pub fn sequential() -> Self {
        Self {
            pool: None,
            rows_per_batch: ExecutionOpts::default().rows_per_batch,
            cancel: CancellationToken::new(),
            progress: ProgressReporter::new(),
        }
    }

    /// Replace the progress reporter.
    pub fn with_progress(mut self, progress: ProgressReporter) -> Self {
        self.progress = progress;
        self
    }

    /// Replace the cancellation token, e.g. with one shared with another thread.
    pub fn with_cancellation(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }

    /// Scanlines per work unit.
    pub fn rows_per_batch(&self) -> usize {
        self.rows_per_batch
    }

    /// Cancellation token checked between units.
    pub fn cancellation(&self) -> &CancellationToken {
        &self.cancel
    }

    /// Progress reporter shared by workers.
    pub fn progress(&self) -> &ProgressReporter {
        &self.progress
    }

    /// Worker threads available to a run.
    pub fn worker_threads(&self) -> usize {
        self.pool.as_ref().map_or(1, |p| p.current_num_threads())
    }

    /// Run `work` over every unit and wait for all of them.
    ///
    /// Units are independent; completion order is unspecified. Every unit runs (or observes
    /// cancellation) before the first error, in unit order, is returned.
    pub fn run_units<T, F>(&self, units: Vec<T>, work: F) -> VoxframeResult<()>
    where
        T: Send,
        F: Fn(T) -> VoxframeResult<()> + Send + Sync,
    {
        let run_one = |unit: T| -> VoxframeResult<()> {
            if self.cancel.is_cancelled() {
                return Err(VoxframeError::Cancelled);
            }
            work(unit)
        };

        let results: Vec<VoxframeResult<()>> = match &self.pool {
            Some(pool) => pool.install(|| units.into_par_iter().map(run_one).collect()),
            None => units.into_iter().map(run_one).collect(),
        };
        results.into_iter().collect()
    }
}

fn build_thread_pool(threads: Option<usize>) -> VoxframeResult<rayon::ThreadPool> {
    if let Some(n) = threads
        && n == 0
    {
        return Err(VoxframeError::validation(
            "execution 'threads' must be >= 1 when set",
        ));
    }

    let mut builder = rayon::ThreadPoolBuilder::new().thread_name(|i| format!("voxframe-{i}"));
    if let Some(n) = threads {
        builder = builder.num_threads(n);
    }
    builder
        .build()
        .map_err(|e| VoxframeError::validation(format!("failed to build rayon thread pool: {e}")))
}

#[cfg(test)]
#[path = "../../tests/unit/pipeline/context.rs"]
mod tests;
