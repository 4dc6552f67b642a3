use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

/// Snapshot handed to progress observers.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Progress {
    /// Completed pixels.
    pub completed: u64,
    /// Pixels the current execution pass will produce.
    pub total: u64,
}

impl Progress {
    /// Completed fraction in `[0, 1]`; an empty pass counts as done.
    pub fn fraction(self) -> f64 {
        if self.total == 0 {
            1.0
        } else {
            (self.completed as f64 / self.total as f64).min(1.0)
        }
    }
}

type Observer = Arc<dyn Fn(Progress) + Send + Sync>;

/// Thread-safe pixel counter shared by execution workers.
///
/// Purely observational: nothing reads it to make decisions.
#[derive(Clone, Default)]
pub struct ProgressReporter {
    total: Arc<AtomicU64>,
    completed: Arc<AtomicU64>,
    observer: Option<Observer>,
}

impl fmt::Debug for ProgressReporter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProgressReporter")
            .field("progress", &self.snapshot())
            .field("observer", &self.observer.is_some())
            .finish()
    }
}

impl ProgressReporter {
    /// Reporter without an observer.
    pub fn new() -> Self {
        Self::default()
    }

    /// Reporter that calls `observer` after every completed unit.
    pub fn with_observer(observer: impl Fn(Progress) + Send + Sync + 'static) -> Self {
        Self {
            observer: Some(Arc::new(observer)),
            ..Self::default()
        }
    }

    /// Start a new pass producing `total` pixels.
    pub fn reset(&self, total: u64) {
        self.total.store(total, Ordering::Relaxed);
        self.completed.store(0, Ordering::Relaxed);
    }

    /// Record `pixels` more completed pixels.
    pub fn completed(&self, pixels: u64) {
        let completed = self.completed.fetch_add(pixels, Ordering::Relaxed) + pixels;
        let snapshot = Progress {
            completed,
            total: self.total.load(Ordering::Relaxed),
        };
        tracing::trace!(completed, total = snapshot.total, "progress");
        if let Some(observer) = &self.observer {
            observer(snapshot);
        }
    }

    /// Current counters.
    pub fn snapshot(&self) -> Progress {
        Progress {
            completed: self.completed.load(Ordering::Relaxed),
            total: self.total.load(Ordering::Relaxed),
        }
    }
}

/// Cooperative cancellation flag checked between work units.
#[derive(Clone, Debug, Default)]
pub struct CancellationToken(Arc<AtomicBool>);

impl CancellationToken {
    /// Fresh, not-cancelled token.
    pub fn new() -> Self {
        Self::default()
    }

    /// Request cancellation. Units already running finish.
    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    /// Clear a previous cancellation so the pipeline can run again.
    pub fn reset(&self) {
        self.0.store(false, Ordering::Relaxed);
    }

    /// Return `true` once cancellation was requested.
    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

#[cfg(test)]
#[path = "../../tests/unit/pipeline/progress.rs"]
mod tests;
