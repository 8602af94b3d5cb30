//! Sweep metrics and logging setup.
//!
//! Counters are atomics so worker threads can record runs without locking.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};
use tracing_subscriber::EnvFilter;

/// Counter values at one point in time, or the change between two points.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SweepStats {
    pub runs_completed: u64,
    pub runs_failed: u64,
    pub cell_updates: u64,
}

impl SweepStats {
    /// Counts recorded after `earlier` was taken.
    #[must_use]
    pub fn since(&self, earlier: &SweepStats) -> SweepStats {
        SweepStats {
            runs_completed: self.runs_completed.saturating_sub(earlier.runs_completed),
            runs_failed: self.runs_failed.saturating_sub(earlier.runs_failed),
            cell_updates: self.cell_updates.saturating_sub(earlier.cell_updates),
        }
    }
}

/// Collector shared by every worker of a coordinator.
///
/// Counters are cumulative over the collector's lifetime; take a
/// [`SweepStats`] snapshot to measure a single sweep.
pub struct SweepMetrics {
    runs_completed: AtomicU64,
    runs_failed: AtomicU64,
    cell_updates: AtomicU64,
    busy_micros: AtomicU64,
    start_time: Instant,
}

impl Default for SweepMetrics {
    fn default() -> Self {
        Self::new()
    }
}

impl SweepMetrics {
    #[must_use]
    pub fn new() -> Self {
        Self {
            runs_completed: AtomicU64::new(0),
            runs_failed: AtomicU64::new(0),
            cell_updates: AtomicU64::new(0),
            busy_micros: AtomicU64::new(0),
            start_time: Instant::now(),
        }
    }

    /// Records a finished run of `cell_updates` cell evaluations.
    pub fn record_run(&self, index: usize, lambda: f64, cell_updates: usize, duration: Duration) {
        self.runs_completed.fetch_add(1, Ordering::Relaxed);
        self.cell_updates
            .fetch_add(cell_updates as u64, Ordering::Relaxed);
        self.busy_micros
            .fetch_add(duration.as_micros() as u64, Ordering::Relaxed);

        tracing::debug!(
            index = index,
            lambda = lambda,
            cell_updates = cell_updates,
            duration_ms = duration.as_millis() as u64,
            "Run completed"
        );
    }

    /// Records a run that did not produce a result.
    pub fn record_failure(&self, index: usize, lambda: f64, reason: &str) {
        self.runs_failed.fetch_add(1, Ordering::Relaxed);
        tracing::warn!(index = index, lambda = lambda, reason = reason, "Run failed");
    }

    #[must_use]
    pub fn snapshot(&self) -> SweepStats {
        SweepStats {
            runs_completed: self.runs_completed(),
            runs_failed: self.runs_failed(),
            cell_updates: self.cell_updates(),
        }
    }

    /// Logs the counts of one sweep that took `elapsed`.
    pub fn log_sweep(&self, rule: u8, stats: &SweepStats, skipped: usize, elapsed: Duration) {
        let seconds = elapsed.as_secs_f64();
        let throughput = if seconds > 0.0 {
            stats.cell_updates as f64 / seconds
        } else {
            0.0
        };
        tracing::info!(
            rule = rule,
            completed = stats.runs_completed,
            failed = stats.runs_failed,
            skipped = skipped,
            cell_updates = stats.cell_updates,
            elapsed_ms = elapsed.as_millis() as u64,
            cells_per_sec = throughput as u64,
            "Sweep finished"
        );
    }

    #[must_use]
    pub fn runs_completed(&self) -> u64 {
        self.runs_completed.load(Ordering::Relaxed)
    }

    #[must_use]
    pub fn runs_failed(&self) -> u64 {
        self.runs_failed.load(Ordering::Relaxed)
    }

    #[must_use]
    pub fn cell_updates(&self) -> u64 {
        self.cell_updates.load(Ordering::Relaxed)
    }

    /// Summed wall time spent inside runs across all workers.
    #[must_use]
    pub fn busy_time(&self) -> Duration {
        Duration::from_micros(self.busy_micros.load(Ordering::Relaxed))
    }

    /// Time since the collector was created.
    #[must_use]
    pub fn elapsed(&self) -> Duration {
        self.start_time.elapsed()
    }
}

/// Installs a global fmt subscriber. `RUST_LOG` overrides `default_level`.
///
/// Calling this twice is harmless; the second install is ignored.
pub fn init_logging(default_level: &str) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing::subscriber::set_global_default(
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(false)
            .finish(),
    )
    .ok();
}
