//! Parallel lambda sweeps.
//!
//! One task per lambda is dispatched onto a dedicated rayon pool. Tasks share
//! nothing mutable: each owns a ChaCha8 generator, either derived from the
//! root seed and the task index or drawn from entropy, and all of them read
//! the same `RuleTable` by reference. The indexed parallel collect keeps
//! results in input order whatever order the workers finish in.

use crate::config::{FailurePolicy, PoolConfig};
use crate::error::{Result, SimError};
use crate::metrics::{SweepMetrics, SweepStats};
use crate::rule::{build_rule_table, RuleTable};
use crate::run::{validate_lambda, validate_shape, RunTask, Runner, SimulationRunner};
use diploid_data::{RunResult, SweepHeader, SweepResult};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Instant;

const SEED_MIX: u64 = 0x517C_C1B7_2722_0A95;

/// Seed for the run at `index` of a sweep rooted at `root`.
#[must_use]
pub fn derive_run_seed(root: u64, index: usize) -> u64 {
    let mut seed = root.wrapping_mul(SEED_MIX);
    seed ^= index as u64;
    seed = seed.wrapping_mul(SEED_MIX);
    seed ^ (seed >> 29)
}

/// A run that was dropped from an isolated sweep.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunFailure {
    pub index: usize,
    pub lambda: f64,
    pub reason: String,
}

/// Outcome of [`SweepCoordinator::sweep`].
///
/// Under [`FailurePolicy::Abort`] `failures` is always empty and `result` holds
/// one run per requested lambda. Under [`FailurePolicy::Isolate`] `result` holds
/// the surviving runs, still in input order.
#[derive(Debug, Clone)]
pub struct SweepReport {
    pub result: SweepResult,
    pub failures: Vec<RunFailure>,
    /// Runs recorded by this sweep alone, even when the metrics collector is
    /// shared with earlier sweeps.
    pub stats: SweepStats,
}

impl SweepReport {
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.failures.is_empty()
    }

    /// Lambdas that failed, in input order.
    #[must_use]
    pub fn failed_lambdas(&self) -> Vec<f64> {
        self.failures.iter().map(|f| f.lambda).collect()
    }
}

/// Runs sweeps on its own worker pool.
pub struct SweepCoordinator<R = SimulationRunner> {
    pool: rayon::ThreadPool,
    workers: usize,
    policy: FailurePolicy,
    seed: Option<u64>,
    runner: R,
    metrics: Arc<SweepMetrics>,
}

impl SweepCoordinator<SimulationRunner> {
    /// Builds a coordinator with the standard runner and no root seed.
    pub fn new(pool: &PoolConfig) -> Result<Self> {
        Self::with_runner(pool, SimulationRunner)
    }
}

impl<R: Runner> SweepCoordinator<R> {
    /// Builds a coordinator around a custom runner.
    pub fn with_runner(pool: &PoolConfig, runner: R) -> Result<Self> {
        let workers = pool.resolved_workers();
        let thread_pool = rayon::ThreadPoolBuilder::new()
            .num_threads(workers)
            .thread_name(|i| format!("diploid-worker-{i}"))
            .build()
            .map_err(|e| SimError::ThreadPool(e.to_string()))?;
        Ok(Self {
            pool: thread_pool,
            workers,
            policy: pool.failure_policy,
            seed: None,
            runner,
            metrics: Arc::new(SweepMetrics::new()),
        })
    }

    /// Seeds every run from `seed`; `None` draws each run's generator from entropy.
    #[must_use]
    pub fn with_seed(mut self, seed: Option<u64>) -> Self {
        self.seed = seed;
        self
    }

    #[must_use]
    pub fn with_policy(mut self, policy: FailurePolicy) -> Self {
        self.policy = policy;
        self
    }

    #[must_use]
    pub fn with_metrics(mut self, metrics: Arc<SweepMetrics>) -> Self {
        self.metrics = metrics;
        self
    }

    #[must_use]
    pub fn workers(&self) -> usize {
        self.workers
    }

    #[must_use]
    pub fn runner(&self) -> &R {
        &self.runner
    }

    #[must_use]
    pub fn policy(&self) -> FailurePolicy {
        self.policy
    }

    #[must_use]
    pub fn metrics(&self) -> &Arc<SweepMetrics> {
        &self.metrics
    }

    /// Runs one simulation per entry of `lambdas`.
    ///
    /// `cells`, `end_time` and `rule_number` are checked before any work is
    /// dispatched. Under [`FailurePolicy::Abort`] the lambdas are checked up
    /// front as well, and once a run fails no task with a higher index is
    /// started; tasks with a lower index still run so the reported failure is
    /// the lowest-index one. Under [`FailurePolicy::Isolate`] a bad lambda only
    /// fails its own run and every task runs.
    pub fn sweep(
        &self,
        cells: usize,
        end_time: usize,
        rule_number: u32,
        lambdas: &[f64],
    ) -> Result<SweepReport> {
        validate_shape(cells, end_time)?;
        let table = build_rule_table(rule_number)?;
        if self.policy == FailurePolicy::Abort {
            for &lambda in lambdas {
                validate_lambda(lambda)?;
            }
        }

        tracing::info!(
            rule = table.rule_number(),
            cells = cells,
            end_time = end_time,
            runs = lambdas.len(),
            workers = self.workers,
            seed = ?self.seed,
            "Starting sweep"
        );
        let started = Instant::now();
        let baseline = self.metrics.snapshot();

        let tasks: Vec<RunTask> = lambdas
            .iter()
            .enumerate()
            .map(|(index, &lambda)| RunTask {
                index,
                cells,
                end_time,
                lambda,
                seed: self.seed.map(|root| derive_run_seed(root, index)),
            })
            .collect();

        let abort = self.policy == FailurePolicy::Abort;
        let first_failure = AtomicUsize::new(usize::MAX);
        let outcomes: Vec<Option<std::result::Result<RunResult, RunFailure>>> =
            self.pool.install(|| {
                tasks
                    .par_iter()
                    .map(|task| {
                        if abort && first_failure.load(Ordering::Relaxed) < task.index {
                            return None;
                        }
                        let outcome = self.execute_task(task, &table);
                        if abort && outcome.is_err() {
                            first_failure.fetch_min(task.index, Ordering::Relaxed);
                        }
                        Some(outcome)
                    })
                    .collect()
            });

        let skipped = outcomes.iter().filter(|o| o.is_none()).count();
        let mut runs = Vec::with_capacity(outcomes.len());
        let mut failures = Vec::new();
        for outcome in outcomes.into_iter().flatten() {
            match outcome {
                Ok(run) => runs.push(run),
                Err(failure) => failures.push(failure),
            }
        }

        let stats = self.metrics.snapshot().since(&baseline);
        self.metrics
            .log_sweep(table.rule_number(), &stats, skipped, started.elapsed());

        if abort && !failures.is_empty() {
            let failure = failures.remove(0);
            tracing::warn!(
                index = failure.index,
                lambda = failure.lambda,
                skipped = skipped,
                "Sweep aborted"
            );
            return Err(SimError::worker_failure(
                failure.index,
                failure.lambda,
                failure.reason,
            ));
        }

        Ok(SweepReport {
            result: SweepResult {
                header: SweepHeader {
                    rule: table.rule_number(),
                    cells,
                    end_time,
                    seed: self.seed,
                    created_at: chrono::Utc::now().to_rfc3339(),
                    fingerprint: fingerprint(&table, cells, end_time, self.seed, lambdas),
                },
                runs,
            },
            failures,
            stats,
        })
    }

    /// Runs one task, turning errors, panics and malformed output into a
    /// [`RunFailure`].
    fn execute_task(
        &self,
        task: &RunTask,
        table: &RuleTable,
    ) -> std::result::Result<RunResult, RunFailure> {
        let mut rng = match task.seed {
            Some(seed) => ChaCha8Rng::seed_from_u64(seed),
            None => ChaCha8Rng::from_entropy(),
        };
        let started = Instant::now();

        let outcome = catch_unwind(AssertUnwindSafe(|| {
            self.runner.execute(task, table, &mut rng)
        }));

        let checked = match outcome {
            Ok(Ok(run)) => check_complete(task, run),
            Ok(Err(err)) => Err(err.to_string()),
            Err(payload) => Err(panic_message(payload.as_ref())),
        };

        match checked {
            Ok(run) => {
                self.metrics.record_run(
                    task.index,
                    task.lambda,
                    task.cells * task.end_time,
                    started.elapsed(),
                );
                Ok(run)
            }
            Err(reason) => {
                self.metrics.record_failure(task.index, task.lambda, &reason);
                Err(RunFailure {
                    index: task.index,
                    lambda: task.lambda,
                    reason,
                })
            }
        }
    }
}

/// Runs a sweep with default pool sizing, abort-on-failure and unseeded runs.
pub fn sweep(
    cells: usize,
    end_time: usize,
    rule_number: u32,
    lambdas: &[f64],
) -> Result<SweepResult> {
    let coordinator = SweepCoordinator::new(&PoolConfig::default())?;
    Ok(coordinator
        .sweep(cells, end_time, rule_number, lambdas)?
        .result)
}

fn check_complete(task: &RunTask, run: RunResult) -> std::result::Result<RunResult, String> {
    if run.lambda.to_bits() != task.lambda.to_bits() {
        return Err(format!(
            "run reported lambda {} for task lambda {}",
            run.lambda, task.lambda
        ));
    }
    if !run.is_complete() || run.grid.shape() != (task.end_time, task.cells) {
        return Err(format!(
            "incomplete run: grid {:?}, {} density samples, expected {} x {}",
            run.grid.shape(),
            run.density.len(),
            task.end_time,
            task.cells
        ));
    }
    Ok(run)
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        format!("panicked: {s}")
    } else if let Some(s) = payload.downcast_ref::<String>() {
        format!("panicked: {s}")
    } else {
        "panicked".to_string()
    }
}

/// Hex SHA-256 over everything that determines a seeded sweep's output.
#[must_use]
pub fn fingerprint(
    table: &RuleTable,
    cells: usize,
    end_time: usize,
    seed: Option<u64>,
    lambdas: &[f64],
) -> String {
    let mut hasher = Sha256::new();
    hasher.update([table.rule_number()]);
    hasher.update((cells as u64).to_le_bytes());
    hasher.update((end_time as u64).to_le_bytes());
    match seed {
        Some(s) => {
            hasher.update([1u8]);
            hasher.update(s.to_le_bytes());
        }
        None => hasher.update([0u8]),
    }
    for lambda in lambdas {
        hasher.update(lambda.to_bits().to_le_bytes());
    }
    hex::encode(hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn pool(workers: usize) -> PoolConfig {
        PoolConfig {
            workers: Some(workers),
            ..Default::default()
        }
    }

    /// Earlier tasks sleep longer so they finish last.
    struct SlowFirstRunner {
        total: usize,
        finished: std::sync::Mutex<Vec<usize>>,
    }

    impl Runner for SlowFirstRunner {
        fn execute(
            &self,
            task: &RunTask,
            table: &RuleTable,
            rng: &mut ChaCha8Rng,
        ) -> Result<RunResult> {
            std::thread::sleep(Duration::from_millis(
                5 * (self.total - task.index) as u64,
            ));
            let result = SimulationRunner.execute(task, table, rng);
            self.finished.lock().unwrap().push(task.index);
            result
        }
    }

    /// Counts executed tasks and fails the one at `fail_at`.
    struct CountingRunner {
        fail_at: usize,
        executed: AtomicUsize,
    }

    impl Runner for CountingRunner {
        fn execute(
            &self,
            task: &RunTask,
            table: &RuleTable,
            rng: &mut ChaCha8Rng,
        ) -> Result<RunResult> {
            self.executed.fetch_add(1, Ordering::SeqCst);
            if task.index == self.fail_at {
                return Err(SimError::invalid_parameter("counted failure"));
            }
            SimulationRunner.execute(task, table, rng)
        }
    }

    /// Panics on one lambda, runs normally otherwise.
    struct PanicAtRunner {
        lambda: f64,
    }

    impl Runner for PanicAtRunner {
        fn execute(
            &self,
            task: &RunTask,
            table: &RuleTable,
            rng: &mut ChaCha8Rng,
        ) -> Result<RunResult> {
            if task.lambda == self.lambda {
                panic!("injected failure");
            }
            SimulationRunner.execute(task, table, rng)
        }
    }

    /// Returns a run that stops one step short.
    struct TruncatingRunner;

    impl Runner for TruncatingRunner {
        fn execute(
            &self,
            task: &RunTask,
            table: &RuleTable,
            rng: &mut ChaCha8Rng,
        ) -> Result<RunResult> {
            let mut short = *task;
            short.end_time = task.end_time - 1;
            SimulationRunner.execute(&short, table, rng)
        }
    }

    #[test]
    fn test_results_follow_input_order() {
        let lambdas = [0.9, 0.1, 0.5, 0.3, 0.7, 0.0, 1.0, 0.2];
        let runner = SlowFirstRunner {
            total: lambdas.len(),
            finished: std::sync::Mutex::new(Vec::new()),
        };
        let coordinator = SweepCoordinator::with_runner(&pool(4), runner).unwrap();
        let report = coordinator.sweep(16, 8, 110, &lambdas).unwrap();

        let finished = coordinator.runner().finished.lock().unwrap().clone();
        assert_eq!(finished.len(), lambdas.len());
        assert_ne!(finished, (0..lambdas.len()).collect::<Vec<_>>());

        assert_eq!(report.result.lambdas(), lambdas.to_vec());
        assert!(report.is_complete());
    }

    #[test]
    fn test_header_describes_sweep() {
        let coordinator = SweepCoordinator::new(&pool(2)).unwrap().with_seed(Some(5));
        let report = coordinator.sweep(10, 4, 30, &[0.25, 0.75]).unwrap();
        let header = &report.result.header;
        assert_eq!(header.rule, 30);
        assert_eq!(header.cells, 10);
        assert_eq!(header.end_time, 4);
        assert_eq!(header.seed, Some(5));
        assert_eq!(header.fingerprint.len(), 64);
        assert_eq!(report.result.runs[1].seed, Some(derive_run_seed(5, 1)));
    }

    #[test]
    fn test_seeded_sweeps_repeat() {
        let lambdas = [0.2, 0.6, 0.95];
        let a = SweepCoordinator::new(&pool(3))
            .unwrap()
            .with_seed(Some(42))
            .sweep(40, 25, 110, &lambdas)
            .unwrap();
        let b = SweepCoordinator::new(&pool(1))
            .unwrap()
            .with_seed(Some(42))
            .sweep(40, 25, 110, &lambdas)
            .unwrap();
        assert_eq!(a.result.runs, b.result.runs);
        assert_eq!(a.result.header.fingerprint, b.result.header.fingerprint);
    }

    #[test]
    fn test_abort_rejects_bad_lambda_before_running() {
        let coordinator = SweepCoordinator::new(&pool(2)).unwrap();
        let err = coordinator.sweep(8, 4, 110, &[0.5, 1.5]).unwrap_err();
        assert!(matches!(err, SimError::InvalidParameter(_)));
        assert_eq!(coordinator.metrics().runs_completed(), 0);
    }

    #[test]
    fn test_abort_reports_lowest_failing_index() {
        let coordinator =
            SweepCoordinator::with_runner(&pool(2), PanicAtRunner { lambda: 0.4 }).unwrap();
        let err = coordinator
            .sweep(8, 4, 110, &[0.1, 0.4, 0.7, 0.4])
            .unwrap_err();
        match err {
            SimError::WorkerFailure {
                index,
                lambda,
                reason,
            } => {
                assert_eq!(index, 1);
                assert_eq!(lambda, 0.4);
                assert!(reason.contains("injected failure"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_isolate_keeps_surviving_runs_in_order() {
        let coordinator = SweepCoordinator::with_runner(&pool(3), PanicAtRunner { lambda: 0.4 })
            .unwrap()
            .with_policy(FailurePolicy::Isolate);
        let report = coordinator
            .sweep(8, 4, 110, &[0.1, 0.4, 0.7, 2.0])
            .unwrap();
        assert_eq!(report.result.lambdas(), vec![0.1, 0.7]);
        assert_eq!(report.failed_lambdas(), vec![0.4, 2.0]);
        assert_eq!(report.failures[0].index, 1);
        assert_eq!(report.failures[1].index, 3);
        assert_eq!(coordinator.metrics().runs_failed(), 2);
    }

    #[test]
    fn test_abort_stops_starting_later_runs() {
        let lambdas = vec![0.5; 16];
        let runner = CountingRunner {
            fail_at: 0,
            executed: AtomicUsize::new(0),
        };
        let coordinator = SweepCoordinator::with_runner(&pool(1), runner).unwrap();
        let err = coordinator.sweep(8, 4, 110, &lambdas).unwrap_err();

        assert!(matches!(err, SimError::WorkerFailure { index: 0, .. }));
        let executed = coordinator.runner().executed.load(Ordering::SeqCst);
        assert!(executed < lambdas.len(), "{executed} runs executed");
    }

    #[test]
    fn test_isolate_runs_every_task() {
        let lambdas = vec![0.5; 16];
        let runner = CountingRunner {
            fail_at: 0,
            executed: AtomicUsize::new(0),
        };
        let coordinator = SweepCoordinator::with_runner(&pool(1), runner)
            .unwrap()
            .with_policy(FailurePolicy::Isolate);
        let report = coordinator.sweep(8, 4, 110, &lambdas).unwrap();

        assert_eq!(coordinator.runner().executed.load(Ordering::SeqCst), 16);
        assert_eq!(report.result.len(), 15);
        assert_eq!(report.failures.len(), 1);
    }

    #[test]
    fn test_stats_cover_one_sweep() {
        let coordinator = SweepCoordinator::new(&pool(2)).unwrap();
        let first = coordinator.sweep(8, 4, 110, &[0.1, 0.2, 0.3]).unwrap();
        let second = coordinator.sweep(8, 4, 110, &[0.4, 0.5]).unwrap();

        assert_eq!(first.stats.runs_completed, 3);
        assert_eq!(second.stats.runs_completed, 2);
        assert_eq!(second.stats.cell_updates, 2 * 8 * 4);
        assert_eq!(coordinator.metrics().runs_completed(), 5);
    }

    #[test]
    fn test_incomplete_run_is_never_returned() {
        let coordinator = SweepCoordinator::with_runner(&pool(1), TruncatingRunner)
            .unwrap()
            .with_policy(FailurePolicy::Isolate);
        let report = coordinator.sweep(6, 5, 110, &[0.5]).unwrap();
        assert!(report.result.is_empty());
        assert!(report.failures[0].reason.contains("incomplete run"));
    }

    #[test]
    fn test_shared_parameters_fail_whole_sweep() {
        let coordinator = SweepCoordinator::new(&pool(1))
            .unwrap()
            .with_policy(FailurePolicy::Isolate);
        assert!(matches!(
            coordinator.sweep(0, 4, 110, &[0.5]),
            Err(SimError::InvalidParameter(_))
        ));
        assert!(matches!(
            coordinator.sweep(4, 4, 300, &[0.5]),
            Err(SimError::InvalidRule(300))
        ));
    }

    #[test]
    fn test_empty_lambdas() {
        let result = sweep(4, 4, 110, &[]).unwrap();
        assert!(result.is_empty());
    }

    #[test]
    fn test_derive_run_seed_spreads_indices() {
        let seeds: std::collections::HashSet<u64> =
            (0..1000).map(|i| derive_run_seed(7, i)).collect();
        assert_eq!(seeds.len(), 1000);
        assert_ne!(derive_run_seed(7, 0), derive_run_seed(8, 0));
    }
}
