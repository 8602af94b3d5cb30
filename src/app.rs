//! Glue between configuration, the sweep coordinator and the result store.

use anyhow::Result;
use diploid_core::config::SweepConfig;
use diploid_core::metrics::SweepMetrics;
use diploid_core::summary::{summarize, RunSummary};
use diploid_core::sweep::{SweepCoordinator, SweepReport};
use diploid_io::ResultStore;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Everything a finished job produced.
#[derive(Debug)]
pub struct JobOutcome {
    pub path: PathBuf,
    pub report: SweepReport,
    pub summaries: Vec<RunSummary>,
    pub elapsed: Duration,
}

pub struct App {
    pub config: SweepConfig,
    pub metrics: Arc<SweepMetrics>,
}

impl App {
    pub fn new(config: SweepConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            config,
            metrics: Arc::new(SweepMetrics::new()),
        })
    }

    /// Runs the configured sweep and persists it under the rule number.
    pub fn run(&self) -> Result<JobOutcome> {
        let started = Instant::now();
        let config = &self.config;

        let coordinator = SweepCoordinator::new(&config.pool)?
            .with_seed(config.sweep.seed)
            .with_metrics(Arc::clone(&self.metrics));
        tracing::info!(
            workers = coordinator.workers(),
            reserved_cores = config.pool.reserved_cores,
            "Worker pool ready"
        );

        let lambdas = config.lambdas();
        let report = coordinator.sweep(
            config.sweep.cells,
            config.sweep.end_time,
            config.sweep.rule,
            &lambdas,
        )?;
        for failure in &report.failures {
            tracing::warn!(
                index = failure.index,
                lambda = failure.lambda,
                reason = %failure.reason,
                "Run excluded from results"
            );
        }

        let store = ResultStore::new(&config.output.dir, config.output.format);
        let path = store.save(&report.result)?;
        let summaries = summarize(&report.result, config.summary.tail_window);

        Ok(JobOutcome {
            path,
            report,
            summaries,
            elapsed: started.elapsed(),
        })
    }
}
