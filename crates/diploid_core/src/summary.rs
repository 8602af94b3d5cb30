//! Descriptive per-run statistics for reporting.

use diploid_data::{RunResult, SweepResult};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunSummary {
    pub lambda: f64,
    pub initial_density: f64,
    pub final_density: f64,
    /// Mean of the last `tail` density samples (fewer if the run is shorter).
    pub tail_mean_density: f64,
    /// Fraction of cells that changed state between the last two grid rows.
    pub activity: f64,
}

impl RunSummary {
    #[must_use]
    pub fn from_run(run: &RunResult, tail: usize) -> Self {
        let tail = tail.clamp(1, run.density.len().max(1));
        let window = &run.density[run.density.len().saturating_sub(tail)..];
        let tail_mean_density = if window.is_empty() {
            0.0
        } else {
            window.iter().sum::<f64>() / window.len() as f64
        };

        let steps = run.grid.steps();
        let activity = match (
            steps.checked_sub(2).and_then(|t| run.grid.row(t)),
            steps.checked_sub(1).and_then(|t| run.grid.row(t)),
        ) {
            (Some(prev), Some(last)) => {
                let flips = prev.iter().zip(last).filter(|(a, b)| a != b).count();
                flips as f64 / last.len() as f64
            }
            _ => 0.0,
        };

        Self {
            lambda: run.lambda,
            initial_density: run.initial_density().unwrap_or(0.0),
            final_density: run.final_density().unwrap_or(0.0),
            tail_mean_density,
            activity,
        }
    }
}

/// Summaries for every run, in sweep order.
#[must_use]
pub fn summarize(result: &SweepResult, tail: usize) -> Vec<RunSummary> {
    result
        .iter()
        .map(|run| RunSummary::from_run(run, tail))
        .collect()
}

/// Fixed-width table, one line per run.
#[must_use]
pub fn format_table(summaries: &[RunSummary]) -> String {
    let mut out = String::from("lambda  initial  final    tail     activity\n");
    for s in summaries {
        out.push_str(&format!(
            "{:<6.3}  {:<7.4}  {:<7.4}  {:<7.4}  {:.4}\n",
            s.lambda, s.initial_density, s.final_density, s.tail_mean_density, s.activity
        ));
    }
    out
}
