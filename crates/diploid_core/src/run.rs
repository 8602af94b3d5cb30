//! A single simulation run at one mixing probability.
//!
//! The run draws its initial row and its whole gate matrix up front from the
//! generator it is handed, then steps `end_time` times. Grid row `t` holds the
//! state after step `t`, and `density[t + 1]` is the density of that row, so
//! `density[0]` is the only entry describing the initial row.

use crate::error::{Result, SimError};
use crate::rule::RuleTable;
use crate::stepper::step_into;
use diploid_data::{density, RunResult, SpaceTimeGrid};
use rand::distributions::{Bernoulli, Distribution};
use rand::Rng;
use rand_chacha::ChaCha8Rng;

/// Checks the shared run parameters.
pub fn validate_shape(cells: usize, end_time: usize) -> Result<()> {
    if cells < 1 {
        return Err(SimError::invalid_parameter("cells must be at least 1"));
    }
    if end_time < 1 {
        return Err(SimError::invalid_parameter("end_time must be at least 1"));
    }
    if cells.checked_mul(end_time).is_none() {
        return Err(SimError::invalid_parameter(format!(
            "grid of {end_time} x {cells} cells does not fit in memory"
        )));
    }
    Ok(())
}

/// Checks that `lambda` is a finite probability.
pub fn validate_lambda(lambda: f64) -> Result<()> {
    if !lambda.is_finite() || !(0.0..=1.0).contains(&lambda) {
        return Err(SimError::invalid_parameter(format!(
            "lambda must be in [0, 1], got {lambda}"
        )));
    }
    Ok(())
}

/// Uniform random initial row.
pub fn initial_state<R: Rng + ?Sized>(cells: usize, rng: &mut R) -> Vec<u8> {
    (0..cells).map(|_| u8::from(rng.gen::<bool>())).collect()
}

/// `end_time x cells` Bernoulli(`lambda`) gate bits, row-major.
pub fn gate_matrix<R: Rng + ?Sized>(
    cells: usize,
    end_time: usize,
    lambda: f64,
    rng: &mut R,
) -> Result<Vec<u8>> {
    let gate = Bernoulli::new(lambda)
        .map_err(|e| SimError::invalid_parameter(format!("lambda {lambda}: {e}")))?;
    Ok((0..cells * end_time)
        .map(|_| u8::from(gate.sample(rng)))
        .collect())
}

/// Runs the automaton for `end_time` steps.
pub fn run<R: Rng + ?Sized>(
    cells: usize,
    end_time: usize,
    lambda: f64,
    rule_table: &RuleTable,
    rng: &mut R,
) -> Result<RunResult> {
    validate_shape(cells, end_time)?;
    validate_lambda(lambda)?;

    let mut state = initial_state(cells, rng);
    let gates = gate_matrix(cells, end_time, lambda, rng)?;

    let mut grid = SpaceTimeGrid::with_capacity(cells, end_time);
    let mut density_series = Vec::with_capacity(end_time + 1);
    density_series.push(density(&state));

    let mut next = Vec::with_capacity(cells);
    for gate_row in gates.chunks_exact(cells) {
        step_into(&state, rule_table, gate_row, &mut next)?;
        grid.push_row(&next);
        density_series.push(density(&next));
        std::mem::swap(&mut state, &mut next);
    }

    tracing::trace!(
        lambda = lambda,
        cells = cells,
        end_time = end_time,
        "Run finished"
    );

    Ok(RunResult {
        lambda,
        density: density_series,
        grid,
        seed: None,
    })
}

/// One unit of sweep work.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RunTask {
    /// Position of `lambda` in the requested sequence.
    pub index: usize,
    pub cells: usize,
    pub end_time: usize,
    pub lambda: f64,
    /// Seed of `rng` when the sweep is seeded.
    pub seed: Option<u64>,
}

/// Executes one run. Implementations must be shareable across worker threads.
pub trait Runner: Sync {
    fn execute(&self, task: &RunTask, rule_table: &RuleTable, rng: &mut ChaCha8Rng)
        -> Result<RunResult>;
}

/// The standard runner: calls [`run`] and stamps the task seed on the result.
#[derive(Debug, Clone, Copy, Default)]
pub struct SimulationRunner;

impl Runner for SimulationRunner {
    fn execute(
        &self,
        task: &RunTask,
        rule_table: &RuleTable,
        rng: &mut ChaCha8Rng,
    ) -> Result<RunResult> {
        let mut result = run(task.cells, task.end_time, task.lambda, rule_table, rng)?;
        result.seed = task.seed;
        Ok(result)
    }
}
