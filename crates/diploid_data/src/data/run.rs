use super::grid::SpaceTimeGrid;
use rkyv::{Archive, Deserialize as RkyvDeserialize, Serialize as RkyvSerialize};
use serde::{Deserialize, Serialize};

/// Output of one simulation run at a single mixing probability.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Archive, RkyvSerialize, RkyvDeserialize)]
#[archive(check_bytes)]
pub struct RunResult {
    /// Probability that a cell follows the rule on a given step.
    pub lambda: f64,
    /// Density of the initial row followed by the density after every step.
    pub density: Vec<f64>,
    /// Row `t` is the state after step `t`.
    pub grid: SpaceTimeGrid,
    /// Seed of the run's own generator, present when the sweep was seeded.
    pub seed: Option<u64>,
}

impl RunResult {
    /// Number of steps simulated.
    #[must_use]
    pub fn steps(&self) -> usize {
        self.grid.steps()
    }

    #[must_use]
    pub fn cells(&self) -> usize {
        self.grid.cells()
    }

    #[must_use]
    pub fn initial_density(&self) -> Option<f64> {
        self.density.first().copied()
    }

    #[must_use]
    pub fn final_density(&self) -> Option<f64> {
        self.density.last().copied()
    }

    /// A finished run holds exactly one density entry more than grid rows.
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.grid.is_well_formed() && self.density.len() == self.grid.steps() + 1
    }
}
