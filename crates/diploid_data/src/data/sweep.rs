use super::run::RunResult;
use rkyv::{Archive, Deserialize as RkyvDeserialize, Serialize as RkyvSerialize};
use serde::{Deserialize, Serialize};

/// Parameters shared by every run of a sweep.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, Archive, RkyvSerialize, RkyvDeserialize)]
#[archive(check_bytes)]
pub struct SweepHeader {
    pub rule: u8,
    pub cells: usize,
    pub end_time: usize,
    /// Root seed the per-run seeds were derived from.
    pub seed: Option<u64>,
    /// RFC 3339 timestamp of when the sweep finished.
    pub created_at: String,
    /// Hex SHA-256 over rule, shape, seed and the requested lambdas.
    pub fingerprint: String,
}

/// Ordered runs of a sweep, index-aligned with the requested lambdas.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Archive, RkyvSerialize, RkyvDeserialize)]
#[archive(check_bytes)]
pub struct SweepResult {
    pub header: SweepHeader,
    pub runs: Vec<RunResult>,
}

impl SweepResult {
    #[must_use]
    pub fn len(&self) -> usize {
        self.runs.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.runs.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, RunResult> {
        self.runs.iter()
    }

    /// Lambdas in run order.
    #[must_use]
    pub fn lambdas(&self) -> Vec<f64> {
        self.runs.iter().map(|r| r.lambda).collect()
    }

    /// Finds the run for an exact lambda value.
    #[must_use]
    pub fn run_for(&self, lambda: f64) -> Option<&RunResult> {
        self.runs.iter().find(|r| r.lambda == lambda)
    }

    /// Number of cell values held across every grid.
    #[must_use]
    pub fn cell_count(&self) -> usize {
        self.runs.iter().map(|r| r.grid.as_slice().len()).sum()
    }
}

impl<'a> IntoIterator for &'a SweepResult {
    type Item = &'a RunResult;
    type IntoIter = std::slice::Iter<'a, RunResult>;

    fn into_iter(self) -> Self::IntoIter {
        self.runs.iter()
    }
}
