//! Configuration for sweeps.
//!
//! Maps to a `diploid.toml` file. Every section has defaults, so a file only
//! needs the keys it changes.
//!
//! ## Configuration Hierarchy
//!
//! 1. Default values (`Default` impls)
//! 2. `diploid.toml` (overrides defaults)
//! 3. Command line flags (applied by the binary)
//!
//! ## Example `diploid.toml`
//!
//! ```toml
//! [sweep]
//! cells = 1000
//! end_time = 500
//! rule = 110
//! lambda_step = 0.05
//! seed = 42
//!
//! [pool]
//! reserved_cores = 2
//! failure_policy = "abort"
//!
//! [output]
//! dir = "results"
//! format = "rkyv"
//! ```

use diploid_data::ResultFormat;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Upper bound on a single run's grid, in cells.
pub const MAX_GRID_CELLS: usize = u32::MAX as usize;

/// Upper bound on the number of lambda values in one sweep.
pub const MAX_LAMBDAS: usize = 100_000;

/// What to do when one run of a sweep fails.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailurePolicy {
    /// Fail the whole sweep with the lowest-index failure.
    #[default]
    Abort,
    /// Drop failed runs and report them next to the surviving results.
    Isolate,
}

/// Simulation parameters and the lambda grid.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct SimulationConfig {
    pub cells: usize,
    pub end_time: usize,
    pub rule: u32,
    pub lambda_start: f64,
    pub lambda_stop: f64,
    pub lambda_step: f64,
    pub seed: Option<u64>,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            cells: 1000,
            end_time: 500,
            rule: 110,
            lambda_start: 0.0,
            lambda_stop: 1.0,
            lambda_step: 0.05,
            seed: None,
        }
    }
}

/// Worker pool sizing and failure handling.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(default)]
pub struct PoolConfig {
    /// Fixed worker count. When unset, the pool uses the available cores
    /// minus `reserved_cores`, with a floor of one.
    pub workers: Option<usize>,
    pub reserved_cores: usize,
    pub failure_policy: FailurePolicy,
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            workers: None,
            reserved_cores: 2,
            failure_policy: FailurePolicy::Abort,
        }
    }
}

impl PoolConfig {
    /// Number of worker threads this configuration resolves to on this machine.
    #[must_use]
    pub fn resolved_workers(&self) -> usize {
        match self.workers {
            Some(n) => n.max(1),
            None => {
                let cores = std::thread::available_parallelism()
                    .map(std::num::NonZeroUsize::get)
                    .unwrap_or(1);
                cores.saturating_sub(self.reserved_cores).max(1)
            }
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(default)]
pub struct OutputConfig {
    pub dir: PathBuf,
    pub format: ResultFormat,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            dir: PathBuf::from("."),
            format: ResultFormat::Rkyv,
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(default)]
pub struct SummaryConfig {
    /// Number of trailing density samples averaged into the tail mean.
    pub tail_window: usize,
}

impl Default for SummaryConfig {
    fn default() -> Self {
        Self { tail_window: 50 }
    }
}

/// Top-level configuration.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Default)]
#[serde(default)]
pub struct SweepConfig {
    pub sweep: SimulationConfig,
    pub pool: PoolConfig,
    pub output: OutputConfig,
    pub summary: SummaryConfig,
}

impl SweepConfig {
    /// Validates all configuration parameters.
    ///
    /// Returns `Ok(())` if all parameters are valid, or `Err` with a description
    /// of the first validation failure.
    pub fn validate(&self) -> anyhow::Result<()> {
        let s = &self.sweep;
        anyhow::ensure!(s.cells >= 1, "Cell count must be at least 1");
        anyhow::ensure!(s.end_time >= 1, "End time must be at least 1");
        anyhow::ensure!(
            s.cells.saturating_mul(s.end_time) <= MAX_GRID_CELLS,
            "Grid of {} x {} cells is too large (max {} cells per run)",
            s.end_time,
            s.cells,
            MAX_GRID_CELLS
        );
        anyhow::ensure!(s.rule <= 255, "Rule number must be in 0..=255");
        anyhow::ensure!(
            s.lambda_start.is_finite() && (0.0..=1.0).contains(&s.lambda_start),
            "Lambda start must be in [0.0, 1.0]"
        );
        anyhow::ensure!(
            s.lambda_stop.is_finite() && (0.0..=1.0).contains(&s.lambda_stop),
            "Lambda stop must be in [0.0, 1.0]"
        );
        anyhow::ensure!(
            s.lambda_start <= s.lambda_stop,
            "Lambda start must not exceed lambda stop"
        );
        anyhow::ensure!(
            s.lambda_step.is_finite() && s.lambda_step > 0.0,
            "Lambda step must be positive"
        );
        anyhow::ensure!(
            lambda_count(s.lambda_start, s.lambda_stop, s.lambda_step).is_some(),
            "Lambda step {} yields more than {} lambda values",
            s.lambda_step,
            MAX_LAMBDAS
        );

        if let Some(workers) = self.pool.workers {
            anyhow::ensure!(workers >= 1, "Worker count must be at least 1");
        }

        anyhow::ensure!(
            self.summary.tail_window >= 1,
            "Summary tail window must be at least 1"
        );

        Ok(())
    }

    /// Parses and validates a TOML document.
    pub fn from_toml(content: &str) -> anyhow::Result<Self> {
        let config = toml::from_str::<Self>(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Loads `path`, falling back to defaults when the file does not exist.
    pub fn load<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            tracing::info!(path = %path.display(), "No config file found, using defaults");
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path)?;
        Self::from_toml(&content)
            .map_err(|e| e.context(format!("loading config from {}", path.display())))
    }

    pub fn to_toml(&self) -> anyhow::Result<String> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// The inclusive lambda grid `start, start + step, ..., <= stop`.
    ///
    /// Values are rounded to 12 decimals so that e.g. the fourth point of a
    /// 0.05 grid is exactly `0.15`.
    #[must_use]
    pub fn lambdas(&self) -> Vec<f64> {
        lambda_grid(
            self.sweep.lambda_start,
            self.sweep.lambda_stop,
            self.sweep.lambda_step,
        )
    }
}

/// Number of points in the inclusive grid over `[start, stop]`, or `None` when
/// the inputs are not a valid range or the grid would exceed [`MAX_LAMBDAS`].
#[must_use]
pub fn lambda_count(start: f64, stop: f64, step: f64) -> Option<usize> {
    if !start.is_finite() || !stop.is_finite() || !step.is_finite() {
        return None;
    }
    if step <= 0.0 || stop < start {
        return None;
    }
    let intervals = ((stop - start) / step + 1e-9).floor();
    if !intervals.is_finite() || intervals >= MAX_LAMBDAS as f64 {
        return None;
    }
    (intervals as usize)
        .checked_add(1)
        .filter(|&count| count <= MAX_LAMBDAS)
}

/// Inclusive evenly spaced grid over `[start, stop]`.
///
/// Empty when [`lambda_count`] rejects the inputs.
#[must_use]
pub fn lambda_grid(start: f64, stop: f64, step: f64) -> Vec<f64> {
    let Some(count) = lambda_count(start, stop, step) else {
        return Vec::new();
    };
    (0..count)
        .map(|i| {
            let value = start + i as f64 * step;
            ((value * 1e12).round() / 1e12).min(stop)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_validates() {
        let config = SweepConfig::default();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_default_lambda_grid() {
        let lambdas = SweepConfig::default().lambdas();
        assert_eq!(lambdas.len(), 21);
        assert_eq!(lambdas[0], 0.0);
        assert_eq!(lambdas[3], 0.15);
        assert_eq!(lambdas[20], 1.0);
    }

    #[test]
    fn test_lambda_grid_edges() {
        assert_eq!(lambda_grid(0.5, 0.5, 0.1), vec![0.5]);
        assert_eq!(lambda_grid(0.0, 1.0, 0.3), vec![0.0, 0.3, 0.6, 0.9]);
        assert!(lambda_grid(0.0, 1.0, 0.0).is_empty());
        assert!(lambda_grid(0.6, 0.5, 0.1).is_empty());
    }

    #[test]
    fn test_tiny_lambda_step_rejected() {
        for step in [1e-300, 1e-10, f64::MIN_POSITIVE] {
            let mut config = SweepConfig::default();
            config.sweep.lambda_step = step;
            assert!(config.validate().is_err(), "step {step} passed validation");
            assert!(config.lambdas().is_empty());
        }
    }

    #[test]
    fn test_lambda_count_cap() {
        assert_eq!(lambda_count(0.0, 1.0, 0.05), Some(21));
        assert_eq!(lambda_count(0.0, 0.5, 1e-5), Some(50_001));
        assert_eq!(lambda_count(0.0, 1.0, 1e-6), None);
        assert_eq!(lambda_count(0.0, 1.0, f64::NAN), None);
        assert_eq!(lambda_count(0.0, f64::INFINITY, 0.1), None);
    }

    #[test]
    fn test_invalid_cells() {
        let config = SweepConfig {
            sweep: SimulationConfig {
                cells: 0,
                ..Default::default()
            },
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_invalid_rule() {
        let config = SweepConfig {
            sweep: SimulationConfig {
                rule: 256,
                ..Default::default()
            },
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_invalid_lambda_range() {
        let config = SweepConfig {
            sweep: SimulationConfig {
                lambda_start: 0.8,
                lambda_stop: 0.2,
                ..Default::default()
            },
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_zero_workers_rejected() {
        let config = SweepConfig {
            pool: PoolConfig {
                workers: Some(0),
                ..Default::default()
            },
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config = SweepConfig::from_toml(
            r#"
            [sweep]
            rule = 30
            seed = 7

            [pool]
            failure_policy = "isolate"

            [output]
            format = "json_gz"
            "#,
        )
        .unwrap();
        assert_eq!(config.sweep.rule, 30);
        assert_eq!(config.sweep.seed, Some(7));
        assert_eq!(config.sweep.cells, 1000);
        assert_eq!(config.pool.failure_policy, FailurePolicy::Isolate);
        assert_eq!(config.output.format, ResultFormat::JsonGz);
    }

    #[test]
    fn test_toml_roundtrip() {
        let mut config = SweepConfig::default();
        config.sweep.seed = Some(11);
        config.pool.workers = Some(3);
        let text = config.to_toml().unwrap();
        assert_eq!(SweepConfig::from_toml(&text).unwrap(), config);
    }

    #[test]
    fn test_resolved_workers() {
        let fixed = PoolConfig {
            workers: Some(4),
            ..Default::default()
        };
        assert_eq!(fixed.resolved_workers(), 4);

        let greedy = PoolConfig {
            workers: None,
            reserved_cores: usize::MAX,
            ..Default::default()
        };
        assert_eq!(greedy.resolved_workers(), 1);
    }
}
