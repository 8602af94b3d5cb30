//! # Diploid Core
//!
//! Simulation engine for a one-dimensional, two-state cellular automaton whose
//! cells follow an elementary rule only with probability `lambda` per step and
//! are otherwise gated to neighborhood code 0.
//!
//! This crate contains:
//! - Rule tables in Wolfram numbering
//! - The gated row stepper
//! - Single runs over a pre-drawn gate matrix
//! - Parallel sweeps over many `lambda` values
//! - Configuration, metrics and descriptive summaries
//!
//! ## Example
//!
//! ```
//! use diploid_core::rule::RuleTable;
//! use diploid_core::run::run;
//! use rand::SeedableRng;
//! use rand_chacha::ChaCha8Rng;
//!
//! let table = RuleTable::new(110);
//! let mut rng = ChaCha8Rng::seed_from_u64(42);
//! let result = run(64, 32, 0.8, &table, &mut rng).unwrap();
//! assert_eq!(result.density.len(), 33);
//! ```

/// Sweep configuration loaded from `diploid.toml`
pub mod config;
/// Error types for the core
pub mod error;
/// Run counters and tracing setup
pub mod metrics;
/// Elementary rule tables
pub mod rule;
/// Single simulation runs and the runner seam
pub mod run;
/// Gated row update
pub mod stepper;
/// Descriptive statistics over finished runs
pub mod summary;
/// Parallel sweeps over lambda
pub mod sweep;

pub use config::{FailurePolicy, PoolConfig, SweepConfig, MAX_LAMBDAS};
pub use error::{Result, SimError};
pub use metrics::{init_logging, SweepMetrics, SweepStats};
pub use rule::{build_rule_table, RuleTable};
pub use run::{run, RunTask, Runner, SimulationRunner};
pub use stepper::step;
pub use summary::{summarize, RunSummary};
pub use sweep::{sweep, SweepCoordinator, SweepReport};
