//! # Diploid Data
//!
//! Plain data types produced by a sweep: space-time grids, per-run results
//! and the sweep container. Everything here derives both `serde` and `rkyv`
//! so the same value can be written as JSON or as a validated archive.

pub mod data;

pub use data::format::ResultFormat;
pub use data::grid::{density, CellRow, SpaceTimeGrid};
pub use data::run::RunResult;
pub use data::sweep::{SweepHeader, SweepResult};
