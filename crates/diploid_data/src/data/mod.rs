//! Result types shared by the simulation, persistence and tooling crates.

pub mod format;
pub mod grid;
pub mod run;
pub mod sweep;
