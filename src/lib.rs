//! Command line front end for diploid sweeps.

pub mod app;
pub mod cli;

pub use app::{App, JobOutcome};
pub use cli::Args;
