//! Command line flags and how they override the config file.

use clap::Parser;
use diploid_core::config::{FailurePolicy, SweepConfig};
use diploid_data::ResultFormat;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(author, version, about = "Sweep a gated elementary cellular automaton over lambda", long_about = None)]
pub struct Args {
    /// Config file path; a missing file means defaults
    #[arg(short, long, default_value = "diploid.toml")]
    pub config: PathBuf,

    /// Row width
    #[arg(long)]
    pub cells: Option<usize>,

    /// Steps per run
    #[arg(short = 't', long)]
    pub end_time: Option<usize>,

    /// Wolfram rule number (0-255)
    #[arg(short, long)]
    pub rule: Option<u32>,

    /// Root seed for reproducible sweeps
    #[arg(short, long)]
    pub seed: Option<u64>,

    /// Worker threads (default: available cores minus reserved cores)
    #[arg(short, long)]
    pub workers: Option<usize>,

    #[arg(long)]
    pub lambda_start: Option<f64>,

    #[arg(long)]
    pub lambda_stop: Option<f64>,

    #[arg(long)]
    pub lambda_step: Option<f64>,

    /// Directory the result artifact is written to
    #[arg(short, long)]
    pub output_dir: Option<PathBuf>,

    /// Artifact encoding: rkyv or json_gz
    #[arg(short, long)]
    pub format: Option<ResultFormat>,

    /// Keep successful runs when some runs fail
    #[arg(long)]
    pub isolate_failures: bool,

    /// Default log filter when RUST_LOG is unset
    #[arg(long, default_value = "info")]
    pub log_level: String,

    /// Print the effective configuration as TOML and exit
    #[arg(long)]
    pub print_config: bool,
}

impl Args {
    /// Applies every flag that was given on top of `config`.
    pub fn apply(&self, config: &mut SweepConfig) {
        let sweep = &mut config.sweep;
        if let Some(cells) = self.cells {
            sweep.cells = cells;
        }
        if let Some(end_time) = self.end_time {
            sweep.end_time = end_time;
        }
        if let Some(rule) = self.rule {
            sweep.rule = rule;
        }
        if self.seed.is_some() {
            sweep.seed = self.seed;
        }
        if let Some(start) = self.lambda_start {
            sweep.lambda_start = start;
        }
        if let Some(stop) = self.lambda_stop {
            sweep.lambda_stop = stop;
        }
        if let Some(step) = self.lambda_step {
            sweep.lambda_step = step;
        }
        if self.workers.is_some() {
            config.pool.workers = self.workers;
        }
        if self.isolate_failures {
            config.pool.failure_policy = FailurePolicy::Isolate;
        }
        if let Some(dir) = &self.output_dir {
            config.output.dir = dir.clone();
        }
        if let Some(format) = self.format {
            config.output.format = format;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_args_parsing_defaults() {
        let args = Args::parse_from(["diploid"]);
        assert_eq!(args.config, PathBuf::from("diploid.toml"));
        assert_eq!(args.log_level, "info");
        assert!(!args.isolate_failures);

        let mut config = SweepConfig::default();
        args.apply(&mut config);
        assert_eq!(config, SweepConfig::default());
    }

    #[test]
    fn test_flags_override_config() {
        let args = Args::parse_from([
            "diploid",
            "--cells",
            "64",
            "-t",
            "32",
            "-r",
            "30",
            "-s",
            "9",
            "-w",
            "3",
            "--lambda-step",
            "0.25",
            "-f",
            "json_gz",
            "--isolate-failures",
        ]);
        let mut config = SweepConfig::default();
        args.apply(&mut config);
        assert_eq!(config.sweep.cells, 64);
        assert_eq!(config.sweep.end_time, 32);
        assert_eq!(config.sweep.rule, 30);
        assert_eq!(config.sweep.seed, Some(9));
        assert_eq!(config.pool.workers, Some(3));
        assert_eq!(config.pool.failure_policy, FailurePolicy::Isolate);
        assert_eq!(config.output.format, ResultFormat::JsonGz);
        assert_eq!(config.lambdas(), vec![0.0, 0.25, 0.5, 0.75, 1.0]);
    }
}
