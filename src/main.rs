use anyhow::Result;
use clap::Parser;
use diploid_core::config::SweepConfig;
use diploid_core::metrics::init_logging;
use diploid_core::summary::format_table;
use diploid_lib::{App, Args};

fn main() -> Result<()> {
    let args = Args::parse();
    init_logging(&args.log_level);

    let mut config = SweepConfig::load(&args.config)?;
    args.apply(&mut config);
    config.validate()?;

    if args.print_config {
        print!("{}", config.to_toml()?);
        return Ok(());
    }

    tracing::info!(
        rule = config.sweep.rule,
        cells = config.sweep.cells,
        end_time = config.sweep.end_time,
        lambdas = config.lambdas().len(),
        "Sweep configured"
    );

    let app = App::new(config)?;
    let outcome = app.run()?;

    print!("{}", format_table(&outcome.summaries));
    if !outcome.report.is_complete() {
        eprintln!(
            "{} run(s) failed and were excluded: lambdas {:?}",
            outcome.report.failures.len(),
            outcome.report.failed_lambdas()
        );
    }
    println!(
        "saved {} in {:.2}s",
        outcome.path.display(),
        outcome.elapsed.as_secs_f64()
    );

    Ok(())
}
