use clap::Parser;
use diploid_core::summary::{format_table, summarize};
use diploid_data::SweepResult;
use diploid_io::{load_sweep, to_json_pretty};

#[derive(Parser, Debug)]
#[command(author, version, about = "Summarize a saved diploid sweep", long_about = None)]
struct Args {
    /// Artifact written by `diploid` (results<rule>.rkyv or .json.gz)
    #[arg(default_value = "results110.rkyv")]
    input: String,

    /// Number of trailing density samples averaged per run
    #[arg(short, long, default_value_t = 50)]
    tail: usize,

    /// Print summaries as JSON instead of a table
    #[arg(long)]
    json: bool,

    /// Also print the density series of the run closest to this lambda
    #[arg(short, long)]
    lambda: Option<f64>,
}

fn closest_run(result: &SweepResult, lambda: f64) -> Option<&diploid_data::RunResult> {
    result.iter().min_by(|a, b| {
        (a.lambda - lambda)
            .abs()
            .total_cmp(&(b.lambda - lambda).abs())
    })
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    let result = load_sweep(&args.input)?;
    let summaries = summarize(&result, args.tail.max(1));

    if args.json {
        println!("{}", to_json_pretty(&summaries)?);
    } else {
        let header = &result.header;
        println!(
            "rule {} | {} cells x {} steps | {} runs | seed {} | {}",
            header.rule,
            header.cells,
            header.end_time,
            result.len(),
            header
                .seed
                .map_or_else(|| "none".to_string(), |s| s.to_string()),
            header.created_at
        );
        print!("{}", format_table(&summaries));
    }

    if let Some(lambda) = args.lambda {
        match closest_run(&result, lambda) {
            Some(run) => {
                println!("\ndensity series for lambda = {}:", run.lambda);
                for (t, d) in run.density.iter().enumerate() {
                    println!("{t}\t{d:.4}");
                }
            }
            None => println!("\nNo runs in {}.", args.input),
        }
    }

    Ok(())
}
