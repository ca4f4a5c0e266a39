//! GMWB Pricer CLI
//!
//! Prices a GMWB rider over successive grid refinements and prints the value
//! surface on the reporting grid

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use gmwb_pricer::pricing::{write_surface_csv, LevelResult, PricingConfig, PricingEngine};

#[derive(Parser, Debug)]
#[command(
    name = "gmwb_pricer",
    about = "Impulse-control PDE pricer for GMWB riders"
)]
struct Args {
    #[arg(long, help = "JSON pricing configuration; defaults to the reference contract")]
    config: Option<PathBuf>,
    #[arg(long, help = "Number of refinement levels")]
    refinement: Option<usize>,
    #[arg(long, help = "Timesteps at the coarsest level")]
    timesteps: Option<usize>,
    #[arg(long, help = "Control intervals at the coarsest level")]
    controls: Option<usize>,
    #[arg(long, help = "Write the finest surface as CSV")]
    output: Option<PathBuf>,
    #[arg(long, default_value_t = false, help = "Print level results as JSON")]
    json: bool,
}

fn main() -> Result<()> {
    env_logger::init();

    let args = Args::parse();

    let mut config = match &args.config {
        Some(path) => PricingConfig::from_json_path(path)
            .with_context(|| format!("failed to load config {}", path.display()))?,
        None => PricingConfig::default(),
    };
    if let Some(refinement) = args.refinement {
        config.refinement = refinement;
    }
    if let Some(timesteps) = args.timesteps {
        config.timesteps = timesteps;
    }
    if let Some(controls) = args.controls {
        config.control_intervals = controls;
    }

    let engine = PricingEngine::new(config).context("invalid pricing configuration")?;
    let results = engine.run().context("pricing failed")?;

    if args.json {
        let summaries: Vec<_> = results.iter().map(LevelResult::summary).collect();
        println!("{}", serde_json::to_string_pretty(&summaries)?);
    } else {
        println!("GMWB Pricer v0.1.0");
        println!("==================\n");
        for result in &results {
            print_surface(result);
        }
    }

    if let Some(path) = &args.output {
        let finest = results.last().context("no refinement levels were priced")?;
        write_surface_csv(finest, path)
            .with_context(|| format!("failed to write {}", path.display()))?;
        println!("\nSurface written to: {}", path.display());
    }

    Ok(())
}

fn print_surface(result: &LevelResult) {
    let summary = result.summary();
    println!(
        "Level {} ({} x {} nodes, {} controls, {} steps)",
        summary.level,
        summary.investment_nodes,
        summary.withdrawal_nodes,
        summary.controls,
        summary.timesteps
    );

    // Surface points run over S fastest, so each W block is one row
    let mut withdrawals: Vec<f64> = result.surface.iter().map(|p| p.withdrawal).collect();
    withdrawals.dedup();
    let columns = result.surface.len() / withdrawals.len().max(1);

    print!("{:>8}", "W \\ S");
    for point in result.surface.iter().take(columns) {
        print!(" {:>10.1}", point.investment);
    }
    println!();
    println!("{}", "-".repeat(8 + 11 * columns));

    for row in result.surface.chunks(columns.max(1)) {
        if let Some(first) = row.first() {
            print!("{:>8.1}", first.withdrawal);
        }
        for point in row {
            print!(" {:>10.4}", point.value);
        }
        println!();
    }

    println!(
        "\nInner iterations: {:.2} average, {} max, {} steps non-converged\n",
        summary.average_iterations, summary.max_iterations, summary.non_converged_steps
    );
}
