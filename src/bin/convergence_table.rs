//! Convergence study at a single (S, W) point
//!
//! Prints the value per refinement level with successive changes and their
//! ratios

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use gmwb_pricer::pricing::{convergence_table, PricingConfig, PricingEngine};

#[derive(Parser, Debug)]
#[command(
    name = "convergence_table",
    about = "Value of a GMWB rider at one point across grid refinements"
)]
struct Args {
    #[arg(long)]
    config: Option<PathBuf>,
    #[arg(long, default_value_t = 100.0)]
    investment: f64,
    #[arg(long, default_value_t = 100.0)]
    withdrawal: f64,
    #[arg(long, default_value_t = 3)]
    refinement: usize,
}

fn main() -> Result<()> {
    env_logger::init();

    let args = Args::parse();
    let mut config = match &args.config {
        Some(path) => PricingConfig::from_json_path(path)
            .with_context(|| format!("failed to load config {}", path.display()))?,
        None => PricingConfig::default(),
    };
    config.refinement = args.refinement;

    let engine = PricingEngine::new(config)?;
    let results = engine.run()?;
    let rows = convergence_table(&results, args.investment, args.withdrawal)?;

    println!(
        "Convergence at S = {:.2}, W = {:.2}",
        args.investment, args.withdrawal
    );
    println!(
        "{:>5} {:>8} {:>6} {:>14} {:>12} {:>8}",
        "Level", "Nodes", "Steps", "Value", "Change", "Ratio"
    );
    println!("{}", "-".repeat(58));

    for row in &rows {
        let change = row.change.map_or_else(String::new, |c| format!("{c:.6}"));
        let ratio = row.ratio.map_or_else(String::new, |r| format!("{r:.2}"));
        println!(
            "{:>5} {:>8} {:>6} {:>14.6} {:>12} {:>8}",
            row.level, row.nodes, row.timesteps, row.value, change, ratio
        );
    }

    Ok(())
}
