/// Investment selection tool: reads a lot table and writes the
/// energy-maximising set of non-water lots that fits the budget.
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;

use lotplan_core::config::PipelineConfig;
use lotplan_core::pipeline;
use lotplan_core::selection::{DynamicProgramming, SelectionPlan};

#[derive(Parser, Debug)]
#[command(
    name = "select_lots",
    about = "Choose the lots that maximise energy within a fraction of total market value"
)]
struct Args {
    /// Lot table produced by extract_lots (.csv or .json)
    #[arg(short, long, default_value = "Ket_Qua_Phan_Tich.csv")]
    input: PathBuf,

    /// Plan output (.csv or .json)
    #[arg(short, long, default_value = "Ke_Hoach_Dau_Tu_Final.csv")]
    output: PathBuf,

    /// JSON config file; flags below override its values
    #[arg(long)]
    config: Option<PathBuf>,

    /// Share of total lot cost available as budget
    #[arg(long)]
    budget_fraction: Option<f64>,

    /// Stop the solver after this many milliseconds and keep the best plan found
    #[arg(long)]
    time_limit_ms: Option<u64>,
}

fn resolve_config(args: &Args) -> Result<PipelineConfig> {
    let mut config = match &args.config {
        Some(path) => PipelineConfig::load(path)
            .with_context(|| format!("Cannot load config {}", path.display()))?,
        None => PipelineConfig::default(),
    };
    if let Some(f) = args.budget_fraction {
        config.selection.budget_fraction = f;
    }
    if args.time_limit_ms.is_some() {
        config.selection.time_limit_ms = args.time_limit_ms;
    }
    config.validate().context("Invalid parameters")?;
    Ok(config)
}

fn print_summary(plan: &SelectionPlan) {
    println!("Budget:        {:.2}", plan.budget);
    println!("Total invest:  {}", plan.total_cost);
    println!("Total energy:  {:.2}", plan.total_energy);
    println!("Lots selected: {}", plan.count);
    if !plan.is_optimal() {
        println!("Status:        {:?} (best plan found, optimality not proven)", plan.status);
    }
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let args = Args::parse();
    let config = resolve_config(&args)?;

    let solver = DynamicProgramming::new(config.selection.time_limit());
    let plan = pipeline::select_from_file(&args.input, &args.output, &solver, &config.selection)
        .with_context(|| format!("Selection from {} failed", args.input.display()))?;

    print_summary(&plan);
    if plan.count == 0 {
        eprintln!("[select_lots] no lot fits the budget; wrote an empty plan");
    }
    eprintln!("[select_lots] plan → {}", args.output.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_file_names() {
        let args = Args::parse_from(["select_lots"]);
        assert_eq!(args.input, PathBuf::from("Ket_Qua_Phan_Tich.csv"));
        assert_eq!(args.output, PathBuf::from("Ke_Hoach_Dau_Tu_Final.csv"));
        let c = resolve_config(&args).unwrap();
        assert_eq!(c.selection.budget_fraction, 0.15);
        assert_eq!(c.selection.time_limit_ms, None);
    }

    #[test]
    fn budget_flag_overrides() {
        let args = Args::parse_from(["select_lots", "--budget-fraction", "0.3", "--time-limit-ms", "500"]);
        let c = resolve_config(&args).unwrap();
        assert_eq!(c.selection.budget_fraction, 0.3);
        assert_eq!(c.selection.time_limit_ms, Some(500));
    }

    #[test]
    fn negative_budget_rejected() {
        let args = Args::parse_from(["select_lots", "--budget-fraction=-1"]);
        assert!(resolve_config(&args).is_err());
    }
}
