mod commands;
mod input;
mod output;

use clap::{Parser, Subcommand, ValueEnum};
use colored::Colorize;
use std::path::PathBuf;
use std::process;
use tracing_subscriber::EnvFilter;

use commands::analyze::DeclarationArgs;
use commands::compare::CompareArgs;
use commands::rules::RulesArgs;
use commands::simulate::SimulateArgs;

/// Dual-regime income-tax computation and compliance risk scoring
#[derive(Parser)]
#[command(
    name = "taxe",
    version,
    about = "Dual-regime income-tax computation and compliance risk scoring",
    long_about = "A CLI for computing Indian personal income tax under the old and new \
                  regimes with decimal precision. Supports single-regime analysis with \
                  fraud-risk scoring, regime comparison, text reports, income what-if \
                  runs, and inspection of the active rule sets."
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Output format
    #[arg(long, default_value = "json", global = true)]
    output: OutputFormat,

    /// Directory of rule artifacts to use instead of the bundled ones
    #[arg(long, env = "TAXE_RULES_DIR", global = true)]
    rules_dir: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Compute tax and score compliance risk for one declaration
    Analyze(DeclarationArgs),
    /// Compare the old and new regimes for the same income
    Compare(CompareArgs),
    /// Print a plain-text tax report
    Report(DeclarationArgs),
    /// Compute tax across several income levels
    Simulate(SimulateArgs),
    /// Show the rule sets in effect
    Rules(RulesArgs),
    /// Print version information
    Version,
}

#[derive(Debug, Clone, ValueEnum)]
pub enum OutputFormat {
    Json,
    Table,
    Csv,
    Minimal,
}

fn init_tracing() {
    let filter = EnvFilter::try_from_env("TAXE_LOG").unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn fail(e: Box<dyn std::error::Error>) -> ! {
    eprintln!("{}: {}", "error".red().bold(), e);
    process::exit(1);
}

fn main() {
    let cli = Cli::parse();
    init_tracing();

    let cache = commands::rule_cache(cli.rules_dir.as_deref());

    let result: Result<serde_json::Value, Box<dyn std::error::Error>> = match cli.command {
        Commands::Analyze(args) => commands::analyze::run_analyze(args, &cache),
        Commands::Compare(args) => commands::compare::run_compare(args, &cache),
        Commands::Simulate(args) => commands::simulate::run_simulate(args, &cache),
        Commands::Rules(args) => commands::rules::run_rules(args, &cache),
        Commands::Report(args) => match commands::report::run_report(args, &cache) {
            Ok(text) => {
                print!("{}", text);
                return;
            }
            Err(e) => fail(e),
        },
        Commands::Version => {
            println!("taxe {}", env!("CARGO_PKG_VERSION"));
            return;
        }
    };

    match result {
        Ok(value) => {
            output::format_output(&cli.output, &value);
            process::exit(0);
        }
        Err(e) => fail(e),
    }
}
