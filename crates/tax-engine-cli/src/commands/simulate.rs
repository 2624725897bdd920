use clap::Args;
use rust_decimal::Decimal;
use serde_json::{json, Value};

use tax_engine_core::engine;
use tax_engine_core::rules::RuleCache;
use tax_engine_core::tax::SimulationInput;
use tax_engine_core::{with_metadata, Regime};

use crate::commands::{deduction_map, parse_deduction};
use crate::input;

/// Arguments for an income what-if run
#[derive(Args)]
pub struct SimulateArgs {
    /// Path to JSON request file (overrides individual flags)
    #[arg(long)]
    pub input: Option<String>,

    /// Tax regime: old or new
    #[arg(long)]
    pub regime: Option<Regime>,

    /// Financial year, e.g. 2024-25
    #[arg(long, default_value = "2024-25")]
    pub financial_year: String,

    /// Comma-separated gross income levels
    #[arg(long, value_delimiter = ',')]
    pub incomes: Vec<Decimal>,

    /// Claimed deduction applied at every level, repeatable
    #[arg(long = "deduction", value_name = "SECTION=AMOUNT", value_parser = parse_deduction)]
    pub deductions: Vec<(String, Decimal)>,
}

pub fn run_simulate(args: SimulateArgs, cache: &RuleCache) -> Result<Value, Box<dyn std::error::Error>> {
    let request: SimulationInput = match input::load(args.input.as_deref())? {
        Some(request) => request,
        None => {
            if args.incomes.is_empty() {
                return Err("--incomes is required (or provide --input)".into());
            }
            SimulationInput {
                regime: args
                    .regime
                    .ok_or("--regime is required (or provide --input)")?,
                financial_year: args.financial_year,
                incomes: args.incomes,
                deductions: deduction_map(args.deductions),
            }
        }
    };

    let result = engine::simulate(cache, &request)?;
    let assumptions = json!({
        "regime": request.regime,
        "financial_year": request.financial_year,
        "deductions": request.deductions,
    });
    let output = with_metadata(
        "Tax computed independently at each income level with a fixed deduction declaration",
        &assumptions,
        Vec::new(),
        cache.source_name(),
        result,
    );
    Ok(serde_json::to_value(output)?)
}
