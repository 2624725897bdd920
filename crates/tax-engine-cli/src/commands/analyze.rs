use clap::Args;
use rust_decimal::Decimal;
use serde_json::{json, Value};

use tax_engine_core::engine;
use tax_engine_core::rules::RuleCache;
use tax_engine_core::tax::{calculator::deduction_notes, TaxpayerInput};
use tax_engine_core::{with_metadata, Regime};

use crate::commands::{deduction_map, parse_deduction};
use crate::input;

/// One taxpayer declaration, from a JSON request or from flags.
#[derive(Args)]
pub struct DeclarationArgs {
    /// Path to JSON request file (overrides individual flags)
    #[arg(long)]
    pub input: Option<String>,

    /// Gross annual income in rupees
    #[arg(long)]
    pub gross_income: Option<Decimal>,

    /// Tax regime: old or new
    #[arg(long)]
    pub regime: Option<Regime>,

    /// Financial year, e.g. 2024-25
    #[arg(long, default_value = "2024-25")]
    pub financial_year: String,

    /// Claimed deduction, repeatable
    #[arg(long = "deduction", value_name = "SECTION=AMOUNT", value_parser = parse_deduction)]
    pub deductions: Vec<(String, Decimal)>,

    /// Gross income of the previous financial year
    #[arg(long)]
    pub previous_year_income: Option<Decimal>,
}

impl DeclarationArgs {
    pub fn into_request(self) -> Result<TaxpayerInput, Box<dyn std::error::Error>> {
        if let Some(request) = input::load(self.input.as_deref())? {
            return Ok(request);
        }
        Ok(TaxpayerInput {
            gross_income: self
                .gross_income
                .ok_or("--gross-income is required (or provide --input)")?,
            regime: self
                .regime
                .ok_or("--regime is required (or provide --input)")?,
            financial_year: self.financial_year,
            deductions: deduction_map(self.deductions),
            previous_year_income: self.previous_year_income,
        })
    }
}

pub fn run_analyze(
    args: DeclarationArgs,
    cache: &RuleCache,
) -> Result<Value, Box<dyn std::error::Error>> {
    let request = args.into_request()?;
    let analysis = engine::analyze(cache, &request)?;
    let warnings = deduction_notes(&analysis.tax_calculation);

    let assumptions = json!({
        "regime": request.regime,
        "financial_year": request.financial_year,
        "rounding": "half-up to 2 decimal places on total tax",
    });
    let output = with_metadata(
        "Progressive slab tax after clipped deductions, then rebate, surcharge and cess; additive compliance risk score",
        &assumptions,
        warnings,
        cache.source_name(),
        analysis,
    );
    Ok(serde_json::to_value(output)?)
}
