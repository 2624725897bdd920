use clap::Args;
use rust_decimal::Decimal;
use serde_json::{json, Value};

use tax_engine_core::engine;
use tax_engine_core::rules::RuleCache;
use tax_engine_core::tax::{calculator::deduction_notes, ComparisonInput};
use tax_engine_core::with_metadata;

use crate::commands::{deduction_map, parse_deduction};
use crate::input;

/// Arguments for an old-versus-new regime comparison
#[derive(Args)]
pub struct CompareArgs {
    /// Path to JSON request file (overrides individual flags)
    #[arg(long)]
    pub input: Option<String>,

    /// Gross annual income in rupees
    #[arg(long)]
    pub gross_income: Option<Decimal>,

    /// Financial year, e.g. 2024-25
    #[arg(long, default_value = "2024-25")]
    pub financial_year: String,

    /// Deduction claimed under the old regime, repeatable
    #[arg(long = "deduction-old", value_name = "SECTION=AMOUNT", value_parser = parse_deduction)]
    pub deductions_old: Vec<(String, Decimal)>,

    /// Deduction claimed under the new regime, repeatable
    #[arg(long = "deduction-new", value_name = "SECTION=AMOUNT", value_parser = parse_deduction)]
    pub deductions_new: Vec<(String, Decimal)>,

    /// Gross income of the previous financial year
    #[arg(long)]
    pub previous_year_income: Option<Decimal>,
}

pub fn run_compare(args: CompareArgs, cache: &RuleCache) -> Result<Value, Box<dyn std::error::Error>> {
    let request: ComparisonInput = match input::load(args.input.as_deref())? {
        Some(request) => request,
        None => ComparisonInput {
            gross_income: args
                .gross_income
                .ok_or("--gross-income is required (or provide --input)")?,
            financial_year: args.financial_year,
            deductions_old: deduction_map(args.deductions_old),
            deductions_new: deduction_map(args.deductions_new),
            previous_year_income: args.previous_year_income,
        },
    };

    let response = engine::compare_regimes(cache, &request)?;
    let comparison = &response.comparison;
    let warnings = [&comparison.old, &comparison.new]
        .iter()
        .flat_map(|side| {
            let regime = side.tax_calculation.regime;
            deduction_notes(&side.tax_calculation)
                .into_iter()
                .map(move |note| format!("{regime}: {note}"))
        })
        .collect();

    let assumptions = json!({
        "financial_year": request.financial_year,
        "tie_break": "equal totals favour the old regime",
    });
    let output = with_metadata(
        "Independent analysis under each regime; the lower total tax wins",
        &assumptions,
        warnings,
        cache.source_name(),
        response,
    );
    Ok(serde_json::to_value(output)?)
}
