use clap::Args;
use serde_json::{json, Value};

use tax_engine_core::rules::RuleCache;
use tax_engine_core::Regime;

/// Arguments for inspecting the active rule sets
#[derive(Args)]
pub struct RulesArgs {
    /// Only this regime (default: both)
    #[arg(long)]
    pub regime: Option<Regime>,

    /// Financial year, e.g. 2024-25
    #[arg(long, default_value = "2024-25")]
    pub financial_year: String,
}

pub fn run_rules(args: RulesArgs, cache: &RuleCache) -> Result<Value, Box<dyn std::error::Error>> {
    let regimes = match args.regime {
        Some(regime) => vec![regime],
        None => Regime::ALL.to_vec(),
    };

    let mut rule_sets = Vec::with_capacity(regimes.len());
    for regime in regimes {
        let rules = cache.get(regime, &args.financial_year)?;
        rule_sets.push(serde_json::to_value(rules.as_ref())?);
    }

    Ok(json!({
        "source": cache.source_name(),
        "financial_year": args.financial_year,
        "rule_sets": rule_sets,
    }))
}
