use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::rules::RuleSet;
use crate::tax::calculator::{compute, TaxpayerInput};
use crate::types::{Money, Rate, Regime};
use crate::TaxEngineResult;

/// Income levels to run against one fixed deduction declaration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimulationInput {
    pub regime: Regime,
    pub financial_year: String,
    pub incomes: Vec<Money>,
    #[serde(default)]
    pub deductions: BTreeMap<String, Money>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimulationPoint {
    pub income: Money,
    pub taxable_income: Money,
    pub total_tax: Money,
    pub effective_tax_rate: Rate,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimulationResult {
    pub regime: Regime,
    pub financial_year: String,
    pub simulations: Vec<SimulationPoint>,
}

/// Tax at each income level, in the order given. Any invalid level fails the
/// whole run.
pub fn simulate(input: &SimulationInput, rules: &RuleSet) -> TaxEngineResult<SimulationResult> {
    let simulations = input
        .incomes
        .iter()
        .map(|&income| {
            let declaration = TaxpayerInput {
                gross_income: income,
                regime: input.regime,
                financial_year: input.financial_year.clone(),
                deductions: input.deductions.clone(),
                previous_year_income: None,
            };
            compute(&declaration, rules).map(|r| SimulationPoint {
                income,
                taxable_income: r.taxable_income,
                total_tax: r.total_tax,
                effective_tax_rate: r.effective_tax_rate,
            })
        })
        .collect::<TaxEngineResult<Vec<_>>>()?;

    Ok(SimulationResult {
        regime: input.regime,
        financial_year: input.financial_year.clone(),
        simulations,
    })
}
