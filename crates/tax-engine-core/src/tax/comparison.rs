use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::TaxEngineError;
use crate::rules::RuleSet;
use crate::tax::calculator::TaxpayerInput;
use crate::tax::{analyze, TaxAnalysis};
use crate::types::{Money, Regime};
use crate::TaxEngineResult;

/// One income declared twice, once per regime, each with its own deductions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComparisonInput {
    pub gross_income: Money,
    pub financial_year: String,
    #[serde(default)]
    pub deductions_old: BTreeMap<String, Money>,
    #[serde(default)]
    pub deductions_new: BTreeMap<String, Money>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub previous_year_income: Option<Money>,
}

impl ComparisonInput {
    /// The single-regime declaration this comparison implies for `regime`.
    pub fn declaration_for(&self, regime: Regime) -> TaxpayerInput {
        let deductions = match regime {
            Regime::Old => self.deductions_old.clone(),
            Regime::New => self.deductions_new.clone(),
        };
        TaxpayerInput {
            gross_income: self.gross_income,
            regime,
            financial_year: self.financial_year.clone(),
            deductions,
            previous_year_income: self.previous_year_income,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComparisonResult {
    pub old: TaxAnalysis,
    pub new: TaxAnalysis,
    pub better_regime: Regime,
    pub savings: Money,
}

/// Analyse the declaration under both regimes and pick the cheaper one.
///
/// The two runs share nothing. Equal totals favour the old regime.
pub fn compare(
    input: &ComparisonInput,
    old_rules: &RuleSet,
    new_rules: &RuleSet,
) -> TaxEngineResult<ComparisonResult> {
    if old_rules.regime != Regime::Old || new_rules.regime != Regime::New {
        return Err(TaxEngineError::invalid(
            "rules",
            format!(
                "expected old and new rule sets, got {} and {}",
                old_rules.regime, new_rules.regime
            ),
        ));
    }

    let old = analyze(&input.declaration_for(Regime::Old), old_rules)?;
    let new = analyze(&input.declaration_for(Regime::New), new_rules)?;

    let old_tax = old.tax_calculation.total_tax;
    let new_tax = new.tax_calculation.total_tax;
    let better_regime = if old_tax <= new_tax {
        Regime::Old
    } else {
        Regime::New
    };
    let savings = (old_tax - new_tax).abs();

    Ok(ComparisonResult {
        old,
        new,
        better_regime,
        savings,
    })
}
