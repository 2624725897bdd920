//! Request-level entry points.
//!
//! Each function validates the request, resolves rule sets through the
//! caller's [`RuleCache`], then hands off to the pure functions in
//! [`crate::tax`]. Request and response types here are the JSON contract with
//! presentation layers.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::rules::RuleCache;
use crate::tax::{
    self, ComparisonInput, ComparisonResult, SimulationInput, SimulationResult, TaxAnalysis,
    TaxpayerInput,
};
use crate::types::{validate_financial_year, Regime};
use crate::{TaxEngineError, TaxEngineResult};

/// Envelope for a regime comparison: `{"comparison": {...}}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComparisonResponse {
    pub comparison: ComparisonResult,
}

/// Tax calculation and fraud analysis for one declaration.
pub fn analyze(cache: &RuleCache, input: &TaxpayerInput) -> TaxEngineResult<TaxAnalysis> {
    input.validate()?;
    let rules = cache.get(input.regime, &input.financial_year)?;
    let analysis = tax::analyze(input, &rules)?;
    debug!(
        regime = %input.regime,
        financial_year = %input.financial_year,
        total_tax = %analysis.tax_calculation.total_tax,
        risk_level = %analysis.fraud_analysis.risk_level,
        "analysed declaration"
    );
    Ok(analysis)
}

/// Both regimes side by side with the cheaper one picked.
pub fn compare_regimes(
    cache: &RuleCache,
    input: &ComparisonInput,
) -> TaxEngineResult<ComparisonResponse> {
    for regime in Regime::ALL {
        input.declaration_for(regime).validate()?;
    }
    let old_rules = cache.get(Regime::Old, &input.financial_year)?;
    let new_rules = cache.get(Regime::New, &input.financial_year)?;
    let comparison = tax::compare(input, &old_rules, &new_rules)?;
    debug!(
        financial_year = %input.financial_year,
        better_regime = %comparison.better_regime,
        savings = %comparison.savings,
        "compared regimes"
    );
    Ok(ComparisonResponse { comparison })
}

/// Text report for one declaration.
pub fn report(cache: &RuleCache, input: &TaxpayerInput) -> TaxEngineResult<String> {
    let analysis = analyze(cache, input)?;
    Ok(tax::format_report(
        &analysis.tax_calculation,
        &analysis.fraud_analysis,
    ))
}

/// Tax across a range of incomes under one regime.
pub fn simulate(cache: &RuleCache, input: &SimulationInput) -> TaxEngineResult<SimulationResult> {
    validate_financial_year(&input.financial_year)?;
    if let Some(income) = input.incomes.iter().find(|i| i.is_sign_negative() && !i.is_zero()) {
        return Err(TaxEngineError::InvalidInput {
            field: "incomes".into(),
            reason: format!("income levels must be non-negative, got {income}"),
        });
    }
    let rules = cache.get(input.regime, &input.financial_year)?;
    tax::simulate(input, &rules)
}

#[cfg(all(test, feature = "bundled-rules"))]
mod tests {
    use super::*;
    use crate::rules::MemoryRuleSource;
    use rust_decimal_macros::dec;
    use std::collections::BTreeMap;

    #[test]
    fn test_invalid_input_rejected_before_rule_lookup() {
        // An empty source would answer RuleNotFound; validation must win.
        let cache = RuleCache::new(MemoryRuleSource::new());
        let input = TaxpayerInput::new(dec!(-10), Regime::Old, "2024-25");
        let err = analyze(&cache, &input).unwrap_err();
        assert!(matches!(err, TaxEngineError::InvalidInput { .. }));
        assert!(cache.is_empty());
    }

    #[test]
    fn test_extreme_amounts_are_errors_not_panics() {
        let cache = RuleCache::bundled();
        let huge = rust_decimal::Decimal::from_scientific("5e28").unwrap();
        let input = TaxpayerInput::new(dec!(1_000_000), Regime::Old, "2024-25")
            .with_deduction("80G", huge)
            .with_deduction("80E", huge);
        assert!(matches!(
            analyze(&cache, &input).unwrap_err(),
            TaxEngineError::InvalidInput { .. }
        ));

        let very_large = rust_decimal::Decimal::from_scientific("1e20").unwrap();
        let input = TaxpayerInput::new(dec!(0.0000000001), Regime::New, "2024-25")
            .with_deduction("StandardDeduction", very_large);
        assert!(matches!(
            analyze(&cache, &input).unwrap_err(),
            TaxEngineError::InvalidInput { .. }
        ));

        // Same shape inside the accepted range analyses normally
        let input = TaxpayerInput::new(dec!(0.0000000001), Regime::New, "2024-25")
            .with_deduction("StandardDeduction", crate::types::MAX_AMOUNT);
        let analysis = analyze(&cache, &input).unwrap();
        assert_eq!(analysis.tax_calculation.total_tax, dec!(0));
        assert_eq!(analysis.fraud_analysis.risk_score, dec!(0.5));

        let input = SimulationInput {
            regime: Regime::Old,
            financial_year: "2024-25".into(),
            incomes: vec![dec!(500_000), huge],
            deductions: BTreeMap::new(),
        };
        assert!(matches!(
            simulate(&cache, &input).unwrap_err(),
            TaxEngineError::InvalidInput { .. }
        ));
    }

    #[test]
    fn test_unknown_year_is_rule_not_found() {
        let cache = RuleCache::bundled();
        let input = TaxpayerInput::new(dec!(10), Regime::Old, "2019-20");
        let err = analyze(&cache, &input).unwrap_err();
        assert!(matches!(err, TaxEngineError::RuleNotFound { .. }));
    }

    #[test]
    fn test_compare_loads_both_regimes_once() {
        let cache = RuleCache::bundled();
        let input = ComparisonInput {
            gross_income: dec!(900_000),
            financial_year: "2024-25".into(),
            deductions_old: BTreeMap::new(),
            deductions_new: BTreeMap::new(),
            previous_year_income: None,
        };
        compare_regimes(&cache, &input).unwrap();
        compare_regimes(&cache, &input).unwrap();
        assert_eq!(cache.len(), 2);
    }

    #[test]
    fn test_comparison_response_shape() {
        let cache = RuleCache::bundled();
        let input = ComparisonInput {
            gross_income: dec!(900_000),
            financial_year: "2024-25".into(),
            deductions_old: BTreeMap::new(),
            deductions_new: BTreeMap::new(),
            previous_year_income: None,
        };
        let value = serde_json::to_value(compare_regimes(&cache, &input).unwrap()).unwrap();
        let comparison = &value["comparison"];
        assert!(comparison["old"]["tax_calculation"].is_object());
        assert!(comparison["new"]["fraud_analysis"].is_object());
        assert_eq!(comparison["better_regime"], "new");
    }

    #[test]
    fn test_simulate_rejects_negative_levels() {
        let cache = RuleCache::bundled();
        let input = SimulationInput {
            regime: Regime::New,
            financial_year: "2024-25".into(),
            incomes: vec![dec!(1), dec!(-1)],
            deductions: BTreeMap::new(),
        };
        assert!(matches!(
            simulate(&cache, &input).unwrap_err(),
            TaxEngineError::InvalidInput { .. }
        ));
    }
}
