#![cfg(feature = "bundled-rules")]

use std::collections::BTreeMap;

use proptest::prelude::*;
use rust_decimal::Decimal;
use tax_engine_core::engine;
use tax_engine_core::rules::RuleCache;
use tax_engine_core::tax::{ComparisonInput, TaxpayerInput};
use tax_engine_core::Regime;

const SECTIONS: &[&str] = &[
    "80C",
    "80D",
    "80G",
    "80E",
    "80TTA",
    "24(b)",
    "80CCD(2)",
    "StandardDeduction",
    "80Z",
];

/// Whole rupees up to ten crore.
fn rupees() -> impl Strategy<Value = Decimal> {
    (0u64..100_000_000).prop_map(Decimal::from)
}

/// Amounts with paise.
fn money() -> impl Strategy<Value = Decimal> {
    (0i64..10_000_000_000).prop_map(|paise| Decimal::new(paise, 2))
}

fn claims() -> impl Strategy<Value = BTreeMap<String, Decimal>> {
    proptest::collection::btree_map(
        proptest::sample::select(SECTIONS).prop_map(str::to_string),
        (0u64..1_000_000).prop_map(Decimal::from),
        0..6,
    )
}

fn regime() -> impl Strategy<Value = Regime> {
    prop_oneof![Just(Regime::Old), Just(Regime::New)]
}

fn declaration(
    gross: Decimal,
    regime: Regime,
    deductions: BTreeMap<String, Decimal>,
) -> TaxpayerInput {
    TaxpayerInput {
        gross_income: gross,
        regime,
        financial_year: "2024-25".into(),
        deductions,
        previous_year_income: None,
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(128))]

    /// Identical declarations give identical analyses.
    #[test]
    fn analysis_is_deterministic(gross in money(), regime in regime(), deductions in claims()) {
        let cache = RuleCache::bundled();
        let input = declaration(gross, regime, deductions);
        let a = engine::analyze(&cache, &input).unwrap();
        let b = engine::analyze(&cache, &input).unwrap();
        prop_assert_eq!(&a, &b);
        prop_assert_eq!(
            engine::report(&cache, &input).unwrap(),
            engine::report(&cache, &input).unwrap()
        );
    }

    /// More income never means less tax for the same deductions.
    #[test]
    fn tax_is_monotonic_in_income(
        low in rupees(),
        extra in rupees(),
        regime in regime(),
        deductions in claims(),
    ) {
        let cache = RuleCache::bundled();
        let a = engine::analyze(&cache, &declaration(low, regime, deductions.clone())).unwrap();
        let b = engine::analyze(&cache, &declaration(low + extra, regime, deductions)).unwrap();
        prop_assert!(a.tax_calculation.total_tax <= b.tax_calculation.total_tax);
    }

    /// Claiming above a ceiling applies exactly the ceiling.
    #[test]
    fn clipping_is_idempotent(gross in rupees(), over in 0u64..5_000_000) {
        let cache = RuleCache::bundled();
        let rules = cache.get(Regime::Old, "2024-25").unwrap();
        for rule in rules.deductions.iter().filter(|r| r.max_limit.is_some()) {
            let limit = rule.max_limit.unwrap_or_default();
            let at = declaration(
                gross,
                Regime::Old,
                BTreeMap::from([(rule.section_code.clone(), limit)]),
            );
            let above = declaration(
                gross,
                Regime::Old,
                BTreeMap::from([(rule.section_code.clone(), limit + Decimal::from(over))]),
            );
            let at = engine::analyze(&cache, &at).unwrap().tax_calculation;
            let above = engine::analyze(&cache, &above).unwrap().tax_calculation;
            prop_assert_eq!(at.total_deductions_applied, above.total_deductions_applied);
            prop_assert_eq!(at.total_tax, above.total_tax);
        }
    }

    /// Figures stay inside their natural bounds.
    #[test]
    fn figures_are_bounded(
        gross in money(),
        regime in regime(),
        deductions in claims(),
        previous in proptest::option::of(rupees()),
    ) {
        let cache = RuleCache::bundled();
        let mut input = declaration(gross, regime, deductions);
        input.previous_year_income = previous;
        let a = engine::analyze(&cache, &input).unwrap();

        let tax = &a.tax_calculation;
        prop_assert!(tax.taxable_income >= Decimal::ZERO);
        prop_assert!(tax.taxable_income <= tax.gross_income);
        prop_assert!(tax.total_tax >= Decimal::ZERO);
        prop_assert!(tax.total_tax <= tax.gross_income);
        prop_assert!(tax.tax_breakdown.rebate <= tax.tax_breakdown.tax_from_slabs);
        prop_assert_eq!(tax.total_tax.round_dp(2), tax.total_tax);

        let risk = &a.fraud_analysis;
        prop_assert!(risk.risk_score >= Decimal::ZERO);
        prop_assert!(risk.risk_score <= Decimal::ONE);
        prop_assert!(risk.compliance_score <= 100);
        prop_assert_eq!(risk.flags.len(), risk.signals.len());
        prop_assert!(risk.recommendations.len() <= risk.flags.len());
        prop_assert_eq!(risk.flags.is_empty(), risk.recommendations.is_empty());
    }

    /// The comparator picks the cheaper regime and reports the gap.
    #[test]
    fn comparison_is_consistent(
        gross in rupees(),
        deductions_old in claims(),
        deductions_new in claims(),
    ) {
        let cache = RuleCache::bundled();
        let input = ComparisonInput {
            gross_income: gross,
            financial_year: "2024-25".into(),
            deductions_old: deductions_old.clone(),
            deductions_new: deductions_new.clone(),
            previous_year_income: None,
        };
        let c = engine::compare_regimes(&cache, &input).unwrap().comparison;
        let old_tax = c.old.tax_calculation.total_tax;
        let new_tax = c.new.tax_calculation.total_tax;

        prop_assert_eq!(c.savings, (old_tax - new_tax).abs());
        let expected = if old_tax <= new_tax { Regime::Old } else { Regime::New };
        prop_assert_eq!(c.better_regime, expected);

        // Each side matches a standalone analysis
        let old = engine::analyze(&cache, &declaration(gross, Regime::Old, deductions_old)).unwrap();
        let new = engine::analyze(&cache, &declaration(gross, Regime::New, deductions_new)).unwrap();
        prop_assert_eq!(&c.old, &old);
        prop_assert_eq!(&c.new, &new);
    }
}
