//! Slab-based income-tax calculation.
//!
//! Order of operations: clip deductions to their section ceilings, derive
//! taxable income, apply progressive slabs, then rebate, surcharge and cess.
//! Total tax is rounded half-up to the paisa. All arithmetic uses
//! `rust_decimal::Decimal`.

use std::collections::BTreeMap;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::trace;

use crate::error::TaxEngineError;
use crate::rules::RuleSet;
use crate::types::{round_money, validate_financial_year, Money, Rate, Regime, MAX_AMOUNT};
use crate::TaxEngineResult;

// ---------------------------------------------------------------------------
// Input / Output
// ---------------------------------------------------------------------------

/// One taxpayer's declaration for one regime and year.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaxpayerInput {
    pub gross_income: Money,
    pub regime: Regime,
    pub financial_year: String,
    /// Claimed amount per section code, as declared. May contain sections
    /// the regime does not recognise.
    #[serde(default)]
    pub deductions: BTreeMap<String, Money>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub previous_year_income: Option<Money>,
}

impl TaxpayerInput {
    pub fn new(gross_income: Money, regime: Regime, financial_year: impl Into<String>) -> Self {
        Self {
            gross_income,
            regime,
            financial_year: financial_year.into(),
            deductions: BTreeMap::new(),
            previous_year_income: None,
        }
    }

    pub fn with_deduction(mut self, section: impl Into<String>, amount: Money) -> Self {
        self.deductions.insert(section.into(), amount);
        self
    }

    pub fn with_previous_year_income(mut self, income: Money) -> Self {
        self.previous_year_income = Some(income);
        self
    }

    /// Reject declarations no computation should run on.
    pub fn validate(&self) -> TaxEngineResult<()> {
        check_amount("gross_income", self.gross_income)?;
        if let Some(prev) = self.previous_year_income {
            check_amount("previous_year_income", prev)?;
        }
        for (section, amount) in &self.deductions {
            if section.trim().is_empty() {
                return Err(TaxEngineError::invalid(
                    "deductions",
                    "section code must not be empty",
                ));
            }
            check_amount(&format!("deductions.{section}"), *amount)?;
        }
        validate_financial_year(&self.financial_year)
    }

    /// Sum of declared amounts before any clipping or filtering.
    pub fn raw_deductions_total(&self) -> Money {
        self.deductions.values().copied().sum()
    }
}

/// How one declared section was treated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeductionLine {
    pub section_code: String,
    pub claimed: Money,
    pub allowed: Money,
    /// False when the regime has no such section; `allowed` is then zero.
    pub permitted: bool,
}

impl DeductionLine {
    pub fn was_clipped(&self) -> bool {
        self.permitted && self.allowed < self.claimed
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaxBreakdown {
    pub tax_from_slabs: Money,
    pub rebate: Money,
    pub surcharge: Money,
    pub cess: Money,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaxComputationResult {
    pub regime: Regime,
    pub financial_year: String,
    pub gross_income: Money,
    pub total_deductions_applied: Money,
    pub taxable_income: Money,
    pub tax_breakdown: TaxBreakdown,
    pub total_tax: Money,
    pub effective_tax_rate: Rate,
    pub deduction_details: Vec<DeductionLine>,
}

// ---------------------------------------------------------------------------
// Core function
// ---------------------------------------------------------------------------

/// Compute the tax owed on `input` under `rules`.
///
/// Fails only on an invalid declaration or when `rules` belongs to a
/// different regime or year than the declaration names. Every intermediate
/// quantity is clamped rather than rejected.
pub fn compute(input: &TaxpayerInput, rules: &RuleSet) -> TaxEngineResult<TaxComputationResult> {
    input.validate()?;
    if input.regime != rules.regime || input.financial_year != rules.financial_year {
        return Err(TaxEngineError::invalid(
            "regime",
            format!(
                "declaration is for {} regime FY {}, rule set is {} regime FY {}",
                input.regime, input.financial_year, rules.regime, rules.financial_year
            ),
        ));
    }

    let deduction_details = apply_deductions(input, rules);
    let total_deductions_applied: Money = deduction_details.iter().map(|d| d.allowed).sum();
    let taxable_income = (input.gross_income - total_deductions_applied).max(Decimal::ZERO);

    let tax_from_slabs = slab_tax(taxable_income, rules);

    let rebate = if taxable_income <= rules.rebate_rule.taxable_income_ceiling {
        tax_from_slabs.min(rules.rebate_rule.max_rebate_amount)
    } else {
        Decimal::ZERO
    };
    let post_rebate = (tax_from_slabs - rebate).max(Decimal::ZERO);

    let surcharge = rules
        .surcharge_band_for(taxable_income)
        .map(|band| post_rebate * band.rate)
        .unwrap_or(Decimal::ZERO);

    let cess = (post_rebate + surcharge) * rules.cess_rate;
    let total_tax = round_money(post_rebate + surcharge + cess);

    let effective_tax_rate = if input.gross_income.is_zero() {
        Decimal::ZERO
    } else {
        total_tax / input.gross_income
    };

    trace!(
        regime = %rules.regime,
        %taxable_income,
        %tax_from_slabs,
        %total_tax,
        "computed tax"
    );

    Ok(TaxComputationResult {
        regime: rules.regime,
        financial_year: rules.financial_year.clone(),
        gross_income: input.gross_income,
        total_deductions_applied,
        taxable_income,
        tax_breakdown: TaxBreakdown {
            tax_from_slabs: round_money(tax_from_slabs),
            rebate: round_money(rebate),
            surcharge: round_money(surcharge),
            cess: round_money(cess),
        },
        total_tax,
        effective_tax_rate,
        deduction_details,
    })
}

/// Human-readable notes on clipped and ignored sections, in section order.
pub fn deduction_notes(result: &TaxComputationResult) -> Vec<String> {
    result
        .deduction_details
        .iter()
        .filter_map(|line| {
            if !line.permitted {
                Some(format!(
                    "Section {} is not recognised under the {} regime; claim of {} ignored",
                    line.section_code, result.regime, line.claimed
                ))
            } else if line.was_clipped() {
                Some(format!(
                    "Section {} claim of {} clipped to its ceiling of {}",
                    line.section_code, line.claimed, line.allowed
                ))
            } else {
                None
            }
        })
        .collect()
}

/// Amounts must lie in `[0, MAX_AMOUNT]`.
fn check_amount(field: &str, amount: Money) -> TaxEngineResult<()> {
    if amount < Decimal::ZERO {
        return Err(TaxEngineError::invalid(
            field,
            format!("must be non-negative, got {amount}"),
        ));
    }
    if amount > MAX_AMOUNT {
        return Err(TaxEngineError::invalid(
            field,
            format!("must not exceed {}, got {amount}", MAX_AMOUNT),
        ));
    }
    Ok(())
}

fn apply_deductions(input: &TaxpayerInput, rules: &RuleSet) -> Vec<DeductionLine> {
    input
        .deductions
        .iter()
        .map(|(section, &claimed)| match rules.deduction(section) {
            Some(rule) => DeductionLine {
                section_code: section.clone(),
                claimed,
                allowed: rule.allowed(claimed),
                permitted: true,
            },
            None => DeductionLine {
                section_code: section.clone(),
                claimed,
                allowed: Decimal::ZERO,
                permitted: false,
            },
        })
        .collect()
}

fn slab_tax(taxable_income: Money, rules: &RuleSet) -> Money {
    rules
        .slabs
        .iter()
        .map(|slab| slab.portion_of(taxable_income) * slab.rate)
        .sum()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
