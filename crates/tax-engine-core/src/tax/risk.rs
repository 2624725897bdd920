//! Heuristic fraud / non-compliance scoring.
//!
//! Five independent checks each add a fixed weight to a running score that
//! is capped at 1.0. The score maps to a LOW / MEDIUM / HIGH band and a 0-100
//! compliance score. Recommendations are fixed templates keyed by the check
//! that fired, so the same input always yields the same text.

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use crate::rules::RuleSet;
use crate::tax::calculator::{TaxComputationResult, TaxpayerInput};
use crate::types::{Money, Rate, RiskLevel};

// ---------------------------------------------------------------------------
// Weights and thresholds
// ---------------------------------------------------------------------------

const HIGH_RATIO: Rate = dec!(0.5);
const VERY_HIGH_RATIO: Rate = dec!(0.7);
const HIGH_RATIO_WEIGHT: Decimal = dec!(0.3);
const VERY_HIGH_RATIO_WEIGHT: Decimal = dec!(0.2);

const CLUSTER_MIN_SECTIONS: usize = 3;
const CLUSTER_WEIGHT: Decimal = dec!(0.25);

const VOLATILITY_THRESHOLD: Rate = dec!(0.5);
const VOLATILITY_WEIGHT: Decimal = dec!(0.1);

const INVALID_SECTION_WEIGHT: Decimal = dec!(0.2);

const PRIMARY_INVESTMENT_INCOME_FLOOR: Money = dec!(500000);
const PRIMARY_INVESTMENT_WEIGHT: Decimal = dec!(0.15);

const LOW_CEILING: Decimal = dec!(0.3);
const MEDIUM_CEILING: Decimal = dec!(0.6);

// ---------------------------------------------------------------------------
// Output
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RiskCheck {
    DeductionRatio,
    MaxLimitClustering,
    IncomeVolatility,
    RegimeInvalidDeduction,
    AnomalousInvestmentClaim,
}

impl RiskCheck {
    pub fn recommendation(&self) -> &'static str {
        match self {
            RiskCheck::DeductionRatio => {
                "Verify that every deduction claim is backed by proper documentation"
            }
            RiskCheck::MaxLimitClustering => {
                "Recompute deductions from actual receipts instead of rounding claims up to section limits"
            }
            RiskCheck::IncomeVolatility => {
                "Keep records that explain the change in income from the previous year"
            }
            RiskCheck::RegimeInvalidDeduction => {
                "Remove deductions not permitted under the declared regime"
            }
            RiskCheck::AnomalousInvestmentClaim => {
                "Confirm the source of funds for investments claimed at the section limit on a low income"
            }
        }
    }
}

/// One fired check and what it contributed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RiskSignal {
    pub check: RiskCheck,
    pub description: String,
    pub weight: Decimal,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FraudAssessment {
    pub risk_score: Decimal,
    pub risk_level: RiskLevel,
    pub compliance_score: u32,
    pub flags: Vec<String>,
    pub recommendations: Vec<String>,
    pub signals: Vec<RiskSignal>,
}

// ---------------------------------------------------------------------------
// Core function
// ---------------------------------------------------------------------------

/// Score `input` for compliance risk under `rules`.
///
/// Works from the raw declaration, not the clipped figures: an over-ceiling
/// or regime-invalid claim is exactly what the checks look for. `result`
/// supplies the gross income the calculator accepted.
pub fn assess(
    input: &TaxpayerInput,
    rules: &RuleSet,
    result: &TaxComputationResult,
) -> FraudAssessment {
    let gross = result.gross_income;
    let mut signals: Vec<RiskSignal> = Vec::new();

    // 1. Deduction-to-income ratio; saturates when gross is vanishingly small
    let ratio = if gross.is_zero() {
        Decimal::ZERO
    } else {
        input
            .raw_deductions_total()
            .checked_div(gross)
            .unwrap_or(Decimal::MAX)
    };
    if ratio > HIGH_RATIO {
        let (weight, band) = if ratio > VERY_HIGH_RATIO {
            (HIGH_RATIO_WEIGHT + VERY_HIGH_RATIO_WEIGHT, "Very high")
        } else {
            (HIGH_RATIO_WEIGHT, "High")
        };
        signals.push(RiskSignal {
            check: RiskCheck::DeductionRatio,
            description: format!(
                "{band} deduction-to-income ratio ({:.1}% of gross income)",
                percent(ratio)
            ),
            weight,
        });
    }

    // 2. Several sections claimed at exactly their ceiling
    let at_limit: Vec<&str> = input
        .deductions
        .iter()
        .filter(|&(section, &claimed)| {
            claimed > Decimal::ZERO
                && rules
                    .deduction(section)
                    .and_then(|rule| rule.max_limit)
                    .is_some_and(|limit| claimed == limit)
        })
        .map(|(section, _)| section.as_str())
        .collect();
    if at_limit.len() >= CLUSTER_MIN_SECTIONS {
        signals.push(RiskSignal {
            check: RiskCheck::MaxLimitClustering,
            description: format!(
                "Multiple deductions claimed at exactly their maximum limit ({} sections: {})",
                at_limit.len(),
                at_limit.join(", ")
            ),
            weight: CLUSTER_WEIGHT,
        });
    }

    // 3. Year-over-year income swing
    if let Some(prev) = input.previous_year_income.filter(|p| *p > Decimal::ZERO) {
        let change = (gross - prev).abs().checked_div(prev).unwrap_or(Decimal::MAX);
        if change > VOLATILITY_THRESHOLD {
            signals.push(RiskSignal {
                check: RiskCheck::IncomeVolatility,
                description: format!(
                    "Significant income change from previous year ({:.1}%)",
                    percent(change)
                ),
                weight: VOLATILITY_WEIGHT,
            });
        }
    }

    // 4. Sections the regime does not allow, one signal each
    for (section, &claimed) in &input.deductions {
        if claimed > Decimal::ZERO && !rules.permits(section) {
            signals.push(RiskSignal {
                check: RiskCheck::RegimeInvalidDeduction,
                description: format!(
                    "Deduction {section} is not permitted under the {} regime",
                    rules.regime
                ),
                weight: INVALID_SECTION_WEIGHT,
            });
        }
    }

    // 5. Primary investment section maxed out on a low income
    let primary = rules.primary_investment_section.as_str();
    let primary_maxed = rules
        .deduction(primary)
        .and_then(|rule| rule.max_limit)
        .zip(input.deductions.get(primary))
        .is_some_and(|(limit, &claimed)| claimed > Decimal::ZERO && claimed == limit);
    if primary_maxed && gross < PRIMARY_INVESTMENT_INCOME_FLOOR {
        signals.push(RiskSignal {
            check: RiskCheck::AnomalousInvestmentClaim,
            description: format!(
                "Section {primary} claimed at its maximum with gross income below {}",
                PRIMARY_INVESTMENT_INCOME_FLOOR
            ),
            weight: PRIMARY_INVESTMENT_WEIGHT,
        });
    }

    let risk_score = signals
        .iter()
        .map(|s| s.weight)
        .sum::<Decimal>()
        .min(Decimal::ONE);

    let risk_level = match risk_score {
        s if s <= LOW_CEILING => RiskLevel::Low,
        s if s <= MEDIUM_CEILING => RiskLevel::Medium,
        _ => RiskLevel::High,
    };

    let compliance_score = ((Decimal::ONE - risk_score) * dec!(100))
        .round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero)
        .to_u32()
        .unwrap_or(0);

    let mut recommendations: Vec<String> = Vec::new();
    let mut seen: Vec<RiskCheck> = Vec::new();
    for signal in &signals {
        if !seen.contains(&signal.check) {
            seen.push(signal.check);
            recommendations.push(signal.check.recommendation().to_string());
        }
    }

    FraudAssessment {
        risk_score,
        risk_level,
        compliance_score,
        flags: signals.iter().map(|s| s.description.clone()).collect(),
        recommendations,
        signals,
    }
}

fn percent(ratio: Rate) -> Decimal {
    ratio
        .checked_mul(dec!(100))
        .unwrap_or(Decimal::MAX)
        .round_dp_with_strategy(1, RoundingStrategy::MidpointAwayFromZero)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
