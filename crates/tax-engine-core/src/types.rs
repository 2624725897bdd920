use std::fmt;
use std::str::FromStr;

use rust_decimal::{Decimal, RoundingStrategy};
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use crate::error::TaxEngineError;
use crate::TaxEngineResult;

/// All monetary values, in rupees. Wraps Decimal to prevent accidental f64 usage.
pub type Money = Decimal;

/// Rates expressed as decimals (0.05 = 5%). Never as percentages.
pub type Rate = Decimal;

/// Smallest currency unit is the paisa: two decimal places.
pub const CURRENCY_DP: u32 = 2;

/// Largest amount accepted in any declared field (10^15 rupees). Keeps every
/// sum and product the calculator forms inside `Decimal` range.
pub const MAX_AMOUNT: Money = dec!(1_000_000_000_000_000);

/// Statutory regime a taxpayer elects for the year.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Regime {
    Old,
    New,
}

impl Regime {
    pub const ALL: [Regime; 2] = [Regime::Old, Regime::New];

    pub fn as_str(&self) -> &'static str {
        match self {
            Regime::Old => "old",
            Regime::New => "new",
        }
    }
}

impl fmt::Display for Regime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Regime {
    type Err = TaxEngineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "old" => Ok(Regime::Old),
            "new" => Ok(Regime::New),
            other => Err(TaxEngineError::invalid(
                "regime",
                format!("'{other}' is not a regime; expected 'old' or 'new'"),
            )),
        }
    }
}

/// Risk band derived from a bounded risk score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum RiskLevel {
    Low,
    Medium,
    High,
}

impl RiskLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            RiskLevel::Low => "LOW",
            RiskLevel::Medium => "MEDIUM",
            RiskLevel::High => "HIGH",
        }
    }
}

impl fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Round half-up to the smallest currency unit. Amounts here are never negative,
/// so away-from-zero and half-up coincide.
pub fn round_money(amount: Money) -> Money {
    amount.round_dp_with_strategy(CURRENCY_DP, RoundingStrategy::MidpointAwayFromZero)
}

/// Check a financial year label of the form `YYYY-YY` naming consecutive years.
pub fn validate_financial_year(financial_year: &str) -> TaxEngineResult<()> {
    let reject = |reason: &str| {
        Err(TaxEngineError::invalid(
            "financial_year",
            format!("'{financial_year}' {reason}"),
        ))
    };

    let Some((start, end)) = financial_year.split_once('-') else {
        return reject("must have the form YYYY-YY");
    };
    if start.len() != 4 || end.len() != 2 {
        return reject("must have the form YYYY-YY");
    }
    let (Ok(start), Ok(end)) = (start.parse::<u32>(), end.parse::<u32>()) else {
        return reject("must contain only digits around the hyphen");
    };
    if (start + 1) % 100 != end {
        return reject("must name two consecutive years");
    }
    Ok(())
}

/// Standard computation output envelope
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComputationOutput<T: Serialize> {
    pub result: T,
    pub methodology: String,
    pub assumptions: serde_json::Value,
    pub warnings: Vec<String>,
    pub metadata: ComputationMetadata,
}

/// Metadata for every computation. Carries no timing so identical inputs
/// serialize identically.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComputationMetadata {
    pub version: String,
    pub precision: String,
    pub rule_source: String,
}

/// Helper to wrap computation results with metadata
pub fn with_metadata<T: Serialize>(
    methodology: &str,
    assumptions: &impl Serialize,
    warnings: Vec<String>,
    rule_source: &str,
    result: T,
) -> ComputationOutput<T> {
    ComputationOutput {
        result,
        methodology: methodology.to_string(),
        assumptions: serde_json::to_value(assumptions).unwrap_or_default(),
        warnings,
        metadata: ComputationMetadata {
            version: env!("CARGO_PKG_VERSION").to_string(),
            precision: "rust_decimal_128bit".to_string(),
            rule_source: rule_source.to_string(),
        },
    }
}
