use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::TaxEngineError;
use crate::types::{validate_financial_year, Money, Rate, Regime};
use crate::TaxEngineResult;

/// Section used by the anomalous-investment check when an artifact does not
/// name one.
pub const DEFAULT_PRIMARY_INVESTMENT_SECTION: &str = "80C";

// ---------------------------------------------------------------------------
// Artifact (wire shape)
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BandArtifact {
    pub min_income: Money,
    pub max_income: Option<Money>,
    pub rate: Rate,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeductionArtifact {
    pub section: String,
    pub name: String,
    pub max_limit: Option<Money>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RebateArtifact {
    pub taxable_income_ceiling: Money,
    pub max_rebate_amount: Money,
}

/// JSON artifact for one (regime, financial year), exactly as a rule source
/// delivers it. Nothing here is trusted until [`RuleSet::from_artifact`]
/// has checked it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RuleSetArtifact {
    pub regime: Regime,
    pub financial_year: String,
    pub slabs: Vec<BandArtifact>,
    pub deductions: Vec<DeductionArtifact>,
    #[serde(default)]
    pub surcharge_bands: Vec<BandArtifact>,
    pub cess_rate: Rate,
    pub rebate: RebateArtifact,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub primary_investment_section: Option<String>,
}

impl RuleSetArtifact {
    pub fn from_json(json: &str) -> TaxEngineResult<Self> {
        Ok(serde_json::from_str(json)?)
    }
}

// ---------------------------------------------------------------------------
// Validated model
// ---------------------------------------------------------------------------

/// A contiguous income band taxed at one rate. Used for both slabs and
/// surcharge bands.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IncomeBand {
    pub lower_bound: Money,
    pub upper_bound: Option<Money>,
    pub rate: Rate,
}

impl IncomeBand {
    /// Portion of `income` that falls in `[lower_bound, upper_bound)`.
    pub fn portion_of(&self, income: Money) -> Money {
        let top = match self.upper_bound {
            Some(upper) => income.min(upper),
            None => income,
        };
        (top - self.lower_bound).max(Decimal::ZERO)
    }

    /// Whether `income` lies in this band for surcharge purposes. The upper
    /// bound is inclusive: surcharge starts once income *exceeds* a threshold.
    pub fn contains_for_surcharge(&self, income: Money) -> bool {
        let above_lower = if self.lower_bound.is_zero() {
            income >= Decimal::ZERO
        } else {
            income > self.lower_bound
        };
        above_lower && self.upper_bound.map_or(true, |upper| income <= upper)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeductionRule {
    pub section_code: String,
    pub display_name: String,
    /// `None` means the section is unbounded.
    pub max_limit: Option<Money>,
}

impl DeductionRule {
    /// Amount of a claim that counts toward taxable-income reduction.
    pub fn allowed(&self, claimed: Money) -> Money {
        match self.max_limit {
            Some(limit) => claimed.min(limit),
            None => claimed,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RebateRule {
    pub taxable_income_ceiling: Money,
    pub max_rebate_amount: Money,
}

/// Statutory parameters for one regime in one financial year.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RuleSet {
    pub regime: Regime,
    pub financial_year: String,
    pub slabs: Vec<IncomeBand>,
    pub deductions: Vec<DeductionRule>,
    pub surcharge_bands: Vec<IncomeBand>,
    pub cess_rate: Rate,
    pub rebate_rule: RebateRule,
    pub primary_investment_section: String,
}

impl RuleSet {
    /// Validate an artifact and build the immutable rule set from it.
    ///
    /// Every structural problem surfaces here as
    /// [`TaxEngineError::RuleSetIntegrity`] so that a corrupt artifact can
    /// never reach the calculator.
    pub fn from_artifact(artifact: RuleSetArtifact) -> TaxEngineResult<Self> {
        let regime = artifact.regime;
        let financial_year = artifact.financial_year.clone();
        let integrity = |reason: String| TaxEngineError::RuleSetIntegrity {
            regime,
            financial_year: financial_year.clone(),
            reason,
        };

        validate_financial_year(&artifact.financial_year).map_err(|e| integrity(e.to_string()))?;

        let slabs = build_bands("slab", &artifact.slabs).map_err(&integrity)?;
        if slabs.is_empty() {
            return Err(integrity("at least one slab is required".into()));
        }
        let surcharge_bands =
            build_bands("surcharge band", &artifact.surcharge_bands).map_err(&integrity)?;

        let mut deductions: Vec<DeductionRule> = Vec::with_capacity(artifact.deductions.len());
        for d in artifact.deductions {
            if d.section.trim().is_empty() {
                return Err(integrity("deduction section code is empty".into()));
            }
            if deductions.iter().any(|r| r.section_code == d.section) {
                return Err(integrity(format!("duplicate deduction section '{}'", d.section)));
            }
            if let Some(limit) = d.max_limit {
                if limit < Decimal::ZERO {
                    return Err(integrity(format!(
                        "deduction section '{}' has negative max_limit {limit}",
                        d.section
                    )));
                }
            }
            deductions.push(DeductionRule {
                section_code: d.section,
                display_name: d.name,
                max_limit: d.max_limit,
            });
        }

        if artifact.cess_rate < Decimal::ZERO || artifact.cess_rate >= Decimal::ONE {
            return Err(integrity(format!(
                "cess_rate {} outside [0, 1)",
                artifact.cess_rate
            )));
        }
        if artifact.rebate.taxable_income_ceiling < Decimal::ZERO
            || artifact.rebate.max_rebate_amount < Decimal::ZERO
        {
            return Err(integrity("rebate figures must be non-negative".into()));
        }

        let primary_investment_section = match artifact.primary_investment_section {
            Some(section) => {
                if !deductions.iter().any(|d| d.section_code == section) {
                    return Err(integrity(format!(
                        "primary_investment_section '{section}' is not a listed deduction"
                    )));
                }
                section
            }
            None => DEFAULT_PRIMARY_INVESTMENT_SECTION.to_string(),
        };

        Ok(RuleSet {
            regime,
            financial_year: artifact.financial_year,
            slabs,
            deductions,
            surcharge_bands,
            cess_rate: artifact.cess_rate,
            rebate_rule: RebateRule {
                taxable_income_ceiling: artifact.rebate.taxable_income_ceiling,
                max_rebate_amount: artifact.rebate.max_rebate_amount,
            },
            primary_investment_section,
        })
    }

    pub fn from_json(json: &str) -> TaxEngineResult<Self> {
        Self::from_artifact(RuleSetArtifact::from_json(json)?)
    }

    pub fn deduction(&self, section_code: &str) -> Option<&DeductionRule> {
        self.deductions
            .iter()
            .find(|d| d.section_code == section_code)
    }

    pub fn permits(&self, section_code: &str) -> bool {
        self.deduction(section_code).is_some()
    }

    /// Surcharge band applicable to `income`, if any.
    pub fn surcharge_band_for(&self, income: Money) -> Option<&IncomeBand> {
        self.surcharge_bands
            .iter()
            .find(|band| band.contains_for_surcharge(income))
    }

    /// Convert back to the wire shape.
    pub fn to_artifact(&self) -> RuleSetArtifact {
        let band = |b: &IncomeBand| BandArtifact {
            min_income: b.lower_bound,
            max_income: b.upper_bound,
            rate: b.rate,
        };
        RuleSetArtifact {
            regime: self.regime,
            financial_year: self.financial_year.clone(),
            slabs: self.slabs.iter().map(band).collect(),
            deductions: self
                .deductions
                .iter()
                .map(|d| DeductionArtifact {
                    section: d.section_code.clone(),
                    name: d.display_name.clone(),
                    max_limit: d.max_limit,
                })
                .collect(),
            surcharge_bands: self.surcharge_bands.iter().map(band).collect(),
            cess_rate: self.cess_rate,
            rebate: RebateArtifact {
                taxable_income_ceiling: self.rebate_rule.taxable_income_ceiling,
                max_rebate_amount: self.rebate_rule.max_rebate_amount,
            },
            primary_investment_section: Some(self.primary_investment_section.clone()),
        }
    }
}

/// Check that bands start at 0, are contiguous, and only the last is open.
/// An empty list is accepted; callers decide whether that is meaningful.
fn build_bands(kind: &str, raw: &[BandArtifact]) -> Result<Vec<IncomeBand>, String> {
    let mut bands = Vec::with_capacity(raw.len());
    for (i, b) in raw.iter().enumerate() {
        if b.rate < Decimal::ZERO || b.rate >= Decimal::ONE {
            return Err(format!("{kind} {i} rate {} outside [0, 1)", b.rate));
        }
        if i == 0 && !b.min_income.is_zero() {
            return Err(format!(
                "first {kind} must start at 0, found {}",
                b.min_income
            ));
        }
        if i > 0 {
            match raw[i - 1].max_income {
                Some(prev_max) if prev_max == b.min_income => {}
                Some(prev_max) => {
                    return Err(format!(
                        "{kind} {i} starts at {} but previous {kind} ends at {prev_max}",
                        b.min_income
                    ))
                }
                None => {
                    return Err(format!(
                        "only the last {kind} may be open-ended (index {})",
                        i - 1
                    ))
                }
            }
        }
        match b.max_income {
            Some(max) if max <= b.min_income => {
                return Err(format!(
                    "{kind} {i} upper bound {max} is not above lower bound {}",
                    b.min_income
                ))
            }
            None if i + 1 != raw.len() => {
                return Err(format!("only the last {kind} may be open-ended (index {i})"))
            }
            _ => {}
        }
        bands.push(IncomeBand {
            lower_bound: b.min_income,
            upper_bound: b.max_income,
            rate: b.rate,
        });
    }
    if let Some(last) = raw.last() {
        if last.max_income.is_some() {
            return Err(format!("last {kind} must be open-ended"));
        }
    }
    Ok(bands)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn band(min: Decimal, max: Option<Decimal>, rate: Decimal) -> BandArtifact {
        BandArtifact {
            min_income: min,
            max_income: max,
            rate,
        }
    }

    fn sample_artifact() -> RuleSetArtifact {
        RuleSetArtifact {
            regime: Regime::Old,
            financial_year: "2024-25".into(),
            slabs: vec![
                band(dec!(0), Some(dec!(250000)), dec!(0)),
                band(dec!(250000), Some(dec!(500000)), dec!(0.05)),
                band(dec!(500000), None, dec!(0.2)),
            ],
            deductions: vec![
                DeductionArtifact {
                    section: "80C".into(),
                    name: "Investments".into(),
                    max_limit: Some(dec!(150000)),
                },
                DeductionArtifact {
                    section: "80G".into(),
                    name: "Donations".into(),
                    max_limit: None,
                },
            ],
            surcharge_bands: vec![
                band(dec!(0), Some(dec!(5000000)), dec!(0)),
                band(dec!(5000000), None, dec!(0.1)),
            ],
            cess_rate: dec!(0.04),
            rebate: RebateArtifact {
                taxable_income_ceiling: dec!(500000),
                max_rebate_amount: dec!(12500),
            },
            primary_investment_section: None,
        }
    }

    fn integrity_reason(artifact: RuleSetArtifact) -> String {
        match RuleSet::from_artifact(artifact) {
            Err(TaxEngineError::RuleSetIntegrity { reason, .. }) => reason,
            other => panic!("expected integrity error, got {other:?}"),
        }
    }

    #[test]
    fn test_valid_artifact_loads() {
        let rules = RuleSet::from_artifact(sample_artifact()).unwrap();
        assert_eq!(rules.slabs.len(), 3);
        assert_eq!(rules.primary_investment_section, "80C");
        assert!(rules.permits("80G"));
        assert!(!rules.permits("80D"));
    }

    #[test]
    fn test_first_slab_must_start_at_zero() {
        let mut a = sample_artifact();
        a.slabs[0].min_income = dec!(1);
        assert!(integrity_reason(a).contains("must start at 0"));
    }

    #[test]
    fn test_gap_between_slabs_rejected() {
        let mut a = sample_artifact();
        a.slabs[1].min_income = dec!(260000);
        assert!(integrity_reason(a).contains("previous slab ends at 250000"));
    }

    #[test]
    fn test_open_slab_must_be_last() {
        let mut a = sample_artifact();
        a.slabs[1].max_income = None;
        assert!(integrity_reason(a).contains("open-ended"));
    }

    #[test]
    fn test_last_slab_must_be_open() {
        let mut a = sample_artifact();
        a.slabs[2].max_income = Some(dec!(900000));
        assert!(integrity_reason(a).contains("must be open-ended"));
    }

    #[test]
    fn test_rate_out_of_range_rejected() {
        let mut a = sample_artifact();
        a.slabs[2].rate = dec!(30);
        assert!(integrity_reason(a).contains("outside [0, 1)"));
    }

    #[test]
    fn test_duplicate_section_rejected() {
        let mut a = sample_artifact();
        a.deductions.push(a.deductions[0].clone());
        assert!(integrity_reason(a).contains("duplicate deduction section '80C'"));
    }

    #[test]
    fn test_empty_slabs_rejected() {
        let mut a = sample_artifact();
        a.slabs.clear();
        assert!(integrity_reason(a).contains("at least one slab"));
    }

    #[test]
    fn test_bad_financial_year_rejected() {
        let mut a = sample_artifact();
        a.financial_year = "2024".into();
        assert!(integrity_reason(a).contains("YYYY-YY"));
    }

    #[test]
    fn test_unknown_primary_section_rejected() {
        let mut a = sample_artifact();
        a.primary_investment_section = Some("80CCC".into());
        assert!(integrity_reason(a).contains("not a listed deduction"));
    }

    #[test]
    fn test_surcharge_bands_may_be_empty() {
        let mut a = sample_artifact();
        a.surcharge_bands.clear();
        let rules = RuleSet::from_artifact(a).unwrap();
        assert!(rules.surcharge_band_for(dec!(90000000)).is_none());
    }

    #[test]
    fn test_surcharge_threshold_is_inclusive_upper() {
        let rules = RuleSet::from_artifact(sample_artifact()).unwrap();
        assert_eq!(rules.surcharge_band_for(dec!(5000000)).unwrap().rate, dec!(0));
        assert_eq!(
            rules.surcharge_band_for(dec!(5000000.01)).unwrap().rate,
            dec!(0.1)
        );
        assert_eq!(rules.surcharge_band_for(dec!(0)).unwrap().rate, dec!(0));
    }

    #[test]
    fn test_band_portion() {
        let b = IncomeBand {
            lower_bound: dec!(250000),
            upper_bound: Some(dec!(500000)),
            rate: dec!(0.05),
        };
        assert_eq!(b.portion_of(dec!(100000)), dec!(0));
        assert_eq!(b.portion_of(dec!(300000)), dec!(50000));
        assert_eq!(b.portion_of(dec!(900000)), dec!(250000));
    }

    #[test]
    fn test_deduction_allowed_clips() {
        let rule = DeductionRule {
            section_code: "80C".into(),
            display_name: "Investments".into(),
            max_limit: Some(dec!(150000)),
        };
        assert_eq!(rule.allowed(dec!(200000)), dec!(150000));
        assert_eq!(rule.allowed(dec!(90000)), dec!(90000));
    }

    #[test]
    fn test_artifact_json_accepts_numbers_and_nulls() {
        let json = r#"{
            "regime": "new",
            "financial_year": "2025-26",
            "slabs": [
                {"min_income": 0, "max_income": 400000, "rate": 0},
                {"min_income": 400000, "max_income": null, "rate": 0.05}
            ],
            "deductions": [{"section": "StandardDeduction", "name": "Standard Deduction", "max_limit": 75000}],
            "cess_rate": 0.04,
            "rebate": {"taxable_income_ceiling": 1200000, "max_rebate_amount": 60000}
        }"#;
        let rules = RuleSet::from_json(json).unwrap();
        assert_eq!(rules.regime, Regime::New);
        assert_eq!(rules.cess_rate, dec!(0.04));
        assert!(rules.surcharge_bands.is_empty());
        assert_eq!(rules.slabs[1].upper_bound, None);
    }

    #[test]
    fn test_round_trip_through_artifact() {
        let rules = RuleSet::from_artifact(sample_artifact()).unwrap();
        let again = RuleSet::from_artifact(rules.to_artifact()).unwrap();
        assert_eq!(rules, again);
    }
}
