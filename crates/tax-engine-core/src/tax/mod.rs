//! Tax computation and compliance scoring.
//!
//! Every function here is pure: inputs are borrowed, nothing is cached, and
//! identical inputs give identical outputs.

pub mod calculator;
pub mod comparison;
pub mod report;
pub mod risk;
pub mod simulation;

use serde::{Deserialize, Serialize};

use crate::rules::RuleSet;
use crate::TaxEngineResult;

pub use calculator::{compute, DeductionLine, TaxBreakdown, TaxComputationResult, TaxpayerInput};
pub use comparison::{compare, ComparisonInput, ComparisonResult};
pub use report::format_report;
pub use risk::{assess, FraudAssessment, RiskCheck, RiskSignal};
pub use simulation::{simulate, SimulationInput, SimulationPoint, SimulationResult};

/// Tax figures and the compliance assessment for one declaration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaxAnalysis {
    pub tax_calculation: TaxComputationResult,
    pub fraud_analysis: FraudAssessment,
}

/// Run the calculator and then the risk scorer over its output.
pub fn analyze(input: &TaxpayerInput, rules: &RuleSet) -> TaxEngineResult<TaxAnalysis> {
    let tax_calculation = compute(input, rules)?;
    let fraud_analysis = assess(input, rules, &tax_calculation);
    Ok(TaxAnalysis {
        tax_calculation,
        fraud_analysis,
    })
}
