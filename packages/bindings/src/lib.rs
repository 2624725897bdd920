use std::sync::OnceLock;

use napi::Result as NapiResult;
use napi_derive::napi;
use tax_engine_core::engine;
use tax_engine_core::rules::RuleCache;
use tax_engine_core::tax::{ComparisonInput, SimulationInput, TaxpayerInput};
use tax_engine_core::Regime;

/// Convert any Display error into a napi::Error.
fn to_napi_error(e: impl std::fmt::Display) -> napi::Error {
    napi::Error::from_reason(e.to_string())
}

/// One cache per process, over the bundled rule artifacts.
fn rules() -> &'static RuleCache {
    static CACHE: OnceLock<RuleCache> = OnceLock::new();
    CACHE.get_or_init(RuleCache::bundled)
}

// ---------------------------------------------------------------------------
// Analysis
// ---------------------------------------------------------------------------

#[napi]
pub fn analyze_tax(input_json: String) -> NapiResult<String> {
    let input: TaxpayerInput = serde_json::from_str(&input_json).map_err(to_napi_error)?;
    let output = engine::analyze(rules(), &input).map_err(to_napi_error)?;
    serde_json::to_string(&output).map_err(to_napi_error)
}

#[napi]
pub fn compare_regimes(input_json: String) -> NapiResult<String> {
    let input: ComparisonInput = serde_json::from_str(&input_json).map_err(to_napi_error)?;
    let output = engine::compare_regimes(rules(), &input).map_err(to_napi_error)?;
    serde_json::to_string(&output).map_err(to_napi_error)
}

#[napi]
pub fn generate_report(input_json: String) -> NapiResult<String> {
    let input: TaxpayerInput = serde_json::from_str(&input_json).map_err(to_napi_error)?;
    engine::report(rules(), &input).map_err(to_napi_error)
}

#[napi]
pub fn simulate_scenario(input_json: String) -> NapiResult<String> {
    let input: SimulationInput = serde_json::from_str(&input_json).map_err(to_napi_error)?;
    let output = engine::simulate(rules(), &input).map_err(to_napi_error)?;
    serde_json::to_string(&output).map_err(to_napi_error)
}

// ---------------------------------------------------------------------------
// Rules
// ---------------------------------------------------------------------------

/// Rule sets for both regimes in `financial_year`, as a JSON array.
#[napi]
pub fn get_rules(financial_year: String) -> NapiResult<String> {
    let sets = Regime::ALL
        .iter()
        .map(|&regime| rules().get(regime, &financial_year))
        .collect::<Result<Vec<_>, _>>()
        .map_err(to_napi_error)?;
    let views: Vec<_> = sets.iter().map(|s| s.as_ref()).collect();
    serde_json::to_string(&views).map_err(to_napi_error)
}
