use tax_engine_core::engine;
use tax_engine_core::rules::RuleCache;

use crate::commands::analyze::DeclarationArgs;

/// Plain-text report; ignores `--output`.
pub fn run_report(
    args: DeclarationArgs,
    cache: &RuleCache,
) -> Result<String, Box<dyn std::error::Error>> {
    let request = args.into_request()?;
    Ok(engine::report(cache, &request)?)
}
