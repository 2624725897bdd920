pub mod analyze;
pub mod compare;
pub mod report;
pub mod rules;
pub mod simulate;

use std::collections::BTreeMap;
use std::path::Path;

use rust_decimal::Decimal;
use tax_engine_core::rules::{DirectoryRuleSource, RuleCache};
use tracing::info;

/// Rule cache over `--rules-dir` when given, else over the bundled artifacts.
pub fn rule_cache(rules_dir: Option<&Path>) -> RuleCache {
    match rules_dir {
        Some(dir) => {
            info!(dir = %dir.display(), "reading rule artifacts from directory");
            RuleCache::new(DirectoryRuleSource::new(dir))
        }
        None => RuleCache::bundled(),
    }
}

/// Parse one `--deduction SECTION=AMOUNT` flag.
pub fn parse_deduction(raw: &str) -> Result<(String, Decimal), String> {
    let (section, amount) = raw
        .split_once('=')
        .ok_or_else(|| format!("expected SECTION=AMOUNT, got '{raw}'"))?;
    let section = section.trim();
    if section.is_empty() {
        return Err(format!("missing section code in '{raw}'"));
    }
    let amount: Decimal = amount
        .trim()
        .parse()
        .map_err(|e| format!("invalid amount in '{raw}': {e}"))?;
    Ok((section.to_string(), amount))
}

/// Later flags for the same section replace earlier ones.
pub fn deduction_map(pairs: Vec<(String, Decimal)>) -> BTreeMap<String, Decimal> {
    pairs.into_iter().collect()
}
