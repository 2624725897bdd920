use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::{Mutex, RwLock};
use tracing::{debug, warn};

use crate::error::TaxEngineError;
use crate::rules::model::RuleSet;
use crate::rules::source::RuleSource;
use crate::types::{validate_financial_year, Regime};
use crate::TaxEngineResult;

type RuleKey = (Regime, String);

/// Owns validated rule sets keyed by (regime, financial year).
///
/// Reads of a populated key take only the shared side of an `RwLock`.
/// Populating a missing key is single-flight: concurrent first requests for
/// the same key wait on a per-key mutex and only one of them calls the
/// source. Failed fetches are not cached.
pub struct RuleCache {
    source: Box<dyn RuleSource>,
    ready: RwLock<HashMap<RuleKey, Arc<RuleSet>>>,
    fills: Mutex<HashMap<RuleKey, Arc<Mutex<()>>>>,
}

impl RuleCache {
    pub fn new(source: impl RuleSource + 'static) -> Self {
        Self::from_boxed(Box::new(source))
    }

    pub fn from_boxed(source: Box<dyn RuleSource>) -> Self {
        Self {
            source,
            ready: RwLock::new(HashMap::new()),
            fills: Mutex::new(HashMap::new()),
        }
    }

    /// Cache over the artifacts compiled into the crate.
    #[cfg(feature = "bundled-rules")]
    pub fn bundled() -> Self {
        Self::new(crate::rules::source::BundledRuleSource)
    }

    pub fn source_name(&self) -> &str {
        self.source.name()
    }

    /// Resolve the rule set for `regime` / `financial_year`, fetching and
    /// validating it on first use.
    pub fn get(&self, regime: Regime, financial_year: &str) -> TaxEngineResult<Arc<RuleSet>> {
        validate_financial_year(financial_year)?;
        let key: RuleKey = (regime, financial_year.to_string());

        if let Some(rules) = self.ready.read().get(&key) {
            return Ok(Arc::clone(rules));
        }

        let gate = Arc::clone(self.fills.lock().entry(key.clone()).or_default());
        let _filling = gate.lock();

        // Another caller may have filled the key while we waited.
        if let Some(rules) = self.ready.read().get(&key) {
            return Ok(Arc::clone(rules));
        }

        debug!(source = self.source.name(), %regime, financial_year, "loading rule set");
        let loaded = self.load(regime, financial_year).map(Arc::new);
        if let Ok(rules) = &loaded {
            self.ready.write().insert(key.clone(), Arc::clone(rules));
        }
        // The gate goes whether or not the load succeeded.
        self.fills.lock().remove(&key);
        loaded
    }

    fn load(&self, regime: Regime, financial_year: &str) -> TaxEngineResult<RuleSet> {
        let artifact = self.source.fetch(regime, financial_year)?;
        if artifact.regime != regime || artifact.financial_year != financial_year {
            warn!(
                source = self.source.name(),
                requested_regime = %regime,
                requested_year = financial_year,
                found_regime = %artifact.regime,
                found_year = %artifact.financial_year,
                "rule artifact does not match the requested key"
            );
            return Err(TaxEngineError::RuleSetIntegrity {
                regime,
                financial_year: financial_year.to_string(),
                reason: format!(
                    "source returned the artifact for {} regime, FY {}",
                    artifact.regime, artifact.financial_year
                ),
            });
        }
        RuleSet::from_artifact(artifact).inspect_err(|e| {
            warn!(source = self.source.name(), error = %e, "rejected rule artifact");
        })
    }

    /// Keys currently held, sorted.
    pub fn cached_keys(&self) -> Vec<(Regime, String)> {
        let mut keys: Vec<_> = self.ready.read().keys().cloned().collect();
        keys.sort();
        keys
    }

    #[cfg(all(test, feature = "bundled-rules"))]
    fn pending_gates(&self) -> usize {
        self.fills.lock().len()
    }

    pub fn len(&self) -> usize {
        self.ready.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.ready.read().is_empty()
    }
}

impl std::fmt::Debug for RuleCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RuleCache")
            .field("source", &self.source.name())
            .field("cached", &self.cached_keys())
            .finish()
    }
}

#[cfg(all(test, feature = "bundled-rules"))]
mod tests {
    use super::*;
    use crate::rules::model::RuleSetArtifact;
    use crate::rules::source::{BundledRuleSource, MemoryRuleSource};
    use rust_decimal_macros::dec;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::thread;
    use std::time::Duration;

    /// Counts fetches and sleeps so concurrent callers overlap.
    struct CountingSource {
        fetches: Arc<AtomicUsize>,
    }

    impl RuleSource for CountingSource {
        fn name(&self) -> &str {
            "counting"
        }

        fn fetch(&self, regime: Regime, financial_year: &str) -> TaxEngineResult<RuleSetArtifact> {
            self.fetches.fetch_add(1, Ordering::SeqCst);
            thread::sleep(Duration::from_millis(20));
            BundledRuleSource.fetch(regime, financial_year)
        }
    }

    #[test]
    fn test_get_returns_shared_instance() {
        let cache = RuleCache::bundled();
        let a = cache.get(Regime::Old, "2024-25").unwrap();
        let b = cache.get(Regime::Old, "2024-25").unwrap();
        assert!(Arc::ptr_eq(&a, &b));
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_concurrent_first_requests_fetch_once() {
        let fetches = Arc::new(AtomicUsize::new(0));
        let cache = RuleCache::new(CountingSource {
            fetches: Arc::clone(&fetches),
        });

        thread::scope(|s| {
            for _ in 0..8 {
                s.spawn(|| {
                    cache.get(Regime::New, "2024-25").unwrap();
                });
            }
        });

        assert_eq!(fetches.load(Ordering::SeqCst), 1);
        assert_eq!(cache.cached_keys(), vec![(Regime::New, "2024-25".to_string())]);
    }

    #[test]
    fn test_missing_key_is_rule_not_found_and_not_cached() {
        let cache = RuleCache::bundled();
        let err = cache.get(Regime::New, "2030-31").unwrap_err();
        assert!(matches!(err, TaxEngineError::RuleNotFound { .. }));
        assert!(cache.is_empty());
    }

    #[test]
    fn test_failed_fetch_releases_fill_gate() {
        let cache = RuleCache::new(MemoryRuleSource::new());
        for year in ["2024-25", "2025-26", "2024-25"] {
            let err = cache.get(Regime::Old, year).unwrap_err();
            assert!(matches!(err, TaxEngineError::RuleNotFound { .. }));
            assert_eq!(cache.pending_gates(), 0);
        }

        let mut artifact = BundledRuleSource.fetch(Regime::New, "2024-25").unwrap();
        artifact.cess_rate = dec!(-0.04);
        let cache = RuleCache::new(MemoryRuleSource::new().with_artifact(artifact));
        assert!(cache.get(Regime::New, "2024-25").is_err());
        assert_eq!(cache.pending_gates(), 0);
        assert!(cache.is_empty());
    }

    #[test]
    fn test_malformed_year_rejected_before_fetch() {
        let cache = RuleCache::bundled();
        let err = cache.get(Regime::Old, "FY24").unwrap_err();
        assert!(matches!(err, TaxEngineError::InvalidInput { .. }));
    }

    #[test]
    fn test_invalid_artifact_never_cached() {
        let mut artifact = BundledRuleSource.fetch(Regime::Old, "2024-25").unwrap();
        artifact.slabs[1].min_income = dec!(260000);
        let cache = RuleCache::new(MemoryRuleSource::new().with_artifact(artifact));

        let err = cache.get(Regime::Old, "2024-25").unwrap_err();
        assert!(matches!(err, TaxEngineError::RuleSetIntegrity { .. }));
        assert!(cache.is_empty());
    }

    #[test]
    fn test_mismatched_artifact_rejected() {
        struct WrongYear;
        impl RuleSource for WrongYear {
            fn name(&self) -> &str {
                "wrong-year"
            }
            fn fetch(&self, regime: Regime, _: &str) -> TaxEngineResult<RuleSetArtifact> {
                BundledRuleSource.fetch(regime, "2024-25")
            }
        }

        let err = RuleCache::new(WrongYear).get(Regime::Old, "2025-26").unwrap_err();
        assert!(matches!(err, TaxEngineError::RuleSetIntegrity { .. }));
    }
}
