//! Where rule artifacts come from.
//!
//! The engine never cares how an artifact was produced (hand-written,
//! crawled, extracted by a model); it only sees [`RuleSetArtifact`]s handed
//! over by a [`RuleSource`]. Validation happens in the cache, not here.

use std::collections::HashMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use crate::error::TaxEngineError;
use crate::rules::model::RuleSetArtifact;
use crate::types::Regime;
use crate::TaxEngineResult;

/// Capability to produce the artifact for one (regime, financial year).
///
/// Implementations return [`TaxEngineError::RuleNotFound`] when they have no
/// artifact for the key, and [`TaxEngineError::RuleSource`] for I/O trouble.
pub trait RuleSource: Send + Sync {
    fn name(&self) -> &str;

    fn fetch(&self, regime: Regime, financial_year: &str) -> TaxEngineResult<RuleSetArtifact>;
}

/// Conventional file name for an artifact, e.g. `india_tax_2024_25_old.json`.
pub fn artifact_file_name(regime: Regime, financial_year: &str) -> String {
    format!(
        "india_tax_{}_{}.json",
        financial_year.replace('-', "_"),
        regime
    )
}

fn not_found(regime: Regime, financial_year: &str) -> TaxEngineError {
    TaxEngineError::RuleNotFound {
        regime,
        financial_year: financial_year.to_string(),
    }
}

/// A malformed artifact is an integrity problem of the rule set, not a
/// caller error.
fn parse_artifact(
    regime: Regime,
    financial_year: &str,
    json: &str,
) -> TaxEngineResult<RuleSetArtifact> {
    serde_json::from_str(json).map_err(|e| TaxEngineError::RuleSetIntegrity {
        regime,
        financial_year: financial_year.to_string(),
        reason: format!("artifact is not valid JSON for the rule schema: {e}"),
    })
}

// ---------------------------------------------------------------------------
// Bundled
// ---------------------------------------------------------------------------

/// Artifacts compiled into the crate.
#[cfg(feature = "bundled-rules")]
#[derive(Debug, Default, Clone, Copy)]
pub struct BundledRuleSource;

#[cfg(feature = "bundled-rules")]
impl BundledRuleSource {
    const ARTIFACTS: &'static [(Regime, &'static str, &'static str)] = &[
        (
            Regime::Old,
            "2024-25",
            include_str!("data/india_tax_2024_25_old.json"),
        ),
        (
            Regime::New,
            "2024-25",
            include_str!("data/india_tax_2024_25_new.json"),
        ),
    ];

    /// (regime, financial year) pairs this source can serve.
    pub fn available() -> Vec<(Regime, &'static str)> {
        Self::ARTIFACTS.iter().map(|(r, fy, _)| (*r, *fy)).collect()
    }
}

#[cfg(feature = "bundled-rules")]
impl RuleSource for BundledRuleSource {
    fn name(&self) -> &str {
        "bundled"
    }

    fn fetch(&self, regime: Regime, financial_year: &str) -> TaxEngineResult<RuleSetArtifact> {
        let json = Self::ARTIFACTS
            .iter()
            .find(|(r, fy, _)| *r == regime && *fy == financial_year)
            .map(|(_, _, json)| *json)
            .ok_or_else(|| not_found(regime, financial_year))?;
        parse_artifact(regime, financial_year, json)
    }
}

// ---------------------------------------------------------------------------
// Directory
// ---------------------------------------------------------------------------

/// Reads `<root>/india_tax_<YYYY>_<YY>_<regime>.json`.
#[derive(Debug, Clone)]
pub struct DirectoryRuleSource {
    root: PathBuf,
    name: String,
}

impl DirectoryRuleSource {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        let root = root.into();
        let name = format!("dir:{}", root.display());
        Self { root, name }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn path_for(&self, regime: Regime, financial_year: &str) -> PathBuf {
        self.root.join(artifact_file_name(regime, financial_year))
    }
}

impl RuleSource for DirectoryRuleSource {
    fn name(&self) -> &str {
        &self.name
    }

    fn fetch(&self, regime: Regime, financial_year: &str) -> TaxEngineResult<RuleSetArtifact> {
        let path = self.path_for(regime, financial_year);
        let json = match fs::read_to_string(&path) {
            Ok(json) => json,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                return Err(not_found(regime, financial_year))
            }
            Err(e) => {
                return Err(TaxEngineError::RuleSource {
                    source_name: self.name.clone(),
                    reason: format!("failed to read '{}': {e}", path.display()),
                })
            }
        };
        parse_artifact(regime, financial_year, &json)
    }
}

// ---------------------------------------------------------------------------
// Memory
// ---------------------------------------------------------------------------

/// Artifacts registered up front. Handy for embedding and tests.
#[derive(Debug, Clone, Default)]
pub struct MemoryRuleSource {
    artifacts: HashMap<(Regime, String), RuleSetArtifact>,
}

impl MemoryRuleSource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an artifact under its own (regime, financial year).
    pub fn insert(&mut self, artifact: RuleSetArtifact) {
        self.artifacts
            .insert((artifact.regime, artifact.financial_year.clone()), artifact);
    }

    pub fn with_artifact(mut self, artifact: RuleSetArtifact) -> Self {
        self.insert(artifact);
        self
    }
}

impl RuleSource for MemoryRuleSource {
    fn name(&self) -> &str {
        "memory"
    }

    fn fetch(&self, regime: Regime, financial_year: &str) -> TaxEngineResult<RuleSetArtifact> {
        self.artifacts
            .get(&(regime, financial_year.to_string()))
            .cloned()
            .ok_or_else(|| not_found(regime, financial_year))
    }
}
