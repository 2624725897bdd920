//! Rule sets: the versioned statutory parameters one regime applies in one
//! financial year, how they are loaded, and how they are shared.
//!
//! A [`RuleSet`] is validated once when its artifact is loaded and is
//! read-only afterwards. [`RuleSource`] implementations produce artifacts;
//! [`RuleCache`] owns the validated rule sets and hands out `Arc` views.

pub mod cache;
pub mod model;
pub mod source;

pub use cache::RuleCache;
pub use model::{
    BandArtifact, DeductionArtifact, DeductionRule, IncomeBand, RebateArtifact, RebateRule,
    RuleSet, RuleSetArtifact, DEFAULT_PRIMARY_INVESTMENT_SECTION,
};
#[cfg(feature = "bundled-rules")]
pub use source::BundledRuleSource;
pub use source::{artifact_file_name, DirectoryRuleSource, MemoryRuleSource, RuleSource};
