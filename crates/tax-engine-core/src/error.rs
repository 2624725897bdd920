use thiserror::Error;

use crate::types::Regime;

#[derive(Debug, Error)]
pub enum TaxEngineError {
    #[error("Invalid input: {field} — {reason}")]
    InvalidInput { field: String, reason: String },

    #[error("No rule set for {regime} regime, FY {financial_year}")]
    RuleNotFound {
        regime: Regime,
        financial_year: String,
    },

    #[error("Rule set integrity violation ({regime} regime, FY {financial_year}): {reason}")]
    RuleSetIntegrity {
        regime: Regime,
        financial_year: String,
        reason: String,
    },

    #[error("Rule source '{source_name}' failed: {reason}")]
    RuleSource { source_name: String, reason: String },

    #[error("Serialization error: {0}")]
    SerializationError(String),
}

impl TaxEngineError {
    pub(crate) fn invalid(field: impl Into<String>, reason: impl Into<String>) -> Self {
        TaxEngineError::InvalidInput {
            field: field.into(),
            reason: reason.into(),
        }
    }
}

impl From<serde_json::Error> for TaxEngineError {
    fn from(e: serde_json::Error) -> Self {
        TaxEngineError::SerializationError(e.to_string())
    }
}
