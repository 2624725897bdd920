pub mod engine;
pub mod error;
pub mod rules;
pub mod tax;
pub mod types;

pub use error::TaxEngineError;
pub use types::*;

/// Standard result type for all tax-engine operations
pub type TaxEngineResult<T> = Result<T, TaxEngineError>;
