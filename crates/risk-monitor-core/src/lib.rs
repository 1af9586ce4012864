pub mod actions;
pub mod alerts;
pub mod config;
pub mod error;
pub mod explain;
pub mod portfolio;
pub mod scoring;
pub mod types;

#[cfg(feature = "engine")]
pub mod engine;

pub use config::ScoringConfig;
pub use error::RiskMonitorError;
pub use explain::explain;
pub use scoring::assess;
pub use types::*;

/// Standard result type for all risk-monitor operations
pub type RiskMonitorResult<T> = Result<T, RiskMonitorError>;
