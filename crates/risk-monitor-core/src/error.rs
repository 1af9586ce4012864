use thiserror::Error;

#[derive(Debug, Error)]
pub enum RiskMonitorError {
    #[error("Invalid input: {field} — {reason}")]
    InvalidInput { field: String, reason: String },

    #[error("Insufficient data: {0}")]
    InsufficientData(String),

    #[error("Configuration error: {parameter} — {reason}")]
    Configuration { parameter: String, reason: String },

    #[error("Signal unavailable from {provider}: {reason}")]
    SignalUnavailable { provider: String, reason: String },

    #[error("Customer not found: {0}")]
    CustomerNotFound(String),

    #[error("Serialization error: {0}")]
    SerializationError(String),
}

impl RiskMonitorError {
    pub(crate) fn config(parameter: &str, reason: impl Into<String>) -> Self {
        RiskMonitorError::Configuration {
            parameter: parameter.to_string(),
            reason: reason.into(),
        }
    }

    pub(crate) fn invalid(field: &str, reason: impl Into<String>) -> Self {
        RiskMonitorError::InvalidInput {
            field: field.to_string(),
            reason: reason.into(),
        }
    }
}

impl From<serde_json::Error> for RiskMonitorError {
    fn from(e: serde_json::Error) -> Self {
        RiskMonitorError::SerializationError(e.to_string())
    }
}
