//! Collaborators that feed the engine: customer data and OSINT signals.

use std::collections::HashMap;

use async_trait::async_trait;

use crate::error::RiskMonitorError;
use crate::types::{CustomerRecord, Dataset, OsintSignal};
use crate::RiskMonitorResult;

/// Source of customer profiles and transaction history.
#[async_trait]
pub trait SignalSource: Send + Sync {
    async fn load(&self, customer_id: &str) -> RiskMonitorResult<CustomerRecord>;
}

/// External intelligence lookup. Failures are tolerated by the engine.
#[async_trait]
pub trait OsintProvider: Send + Sync {
    fn name(&self) -> &str {
        "osint"
    }

    async fn signals(&self, customer_id: &str) -> RiskMonitorResult<Vec<OsintSignal>>;
}

/// Serves records from a loaded [`Dataset`].
pub struct InMemorySignalSource {
    records: HashMap<String, CustomerRecord>,
}

impl InMemorySignalSource {
    pub fn new(dataset: Dataset) -> Self {
        let records = dataset
            .customers
            .into_iter()
            .map(|r| (r.customer.id.clone(), r))
            .collect();
        Self { records }
    }
}

#[async_trait]
impl SignalSource for InMemorySignalSource {
    async fn load(&self, customer_id: &str) -> RiskMonitorResult<CustomerRecord> {
        self.records
            .get(customer_id)
            .cloned()
            .ok_or_else(|| RiskMonitorError::CustomerNotFound(customer_id.to_string()))
    }
}

/// Serves the signals embedded in a [`Dataset`]; unknown customers have none.
#[derive(Default)]
pub struct StaticOsintProvider {
    signals: HashMap<String, Vec<OsintSignal>>,
}

impl StaticOsintProvider {
    pub fn from_dataset(dataset: &Dataset) -> Self {
        let signals = dataset
            .customers
            .iter()
            .filter_map(|r| {
                r.osint_signals
                    .as_ref()
                    .map(|s| (r.customer.id.clone(), s.clone()))
            })
            .collect();
        Self { signals }
    }
}

#[async_trait]
impl OsintProvider for StaticOsintProvider {
    fn name(&self) -> &str {
        "static"
    }

    async fn signals(&self, customer_id: &str) -> RiskMonitorResult<Vec<OsintSignal>> {
        Ok(self.signals.get(customer_id).cloned().unwrap_or_default())
    }
}
