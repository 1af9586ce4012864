//! Async evaluation engine.
//!
//! Loads customer data and OSINT signals concurrently, bounds the OSINT call
//! with a timeout, runs the pure scoring pipeline and keeps the latest score
//! per customer.

pub mod sources;

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use futures::stream::{self, StreamExt};
use tokio::sync::RwLock;
use tracing::{info, warn};

use crate::config::ScoringConfig;
use crate::error::RiskMonitorError;
use crate::explain;
use crate::scoring::{base_subscores, combiner, osint};
use crate::types::{Customer, OsintAdjustment, RiskScore, SubScore};
use crate::RiskMonitorResult;

pub use sources::{InMemorySignalSource, OsintProvider, SignalSource, StaticOsintProvider};

pub struct RiskEngine {
    config: Arc<ScoringConfig>,
    source: Arc<dyn SignalSource>,
    osint: Option<Arc<dyn OsintProvider>>,
    latest: RwLock<HashMap<String, Arc<RiskScore>>>,
}

impl RiskEngine {
    /// Fails with `Configuration` when the config does not validate.
    pub fn new(config: ScoringConfig, source: Arc<dyn SignalSource>) -> RiskMonitorResult<Self> {
        config.validate()?;
        Ok(Self {
            config: Arc::new(config),
            source,
            osint: None,
            latest: RwLock::new(HashMap::new()),
        })
    }

    pub fn with_osint(mut self, provider: Arc<dyn OsintProvider>) -> Self {
        self.osint = Some(provider);
        self
    }

    pub async fn evaluate(&self, customer_id: &str) -> RiskMonitorResult<RiskScore> {
        self.evaluate_at(customer_id, Utc::now()).await
    }

    /// Score a customer as of a fixed instant. Identical data and `as_of`
    /// give an identical RiskScore.
    pub async fn evaluate_at(
        &self,
        customer_id: &str,
        as_of: DateTime<Utc>,
    ) -> RiskMonitorResult<RiskScore> {
        let (adjustment, base) = tokio::join!(
            self.fetch_osint(customer_id),
            self.load_subscores(customer_id, as_of)
        );
        let (customer, credit, aml) = base?;

        let score = combiner::combine(&customer, credit, aml, adjustment, &self.config, as_of);
        self.remember(&score).await;

        info!(
            customer = customer_id,
            combined = %score.combined_value,
            tier = %score.tier,
            "customer evaluated"
        );
        Ok(score)
    }

    /// Score several customers with at most `concurrency` in flight.
    /// Results come back in input order, one per id.
    pub async fn evaluate_many_at(
        &self,
        customer_ids: &[String],
        as_of: DateTime<Utc>,
        concurrency: usize,
    ) -> Vec<RiskMonitorResult<RiskScore>> {
        stream::iter(customer_ids)
            .map(|id| self.evaluate_at(id, as_of))
            .buffered(concurrency.max(1))
            .collect()
            .await
    }

    pub async fn evaluate_many(
        &self,
        customer_ids: &[String],
        concurrency: usize,
    ) -> Vec<RiskMonitorResult<RiskScore>> {
        self.evaluate_many_at(customer_ids, Utc::now(), concurrency).await
    }

    pub async fn latest(&self, customer_id: &str) -> Option<Arc<RiskScore>> {
        self.latest.read().await.get(customer_id).cloned()
    }

    /// Re-render the explanation of a stored score with the engine's
    /// materiality.
    pub fn explain(&self, score: &RiskScore) -> Vec<String> {
        explain::explain(score, self.config.explain.materiality)
    }

    async fn load_subscores(
        &self,
        customer_id: &str,
        as_of: DateTime<Utc>,
    ) -> RiskMonitorResult<(Customer, SubScore, SubScore)> {
        let record = self.source.load(customer_id).await?;
        let (credit, aml) =
            base_subscores(&record.customer, &record.transactions, &self.config, as_of)?;
        Ok((record.customer, credit, aml))
    }

    async fn fetch_osint(&self, customer_id: &str) -> OsintAdjustment {
        let Some(provider) = &self.osint else {
            return OsintAdjustment::no_external_signal();
        };
        let limit = Duration::from_millis(self.config.osint.timeout_ms);

        let result = match tokio::time::timeout(limit, provider.signals(customer_id)).await {
            Ok(result) => result,
            Err(_) => Err(RiskMonitorError::SignalUnavailable {
                provider: provider.name().to_string(),
                reason: format!("timed out after {} ms", self.config.osint.timeout_ms),
            }),
        };
        let adjusted = result
            .and_then(|signals| osint::adjust(Some(signals.as_slice()), &self.config.osint));

        match adjusted {
            Ok(adjustment) => adjustment,
            Err(e) => {
                warn!(
                    customer = customer_id,
                    provider = provider.name(),
                    error = %e,
                    "OSINT unavailable, scoring without it"
                );
                OsintAdjustment::unavailable(e.to_string())
            }
        }
    }

    /// Keep the newest score; an older `as_of` never replaces a newer one.
    async fn remember(&self, score: &RiskScore) {
        let mut latest = self.latest.write().await;
        let newer = latest
            .get(&score.customer_id)
            .map_or(true, |current| current.generated_at <= score.generated_at);
        if newer {
            latest.insert(score.customer_id.clone(), Arc::new(score.clone()));
        }
    }
}
