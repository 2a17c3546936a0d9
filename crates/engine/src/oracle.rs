//! Content Oracle seam
//!
//! The engine only ever talks to the oracle through [`OracleGate`], which
//! caps in-flight exchanges across sessions and bounds each exchange by a
//! timeout. Every session gets its own gate handle carrying its usage counter.

use crate::error::OracleError;
use async_trait::async_trait;
use nodepatch_protocol::{PatchRequest, RelevanceRequest};
use serde::{Deserialize, Serialize};
use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Semaphore;

/// External reasoning service answering the two versioned exchanges
///
/// Implementations return the raw response text; decoding is the engine's job.
#[async_trait]
pub trait ContentOracle: Send + Sync {
    /// Answer a `relevance/v1` request
    async fn assess_relevance(&self, request: &RelevanceRequest) -> Result<String, OracleError>;

    /// Answer a `patch/v1` request
    async fn propose_edits(&self, request: &PatchRequest) -> Result<String, OracleError>;
}

/// Session-scoped oracle usage counter (monotonic)
#[derive(Debug, Default)]
pub struct OracleUsage {
    calls: AtomicU64,
    failures: AtomicU64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OracleUsageSnapshot {
    pub calls: u64,
    pub failures: u64,
}

impl OracleUsage {
    pub fn snapshot(&self) -> OracleUsageSnapshot {
        OracleUsageSnapshot {
            calls: self.calls.load(Ordering::Relaxed),
            failures: self.failures.load(Ordering::Relaxed),
        }
    }
}

pub struct OracleGate {
    oracle: Arc<dyn ContentOracle>,
    permits: Arc<Semaphore>,
    timeout: Duration,
    usage: Arc<OracleUsage>,
}

impl OracleGate {
    pub fn new(oracle: Arc<dyn ContentOracle>, concurrency: usize, timeout: Duration) -> Self {
        Self {
            oracle,
            permits: Arc::new(Semaphore::new(concurrency.max(1))),
            timeout,
            usage: Arc::new(OracleUsage::default()),
        }
    }

    /// Gate for a new session: same oracle and concurrency cap, fresh usage counter
    pub fn for_session(&self) -> Self {
        Self {
            oracle: Arc::clone(&self.oracle),
            permits: Arc::clone(&self.permits),
            timeout: self.timeout,
            usage: Arc::new(OracleUsage::default()),
        }
    }

    pub fn usage(&self) -> Arc<OracleUsage> {
        Arc::clone(&self.usage)
    }

    pub async fn assess_relevance(&self, request: &RelevanceRequest) -> Result<String, OracleError> {
        self.guarded("relevance", self.oracle.assess_relevance(request)).await
    }

    pub async fn propose_edits(&self, request: &PatchRequest) -> Result<String, OracleError> {
        self.guarded("patch", self.oracle.propose_edits(request)).await
    }

    async fn guarded<F>(&self, exchange: &str, call: F) -> Result<String, OracleError>
    where
        F: Future<Output = Result<String, OracleError>>,
    {
        let _permit = self
            .permits
            .acquire()
            .await
            .map_err(|_| OracleError::unavailable("oracle gate closed"))?;
        self.usage.calls.fetch_add(1, Ordering::Relaxed);

        let result = match tokio::time::timeout(self.timeout, call).await {
            Ok(result) => result,
            Err(_) => Err(OracleError::Timeout(self.timeout.as_secs())),
        };
        if let Err(e) = &result {
            self.usage.failures.fetch_add(1, Ordering::Relaxed);
            log::warn!("Oracle {exchange} exchange failed: {e}");
        }
        result
    }
}
