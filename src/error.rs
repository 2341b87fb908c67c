//! Error taxonomy for the aggregation pipeline.
//!
//! Provider failures stay inside the orchestrator; only `NoDataAvailable`
//! crosses it. Validation failures never touch the cache. Durable-cache
//! write failures are logged and recovered locally.

use thiserror::Error;

use crate::models::{ProviderId, QualityMetrics};

/// A single upstream call failure. Retryable by `RetryPolicy` up to its
/// attempt budget; rate limiting is a wait, never one of these.
#[derive(Debug, Clone, Error)]
pub enum FetchError {
    #[error("upstream unavailable: {0}")]
    UpstreamUnavailable(String),

    #[error("unexpected response shape: {0}")]
    Parse(String),

    #[error("request timed out: {0}")]
    Timeout(String),
}

impl From<reqwest::Error> for FetchError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            FetchError::Timeout(err.to_string())
        } else {
            FetchError::UpstreamUnavailable(err.to_string())
        }
    }
}

/// Terminal outcome of a retried fetch: the attempt budget is exhausted
/// and the last error is carried, not swallowed.
#[derive(Debug, Clone, Error)]
#[error("failed after {attempts} attempts: {last}")]
pub struct FetchFailed {
    pub attempts: u32,
    #[source]
    pub last: FetchError,
}

/// Why one provider produced no quote during a `resolve` call.
#[derive(Debug, Clone)]
pub struct ProviderFailure {
    pub provider: ProviderId,
    pub reason: String,
}

/// Every provider failed (or was abandoned at the fetch deadline) for a
/// symbol. Carries the per-provider reasons for diagnostics.
#[derive(Debug, Clone, Error)]
#[error("no data available for {symbol}: all providers failed")]
pub struct NoDataAvailable {
    pub symbol: String,
    pub reasons: Vec<ProviderFailure>,
}

/// A record was structurally present but failed range or quality checks.
/// The prior cached value, if any, is left untouched.
#[derive(Debug, Clone, Error)]
pub enum DistributionError {
    #[error("validation rejected: {}", reasons.join("; "))]
    ValidationRejected {
        reasons: Vec<String>,
        metrics: QualityMetrics,
    },
}

/// The durable cache tier could not be written. Non-fatal: the in-memory
/// tier keeps serving.
#[derive(Debug, Error)]
#[error("durable cache write failed: {0}")]
pub struct CachePersistError(#[source] pub std::io::Error);

/// Failure surfaced to API consumers.
#[derive(Debug, Error)]
pub enum ServiceError {
    #[error(transparent)]
    NoData(#[from] NoDataAvailable),

    #[error(transparent)]
    Distribution(#[from] DistributionError),

    #[error("unknown symbol: {0}")]
    UnknownSymbol(String),
}
