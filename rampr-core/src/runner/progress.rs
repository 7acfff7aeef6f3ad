use std::collections::BTreeMap;
use std::time::Duration;

use crate::timeline::StageSnapshot;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct LiveMetrics {
    /// Requests/sec observed during the last progress interval.
    pub rps_now: f64,

    /// Total requests observed so far.
    pub requests_total: u64,

    /// Total failed requests observed so far.
    pub failed_total: u64,

    /// Failed requests / total requests during the last progress interval (0..=1).
    pub error_rate_now: f64,

    /// Latency percentiles (milliseconds) across the whole run so far.
    pub latency_p50_ms: Option<f64>,
    pub latency_p90_ms: Option<f64>,
    pub latency_p99_ms: Option<f64>,

    /// Error breakdown across the whole run so far, keyed by error kind.
    pub errors: BTreeMap<String, u64>,
}

#[derive(Debug, Clone)]
pub struct ProgressUpdate {
    /// Monotonic tick counter (1-based).
    pub tick: u64,
    pub elapsed: Duration,
    /// Time since the previous update.
    pub interval: Duration,
    pub total_duration: Duration,
    pub target_vus: u64,
    pub active_vus: u64,
    pub stage: StageSnapshot,
    pub metrics: LiveMetrics,
}

pub type ProgressFn = std::sync::Arc<dyn Fn(ProgressUpdate) + Send + Sync + 'static>;
