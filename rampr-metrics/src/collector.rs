use std::collections::BTreeMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use hdrhistogram::Histogram;
use parking_lot::{Mutex, MutexGuard};

use crate::histogram::{HistogramSummary, new_latency_histogram, summarize_histogram};
use crate::outcome::{ErrorKind, RequestOutcome};
use crate::stats::{CounterSnapshot, RunningStats, per_sec};

const DEFAULT_SHARDS: usize = 16;

#[derive(Debug)]
struct Shard {
    requests_total: u64,
    success_total: u64,
    errors: BTreeMap<ErrorKind, u64>,
    latency_us: Histogram<u64>,
}

impl Shard {
    fn new() -> Self {
        Self {
            requests_total: 0,
            success_total: 0,
            errors: BTreeMap::new(),
            latency_us: new_latency_histogram(),
        }
    }

    fn record(&mut self, outcome: &RequestOutcome) {
        self.requests_total = self.requests_total.saturating_add(1);
        if outcome.success {
            self.success_total = self.success_total.saturating_add(1);
        } else {
            let kind = outcome.error_kind.unwrap_or(ErrorKind::Transport("unknown"));
            *self.errors.entry(kind).or_insert(0) += 1;
        }

        let us = u64::try_from(outcome.latency.as_micros()).unwrap_or(u64::MAX);
        self.latency_us.saturating_record(us);
    }
}

#[derive(Debug, Default)]
struct RpsSampler {
    last: Option<CounterSnapshot>,
    now: f64,
    stats: RunningStats,
}

/// Requests/sec sampled once per control tick.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct RpsSummary {
    pub now: f64,
    pub avg: f64,
    pub stdev: f64,
    pub max: f64,
    pub samples: u64,
}

/// Consistent, read-only view over everything recorded so far.
#[derive(Debug, Clone, PartialEq)]
pub struct MetricsSnapshot {
    pub requests_total: u64,
    pub success_total: u64,
    pub failed_total: u64,
    /// Failed requests keyed by error label (`timeout`, `http_status:503`, ...).
    pub errors: BTreeMap<String, u64>,
    /// Latency in microseconds; `None` until the first outcome is recorded.
    pub latency_us: Option<HistogramSummary>,
    pub rps: RpsSummary,
}

impl MetricsSnapshot {
    #[must_use]
    pub fn error_rate(&self) -> f64 {
        if self.requests_total == 0 {
            return 0.0;
        }
        self.failed_total as f64 / self.requests_total as f64
    }
}

/// Aggregates request outcomes from many concurrent virtual users.
///
/// Outcomes are spread across a fixed number of mutex-protected shards so that writers rarely
/// contend. [`MetricsCollector::snapshot`] holds every shard lock at once while reading, which
/// makes each snapshot a consistent cut: counters, error breakdown and histogram count always
/// agree, and totals never go backwards between snapshots. Memory is bounded by the shard
/// count and histogram precision, not by the number of recorded outcomes.
#[derive(Debug)]
pub struct MetricsCollector {
    shards: Box<[Mutex<Shard>]>,
    next_shard: AtomicUsize,
    rps: Mutex<RpsSampler>,
}

impl Default for MetricsCollector {
    fn default() -> Self {
        Self::with_shards(DEFAULT_SHARDS)
    }
}

impl MetricsCollector {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_shards(shards: usize) -> Self {
        let shards = (0..shards.max(1)).map(|_| Mutex::new(Shard::new())).collect();
        Self {
            shards,
            next_shard: AtomicUsize::new(0),
            rps: Mutex::new(RpsSampler::default()),
        }
    }

    pub fn record(&self, outcome: &RequestOutcome) {
        let idx = self.next_shard.fetch_add(1, Ordering::Relaxed) % self.shards.len();
        self.shards[idx].lock().record(outcome);
    }

    fn lock_all(&self) -> Vec<MutexGuard<'_, Shard>> {
        // Always acquired in index order; `record` only ever holds a single shard.
        self.shards.iter().map(|s| s.lock()).collect()
    }

    pub fn requests_total(&self) -> u64 {
        self.lock_all()
            .iter()
            .map(|s| s.requests_total)
            .fold(0u64, u64::saturating_add)
    }

    /// Samples throughput since the previous call. `dt` is the wall time between samples.
    pub fn sample_rps(&self, dt: Duration) -> f64 {
        let total = CounterSnapshot::new(self.requests_total());

        let mut rps = self.rps.lock();
        let now = per_sec(total.delta_since(rps.last), dt.as_secs_f64());
        rps.last = Some(total);
        rps.now = now;
        rps.stats.push(now);
        now
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        let mut requests_total = 0u64;
        let mut success_total = 0u64;
        let mut errors: BTreeMap<String, u64> = BTreeMap::new();
        let mut latency = new_latency_histogram();

        {
            let guards = self.lock_all();
            for shard in &guards {
                requests_total = requests_total.saturating_add(shard.requests_total);
                success_total = success_total.saturating_add(shard.success_total);
                for (kind, count) in &shard.errors {
                    *errors.entry(kind.to_string()).or_insert(0) += count;
                }
                if let Err(err) = latency.add(&shard.latency_us) {
                    tracing::warn!(
                        error = ?err,
                        samples = shard.latency_us.len(),
                        "latency shard not merged"
                    );
                }
            }
        }

        let rps = {
            let rps = self.rps.lock();
            RpsSummary {
                now: rps.now,
                avg: rps.stats.mean(),
                stdev: rps.stats.stdev(),
                max: rps.stats.max(),
                samples: rps.stats.count(),
            }
        };

        MetricsSnapshot {
            requests_total,
            success_total,
            failed_total: requests_total.saturating_sub(success_total),
            errors,
            latency_us: (requests_total > 0).then(|| summarize_histogram(&latency)),
            rps,
        }
    }
}
