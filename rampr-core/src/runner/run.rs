use std::sync::Arc;
use std::time::Duration;

use rampr_metrics::{MetricsCollector, MetricsSnapshot};
use tokio::time::{Instant, MissedTickBehavior};

use super::cancel::CancelToken;
use super::config::RunnerConfig;
use super::pool::VirtualUserPool;
use super::progress::{LiveMetrics, ProgressFn, ProgressUpdate};
use crate::error::{Error, Result};
use crate::executor::RequestExecutor;
use crate::timeline::StageTimeline;

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, strum::Display, strum::EnumString, strum::IntoStaticStr,
)]
#[strum(serialize_all = "snake_case")]
pub enum RunState {
    Pending,
    Ramping,
    Completed,
    Aborted,
}

impl RunState {
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Completed | Self::Aborted)
    }
}

#[derive(Debug, Clone)]
pub struct RunReport {
    pub state: RunState,
    pub snapshot: MetricsSnapshot,
    pub elapsed: Duration,
    pub total_duration: Duration,
    pub peak_vus: u64,
    pub capped_total: u64,
    /// Virtual users still running after shutdown; zero unless a task refused to stop.
    pub final_vus: u64,
    /// Virtual users cancelled mid-request because the drain grace ran out.
    pub aborted_vus: u64,
}

impl RunReport {
    /// Requests/sec averaged over the whole run.
    pub fn throughput(&self) -> f64 {
        rampr_metrics::per_sec(self.snapshot.requests_total, self.elapsed.as_secs_f64())
    }
}

/// Drives one staged run: ticks the control loop, resizes the pool to the timeline's target
/// and reports progress until the timeline completes or the run is cancelled.
pub struct LoadRunner<E> {
    timeline: StageTimeline,
    executor: Arc<E>,
    config: RunnerConfig,
    metrics: Arc<MetricsCollector>,
    cancel: CancelToken,
    progress: Option<ProgressFn>,
    state: RunState,
}

impl<E: RequestExecutor> LoadRunner<E> {
    pub fn new(timeline: StageTimeline, executor: E, config: RunnerConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            timeline,
            executor: Arc::new(executor),
            config,
            metrics: Arc::new(MetricsCollector::new()),
            cancel: CancelToken::new(),
            progress: None,
            state: RunState::Pending,
        })
    }

    #[must_use]
    pub fn with_progress(mut self, progress: ProgressFn) -> Self {
        self.progress = Some(progress);
        self
    }

    /// Token that aborts the run when cancelled. Clones may be moved to other tasks.
    pub fn cancel_token(&self) -> CancelToken {
        self.cancel.clone()
    }

    pub fn state(&self) -> RunState {
        self.state
    }

    pub fn executor(&self) -> &E {
        &self.executor
    }

    pub async fn run(&mut self) -> Result<RunReport> {
        if self.state != RunState::Pending {
            return Err(Error::AlreadyFinished(self.state));
        }
        if self.timeline.is_complete(Duration::ZERO) {
            return Err(Error::ZeroTotalDuration);
        }

        let total_duration = self.timeline.total_duration();
        let mut pool = VirtualUserPool::new(
            self.executor.clone(),
            self.metrics.clone(),
            self.config.max_vus,
        );

        self.state = RunState::Ramping;
        tracing::info!(
            stages = self.timeline.stages().len(),
            total = ?total_duration,
            max_vus = self.config.max_vus,
            "run started"
        );

        let started = Instant::now();
        let finished = tokio::time::sleep_until(started + total_duration);
        tokio::pin!(finished);
        let cancelled = self.cancel.cancelled();
        tokio::pin!(cancelled);

        let mut interval = tokio::time::interval(self.config.tick);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

        let mut ticker = Ticker::new(started);
        let aborted = loop {
            tokio::select! {
                biased;
                () = &mut cancelled => break true,
                () = &mut finished => break false,
                _ = interval.tick() => {}
            }

            let now = Instant::now();
            let elapsed = now.saturating_duration_since(started);
            if self.timeline.is_complete(elapsed) {
                break false;
            }

            let target = self.timeline.target_at(elapsed);
            let reconciled = pool.reconcile(target);
            let update = ticker.tick(now, &self.metrics);

            if let Some(progress) = &self.progress {
                progress(ProgressUpdate {
                    tick: update.tick,
                    elapsed,
                    interval: update.interval,
                    total_duration,
                    target_vus: reconciled.effective,
                    active_vus: pool.active(),
                    stage: self.timeline.stage_snapshot_at(elapsed),
                    metrics: update.metrics,
                });
            }
        };

        let drained = if aborted {
            tracing::info!(
                grace = ?self.config.drain_grace,
                "run cancelled; stopping virtual users"
            );
            pool.shutdown(self.config.drain_grace).await
        } else {
            pool.drain().await
        };

        self.state = if aborted {
            RunState::Aborted
        } else {
            RunState::Completed
        };

        let elapsed = started.elapsed();
        let snapshot = self.metrics.snapshot();
        tracing::info!(
            state = %self.state,
            elapsed = ?elapsed,
            requests = snapshot.requests_total,
            failed = snapshot.failed_total,
            "run finished"
        );

        Ok(RunReport {
            state: self.state,
            snapshot,
            elapsed,
            total_duration,
            peak_vus: pool.peak(),
            capped_total: pool.capped_total(),
            final_vus: pool.running(),
            aborted_vus: drained.aborted,
        })
    }
}

struct TickMetrics {
    tick: u64,
    interval: Duration,
    metrics: LiveMetrics,
}

/// Per-tick bookkeeping for rps sampling and interval error rates.
struct Ticker {
    tick: u64,
    last_at: Instant,
    last_total: u64,
    last_failed: u64,
}

impl Ticker {
    fn new(started: Instant) -> Self {
        Self {
            tick: 0,
            last_at: started,
            last_total: 0,
            last_failed: 0,
        }
    }

    fn tick(&mut self, now: Instant, metrics: &MetricsCollector) -> TickMetrics {
        self.tick += 1;
        let interval = now.saturating_duration_since(self.last_at);
        self.last_at = now;

        // The first tick fires at t=0 and has no interval to measure.
        let rps_now = if self.tick > 1 {
            metrics.sample_rps(interval)
        } else {
            0.0
        };

        let snap = metrics.snapshot();
        let delta_total = snap.requests_total.saturating_sub(self.last_total);
        let delta_failed = snap.failed_total.saturating_sub(self.last_failed);
        self.last_total = snap.requests_total;
        self.last_failed = snap.failed_total;

        let error_rate_now = if delta_total == 0 {
            0.0
        } else {
            delta_failed as f64 / delta_total as f64
        };

        let ms = |us: Option<f64>| us.map(|v| v / 1000.0);
        let latency = snap.latency_us.as_ref();

        TickMetrics {
            tick: self.tick,
            interval,
            metrics: LiveMetrics {
                rps_now,
                requests_total: snap.requests_total,
                failed_total: snap.failed_total,
                error_rate_now,
                latency_p50_ms: ms(latency.and_then(|l| l.p50)),
                latency_p90_ms: ms(latency.and_then(|l| l.p90)),
                latency_p99_ms: ms(latency.and_then(|l| l.p99)),
                errors: snap.errors,
            },
        }
    }
}
