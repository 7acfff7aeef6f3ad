use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

use futures::FutureExt as _;
use rampr_metrics::MetricsCollector;
use tokio::task::JoinHandle;

use crate::executor::{ErrorKind, RequestExecutor, RequestOutcome};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, strum::Display, strum::IntoStaticStr)]
#[strum(serialize_all = "snake_case")]
pub enum VuState {
    Running,
    /// Signaled to stop; finishing its in-flight request.
    Stopping,
    Stopped,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReconcileOutcome {
    /// Target as requested by the caller.
    pub requested: u64,
    /// Target after clamping to the hard cap.
    pub effective: u64,
    pub spawned: u64,
    pub stopped: u64,
    pub capped: bool,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DrainOutcome {
    /// Workers that finished their in-flight request and exited on their own.
    pub stopped: u64,
    /// Workers that were still running when the grace period ran out.
    pub aborted: u64,
}

#[derive(Debug)]
struct VirtualUser {
    id: u64,
    stop: Arc<AtomicBool>,
    handle: JoinHandle<()>,
}

impl VirtualUser {
    fn signal_stop(&self) {
        self.stop.store(true, Ordering::Release);
    }
}

/// Set of closed-loop request workers, resized to a target count by [`reconcile`].
///
/// Scale-down never cancels a request mid-flight: excess workers are flagged and exit after
/// their current request completes. Stopped workers are reaped on later reconciles.
///
/// [`reconcile`]: VirtualUserPool::reconcile
#[derive(Debug)]
pub struct VirtualUserPool<E> {
    executor: Arc<E>,
    metrics: Arc<MetricsCollector>,
    max_vus: u64,
    next_id: u64,
    active: Vec<VirtualUser>,
    draining: Vec<VirtualUser>,
    peak: u64,
    capped_total: u64,
    last_capped_request: Option<u64>,
}

impl<E: RequestExecutor> VirtualUserPool<E> {
    pub fn new(executor: Arc<E>, metrics: Arc<MetricsCollector>, max_vus: u64) -> Self {
        Self {
            executor,
            metrics,
            max_vus,
            next_id: 1,
            active: Vec::new(),
            draining: Vec::new(),
            peak: 0,
            capped_total: 0,
            last_capped_request: None,
        }
    }

    /// Moves the active worker count toward `target` without waiting for anything.
    ///
    /// Must be called from within a Tokio runtime.
    pub fn reconcile(&mut self, target: u64) -> ReconcileOutcome {
        self.reap();

        let effective = target.min(self.max_vus);
        let capped = effective < target;
        if capped {
            if self.last_capped_request != Some(target) {
                self.capped_total += 1;
            }
            tracing::debug!(
                requested = target,
                max_vus = self.max_vus,
                "target exceeds max_vus; clamped"
            );
        }
        self.last_capped_request = capped.then_some(target);

        let current = self.active.len() as u64;
        let mut spawned = 0;
        let mut stopped = 0;

        if effective > current {
            // Stopping workers still hold a slot under the cap until their request lands.
            let stopping = self.stopping();
            let room = self.max_vus.saturating_sub(stopping);
            let want = effective.min(room);
            for _ in current..want.max(current) {
                self.spawn_one();
                spawned += 1;
            }
            if want < effective {
                tracing::debug!(
                    target = effective,
                    stopping,
                    deferred = effective - want.max(current),
                    "scale-up deferred until stopping virtual users exit"
                );
            }
        } else {
            // Most recently spawned first.
            while self.active.len() as u64 > effective {
                let Some(vu) = self.active.pop() else { break };
                vu.signal_stop();
                self.draining.push(vu);
                stopped += 1;
            }
        }

        self.peak = self.peak.max(self.active.len() as u64);

        if spawned > 0 || stopped > 0 {
            tracing::debug!(
                target = effective,
                spawned,
                stopped,
                active = self.active.len(),
                "reconciled virtual users"
            );
        }

        ReconcileOutcome {
            requested: target,
            effective,
            spawned,
            stopped,
            capped,
        }
    }

    fn spawn_one(&mut self) {
        let id = self.next_id;
        self.next_id += 1;

        let stop = Arc::new(AtomicBool::new(false));
        let handle = tokio::spawn(worker_loop(
            id,
            self.executor.clone(),
            self.metrics.clone(),
            stop.clone(),
        ));
        self.active.push(VirtualUser { id, stop, handle });
    }

    fn reap(&mut self) {
        self.draining.retain(|vu| !vu.handle.is_finished());
    }

    /// Workers currently assigned to the target (not signaled to stop).
    pub fn active(&self) -> u64 {
        self.active.len() as u64
    }

    fn stopping(&self) -> u64 {
        self.draining
            .iter()
            .filter(|vu| !vu.handle.is_finished())
            .count() as u64
    }

    /// Active workers plus stopping workers whose task has not exited yet.
    pub fn running(&self) -> u64 {
        self.active.len() as u64 + self.stopping()
    }

    pub fn peak(&self) -> u64 {
        self.peak
    }

    pub fn max_vus(&self) -> u64 {
        self.max_vus
    }

    /// Number of distinct over-cap targets that were clamped to `max_vus`.
    pub fn capped_total(&self) -> u64 {
        self.capped_total
    }

    pub fn users(&self) -> Vec<(u64, VuState)> {
        let active = self.active.iter().map(|vu| (vu.id, VuState::Running));
        let draining = self.draining.iter().map(|vu| {
            let state = if vu.handle.is_finished() {
                VuState::Stopped
            } else {
                VuState::Stopping
            };
            (vu.id, state)
        });
        let mut out: Vec<_> = active.chain(draining).collect();
        out.sort_unstable_by_key(|(id, _)| *id);
        out
    }

    /// Stops every worker and waits for all in-flight requests to finish.
    pub async fn drain(&mut self) -> DrainOutcome {
        self.stop_all();

        let mut out = DrainOutcome::default();
        for vu in self.draining.drain(..) {
            if let Err(err) = vu.handle.await {
                tracing::warn!(vu = vu.id, error = %err, "virtual user task failed");
            }
            out.stopped += 1;
        }
        out
    }

    /// Stops every worker, waits up to `grace` for in-flight requests, then aborts the rest.
    pub async fn shutdown(&mut self, grace: Duration) -> DrainOutcome {
        self.stop_all();

        let deadline = tokio::time::Instant::now() + grace;
        let mut out = DrainOutcome::default();
        for mut vu in self.draining.drain(..) {
            match tokio::time::timeout_at(deadline, &mut vu.handle).await {
                Ok(Ok(())) => out.stopped += 1,
                Ok(Err(err)) => {
                    tracing::warn!(vu = vu.id, error = %err, "virtual user task failed");
                    out.stopped += 1;
                }
                Err(_) => {
                    vu.handle.abort();
                    let _ = vu.handle.await;
                    out.aborted += 1;
                }
            }
        }

        if out.aborted > 0 {
            tracing::warn!(
                aborted = out.aborted,
                grace = ?grace,
                "virtual users still busy after drain grace; aborted"
            );
        }
        out
    }

    fn stop_all(&mut self) {
        for vu in self.active.drain(..) {
            vu.signal_stop();
            self.draining.push(vu);
        }
    }
}

impl<E> Drop for VirtualUserPool<E> {
    fn drop(&mut self) {
        for vu in self.active.iter().chain(self.draining.iter()) {
            vu.signal_stop();
        }
    }
}

async fn worker_loop<E: RequestExecutor>(
    id: u64,
    executor: Arc<E>,
    metrics: Arc<MetricsCollector>,
    stop: Arc<AtomicBool>,
) {
    tracing::trace!(vu = id, "virtual user started");

    while !stop.load(Ordering::Acquire) {
        let issued_at = Instant::now();
        let outcome = match AssertUnwindSafe(executor.execute()).catch_unwind().await {
            Ok(outcome) => outcome,
            Err(_) => {
                tracing::debug!(vu = id, "request executor panicked");
                RequestOutcome::failure(issued_at, issued_at.elapsed(), ErrorKind::Panicked)
            }
        };
        metrics.record(&outcome);

        tokio::task::yield_now().await;
    }

    tracing::trace!(vu = id, "virtual user stopped");
}
