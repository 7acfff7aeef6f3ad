use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

use parking_lot::Mutex;
use rampr_core::{
    Error, ErrorKind, LoadRunner, MetricsCollector, ProgressUpdate, RequestExecutor,
    RequestOutcome, RunState, RunnerConfig, Stage, StageTimeline, StubExecutor, VirtualUserPool,
};

fn timeline(stages: &[(u64, u64)]) -> StageTimeline {
    let stages = stages
        .iter()
        .map(|&(ms, target)| Stage::new(Duration::from_millis(ms), target))
        .collect();
    StageTimeline::new(stages).unwrap_or_else(|e| panic!("timeline: {e}"))
}

fn fast_config() -> RunnerConfig {
    RunnerConfig {
        tick: Duration::from_millis(100),
        ..RunnerConfig::default()
    }
}

fn init_tracing() {
    let _ = tracing_subscriber::fmt().with_test_writer().try_init();
}

#[tokio::test(start_paused = true)]
async fn zero_length_first_stage_jumps_straight_to_target() {
    let t = timeline(&[(0, 10)]);
    assert_eq!(t.target_at(Duration::ZERO), 10);

    let metrics = Arc::new(MetricsCollector::new());
    let stub = Arc::new(StubExecutor::new(Duration::from_millis(10)));
    let mut pool = VirtualUserPool::new(stub, metrics, 5_000);

    let out = pool.reconcile(t.target_at(Duration::ZERO));
    assert_eq!(out.spawned, 10);
    assert_eq!(pool.active(), 10);

    pool.drain().await;
    assert_eq!(pool.running(), 0);
}

#[tokio::test(start_paused = true)]
async fn zero_total_duration_is_rejected_before_ramping() {
    let mut runner = LoadRunner::new(timeline(&[(0, 10)]), StubExecutor::default(), fast_config())
        .unwrap_or_else(|e| panic!("runner: {e}"));

    let err = runner.run().await.err();
    assert!(matches!(err, Some(Error::ZeroTotalDuration)));
    assert!(err.is_some_and(|e| e.is_configuration()));
    assert_eq!(runner.state(), RunState::Pending);
}

#[test]
fn invalid_runner_config_is_rejected() {
    let cfg = RunnerConfig {
        max_vus: 0,
        ..RunnerConfig::default()
    };
    let res = LoadRunner::new(timeline(&[(1_000, 1)]), StubExecutor::default(), cfg);
    assert!(matches!(res, Err(Error::InvalidMaxVus)));
}

#[tokio::test(start_paused = true)]
async fn completed_run_ramps_up_and_drains() {
    init_tracing();

    let updates: Arc<Mutex<Vec<ProgressUpdate>>> = Arc::default();
    let sink = updates.clone();

    let mut runner = LoadRunner::new(
        timeline(&[(1_000, 10), (1_000, 10), (1_000, 0)]),
        StubExecutor::new(Duration::from_millis(10)),
        fast_config(),
    )
    .unwrap_or_else(|e| panic!("runner: {e}"))
    .with_progress(Arc::new(move |u| sink.lock().push(u)));

    let report = runner
        .run()
        .await
        .unwrap_or_else(|e| panic!("run: {e}"));

    assert_eq!(report.state, RunState::Completed);
    assert_eq!(runner.state(), RunState::Completed);
    assert_eq!(report.peak_vus, 10);
    assert_eq!(report.final_vus, 0);
    assert_eq!(report.capped_total, 0);
    assert_eq!(report.snapshot.failed_total, 0);
    assert_eq!(report.snapshot.requests_total, runner.executor().calls());
    assert!(report.snapshot.requests_total > 0);
    assert!(report.elapsed >= Duration::from_secs(3));
    assert!(report.snapshot.rps.samples > 0);

    let updates = updates.lock();
    assert!(updates.len() >= 25, "got {} updates", updates.len());
    assert_eq!(updates[0].tick, 1);
    assert_eq!(updates[0].target_vus, 0);
    for pair in updates.windows(2) {
        assert_eq!(pair[1].tick, pair[0].tick + 1);
        assert!(pair[1].metrics.requests_total >= pair[0].metrics.requests_total);
    }
    assert!(updates.iter().all(|u| u.target_vus <= 10));
    assert!(updates.iter().any(|u| u.stage.index == 1 && u.active_vus == 10));

    assert!(matches!(
        runner.run().await,
        Err(Error::AlreadyFinished(RunState::Completed))
    ));
}

#[tokio::test(start_paused = true)]
async fn cancellation_mid_run_aborts_with_partial_metrics() {
    let mut runner = LoadRunner::new(
        timeline(&[(10_000, 20), (10_000, 20)]),
        StubExecutor::new(Duration::from_millis(10)),
        fast_config(),
    )
    .unwrap_or_else(|e| panic!("runner: {e}"));

    let token = runner.cancel_token();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_secs(2)).await;
        token.cancel();
    });

    let report = runner
        .run()
        .await
        .unwrap_or_else(|e| panic!("run: {e}"));

    assert_eq!(report.state, RunState::Aborted);
    assert!(report.snapshot.requests_total > 0);
    assert_eq!(report.final_vus, 0);
    assert_eq!(report.aborted_vus, 0);
    assert!(report.elapsed < report.total_duration);
    assert!(matches!(
        runner.run().await,
        Err(Error::AlreadyFinished(RunState::Aborted))
    ));
}

#[tokio::test(start_paused = true)]
async fn every_request_failing_still_completes() {
    let mut runner = LoadRunner::new(
        timeline(&[(1_000, 5)]),
        StubExecutor::new(Duration::from_millis(10)).with_failure_rate(1.0),
        fast_config(),
    )
    .unwrap_or_else(|e| panic!("runner: {e}"));

    let report = runner
        .run()
        .await
        .unwrap_or_else(|e| panic!("run: {e}"));

    let snap = &report.snapshot;
    assert_eq!(report.state, RunState::Completed);
    assert_eq!(snap.success_total, 0);
    assert!(snap.requests_total > 0);
    assert_eq!(snap.requests_total, runner.executor().calls());
    assert_eq!(snap.failed_total, snap.requests_total);
    assert_eq!(snap.errors.get("injected"), Some(&snap.requests_total));
    assert_eq!(snap.error_rate(), 1.0);
}

#[tokio::test(start_paused = true)]
async fn targets_above_max_vus_are_clamped() {
    let cfg = RunnerConfig {
        max_vus: 3,
        ..fast_config()
    };
    let mut runner = LoadRunner::new(
        timeline(&[(1_000, 10)]),
        StubExecutor::new(Duration::from_millis(10)),
        cfg,
    )
    .unwrap_or_else(|e| panic!("runner: {e}"));

    let report = runner
        .run()
        .await
        .unwrap_or_else(|e| panic!("run: {e}"));

    assert_eq!(report.state, RunState::Completed);
    assert_eq!(report.peak_vus, 3);
    assert!(report.capped_total > 0);
}

#[derive(Debug, Default)]
struct PanicsEveryOtherCall {
    calls: AtomicU64,
}

impl RequestExecutor for PanicsEveryOtherCall {
    async fn execute(&self) -> RequestOutcome {
        let n = self.calls.fetch_add(1, Ordering::Relaxed);
        let issued_at = Instant::now();
        tokio::time::sleep(Duration::from_millis(5)).await;
        if n % 2 == 0 {
            panic!("executor blew up on call {n}");
        }
        RequestOutcome::success(issued_at, issued_at.elapsed())
    }
}

#[tokio::test(start_paused = true)]
async fn executor_panics_are_recorded_not_fatal() {
    let mut runner = LoadRunner::new(
        timeline(&[(500, 2)]),
        PanicsEveryOtherCall::default(),
        fast_config(),
    )
    .unwrap_or_else(|e| panic!("runner: {e}"));

    let report = runner
        .run()
        .await
        .unwrap_or_else(|e| panic!("run: {e}"));

    let snap = &report.snapshot;
    assert_eq!(report.state, RunState::Completed);
    assert!(snap.success_total > 0);
    assert!(snap.errors.get(&ErrorKind::Panicked.to_string()).is_some_and(|n| *n > 0));
    assert_eq!(snap.requests_total, runner.executor().calls.load(Ordering::Relaxed));
}
