use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

use parking_lot::Mutex;
use rand::rngs::StdRng;
use rand::{Rng as _, SeedableRng as _};

use super::{ErrorKind, RequestExecutor, RequestOutcome};

/// In-process executor with scripted latency and failures, for exercising the pool and runner
/// without a network.
///
/// Latency is `latency` plus a uniform draw from `0..=jitter`. Each call fails with probability
/// `failure_rate`. Draws come from a seeded RNG, so a given seed yields the same sequence.
#[derive(Debug)]
pub struct StubExecutor {
    latency: Duration,
    jitter: Duration,
    failure_rate: f64,
    rng: Mutex<StdRng>,
    calls: AtomicU64,
}

impl Default for StubExecutor {
    fn default() -> Self {
        Self::new(Duration::from_millis(10))
    }
}

impl StubExecutor {
    #[must_use]
    pub fn new(latency: Duration) -> Self {
        Self {
            latency,
            jitter: Duration::ZERO,
            failure_rate: 0.0,
            rng: Mutex::new(StdRng::seed_from_u64(0)),
            calls: AtomicU64::new(0),
        }
    }

    #[must_use]
    pub fn with_jitter(mut self, jitter: Duration) -> Self {
        self.jitter = jitter;
        self
    }

    /// Probability in `0.0..=1.0` that a call fails; out-of-range values are clamped.
    #[must_use]
    pub fn with_failure_rate(mut self, failure_rate: f64) -> Self {
        self.failure_rate = if failure_rate.is_nan() {
            0.0
        } else {
            failure_rate.clamp(0.0, 1.0)
        };
        self
    }

    #[must_use]
    pub fn with_seed(self, seed: u64) -> Self {
        *self.rng.lock() = StdRng::seed_from_u64(seed);
        self
    }

    /// Number of requests issued so far.
    pub fn calls(&self) -> u64 {
        self.calls.load(Ordering::Relaxed)
    }

    fn draw(&self) -> (Duration, bool) {
        let mut rng = self.rng.lock();

        let jitter_ns = u64::try_from(self.jitter.as_nanos()).unwrap_or(u64::MAX);
        let extra = if jitter_ns == 0 {
            Duration::ZERO
        } else {
            Duration::from_nanos(rng.gen_range(0..=jitter_ns))
        };

        let fail = self.failure_rate > 0.0 && rng.gen_bool(self.failure_rate);
        (self.latency.saturating_add(extra), fail)
    }
}

impl RequestExecutor for StubExecutor {
    async fn execute(&self) -> RequestOutcome {
        let (latency, fail) = self.draw();
        let issued_at = Instant::now();
        self.calls.fetch_add(1, Ordering::Relaxed);

        if !latency.is_zero() {
            tokio::time::sleep(latency).await;
        }

        if fail {
            RequestOutcome::failure(issued_at, latency, ErrorKind::Injected)
        } else {
            RequestOutcome::success(issued_at, latency)
        }
    }
}
