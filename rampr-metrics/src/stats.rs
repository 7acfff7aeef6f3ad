/// Welford running mean/variance with a running max.
#[derive(Debug, Default, Clone, Copy)]
pub struct RunningStats {
    n: u64,
    mean: f64,
    m2: f64,
    max: f64,
}

impl RunningStats {
    pub fn push(&mut self, x: f64) {
        self.n = self.n.saturating_add(1);
        let n_f = self.n as f64;

        let delta = x - self.mean;
        self.mean += delta / n_f;
        let delta2 = x - self.mean;
        self.m2 += delta * delta2;

        if x > self.max {
            self.max = x;
        }
    }

    pub fn count(&self) -> u64 {
        self.n
    }

    pub fn mean(&self) -> f64 {
        self.mean
    }

    pub fn stdev(&self) -> f64 {
        if self.n < 2 {
            return 0.0;
        }
        (self.m2 / (self.n as f64 - 1.0)).sqrt()
    }

    pub fn max(&self) -> f64 {
        self.max
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CounterSnapshot {
    pub total: u64,
}

impl CounterSnapshot {
    pub fn new(total: u64) -> Self {
        Self { total }
    }

    pub fn delta_since(self, prev: Option<Self>) -> u64 {
        match prev {
            Some(prev) => self.total.saturating_sub(prev.total),
            None => self.total,
        }
    }
}

#[inline]
pub fn per_sec(delta: u64, dt_secs: f64) -> f64 {
    // Clamp so a zero-length interval never divides by zero.
    let dt = dt_secs.max(1e-9);
    delta as f64 / dt
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counter_snapshot_delta_and_rate() {
        let now = CounterSnapshot::new(10);
        assert_eq!(now.delta_since(None), 10);
        assert_eq!(now.delta_since(Some(CounterSnapshot::new(7))), 3);
        assert_eq!(now.delta_since(Some(CounterSnapshot::new(999))), 0);

        let delta = now.delta_since(Some(CounterSnapshot::new(7)));
        assert!((per_sec(delta, 1.0) - 3.0).abs() < 1e-9);

        // dt=0 must not panic.
        assert!(per_sec(delta, 0.0).is_finite());
    }

    #[test]
    fn running_stats_mean_stdev_max() {
        let mut s = RunningStats::default();
        for x in [2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0] {
            s.push(x);
        }

        assert_eq!(s.count(), 8);
        assert!((s.mean() - 5.0).abs() < 1e-9);
        assert!((s.stdev() - 2.138_089_935).abs() < 1e-6);
        assert!((s.max() - 9.0).abs() < 1e-9);
    }

    #[test]
    fn running_stats_single_sample_has_zero_stdev() {
        let mut s = RunningStats::default();
        s.push(3.0);
        assert_eq!(s.stdev(), 0.0);
    }
}
