use std::time::Duration;

use crate::error::{Error, Result};
use crate::stage::Stage;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StageSnapshot {
    pub index: usize,
    pub count: usize,
    pub stage_elapsed: Duration,
    pub stage_remaining: Duration,
    pub start_target: u64,
    pub end_target: u64,
    pub current_target: u64,
}

/// Immutable ramp profile: target concurrency as a function of elapsed run time.
///
/// Each stage ramps linearly from the previous stage's target (0 before the first stage) to
/// its own target. A zero-length stage is an instantaneous jump.
#[derive(Debug, Clone)]
pub struct StageTimeline {
    stages: Vec<Stage>,
    cumulative_ends: Vec<Duration>,
}

impl StageTimeline {
    pub fn new(stages: Vec<Stage>) -> Result<Self> {
        if stages.is_empty() {
            return Err(Error::EmptyStages);
        }

        let mut cumulative_ends = Vec::with_capacity(stages.len());
        let mut acc = Duration::ZERO;
        for s in &stages {
            acc = acc.saturating_add(s.duration);
            cumulative_ends.push(acc);
        }

        Ok(Self {
            stages,
            cumulative_ends,
        })
    }

    pub fn stages(&self) -> &[Stage] {
        &self.stages
    }

    pub fn total_duration(&self) -> Duration {
        self.cumulative_ends
            .last()
            .copied()
            .unwrap_or(Duration::ZERO)
    }

    pub fn is_complete(&self, elapsed: Duration) -> bool {
        elapsed >= self.total_duration()
    }

    /// Index of the stage in effect at `elapsed`: the first one that ends strictly after it.
    /// Callers must have ruled out `elapsed >= total_duration`.
    fn active_index(&self, elapsed: Duration) -> usize {
        self.cumulative_ends.partition_point(|end| *end <= elapsed)
    }

    fn stage_start(&self, idx: usize) -> Duration {
        if idx == 0 {
            Duration::ZERO
        } else {
            self.cumulative_ends[idx - 1]
        }
    }

    fn start_target(&self, idx: usize) -> u64 {
        if idx == 0 { 0 } else { self.stages[idx - 1].target }
    }

    fn last_target(&self) -> u64 {
        self.stages.last().map_or(0, |s| s.target)
    }

    pub fn target_at(&self, elapsed: Duration) -> u64 {
        if self.is_complete(elapsed) {
            return self.last_target();
        }

        let idx = self.active_index(elapsed);
        let stage_start = self.stage_start(idx);
        let stage_duration = self.cumulative_ends[idx].saturating_sub(stage_start);
        let stage_elapsed = elapsed.saturating_sub(stage_start);

        let start_target = self.start_target(idx);
        let end_target = self.stages[idx].target;

        if stage_duration.is_zero() {
            return end_target;
        }

        // Linear interpolation across the stage.
        let start_i = start_target as i128;
        let delta = end_target as i128 - start_i;

        let num = stage_elapsed.as_nanos() as i128;
        let den = stage_duration.as_nanos() as i128;

        let cur = start_i + (delta.saturating_mul(num) / den.max(1));
        cur.clamp(0, u64::MAX as i128) as u64
    }

    pub fn stage_snapshot_at(&self, elapsed: Duration) -> StageSnapshot {
        let total = self.total_duration();
        let clamped = elapsed.min(total);

        let idx = if clamped >= total {
            self.stages.len() - 1
        } else {
            self.active_index(clamped)
        };

        let stage_start = self.stage_start(idx);
        let stage_duration = self.cumulative_ends[idx].saturating_sub(stage_start);
        let stage_elapsed = clamped.saturating_sub(stage_start).min(stage_duration);

        StageSnapshot {
            index: idx,
            count: self.stages.len(),
            stage_elapsed,
            stage_remaining: stage_duration.saturating_sub(stage_elapsed),
            start_target: self.start_target(idx),
            end_target: self.stages[idx].target,
            current_target: self.target_at(clamped),
        }
    }

    /// Highest target any stage reaches; an upper bound for the pool size of a run.
    pub fn peak_target(&self) -> u64 {
        self.stages.iter().map(|s| s.target).max().unwrap_or(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn secs(s: u64) -> Duration {
        Duration::from_secs(s)
    }

    fn timeline(stages: &[(u64, u64)]) -> StageTimeline {
        let stages = stages
            .iter()
            .map(|&(d, t)| Stage::new(secs(d), t))
            .collect();
        StageTimeline::new(stages).unwrap_or_else(|e| panic!("timeline: {e}"))
    }

    #[test]
    fn empty_stages_are_rejected() {
        assert!(matches!(StageTimeline::new(vec![]), Err(Error::EmptyStages)));
    }

    #[test]
    fn ramps_linearly_to_the_first_target() {
        let t = timeline(&[(60, 200), (180, 200), (60, 0)]);
        assert_eq!(t.total_duration(), secs(300));
        assert_eq!(t.target_at(Duration::ZERO), 0);
        assert_eq!(t.target_at(secs(30)), 100);
        assert_eq!(t.target_at(secs(60)), 200);
        assert_eq!(t.target_at(secs(120)), 200);
        assert_eq!(t.target_at(secs(270)), 100);
        assert_eq!(t.target_at(secs(300)), 0);
        assert!(!t.is_complete(secs(299)));
        assert!(t.is_complete(secs(300)));
    }

    #[test]
    fn past_the_end_holds_the_last_target() {
        let t = timeline(&[(10, 5), (10, 40)]);
        for s in [20, 21, 3_600] {
            assert_eq!(t.target_at(secs(s)), 40);
            assert!(t.is_complete(secs(s)));
        }
    }

    #[test]
    fn zero_length_first_stage_jumps_immediately() {
        let t = timeline(&[(0, 10)]);
        assert_eq!(t.total_duration(), Duration::ZERO);
        assert_eq!(t.target_at(Duration::ZERO), 10);
        assert!(t.is_complete(Duration::ZERO));

        let t = timeline(&[(0, 10), (30, 10)]);
        assert_eq!(t.target_at(Duration::ZERO), 10);
        assert_eq!(t.target_at(secs(15)), 10);
    }

    #[test]
    fn zero_length_middle_stage_is_a_jump() {
        let t = timeline(&[(10, 50), (0, 100), (10, 100)]);
        assert_eq!(t.target_at(secs(5)), 25);
        assert_eq!(t.target_at(secs(10)), 100);
        assert_eq!(t.target_at(secs(15)), 100);
    }

    #[test]
    fn interpolation_is_monotonic_within_a_stage() {
        let t = timeline(&[(7, 13), (11, 2)]);

        let mut prev = 0;
        for ms in (0..7_000).step_by(37) {
            let cur = t.target_at(Duration::from_millis(ms));
            assert!(cur >= prev, "ramp-up decreased at {ms}ms: {prev} -> {cur}");
            prev = cur;
        }

        let mut prev = 13;
        for ms in (7_000..18_000).step_by(41) {
            let cur = t.target_at(Duration::from_millis(ms));
            assert!(cur <= prev, "ramp-down increased at {ms}ms: {prev} -> {cur}");
            prev = cur;
        }
    }

    #[test]
    fn stage_snapshot_reports_position() {
        let t = timeline(&[(60, 200), (180, 200), (60, 0)]);

        let s = t.stage_snapshot_at(secs(90));
        assert_eq!(s.index, 1);
        assert_eq!(s.count, 3);
        assert_eq!(s.stage_elapsed, secs(30));
        assert_eq!(s.stage_remaining, secs(150));
        assert_eq!((s.start_target, s.end_target, s.current_target), (200, 200, 200));

        let end = t.stage_snapshot_at(secs(999));
        assert_eq!(end.index, 2);
        assert_eq!(end.stage_remaining, Duration::ZERO);
        assert_eq!(end.current_target, 0);
    }

    #[test]
    fn peak_target_is_the_largest_stage_target() {
        assert_eq!(timeline(&[(5, 200), (50, 200), (5, 0)]).peak_target(), 200);
    }
}
