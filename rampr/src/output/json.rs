use serde::Serialize;
use std::collections::BTreeMap;
use std::io::Write as _;
use std::sync::Arc;

use super::OutputFormatter;
use crate::settings::RunSettings;

pub(crate) struct JsonOutput;

impl OutputFormatter for JsonOutput {
    fn print_header(&self, _settings: &RunSettings) {}

    fn progress(&self) -> Option<rampr_core::ProgressFn> {
        Some(Arc::new(move |u| {
            let line = build_progress_line(&u);
            emit_json_line(&line);
        }))
    }

    fn print_summary(&self, report: &rampr_core::RunReport) -> anyhow::Result<()> {
        let line = build_summary_line(report);
        emit_json_line(&line);
        Ok(())
    }
}

#[derive(Debug, Serialize)]
pub(crate) struct JsonProgressLine {
    pub kind: &'static str,
    pub tick: u64,
    pub elapsed_secs: f64,
    pub interval_secs: f64,
    pub target_vus: u64,
    pub active_vus: u64,

    /// 1-based stage index.
    pub stage: usize,
    pub stages: usize,
    pub stage_remaining_secs: f64,

    pub requests_per_sec: f64,
    pub total_requests: u64,
    pub failed_requests: u64,
    pub error_rate: f64,

    pub latency_p50_ms: Option<f64>,
    pub latency_p90_ms: Option<f64>,
    pub latency_p99_ms: Option<f64>,

    pub errors: BTreeMap<String, u64>,
}

fn build_progress_line(u: &rampr_core::ProgressUpdate) -> JsonProgressLine {
    JsonProgressLine {
        kind: "progress",
        tick: u.tick,
        elapsed_secs: u.elapsed.as_secs_f64(),
        interval_secs: u.interval.as_secs_f64(),
        target_vus: u.target_vus,
        active_vus: u.active_vus,

        stage: u.stage.index + 1,
        stages: u.stage.count,
        stage_remaining_secs: u.stage.stage_remaining.as_secs_f64(),

        requests_per_sec: u.metrics.rps_now,
        total_requests: u.metrics.requests_total,
        failed_requests: u.metrics.failed_total,
        error_rate: u.metrics.error_rate_now,

        latency_p50_ms: u.metrics.latency_p50_ms,
        latency_p90_ms: u.metrics.latency_p90_ms,
        latency_p99_ms: u.metrics.latency_p99_ms,

        errors: u.metrics.errors.clone(),
    }
}

#[derive(Debug, Serialize)]
pub(crate) struct JsonSummaryLine {
    pub kind: &'static str,
    pub state: &'static str,
    pub elapsed_secs: f64,
    pub total_duration_secs: f64,

    pub requests_total: u64,
    pub success_total: u64,
    pub failed_total: u64,
    pub error_rate: f64,
    pub errors: BTreeMap<String, u64>,

    pub throughput: f64,
    pub rps: JsonRpsSummary,

    /// Latency in microseconds.
    pub latency: Option<JsonLatencySummary>,

    pub peak_vus: u64,
    pub capped_total: u64,
    pub aborted_vus: u64,
}

#[derive(Debug, Serialize)]
pub(crate) struct JsonRpsSummary {
    pub now: f64,
    pub avg: f64,
    pub stdev: f64,
    pub max: f64,
}

#[derive(Debug, Serialize)]
pub(crate) struct JsonLatencySummary {
    pub p50: Option<f64>,
    pub p75: Option<f64>,
    pub p90: Option<f64>,
    pub p95: Option<f64>,
    pub p99: Option<f64>,
    pub min: Option<f64>,
    pub max: Option<f64>,
    pub mean: Option<f64>,
    pub stdev: Option<f64>,
    pub count: u64,
}

fn build_summary_line(report: &rampr_core::RunReport) -> JsonSummaryLine {
    let s = &report.snapshot;

    let latency = s.latency_us.as_ref().map(|l| JsonLatencySummary {
        p50: l.p50,
        p75: l.p75,
        p90: l.p90,
        p95: l.p95,
        p99: l.p99,
        min: l.min,
        max: l.max,
        mean: l.mean,
        stdev: l.stdev,
        count: l.count,
    });

    JsonSummaryLine {
        kind: "summary",
        state: report.state.into(),
        elapsed_secs: report.elapsed.as_secs_f64(),
        total_duration_secs: report.total_duration.as_secs_f64(),

        requests_total: s.requests_total,
        success_total: s.success_total,
        failed_total: s.failed_total,
        error_rate: s.error_rate(),
        errors: s.errors.clone(),

        throughput: report.throughput(),
        rps: JsonRpsSummary {
            now: s.rps.now,
            avg: s.rps.avg,
            stdev: s.rps.stdev,
            max: s.rps.max,
        },

        latency,

        peak_vus: report.peak_vus,
        capped_total: report.capped_total,
        aborted_vus: report.aborted_vus,
    }
}

pub(crate) fn emit_json_line<T: Serialize>(line: &T) {
    let mut out = std::io::stdout().lock();
    if serde_json::to_writer(&mut out, line).is_ok() {
        let _ = writeln!(out);
    }
}
