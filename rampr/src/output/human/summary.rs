use std::fmt::Write as _;

use super::format::*;

pub(crate) fn render(report: &rampr_core::RunReport) -> String {
    let mut out = String::new();
    let s = &report.snapshot;

    out.push_str("summary\n");
    writeln!(
        &mut out,
        "  state: {} after {} (planned {})",
        report.state,
        format_duration(report.elapsed),
        format_duration(report.total_duration)
    )
    .ok();
    writeln!(
        &mut out,
        "  requests: {} (ok {}, failed {}, {:.2}%)",
        s.requests_total,
        s.success_total,
        s.failed_total,
        s.error_rate() * 100.0
    )
    .ok();

    if !s.errors.is_empty() {
        let mut errors: Vec<_> = s.errors.iter().collect();
        errors.sort_by(|(a_name, a_count), (b_name, b_count)| {
            b_count.cmp(a_count).then_with(|| a_name.cmp(b_name))
        });
        out.push_str("  errors:\n");
        for (kind, count) in errors {
            writeln!(&mut out, "    {kind}: {count}").ok();
        }
    }

    if let Some(h) = &s.latency_us {
        writeln!(
            out,
            "  latency = p50={} p90={} p95={} p99={} mean={} max={} (n={})",
            format_duration_from_micros_opt(h.p50),
            format_duration_from_micros_opt(h.p90),
            format_duration_from_micros_opt(h.p95),
            format_duration_from_micros_opt(h.p99),
            format_duration_from_micros_opt(h.mean),
            format_duration_from_micros_opt(h.max),
            h.count
        )
        .ok();
    } else {
        out.push_str("  latency: n/a\n");
    }

    writeln!(
        &mut out,
        "  rps: avg={} stdev={} max={} overall={}",
        format_rate(s.rps.avg),
        format_rate(s.rps.stdev),
        format_rate(s.rps.max),
        format_rate(report.throughput())
    )
    .ok();
    writeln!(
        &mut out,
        "  vus: peak={} capped={}",
        report.peak_vus, report.capped_total
    )
    .ok();
    if report.aborted_vus > 0 {
        writeln!(&mut out, "  aborted_vus: {}", report.aborted_vus).ok();
    }

    out
}
