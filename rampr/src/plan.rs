use std::time::Duration;

use rampr_core::StageTimeline;
use serde::Serialize;

use crate::cli::{OutputFormat, PlanArgs};
use crate::exit_codes::ExitCode;
use crate::output::emit_json_line;
use crate::run_error::RunError;
use crate::settings::resolve_timeline;

/// Upper bound on printed rows; a finer `--step` is rejected.
pub(crate) const MAX_PLAN_POINTS: u128 = 100_000;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub(crate) struct PlanPoint {
    #[serde(skip)]
    pub elapsed: Duration,
    pub elapsed_secs: f64,
    /// 1-based stage index.
    pub stage: usize,
    pub target: u64,
}

pub async fn plan(args: PlanArgs) -> Result<ExitCode, RunError> {
    if args.step.is_zero() {
        return Err(RunError::InvalidInput(anyhow::anyhow!(
            "--step must be a positive duration"
        )));
    }

    let timeline = resolve_timeline(&args.source).await?;
    let points = sample(&timeline, args.step)?;

    match args.output {
        OutputFormat::HumanReadable => {
            println!("{:>10}  {:>5}  {:>6}", "elapsed", "stage", "target");
            for p in &points {
                println!(
                    "{:>10}  {:>5}  {:>6}",
                    humantime::format_duration(p.elapsed).to_string(),
                    p.stage,
                    p.target
                );
            }
        }
        OutputFormat::Json => {
            #[derive(Serialize)]
            struct Line<'a> {
                kind: &'static str,
                #[serde(flatten)]
                point: &'a PlanPoint,
            }
            for point in &points {
                emit_json_line(&Line { kind: "plan", point });
            }
        }
    }

    Ok(ExitCode::Success)
}

/// Target at every multiple of `step`, plus the end of the timeline.
pub(crate) fn sample(timeline: &StageTimeline, step: Duration) -> Result<Vec<PlanPoint>, RunError> {
    let total = timeline.total_duration();
    let steps = total.as_nanos().div_ceil(step.as_nanos().max(1));
    if steps >= MAX_PLAN_POINTS {
        return Err(RunError::InvalidInput(anyhow::anyhow!(
            "--step {} yields more than {MAX_PLAN_POINTS} points over {}; use a larger step",
            humantime::format_duration(step),
            humantime::format_duration(total)
        )));
    }

    let point = |at: Duration| PlanPoint {
        elapsed: at,
        elapsed_secs: at.as_secs_f64(),
        stage: timeline.stage_snapshot_at(at).index + 1,
        target: timeline.target_at(at),
    };

    let mut out = Vec::new();
    let mut at = Duration::ZERO;
    while at < total {
        out.push(point(at));
        at = at.saturating_add(step);
    }
    out.push(point(total));
    Ok(out)
}
