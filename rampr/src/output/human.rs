use std::sync::Arc;

mod format;
mod progress;
mod summary;

use format::{format_duration, format_rate};
use progress::HumanProgress;
use summary::render;

use super::OutputFormatter;
use crate::settings::RunSettings;

pub(crate) struct HumanReadableOutput {
    progress: Arc<HumanProgress>,
}

impl HumanReadableOutput {
    pub(crate) fn new() -> Self {
        Self {
            progress: Arc::new(HumanProgress::new()),
        }
    }
}

impl OutputFormatter for HumanReadableOutput {
    fn print_header(&self, settings: &RunSettings) {
        println!("url: {}", settings.url);
        let stages = settings
            .timeline
            .stages()
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join(", ");
        println!(
            "stages: [{stages}] total={} max_vus={}",
            format_duration(settings.timeline.total_duration()),
            settings.runner.max_vus
        );
        println!();
    }

    fn progress(&self) -> Option<rampr_core::ProgressFn> {
        let progress = self.progress.clone();

        Some(Arc::new(move |u| {
            let message = format!(
                "stage={}/{} target={} active={} elapsed={} stage_remaining={} rps={} errors={}/{} ({:.1}%)",
                u.stage.index + 1,
                u.stage.count,
                u.target_vus,
                u.active_vus,
                format_duration(u.elapsed),
                format_duration(u.stage.stage_remaining),
                format_rate(u.metrics.rps_now),
                u.metrics.failed_total,
                u.metrics.requests_total,
                u.metrics.error_rate_now * 100.0,
            );
            progress.update(u.total_duration, u.elapsed, message);
        }))
    }

    fn print_summary(&self, report: &rampr_core::RunReport) -> anyhow::Result<()> {
        self.progress.finish();
        print!("{}", render(report));
        Ok(())
    }
}
