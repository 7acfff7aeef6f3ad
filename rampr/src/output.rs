use crate::cli::OutputFormat;
use crate::settings::RunSettings;

mod human;
mod json;

pub(crate) trait OutputFormatter: Send + Sync {
    fn print_header(&self, settings: &RunSettings);
    fn progress(&self) -> Option<rampr_core::ProgressFn>;
    fn print_summary(&self, report: &rampr_core::RunReport) -> anyhow::Result<()>;
}

pub(crate) fn formatter(format: OutputFormat) -> Box<dyn OutputFormatter> {
    match format {
        OutputFormat::HumanReadable => Box::new(human::HumanReadableOutput::new()),
        OutputFormat::Json => Box::new(json::JsonOutput),
    }
}

pub(crate) use json::emit_json_line;
