use anyhow::Context as _;
use rampr_core::{HttpExecutor, LoadRunner};

use crate::cli::RunArgs;
use crate::exit_codes::ExitCode;
use crate::output;
use crate::run_error::RunError;
use crate::settings::RunSettings;

pub async fn run(args: RunArgs) -> Result<ExitCode, RunError> {
    let settings = RunSettings::resolve(&args).await?;
    let out = output::formatter(args.output);

    let executor = HttpExecutor::new(settings.url.as_str()).with_timeout(Some(settings.timeout));
    let mut runner = LoadRunner::new(settings.timeline.clone(), executor, settings.runner)
        .map_err(RunError::from_core)?;
    if let Some(progress) = out.progress() {
        runner = runner.with_progress(progress);
    }

    out.print_header(&settings);

    let cancel = runner.cancel_token();
    let interrupt = tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("interrupt received; aborting run");
            cancel.cancel();
        }
    });

    let report = runner.run().await;
    interrupt.abort();
    let report = report.map_err(RunError::from_core)?;

    out.print_summary(&report)
        .context("failed to print summary")
        .map_err(RunError::RuntimeError)?;

    Ok(ExitCode::from_run_state(report.state))
}
