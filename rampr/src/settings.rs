use std::time::Duration;

use anyhow::Context as _;
use rampr_core::{RunnerConfig, Stage, StageTimeline};

use crate::cli::{RunArgs, StageSourceArgs};
use crate::profile::{Profile, YamlDuration};
use crate::run_error::RunError;

/// Per-request timeout when neither the CLI nor the profile sets one.
pub(crate) const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Fully resolved inputs for `rampr run`.
#[derive(Debug, Clone)]
pub(crate) struct RunSettings {
    pub url: String,
    pub timeline: StageTimeline,
    pub runner: RunnerConfig,
    pub timeout: Duration,
}

async fn load_profile(source: &StageSourceArgs) -> Result<Option<Profile>, RunError> {
    match &source.profile {
        Some(path) => Profile::load(path)
            .await
            .map(Some)
            .map_err(RunError::InvalidInput),
        None => Ok(None),
    }
}

/// CLI `--stage` flags win over profile stages, which win over the preset.
fn resolve_stages(
    source: &StageSourceArgs,
    profile: Option<&Profile>,
) -> Result<Vec<Stage>, RunError> {
    if !source.stages.is_empty() {
        return Ok(source.stages.clone());
    }

    if let Some(profile) = profile
        && !profile.stages.is_empty()
    {
        return profile.stages().map_err(RunError::from_core);
    }

    Ok(source.preset.map(|p| p.stages()).unwrap_or_default())
}

pub(crate) async fn resolve_timeline(source: &StageSourceArgs) -> Result<StageTimeline, RunError> {
    let profile = load_profile(source).await?;
    let stages = resolve_stages(source, profile.as_ref())?;
    timeline(stages)
}

fn timeline(stages: Vec<Stage>) -> Result<StageTimeline, RunError> {
    let timeline = StageTimeline::new(stages).map_err(|err| {
        RunError::InvalidInput(anyhow::Error::new(err).context(
            "no stages configured (use --stage, --profile or --preset)",
        ))
    })?;
    if timeline.total_duration().is_zero() {
        return Err(RunError::from_core(rampr_core::Error::ZeroTotalDuration));
    }
    Ok(timeline)
}

impl RunSettings {
    pub(crate) async fn resolve(args: &RunArgs) -> Result<Self, RunError> {
        let profile = load_profile(&args.source).await?;
        Self::from_parts(args, profile)
    }

    fn from_parts(args: &RunArgs, profile: Option<Profile>) -> Result<Self, RunError> {
        let profile = profile.unwrap_or_default();
        let timeline = timeline(resolve_stages(&args.source, Some(&profile))?)?;

        let url = args
            .url
            .clone()
            .or(profile.url)
            .context("a target URL is required (use --url, RAMPR_URL or `url` in the profile)")
            .map_err(RunError::InvalidInput)?;
        rampr_http::parse_target_url(&url)
            .with_context(|| format!("invalid target URL `{url}`"))
            .map_err(RunError::InvalidInput)?;

        let defaults = RunnerConfig::default();
        let pick = |cli: Option<Duration>, file: Option<YamlDuration>, default: Duration| {
            cli.or(file.map(YamlDuration::into_inner)).unwrap_or(default)
        };

        let runner = RunnerConfig {
            max_vus: args.max_vus.or(profile.max_vus).unwrap_or(defaults.max_vus),
            tick: pick(args.tick, profile.tick, defaults.tick),
            drain_grace: pick(args.drain_grace, profile.drain_grace, defaults.drain_grace),
        };
        runner.validate().map_err(RunError::from_core)?;

        Ok(Self {
            url,
            timeline,
            runner,
            timeout: pick(args.timeout, profile.timeout, DEFAULT_REQUEST_TIMEOUT),
        })
    }
}
