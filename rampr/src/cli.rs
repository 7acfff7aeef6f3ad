use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;
use std::time::Duration;

use rampr_core::Stage;

fn parse_duration(input: &str) -> Result<Duration, String> {
    rampr_core::parse_duration(input).map_err(|err| err.to_string())
}

fn parse_stage(input: &str) -> Result<Stage, String> {
    input.parse().map_err(|err: rampr_core::Error| err.to_string())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    /// Human-readable progress bar and summary.
    HumanReadable,
    /// Emit JSON progress lines (NDJSON) to stdout.
    Json,
}

/// Built-in stage profiles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum Preset {
    /// 1m ramp to 200 VUs, hold 3m, 1m ramp down.
    Stress,
    /// 2m ramp to 50 VUs, hold 6m, 2m ramp down.
    Load,
    /// 5m ramp to 200 VUs, hold 50m, 5m ramp down.
    Soak,
}

impl Preset {
    pub fn stages(self) -> Vec<Stage> {
        let stage = |mins: u64, target: u64| Stage::new(Duration::from_secs(mins * 60), target);
        match self {
            Self::Stress => vec![stage(1, 200), stage(3, 200), stage(1, 0)],
            Self::Load => vec![stage(2, 50), stage(6, 50), stage(2, 0)],
            Self::Soak => vec![stage(5, 200), stage(50, 200), stage(5, 0)],
        }
    }
}

#[derive(Debug, Parser)]
#[command(
    name = "rampr",
    author,
    version,
    about = "Staged concurrent HTTP load generator",
    long_about = "rampr drives a single GET request against a URL with a number of concurrent virtual users that ramps linearly between stages.\n\nStages come from --stage flags, a profile file, or a built-in preset (in that order of precedence).",
    after_help = "Examples:\n  rampr run --url http://localhost:8080/devices --preset stress\n  rampr run --url http://localhost:8080/devices --stage 30s:50 --stage 1m:50 --stage 30s:0\n  rampr run --profile stress.yaml --output json\n  rampr plan --preset soak --step 5m"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Run a staged load test
    #[command(
        long_about = "Run a staged load test against a URL.\n\nCLI flags override values from the profile file, which override the preset."
    )]
    Run(RunArgs),

    /// Print the target VU count over time without sending requests
    Plan(PlanArgs),
}

/// Where the stage list comes from.
#[derive(Debug, Args)]
pub struct StageSourceArgs {
    /// Profile file (YAML or JSON) with url, stages and runner settings
    #[arg(long, value_name = "FILE")]
    pub profile: Option<PathBuf>,

    /// Built-in stage profile
    #[arg(long, value_enum)]
    pub preset: Option<Preset>,

    /// Stage as DURATION:TARGET (repeatable; replaces profile/preset stages)
    #[arg(long = "stage", value_name = "DURATION:TARGET", value_parser = parse_stage)]
    pub stages: Vec<Stage>,
}

#[derive(Debug, Args)]
pub struct RunArgs {
    #[command(flatten)]
    pub source: StageSourceArgs,

    /// Target URL for the GET request
    #[arg(long, env = "RAMPR_URL")]
    pub url: Option<String>,

    /// Hard cap on concurrent virtual users
    #[arg(long)]
    pub max_vus: Option<u64>,

    /// Control loop tick (e.g. 1s, 250ms)
    #[arg(long, value_parser = parse_duration)]
    pub tick: Option<Duration>,

    /// Per-request timeout (e.g. 10s)
    #[arg(long, value_parser = parse_duration)]
    pub timeout: Option<Duration>,

    /// How long Ctrl-C waits for in-flight requests before aborting them
    #[arg(long, value_parser = parse_duration)]
    pub drain_grace: Option<Duration>,

    /// Output format
    #[arg(long, value_enum, default_value_t = OutputFormat::HumanReadable)]
    pub output: OutputFormat,
}

#[derive(Debug, Args)]
pub struct PlanArgs {
    #[command(flatten)]
    pub source: StageSourceArgs,

    /// Sampling step (e.g. 10s)
    #[arg(long, value_parser = parse_duration, default_value = "10s")]
    pub step: Duration,

    /// Output format
    #[arg(long, value_enum, default_value_t = OutputFormat::HumanReadable)]
    pub output: OutputFormat,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Cli {
        match Cli::try_parse_from(args) {
            Ok(v) => v,
            Err(err) => panic!("failed to parse args: {err}"),
        }
    }

    #[test]
    fn cli_parses_run_with_stages() {
        let cli = parse(&[
            "rampr",
            "run",
            "--url",
            "http://127.0.0.1:8080/devices",
            "--stage",
            "30s:100",
            "--stage",
            "1m:0",
            "--max-vus",
            "50",
            "--tick",
            "250ms",
            "--output",
            "json",
        ]);

        match cli.command {
            Command::Run(args) => {
                assert_eq!(args.url.as_deref(), Some("http://127.0.0.1:8080/devices"));
                assert_eq!(
                    args.source.stages,
                    vec![
                        Stage::new(Duration::from_secs(30), 100),
                        Stage::new(Duration::from_secs(60), 0)
                    ]
                );
                assert_eq!(args.max_vus, Some(50));
                assert_eq!(args.tick, Some(Duration::from_millis(250)));
                assert_eq!(args.output, OutputFormat::Json);
                assert_eq!(args.source.preset, None);
            }
            Command::Plan(_) => panic!("expected run command"),
        }
    }

    #[test]
    fn cli_rejects_bad_stage_and_duration() {
        assert!(Cli::try_parse_from(["rampr", "run", "--stage", "30s:-1"]).is_err());
        assert!(Cli::try_parse_from(["rampr", "run", "--stage", "30s"]).is_err());
        assert!(Cli::try_parse_from(["rampr", "run", "--tick", "10x"]).is_err());
    }

    #[test]
    fn cli_parses_plan_defaults() {
        let cli = parse(&["rampr", "plan", "--preset", "soak"]);
        match cli.command {
            Command::Plan(args) => {
                assert_eq!(args.source.preset, Some(Preset::Soak));
                assert_eq!(args.step, Duration::from_secs(10));
                assert_eq!(args.output, OutputFormat::HumanReadable);
            }
            Command::Run(_) => panic!("expected plan command"),
        }
    }

    #[test]
    fn presets_match_the_documented_profiles() {
        let mins = |m: u64| Duration::from_secs(m * 60);
        assert_eq!(
            Preset::Stress.stages(),
            vec![Stage::new(mins(1), 200), Stage::new(mins(3), 200), Stage::new(mins(1), 0)]
        );
        assert_eq!(
            Preset::Load.stages(),
            vec![Stage::new(mins(2), 50), Stage::new(mins(6), 50), Stage::new(mins(2), 0)]
        );
        assert_eq!(
            Preset::Soak.stages(),
            vec![Stage::new(mins(5), 200), Stage::new(mins(50), 200), Stage::new(mins(5), 0)]
        );
    }
}
