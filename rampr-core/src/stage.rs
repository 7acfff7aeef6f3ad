use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use crate::error::{Error, Result};

/// One ramp segment: move toward `target` concurrent virtual users over `duration`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Stage {
    pub duration: Duration,
    pub target: u64,
}

impl Stage {
    #[must_use]
    pub fn new(duration: Duration, target: u64) -> Self {
        Self { duration, target }
    }

    /// Builds a stage from its configuration form (`duration` string, signed `target`).
    pub fn parse(duration: &str, target: i64) -> Result<Self> {
        let duration = parse_duration(duration)?;
        let target = u64::try_from(target).map_err(|_| Error::NegativeTarget(target))?;
        Ok(Self { duration, target })
    }
}

impl FromStr for Stage {
    type Err = Error;

    /// Parses the `<duration>:<target>` CLI form, e.g. `30s:100`.
    fn from_str(s: &str) -> Result<Self> {
        let (duration, target) = s
            .trim()
            .rsplit_once(':')
            .ok_or_else(|| Error::InvalidStage(s.to_string()))?;
        let target: i64 = target
            .trim()
            .parse()
            .map_err(|_| Error::InvalidStage(s.to_string()))?;
        Self::parse(duration, target)
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}:{}",
            humantime::format_duration(self.duration),
            self.target
        )
    }
}

/// Parses a time span such as `1m`, `30s`, `250ms` or `1m30s`. A bare integer is seconds.
pub fn parse_duration(input: &str) -> Result<Duration> {
    let s = input.trim();
    let invalid = |reason: &str| Error::InvalidDuration {
        input: input.to_string(),
        reason: reason.to_string(),
    };

    if s.is_empty() {
        return Err(invalid("duration cannot be empty (expected e.g. 30s, 250ms, 1m)"));
    }
    if s.starts_with('-') {
        return Err(invalid("duration must not be negative"));
    }
    if s.bytes().all(|b| b.is_ascii_digit()) {
        let secs: u64 = s.parse().map_err(|_| invalid("duration is too large"))?;
        return Ok(Duration::from_secs(secs));
    }

    humantime::parse_duration(s).map_err(|err| invalid(&err.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_duration_accepts_common_units() {
        let ok = |s: &str| parse_duration(s).unwrap_or_else(|e| panic!("{s}: {e}"));
        assert_eq!(ok("250ms"), Duration::from_millis(250));
        assert_eq!(ok("30s"), Duration::from_secs(30));
        assert_eq!(ok("1m"), Duration::from_secs(60));
        assert_eq!(ok("50m"), Duration::from_secs(50 * 60));
        assert_eq!(ok("2h"), Duration::from_secs(2 * 60 * 60));
        assert_eq!(ok("1m30s"), Duration::from_secs(90));
        assert_eq!(ok("0s"), Duration::ZERO);
        assert_eq!(ok("45"), Duration::from_secs(45));
    }

    #[test]
    fn parse_duration_rejects_invalid_values() {
        for bad in ["", "  ", "abc", "10x", "-5s", "-1"] {
            assert!(
                matches!(parse_duration(bad), Err(Error::InvalidDuration { .. })),
                "expected {bad:?} to be rejected"
            );
        }
    }

    #[test]
    fn stage_parses_cli_form() {
        let st: Stage = "30s:100"
            .parse()
            .unwrap_or_else(|e| panic!("parse stage: {e}"));
        assert_eq!(st, Stage::new(Duration::from_secs(30), 100));

        let st: Stage = "1m30s:0"
            .parse()
            .unwrap_or_else(|e| panic!("parse stage: {e}"));
        assert_eq!(st, Stage::new(Duration::from_secs(90), 0));
    }

    #[test]
    fn stage_rejects_malformed_and_negative() {
        assert!(matches!("30s".parse::<Stage>(), Err(Error::InvalidStage(_))));
        assert!(matches!("30s:abc".parse::<Stage>(), Err(Error::InvalidStage(_))));
        assert!(matches!(
            "30s:-5".parse::<Stage>(),
            Err(Error::NegativeTarget(-5))
        ));
        assert!(matches!(
            Stage::parse("1m", -1),
            Err(Error::NegativeTarget(-1))
        ));
    }

    #[test]
    fn stage_display_roundtrips_through_parse() {
        let st = Stage::new(Duration::from_secs(90), 200);
        let again: Stage = st
            .to_string()
            .parse()
            .unwrap_or_else(|e| panic!("reparse {st}: {e}"));
        assert_eq!(again, st);
    }
}
