use std::path::Path;
use std::time::Duration;

use anyhow::Context as _;
use rampr_core::Stage;
use serde::Deserialize;

/// On-disk run profile. Every field is optional so CLI flags and presets can fill the gaps.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub(crate) struct Profile {
    #[serde(default)]
    pub url: Option<String>,

    #[serde(default)]
    pub stages: Vec<StageYaml>,

    #[serde(rename = "maxVUs")]
    #[serde(default)]
    pub max_vus: Option<u64>,

    #[serde(default)]
    pub tick: Option<YamlDuration>,

    #[serde(default)]
    pub timeout: Option<YamlDuration>,

    #[serde(default)]
    pub drain_grace: Option<YamlDuration>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub(crate) struct StageYaml {
    pub duration: YamlDuration,

    /// Signed so a negative target is reported as an invalid stage, not a parse error.
    pub target: i64,
}

impl Profile {
    pub(crate) fn parse(text: &str, path: &Path) -> anyhow::Result<Self> {
        let is_json = path
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(|e| e.eq_ignore_ascii_case("json"));

        if is_json {
            serde_json::from_str(text)
                .with_context(|| format!("invalid JSON profile: {}", path.display()))
        } else {
            serde_yaml::from_str(text)
                .with_context(|| format!("invalid YAML profile: {}", path.display()))
        }
    }

    pub(crate) async fn load(path: &Path) -> anyhow::Result<Self> {
        let text = tokio::fs::read_to_string(path)
            .await
            .with_context(|| format!("failed to read profile: {}", path.display()))?;
        Self::parse(&text, path)
    }

    pub(crate) fn stages(&self) -> rampr_core::Result<Vec<Stage>> {
        self.stages
            .iter()
            .map(|s| {
                let target = u64::try_from(s.target)
                    .map_err(|_| rampr_core::Error::NegativeTarget(s.target))?;
                Ok(Stage::new(s.duration.into_inner(), target))
            })
            .collect()
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub(crate) struct YamlDuration(Duration);

impl YamlDuration {
    pub(crate) fn into_inner(self) -> Duration {
        self.0
    }
}

impl<'de> Deserialize<'de> for YamlDuration {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        struct V;

        impl serde::de::Visitor<'_> for V {
            type Value = YamlDuration;

            fn expecting(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
                f.write_str("duration as string (e.g. 30s, 1m) or non-negative integer seconds")
            }

            fn visit_u64<E>(self, v: u64) -> Result<Self::Value, E>
            where
                E: serde::de::Error,
            {
                Ok(YamlDuration(Duration::from_secs(v)))
            }

            fn visit_i64<E>(self, v: i64) -> Result<Self::Value, E>
            where
                E: serde::de::Error,
            {
                let secs = u64::try_from(v).map_err(|_| E::custom("duration must not be negative"))?;
                Ok(YamlDuration(Duration::from_secs(secs)))
            }

            fn visit_str<E>(self, v: &str) -> Result<Self::Value, E>
            where
                E: serde::de::Error,
            {
                rampr_core::parse_duration(v)
                    .map(YamlDuration)
                    .map_err(E::custom)
            }
        }

        deserializer.deserialize_any(V)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn yaml(text: &str) -> anyhow::Result<Profile> {
        Profile::parse(text, Path::new("profile.yaml"))
    }

    #[test]
    fn parses_full_yaml_profile() -> anyhow::Result<()> {
        let p = yaml(
            r#"
url: http://k8s0.devin.lan:30300/devices
stages:
  - { duration: 1m, target: 200 }
  - { duration: 3m, target: 200 }
  - { duration: 60, target: 0 }
maxVUs: 1000
tick: 500ms
timeout: 10s
drainGrace: 5s
"#,
        )?;

        assert_eq!(p.url.as_deref(), Some("http://k8s0.devin.lan:30300/devices"));
        assert_eq!(
            p.stages()?,
            vec![
                Stage::new(Duration::from_secs(60), 200),
                Stage::new(Duration::from_secs(180), 200),
                Stage::new(Duration::from_secs(60), 0),
            ]
        );
        assert_eq!(p.max_vus, Some(1000));
        assert_eq!(p.tick.map(YamlDuration::into_inner), Some(Duration::from_millis(500)));
        assert_eq!(p.timeout.map(YamlDuration::into_inner), Some(Duration::from_secs(10)));
        assert_eq!(
            p.drain_grace.map(YamlDuration::into_inner),
            Some(Duration::from_secs(5))
        );
        Ok(())
    }

    #[test]
    fn parses_json_profile() -> anyhow::Result<()> {
        let p = Profile::parse(
            r#"{"stages":[{"duration":"30s","target":10}]}"#,
            Path::new("p.json"),
        )?;
        assert_eq!(p.url, None);
        assert_eq!(p.stages()?, vec![Stage::new(Duration::from_secs(30), 10)]);
        Ok(())
    }

    #[test]
    fn negative_target_is_a_stage_error() -> anyhow::Result<()> {
        let p = yaml("stages:\n  - { duration: 10s, target: -5 }\n")?;
        assert!(matches!(
            p.stages(),
            Err(rampr_core::Error::NegativeTarget(-5))
        ));
        Ok(())
    }

    #[test]
    fn rejects_bad_durations_and_unknown_keys() {
        assert!(yaml("stages:\n  - { duration: -10s, target: 5 }\n").is_err());
        assert!(yaml("stages:\n  - { duration: -10, target: 5 }\n").is_err());
        assert!(yaml("stages:\n  - { duration: soon, target: 5 }\n").is_err());
        assert!(yaml("vus: 10\n").is_err());
    }

    #[tokio::test]
    async fn loads_profile_from_disk() -> anyhow::Result<()> {
        let dir = tempfile::tempdir()?;
        let path = dir.path().join("stress.yml");
        tokio::fs::write(&path, "url: http://localhost/\nstages:\n  - { duration: 5s, target: 1 }\n")
            .await?;

        let p = Profile::load(&path).await?;
        assert_eq!(p.url.as_deref(), Some("http://localhost/"));
        assert_eq!(p.stages.len(), 1);
        Ok(())
    }
}
