use std::fmt;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{Result, ScorepackError};

/// Dotted path of map keys, e.g. `swimming.RunningTime`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct FieldPath(Vec<String>);

impl FieldPath {
    pub fn segments(&self) -> &[String] {
        &self.0
    }
}

impl TryFrom<String> for FieldPath {
    type Error = ScorepackError;

    fn try_from(raw: String) -> Result<Self> {
        raw.parse()
    }
}

impl std::str::FromStr for FieldPath {
    type Err = ScorepackError;

    fn from_str(raw: &str) -> Result<Self> {
        let segments: Vec<String> = raw.split('.').map(str::to_string).collect();
        if segments.iter().any(String::is_empty) {
            return Err(ScorepackError::Config(format!("invalid field path '{raw}'")));
        }
        Ok(FieldPath(segments))
    }
}

impl From<FieldPath> for String {
    fn from(path: FieldPath) -> Self {
        path.to_string()
    }
}

impl fmt::Display for FieldPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0.join("."))
    }
}

/// Where the derivable scoreboard fields live inside a snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SentinelConfig {
    /// Running clock string.
    pub clock: FieldPath,
    /// Lane records: a list of maps, or a single map.
    pub lanes: FieldPath,
    /// Key inside each lane record holding its final time.
    pub final_time: String,
}

impl Default for SentinelConfig {
    fn default() -> Self {
        Self {
            clock: FieldPath(vec!["swimming".into(), "RunningTime".into()]),
            lanes: FieldPath(vec!["swimming".into(), "LaneAthleteTeam".into()]),
            final_time: "FinalTime".into(),
        }
    }
}

/// Runtime configuration for compression and decompression.
///
/// The same configuration must be used on both sides; it is not stored in
/// the artifact.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Sentinel substitution layout, `None` to disable it.
    pub sentinels: Option<SentinelConfig>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            sentinels: Some(SentinelConfig::default()),
        }
    }
}

impl Config {
    /// Configuration with sentinel substitution switched off.
    pub fn without_sentinels() -> Self {
        Self { sentinels: None }
    }

    /// Sentinels over a custom clock/lanes layout.
    pub fn with_layout(clock: &str, lanes: &str, final_time: &str) -> Result<Self> {
        Ok(Self {
            sentinels: Some(SentinelConfig {
                clock: clock.parse()?,
                lanes: lanes.parse()?,
                final_time: final_time.to_string(),
            }),
        })
    }

    /// Load a JSON configuration file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let raw = std::fs::read_to_string(path.as_ref())?;
        serde_json::from_str(&raw).map_err(|e| {
            ScorepackError::Config(format!("{}: {e}", path.as_ref().display()))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_layout_matches_scoreboard_feed() {
        let cfg = Config::default();
        let s = cfg.sentinels.unwrap();
        assert_eq!(s.clock.to_string(), "swimming.RunningTime");
        assert_eq!(s.lanes.to_string(), "swimming.LaneAthleteTeam");
        assert_eq!(s.final_time, "FinalTime");
    }

    #[test]
    fn parses_from_json() {
        let cfg: Config = serde_json::from_str(
            r#"{"sentinels":{"clock":"RunningTime","lanes":"Lane","final_time":"FinalTime"}}"#,
        )
        .unwrap();
        assert_eq!(cfg, Config::with_layout("RunningTime", "Lane", "FinalTime").unwrap());

        let off: Config = serde_json::from_str(r#"{"sentinels":null}"#).unwrap();
        assert_eq!(off, Config::without_sentinels());

        let empty: Config = serde_json::from_str("{}").unwrap();
        assert_eq!(empty, Config::default());
    }

    #[test]
    fn rejects_empty_path_segment() {
        assert!("a..b".parse::<FieldPath>().is_err());
        assert!("".parse::<FieldPath>().is_err());
    }
}
