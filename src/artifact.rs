//! The compressed log document and its two textual forms.

use indexmap::IndexMap;
use serde::{Deserialize, Deserializer, Serialize};
use sha2::{Digest, Sha256};

use crate::error::{Result, ScorepackError};
use crate::value::Value;
use crate::FORMAT_VERSION;

/// First snapshot, with keys shortened and markers in wire form.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Frame {
    pub t: Value,
    pub data: serde_json::Value,
}

/// One later snapshot. `d` is absent when nothing changed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Step {
    pub t: Value,
    #[serde(
        default,
        deserialize_with = "present",
        skip_serializing_if = "Option::is_none"
    )]
    pub d: Option<serde_json::Value>,
}

/// Keeps an explicit `"d": null` (a snapshot replaced by `null`) distinct
/// from an absent `d`.
fn present<'de, D>(de: D) -> std::result::Result<Option<serde_json::Value>, D::Error>
where
    D: Deserializer<'de>,
{
    serde_json::Value::deserialize(de).map(Some)
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompressedLog {
    pub version: u64,
    /// code -> original key.
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub dict: IndexMap<String, String>,
    /// `None` only for a log of zero entries.
    pub baseline: Option<Frame>,
    #[serde(default)]
    pub deltas: Vec<Step>,
}

impl Default for CompressedLog {
    fn default() -> Self {
        Self {
            version: FORMAT_VERSION,
            dict: IndexMap::new(),
            baseline: None,
            deltas: Vec::new(),
        }
    }
}

impl CompressedLog {
    /// Number of snapshots this log decodes to.
    pub fn entry_count(&self) -> usize {
        usize::from(self.baseline.is_some()) + self.deltas.len()
    }

    /// Steps that carry a delta.
    pub fn changed_steps(&self) -> usize {
        self.deltas.iter().filter(|s| s.d.is_some()).count()
    }

    /// Structural checks that do not need a replay.
    pub fn validate(&self) -> Result<()> {
        if self.version != FORMAT_VERSION {
            return Err(ScorepackError::UnsupportedVersion(self.version));
        }
        if self.baseline.is_none() && !self.deltas.is_empty() {
            return Err(ScorepackError::malformed("deltas present without a baseline"));
        }
        Ok(())
    }

    /// Parse either serialized form.
    pub fn from_json(text: &str) -> Result<Self> {
        let log: CompressedLog = serde_json::from_str(text)?;
        log.validate()?;
        Ok(log)
    }

    /// Single-line compact form.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }

    /// Line-oriented form: header, dictionary, baseline, one line per step.
    /// Parses back with [`CompressedLog::from_json`].
    pub fn to_lines(&self) -> Result<String> {
        let mut lines = Vec::with_capacity(self.deltas.len() + 5);
        lines.push(format!("{{\"version\":{},", self.version));
        if !self.dict.is_empty() {
            lines.push(format!("\"dict\":{},", serde_json::to_string(&self.dict)?));
        }
        lines.push(format!("\"baseline\":{},", serde_json::to_string(&self.baseline)?));
        lines.push("\"deltas\":[".to_string());
        let last = self.deltas.len().saturating_sub(1);
        for (i, step) in self.deltas.iter().enumerate() {
            let sep = if i < last { "," } else { "" };
            lines.push(format!("{}{sep}", serde_json::to_string(step)?));
        }
        lines.push("]}".to_string());
        Ok(lines.join("\n"))
    }

    /// Hex SHA-256 of the compact form.
    pub fn fingerprint(&self) -> Result<String> {
        let digest = Sha256::digest(self.to_json()?.as_bytes());
        Ok(hex::encode(digest))
    }
}
