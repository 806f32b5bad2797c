//! `CompressionReport` summarises one compressed log: entry counts and the
//! size of the serialized artifact against its source. It does no logging
//! of its own; binaries print it.

use std::fmt;

use serde::Serialize;

use crate::artifact::CompressedLog;
use crate::error::Result;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CompressionReport {
    pub entries: usize,
    pub changed_steps: usize,
    pub unchanged_steps: usize,
    pub dictionary_codes: usize,
    pub input_bytes: usize,
    pub output_bytes: usize,
}

impl CompressionReport {
    /// Measure `log` against the size of the JSON it was built from, using
    /// the compact serialization.
    pub fn measure(log: &CompressedLog, input_bytes: usize) -> Result<Self> {
        let changed = log.changed_steps();
        Ok(Self {
            entries: log.entry_count(),
            changed_steps: changed,
            unchanged_steps: log.deltas.len() - changed,
            dictionary_codes: log.dict.len(),
            input_bytes,
            output_bytes: log.to_json()?.len(),
        })
    }

    /// Space saved, in percent of the input.
    pub fn savings_percent(&self) -> f64 {
        if self.input_bytes == 0 {
            return 0.0;
        }
        100.0 * (1.0 - self.output_bytes as f64 / self.input_bytes as f64)
    }
}

impl fmt::Display for CompressionReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "orig: {:.1}KB, comp: {:.1}KB, ratio: {:.1}% | entries: {}, deltas: {} ({} unchanged), dict: {}",
            self.input_bytes as f64 / 1024.0,
            self.output_bytes as f64 / 1024.0,
            self.savings_percent(),
            self.entries,
            self.changed_steps + self.unchanged_steps,
            self.unchanged_steps,
            self.dictionary_codes,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn savings_of_empty_input() {
        let report = CompressionReport::measure(&CompressedLog::default(), 0).unwrap();
        assert_eq!(report.savings_percent(), 0.0);
        assert_eq!(report.entries, 0);
    }

    #[test]
    fn savings_percent() {
        let report = CompressionReport {
            entries: 3,
            changed_steps: 1,
            unchanged_steps: 1,
            dictionary_codes: 0,
            input_bytes: 1000,
            output_bytes: 250,
        };
        assert!((report.savings_percent() - 75.0).abs() < 1e-9);
        assert!(report.to_string().contains("ratio: 75.0%"));
    }
}
