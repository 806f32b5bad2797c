//! Append-only compressed logging of a live feed.

use crate::artifact::{CompressedLog, Frame, Step};
use crate::config::Config;
use crate::dictionary::Dictionary;
use crate::diff::diff;
use crate::error::Result;
use crate::patch::apply_in_place;
use crate::sentinel::TickChain;
use crate::value::{Entry, Value};
use crate::wire;

/// Builds a [`CompressedLog`] one snapshot at a time.
///
/// Dictionary codes are handed out on first encounter instead of by global
/// frequency, so the result usually differs from [`crate::compress`] for the
/// same input while decoding to the same entries. A logger has a single
/// owner; every method that grows it takes `&mut self`.
#[derive(Debug, Clone)]
pub struct IncrementalLogger {
    config: Config,
    chain: TickChain,
    /// Previous sentinel-encoded snapshot, long keys.
    prev: Option<Value>,
    /// Previous snapshot as stored: shortened keys.
    shadow: Value,
    dict: Dictionary,
    log: CompressedLog,
}

impl IncrementalLogger {
    pub fn new(config: Config) -> Self {
        Self {
            config,
            chain: TickChain::default(),
            prev: None,
            shadow: Value::Null,
            dict: Dictionary::new(),
            log: CompressedLog::default(),
        }
    }

    /// Append one snapshot.
    ///
    /// On error nothing is appended and the clock history is unchanged.
    pub fn add_entry(&mut self, t: Value, data: &Value) -> Result<()> {
        self.append(t, data)
            .inspect_err(|e| log::warn!("snapshot {} rejected: {e}", self.len()))
    }

    fn append(&mut self, t: Value, data: &Value) -> Result<()> {
        let mut chain = self.chain;
        let mut dict = self.dict.clone();
        let encoded = chain.encode(self.config.sentinels.as_ref(), data);

        match &self.prev {
            None => {
                dict.observe_value(&encoded)?;
                self.shadow = dict.shorten_value(&encoded);
                self.log.baseline = Some(Frame {
                    t,
                    data: wire::encode_value(&self.shadow),
                });
            }
            Some(prev) => {
                let d = match diff(prev, &encoded) {
                    Some(delta) => {
                        dict.observe_delta(&delta)?;
                        let short = dict.shorten_delta(&delta);
                        let json = wire::encode_delta(&short, &self.shadow);
                        apply_in_place(&mut self.shadow, &short);
                        Some(json)
                    }
                    None => None,
                };
                self.log.deltas.push(Step { t, d });
            }
        }

        self.dict = dict;
        self.chain = chain;
        self.prev = Some(encoded);
        log::trace!("logged entry {}", self.len());
        Ok(())
    }

    pub fn push(&mut self, entry: &Entry) -> Result<()> {
        self.add_entry(entry.t.clone(), &entry.data)
    }

    /// Entries logged so far.
    pub fn len(&self) -> usize {
        self.log.entry_count()
    }

    pub fn is_empty(&self) -> bool {
        self.log.baseline.is_none()
    }

    pub fn dictionary(&self) -> &Dictionary {
        &self.dict
    }

    /// The log as it would be saved right now.
    pub fn snapshot(&self) -> CompressedLog {
        CompressedLog {
            dict: self.dict.table().clone(),
            ..self.log.clone()
        }
    }

    /// Finish logging, dropping all bookkeeping.
    pub fn finish(self) -> CompressedLog {
        log::info!(
            "logger finished: {} entries, {} dictionary codes",
            self.len(),
            self.dict.len()
        );
        CompressedLog {
            dict: self.dict.table().clone(),
            ..self.log
        }
    }
}

impl Default for IncrementalLogger {
    fn default() -> Self {
        Self::new(Config::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::decompress;
    use serde_json::json;

    #[test]
    fn first_entry_becomes_baseline() {
        let mut logger = IncrementalLogger::new(Config::without_sentinels());
        assert!(logger.is_empty());
        logger.add_entry(Value::from(5u64), &Value::from(json!({"Score": 1}))).unwrap();
        assert_eq!(logger.len(), 1);
        let log = logger.snapshot();
        assert_eq!(log.baseline.as_ref().unwrap().data, json!({"a": 1}));
        assert!(log.deltas.is_empty());
    }

    #[test]
    fn unchanged_entry_has_no_payload() {
        let mut logger = IncrementalLogger::new(Config::without_sentinels());
        let data = Value::from(json!({"Score": 1}));
        logger.add_entry(Value::from(0u64), &data).unwrap();
        logger.add_entry(Value::from(1u64), &data).unwrap();
        let log = logger.finish();
        assert_eq!(log.deltas.len(), 1);
        assert!(log.deltas[0].d.is_none());
    }

    #[test]
    fn dictionary_grows_with_new_keys() {
        let mut logger = IncrementalLogger::new(Config::without_sentinels());
        logger.add_entry(Value::from(0u64), &Value::from(json!({"Score": 1}))).unwrap();
        logger
            .add_entry(Value::from(1u64), &Value::from(json!({"Score": 1, "Penalty": true})))
            .unwrap();
        assert_eq!(logger.dictionary().code_for("Penalty"), Some("b"));
        let log = logger.finish();
        assert_eq!(log.deltas[0].d, Some(json!({"b": true})));
        let out = decompress(&log, &Config::without_sentinels()).unwrap();
        assert_eq!(out[1].data, Value::from(json!({"Score": 1, "Penalty": true})));
    }

    #[test]
    fn key_matching_an_earlier_code_is_escaped() {
        let mut logger = IncrementalLogger::new(Config::without_sentinels());
        logger.add_entry(Value::from(0u64), &Value::from(json!({"Long": 1}))).unwrap();
        logger
            .add_entry(Value::from(1u64), &Value::from(json!({"Long": 1, "a": 2})))
            .unwrap();
        logger.add_entry(Value::from(2u64), &Value::from(json!({"a": 2, "Long": 3}))).unwrap();
        assert_eq!(logger.len(), 3);
        let log = logger.finish();
        assert_eq!(log.deltas[0].d, Some(json!({"=a": 2})));
        let out = decompress(&log, &Config::without_sentinels()).unwrap();
        assert_eq!(out[1].data, Value::from(json!({"Long": 1, "a": 2})));
        assert!(out[2].data.identical(&Value::from(json!({"a": 2, "Long": 3}))));
    }
}
