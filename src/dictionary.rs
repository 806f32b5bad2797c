//! Short codes for repeated object keys.
//!
//! Codes run `a`..`z`, `aa`..`zz`, `aaa`.. in assignment order. A key only
//! receives a code strictly shorter than itself, and no code is ever handed
//! out that equals a key observed earlier in the same log. A literal key
//! that starts with `=`, or that arrives after its text was given out as a
//! code, is written with one extra leading `=`, so expansion is never
//! ambiguous.

use std::collections::{HashMap, HashSet};

use indexmap::IndexMap;

use crate::delta::{Delta, Op};
use crate::error::{Result, ScorepackError};
use crate::value::{Map, Value};
use crate::{ESCAPE, LEN_KEY, SET_KEY};

/// Generate the code for position `index` (bijective base 26).
pub fn code_for_index(index: u64) -> Result<String> {
    let mut n = index.checked_add(1).ok_or(ScorepackError::DictionaryExhausted)?;
    let mut letters = Vec::new();
    while n > 0 {
        n -= 1;
        letters.push(b'a' + (n % 26) as u8);
        n /= 26;
    }
    letters.reverse();
    Ok(letters.into_iter().map(char::from).collect())
}

/// Keys made only of ASCII digits are list positions in the wire format and
/// are never counted or remapped.
pub fn is_index_key(key: &str) -> bool {
    !key.is_empty() && key.bytes().all(|b| b.is_ascii_digit())
}

/// Keys the wire format gives meaning to are never remapped.
fn is_fixed_key(key: &str) -> bool {
    is_index_key(key) || key == SET_KEY || key == LEN_KEY
}

fn is_code(key: &str) -> bool {
    !key.is_empty() && key.bytes().all(|b| b.is_ascii_lowercase())
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Dictionary {
    /// code -> key, in assignment order.
    codes: IndexMap<String, String>,
    /// key -> code.
    lookup: HashMap<String, String>,
    /// Every key observed so far, shortened or not.
    seen: HashSet<String>,
    cursor: u64,
}

impl Dictionary {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a dictionary ranked by estimated savings (`count × length`)
    /// over a baseline and its deltas.
    pub fn build<'a, I>(baseline: &Value, deltas: I) -> Result<Self>
    where
        I: IntoIterator<Item = &'a Delta>,
    {
        let mut counts: IndexMap<String, u64> = IndexMap::new();
        count_value(baseline, &mut counts);
        for delta in deltas {
            count_delta(delta, &mut counts);
        }

        let mut ranked: Vec<(&String, u64)> = counts
            .iter()
            .map(|(key, &count)| (key, count.saturating_mul(key.len() as u64)))
            .collect();
        // Stable: ties keep first-encounter order.
        ranked.sort_by(|a, b| b.1.cmp(&a.1));

        let mut dict = Dictionary {
            seen: counts.keys().cloned().collect(),
            ..Dictionary::default()
        };
        for (key, _) in ranked {
            dict.offer(key)?;
        }
        log::debug!(
            "dictionary: {} of {} keys shortened",
            dict.len(),
            counts.len()
        );
        Ok(dict)
    }

    /// Rebuild a dictionary from its serialized code table.
    pub fn from_table(table: &IndexMap<String, String>) -> Result<Self> {
        let mut dict = Dictionary::default();
        for (code, key) in table {
            if !is_code(code) {
                return Err(ScorepackError::malformed(format!("invalid dictionary code '{code}'")));
            }
            if is_fixed_key(key) {
                return Err(ScorepackError::malformed(format!("reserved key '{key}' has a code")));
            }
            if code.len() >= key.len() {
                return Err(ScorepackError::malformed(format!(
                    "dictionary code '{code}' does not shorten '{key}'"
                )));
            }
            if dict.lookup.insert(key.clone(), code.clone()).is_some() {
                return Err(ScorepackError::malformed(format!("key '{key}' has two codes")));
            }
            dict.codes.insert(code.clone(), key.clone());
            dict.seen.insert(key.clone());
        }
        dict.cursor = table.len() as u64;
        Ok(dict)
    }

    pub fn len(&self) -> usize {
        self.codes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.codes.is_empty()
    }

    /// code -> key table in assignment order.
    pub fn table(&self) -> &IndexMap<String, String> {
        &self.codes
    }

    pub fn code_for(&self, key: &str) -> Option<&str> {
        self.lookup.get(key).map(String::as_str)
    }

    /// Hand the next free code to `key` if one shorter than it exists.
    fn offer(&mut self, key: &str) -> Result<()> {
        loop {
            let code = code_for_index(self.cursor)?;
            if code.len() >= key.len() {
                return Ok(());
            }
            self.cursor += 1;
            if self.seen.contains(&code) {
                continue;
            }
            self.lookup.insert(key.to_string(), code.clone());
            self.codes.insert(code, key.to_string());
            return Ok(());
        }
    }

    /// Streaming mode: register one key at first encounter.
    ///
    /// A key equal to an already assigned code is accepted; it is escaped
    /// when shortened.
    pub fn observe_key(&mut self, key: &str) -> Result<()> {
        if is_fixed_key(key) || !self.seen.insert(key.to_string()) {
            return Ok(());
        }
        if let Some(owner) = self.codes.get(key) {
            log::debug!("key '{key}' matches the code for '{owner}', escaping it");
        }
        self.offer(key)
    }

    /// Streaming mode: register every key of a value in document order.
    pub fn observe_value(&mut self, value: &Value) -> Result<()> {
        match value {
            Value::Map(map) => {
                for (key, child) in map {
                    self.observe_key(key)?;
                    self.observe_value(child)?;
                }
                Ok(())
            }
            Value::List(items) => items.iter().try_for_each(|item| self.observe_value(item)),
            _ => Ok(()),
        }
    }

    /// Streaming mode: register every key a delta touches.
    pub fn observe_delta(&mut self, delta: &Delta) -> Result<()> {
        match delta {
            Delta::Replace(v) => self.observe_value(v),
            Delta::Map(m) => {
                for (key, op) in &m.ops {
                    self.observe_key(key)?;
                    if let Op::Set(d) = op {
                        self.observe_delta(d)?;
                    }
                }
                Ok(())
            }
            Delta::List(l) => l.ops.values().try_for_each(|op| match op {
                Op::Set(d) => self.observe_delta(d),
                Op::Delete => Ok(()),
            }),
        }
    }

    fn short_key(&self, key: &str) -> String {
        if let Some(code) = self.lookup.get(key) {
            code.clone()
        } else if key.starts_with(ESCAPE) || self.codes.contains_key(key) {
            format!("{ESCAPE}{key}")
        } else {
            key.to_string()
        }
    }

    /// Rewrite every map key that has a code and escape literal keys that
    /// could be misread as one.
    pub fn shorten_value(&self, value: &Value) -> Value {
        match value {
            Value::Map(map) => Value::Map(
                map.iter()
                    .map(|(k, v)| (self.short_key(k), self.shorten_value(v)))
                    .collect::<Map>(),
            ),
            Value::List(items) => Value::List(items.iter().map(|v| self.shorten_value(v)).collect()),
            other => other.clone(),
        }
    }

    pub fn shorten_delta(&self, delta: &Delta) -> Delta {
        let shorten_op = |op: &Op| match op {
            Op::Delete => Op::Delete,
            Op::Set(d) => Op::Set(self.shorten_delta(d)),
        };
        match delta {
            Delta::Replace(v) => Delta::Replace(self.shorten_value(v)),
            Delta::Map(m) => {
                let mut out = crate::delta::MapDelta::default();
                for (key, op) in &m.ops {
                    out.ops.insert(self.short_key(key), shorten_op(op));
                }
                Delta::Map(out)
            }
            Delta::List(l) => {
                let mut out = l.clone();
                for op in out.ops.values_mut() {
                    *op = shorten_op(op);
                }
                Delta::List(out)
            }
        }
    }

    /// Inverse of [`Dictionary::shorten_value`].
    pub fn expand_value(&self, value: &Value) -> Value {
        match value {
            Value::Map(map) => Value::Map(
                map.iter()
                    .map(|(k, v)| (self.long_key(k), self.expand_value(v)))
                    .collect::<Map>(),
            ),
            Value::List(items) => Value::List(items.iter().map(|v| self.expand_value(v)).collect()),
            other => other.clone(),
        }
    }

    /// Expand codes in wire JSON. Codes are lowercase letters only, so
    /// list positions and reserved wire keys pass through untouched.
    pub fn expand_json(&self, json: &serde_json::Value) -> serde_json::Value {
        match json {
            serde_json::Value::Object(map) => serde_json::Value::Object(
                map.iter()
                    .map(|(k, v)| (self.long_key(k), self.expand_json(v)))
                    .collect(),
            ),
            serde_json::Value::Array(items) => {
                serde_json::Value::Array(items.iter().map(|v| self.expand_json(v)).collect())
            }
            other => other.clone(),
        }
    }

    fn long_key(&self, key: &str) -> String {
        if let Some(literal) = key.strip_prefix(ESCAPE) {
            return literal.to_string();
        }
        self.codes.get(key).cloned().unwrap_or_else(|| key.to_string())
    }
}

fn count_key(key: &str, counts: &mut IndexMap<String, u64>) {
    if !is_fixed_key(key) {
        *counts.entry(key.to_string()).or_default() += 1;
    }
}

fn count_value(value: &Value, counts: &mut IndexMap<String, u64>) {
    match value {
        Value::Map(map) => {
            for (key, child) in map {
                count_key(key, counts);
                count_value(child, counts);
            }
        }
        Value::List(items) => items.iter().for_each(|item| count_value(item, counts)),
        _ => {}
    }
}

fn count_delta(delta: &Delta, counts: &mut IndexMap<String, u64>) {
    match delta {
        Delta::Replace(v) => count_value(v, counts),
        Delta::Map(m) => {
            for (key, op) in &m.ops {
                count_key(key, counts);
                if let Op::Set(d) = op {
                    count_delta(d, counts);
                }
            }
        }
        Delta::List(l) => {
            for op in l.ops.values() {
                if let Op::Set(d) = op {
                    count_delta(d, counts);
                }
            }
        }
    }
}
