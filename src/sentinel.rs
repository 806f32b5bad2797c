//! Substitution of clock-derived scoreboard fields by markers.
//!
//! Two fields dominate the size of a live swim log: every lane still racing
//! shows the running clock as its final time, and the clock itself advances
//! by one tenth per snapshot. Both are replaced with [`Marker`]s before
//! diffing, so steady-state deltas shrink to almost nothing.

use crate::clock::{format_ticks, parse_ticks};
use crate::config::SentinelConfig;
use crate::error::{Result, ScorepackError};
use crate::value::{Map, Marker, Value};

/// Replace derivable fields of `data` with markers, on a copy.
///
/// `prev_ticks` is the real clock of the previous entry. The returned tick
/// count is this entry's real clock (or `prev_ticks` carried over when the
/// clock is missing or unreadable) and must be fed into the next call.
pub fn encode(cfg: &SentinelConfig, data: &Value, prev_ticks: Option<u32>) -> (Value, Option<u32>) {
    let mut out = data.clone();
    let clock = match out.get_path(cfg.clock.segments()) {
        Some(Value::String(s)) if !s.is_empty() => s.clone(),
        _ => return (out, prev_ticks),
    };

    let shown = Value::String(clock.clone());
    for lane in lane_records(&mut out, cfg) {
        if let Some(slot) = lane.get_mut(&cfg.final_time) {
            if *slot == shown {
                *slot = Value::Marker(Marker::MatchesClock);
            }
        }
    }

    let Some(ticks) = parse_ticks(&clock) else {
        return (out, prev_ticks);
    };
    // Only substitute when the canonical rendering reproduces the text, so
    // resolution is exact for every input.
    let advanced = prev_ticks.and_then(|p| p.checked_add(1)) == Some(ticks);
    if advanced && format_ticks(ticks) == clock {
        if let Some(slot) = out.get_path_mut(cfg.clock.segments()) {
            *slot = Value::Marker(Marker::TickAdvance);
        }
    }
    (out, Some(ticks))
}

/// Resolve markers in a materialized state, on a copy.
///
/// `prev_resolved` is the resolved clock of the previous output entry.
pub fn resolve(
    cfg: &SentinelConfig,
    state: &Value,
    prev_resolved: Option<u32>,
) -> Result<(Value, Option<u32>)> {
    let mut out = state.clone();
    let mut ticks = prev_resolved;

    let clock = match out.get_path_mut(cfg.clock.segments()) {
        Some(slot) => {
            match slot {
                Value::Marker(Marker::TickAdvance) => {
                    let next = prev_resolved
                        .and_then(|p| p.checked_add(1))
                        .ok_or_else(|| {
                            ScorepackError::malformed("clock tick marker without a preceding clock")
                        })?;
                    *slot = Value::String(format_ticks(next));
                    ticks = Some(next);
                }
                Value::Marker(Marker::MatchesClock) => {
                    return Err(ScorepackError::malformed("clock refers to itself"));
                }
                Value::String(s) => {
                    if let Some(t) = parse_ticks(s) {
                        ticks = Some(t);
                    }
                }
                _ => {}
            }
            Some(slot.clone())
        }
        None => None,
    };

    for lane in lane_records(&mut out, cfg) {
        let Some(slot) = lane.get_mut(&cfg.final_time) else { continue };
        if slot.as_marker() == Some(Marker::MatchesClock) {
            *slot = clock.clone().ok_or_else(|| {
                ScorepackError::malformed("final time marker without a running clock")
            })?;
        }
    }
    Ok((out, ticks))
}

/// Clock history threaded through consecutive entries.
///
/// Encoding and resolution each keep their own chain; both must see every
/// entry of a log exactly once and in order.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TickChain {
    prev: Option<u32>,
}

impl TickChain {
    /// Encode the next entry. Without a layout this is a plain copy.
    pub fn encode(&mut self, cfg: Option<&SentinelConfig>, data: &Value) -> Value {
        match cfg {
            Some(cfg) => {
                let (out, ticks) = encode(cfg, data, self.prev);
                self.prev = ticks;
                out
            }
            None => data.clone(),
        }
    }

    /// Resolve the next materialized state.
    pub fn resolve(&mut self, cfg: Option<&SentinelConfig>, state: &Value) -> Result<Value> {
        match cfg {
            Some(cfg) => {
                let (out, ticks) = resolve(cfg, state, self.prev)?;
                self.prev = ticks;
                Ok(out)
            }
            None => Ok(state.clone()),
        }
    }
}

fn lane_records<'v>(root: &'v mut Value, cfg: &SentinelConfig) -> Vec<&'v mut Map> {
    match root.get_path_mut(cfg.lanes.segments()) {
        Some(Value::List(items)) => items
            .iter_mut()
            .filter_map(|item| match item {
                Value::Map(map) => Some(map),
                _ => None,
            })
            .collect(),
        Some(Value::Map(map)) => vec![map],
        _ => Vec::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use serde_json::json;

    fn flat() -> SentinelConfig {
        Config::with_layout("RunningTime", "Lane", "FinalTime")
            .unwrap()
            .sentinels
            .unwrap()
    }

    fn snap(clock: &str, final_time: &str) -> Value {
        Value::from(json!({"RunningTime": clock, "Lane": {"FinalTime": final_time}}))
    }

    #[test]
    fn final_time_and_tick_are_substituted() {
        let cfg = flat();
        let (first, ticks) = encode(&cfg, &snap("  : 1.0 ", "  : 1.0 "), None);
        assert_eq!(ticks, Some(10));
        assert_eq!(first.get("RunningTime"), Some(&Value::from("  : 1.0 ")));
        assert_eq!(
            first.get_path(&["Lane", "FinalTime"]),
            Some(&Value::Marker(Marker::MatchesClock))
        );

        let (second, ticks) = encode(&cfg, &snap("  : 1.1 ", "  : 1.1 "), ticks);
        assert_eq!(ticks, Some(11));
        assert_eq!(second.get("RunningTime"), Some(&Value::Marker(Marker::TickAdvance)));
        assert_eq!(
            second.get_path(&["Lane", "FinalTime"]),
            Some(&Value::Marker(Marker::MatchesClock))
        );
    }

    #[test]
    fn resolve_restores_literal_text() {
        let cfg = flat();
        let a = snap("  :59.9 ", "  :59.9 ");
        let b = snap(" 1:00.0 ", "  :58.2 ");
        let (ea, t) = encode(&cfg, &a, None);
        let (eb, _) = encode(&cfg, &b, t);
        assert_eq!(eb.get("RunningTime"), Some(&Value::Marker(Marker::TickAdvance)));

        let (ra, rt) = resolve(&cfg, &ea, None).unwrap();
        let (rb, rt) = resolve(&cfg, &eb, rt).unwrap();
        assert_eq!(ra, a);
        assert_eq!(rb, b);
        assert_eq!(rt, Some(600));
    }

    #[test]
    fn jump_or_repeat_is_not_a_tick() {
        let cfg = flat();
        let (_, t) = encode(&cfg, &snap("  : 1.0 ", ""), None);
        let (same, t) = encode(&cfg, &snap("  : 1.0 ", ""), t);
        assert_eq!(same.get("RunningTime"), Some(&Value::from("  : 1.0 ")));
        let (jump, _) = encode(&cfg, &snap("  : 1.5 ", ""), t);
        assert_eq!(jump.get("RunningTime"), Some(&Value::from("  : 1.5 ")));
    }

    #[test]
    fn non_canonical_clock_stays_literal() {
        let cfg = flat();
        let (_, t) = encode(&cfg, &snap("  : 0.4 ", ""), None);
        let (e, t) = encode(&cfg, &snap("  :  .5 ", ""), t);
        assert_eq!(e.get("RunningTime"), Some(&Value::from("  :  .5 ")));
        assert_eq!(t, Some(5));
    }

    #[test]
    fn unreadable_clock_carries_previous_ticks() {
        let cfg = flat();
        let (_, t) = encode(&cfg, &snap("  : 1.0 ", ""), None);
        let (_, t) = encode(&cfg, &snap("--:--.- ", ""), t);
        assert_eq!(t, Some(10));
        let (e, _) = encode(&cfg, &snap("  : 1.1 ", ""), t);
        assert_eq!(e.get("RunningTime"), Some(&Value::Marker(Marker::TickAdvance)));
    }

    #[test]
    fn lane_list_layout() {
        let cfg = SentinelConfig::default();
        let data = Value::from(json!({"swimming": {
            "RunningTime": " 2:10.4 ",
            "LaneAthleteTeam": [
                {"FinalTime": " 2:10.4 "},
                {"FinalTime": " 2:01.77"},
                "not a lane"
            ]
        }}));
        let (enc, _) = encode(&cfg, &data, None);
        let lanes = enc.get_path(&["swimming", "LaneAthleteTeam"]).unwrap().as_list().unwrap();
        assert_eq!(lanes[0].get("FinalTime"), Some(&Value::Marker(Marker::MatchesClock)));
        assert_eq!(lanes[1].get("FinalTime"), Some(&Value::from(" 2:01.77")));
        assert_eq!(resolve(&cfg, &enc, None).unwrap().0, data);
    }

    #[test]
    fn caller_data_is_untouched() {
        let cfg = flat();
        let data = snap("  : 1.0 ", "  : 1.0 ");
        let before = data.clone();
        let _ = encode(&cfg, &data, Some(9));
        assert_eq!(data, before);
    }

    #[test]
    fn tick_without_history_is_malformed() {
        let cfg = flat();
        let state = Value::from(json!({"Lane": {}}));
        let mut state = state;
        if let Value::Map(m) = &mut state {
            m.insert("RunningTime".into(), Value::Marker(Marker::TickAdvance));
        }
        assert!(matches!(
            resolve(&cfg, &state, None),
            Err(ScorepackError::MalformedArtifact(_))
        ));
    }
}
