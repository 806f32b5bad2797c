//! JSON encoding of values and deltas inside a compressed log.
//!
//! Markers are written as `"=RT"` / `"=TICK"`, deletions as `"__$DEL$__"`.
//! Literal strings that start with `=` or equal the delete token get one
//! extra leading `=`, so no snapshot string can be read back as a marker.
//!
//! Delta objects are untyped on the wire: whether an object is a list
//! delta, a map delta or a literal depends on the state it is applied to,
//! so decoding takes that state. A map replacing a list or a map cannot be
//! told apart from a delta and is written as `{"__set": value}`. A map delta
//! whose only key is `__set` would read as that wrapper, so it is written as
//! the wrapped result instead.

use serde_json::{Map as JsonMap, Value as Json};

use crate::delta::{Delta, ListDelta, MapDelta, Op};
use crate::dictionary::is_index_key;
use crate::error::{Result, ScorepackError};
use crate::patch::apply;
use crate::value::{Marker, Value};
use crate::{DELETE_TOKEN, ESCAPE, LEN_KEY, SET_KEY};

static NULL: Value = Value::Null;

pub fn encode_value(value: &Value) -> Json {
    match value {
        Value::Null => Json::Null,
        Value::Bool(b) => Json::Bool(*b),
        Value::Number(n) => Json::Number(n.clone()),
        Value::String(s) => {
            if s.starts_with(ESCAPE) || s == DELETE_TOKEN {
                Json::String(format!("{ESCAPE}{s}"))
            } else {
                Json::String(s.clone())
            }
        }
        Value::List(items) => Json::Array(items.iter().map(encode_value).collect()),
        Value::Map(map) => Json::Object(
            map.iter()
                .map(|(k, v)| (k.clone(), encode_value(v)))
                .collect(),
        ),
        Value::Marker(m) => Json::String(m.token().to_string()),
    }
}

pub fn decode_value(json: &Json) -> Result<Value> {
    Ok(match json {
        Json::Null => Value::Null,
        Json::Bool(b) => Value::Bool(*b),
        Json::Number(n) => Value::Number(n.clone()),
        Json::String(s) => decode_string(s)?,
        Json::Array(items) => Value::List(items.iter().map(decode_value).collect::<Result<_>>()?),
        Json::Object(map) => Value::Map(
            map.iter()
                .map(|(k, v)| Ok((k.clone(), decode_value(v)?)))
                .collect::<Result<_>>()?,
        ),
    })
}

fn decode_string(s: &str) -> Result<Value> {
    if s == DELETE_TOKEN {
        return Err(ScorepackError::malformed("delete marker outside a delta position"));
    }
    if let Some(rest) = s.strip_prefix(ESCAPE) {
        if rest.starts_with(ESCAPE) || rest == DELETE_TOKEN {
            return Ok(Value::String(rest.to_string()));
        }
    }
    Ok(match Marker::from_token(s) {
        Some(marker) => Value::Marker(marker),
        None => Value::String(s.to_string()),
    })
}

/// Encode a delta produced by diffing `base` against its successor.
pub fn encode_delta(delta: &Delta, base: &Value) -> Json {
    match delta {
        Delta::Replace(v) => {
            if needs_wrapper(base, v) {
                wrap(encode_value(v))
            } else {
                encode_value(v)
            }
        }
        Delta::Map(m) if m.ops.len() == 1 && m.ops.contains_key(SET_KEY) => {
            wrap(encode_value(&apply(base.clone(), delta)))
        }
        Delta::Map(m) => {
            let mut out = JsonMap::new();
            for (key, op) in &m.ops {
                let child = base.get(key).unwrap_or(&NULL);
                out.insert(key.clone(), encode_op(op, child));
            }
            Json::Object(out)
        }
        Delta::List(l) => {
            let items = base.as_list().unwrap_or(&[]);
            let mut out = JsonMap::new();
            for (&idx, op) in &l.ops {
                let child = items.get(idx).unwrap_or(&NULL);
                out.insert(idx.to_string(), encode_op(op, child));
            }
            if let Some(len) = l.new_len {
                out.insert(LEN_KEY.to_string(), Json::from(len));
            }
            Json::Object(out)
        }
    }
}

fn wrap(value: Json) -> Json {
    let mut wrapper = JsonMap::new();
    wrapper.insert(SET_KEY.to_string(), value);
    Json::Object(wrapper)
}

/// A literal map must be wrapped where the decoder would otherwise read it
/// as a delta, or mistake the map itself for a wrapper.
fn needs_wrapper(base: &Value, v: &Value) -> bool {
    match (base, v) {
        (Value::List(_) | Value::Map(_), Value::Map(_)) => true,
        (Value::Map(_), _) => false,
        (_, Value::Map(map)) => map.len() == 1 && map.contains_key(SET_KEY),
        _ => false,
    }
}

fn encode_op(op: &Op, base: &Value) -> Json {
    match op {
        Op::Delete => Json::String(DELETE_TOKEN.to_string()),
        Op::Set(d) => encode_delta(d, base),
    }
}

/// Decode a wire delta against the state it will be applied to.
pub fn decode_delta(json: &Json, base: &Value) -> Result<Delta> {
    match (json, base) {
        (Json::Object(obj), Value::List(items)) => {
            if let Some(v) = obj.get(SET_KEY) {
                if obj.len() != 1 {
                    return Err(ScorepackError::malformed("replacement wrapper with extra keys"));
                }
                return Ok(Delta::Replace(decode_value(v)?));
            }
            // Growth can only come from ops in this same delta.
            let limit = items.len() + obj.len();
            let mut out = ListDelta::default();
            for (key, v) in obj {
                if key == LEN_KEY {
                    let len = v
                        .as_u64()
                        .and_then(|n| usize::try_from(n).ok())
                        .filter(|&n| n <= limit)
                        .ok_or_else(|| ScorepackError::malformed(format!("invalid list length {v}")))?;
                    out.new_len = Some(len);
                    continue;
                }
                let idx = parse_index(key)
                    .filter(|&i| i < limit)
                    .ok_or_else(|| ScorepackError::malformed(format!("invalid list index '{key}'")))?;
                let child = items.get(idx).unwrap_or(&NULL);
                out.ops.insert(idx, decode_op(v, child)?);
            }
            Ok(Delta::List(out))
        }
        (Json::Object(obj), Value::Map(map)) => {
            if let (1, Some(v)) = (obj.len(), obj.get(SET_KEY)) {
                return Ok(Delta::Replace(decode_value(v)?));
            }
            let mut out = MapDelta::default();
            for (key, v) in obj {
                let child = map.get(key).unwrap_or(&NULL);
                out.ops.insert(key.clone(), decode_op(v, child)?);
            }
            Ok(Delta::Map(out))
        }
        (Json::Object(obj), _) => match obj.get(SET_KEY) {
            Some(v) if obj.len() == 1 => Ok(Delta::Replace(decode_value(v)?)),
            _ => Ok(Delta::Replace(decode_value(json)?)),
        },
        _ => Ok(Delta::Replace(decode_value(json)?)),
    }
}

fn decode_op(json: &Json, base: &Value) -> Result<Op> {
    if json.as_str() == Some(DELETE_TOKEN) {
        Ok(Op::Delete)
    } else {
        Ok(Op::Set(decode_delta(json, base)?))
    }
}

fn parse_index(key: &str) -> Option<usize> {
    if !is_index_key(key) {
        return None;
    }
    let idx: usize = key.parse().ok()?;
    // Reject aliases such as "01".
    (idx.to_string() == key).then_some(idx)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diff::diff;
    use serde_json::json;

    fn v(json: Json) -> Value {
        Value::from(json)
    }

    fn through_wire(prev: Json, curr: Json) -> (Json, Value) {
        let prev = v(prev);
        let curr = v(curr);
        let d = diff(&prev, &curr).expect("values differ");
        let wire = encode_delta(&d, &prev);
        let decoded = decode_delta(&wire, &prev).unwrap();
        assert_eq!(decoded, d);
        (wire, apply(prev, &decoded))
    }

    #[test]
    fn escapes_reserved_looking_strings() {
        for s in ["=RT", "=TICK", "==x", "=", "__$DEL$__", "plain", "a=b"] {
            let value = Value::from(s);
            let wire = encode_value(&value);
            assert_eq!(decode_value(&wire).unwrap(), value, "{s}");
        }
        assert_eq!(encode_value(&Value::from("=RT")), json!("==RT"));
        assert_eq!(encode_value(&Value::from("plain")), json!("plain"));
    }

    #[test]
    fn markers_use_tokens() {
        assert_eq!(encode_value(&Value::Marker(Marker::MatchesClock)), json!("=RT"));
        assert_eq!(decode_value(&json!("=TICK")).unwrap(), Value::Marker(Marker::TickAdvance));
        // Unknown single-escape strings are ordinary text.
        assert_eq!(decode_value(&json!("=5")).unwrap(), Value::from("=5"));
    }

    #[test]
    fn stray_delete_token_is_rejected() {
        assert!(matches!(
            decode_value(&json!({"a": ["__$DEL$__"]})),
            Err(ScorepackError::MalformedArtifact(_))
        ));
    }

    #[test]
    fn list_delta_wire_shape() {
        let (wire, out) = through_wire(json!({"l": [1, 2, 3]}), json!({"l": [9]}));
        assert_eq!(
            wire,
            json!({"l": {"0": 9, "1": "__$DEL$__", "2": "__$DEL$__", "__len": 1}})
        );
        assert_eq!(out, v(json!({"l": [9]})));
    }

    #[test]
    fn map_replacing_list_is_wrapped() {
        let (wire, out) = through_wire(json!({"x": [1, 2]}), json!({"x": {"0": "a"}}));
        assert_eq!(wire, json!({"x": {"__set": {"0": "a"}}}));
        assert_eq!(out, v(json!({"x": {"0": "a"}})));
    }

    #[test]
    fn reordered_map_is_wrapped() {
        let (wire, out) = through_wire(
            json!({"s": {"Lane": 1, "Time": "x"}}),
            json!({"s": {"Lane": 1, "Place": 2, "Time": "x"}}),
        );
        assert_eq!(wire, json!({"s": {"__set": {"Lane": 1, "Place": 2, "Time": "x"}}}));
        assert!(out.identical(&v(json!({"s": {"Lane": 1, "Place": 2, "Time": "x"}}))));
    }

    #[test]
    fn lone_set_key_change_is_written_as_result() {
        for (prev, curr) in [
            (json!({"a": 1, "__set": 1}), json!({"a": 1, "__set": 2})),
            (json!({"a": 1, "__set": 1}), json!({"a": 1})),
            (json!({"a": 1}), json!({"a": 1, "__set": {"b": 2}})),
        ] {
            let prev = v(prev);
            let curr = v(curr);
            let d = diff(&prev, &curr).unwrap();
            let wire = encode_delta(&d, &prev);
            assert_eq!(wire, json!({"__set": Json::from(curr.clone())}));
            let back = decode_delta(&wire, &prev).unwrap();
            assert!(apply(prev, &back).identical(&curr));
        }
    }

    #[test]
    fn literal_map_keys_that_look_reserved() {
        through_wire(json!({"m": {"a": 1}}), json!({"m": {"__len": 2, "__set": 3, "4": 5}}));
        through_wire(json!({"m": null}), json!({"m": {"__set": 1}}));
        through_wire(json!([0]), json!([{"__set": {"__len": 7}}, []]));
    }

    #[test]
    fn rejects_bad_list_keys() {
        let base = v(json!([1, 2]));
        assert!(decode_delta(&json!({"x": 1}), &base).is_err());
        assert!(decode_delta(&json!({"01": 1}), &base).is_err());
        assert!(decode_delta(&json!({"__len": -1}), &base).is_err());
        assert!(decode_delta(&json!({"__len": 1000000}), &base).is_err());
        assert!(decode_delta(&json!({"99999999": 1}), &base).is_err());
    }
}
