use crate::delta::{Delta, ListDelta, MapDelta, Op};
use crate::value::{Map, Value};

/// Apply `delta` to an owned state and return the result.
pub fn apply(mut state: Value, delta: &Delta) -> Value {
    apply_in_place(&mut state, delta);
    state
}

/// Apply `delta` to `state` in place.
///
/// A map delta applied to something that is not a map starts from an empty
/// map, and likewise for lists. Index deletions are no-ops; the recorded new
/// length does the truncation once all index assignments are done.
pub fn apply_in_place(state: &mut Value, delta: &Delta) {
    match delta {
        Delta::Replace(v) => *state = v.clone(),
        Delta::Map(m) => {
            if !matches!(state, Value::Map(_)) {
                *state = Value::Map(Map::new());
            }
            if let Value::Map(map) = state {
                apply_map(map, m);
            }
        }
        Delta::List(l) => {
            if !matches!(state, Value::List(_)) {
                *state = Value::List(Vec::new());
            }
            if let Value::List(items) = state {
                apply_list(items, l);
            }
        }
    }
}

fn apply_map(map: &mut Map, delta: &MapDelta) {
    for (key, op) in &delta.ops {
        match op {
            Op::Delete => {
                map.shift_remove(key);
            }
            Op::Set(d) => match map.get_mut(key) {
                Some(slot) => apply_in_place(slot, d),
                None => {
                    let mut slot = Value::Null;
                    apply_in_place(&mut slot, d);
                    map.insert(key.clone(), slot);
                }
            },
        }
    }
}

fn apply_list(items: &mut Vec<Value>, delta: &ListDelta) {
    for (&idx, op) in &delta.ops {
        let Op::Set(d) = op else { continue };
        if idx >= items.len() {
            items.resize(idx + 1, Value::Null);
        }
        apply_in_place(&mut items[idx], d);
    }
    if let Some(len) = delta.new_len {
        items.resize(len, Value::Null);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diff::diff;
    use serde_json::json;

    fn v(json: serde_json::Value) -> Value {
        Value::from(json)
    }

    fn roundtrip(prev: serde_json::Value, curr: serde_json::Value) {
        let prev = v(prev);
        let curr = v(curr);
        match diff(&prev, &curr) {
            Some(d) => assert!(apply(prev.clone(), &d).identical(&curr)),
            None => assert!(prev.identical(&curr)),
        }
    }

    #[test]
    fn patch_reproduces_target() {
        roundtrip(json!({"a": 1}), json!({"a": 2}));
        roundtrip(json!({"a": {"b": [1, 2, {"c": 3}]}}), json!({"a": {"b": [1, {"c": 3}]}}));
        roundtrip(json!([1, 2, 3]), json!([1]));
        roundtrip(json!([1]), json!([1, [2, 3], {"x": null}]));
        roundtrip(json!({"x": [1, 2]}), json!({"x": {"k": 1}}));
        roundtrip(json!({"x": {"k": 1}}), json!({"x": [1]}));
        roundtrip(json!("scalar"), json!({"now": "map"}));
        roundtrip(json!({"keep": 1, "drop": 2}), json!({"keep": 1}));
        roundtrip(json!([]), json!([]));
        roundtrip(json!({"a": 1, "c": 3}), json!({"a": 1, "b": 2, "c": 3}));
        roundtrip(json!({"a": 1, "b": 2}), json!({"b": 2, "a": 1}));
    }

    #[test]
    fn shrinking_list_leaves_no_stale_tail() {
        let prev = v(json!(["a", "b", "c"]));
        let curr = v(json!(["z"]));
        let d = diff(&prev, &curr).unwrap();
        let out = apply(prev, &d);
        assert_eq!(out, curr);
        assert_eq!(out.as_list().map(<[Value]>::len), Some(1));
    }

    #[test]
    fn deleting_key_preserves_order_of_rest() {
        let prev = v(json!({"a": 1, "b": 2, "c": 3}));
        let curr = v(json!({"a": 1, "c": 3}));
        let out = apply(prev.clone(), &diff(&prev, &curr).unwrap());
        let keys: Vec<_> = out.as_map().unwrap().keys().cloned().collect();
        assert_eq!(keys, ["a", "c"]);
    }

    #[test]
    fn list_growth_past_end_fills_with_null() {
        let mut ops = std::collections::BTreeMap::new();
        ops.insert(3, Op::Set(Delta::Replace(v(json!("x")))));
        let delta = Delta::List(ListDelta { ops, new_len: None });
        let out = apply(v(json!([1])), &delta);
        assert_eq!(out, v(json!([1, null, null, "x"])));
    }

    #[test]
    fn map_delta_over_scalar_builds_map() {
        let mut ops = indexmap::IndexMap::new();
        ops.insert("k".to_string(), Op::Set(Delta::Replace(v(json!(1)))));
        let out = apply(v(json!(7)), &Delta::Map(MapDelta { ops }));
        assert_eq!(out, v(json!({"k": 1})));
    }
}
