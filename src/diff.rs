use crate::delta::{Delta, ListDelta, MapDelta, Op};
use crate::value::{Map, Value};

/// Compute the minimal delta turning `prev` into `curr`.
///
/// Returns `None` when the two values are identical, key order included.
/// Containers of the same kind are diffed recursively; everything else is a
/// full replacement by a copy of `curr`. A map whose surviving keys change
/// order is also replaced whole, since patching can only append keys.
pub fn diff(prev: &Value, curr: &Value) -> Option<Delta> {
    match (prev, curr) {
        (Value::Map(p), Value::Map(c)) => {
            if !keeps_key_order(p, c) {
                return Some(Delta::Replace(curr.clone()));
            }
            let mut out = MapDelta::default();
            for (key, new) in c {
                match p.get(key) {
                    None => {
                        out.ops.insert(key.clone(), Op::Set(Delta::Replace(new.clone())));
                    }
                    Some(old) => {
                        if let Some(d) = diff(old, new) {
                            out.ops.insert(key.clone(), Op::Set(d));
                        }
                    }
                }
            }
            for key in p.keys() {
                if !c.contains_key(key) {
                    out.ops.insert(key.clone(), Op::Delete);
                }
            }
            (!out.is_empty()).then_some(Delta::Map(out))
        }
        (Value::List(p), Value::List(c)) => {
            let mut out = ListDelta::default();
            for i in 0..p.len().max(c.len()) {
                match (p.get(i), c.get(i)) {
                    (None, Some(new)) => {
                        out.ops.insert(i, Op::Set(Delta::Replace(new.clone())));
                    }
                    (Some(_), None) => {
                        out.ops.insert(i, Op::Delete);
                    }
                    (Some(old), Some(new)) => {
                        if let Some(d) = diff(old, new) {
                            out.ops.insert(i, Op::Set(d));
                        }
                    }
                    (None, None) => unreachable!("index below max length"),
                }
            }
            if p.len() != c.len() {
                out.new_len = Some(c.len());
            }
            (!out.is_empty()).then_some(Delta::List(out))
        }
        _ if prev == curr => None,
        _ => Some(Delta::Replace(curr.clone())),
    }
}

/// Whether patching `p` (kept keys in place, new keys appended) yields the
/// key order of `c`.
fn keeps_key_order(p: &Map, c: &Map) -> bool {
    p.keys()
        .filter(|k| c.contains_key(*k))
        .chain(c.keys().filter(|k| !p.contains_key(*k)))
        .eq(c.keys())
}

/// Path of the first place where `a` and `b` differ, e.g. `.lanes[2].Time`.
/// `None` when they are identical, key order included.
pub fn first_difference(a: &Value, b: &Value) -> Option<String> {
    if a.identical(b) {
        return None;
    }
    match (a, b) {
        (Value::Map(ma), Value::Map(mb)) => {
            for (key, va) in ma {
                match mb.get(key) {
                    None => return Some(format!(".{key} (missing)")),
                    Some(vb) => {
                        if let Some(rest) = first_difference(va, vb) {
                            return Some(format!(".{key}{rest}"));
                        }
                    }
                }
            }
            match mb.keys().find(|k| !ma.contains_key(*k)) {
                Some(extra) => Some(format!(".{extra} (extra)")),
                None => Some(" (key order)".to_string()),
            }
        }
        (Value::List(la), Value::List(lb)) if la.len() == lb.len() => la
            .iter()
            .zip(lb)
            .enumerate()
            .find_map(|(i, (x, y))| first_difference(x, y).map(|rest| format!("[{i}]{rest}"))),
        (Value::List(la), Value::List(lb)) => Some(format!(" (length {} vs {})", la.len(), lb.len())),
        _ => Some(format!(
            " ({} vs {})",
            serde_json::Value::from(a.clone()),
            serde_json::Value::from(b.clone())
        )),
    }
}
