//! JSON-like value tree shared by snapshots and delta payloads.
//!
//! Maps keep insertion order so that re-serializing a decoded snapshot
//! reproduces its original bytes, but map equality ignores order. Derived
//! scoreboard fields are carried as [`Marker`] variants rather than magic
//! strings, so no user data can be mistaken for one.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Number;

/// Insertion-ordered object type.
pub type Map = IndexMap<String, Value>;

/// Placeholder for a field whose value is derivable from the running clock.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Marker {
    /// Lane final time equals the running clock of the same snapshot.
    MatchesClock,
    /// Running clock is exactly one tick after the previous snapshot's.
    TickAdvance,
}

impl Marker {
    /// Token used for this marker in the wire encoding.
    pub fn token(self) -> &'static str {
        match self {
            Marker::MatchesClock => crate::RT_TOKEN,
            Marker::TickAdvance => crate::TICK_TOKEN,
        }
    }

    pub fn from_token(token: &str) -> Option<Self> {
        match token {
            crate::RT_TOKEN => Some(Marker::MatchesClock),
            crate::TICK_TOKEN => Some(Marker::TickAdvance),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(from = "serde_json::Value", into = "serde_json::Value")]
pub enum Value {
    #[default]
    Null,
    Bool(bool),
    Number(Number),
    String(String),
    List(Vec<Value>),
    Map(Map),
    Marker(Marker),
}

impl Value {
    pub fn as_map(&self) -> Option<&Map> {
        match self {
            Value::Map(map) => Some(map),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[Value]> {
        match self {
            Value::List(items) => Some(items),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_marker(&self) -> Option<Marker> {
        match self {
            Value::Marker(m) => Some(*m),
            _ => None,
        }
    }

    /// Look up a child by map key.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.as_map().and_then(|map| map.get(key))
    }

    /// Follow a sequence of map keys.
    pub fn get_path<S: AsRef<str>>(&self, path: &[S]) -> Option<&Value> {
        path.iter().try_fold(self, |node, key| node.get(key.as_ref()))
    }

    pub fn get_path_mut<S: AsRef<str>>(&mut self, path: &[S]) -> Option<&mut Value> {
        path.iter().try_fold(self, |node, key| match node {
            Value::Map(map) => map.get_mut(key.as_ref()),
            _ => None,
        })
    }

    /// Equality that also requires maps to list their keys in the same order.
    pub fn identical(&self, other: &Value) -> bool {
        match (self, other) {
            (Value::Map(a), Value::Map(b)) => {
                a.len() == b.len()
                    && a.iter().zip(b).all(|((ka, va), (kb, vb))| ka == kb && va.identical(vb))
            }
            (Value::List(a), Value::List(b)) => {
                a.len() == b.len() && a.iter().zip(b).all(|(x, y)| x.identical(y))
            }
            _ => self == other,
        }
    }

    /// Whether any marker occurs anywhere in this tree.
    pub fn contains_marker(&self) -> bool {
        match self {
            Value::Marker(_) => true,
            Value::List(items) => items.iter().any(Value::contains_marker),
            Value::Map(map) => map.values().any(Value::contains_marker),
            _ => false,
        }
    }
}

impl From<serde_json::Value> for Value {
    fn from(json: serde_json::Value) -> Self {
        match json {
            serde_json::Value::Null => Value::Null,
            serde_json::Value::Bool(b) => Value::Bool(b),
            serde_json::Value::Number(n) => Value::Number(n),
            serde_json::Value::String(s) => Value::String(s),
            serde_json::Value::Array(items) => {
                Value::List(items.into_iter().map(Value::from).collect())
            }
            serde_json::Value::Object(map) => Value::Map(
                map.into_iter()
                    .map(|(k, v)| (k, Value::from(v)))
                    .collect(),
            ),
        }
    }
}

/// Plain conversion for visible output. Markers become their wire tokens; a
/// fully resolved snapshot never contains any.
impl From<Value> for serde_json::Value {
    fn from(value: Value) -> Self {
        match value {
            Value::Null => serde_json::Value::Null,
            Value::Bool(b) => serde_json::Value::Bool(b),
            Value::Number(n) => serde_json::Value::Number(n),
            Value::String(s) => serde_json::Value::String(s),
            Value::List(items) => {
                serde_json::Value::Array(items.into_iter().map(Into::into).collect())
            }
            Value::Map(map) => serde_json::Value::Object(
                map.into_iter().map(|(k, v)| (k, v.into())).collect(),
            ),
            Value::Marker(m) => serde_json::Value::String(m.token().to_string()),
        }
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::String(s)
    }
}

impl From<u64> for Value {
    fn from(n: u64) -> Self {
        Value::Number(n.into())
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

/// One timestamped scoreboard snapshot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Entry {
    /// Opaque, non-decreasing timestamp. Never diffed.
    pub t: Value,
    pub data: Value,
}

impl Entry {
    pub fn new(t: impl Into<Value>, data: Value) -> Self {
        Self { t: t.into(), data }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn map_equality_ignores_order() {
        let a = Value::from(json!({"a": 1, "b": [1, 2]}));
        let b = Value::from(json!({"b": [1, 2], "a": 1}));
        assert_eq!(a, b);
        assert!(!a.identical(&b));
        assert!(a.identical(&a.clone()));
    }

    #[test]
    fn serialization_preserves_key_order() {
        let raw = r#"{"z":1,"a":{"y":null,"b":"x"},"m":[1.5,true]}"#;
        let value: Value = serde_json::from_str(raw).unwrap();
        assert_eq!(serde_json::to_string(&value).unwrap(), raw);
    }

    #[test]
    fn integer_and_float_stay_distinct() {
        let int: Value = serde_json::from_str("1").unwrap();
        let float: Value = serde_json::from_str("1.0").unwrap();
        assert_ne!(int, float);
        assert_eq!(serde_json::to_string(&float).unwrap(), "1.0");
    }

    #[test]
    fn path_lookup() {
        let v = Value::from(json!({"swimming": {"RunningTime": " 1:00.0 "}}));
        assert_eq!(
            v.get_path(&["swimming", "RunningTime"]).and_then(Value::as_str),
            Some(" 1:00.0 ")
        );
        assert!(v.get_path(&["swimming", "missing"]).is_none());
        assert!(v.get_path(&["swimming", "RunningTime", "deeper"]).is_none());
    }
}
