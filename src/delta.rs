//! Typed structural deltas.
//!
//! List positions and object keys are distinct at the type level: a
//! [`ListDelta`] is keyed by index and carries the new length, a
//! [`MapDelta`] is keyed by name. Removal only exists as [`Op::Delete`].

use std::collections::BTreeMap;

use indexmap::IndexMap;

use crate::value::Value;

#[derive(Debug, Clone, PartialEq)]
pub enum Delta {
    /// Literal replacement of whatever was there.
    Replace(Value),
    Map(MapDelta),
    List(ListDelta),
}

/// Change to a single key or index.
#[derive(Debug, Clone, PartialEq)]
pub enum Op {
    Delete,
    Set(Delta),
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct MapDelta {
    pub ops: IndexMap<String, Op>,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct ListDelta {
    /// Index operations in ascending index order.
    pub ops: BTreeMap<usize, Op>,
    /// Present only when the list length changed.
    pub new_len: Option<usize>,
}

impl MapDelta {
    pub fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }
}

impl ListDelta {
    pub fn is_empty(&self) -> bool {
        self.ops.is_empty() && self.new_len.is_none()
    }
}

impl Delta {
    /// Number of leaf operations (replacements and deletions) in this delta.
    pub fn op_count(&self) -> usize {
        fn op_count(op: &Op) -> usize {
            match op {
                Op::Delete => 1,
                Op::Set(d) => d.op_count(),
            }
        }
        match self {
            Delta::Replace(_) => 1,
            Delta::Map(m) => m.ops.values().map(op_count).sum(),
            Delta::List(l) => {
                l.ops.values().map(op_count).sum::<usize>() + usize::from(l.new_len.is_some())
            }
        }
    }
}
