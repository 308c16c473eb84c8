//! The user-facing value model.
//!
//! A read returns either a scalar string (a leaf) or a nested mapping of
//! child name to value (a directory). [`Value`] is the tagged variant for
//! both faces; the untagged serde representation means it round-trips
//! through JSON as plain strings and objects.
//!
//! # Example
//!
//! ```
//! use treewatch::Value;
//!
//! let v: Value = serde_json::from_value(serde_json::json!({
//!     "ip": "192.168.0.1",
//!     "name": "cluster-1",
//! })).unwrap();
//!
//! assert!(v.is_dir());
//! assert_eq!(v.as_dir().unwrap()["ip"].as_str(), Some("192.168.0.1"));
//! ```

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::path;

/// A scalar leaf or a nested directory mapping.
///
/// `BTreeMap` keeps child iteration in lexicographic order, so
/// materialized reads and flattened bulk writes are deterministic.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
    Leaf(String),
    Dir(BTreeMap<String, Value>),
}

impl Value {
    /// An empty directory.
    #[must_use]
    pub fn dir() -> Self {
        Value::Dir(BTreeMap::new())
    }

    #[must_use]
    pub fn is_leaf(&self) -> bool {
        matches!(self, Value::Leaf(_))
    }

    #[must_use]
    pub fn is_dir(&self) -> bool {
        matches!(self, Value::Dir(_))
    }

    /// The scalar value, if this is a leaf.
    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Leaf(s) => Some(s),
            Value::Dir(_) => None,
        }
    }

    /// The child mapping, if this is a directory.
    #[must_use]
    pub fn as_dir(&self) -> Option<&BTreeMap<String, Value>> {
        match self {
            Value::Leaf(_) => None,
            Value::Dir(map) => Some(map),
        }
    }

    /// Flatten into `(absolute path, scalar)` pairs under `base`.
    ///
    /// Directory keys are walked in sorted order; empty keys contribute
    /// nothing at any depth. Keys may carry slashes and are normalized
    /// into the path, so `{"1/ip": "x"}` under `/clusters` flattens to
    /// `/clusters/1/ip`.
    pub(crate) fn flatten_into(&self, base: &str, out: &mut Vec<(String, String)>) {
        match self {
            Value::Leaf(s) => out.push((base.to_string(), s.clone())),
            Value::Dir(map) => {
                for (key, child) in map {
                    if key.is_empty() {
                        continue;
                    }
                    child.flatten_into(&path::join(base, key), out);
                }
            }
        }
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Leaf(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Leaf(s)
    }
}

impl From<BTreeMap<String, Value>> for Value {
    fn from(map: BTreeMap<String, Value>) -> Self {
        Value::Dir(map)
    }
}

impl FromIterator<(String, Value)> for Value {
    fn from_iter<I: IntoIterator<Item = (String, Value)>>(iter: I) -> Self {
        Value::Dir(iter.into_iter().collect())
    }
}
