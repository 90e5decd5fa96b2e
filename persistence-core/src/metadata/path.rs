//! Attribute paths and flattened instance snapshots

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use super::value::Value;

/// Dotted path from a query root to an attribute
///
/// The root path is empty. Attributes of an entity sit directly below it
/// (`name`), attributes of an embedded value sit below the embedding
/// attribute (`address.city`).
#[derive(Debug, Clone, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AttributePath(String);

impl AttributePath {
    /// The query root
    #[must_use]
    pub const fn root() -> Self {
        Self(String::new())
    }

    #[must_use]
    pub fn is_root(&self) -> bool {
        self.0.is_empty()
    }

    /// Path of the named attribute below this one
    #[must_use]
    pub fn child(&self, name: &str) -> Self {
        if self.is_root() {
            Self(name.to_string())
        } else {
            Self(format!("{}.{name}", self.0))
        }
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for AttributePath {
    fn from(path: &str) -> Self {
        Self(path.to_string())
    }
}

impl fmt::Display for AttributePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Flattened view of an instance: every readable attribute keyed by its path
///
/// Embedded values contribute one entry per embedded attribute. Paths that are
/// absent read as [`Value::Null`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Record {
    values: BTreeMap<AttributePath, Value>,
}

impl Record {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, path: AttributePath, value: Value) {
        self.values.insert(path, value);
    }

    #[must_use]
    pub fn get(&self, path: &AttributePath) -> &Value {
        const NULL: &Value = &Value::Null;
        self.values.get(path).unwrap_or(NULL)
    }

    pub fn paths(&self) -> impl Iterator<Item = &AttributePath> {
        self.values.keys()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}
