//! Predicate tree handed to execution engines
//!
//! A predicate is a positive conjunction of leaf comparisons. There is no
//! disjunction and no negation.
//!
//! # Example
//!
//! ```rust
//! use persistence_core::query::{Predicate, TextOperator};
//!
//! let predicate = Predicate::and([
//!     Predicate::text("name", TextOperator::Like, "%Al%", true),
//!     Predicate::member_of("tags", vec!["vip".into()]),
//! ])
//! .unwrap();
//!
//! assert_eq!(predicate.to_string(), "name LIKE '%Al%' AND tags IN ('vip')");
//! ```

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::metadata::{AttributePath, Value};

/// Comparison applied by a string predicate
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TextOperator {
    /// Whole-value comparison (=)
    Equal,
    /// Pattern matching with `%` and `_` wildcards (LIKE)
    Like,
}

impl fmt::Display for TextOperator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Equal => write!(f, "="),
            Self::Like => write!(f, "LIKE"),
        }
    }
}

/// A node of the predicate tree
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Predicate {
    /// Attribute equals the value
    Equal { path: AttributePath, value: Value },
    /// String comparison
    ///
    /// When `case_sensitive` is false, `value` is already lower-cased and the
    /// engine must lower-case the attribute before comparing.
    Text {
        path: AttributePath,
        operator: TextOperator,
        value: String,
        case_sensitive: bool,
    },
    /// Join on a list attribute: at least one element is among `values`
    MemberOf {
        path: AttributePath,
        values: Vec<Value>,
    },
    /// Every child holds
    And(Vec<Predicate>),
}

impl Predicate {
    pub fn equal(path: impl Into<AttributePath>, value: impl Into<Value>) -> Self {
        Self::Equal {
            path: path.into(),
            value: value.into(),
        }
    }

    pub fn text(
        path: impl Into<AttributePath>,
        operator: TextOperator,
        value: impl Into<String>,
        case_sensitive: bool,
    ) -> Self {
        let value = value.into();
        Self::Text {
            path: path.into(),
            operator,
            value: if case_sensitive {
                value
            } else {
                value.to_lowercase()
            },
            case_sensitive,
        }
    }

    pub fn member_of(path: impl Into<AttributePath>, values: Vec<Value>) -> Self {
        Self::MemberOf {
            path: path.into(),
            values,
        }
    }

    /// Conjunction of the given predicates
    ///
    /// Nested conjunctions are flattened. Returns `None` when there is nothing
    /// to conjoin and the sole predicate when there is only one.
    pub fn and(predicates: impl IntoIterator<Item = Predicate>) -> Option<Self> {
        let mut leaves = Vec::new();
        for predicate in predicates {
            match predicate {
                Self::And(children) => leaves.extend(children),
                leaf => leaves.push(leaf),
            }
        }
        match leaves.len() {
            0 => None,
            1 => leaves.pop(),
            _ => Some(Self::And(leaves)),
        }
    }

    /// Leaf comparisons in evaluation order
    #[must_use]
    pub fn leaves(&self) -> Vec<&Predicate> {
        match self {
            Self::And(children) => children.iter().flat_map(Predicate::leaves).collect(),
            leaf => vec![leaf],
        }
    }

    /// Attribute path of a leaf; `None` for conjunctions
    #[must_use]
    pub fn path(&self) -> Option<&AttributePath> {
        match self {
            Self::Equal { path, .. } | Self::Text { path, .. } | Self::MemberOf { path, .. } => {
                Some(path)
            }
            Self::And(_) => None,
        }
    }
}

impl fmt::Display for Predicate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Equal { path, value } => write!(f, "{path} = {value}"),
            Self::Text {
                path,
                operator,
                value,
                case_sensitive,
            } => {
                let value = Value::Text(value.clone());
                if *case_sensitive {
                    write!(f, "{path} {operator} {value}")
                } else {
                    write!(f, "lower({path}) {operator} {value}")
                }
            }
            Self::MemberOf { path, values } => {
                write!(f, "{path} IN {}", Value::List(values.clone()))
            }
            Self::And(children) => {
                for (idx, child) in children.iter().enumerate() {
                    if idx > 0 {
                        write!(f, " AND ")?;
                    }
                    write!(f, "{child}")?;
                }
                Ok(())
            }
        }
    }
}
