//! Predicate construction and composed queries
//!
//! - [`Predicate`]: positive conjunction of leaf comparisons
//! - [`ExampleMatcher`]: builds predicates from example instances
//! - [`CriteriaQuery`]: predicate plus ordering, pagination and cache hints

mod criteria;
mod matcher;
mod predicate;

pub use criteria::{CacheHints, CriteriaQuery, Projection};
pub use matcher::ExampleMatcher;
pub use predicate::{Predicate, TextOperator};
