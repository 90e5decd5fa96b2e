//! Composed queries handed to the execution engine
//!
//! A repository turns an example and its search parameters into a
//! [`CriteriaQuery`]: the predicate from the example matcher plus ordering,
//! the pagination window and cache hints.
//!
//! ```rust
//! use persistence_core::query::{CriteriaQuery, Predicate};
//! use persistence_core::repository::{OrderBy, Pagination};
//!
//! let query = CriteriaQuery::select("Customer")
//!     .filter(Some(Predicate::equal("age", 42_i64)))
//!     .order_by([OrderBy::asc("name")])
//!     .paginate(Pagination::first(2));
//!
//! assert_eq!(
//!     query.to_string(),
//!     "SELECT Customer WHERE age = 42 ORDER BY name asc LIMIT 2 OFFSET 0"
//! );
//! ```

use std::fmt;

use crate::repository::{OrderBy, Pagination};

use super::predicate::Predicate;

/// What a query returns
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Projection {
    /// The matching entities
    #[default]
    Entities,
    /// The number of matching entities
    Count,
}

/// Result-cache hints attached to a query
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheHints {
    pub cacheable: bool,
    pub region: String,
}

impl CacheHints {
    pub fn new(region: impl Into<String>) -> Self {
        Self {
            cacheable: true,
            region: region.into(),
        }
    }
}

/// A query over one entity type
#[derive(Debug, Clone, PartialEq)]
pub struct CriteriaQuery {
    entity: &'static str,
    projection: Projection,
    predicate: Option<Predicate>,
    orders: Vec<OrderBy>,
    pagination: Pagination,
    cache: Option<CacheHints>,
}

impl CriteriaQuery {
    /// Query returning entities
    #[must_use]
    pub fn select(entity: &'static str) -> Self {
        Self {
            entity,
            projection: Projection::Entities,
            predicate: None,
            orders: Vec::new(),
            pagination: Pagination::default(),
            cache: None,
        }
    }

    /// Query returning the number of matches
    #[must_use]
    pub fn count(entity: &'static str) -> Self {
        Self {
            projection: Projection::Count,
            ..Self::select(entity)
        }
    }

    /// Restrict to rows matching `predicate`; `None` keeps every row
    #[must_use]
    pub fn filter(mut self, predicate: Option<Predicate>) -> Self {
        self.predicate = predicate;
        self
    }

    #[must_use]
    pub fn order_by(mut self, orders: impl IntoIterator<Item = OrderBy>) -> Self {
        self.orders.extend(orders);
        self
    }

    #[must_use]
    pub fn paginate(mut self, pagination: Pagination) -> Self {
        self.pagination = pagination;
        self
    }

    #[must_use]
    pub fn cache(mut self, hints: Option<CacheHints>) -> Self {
        self.cache = hints;
        self
    }

    #[must_use]
    pub const fn entity(&self) -> &'static str {
        self.entity
    }

    #[must_use]
    pub const fn projection(&self) -> Projection {
        self.projection
    }

    #[must_use]
    pub fn predicate(&self) -> Option<&Predicate> {
        self.predicate.as_ref()
    }

    #[must_use]
    pub fn orders(&self) -> &[OrderBy] {
        &self.orders
    }

    #[must_use]
    pub const fn pagination(&self) -> &Pagination {
        &self.pagination
    }

    #[must_use]
    pub fn cache_hints(&self) -> Option<&CacheHints> {
        self.cache.as_ref()
    }
}

impl fmt::Display for CriteriaQuery {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.projection {
            Projection::Entities => write!(f, "SELECT {}", self.entity)?,
            Projection::Count => write!(f, "SELECT count({})", self.entity)?,
        }
        if let Some(predicate) = &self.predicate {
            write!(f, " WHERE {predicate}")?;
        }
        for (idx, order) in self.orders.iter().enumerate() {
            let lead = if idx == 0 { " ORDER BY " } else { ", " };
            write!(f, "{lead}{order}")?;
        }
        if !self.pagination.is_unlimited() {
            write!(f, " {}", self.pagination)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_select_defaults() {
        let query = CriteriaQuery::select("Customer");
        assert_eq!(query.projection(), Projection::Entities);
        assert!(query.predicate().is_none());
        assert!(query.pagination().is_unlimited());
        assert!(query.cache_hints().is_none());
        assert_eq!(query.to_string(), "SELECT Customer");
    }

    #[test]
    fn test_count_display() {
        let query = CriteriaQuery::count("Customer")
            .filter(Some(Predicate::member_of("tags", vec!["vip".into()])));
        assert_eq!(query.to_string(), "SELECT count(Customer) WHERE tags IN ('vip')");
    }

    #[test]
    fn test_multiple_orders() {
        let query = CriteriaQuery::select("Customer")
            .order_by([OrderBy::asc("name"), OrderBy::desc("age")])
            .paginate(Pagination::new(10, 5));
        assert_eq!(
            query.to_string(),
            "SELECT Customer ORDER BY name asc, age desc LIMIT 5 OFFSET 10"
        );
    }

    #[test]
    fn test_cache_hints() {
        let query = CriteriaQuery::select("Customer").cache(Some(CacheHints::new("customers")));
        let hints = query.cache_hints().unwrap();
        assert!(hints.cacheable);
        assert_eq!(hints.region, "customers");
    }
}
