//! Search specification for repository queries
//!
//! [`SearchParameters`] bundles everything a caller can say about a search
//! besides the example itself: a named query to delegate to, the pagination
//! window, ordering, cache hints and how strings are matched.
//!
//! # Example
//!
//! ```rust
//! use persistence_core::repository::{OrderBy, Pagination, SearchMode, SearchParameters};
//!
//! let search = SearchParameters::default()
//!     .with_search_mode(SearchMode::Anywhere)
//!     .with_case_sensitive(false)
//!     .with_order(OrderBy::asc("name"))
//!     .with_pagination(Pagination::page(2, 20));
//!
//! assert_eq!(search.pagination.first_result, 20);
//! assert!(search.search_mode.is_pattern());
//! ```

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::config::SearchConfig;
use crate::metadata::{AttributePath, Value};
use crate::query::{Predicate, TextOperator};

/// Direction for ordering results
///
/// ```rust
/// use persistence_core::repository::OrderDirection;
///
/// assert_eq!(format!("{}", OrderDirection::Ascending), "asc");
/// assert_eq!(format!("{}", OrderDirection::Descending), "desc");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderDirection {
    /// Sort in ascending order (A-Z, 0-9)
    #[default]
    Ascending,
    /// Sort in descending order (Z-A, 9-0)
    Descending,
}

impl fmt::Display for OrderDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Ascending => write!(f, "asc"),
            Self::Descending => write!(f, "desc"),
        }
    }
}

/// One ordering clause
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderBy {
    pub attribute: AttributePath,
    #[serde(default)]
    pub direction: OrderDirection,
}

impl OrderBy {
    pub fn asc(attribute: impl Into<AttributePath>) -> Self {
        Self {
            attribute: attribute.into(),
            direction: OrderDirection::Ascending,
        }
    }

    pub fn desc(attribute: impl Into<AttributePath>) -> Self {
        Self {
            attribute: attribute.into(),
            direction: OrderDirection::Descending,
        }
    }
}

impl fmt::Display for OrderBy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.attribute, self.direction)
    }
}

/// Result window: skip `first_result` rows, return at most `max_results`
///
/// The default window is unlimited.
///
/// ```rust
/// use persistence_core::repository::Pagination;
///
/// let page3 = Pagination::page(3, 20);
/// assert_eq!(page3.first_result, 40);
/// assert_eq!(page3.max_results, Some(20));
///
/// assert!(Pagination::default().is_unlimited());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Pagination {
    /// Number of results to skip
    pub first_result: u64,
    /// Maximum number of results to return; `None` means no limit
    pub max_results: Option<u64>,
}

impl Pagination {
    #[must_use]
    pub const fn new(first_result: u64, max_results: u64) -> Self {
        Self {
            first_result,
            max_results: Some(max_results),
        }
    }

    /// The first `max_results` rows
    #[must_use]
    pub const fn first(max_results: u64) -> Self {
        Self::new(0, max_results)
    }

    /// A 1-indexed page of `page_size` rows; the offset saturates at `u64::MAX`
    #[must_use]
    pub const fn page(page_number: u64, page_size: u64) -> Self {
        Self::new(page_number.saturating_sub(1).saturating_mul(page_size), page_size)
    }

    #[must_use]
    pub const fn is_unlimited(&self) -> bool {
        self.first_result == 0 && self.max_results.is_none()
    }
}

impl fmt::Display for Pagination {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.max_results {
            Some(max) => write!(f, "LIMIT {max} OFFSET {}", self.first_result),
            None => write!(f, "OFFSET {}", self.first_result),
        }
    }
}

/// How textual example values are compared
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SearchMode {
    /// Whole-value equality
    #[default]
    Equals,
    /// Value occurs anywhere (`%v%`)
    Anywhere,
    /// Value is a prefix (`v%`)
    StartingLike,
    /// Value is a suffix (`%v`)
    EndingLike,
    /// Value is a pattern with caller-supplied wildcards
    Like,
}

impl SearchMode {
    /// Whether the mode compares with LIKE rather than equality
    #[must_use]
    pub const fn is_pattern(self) -> bool {
        !matches!(self, Self::Equals)
    }

    fn operand(self, value: &str) -> String {
        match self {
            Self::Equals | Self::Like => value.to_string(),
            Self::Anywhere => format!("%{value}%"),
            Self::StartingLike => format!("{value}%"),
            Self::EndingLike => format!("%{value}"),
        }
    }
}

impl fmt::Display for SearchMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Equals => write!(f, "equals"),
            Self::Anywhere => write!(f, "anywhere"),
            Self::StartingLike => write!(f, "starting_like"),
            Self::EndingLike => write!(f, "ending_like"),
            Self::Like => write!(f, "like"),
        }
    }
}

/// Reference to a query registered with the execution engine
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NamedQuery {
    pub name: String,
    #[serde(default)]
    pub parameters: BTreeMap<String, Value>,
}

impl NamedQuery {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            parameters: BTreeMap::new(),
        }
    }

    #[must_use]
    pub fn with_parameter(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.parameters.insert(name.into(), value.into());
        self
    }
}

/// Caller-supplied options for find and count operations
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchParameters {
    /// When set, find and count delegate to this query and ignore the example
    pub named_query: Option<NamedQuery>,
    pub pagination: Pagination,
    pub orders: Vec<OrderBy>,
    pub cacheable: bool,
    /// Cache region; defaults to the entity's canonical name when cacheable
    pub cache_region: Option<String>,
    pub search_mode: SearchMode,
    pub case_sensitive: bool,
}

impl Default for SearchParameters {
    fn default() -> Self {
        Self {
            named_query: None,
            pagination: Pagination::default(),
            orders: Vec::new(),
            cacheable: false,
            cache_region: None,
            search_mode: SearchMode::Equals,
            case_sensitive: true,
        }
    }
}

impl SearchParameters {
    /// Parameters seeded from configured defaults
    #[must_use]
    pub fn from_config(config: &SearchConfig) -> Self {
        Self {
            pagination: Pagination {
                first_result: 0,
                max_results: config.max_results,
            },
            cacheable: config.cacheable,
            search_mode: config.search_mode,
            case_sensitive: config.case_sensitive,
            ..Self::default()
        }
    }

    #[must_use]
    pub fn has_named_query(&self) -> bool {
        self.named_query.is_some()
    }

    #[must_use]
    pub fn with_named_query(mut self, named_query: NamedQuery) -> Self {
        self.named_query = Some(named_query);
        self
    }

    #[must_use]
    pub fn with_pagination(mut self, pagination: Pagination) -> Self {
        self.pagination = pagination;
        self
    }

    #[must_use]
    pub fn with_first_result(mut self, first_result: u64) -> Self {
        self.pagination.first_result = first_result;
        self
    }

    #[must_use]
    pub fn with_max_results(mut self, max_results: u64) -> Self {
        self.pagination.max_results = Some(max_results);
        self
    }

    #[must_use]
    pub fn with_order(mut self, order: OrderBy) -> Self {
        self.orders.push(order);
        self
    }

    #[must_use]
    pub fn with_cacheable(mut self, cacheable: bool) -> Self {
        self.cacheable = cacheable;
        self
    }

    #[must_use]
    pub fn with_cache_region(mut self, region: impl Into<String>) -> Self {
        self.cache_region = Some(region.into());
        self
    }

    #[must_use]
    pub fn with_search_mode(mut self, search_mode: SearchMode) -> Self {
        self.search_mode = search_mode;
        self
    }

    #[must_use]
    pub fn with_case_sensitive(mut self, case_sensitive: bool) -> Self {
        self.case_sensitive = case_sensitive;
        self
    }

    /// String predicate for `value` at `path` under the current mode
    #[must_use]
    pub fn string_predicate(&self, path: AttributePath, value: &str) -> Predicate {
        let operator = if self.search_mode.is_pattern() {
            TextOperator::Like
        } else {
            TextOperator::Equal
        };
        Predicate::text(
            path,
            operator,
            self.search_mode.operand(value),
            self.case_sensitive,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pagination_page_is_one_indexed() {
        assert_eq!(Pagination::page(1, 10), Pagination::new(0, 10));
        assert_eq!(Pagination::page(0, 10), Pagination::new(0, 10));
        assert_eq!(Pagination::page(4, 25).first_result, 75);
        assert_eq!(Pagination::page(u64::MAX, 1_000).first_result, u64::MAX);
    }

    #[test]
    fn test_pagination_display() {
        assert_eq!(Pagination::new(0, 2).to_string(), "LIMIT 2 OFFSET 0");
        assert_eq!(Pagination::default().to_string(), "OFFSET 0");
    }

    #[test]
    fn test_defaults_are_exact_and_case_sensitive() {
        let search = SearchParameters::default();
        assert_eq!(search.search_mode, SearchMode::Equals);
        assert!(search.case_sensitive);
        assert!(search.pagination.is_unlimited());
        assert!(!search.has_named_query());
    }

    #[test]
    fn test_search_mode_operands() {
        let path = AttributePath::from("name");
        let cases = [
            (SearchMode::Equals, "name = 'Al'"),
            (SearchMode::Anywhere, "name LIKE '%Al%'"),
            (SearchMode::StartingLike, "name LIKE 'Al%'"),
            (SearchMode::EndingLike, "name LIKE '%Al'"),
            (SearchMode::Like, "name LIKE 'Al'"),
        ];
        for (mode, expected) in cases {
            let search = SearchParameters::default().with_search_mode(mode);
            assert_eq!(search.string_predicate(path.clone(), "Al").to_string(), expected);
        }
    }

    #[test]
    fn test_from_config() {
        let config = SearchConfig {
            search_mode: SearchMode::StartingLike,
            case_sensitive: false,
            max_results: Some(50),
            cacheable: true,
        };
        let search = SearchParameters::from_config(&config);
        assert_eq!(search.search_mode, SearchMode::StartingLike);
        assert!(!search.case_sensitive);
        assert_eq!(search.pagination, Pagination::first(50));
        assert!(search.cacheable);
        assert!(search.cache_region.is_none());
    }

    #[test]
    fn test_partial_json_fills_defaults() {
        let search: SearchParameters = serde_json::from_str(
            r#"{
                "search_mode": "anywhere",
                "pagination": { "max_results": 10 },
                "orders": [{ "attribute": "name" }, { "attribute": "age", "direction": "descending" }],
                "named_query": { "name": "Customer.byCity", "parameters": { "city": { "text": "Paris" } } }
            }"#,
        )
        .unwrap();

        assert_eq!(search.search_mode, SearchMode::Anywhere);
        assert!(search.case_sensitive);
        assert_eq!(search.pagination, Pagination::first(10));
        assert_eq!(search.orders, vec![OrderBy::asc("name"), OrderBy::desc("age")]);
        let named = search.named_query.unwrap();
        assert_eq!(named.parameters.get("city"), Some(&Value::from("Paris")));
    }
}
