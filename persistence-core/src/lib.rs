//! # persistence-core
//!
//! Generic repository layer with query-by-example predicate construction.
//!
//! ## Features
//!
//! - **Metadata tables**: per-type attribute catalogs built once, no reflection
//! - **Query by example**: predicates from partially populated instances, with
//!   exact or pattern string matching, list membership and embedded values
//! - **Generic repository**: get, find, count, unique lookups, save, merge,
//!   delete and refresh for any entity type
//! - **Pluggable engines**: repositories run against a caller-supplied unit of
//!   work; an in-memory engine is included
//! - **Configuration**: Figment-based loading from files and environment
//!
//! ## Example
//!
//! ```rust,no_run
//! use once_cell::sync::Lazy;
//! use persistence_core::prelude::*;
//!
//! #[derive(Debug, Clone, Default)]
//! struct Customer {
//!     id: Option<i64>,
//!     name: Option<String>,
//!     tags: Option<Vec<String>>,
//! }
//!
//! static CUSTOMER: Lazy<ManagedType<Customer>> = Lazy::new(|| {
//!     ManagedType::<Customer>::builder("Customer")
//!         .basic("id", ValueType::Integer, |c: &Customer| c.id)
//!         .basic("name", ValueType::Text, |c: &Customer| c.name.clone())
//!         .list("tags", ValueType::Text, |c: &Customer| c.tags.clone())
//!         .build()
//! });
//!
//! impl Managed for Customer {
//!     fn managed_type() -> &'static ManagedType<Self> {
//!         &CUSTOMER
//!     }
//! }
//!
//! impl Entity for Customer {
//!     type Id = i64;
//!
//!     fn id(&self) -> Option<&i64> {
//!         self.id.as_ref()
//!     }
//!
//!     fn set_id(&mut self, id: i64) {
//!         self.id = Some(id);
//!     }
//! }
//!
//! #[tokio::main]
//! async fn main() -> Result<()> {
//!     let config = Config::load()?;
//!     init_tracing(&config)?;
//!
//!     let store = InMemoryStore::<Customer>::new().with_id_generator(|seq| seq as i64);
//!     let repository = GenericRepository::<Customer>::new();
//!     let mut session = store.session();
//!
//!     let alice = Customer { name: Some("Alice".into()), ..Customer::default() };
//!     repository.save(&mut session, alice).await?;
//!
//!     let search = SearchParameters::from_config(&config.search)
//!         .with_search_mode(SearchMode::Anywhere);
//!     let example = Customer { name: Some("Al".into()), ..Customer::default() };
//!     let found = repository.find(&mut session, Some(&example), &search).await?;
//!     assert_eq!(found.len(), 1);
//!
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod entity;
pub mod error;
pub mod memory;
pub mod metadata;
pub mod observability;
pub mod query;
pub mod repository;

#[cfg(test)]
mod fixtures;

pub mod prelude {
    pub use crate::config::{Config, LogFormat, LoggingConfig, SearchConfig};
    pub use crate::entity::{Entity, IdAssignment};
    pub use crate::error::{Error, Result};
    pub use crate::memory::{InMemorySession, InMemoryStore};
    pub use crate::metadata::{AttributePath, Managed, ManagedType, Value, ValueType};
    pub use crate::observability::init_tracing;
    pub use crate::query::{ExampleMatcher, Predicate};
    pub use crate::repository::{
        GenericRepository, NamedQuery, OrderBy, OrderDirection, Pagination, Repository,
        RepositoryError, RepositoryErrorKind, RepositoryHooks, RepositoryResult, SaveOutcome,
        SearchMode, SearchParameters, UnitOfWork,
    };
}
