//! Repository abstractions and the generic implementation
//!
//! - [`Repository`]: lifecycle (get, save, merge, delete, refresh) and search
//!   (find, count, unique) operations for one entity type
//! - [`UnitOfWork`]: the execution engine a repository runs against
//! - [`GenericRepository`]: the query-by-example implementation
//! - [`SearchParameters`]: pagination, ordering, cache hints, string matching
//!
//! # Example
//!
//! ```rust,ignore
//! use persistence_core::prelude::*;
//!
//! let repository = GenericRepository::<Customer>::new();
//! let mut session = store.session();
//!
//! let search = SearchParameters::default()
//!     .with_search_mode(SearchMode::Anywhere)
//!     .with_order(OrderBy::asc("name"));
//! let customers = repository
//!     .find(&mut session, Some(&Customer::named("Al")), &search)
//!     .await?;
//! ```

mod error;
mod generic;
mod search;
mod traits;

pub use error::{RepositoryError, RepositoryErrorKind, RepositoryOperation};
pub use generic::GenericRepository;
pub use search::{NamedQuery, OrderBy, OrderDirection, Pagination, SearchMode, SearchParameters};
pub use traits::{NoHooks, Repository, RepositoryHooks, RepositoryResult, SaveOutcome, UnitOfWork};
