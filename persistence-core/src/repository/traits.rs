//! Repository trait definitions
//!
//! Traits use RPITIT (return position impl trait in traits), so async methods
//! are implemented with plain `async fn`:
//!
//! - [`UnitOfWork`]: what the repository needs from the execution engine
//! - [`Repository`]: lifecycle and search operations for one entity type
//! - [`RepositoryHooks`]: per-entity customisation points
//!
//! Every repository operation runs against a unit of work passed in by the
//! caller. The repository never opens, commits or rolls one back.

use std::future::Future;

use crate::entity::Entity;
use crate::query::{CacheHints, CriteriaQuery, Predicate};

use super::error::RepositoryError;
use super::search::{NamedQuery, Pagination, SearchParameters};

/// Result type for repository operations
pub type RepositoryResult<T> = Result<T, RepositoryError>;

/// Execution engine seen from a repository
///
/// An implementation tracks instances for the duration of a unit of work and
/// runs composed queries against persistent storage. Failures are reported
/// as `EngineFailure` errors.
pub trait UnitOfWork<E: Entity>: Send {
    /// Identifier lookup; `None` when no such entity exists
    fn find(&mut self, id: &E::Id) -> impl Future<Output = RepositoryResult<Option<E>>> + Send;

    /// Resolve a reference by identifier without requiring a full load
    fn get_reference(
        &mut self,
        id: &E::Id,
    ) -> impl Future<Output = RepositoryResult<Option<E>>> + Send;

    /// Whether the instance is tracked by this unit of work
    fn contains(&self, entity: &E) -> bool;

    /// Insert a new entity, returning it with its identifier assigned
    fn persist(&mut self, entity: E) -> impl Future<Output = RepositoryResult<E>> + Send;

    /// Copy a detached entity's state onto the tracked instance
    fn merge(&mut self, entity: E) -> impl Future<Output = RepositoryResult<E>> + Send;

    fn remove(&mut self, entity: &E) -> impl Future<Output = RepositoryResult<()>> + Send;

    /// Overwrite the instance with its stored state
    fn refresh(&mut self, entity: &mut E) -> impl Future<Output = RepositoryResult<()>> + Send;

    fn fetch(
        &mut self,
        query: &CriteriaQuery,
    ) -> impl Future<Output = RepositoryResult<Vec<E>>> + Send;

    /// Count projection; `None` when the engine produced no value
    fn count(
        &mut self,
        query: &CriteriaQuery,
    ) -> impl Future<Output = RepositoryResult<Option<u64>>> + Send;

    fn fetch_named(
        &mut self,
        query: &NamedQuery,
        pagination: &Pagination,
        cache: Option<&CacheHints>,
    ) -> impl Future<Output = RepositoryResult<Vec<E>>> + Send;

    fn count_named(
        &mut self,
        query: &NamedQuery,
        cache: Option<&CacheHints>,
    ) -> impl Future<Output = RepositoryResult<Option<u64>>> + Send;
}

/// What `save` did with an entity
#[derive(Debug, Clone, PartialEq)]
pub enum SaveOutcome<E> {
    /// The entity was inserted; it now carries its identifier
    Inserted(E),
    /// Nothing was sent to the engine; the unit of work flushes changes to
    /// the tracked instance
    Deferred(E),
}

impl<E> SaveOutcome<E> {
    #[must_use]
    pub const fn is_inserted(&self) -> bool {
        matches!(self, Self::Inserted(_))
    }

    pub fn into_inner(self) -> E {
        match self {
            Self::Inserted(entity) | Self::Deferred(entity) => entity,
        }
    }
}

/// Lifecycle and search operations for one entity type
///
/// # Example
///
/// ```rust,ignore
/// let repository = GenericRepository::<Customer>::new();
/// let mut session = store.session();
///
/// let search = SearchParameters::default().with_search_mode(SearchMode::Anywhere);
/// let found = repository
///     .find(&mut session, Some(&Customer::named("Al")), &search)
///     .await?;
/// ```
pub trait Repository<E: Entity>: Send + Sync {
    /// Look up the entity with the example's identifier
    ///
    /// Returns `None` when the identifier is unset or nothing is stored
    /// under it.
    fn get<U: UnitOfWork<E>>(
        &self,
        uow: &mut U,
        example: &E,
    ) -> impl Future<Output = RepositoryResult<Option<E>>> + Send;

    /// Discard in-memory changes of a tracked entity; untracked entities
    /// are left alone
    fn refresh<U: UnitOfWork<E>>(
        &self,
        uow: &mut U,
        entity: &mut E,
    ) -> impl Future<Output = RepositoryResult<()>> + Send;

    /// Entities matching the example, or the named query when one is set
    fn find<U: UnitOfWork<E>>(
        &self,
        uow: &mut U,
        example: Option<&E>,
        search: &SearchParameters,
    ) -> impl Future<Output = RepositoryResult<Vec<E>>> + Send;

    /// Number of entities matching the example; the example is required
    fn find_count<U: UnitOfWork<E>>(
        &self,
        uow: &mut U,
        example: Option<&E>,
        search: &SearchParameters,
    ) -> impl Future<Output = RepositoryResult<u64>> + Send;

    /// The single matching entity; fails when none or several match
    fn find_unique<U: UnitOfWork<E>>(
        &self,
        uow: &mut U,
        example: Option<&E>,
        search: &SearchParameters,
    ) -> impl Future<Output = RepositoryResult<E>> + Send;

    /// The single matching entity if any; fails when several match
    fn find_unique_or_none<U: UnitOfWork<E>>(
        &self,
        uow: &mut U,
        example: Option<&E>,
        search: &SearchParameters,
    ) -> impl Future<Output = RepositoryResult<Option<E>>> + Send;

    /// Insert new entities; updates to existing ones are left to the unit of
    /// work
    fn save<U: UnitOfWork<E>>(
        &self,
        uow: &mut U,
        entity: E,
    ) -> impl Future<Output = RepositoryResult<SaveOutcome<E>>> + Send;

    fn merge<U: UnitOfWork<E>>(
        &self,
        uow: &mut U,
        entity: E,
    ) -> impl Future<Output = RepositoryResult<E>> + Send;

    /// Remove the entity; returns false when it could not be resolved
    fn delete<U: UnitOfWork<E>>(
        &self,
        uow: &mut U,
        entity: &E,
    ) -> impl Future<Output = RepositoryResult<bool>> + Send;
}

/// Per-entity customisation of a generic repository
///
/// Both methods have defaults that add nothing.
pub trait RepositoryHooks<E: Entity>: Send + Sync {
    /// Extra predicate for entities identified by associations, conjoined
    /// with the example predicate
    fn composite_key_predicate(
        &self,
        _example: &E,
        _search: &SearchParameters,
    ) -> RepositoryResult<Option<Predicate>> {
        Ok(None)
    }

    /// Attributes a full-text index covers
    fn indexed_fields(&self) -> &[&'static str] {
        &[]
    }
}

/// Hooks that add nothing
#[derive(Debug, Clone, Copy, Default)]
pub struct NoHooks;

impl<E: Entity> RepositoryHooks<E> for NoHooks {}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::Customer;

    #[test]
    fn test_save_outcome_into_inner() {
        let inserted = SaveOutcome::Inserted(Customer::named("Alice").with_id(1));
        assert!(inserted.is_inserted());
        assert_eq!(inserted.into_inner().id, Some(1));

        let deferred = SaveOutcome::Deferred(Customer::named("Bob").with_id(2));
        assert!(!deferred.is_inserted());
    }

    #[test]
    fn test_default_hooks_add_nothing() {
        let hooks = NoHooks;
        let predicate = RepositoryHooks::<Customer>::composite_key_predicate(
            &hooks,
            &Customer::named("Alice"),
            &SearchParameters::default(),
        )
        .unwrap();
        assert!(predicate.is_none());
        assert!(RepositoryHooks::<Customer>::indexed_fields(&hooks).is_empty());
    }
}
