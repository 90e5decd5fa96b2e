//! Generic repository over any [`Entity`]
//!
//! [`GenericRepository`] implements every [`Repository`] operation once, for
//! all entity types: predicates come from the [`ExampleMatcher`], entity
//! specific additions from [`RepositoryHooks`]. The repository itself only
//! holds immutable configuration and can be shared freely.

use std::marker::PhantomData;

use tracing::{debug, warn};

use crate::entity::{Entity, IdAssignment};
use crate::query::{CacheHints, CriteriaQuery, ExampleMatcher, Predicate};

use super::error::{RepositoryError, RepositoryOperation};
use super::search::{Pagination, SearchParameters};
use super::traits::{NoHooks, Repository, RepositoryHooks, RepositoryResult, SaveOutcome, UnitOfWork};

/// `find_unique_or_none` fetches at most this many rows
const UNIQUE_WINDOW: u64 = 2;

/// Repository implementation shared by all entity types
///
/// # Example
///
/// ```rust,ignore
/// let repository = GenericRepository::<Customer>::new().with_cache_region("customers");
///
/// let mut session = store.session();
/// let alice = repository
///     .find_unique(&mut session, Some(&Customer::named("Alice")), &SearchParameters::default())
///     .await?;
/// ```
#[derive(Debug, Clone)]
pub struct GenericRepository<E, H = NoHooks> {
    matcher: ExampleMatcher,
    hooks: H,
    cache_region: String,
    _entity: PhantomData<fn() -> E>,
}

impl<E: Entity> GenericRepository<E, NoHooks> {
    #[must_use]
    pub fn new() -> Self {
        Self::with_hooks(NoHooks)
    }
}

impl<E: Entity> Default for GenericRepository<E, NoHooks> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E: Entity, H: RepositoryHooks<E>> GenericRepository<E, H> {
    /// Repository with entity specific hooks
    pub fn with_hooks(hooks: H) -> Self {
        Self {
            matcher: ExampleMatcher::new(),
            hooks,
            cache_region: E::canonical_name().to_string(),
            _entity: PhantomData,
        }
    }

    /// Cache region used when a search is cacheable but names no region
    #[must_use]
    pub fn with_cache_region(mut self, region: impl Into<String>) -> Self {
        self.cache_region = region.into();
        self
    }

    #[must_use]
    pub fn cache_region(&self) -> &str {
        &self.cache_region
    }

    pub fn hooks(&self) -> &H {
        &self.hooks
    }

    /// Example predicate conjoined with the composite-key hook
    fn predicate(
        &self,
        example: Option<&E>,
        search: &SearchParameters,
    ) -> RepositoryResult<Option<Predicate>> {
        let by_example = self.matcher.match_entity(example, search)?;
        let by_key = match example {
            Some(example) => self.hooks.composite_key_predicate(example, search)?,
            None => None,
        };
        Ok(Predicate::and(by_example.into_iter().chain(by_key)))
    }

    fn cache_hints(&self, search: &SearchParameters) -> Option<CacheHints> {
        search.cacheable.then(|| {
            CacheHints::new(
                search
                    .cache_region
                    .clone()
                    .unwrap_or_else(|| self.cache_region.clone()),
            )
        })
    }

    fn entity_name() -> &'static str {
        E::managed_type().name()
    }
}

impl<E: Entity, H: RepositoryHooks<E>> Repository<E> for GenericRepository<E, H> {
    async fn get<U: UnitOfWork<E>>(&self, uow: &mut U, example: &E) -> RepositoryResult<Option<E>> {
        let Some(id) = example.id() else {
            return Ok(None);
        };

        let found = uow
            .find(id)
            .await
            .map_err(|e| e.with_operation(RepositoryOperation::Get))?;
        if found.is_none() {
            warn!(entity = Self::entity_name(), id = %id, "No entity found for identifier");
        }
        Ok(found)
    }

    async fn refresh<U: UnitOfWork<E>>(&self, uow: &mut U, entity: &mut E) -> RepositoryResult<()> {
        if !uow.contains(entity) {
            return Ok(());
        }
        uow.refresh(entity)
            .await
            .map_err(|e| e.with_operation(RepositoryOperation::Refresh))
    }

    async fn find<U: UnitOfWork<E>>(
        &self,
        uow: &mut U,
        example: Option<&E>,
        search: &SearchParameters,
    ) -> RepositoryResult<Vec<E>> {
        let cache = self.cache_hints(search);

        if let Some(named) = &search.named_query {
            debug!(entity = Self::entity_name(), query = %named.name, "Delegating to named query");
            return uow
                .fetch_named(named, &search.pagination, cache.as_ref())
                .await
                .map_err(|e| e.with_operation(RepositoryOperation::Find));
        }

        let predicate = self
            .predicate(example, search)
            .map_err(|e| e.with_operation(RepositoryOperation::Find))?;
        let query = CriteriaQuery::select(Self::entity_name())
            .filter(predicate)
            .order_by(search.orders.iter().cloned())
            .paginate(search.pagination)
            .cache(cache);

        debug!(query = %query, "Executing criteria query");
        uow.fetch(&query)
            .await
            .map_err(|e| e.with_operation(RepositoryOperation::Find))
    }

    async fn find_count<U: UnitOfWork<E>>(
        &self,
        uow: &mut U,
        example: Option<&E>,
        search: &SearchParameters,
    ) -> RepositoryResult<u64> {
        if example.is_none() {
            return Err(RepositoryError {
                entity_type: Some(Self::entity_name().to_string()),
                ..RepositoryError::invalid_argument(
                    RepositoryOperation::FindCount,
                    "an example is required to count entities",
                )
            });
        }

        let cache = self.cache_hints(search);
        let count = match &search.named_query {
            Some(named) => uow.count_named(named, cache.as_ref()).await,
            None => {
                let predicate = self
                    .predicate(example, search)
                    .map_err(|e| e.with_operation(RepositoryOperation::FindCount))?;
                let query = CriteriaQuery::count(Self::entity_name())
                    .filter(predicate)
                    .cache(cache);
                debug!(query = %query, "Executing count query");
                uow.count(&query).await
            }
        }
        .map_err(|e| e.with_operation(RepositoryOperation::FindCount))?;

        Ok(count.unwrap_or_else(|| {
            warn!(entity = Self::entity_name(), "Count query returned no value, reporting 0");
            0
        }))
    }

    async fn find_unique<U: UnitOfWork<E>>(
        &self,
        uow: &mut U,
        example: Option<&E>,
        search: &SearchParameters,
    ) -> RepositoryResult<E> {
        self.find_unique_or_none(uow, example, search)
            .await?
            .ok_or_else(|| RepositoryError::not_found(Self::entity_name()))
    }

    async fn find_unique_or_none<U: UnitOfWork<E>>(
        &self,
        uow: &mut U,
        example: Option<&E>,
        search: &SearchParameters,
    ) -> RepositoryResult<Option<E>> {
        let windowed = search
            .clone()
            .with_pagination(Pagination::new(0, UNIQUE_WINDOW));

        let mut results = self
            .find(uow, example, &windowed)
            .await
            .map_err(|e| e.with_operation(RepositoryOperation::FindUnique))?;
        match results.len() {
            0 => Ok(None),
            1 => Ok(results.pop()),
            _ => Err(RepositoryError::non_unique_result(Self::entity_name())),
        }
    }

    async fn save<U: UnitOfWork<E>>(&self, uow: &mut U, entity: E) -> RepositoryResult<SaveOutcome<E>> {
        let insert = !entity.is_id_set()
            || (E::ID_ASSIGNMENT == IdAssignment::Manual && !uow.contains(&entity));

        if !insert {
            debug!(entity = Self::entity_name(), "Update deferred to the unit of work");
            return Ok(SaveOutcome::Deferred(entity));
        }

        let inserted = uow
            .persist(entity)
            .await
            .map_err(|e| e.with_operation(RepositoryOperation::Save))?;
        debug!(entity = Self::entity_name(), id = ?inserted.id(), "Entity inserted");
        Ok(SaveOutcome::Inserted(inserted))
    }

    async fn merge<U: UnitOfWork<E>>(&self, uow: &mut U, entity: E) -> RepositoryResult<E> {
        uow.merge(entity)
            .await
            .map_err(|e| e.with_operation(RepositoryOperation::Merge))
    }

    async fn delete<U: UnitOfWork<E>>(&self, uow: &mut U, entity: &E) -> RepositoryResult<bool> {
        if uow.contains(entity) {
            uow.remove(entity)
                .await
                .map_err(|e| e.with_operation(RepositoryOperation::Delete))?;
            return Ok(true);
        }

        let Some(id) = entity.id() else {
            warn!(entity = Self::entity_name(), "Cannot delete an entity without identifier");
            return Ok(false);
        };

        let reference = uow
            .get_reference(id)
            .await
            .map_err(|e| e.with_operation(RepositoryOperation::Delete))?;
        match reference {
            Some(reference) => {
                uow.remove(&reference)
                    .await
                    .map_err(|e| e.with_operation(RepositoryOperation::Delete))?;
                Ok(true)
            }
            None => {
                warn!(entity = Self::entity_name(), id = %id, "Entity to delete could not be resolved");
                Ok(false)
            }
        }
    }
}
