//! In-memory store and unit of work

use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use dashmap::DashMap;
use once_cell::sync::OnceCell;
use tokio::sync::RwLock;
use tracing::{debug, trace, warn};

use crate::entity::Entity;
use crate::metadata::{Record, Value};
use crate::query::{CacheHints, CriteriaQuery, Projection};
use crate::repository::{
    NamedQuery, Pagination, RepositoryError, RepositoryOperation, RepositoryResult, UnitOfWork,
};

use super::eval;

type NamedFilter<E> = Arc<dyn Fn(&E, &BTreeMap<String, Value>) -> bool + Send + Sync>;
type IdGenerator<Id> = Arc<dyn Fn(u64) -> Id + Send + Sync>;

struct StoreInner<E: Entity> {
    rows: RwLock<Vec<E>>,
    named: DashMap<String, NamedFilter<E>>,
    id_generator: OnceCell<IdGenerator<E::Id>>,
    sequence: AtomicU64,
}

/// Shared in-memory storage for one entity type
///
/// Rows keep insertion order, which is the result order of queries without
/// ordering clauses. Cloning the store shares the rows.
///
/// ```rust,ignore
/// let store = InMemoryStore::<Customer>::new().with_id_generator(|seq| seq as i64);
/// store.register_named_query("Customer.active", |c, _| c.active == Some(true));
///
/// let mut session = store.session();
/// ```
pub struct InMemoryStore<E: Entity> {
    inner: Arc<StoreInner<E>>,
}

impl<E: Entity> Clone for InMemoryStore<E> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<E: Entity> Default for InMemoryStore<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E: Entity> InMemoryStore<E> {
    #[must_use]
    pub fn new() -> Self {
        Self {
            inner: Arc::new(StoreInner {
                rows: RwLock::new(Vec::new()),
                named: DashMap::new(),
                id_generator: OnceCell::new(),
                sequence: AtomicU64::new(1),
            }),
        }
    }

    /// Generate identifiers for entities persisted without one
    ///
    /// The generator receives a sequence number starting at 1. Rows and named
    /// queries already registered are kept, and clones of the store see the
    /// generator. Only the first generator is installed; later ones are
    /// ignored with a warning.
    #[must_use]
    pub fn with_id_generator<F>(self, generator: F) -> Self
    where
        F: Fn(u64) -> E::Id + Send + Sync + 'static,
    {
        if self.inner.id_generator.set(Arc::new(generator)).is_err() {
            warn!(
                entity = E::managed_type().name(),
                "Identifier generator already configured, keeping the first one"
            );
        }
        self
    }

    /// Register a named query as a filter over rows and named parameters
    pub fn register_named_query<F>(&self, name: impl Into<String>, filter: F)
    where
        F: Fn(&E, &BTreeMap<String, Value>) -> bool + Send + Sync + 'static,
    {
        self.inner.named.insert(name.into(), Arc::new(filter));
    }

    /// Insert a row outside any unit of work
    ///
    /// # Errors
    ///
    /// Fails when the identifier is taken, or unset with no generator
    /// configured.
    pub async fn insert(&self, entity: E) -> RepositoryResult<E> {
        let mut rows = self.inner.rows.write().await;
        self.insert_row(&mut rows, entity)
    }

    /// Snapshot of all rows in insertion order
    pub async fn rows(&self) -> Vec<E> {
        self.inner.rows.read().await.clone()
    }

    pub async fn len(&self) -> usize {
        self.inner.rows.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.inner.rows.read().await.is_empty()
    }

    /// Open a unit of work over this store
    #[must_use]
    pub fn session(&self) -> InMemorySession<E> {
        InMemorySession {
            store: self.clone(),
            tracked: HashMap::new(),
            executed: Vec::new(),
        }
    }

    fn insert_row(&self, rows: &mut Vec<E>, mut entity: E) -> RepositoryResult<E> {
        if !entity.is_id_set() {
            let generator = self.inner.id_generator.get().ok_or_else(|| {
                RepositoryError::engine_failure(
                    RepositoryOperation::Save,
                    "entity has no identifier and no generator is configured",
                )
            })?;
            let seq = self.inner.sequence.fetch_add(1, Ordering::Relaxed);
            entity.set_id(generator(seq));
        }

        if rows.iter().any(|row| row.id() == entity.id()) {
            let id = entity.id().map(ToString::to_string).unwrap_or_default();
            return Err(RepositoryError::engine_failure(
                RepositoryOperation::Save,
                "identifier already in use",
            )
            .with_entity(E::managed_type().name(), id));
        }

        rows.push(entity.clone());
        Ok(entity)
    }

    fn named_filter(&self, name: &str, operation: RepositoryOperation) -> RepositoryResult<NamedFilter<E>> {
        self.inner
            .named
            .get(name)
            .map(|entry| Arc::clone(entry.value()))
            .ok_or_else(|| {
                RepositoryError::engine_failure(operation, format!("unknown named query `{name}`"))
            })
    }
}

/// Query executed by a session, recorded for inspection
#[derive(Debug, Clone, PartialEq)]
pub struct ExecutedQuery {
    /// Rendered criteria query, or `NAMED <name>` for named queries
    pub statement: String,
    pub pagination: Pagination,
    pub cache: Option<CacheHints>,
}

/// Unit of work over an [`InMemoryStore`]
///
/// Keeps an identity map of tracked instances. Inserts, merges and removals
/// write through to the store; changes made to tracked instances through
/// [`tracked_mut`](Self::tracked_mut) reach the store on [`commit`](Self::commit).
pub struct InMemorySession<E: Entity> {
    store: InMemoryStore<E>,
    tracked: HashMap<E::Id, E>,
    executed: Vec<ExecutedQuery>,
}

impl<E: Entity> InMemorySession<E> {
    /// Queries executed so far, oldest first
    #[must_use]
    pub fn executed(&self) -> &[ExecutedQuery] {
        &self.executed
    }

    #[must_use]
    pub fn tracked(&self, id: &E::Id) -> Option<&E> {
        self.tracked.get(id)
    }

    /// Tracked instance for in-place changes flushed by [`commit`](Self::commit)
    pub fn tracked_mut(&mut self, id: &E::Id) -> Option<&mut E> {
        self.tracked.get_mut(id)
    }

    /// Stop tracking an instance
    pub fn detach(&mut self, id: &E::Id) -> Option<E> {
        self.tracked.remove(id)
    }

    /// Write the state of every tracked instance back to the store
    pub async fn commit(&mut self) -> RepositoryResult<()> {
        let mut rows = self.store.inner.rows.write().await;
        for row in rows.iter_mut() {
            if let Some(tracked) = row.id().and_then(|id| self.tracked.get(id)) {
                *row = tracked.clone();
            }
        }
        debug!(
            entity = E::managed_type().name(),
            tracked = self.tracked.len(),
            "Session committed"
        );
        Ok(())
    }

    fn track(&mut self, entity: &E) -> E {
        match entity.id() {
            Some(id) => self
                .tracked
                .entry(id.clone())
                .or_insert_with(|| entity.clone())
                .clone(),
            None => entity.clone(),
        }
    }

    fn snapshot(entity: &E, operation: RepositoryOperation) -> RepositoryResult<Record> {
        E::managed_type().snapshot(entity).map_err(|e| {
            RepositoryError::accessor_failure(E::managed_type().name(), &e).with_operation(operation)
        })
    }

    async fn stored(&self, id: &E::Id) -> Option<E> {
        let rows = self.store.inner.rows.read().await;
        rows.iter().find(|row| row.id() == Some(id)).cloned()
    }

    /// Rows matching the query's predicate, ordered but not paginated
    async fn select(&self, query: &CriteriaQuery) -> RepositoryResult<Vec<E>> {
        let operation = match query.projection() {
            Projection::Entities => RepositoryOperation::Find,
            Projection::Count => RepositoryOperation::FindCount,
        };
        let rows = self.store.inner.rows.read().await;

        let mut selected = Vec::new();
        for row in rows.iter() {
            let record = Self::snapshot(row, operation)?;
            if query.predicate().map_or(true, |p| eval::matches(p, &record)) {
                selected.push((record, row.clone()));
            }
        }
        if !query.orders().is_empty() {
            selected.sort_by(|(a, _), (b, _)| eval::compare(a, b, query.orders()));
        }
        Ok(selected.into_iter().map(|(_, row)| row).collect())
    }

    fn log(&mut self, statement: String, pagination: Pagination, cache: Option<CacheHints>) {
        trace!(statement = %statement, "Executed query");
        self.executed.push(ExecutedQuery {
            statement,
            pagination,
            cache,
        });
    }
}

fn paginate<E>(rows: Vec<E>, pagination: &Pagination) -> Vec<E> {
    let skip = usize::try_from(pagination.first_result).unwrap_or(usize::MAX);
    let take = pagination
        .max_results
        .map_or(usize::MAX, |max| usize::try_from(max).unwrap_or(usize::MAX));
    rows.into_iter().skip(skip).take(take).collect()
}

fn count_of(len: usize) -> Option<u64> {
    u64::try_from(len).ok()
}

impl<E: Entity> UnitOfWork<E> for InMemorySession<E> {
    async fn find(&mut self, id: &E::Id) -> RepositoryResult<Option<E>> {
        if let Some(tracked) = self.tracked.get(id) {
            return Ok(Some(tracked.clone()));
        }
        Ok(self.stored(id).await.map(|row| self.track(&row)))
    }

    async fn get_reference(&mut self, id: &E::Id) -> RepositoryResult<Option<E>> {
        self.find(id).await
    }

    fn contains(&self, entity: &E) -> bool {
        entity.id().is_some_and(|id| self.tracked.contains_key(id))
    }

    async fn persist(&mut self, entity: E) -> RepositoryResult<E> {
        let inserted = {
            let mut rows = self.store.inner.rows.write().await;
            self.store.insert_row(&mut rows, entity)?
        };
        if let Some(id) = inserted.id() {
            self.tracked.insert(id.clone(), inserted.clone());
        }
        Ok(inserted)
    }

    async fn merge(&mut self, entity: E) -> RepositoryResult<E> {
        let Some(id) = entity.id().cloned() else {
            return self.persist(entity).await;
        };

        {
            let mut rows = self.store.inner.rows.write().await;
            match rows.iter_mut().find(|row| row.id() == Some(&id)) {
                Some(row) => *row = entity.clone(),
                None => rows.push(entity.clone()),
            }
        }
        self.tracked.insert(id, entity.clone());
        Ok(entity)
    }

    async fn remove(&mut self, entity: &E) -> RepositoryResult<()> {
        let id = entity.id().ok_or_else(|| {
            RepositoryError::engine_failure(
                RepositoryOperation::Delete,
                "cannot remove an entity without identifier",
            )
        })?;

        self.store
            .inner
            .rows
            .write()
            .await
            .retain(|row| row.id() != Some(id));
        self.tracked.remove(id);
        Ok(())
    }

    async fn refresh(&mut self, entity: &mut E) -> RepositoryResult<()> {
        let Some(id) = entity.id().cloned() else {
            return Err(RepositoryError::engine_failure(
                RepositoryOperation::Refresh,
                "cannot refresh an entity without identifier",
            ));
        };

        let stored = self.stored(&id).await.ok_or_else(|| {
            RepositoryError::engine_failure(RepositoryOperation::Refresh, "entity no longer exists")
                .with_entity(E::managed_type().name(), id.to_string())
        })?;
        self.tracked.insert(id, stored.clone());
        *entity = stored;
        Ok(())
    }

    async fn fetch(&mut self, query: &CriteriaQuery) -> RepositoryResult<Vec<E>> {
        let rows = paginate(self.select(query).await?, query.pagination());
        self.log(
            query.to_string(),
            *query.pagination(),
            query.cache_hints().cloned(),
        );
        Ok(rows.iter().map(|row| self.track(row)).collect())
    }

    async fn count(&mut self, query: &CriteriaQuery) -> RepositoryResult<Option<u64>> {
        let rows = self.select(query).await?;
        self.log(query.to_string(), Pagination::default(), query.cache_hints().cloned());
        Ok(count_of(rows.len()))
    }

    async fn fetch_named(
        &mut self,
        query: &NamedQuery,
        pagination: &Pagination,
        cache: Option<&CacheHints>,
    ) -> RepositoryResult<Vec<E>> {
        let filter = self.store.named_filter(&query.name, RepositoryOperation::Find)?;
        let matched: Vec<E> = {
            let rows = self.store.inner.rows.read().await;
            rows.iter()
                .filter(|row| filter(row, &query.parameters))
                .cloned()
                .collect()
        };

        let rows = paginate(matched, pagination);
        self.log(format!("NAMED {}", query.name), *pagination, cache.cloned());
        Ok(rows.iter().map(|row| self.track(row)).collect())
    }

    async fn count_named(
        &mut self,
        query: &NamedQuery,
        cache: Option<&CacheHints>,
    ) -> RepositoryResult<Option<u64>> {
        let filter = self
            .store
            .named_filter(&query.name, RepositoryOperation::FindCount)?;
        let count = {
            let rows = self.store.inner.rows.read().await;
            rows.iter()
                .filter(|row| filter(row, &query.parameters))
                .count()
        };

        self.log(format!("NAMED {}", query.name), Pagination::default(), cache.cloned());
        Ok(count_of(count))
    }
}
