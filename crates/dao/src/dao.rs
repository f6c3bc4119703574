//! DAO facade over a statement executor and the named-query registry.

use std::sync::Arc;

use named_query::{QueryRegistry, RegistryError};

use crate::{
    PageRequest, PageResult, ParameterSource, Result,
    executor::{
        FirstRowExtractor, ResultExtractor, RowMapper, StatementExecutor, StatementExecutorExt,
    },
    pagination::PageFetcher,
    params::{ToParameters, batch_parameters},
};

/// Executes statements and resolves named SQL for any entity type.
///
/// The registry is optional: when named-query files are disabled,
/// [`BaseDao::get_sql`] fails with [`RegistryError::Disabled`].
#[derive(Clone)]
pub struct BaseDao<E> {
    executor: E,
    registry: Option<Arc<QueryRegistry>>,
}

impl<E: StatementExecutor> BaseDao<E> {
    /// Creates a DAO without named-query support.
    pub fn new(executor: E) -> Self {
        Self {
            executor,
            registry: None,
        }
    }

    /// Attaches a loaded registry.
    pub fn with_registry(mut self, registry: Arc<QueryRegistry>) -> Self {
        self.registry = Some(registry);
        self
    }

    pub fn executor(&self) -> &E {
        &self.executor
    }

    /// Looks up the SQL text registered as `name` in `file`.
    pub fn get_sql(&self, file: &str, name: &str) -> Result<&str> {
        let registry = self.registry.as_deref().ok_or(RegistryError::Disabled)?;
        Ok(registry.get(file, name)?)
    }

    /// Fetches exactly one row and maps it.
    pub async fn query_for_object<T: Send>(
        &self,
        sql: &str,
        params: &ParameterSource,
        mapper: &dyn RowMapper<E::Row, T>,
    ) -> Result<T> {
        self.executor.query_for_object(sql, params, mapper).await
    }

    /// Fetches and maps every row.
    pub async fn query_for_list<T: Send>(
        &self,
        sql: &str,
        params: &ParameterSource,
        mapper: &dyn RowMapper<E::Row, T>,
    ) -> Result<Vec<T>> {
        self.executor.query_for_list(sql, params, mapper).await
    }

    /// Runs `sql` and folds every row through `extractor`.
    pub async fn query_with<T: Send>(
        &self,
        sql: &str,
        params: &ParameterSource,
        extractor: &dyn ResultExtractor<E::Row, T>,
    ) -> Result<T> {
        self.executor.query_with(sql, params, extractor).await
    }

    /// Fetches one page of `sql` through the pagination engine.
    pub async fn query_for_page<T: Send>(
        &self,
        sql: &str,
        params: &ParameterSource,
        request: PageRequest,
        mapper: &dyn RowMapper<E::Row, T>,
    ) -> Result<PageResult<T>> {
        PageFetcher::new(&self.executor, sql)?
            .parameters(params.clone())
            .page_request(request)
            .row_mapper(mapper)
            .fetch()
            .await
    }

    /// Runs an insert and returns the affected row count.
    pub async fn insert(&self, sql: &str, params: &ParameterSource) -> Result<u64> {
        self.update(sql, params).await
    }

    /// Runs an insert and returns the generated `key_column` value.
    pub async fn insert_returning_key(
        &self,
        sql: &str,
        params: &ParameterSource,
        key_column: &str,
    ) -> Result<i64> {
        self.executor
            .insert_returning_key(sql, params, key_column)
            .await
    }

    /// Runs an update or delete and returns the affected row count.
    pub async fn update(&self, sql: &str, params: &ParameterSource) -> Result<u64> {
        self.executor.update(sql, params).await
    }

    /// Runs `sql` once per parameter source; counts are returned in order.
    pub async fn batch_update(&self, sql: &str, batch: &[ParameterSource]) -> Result<Vec<u64>> {
        self.executor.batch_update(sql, batch).await
    }
}

/// A [`BaseDao`] bound to one entity type, its row mapper and its result
/// extractor.
///
/// Operations accept either explicit parameters or an entity, which is
/// turned into parameters through [`ToParameters`]. Unless replaced with
/// [`EntityDao::with_extractor`], the extractor is a [`FirstRowExtractor`]
/// over the row mapper.
pub struct EntityDao<E: StatementExecutor, T> {
    base: BaseDao<E>,
    mapper: Arc<dyn RowMapper<E::Row, T>>,
    extractor: Arc<dyn ResultExtractor<E::Row, T>>,
}

impl<E, T> Clone for EntityDao<E, T>
where
    E: StatementExecutor + Clone,
{
    fn clone(&self) -> Self {
        Self {
            base: self.base.clone(),
            mapper: self.mapper.clone(),
            extractor: self.extractor.clone(),
        }
    }
}

impl<E, T> EntityDao<E, T>
where
    E: StatementExecutor,
    T: ToParameters + Send + 'static,
{
    /// Binds `base` to an explicit row mapper.
    pub fn new(base: BaseDao<E>, mapper: impl RowMapper<E::Row, T> + 'static) -> Self {
        let mapper: Arc<dyn RowMapper<E::Row, T>> = Arc::new(mapper);
        Self {
            base,
            extractor: Arc::new(FirstRowExtractor::new(mapper.clone())),
            mapper,
        }
    }

    /// Replaces the default first-row extractor used by [`EntityDao::query`].
    pub fn with_extractor(mut self, extractor: impl ResultExtractor<E::Row, T> + 'static) -> Self {
        self.extractor = Arc::new(extractor);
        self
    }

    pub fn base(&self) -> &BaseDao<E> {
        &self.base
    }

    /// See [`BaseDao::get_sql`].
    pub fn get_sql(&self, file: &str, name: &str) -> Result<&str> {
        self.base.get_sql(file, name)
    }

    /// Runs `sql` and builds one entity from the whole result set.
    pub async fn query(&self, sql: &str, params: &ParameterSource) -> Result<T> {
        self.base
            .query_with(sql, params, self.extractor.as_ref())
            .await
    }

    /// Extractor query parameterized by `entity`.
    pub async fn query_by(&self, sql: &str, entity: &T) -> Result<T> {
        self.query(sql, &entity.to_parameters()).await
    }

    pub async fn query_for_object(&self, sql: &str, params: &ParameterSource) -> Result<T> {
        self.base
            .query_for_object(sql, params, self.mapper.as_ref())
            .await
    }

    /// Single-row query parameterized by `entity`.
    pub async fn query_for_object_by(&self, sql: &str, entity: &T) -> Result<T> {
        self.query_for_object(sql, &entity.to_parameters()).await
    }

    pub async fn query_for_list(&self, sql: &str, params: &ParameterSource) -> Result<Vec<T>> {
        self.base
            .query_for_list(sql, params, self.mapper.as_ref())
            .await
    }

    /// List query parameterized by `entity`.
    pub async fn query_for_list_by(&self, sql: &str, entity: &T) -> Result<Vec<T>> {
        self.query_for_list(sql, &entity.to_parameters()).await
    }

    pub async fn query_for_page(
        &self,
        sql: &str,
        params: &ParameterSource,
        request: PageRequest,
    ) -> Result<PageResult<T>> {
        self.base
            .query_for_page(sql, params, request, self.mapper.as_ref())
            .await
    }

    /// Page query parameterized by `entity`.
    pub async fn query_for_page_by(
        &self,
        sql: &str,
        entity: &T,
        request: PageRequest,
    ) -> Result<PageResult<T>> {
        self.query_for_page(sql, &entity.to_parameters(), request)
            .await
    }

    pub async fn insert(&self, sql: &str, entity: &T) -> Result<u64> {
        self.base.insert(sql, &entity.to_parameters()).await
    }

    pub async fn insert_returning_key(
        &self,
        sql: &str,
        entity: &T,
        key_column: &str,
    ) -> Result<i64> {
        self.base
            .insert_returning_key(sql, &entity.to_parameters(), key_column)
            .await
    }

    pub async fn update(&self, sql: &str, entity: &T) -> Result<u64> {
        self.base.update(sql, &entity.to_parameters()).await
    }

    pub async fn update_with(&self, sql: &str, params: &ParameterSource) -> Result<u64> {
        self.base.update(sql, params).await
    }

    pub async fn batch_update(&self, sql: &str, entities: &[T]) -> Result<Vec<u64>> {
        self.base
            .batch_update(sql, &batch_parameters(entities))
            .await
    }
}
