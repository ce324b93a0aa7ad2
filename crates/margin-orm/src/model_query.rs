//! A query bound to a model type, with registered eager-loading relations.

use std::fmt;

use tracing::debug;

use margin_sql_core::{Builder, Collection, Connection, Query, QueryBuilder, Row, SqlValue, ToSqlValue};

use crate::error::Result;
use crate::model::Model;

/// A relation callback: receives every fetched parent, returns them with the
/// relation attached.
pub type RelationLoader<'c, M> =
    Box<dyn Fn(&dyn Connection, Collection<M>) -> Result<Collection<M>> + 'c>;

/// A query that hydrates rows into `M` and runs eager-loading relations.
///
/// Relations run after hydration, once per `get`, in registration order.
/// Each sees the collection as left by the previous one.
pub struct ModelQuery<'c, M: Model> {
    conn: &'c dyn Connection,
    query: Query,
    relations: Vec<(String, RelationLoader<'c, M>)>,
}

impl<'c, M: Model> ModelQuery<'c, M> {
    /// Starts a query over `M::TABLE`, honouring its soft-delete column.
    #[must_use]
    pub fn new(conn: &'c dyn Connection) -> Self {
        let mut query = Query::new().from(M::TABLE);
        if let Some(column) = M::SOFT_DELETE {
            query = query.soft_deletes(column);
        }
        Self {
            conn,
            query,
            relations: Vec::new(),
        }
    }

    /// Returns the connection this query runs on.
    #[must_use]
    pub fn connection(&self) -> &'c dyn Connection {
        self.conn
    }

    /// Registers a relation under `key`.
    ///
    /// Registering the same key again replaces the earlier callback but keeps
    /// its position.
    #[must_use]
    pub fn add_with<F>(mut self, key: &str, loader: F) -> Self
    where
        F: Fn(&dyn Connection, Collection<M>) -> Result<Collection<M>> + 'c,
    {
        let loader: RelationLoader<'c, M> = Box::new(loader);
        match self.relations.iter_mut().find(|(k, _)| k == key) {
            Some(slot) => slot.1 = loader,
            None => self.relations.push((key.to_string(), loader)),
        }
        self
    }

    /// Returns whether a relation is registered under `key`.
    #[must_use]
    pub fn has_relation(&self, key: &str) -> bool {
        self.relations.iter().any(|(k, _)| k == key)
    }

    /// Compiles the SELECT statement with the connection's dialect.
    #[must_use]
    pub fn to_sql(&self) -> (String, Vec<SqlValue>) {
        self.query.to_sql_with(self.conn.dialect())
    }

    /// Runs the query, hydrates every row and loads the registered relations.
    ///
    /// # Errors
    ///
    /// Propagates driver, cast and relation errors.
    pub fn get(&self) -> Result<Collection<M>> {
        let rows = self.raw().get()?;
        let models = M::hydrate_all(rows)?;
        self.load_relations(models)
    }

    /// Runs the query with `LIMIT 1`. A missing row is `Ok(None)`.
    ///
    /// # Errors
    ///
    /// Propagates driver, cast and relation errors.
    pub fn first(&self) -> Result<Option<M>> {
        let Some(row) = self.raw().first()? else {
            return Ok(None);
        };
        let model = M::hydrate(&row)?;
        Ok(self.load_relations(Collection::from(vec![model]))?.into_first())
    }

    /// Fetches the model whose primary key is `id`.
    ///
    /// # Errors
    ///
    /// Propagates driver, cast and relation errors; not found is `Ok(None)`.
    pub fn find(self, id: impl ToSqlValue) -> Result<Option<M>> {
        self.find_by(M::PRIMARY_KEY, id)
    }

    /// Fetches the first model whose `field` equals `value`.
    ///
    /// # Errors
    ///
    /// Propagates driver, cast and relation errors; not found is `Ok(None)`.
    pub fn find_by(self, field: &str, value: impl ToSqlValue) -> Result<Option<M>> {
        let column = self.query.qualify(field);
        self.where_eq(&column, value).first()
    }

    /// Counts the matching rows. Relations are not run.
    ///
    /// # Errors
    ///
    /// Propagates driver errors.
    pub fn count(&self) -> Result<i64> {
        Ok(self.raw().count()?)
    }

    /// Inserts a row into `M::TABLE` and returns the generated id.
    ///
    /// # Errors
    ///
    /// Propagates builder and driver errors.
    pub fn insert(&self, fields: Row) -> Result<Option<i64>> {
        Ok(self.raw().insert(fields)?)
    }

    /// Updates the matching rows.
    ///
    /// # Errors
    ///
    /// Fails before sending anything when no WHERE clause was added.
    pub fn update(&self, fields: Row) -> Result<u64> {
        Ok(self.raw().update(fields)?)
    }

    /// Deletes the matching rows. Soft-deleted rows are only reached after
    /// `with_trashed` or `only_trashed`.
    ///
    /// # Errors
    ///
    /// Fails before sending anything when no WHERE clause was added.
    pub fn delete(&self) -> Result<u64> {
        Ok(self.raw().delete()?)
    }

    fn raw(&self) -> QueryBuilder<'c> {
        QueryBuilder::from_query(self.conn, self.query.clone())
    }

    fn load_relations(&self, mut models: Collection<M>) -> Result<Collection<M>> {
        for (key, loader) in &self.relations {
            if models.is_empty() {
                break;
            }
            debug!(relation = %key, parents = models.len(), table = M::TABLE, "eager load");
            models = loader(self.conn, models)?;
        }
        Ok(models)
    }
}

impl<M: Model> Builder for ModelQuery<'_, M> {
    fn query(&self) -> &Query {
        &self.query
    }

    fn query_mut(&mut self) -> &mut Query {
        &mut self.query
    }
}

impl<M: Model> fmt::Debug for ModelQuery<'_, M> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ModelQuery")
            .field("table", &M::TABLE)
            .field("query", &self.query)
            .field(
                "relations",
                &self.relations.iter().map(|(k, _)| k).collect::<Vec<_>>(),
            )
            .finish()
    }
}
