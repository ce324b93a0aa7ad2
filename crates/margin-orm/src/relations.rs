//! Batched relation loaders.
//!
//! Each loader issues a fixed number of queries however many parents it is
//! given: one for has-many and belongs-to, two for a typed pivot. Keys are
//! deduplicated before they reach an `IN` list, and an empty parent
//! collection returns immediately without touching the connection.

use serde::Serialize;
use tracing::debug;

use margin_sql_core::{Builder, Collection, Connection, KeyedCollection};

use crate::error::Result;
use crate::model::Model;
use crate::model_query::ModelQuery;
use crate::pivot::Pivot;

/// A related model together with the pivot row that links it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Related<Pv, R> {
    /// The pivot row.
    pub pivot: Pv,
    /// The related model.
    pub related: R,
}

/// Attaches children whose `foreign_key` column holds the parent's key.
///
/// `scope` may narrow or order the child query; `assign` stores each
/// parent's children, an empty collection when it has none.
///
/// # Errors
///
/// Propagates errors from the child query.
pub fn load_has_many<'a, P, C, S, A>(
    conn: &'a dyn Connection,
    parents: Collection<P>,
    foreign_key: &str,
    child_foreign: impl Fn(&C) -> i64,
    scope: S,
    mut assign: A,
) -> Result<Collection<P>>
where
    P: Model,
    C: Model,
    S: FnOnce(ModelQuery<'a, C>) -> ModelQuery<'a, C>,
    A: FnMut(&mut P, Collection<C>),
{
    if parents.is_empty() {
        return Ok(parents);
    }
    let keys = parents.pluck(Model::key).unique();
    let query = C::objects(conn);
    let column = query.query().qualify(foreign_key);
    let children = scope(query.where_in(&column, keys)).get()?;
    debug!(table = C::TABLE, parents = parents.len(), children = children.len(), "has many");

    let mut grouped = children.group_by(child_foreign);
    Ok(parents.map(|mut parent| {
        let own = grouped.remove(&parent.key()).unwrap_or_default();
        assign(&mut parent, own);
        parent
    }))
}

/// Attaches the single model each parent points to through `foreign`.
///
/// Parents whose foreign key is not positive, or points at a missing row,
/// get `None`.
///
/// # Errors
///
/// Propagates errors from the related query.
pub fn load_belongs_to<'a, P, R, S, A>(
    conn: &'a dyn Connection,
    parents: Collection<P>,
    foreign: impl Fn(&P) -> i64,
    scope: S,
    mut assign: A,
) -> Result<Collection<P>>
where
    R: Model + Clone,
    S: FnOnce(ModelQuery<'a, R>) -> ModelQuery<'a, R>,
    A: FnMut(&mut P, Option<R>),
{
    if parents.is_empty() {
        return Ok(parents);
    }
    let keys = parents.pluck(&foreign).unique().filter(|k| *k > 0);
    if keys.is_empty() {
        return Ok(parents.map(|mut parent| {
            assign(&mut parent, None);
            parent
        }));
    }
    let query = R::objects(conn);
    let column = query.query().qualify(R::PRIMARY_KEY);
    let related = scope(query.where_in(&column, keys))
        .get()?
        .key_by(Model::key);
    debug!(table = R::TABLE, found = related.len(), "belongs to");

    Ok(parents.map(|mut parent| {
        let own = related.get(&foreign(&parent)).cloned();
        assign(&mut parent, own);
        parent
    }))
}

/// Attaches related models reached through pivot rows of one `kind`.
///
/// Runs one query for the pivot rows and, when there are any, one for the
/// related models. Pivot rows pointing at a related row that no longer
/// exists are dropped.
///
/// # Errors
///
/// Propagates errors from either query.
pub fn load_pivot<'a, P, Pv, R, A>(
    conn: &'a dyn Connection,
    parents: Collection<P>,
    kind: &str,
    mut assign: A,
) -> Result<Collection<P>>
where
    P: Model,
    Pv: Pivot,
    R: Model + Clone,
    A: FnMut(&mut P, Collection<Related<Pv, R>>),
{
    if parents.is_empty() {
        return Ok(parents);
    }
    let keys = parents.pluck(Model::key).unique();
    let pivots = Pv::objects(conn)
        .where_eq(Pv::TYPE_COLUMN, kind)
        .where_in(Pv::PARENT_COLUMN, keys)
        .get()?;

    let related = if pivots.is_empty() {
        KeyedCollection::default()
    } else {
        let ids = pivots.pluck(Pivot::related_key).unique();
        let query = R::objects(conn);
        let column = query.query().qualify(R::PRIMARY_KEY);
        query.where_in(&column, ids).get()?.key_by(Model::key)
    };
    debug!(
        table = Pv::TABLE,
        kind,
        pivots = pivots.len(),
        related = related.len(),
        "pivot"
    );

    let mut grouped = pivots
        .into_iter()
        .filter_map(|pivot| {
            let model = related.get(&pivot.related_key()).cloned()?;
            Some(Related {
                pivot,
                related: model,
            })
        })
        .collect::<Collection<_>>()
        .group_by(|link| link.pivot.parent_key());

    Ok(parents.map(|mut parent| {
        let own = grouped.remove(&parent.key()).unwrap_or_default();
        assign(&mut parent, own);
        parent
    }))
}
