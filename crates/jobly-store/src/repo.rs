//! Generic CRUD repository over the two SQL builders.
//!
//! An [`Entity`] supplies the table, column list, field map and filter rules; a
//! [`Repository`] turns them into single-statement INSERT/SELECT/UPDATE/DELETE
//! calls against any [`GenericClient`].
//!
//! ```ignore
//! use jobly_store::{FilterSpec, JobRepository, NewJob, SparseUpdate};
//!
//! let jobs = JobRepository::new();
//! let job = jobs.create(&conn, &new_job).await?;
//! let cheap = jobs.find_all(&conn, Some(&FilterSpec::new().with("minSalary", 1))).await?;
//! let job = jobs.update(&conn, job.id, &SparseUpdate::new().set("salary", 50000)).await?;
//! jobs.remove(&conn, job.id).await?;
//! ```

use crate::client::GenericClient;
use crate::error::{StoreError, StoreResult};
use crate::fields::{FieldMap, SparseUpdate};
use crate::filter::{FilterSet, FilterSpec};
use crate::fragment::SqlFragment;
use crate::row::FromRow;
use crate::update::partial_update;
use crate::value::SqlValue;
use std::fmt;
use std::marker::PhantomData;
use tokio_postgres::types::ToSql;

/// A table-backed record type.
pub trait Entity: FromRow + Send + Sync {
    /// Singular name used in error messages, e.g. `"job"`.
    const NAME: &'static str;
    const TABLE: &'static str;
    /// Column list used for SELECT and RETURNING.
    const COLUMNS: &'static str;
    const ID_COLUMN: &'static str = "id";
    const ORDER_BY: &'static str = "id";

    type Id: ToSql + Sync + Send + fmt::Display;
    type New: NewEntity;

    /// Logical field name -> column name, for partial updates.
    fn field_map() -> FieldMap;

    /// Criteria understood by `find_all`.
    fn filters() -> FilterSet;

    /// Entity-specific checks on a non-empty partial update.
    fn validate_update(update: &SparseUpdate) -> StoreResult<()> {
        let _ = update;
        Ok(())
    }
}

/// Payload for inserting a new [`Entity`].
///
/// The insert columns double as the business key: a row matching all of them
/// is a duplicate.
pub trait NewEntity: Send + Sync {
    fn columns() -> &'static [&'static str];

    /// Values in the order of [`NewEntity::columns`].
    fn values(&self) -> Vec<SqlValue>;

    /// Human readable business key for duplicate errors.
    fn describe(&self) -> String;

    fn validate(&self) -> StoreResult<()> {
        Ok(())
    }
}

/// CRUD operations for one entity type.
pub struct Repository<E> {
    field_map: FieldMap,
    filters: FilterSet,
    _entity: PhantomData<fn() -> E>,
}

impl<E: Entity> Default for Repository<E> {
    fn default() -> Self {
        Self::new()
    }
}

fn as_params(values: &[SqlValue]) -> Vec<&(dyn ToSql + Sync)> {
    values.iter().map(|v| v as &(dyn ToSql + Sync)).collect()
}

impl<E: Entity> Repository<E> {
    pub fn new() -> Self {
        Self {
            field_map: E::field_map(),
            filters: E::filters(),
            _entity: PhantomData,
        }
    }

    pub fn field_map(&self) -> &FieldMap {
        &self.field_map
    }

    pub fn filters(&self) -> &FilterSet {
        &self.filters
    }

    // ==================== statements ====================

    /// `SELECT ... [WHERE ...] ORDER BY ...` with its bound values.
    pub fn select_statement(&self, filter: Option<&FilterSpec>) -> StoreResult<SqlFragment> {
        let mut predicates = self.filters.build(filter)?;
        let mut sql = format!("SELECT {} FROM {}", E::COLUMNS, E::TABLE);
        if !predicates.is_empty() {
            sql.push(' ');
            sql.push_str(&predicates.where_clause());
        }
        sql.push_str(" ORDER BY ");
        sql.push_str(E::ORDER_BY);
        predicates.clause = sql;
        Ok(predicates)
    }

    pub fn get_statement(&self) -> String {
        format!(
            "SELECT {} FROM {} WHERE {} = $1",
            E::COLUMNS,
            E::TABLE,
            E::ID_COLUMN
        )
    }

    /// Existence check on the business key; NULLs compare equal.
    pub fn duplicate_check_statement(&self) -> String {
        let predicates: Vec<String> = E::New::columns()
            .iter()
            .enumerate()
            .map(|(i, col)| format!("{col} IS NOT DISTINCT FROM ${}", i + 1))
            .collect();
        format!(
            "SELECT {} FROM {} WHERE {} LIMIT 1",
            E::ID_COLUMN,
            E::TABLE,
            predicates.join(" AND ")
        )
    }

    pub fn insert_statement(&self) -> String {
        let columns = E::New::columns();
        let placeholders: Vec<String> = (1..=columns.len()).map(|i| format!("${i}")).collect();
        format!(
            "INSERT INTO {} ({}) VALUES ({}) RETURNING {}",
            E::TABLE,
            columns.join(", "),
            placeholders.join(", "),
            E::COLUMNS
        )
    }

    /// `UPDATE ... SET ... WHERE id = $n+1 RETURNING ...`; the id binds after the SET values.
    pub fn update_statement(&self, update: &SparseUpdate) -> StoreResult<SqlFragment> {
        let mut set = partial_update(update, &self.field_map)?;
        set.clause = format!(
            "UPDATE {} SET {} WHERE {} = ${} RETURNING {}",
            E::TABLE,
            set.clause,
            E::ID_COLUMN,
            set.next_placeholder(),
            E::COLUMNS
        );
        Ok(set)
    }

    pub fn delete_statement(&self) -> String {
        format!(
            "DELETE FROM {} WHERE {} = $1 RETURNING {}",
            E::TABLE,
            E::ID_COLUMN,
            E::ID_COLUMN
        )
    }

    // ==================== operations ====================

    /// Insert a new record, rejecting business-key duplicates.
    pub async fn create(&self, conn: &impl GenericClient, new: &E::New) -> StoreResult<E> {
        new.validate()?;

        let values = new.values();
        let params = as_params(&values);
        if conn
            .query_opt(&self.duplicate_check_statement(), &params)
            .await?
            .is_some()
        {
            return Err(StoreError::duplicate(E::NAME, new.describe()));
        }

        // A concurrent insert can slip past the pre-check; the unique index catches it.
        let row = conn
            .query_opt(&self.insert_statement(), &params)
            .await
            .map_err(|e| {
                if e.is_unique_violation() {
                    StoreError::duplicate(E::NAME, new.describe())
                } else {
                    e
                }
            })?
            .ok_or_else(|| StoreError::decode(E::ID_COLUMN, "INSERT returned no row"))?;

        let record = E::from_row(&row)?;
        tracing::debug!(target: "jobly.repo", entity = E::NAME, key = %new.describe(), "created");
        Ok(record)
    }

    /// All records matching `filter`, ordered by the entity's order column.
    pub async fn find_all(
        &self,
        conn: &impl GenericClient,
        filter: Option<&FilterSpec>,
    ) -> StoreResult<Vec<E>> {
        let stmt = self.select_statement(filter)?;
        let rows = conn.query(&stmt.clause, &stmt.params()).await?;
        tracing::debug!(target: "jobly.repo", entity = E::NAME, rows = rows.len(), "find_all");
        rows.iter().map(E::from_row).collect()
    }

    pub async fn get(&self, conn: &impl GenericClient, id: E::Id) -> StoreResult<E> {
        let row = conn
            .query_opt(&self.get_statement(), &[&id])
            .await?
            .ok_or_else(|| StoreError::not_found(E::NAME, &id))?;
        E::from_row(&row)
    }

    /// Apply a partial update. Only the supplied fields change.
    ///
    /// Validation (including the empty-update check) runs before storage is touched.
    pub async fn update(
        &self,
        conn: &impl GenericClient,
        id: E::Id,
        update: &SparseUpdate,
    ) -> StoreResult<E> {
        let stmt = self.update_statement(update)?;
        E::validate_update(update)?;

        let mut params = stmt.params();
        params.push(&id);
        let row = conn
            .query_opt(&stmt.clause, &params)
            .await?
            .ok_or_else(|| StoreError::not_found(E::NAME, &id))?;

        let record = E::from_row(&row)?;
        tracing::debug!(target: "jobly.repo", entity = E::NAME, %id, fields = update.len(), "updated");
        Ok(record)
    }

    pub async fn remove(&self, conn: &impl GenericClient, id: E::Id) -> StoreResult<()> {
        conn.query_opt(&self.delete_statement(), &[&id])
            .await?
            .ok_or_else(|| StoreError::not_found(E::NAME, &id))?;
        tracing::debug!(target: "jobly.repo", entity = E::NAME, %id, "removed");
        Ok(())
    }
}
