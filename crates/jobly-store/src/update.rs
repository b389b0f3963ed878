//! SET-clause generation for partial updates.

use crate::error::{StoreError, StoreResult};
use crate::fields::{FieldMap, SparseUpdate};
use crate::fragment::SqlFragment;
use crate::ident::Ident;

/// Turn a sparse update into a `"col"=$1, "col2"=$2` SET list.
///
/// Columns are resolved through `field_map` (unmapped fields keep their own
/// name) and quoted. Values come back in the update's insertion order, so
/// `$i` binds the i-th entry. `Null` values are kept and set the column to NULL.
///
/// Fails with [`StoreError::Validation`] when `update` is empty.
///
/// ```ignore
/// let patch = SparseUpdate::new().set("firstName", "Aliya").set("age", 32);
/// let map = FieldMap::new().map("firstName", "first_name");
/// let set = partial_update(&patch, &map)?;
/// assert_eq!(set.clause, r#""first_name"=$1, "age"=$2"#);
/// ```
pub fn partial_update(update: &SparseUpdate, field_map: &FieldMap) -> StoreResult<SqlFragment> {
    if update.is_empty() {
        return Err(StoreError::validation("no data"));
    }

    let mut clause = String::new();
    let mut values = Vec::with_capacity(update.len());
    for (i, (field, value)) in update.iter().enumerate() {
        if i > 0 {
            clause.push_str(", ");
        }
        Ident::quoted(field_map.column_for(field))?.write_sql(&mut clause);
        clause.push_str("=$");
        clause.push_str(&(i + 1).to_string());
        values.push(value.clone());
    }

    Ok(SqlFragment { clause, values })
}
