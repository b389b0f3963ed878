//! Logical-to-physical field mapping and sparse updates.

use crate::error::{StoreError, StoreResult};
use crate::value::SqlValue;
use serde::de::{Deserialize, Deserializer, MapAccess, Visitor};
use std::fmt;

/// Maps logical field names (as callers spell them, e.g. `companyHandle`) to
/// physical column names (`company_handle`).
///
/// Unmapped names fall back to themselves, so snake_case fields need no entry.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FieldMap {
    entries: Vec<(String, String)>,
}

impl FieldMap {
    /// An empty (identity) map.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a `field -> column` mapping. A repeated field overrides the earlier entry.
    pub fn map(mut self, field: impl Into<String>, column: impl Into<String>) -> Self {
        let field = field.into();
        let column = column.into();
        match self.entries.iter_mut().find(|(f, _)| *f == field) {
            Some(entry) => entry.1 = column,
            None => self.entries.push((field, column)),
        }
        self
    }

    /// Physical column for `field`, or `field` itself when unmapped.
    pub fn column_for<'a>(&'a self, field: &'a str) -> &'a str {
        self.entries
            .iter()
            .find(|(f, _)| f == field)
            .map_or(field, |(_, c)| c.as_str())
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<F: Into<String>, C: Into<String>> FromIterator<(F, C)> for FieldMap {
    fn from_iter<I: IntoIterator<Item = (F, C)>>(iter: I) -> Self {
        iter.into_iter()
            .fold(FieldMap::new(), |map, (f, c)| map.map(f, c))
    }
}

/// An insertion-ordered set of `field -> new value` changes.
///
/// Order matters: it decides placeholder numbering in the generated SET clause.
/// Setting a field twice keeps its first position and replaces the value.
///
/// ```ignore
/// use jobly_store::SparseUpdate;
///
/// let patch = SparseUpdate::new()
///     .set("salary", 50000)
///     .set("equity", None::<&str>);
/// assert_eq!(patch.len(), 2);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[must_use]
pub struct SparseUpdate {
    entries: Vec<(String, SqlValue)>,
}

impl SparseUpdate {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style [`SparseUpdate::insert`].
    pub fn set(mut self, field: impl Into<String>, value: impl Into<SqlValue>) -> Self {
        self.insert(field, value);
        self
    }

    /// Set `field` to `value`, returning the previous value if the field was present.
    pub fn insert(
        &mut self,
        field: impl Into<String>,
        value: impl Into<SqlValue>,
    ) -> Option<SqlValue> {
        let field = field.into();
        let value = value.into();
        match self.entries.iter_mut().find(|(f, _)| *f == field) {
            Some(entry) => Some(std::mem::replace(&mut entry.1, value)),
            None => {
                self.entries.push((field, value));
                None
            }
        }
    }

    pub fn get(&self, field: &str) -> Option<&SqlValue> {
        self.entries
            .iter()
            .find(|(f, _)| f == field)
            .map(|(_, v)| v)
    }

    pub fn contains(&self, field: &str) -> bool {
        self.get(field).is_some()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &SqlValue)> {
        self.entries.iter().map(|(f, v)| (f.as_str(), v))
    }

    pub fn fields(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(f, _)| f.as_str())
    }

    pub fn values(&self) -> impl Iterator<Item = &SqlValue> {
        self.entries.iter().map(|(_, v)| v)
    }

    /// Build from a JSON object, preserving its key order.
    pub fn from_json(value: serde_json::Value) -> StoreResult<Self> {
        let serde_json::Value::Object(map) = value else {
            return Err(StoreError::validation("update payload must be a JSON object"));
        };
        let mut update = Self::new();
        for (field, raw) in map {
            let value = SqlValue::try_from(raw)
                .map_err(|e| StoreError::validation(format!("{field}: {e}")))?;
            update.insert(field, value);
        }
        Ok(update)
    }
}

impl<F: Into<String>, V: Into<SqlValue>> FromIterator<(F, V)> for SparseUpdate {
    fn from_iter<I: IntoIterator<Item = (F, V)>>(iter: I) -> Self {
        let mut update = Self::new();
        for (f, v) in iter {
            update.insert(f, v);
        }
        update
    }
}

impl<'de> Deserialize<'de> for SparseUpdate {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        struct OrderedVisitor;

        impl<'de> Visitor<'de> for OrderedVisitor {
            type Value = SparseUpdate;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a map of field names to scalar values")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<Self::Value, A::Error> {
                let mut update = SparseUpdate::new();
                while let Some((field, value)) = access.next_entry::<String, SqlValue>()? {
                    update.insert(field, value);
                }
                Ok(update)
            }
        }

        deserializer.deserialize_map(OrderedVisitor)
    }
}
