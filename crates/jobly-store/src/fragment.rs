use crate::value::SqlValue;
use tokio_postgres::types::ToSql;

/// A generated SQL clause and the values for its placeholders.
///
/// Placeholder `$i` in `clause` binds `values[i - 1]`; numbering is 1-based and
/// contiguous.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SqlFragment {
    pub clause: String,
    pub values: Vec<SqlValue>,
}

impl SqlFragment {
    pub fn new(clause: impl Into<String>, values: Vec<SqlValue>) -> Self {
        Self {
            clause: clause.into(),
            values,
        }
    }

    /// An empty clause with no values.
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.clause.is_empty()
    }

    /// Index of the next free placeholder, for parameters appended after this fragment.
    pub fn next_placeholder(&self) -> usize {
        self.values.len() + 1
    }

    /// `WHERE <clause>`, or an empty string when nothing applies.
    pub fn where_clause(&self) -> String {
        if self.clause.is_empty() {
            String::new()
        } else {
            format!("WHERE {}", self.clause)
        }
    }

    /// Values as parameter references for tokio-postgres.
    pub fn params(&self) -> Vec<&(dyn ToSql + Sync)> {
        self.values.iter().map(|v| v as &(dyn ToSql + Sync)).collect()
    }
}
