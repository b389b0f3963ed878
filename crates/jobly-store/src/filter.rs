//! Dynamic WHERE-clause generation from optional search criteria.
//!
//! Each entity configures a [`FilterSet`]: an ordered list of named rules, each
//! bound to a column. A [`FilterSpec`] supplies values for some of those names.
//! Values are coerced per rule kind first, so query-string text like
//! `minSalary=0` or `hasEquity=false` behaves like the typed values. Falsy
//! values mean "not requested" rather than "match zero/false"; values that
//! cannot be coerced are a validation error.
//!
//! ```ignore
//! let filters = FilterSet::new()
//!     .contains_text("title", "title")
//!     .min_numeric("minSalary", "salary")
//!     .boolean_flag("hasEquity", "equity");
//!
//! let spec = FilterSpec::new().with("title", "j").with("hasEquity", true);
//! let f = filters.build(Some(&spec))?;
//! assert_eq!(f.clause, "title ILIKE $1 AND equity > 0");
//! ```

use crate::error::{StoreError, StoreResult};
use crate::fragment::SqlFragment;
use crate::ident::Ident;
use crate::value::SqlValue;
use serde::Deserialize;
use std::collections::BTreeMap;

/// The SQL shape a rule produces.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterKind {
    /// `column ILIKE $i`, bound to `%value%`
    ContainsText,
    /// `column >= $i`
    MinNumeric,
    /// `column > 0`; a fixed predicate, consumes no placeholder
    BooleanFlag,
}

/// A named criterion bound to a column.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilterRule {
    pub name: String,
    pub column: String,
    pub kind: FilterKind,
}

impl FilterRule {
    /// The value to bind for this rule, or `None` when the criterion is not requested.
    fn coerce(&self, value: &SqlValue) -> StoreResult<Option<SqlValue>> {
        if !value.is_truthy() {
            return Ok(None);
        }
        match self.kind {
            FilterKind::ContainsText => Ok(Some(SqlValue::Text(format!("%{value}%")))),
            FilterKind::MinNumeric => match value.as_i64() {
                Some(0) => Ok(None),
                Some(n) => Ok(Some(SqlValue::Int(n))),
                None => Err(StoreError::validation(format!(
                    "{}: must be an integer, got {value}",
                    self.name
                ))),
            },
            FilterKind::BooleanFlag => match value.as_bool() {
                Some(true) => Ok(Some(SqlValue::Bool(true))),
                Some(false) => Ok(None),
                None => Err(StoreError::validation(format!(
                    "{}: must be a boolean, got {value}",
                    self.name
                ))),
            },
        }
    }
}

/// Named criterion values, e.g. parsed from a query string.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(transparent)]
pub struct FilterSpec {
    criteria: BTreeMap<String, SqlValue>,
}

impl FilterSpec {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a criterion (builder style).
    #[must_use]
    pub fn with(mut self, name: impl Into<String>, value: impl Into<SqlValue>) -> Self {
        self.criteria.insert(name.into(), value.into());
        self
    }

    pub fn get(&self, name: &str) -> Option<&SqlValue> {
        self.criteria.get(name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.criteria.keys().map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.criteria.is_empty()
    }
}

/// Ordered filter rules for one entity.
///
/// Rule order fixes both the textual order of predicates and placeholder
/// numbering, so identical specs always render identical SQL.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FilterSet {
    rules: Vec<FilterRule>,
}

impl FilterSet {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn rule(mut self, name: impl Into<String>, column: impl Into<String>, kind: FilterKind) -> Self {
        self.rules.push(FilterRule {
            name: name.into(),
            column: column.into(),
            kind,
        });
        self
    }

    #[must_use]
    pub fn contains_text(self, name: impl Into<String>, column: impl Into<String>) -> Self {
        self.rule(name, column, FilterKind::ContainsText)
    }

    #[must_use]
    pub fn min_numeric(self, name: impl Into<String>, column: impl Into<String>) -> Self {
        self.rule(name, column, FilterKind::MinNumeric)
    }

    #[must_use]
    pub fn boolean_flag(self, name: impl Into<String>, column: impl Into<String>) -> Self {
        self.rule(name, column, FilterKind::BooleanFlag)
    }

    pub fn rules(&self) -> &[FilterRule] {
        &self.rules
    }

    /// Is `name` a criterion this set understands?
    pub fn recognizes(&self, name: &str) -> bool {
        self.rules.iter().any(|r| r.name == name)
    }

    /// Render the predicates requested by `spec`, joined with `AND`.
    ///
    /// An absent spec, or one where nothing is truthy, yields an empty fragment
    /// (match all rows). Unknown criterion names are ignored.
    pub fn build(&self, spec: Option<&FilterSpec>) -> StoreResult<SqlFragment> {
        let Some(spec) = spec else {
            return Ok(SqlFragment::empty());
        };

        for name in spec.names().filter(|n| !self.recognizes(n)) {
            tracing::debug!(target: "jobly.filter", criterion = name, "ignoring unknown filter criterion");
        }

        let mut predicates: Vec<String> = Vec::new();
        let mut values = Vec::new();
        for rule in &self.rules {
            let Some(raw) = spec.get(&rule.name) else {
                continue;
            };
            let Some(value) = rule.coerce(raw)? else {
                continue;
            };
            let column = Ident::parse(&rule.column)?.to_sql();
            match rule.kind {
                FilterKind::ContainsText => {
                    values.push(value);
                    predicates.push(format!("{column} ILIKE ${}", values.len()));
                }
                FilterKind::MinNumeric => {
                    values.push(value);
                    predicates.push(format!("{column} >= ${}", values.len()));
                }
                FilterKind::BooleanFlag => predicates.push(format!("{column} > 0")),
            }
        }

        Ok(SqlFragment::new(predicates.join(" AND "), values))
    }
}
