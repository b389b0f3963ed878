//! The job entity.

use crate::error::StoreResult;
use crate::fields::{FieldMap, SparseUpdate};
use crate::filter::FilterSet;
use crate::repo::{Entity, NewEntity, Repository};
use crate::row::{FromRow, RowExt};
use crate::validate::{ValidationCode, ValidationError, ValidationErrors};
use crate::value::SqlValue;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tokio_postgres::Row;

/// Repository for [`Job`] records.
pub type JobRepository = Repository<Job>;

/// A job posting owned by a company.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Job {
    pub id: i32,
    pub title: String,
    pub salary: Option<i32>,
    /// Fraction of the company offered, between 0 and 1.
    pub equity: Option<Decimal>,
    pub company_handle: String,
}

/// Payload for creating a [`Job`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct NewJob {
    pub title: String,
    #[serde(default)]
    pub salary: Option<i32>,
    #[serde(default)]
    pub equity: Option<Decimal>,
    pub company_handle: String,
}

impl FromRow for Job {
    fn from_row(row: &Row) -> StoreResult<Self> {
        Ok(Self {
            id: row.try_get_column("id")?,
            title: row.try_get_column("title")?,
            salary: row.try_get_column("salary")?,
            equity: row.try_get_column("equity")?,
            company_handle: row.try_get_column("company_handle")?,
        })
    }
}

impl Entity for Job {
    const NAME: &'static str = "job";
    const TABLE: &'static str = "jobs";
    const COLUMNS: &'static str = "id, title, salary, equity, company_handle";

    type Id = i32;
    type New = NewJob;

    fn field_map() -> FieldMap {
        FieldMap::new().map("companyHandle", "company_handle")
    }

    fn filters() -> FilterSet {
        FilterSet::new()
            .contains_text("title", "title")
            .min_numeric("minSalary", "salary")
            .boolean_flag("hasEquity", "equity")
    }

    fn validate_update(update: &SparseUpdate) -> StoreResult<()> {
        let mut errors = ValidationErrors::default();
        for (field, value) in update.iter() {
            match field {
                "title" => check_title(&mut errors, value),
                "salary" => check_salary(&mut errors, value),
                "equity" => check_equity(&mut errors, value),
                "id" | "companyHandle" | "company_handle" => errors.push(ValidationError::new(
                    field,
                    ValidationCode::Immutable,
                    format!("{field} cannot be changed"),
                )),
                _ => errors.push(ValidationError::new(
                    field,
                    ValidationCode::Unknown,
                    format!("unknown job field {field}"),
                )),
            }
        }
        errors.into_result()?;
        Ok(())
    }
}

impl NewEntity for NewJob {
    fn columns() -> &'static [&'static str] {
        &["title", "salary", "equity", "company_handle"]
    }

    fn values(&self) -> Vec<SqlValue> {
        vec![
            SqlValue::from(self.title.as_str()),
            SqlValue::from(self.salary),
            SqlValue::from(self.equity),
            SqlValue::from(self.company_handle.as_str()),
        ]
    }

    fn describe(&self) -> String {
        format!("{}, {}", self.title, self.company_handle)
    }

    fn validate(&self) -> StoreResult<()> {
        let mut errors = ValidationErrors::default();
        check_title(&mut errors, &SqlValue::from(self.title.as_str()));
        check_salary(&mut errors, &SqlValue::from(self.salary));
        check_equity(&mut errors, &SqlValue::from(self.equity));
        if self.company_handle.trim().is_empty() {
            errors.push(ValidationError::new(
                "companyHandle",
                ValidationCode::Required,
                "companyHandle is required",
            ));
        }
        errors.into_result()?;
        Ok(())
    }
}

fn check_title(errors: &mut ValidationErrors, value: &SqlValue) {
    match value {
        SqlValue::Text(s) if !s.trim().is_empty() => {}
        SqlValue::Text(_) | SqlValue::Null => errors.push(ValidationError::new(
            "title",
            ValidationCode::Required,
            "title is required",
        )),
        other => errors.push(ValidationError::new(
            "title",
            ValidationCode::Type,
            format!("title must be text, got {}", other.type_name()),
        )),
    }
}

fn check_salary(errors: &mut ValidationErrors, value: &SqlValue) {
    match value {
        SqlValue::Null => {}
        SqlValue::Int(n) if *n < 0 => errors.push(ValidationError::new(
            "salary",
            ValidationCode::Range,
            "salary must be at least 0",
        )),
        SqlValue::Int(n) if i32::try_from(*n).is_err() => errors.push(ValidationError::new(
            "salary",
            ValidationCode::Range,
            "salary is too large",
        )),
        SqlValue::Int(_) => {}
        other => errors.push(ValidationError::new(
            "salary",
            ValidationCode::Type,
            format!("salary must be an integer, got {}", other.type_name()),
        )),
    }
}

fn check_equity(errors: &mut ValidationErrors, value: &SqlValue) {
    if value.is_null() {
        return;
    }
    match value.as_decimal() {
        Some(d) if d >= Decimal::ZERO && d <= Decimal::ONE => {}
        Some(_) => errors.push(ValidationError::new(
            "equity",
            ValidationCode::Range,
            "equity must be between 0 and 1",
        )),
        None => errors.push(ValidationError::new(
            "equity",
            ValidationCode::Type,
            format!("equity must be a decimal, got {}", value.type_name()),
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::StoreError;
    use crate::filter::FilterSpec;
    use std::str::FromStr;

    fn new_job() -> NewJob {
        NewJob {
            title: "newJob".to_string(),
            salary: Some(0),
            equity: Some(Decimal::from_str("0.005").unwrap()),
            company_handle: "c4".to_string(),
        }
    }

    #[test]
    fn select_without_filters() {
        let stmt = JobRepository::new().select_statement(None).unwrap();
        assert_eq!(
            stmt.clause,
            "SELECT id, title, salary, equity, company_handle FROM jobs ORDER BY id"
        );
        assert!(stmt.values.is_empty());
    }

    #[test]
    fn select_with_all_filters() {
        let spec = FilterSpec::new()
            .with("title", "j")
            .with("minSalary", 20000)
            .with("hasEquity", true);
        let stmt = JobRepository::new().select_statement(Some(&spec)).unwrap();
        assert_eq!(
            stmt.clause,
            "SELECT id, title, salary, equity, company_handle FROM jobs \
             WHERE title ILIKE $1 AND salary >= $2 AND equity > 0 ORDER BY id"
        );
        assert_eq!(stmt.values, vec![SqlValue::from("%j%"), SqlValue::Int(20000)]);
    }

    #[test]
    fn update_binds_id_after_set_values() {
        let patch = SparseUpdate::new().set("salary", 50000).set("equity", "0");
        let stmt = JobRepository::new().update_statement(&patch).unwrap();
        assert_eq!(
            stmt.clause,
            r#"UPDATE jobs SET "salary"=$1, "equity"=$2 WHERE id = $3 RETURNING id, title, salary, equity, company_handle"#
        );
        assert_eq!(stmt.values.len(), 2);
    }

    #[test]
    fn update_maps_company_handle() {
        let patch = SparseUpdate::new().set("companyHandle", "c2");
        let stmt = JobRepository::new().update_statement(&patch).unwrap();
        assert!(stmt.clause.contains(r#"SET "company_handle"=$1"#));
        // ...but jobs never move between companies.
        assert!(Job::validate_update(&patch).unwrap_err().is_validation());
    }

    #[test]
    fn insert_and_duplicate_check_statements() {
        let repo = JobRepository::new();
        assert_eq!(
            repo.insert_statement(),
            "INSERT INTO jobs (title, salary, equity, company_handle) VALUES ($1, $2, $3, $4) \
             RETURNING id, title, salary, equity, company_handle"
        );
        assert_eq!(
            repo.duplicate_check_statement(),
            "SELECT id FROM jobs WHERE title IS NOT DISTINCT FROM $1 AND salary IS NOT DISTINCT FROM $2 \
             AND equity IS NOT DISTINCT FROM $3 AND company_handle IS NOT DISTINCT FROM $4 LIMIT 1"
        );
        assert_eq!(repo.delete_statement(), "DELETE FROM jobs WHERE id = $1 RETURNING id");
        assert_eq!(
            repo.get_statement(),
            "SELECT id, title, salary, equity, company_handle FROM jobs WHERE id = $1"
        );
    }

    #[test]
    fn new_job_values_follow_columns() {
        let values = new_job().values();
        assert_eq!(values.len(), NewJob::columns().len());
        assert_eq!(values[0], SqlValue::from("newJob"));
        assert_eq!(values[1], SqlValue::Int(0));
        assert_eq!(values[3], SqlValue::from("c4"));
    }

    #[test]
    fn new_job_validation() {
        assert!(new_job().validate().is_ok());

        let mut job = new_job();
        job.equity = Some(Decimal::from_str("1.5").unwrap());
        job.salary = Some(-1);
        job.title = " ".to_string();
        let Err(StoreError::Invalid(errors)) = job.validate() else {
            panic!("expected field errors");
        };
        assert!(errors.has_field("equity"));
        assert!(errors.has_field("salary"));
        assert!(errors.has_field("title"));
    }

    #[test]
    fn update_validation_allows_nulls() {
        let patch = SparseUpdate::new()
            .set("title", "newTestJob")
            .set("salary", SqlValue::Null)
            .set("equity", SqlValue::Null);
        assert!(Job::validate_update(&patch).is_ok());
    }

    #[test]
    fn update_validation_rejects_bad_fields() {
        let patch = SparseUpdate::new().set("title", 56);
        assert!(Job::validate_update(&patch).is_err());

        let patch = SparseUpdate::new().set("equity", "1.01");
        assert!(Job::validate_update(&patch).is_err());

        let patch = SparseUpdate::new().set("handle", "x");
        assert!(Job::validate_update(&patch).is_err());
    }

    #[test]
    fn serializes_like_the_api() {
        let job = Job {
            id: 1,
            title: "test".to_string(),
            salary: Some(1000),
            equity: Some(Decimal::from_str("0.004").unwrap()),
            company_handle: "c5".to_string(),
        };
        let json = serde_json::to_value(&job).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "id": 1,
                "title": "test",
                "salary": 1000,
                "equity": "0.004",
                "companyHandle": "c5",
            })
        );
    }

    #[test]
    fn new_job_deserializes_from_payload() {
        let job: NewJob = serde_json::from_str(
            r#"{"title": "newJob", "salary": 0, "equity": "0.005", "companyHandle": "c4"}"#,
        )
        .unwrap();
        assert_eq!(job, new_job());

        assert!(serde_json::from_str::<NewJob>(r#"{"title": "new", "salary": 10}"#).is_err());
    }
}
