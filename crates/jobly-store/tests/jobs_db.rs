//! Job repository against a live PostgreSQL.
//!
//! Skipped unless `DATABASE_URL` is set. Every test works in its own schema,
//! dropped again at the end, so tests can run in parallel.

use jobly_store::{
    FilterSpec, Job, JobRepository, NewJob, SparseUpdate, SqlValue, StoreError, TimedClient,
    schema,
};
use rust_decimal::Decimal;
use std::str::FromStr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

static SCHEMA_SEQ: AtomicUsize = AtomicUsize::new(0);

async fn try_connect() -> Option<tokio_postgres::Client> {
    let database_url = std::env::var("DATABASE_URL").ok()?;
    let (client, connection) = tokio_postgres::connect(&database_url, tokio_postgres::NoTls)
        .await
        .expect("Failed to connect to DATABASE_URL with NoTls");
    tokio::spawn(async move {
        if let Err(e) = connection.await {
            eprintln!("tokio-postgres connection error: {e}");
        }
    });
    Some(client)
}

struct TestDb {
    client: tokio_postgres::Client,
    schema: String,
}

impl TestDb {
    async fn teardown(self) {
        self.client
            .batch_execute(&format!("DROP SCHEMA {} CASCADE", self.schema))
            .await
            .unwrap();
    }

    async fn job_id(&self, title: &str) -> i32 {
        let row = self
            .client
            .query_one("SELECT id FROM jobs WHERE title = $1", &[&title])
            .await
            .unwrap();
        row.get(0)
    }
}

/// Fresh schema with companies c1..c5 and four jobs.
async fn setup() -> Option<TestDb> {
    let client = try_connect().await?;
    let schema = format!(
        "jobly_test_{}_{}",
        std::process::id(),
        SCHEMA_SEQ.fetch_add(1, Ordering::Relaxed)
    );
    client
        .batch_execute(&format!(
            "DROP SCHEMA IF EXISTS {schema} CASCADE; CREATE SCHEMA {schema}; SET search_path TO {schema}"
        ))
        .await
        .unwrap();
    schema::install(&client).await.unwrap();

    client
        .batch_execute(
            "INSERT INTO companies (handle, name, num_employees, description, logo_url) VALUES
                ('c1', 'C1', 1, 'Desc1', 'http://c1.img'),
                ('c2', 'C2', 2, 'Desc2', 'http://c2.img'),
                ('c3', 'C3', 3, 'Desc3', 'http://c3.img'),
                ('c4', 'C4', 4, 'Desc4', 'http://c4.img'),
                ('c5', 'C5', 5, 'Desc5', 'http://c5.img');
             INSERT INTO jobs (title, salary, equity, company_handle) VALUES
                ('j1', 10000, '0', 'c1'),
                ('j2', 20000, '0.010', 'c2'),
                ('j3', 30000, '0', 'c3'),
                ('test', 1000, '0.004', 'c5');",
        )
        .await
        .unwrap();

    Some(TestDb { client, schema })
}

macro_rules! db_or_skip {
    () => {
        match setup().await {
            Some(db) => db,
            None => {
                eprintln!("DATABASE_URL not set; skipping");
                return;
            }
        }
    };
}

fn dec(s: &str) -> Decimal {
    Decimal::from_str(s).unwrap()
}

fn titles(jobs: &[Job]) -> Vec<&str> {
    jobs.iter().map(|j| j.title.as_str()).collect()
}

fn new_job() -> NewJob {
    NewJob {
        title: "newJob".to_string(),
        salary: Some(0),
        equity: Some(dec("0.005")),
        company_handle: "c4".to_string(),
    }
}

#[tokio::test]
async fn create_then_duplicate() {
    let db = db_or_skip!();
    let repo = JobRepository::new();

    let job = repo.create(&db.client, &new_job()).await.unwrap();
    assert_eq!(job.title, "newJob");
    assert_eq!(job.salary, Some(0));
    assert_eq!(job.equity, Some(dec("0.005")));
    assert_eq!(job.company_handle, "c4");
    assert_eq!(repo.get(&db.client, job.id).await.unwrap(), job);

    let err = repo.create(&db.client, &new_job()).await.unwrap_err();
    assert!(err.is_duplicate());
    assert_eq!(err.kind().http_status(), 400);

    db.teardown().await;
}

#[tokio::test]
async fn duplicate_check_treats_nulls_as_equal() {
    let db = db_or_skip!();
    let repo = JobRepository::new();
    let unpaid = NewJob {
        title: "intern".to_string(),
        salary: None,
        equity: None,
        company_handle: "c1".to_string(),
    };

    repo.create(&db.client, &unpaid).await.unwrap();
    assert!(repo.create(&db.client, &unpaid).await.unwrap_err().is_duplicate());

    // Bypassing the pre-check still trips the unique index.
    let err = db
        .client
        .execute(
            "INSERT INTO jobs (title, salary, equity, company_handle) VALUES ('intern', NULL, NULL, 'c1')",
            &[],
        )
        .await
        .map_err(StoreError::from)
        .unwrap_err();
    assert!(err.is_unique_violation());

    db.teardown().await;
}

#[tokio::test]
async fn find_all_without_filter() {
    let db = db_or_skip!();
    let jobs = JobRepository::new().find_all(&db.client, None).await.unwrap();
    assert_eq!(titles(&jobs), ["j1", "j2", "j3", "test"]);
    assert_eq!(jobs[1].equity, Some(dec("0.010")));
    assert_eq!(jobs[3].salary, Some(1000));

    let again = JobRepository::new()
        .find_all(&db.client, Some(&FilterSpec::new()))
        .await
        .unwrap();
    assert_eq!(again, jobs);

    db.teardown().await;
}

#[tokio::test]
async fn find_all_with_filters() {
    let db = db_or_skip!();
    let repo = JobRepository::new();

    let by_title = FilterSpec::new().with("title", "1");
    assert_eq!(titles(&repo.find_all(&db.client, Some(&by_title)).await.unwrap()), ["j1"]);

    let by_title_case = FilterSpec::new().with("title", "TE");
    assert_eq!(
        titles(&repo.find_all(&db.client, Some(&by_title_case)).await.unwrap()),
        ["test"]
    );

    let by_salary = FilterSpec::new().with("minSalary", 20000);
    assert_eq!(
        titles(&repo.find_all(&db.client, Some(&by_salary)).await.unwrap()),
        ["j2", "j3"]
    );

    let by_equity = FilterSpec::new().with("hasEquity", true);
    assert_eq!(
        titles(&repo.find_all(&db.client, Some(&by_equity)).await.unwrap()),
        ["j2", "test"]
    );

    let combined = FilterSpec::new()
        .with("title", "j")
        .with("minSalary", 15000)
        .with("hasEquity", true);
    assert_eq!(titles(&repo.find_all(&db.client, Some(&combined)).await.unwrap()), ["j2"]);

    let nothing = FilterSpec::new().with("title", "nope").with("bogus", "ignored");
    assert!(repo.find_all(&db.client, Some(&nothing)).await.unwrap().is_empty());

    db.teardown().await;
}

#[tokio::test]
async fn get_missing_is_not_found() {
    let db = db_or_skip!();
    let err = JobRepository::new().get(&db.client, 2147483646).await.unwrap_err();
    assert!(err.is_not_found());
    assert_eq!(err.kind().http_status(), 404);
    db.teardown().await;
}

#[tokio::test]
async fn update_changes_only_supplied_fields() {
    let db = db_or_skip!();
    let repo = JobRepository::new();
    let id = db.job_id("test").await;

    let patch = SparseUpdate::new().set("title", "newTestJob").set("salary", 50000);
    let job = repo.update(&db.client, id, &patch).await.unwrap();
    assert_eq!(
        job,
        Job {
            id,
            title: "newTestJob".to_string(),
            salary: Some(50000),
            equity: Some(dec("0.004")),
            company_handle: "c5".to_string(),
        }
    );
    assert_eq!(repo.get(&db.client, id).await.unwrap(), job);

    db.teardown().await;
}

#[tokio::test]
async fn update_with_null_fields() {
    let db = db_or_skip!();
    let id = db.job_id("test").await;

    let patch = SparseUpdate::new()
        .set("title", "newTestJob")
        .set("salary", SqlValue::Null)
        .set("equity", SqlValue::Null);
    let job = JobRepository::new().update(&db.client, id, &patch).await.unwrap();
    assert_eq!(job.salary, None);
    assert_eq!(job.equity, None);
    assert_eq!(job.company_handle, "c5");

    db.teardown().await;
}

#[tokio::test]
async fn update_accepts_json_payloads() {
    let db = db_or_skip!();
    let id = db.job_id("j1").await;

    let patch = SparseUpdate::from_json(serde_json::json!({"equity": "0.5", "salary": 1})).unwrap();
    let job = JobRepository::new().update(&db.client, id, &patch).await.unwrap();
    assert_eq!(job.equity, Some(dec("0.5")));
    assert_eq!(job.salary, Some(1));

    db.teardown().await;
}

#[tokio::test]
async fn update_missing_and_empty() {
    let db = db_or_skip!();
    let repo = JobRepository::new();

    let patch = SparseUpdate::new().set("title", "newTestJob");
    assert!(repo.update(&db.client, 2147483646, &patch).await.unwrap_err().is_not_found());

    let id = db.job_id("j1").await;
    let err = repo.update(&db.client, id, &SparseUpdate::new()).await.unwrap_err();
    assert!(err.is_validation());
    assert_eq!(repo.get(&db.client, id).await.unwrap().title, "j1");

    db.teardown().await;
}

#[tokio::test]
async fn remove_twice() {
    let db = db_or_skip!();
    let repo = JobRepository::new();
    let id = db.job_id("j3").await;

    repo.remove(&db.client, id).await.unwrap();
    assert!(repo.get(&db.client, id).await.unwrap_err().is_not_found());
    assert!(repo.remove(&db.client, id).await.unwrap_err().is_not_found());

    db.teardown().await;
}

#[tokio::test]
async fn storage_failures_pass_through() {
    let db = db_or_skip!();
    db.client.batch_execute("DROP TABLE jobs CASCADE").await.unwrap();

    let err = JobRepository::new().find_all(&db.client, None).await.unwrap_err();
    assert!(matches!(err, StoreError::Query(_)));
    assert_eq!(err.kind().http_status(), 500);

    db.teardown().await;
}

#[tokio::test]
async fn works_inside_a_transaction() {
    let Some(mut db) = setup().await else {
        eprintln!("DATABASE_URL not set; skipping");
        return;
    };
    let repo = JobRepository::new();

    {
        let tx = db.client.transaction().await.unwrap();
        let job = repo.create(&tx, &new_job()).await.unwrap();
        assert_eq!(repo.get(&tx, job.id).await.unwrap().title, "newJob");
        tx.rollback().await.unwrap();
    }

    let jobs = repo.find_all(&db.client, None).await.unwrap();
    assert_eq!(jobs.len(), 4);

    db.teardown().await;
}

#[tokio::test]
async fn timed_client_bounds_slow_statements() {
    let Some(client) = try_connect().await else {
        eprintln!("DATABASE_URL not set; skipping");
        return;
    };
    let conn = TimedClient::new(client).with_query_timeout(Duration::from_millis(50));

    let err = jobly_store::GenericClient::execute(&conn, "SELECT pg_sleep(2)", &[])
        .await
        .unwrap_err();
    assert!(err.is_timeout());
    assert_eq!(err.kind().http_status(), 500);
}
