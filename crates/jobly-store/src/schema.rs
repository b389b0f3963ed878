//! DDL for the tables the repositories expect.
//!
//! This is a fixed bootstrap for tests and demos, not a migration system.

use crate::client::GenericClient;
use crate::error::StoreResult;

/// Statements creating `companies` and `jobs`, applied in order. Idempotent.
///
/// `jobs_business_key` backs the duplicate check in `create`: two concurrent
/// identical inserts cannot both pass it. NULL salary/equity are folded to a
/// sentinel so they compare equal.
pub const SCHEMA: &[&str] = &[
    "CREATE TABLE IF NOT EXISTS companies (
        handle VARCHAR(25) PRIMARY KEY CHECK (handle = lower(handle)),
        name TEXT UNIQUE NOT NULL,
        num_employees INTEGER CHECK (num_employees >= 0),
        description TEXT NOT NULL,
        logo_url TEXT
    )",
    "CREATE TABLE IF NOT EXISTS jobs (
        id SERIAL PRIMARY KEY,
        title TEXT NOT NULL,
        salary INTEGER CHECK (salary >= 0),
        equity NUMERIC CHECK (equity <= 1.0),
        company_handle VARCHAR(25) NOT NULL
            REFERENCES companies ON DELETE CASCADE
    )",
    "CREATE UNIQUE INDEX IF NOT EXISTS jobs_business_key ON jobs
        (title, COALESCE(salary, -1), COALESCE(equity, -1), company_handle)",
];

/// Apply [`SCHEMA`] over `conn`.
pub async fn install(conn: &impl GenericClient) -> StoreResult<()> {
    for stmt in SCHEMA {
        conn.execute(stmt, &[]).await?;
    }
    tracing::debug!(target: "jobly.schema", statements = SCHEMA.len(), "schema installed");
    Ok(())
}
