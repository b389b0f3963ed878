//! Per-call timeouts and SQL tracing around any [`GenericClient`].

use crate::client::GenericClient;
use crate::config::StoreConfig;
use crate::error::{StoreError, StoreResult};
use std::future::Future;
use std::time::{Duration, Instant};
use tokio_postgres::Row;
use tokio_postgres::types::ToSql;

const MAX_LOGGED_SQL: usize = 200;

/// A client wrapper that bounds every call with a timeout and traces the SQL it runs.
///
/// On timeout the server-side query is cancelled on a best-effort basis and the
/// call fails with [`StoreError::Timeout`]. Calls slower than the configured
/// threshold are logged at WARN on the `jobly.sql` target.
///
/// ```ignore
/// let conn = TimedClient::from_config(pool.get().await?, &config);
/// let jobs = JobRepository::new().find_all(&conn, None).await?;
/// ```
pub struct TimedClient<C> {
    client: C,
    query_timeout: Option<Duration>,
    slow_query_threshold: Option<Duration>,
}

impl<C: GenericClient> TimedClient<C> {
    /// Wrap `client` with no timeout and no slow-query threshold.
    pub fn new(client: C) -> Self {
        Self {
            client,
            query_timeout: None,
            slow_query_threshold: None,
        }
    }

    /// Wrap `client` using the timing settings of `config`.
    pub fn from_config(client: C, config: &StoreConfig) -> Self {
        Self {
            client,
            query_timeout: config.query_timeout,
            slow_query_threshold: config.slow_query_threshold,
        }
    }

    pub fn with_query_timeout(mut self, timeout: Duration) -> Self {
        self.query_timeout = Some(timeout);
        self
    }

    pub fn with_slow_query_threshold(mut self, threshold: Duration) -> Self {
        self.slow_query_threshold = Some(threshold);
        self
    }

    pub fn query_timeout(&self) -> Option<Duration> {
        self.query_timeout
    }

    pub fn inner(&self) -> &C {
        &self.client
    }

    pub fn into_inner(self) -> C {
        self.client
    }

    async fn run<T, F>(&self, sql: &str, param_count: usize, future: F) -> StoreResult<T>
    where
        F: Future<Output = StoreResult<T>> + Send,
    {
        let logged_sql = truncate_sql(sql, MAX_LOGGED_SQL);
        tracing::debug!(target: "jobly.sql", param_count, sql = %logged_sql, "executing");

        let start = Instant::now();
        let result = match self.query_timeout {
            Some(timeout) => match tokio::time::timeout(timeout, future).await {
                Ok(result) => result,
                Err(_) => {
                    if let Some(cancel_token) = self.client.cancel_token() {
                        tokio::spawn(async move {
                            let _ = cancel_token.cancel_query(tokio_postgres::NoTls).await;
                        });
                    }
                    tracing::warn!(target: "jobly.sql", ?timeout, sql = %logged_sql, "query timed out");
                    Err(StoreError::Timeout(timeout))
                }
            },
            None => future.await,
        };

        let elapsed = start.elapsed();
        if let Some(threshold) = self.slow_query_threshold {
            if elapsed > threshold {
                tracing::warn!(target: "jobly.sql", ?elapsed, sql = %logged_sql, "slow query");
            }
        }
        result
    }
}

impl<C: GenericClient> GenericClient for TimedClient<C> {
    async fn query(&self, sql: &str, params: &[&(dyn ToSql + Sync)]) -> StoreResult<Vec<Row>> {
        self.run(sql, params.len(), self.client.query(sql, params))
            .await
    }

    async fn query_opt(&self, sql: &str, params: &[&(dyn ToSql + Sync)]) -> StoreResult<Option<Row>> {
        self.run(sql, params.len(), self.client.query_opt(sql, params))
            .await
    }

    async fn execute(&self, sql: &str, params: &[&(dyn ToSql + Sync)]) -> StoreResult<u64> {
        self.run(sql, params.len(), self.client.execute(sql, params))
            .await
    }

    fn cancel_token(&self) -> Option<tokio_postgres::CancelToken> {
        self.client.cancel_token()
    }
}

fn truncate_sql(sql: &str, max_bytes: usize) -> String {
    if sql.len() <= max_bytes {
        return sql.to_string();
    }
    let mut end = max_bytes;
    while end > 0 && !sql.is_char_boundary(end) {
        end -= 1;
    }
    format!("{}...", &sql[..end])
}
