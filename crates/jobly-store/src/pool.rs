//! Connection pool construction

use crate::config::StoreConfig;
use crate::error::{StoreError, StoreResult};
use deadpool_postgres::{Manager, ManagerConfig, Pool, RecyclingMethod};
use tokio_postgres::NoTls;

/// Create a connection pool from a [`StoreConfig`].
///
/// Uses `NoTls`; put a TLS-terminating proxy in front of the database or build
/// the pool by hand if the server requires TLS.
///
/// ```ignore
/// let pool = jobly_store::create_pool(&StoreConfig::from_env()?)?;
/// let client = pool.get().await?;
/// ```
pub fn create_pool(config: &StoreConfig) -> StoreResult<Pool> {
    let pg_config: tokio_postgres::Config = config
        .database_url
        .parse()
        .map_err(|e: tokio_postgres::Error| StoreError::Connection(e.to_string()))?;

    let manager_config = ManagerConfig {
        recycling_method: RecyclingMethod::Fast,
    };
    let mgr = Manager::from_config(pg_config, NoTls, manager_config);

    tracing::debug!(
        target: "jobly.pool",
        max_size = config.pool_max_size,
        "creating connection pool"
    );
    Pool::builder(mgr)
        .max_size(config.pool_max_size)
        .build()
        .map_err(|e| StoreError::Pool(e.to_string()))
}
