//! # jobly-store
//!
//! PostgreSQL data access for the jobly job board.
//!
//! ## Features
//!
//! - **Partial updates**: [`partial_update`] turns a [`SparseUpdate`] into a
//!   parameterized `SET` list, mapping logical field names through a [`FieldMap`]
//! - **Dynamic filters**: a [`FilterSet`] turns optional search criteria into a
//!   parameterized `WHERE` clause
//! - **Repositories**: [`Repository`] composes both for any [`Entity`];
//!   [`JobRepository`] is the job instance
//! - **Explicit timeouts**: [`TimedClient`] bounds every storage call
//!
//! Generated SQL always binds values through `$1, $2, ...` placeholders;
//! identifiers are validated or quoted, never spliced from raw input.
//!
//! ```ignore
//! use jobly_store::{FilterSpec, JobRepository, SparseUpdate, StoreConfig, TimedClient};
//!
//! let config = StoreConfig::from_env()?;
//! let pool = jobly_store::create_pool(&config)?;
//! let conn = TimedClient::from_config(pool.get().await?, &config);
//!
//! let jobs = JobRepository::new();
//! let engineers = jobs
//!     .find_all(&conn, Some(&FilterSpec::new().with("title", "engineer")))
//!     .await?;
//! ```

pub mod client;
pub mod config;
pub mod error;
pub mod fields;
pub mod filter;
pub mod fragment;
pub mod ident;
pub mod job;
pub mod repo;
pub mod row;
pub mod schema;
pub mod timed;
pub mod update;
pub mod validate;
pub mod value;

pub use client::GenericClient;
pub use config::StoreConfig;
pub use error::{ErrorKind, StoreError, StoreResult};
pub use fields::{FieldMap, SparseUpdate};
pub use filter::{FilterKind, FilterRule, FilterSet, FilterSpec};
pub use fragment::SqlFragment;
pub use ident::Ident;
pub use job::{Job, JobRepository, NewJob};
pub use repo::{Entity, NewEntity, Repository};
pub use row::{FromRow, RowExt};
pub use timed::TimedClient;
pub use update::partial_update;
pub use validate::{ValidationCode, ValidationError, ValidationErrors};
pub use value::SqlValue;

#[cfg(feature = "pool")]
pub mod pool;

#[cfg(feature = "pool")]
pub use pool::create_pool;
