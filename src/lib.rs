//! # dao-connection-source
//!
//! One shared, lazily resolved connection pool per process, plus the
//! connection lifecycle helpers a data-access object needs around each call:
//! acquire, commit, rollback and release.
//!
//! ## Core Types
//!
//! - **[`ConnectionSourceProvider`]**: Resolves the configured pool once and hands out connections
//! - **[`ActiveConnection`]**: A checked-out connection owned by one unit of work
//! - **[`ProviderConfig`]**: Names the pool registration to resolve
//! - **[`Error`]**: Lookup, acquisition and release failures
//!
//! ## Failure policy
//!
//! - Lookup, acquisition and release failures are returned to the caller
//! - Commit and rollback failures are logged, one record per chained cause, and never returned
//!
//! Pools themselves come from a [`PoolRegistry`](sqlx_pool_registry::PoolRegistry);
//! [`SqlitePoolRegistry`](sqlx_pool_registry::SqlitePoolRegistry) is the bundled
//! implementation.

mod config;
mod connection;
mod diagnostics;
mod error;
mod provider;

pub use config::{DEFAULT_POOL_NAME, ProviderConfig};
pub use connection::{ActiveConnection, ConnectionState};
pub use diagnostics::TransactionOperation;
pub use error::{Error, Result};
pub use provider::{ConnectionOf, ConnectionSourceProvider, UnitOfWorkError};

/// Provider backed by the bundled SQLite registry.
pub type SqliteConnectionSource = ConnectionSourceProvider<sqlx_pool_registry::SqlitePoolRegistry>;
