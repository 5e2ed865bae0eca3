//! # sqlx-pool-registry
//!
//! Named connection pools behind a small set of async traits, with a SQLx
//! SQLite implementation.
//!
//! ## Core Types
//!
//! - **[`PoolRegistry`]**: Resolves a logical pool name to a pool handle
//! - **[`ConnectionPool`]**: Hands out connections
//! - **[`PooledConnection`]**: Connection with auto-commit, commit, rollback and close
//! - **[`Cursor`]**: In-flight statement that must be closed before its connection
//! - **[`ProviderError`]**: Error carrying an ordered chain of [`Diagnostic`]s
//!
//! ## SQLite backend
//!
//! - **[`SqlitePoolRegistry`]**: Binds names to [`SqlitePoolConfig`]s and caches opened pools
//! - **[`SqliteDataSource`]**: One SQLx pool
//! - **[`PooledSqliteConnection`]**: Checked-out connection with emulated auto-commit

mod config;
mod connection;
mod database;
mod error;
mod registry;
mod traits;

// Re-export public types
pub use config::SqlitePoolConfig;
pub use connection::PooledSqliteConnection;
pub use database::SqliteDataSource;
pub use error::{Diagnostic, ProviderError, Result};
pub use registry::SqlitePoolRegistry;
pub use traits::{ConnectionPool, Cursor, NoCursor, PoolRegistry, PooledConnection};
