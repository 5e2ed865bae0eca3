//! SQLite connection pool exposed through the [`ConnectionPool`] trait

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::{Pool, Sqlite};
use tracing::{debug, info};

use crate::Result;
use crate::config::SqlitePoolConfig;
use crate::connection::PooledSqliteConnection;
use crate::error::ProviderError;
use crate::traits::ConnectionPool;

/// SQLite database reachable through a single SQLx connection pool.
///
/// ## State Management
///
/// - **`pool`**: SQLx pool sized by [`SqlitePoolConfig`]
/// - **`closed`**: Prevents checkouts after the data source has been closed
/// - **`name`**: Logical name the data source was registered under (used in logs)
/// - **`path`**: Database file the pool was opened on
#[derive(Debug)]
pub struct SqliteDataSource {
   name: String,
   path: PathBuf,
   pool: Pool<Sqlite>,
   closed: AtomicBool,
}

impl SqliteDataSource {
   /// Open a pool for `config` and verify that one connection can be made.
   pub async fn connect(name: impl Into<String>, config: &SqlitePoolConfig) -> Result<Self> {
      let name = name.into();

      let connect_options = SqliteConnectOptions::new()
         .filename(&config.path)
         .create_if_missing(config.create_if_missing);

      let pool = SqlitePoolOptions::new()
         .max_connections(config.max_connections)
         .min_connections(config.min_connections)
         .idle_timeout(Some(config.idle_timeout))
         .acquire_timeout(config.acquire_timeout)
         .connect_with(connect_options)
         .await?;

      info!(
         pool = %name,
         path = %config.path.display(),
         max = config.max_connections,
         "SQLite pool opened"
      );

      Ok(Self {
         name,
         path: config.path.clone(),
         pool,
         closed: AtomicBool::new(false),
      })
   }

   pub fn name(&self) -> &str {
      &self.name
   }

   pub fn path(&self) -> &Path {
      &self.path
   }

   /// Number of connections currently open (idle and in use)
   pub fn size(&self) -> u32 {
      self.pool.size()
   }

   /// Number of idle connections
   pub fn num_idle(&self) -> usize {
      self.pool.num_idle()
   }

   pub fn is_closed(&self) -> bool {
      self.closed.load(Ordering::Acquire)
   }

   /// Close the pool. Waits for checked-out connections to be returned.
   pub async fn close(&self) {
      if self.closed.swap(true, Ordering::AcqRel) {
         return;
      }
      self.pool.close().await;
      info!(pool = %self.name, "SQLite pool closed");
   }
}

#[async_trait]
impl ConnectionPool for SqliteDataSource {
   type Connection = PooledSqliteConnection;

   async fn get_connection(&self) -> Result<PooledSqliteConnection> {
      if self.is_closed() {
         return Err(ProviderError::new(format!("pool '{}' has been closed", self.name))
            .with_code("POOL_CLOSED"));
      }

      debug!(pool = %self.name, "Acquiring connection");
      let conn = self.pool.acquire().await?;
      Ok(PooledSqliteConnection::new(conn))
   }
}
