//! Pooled SQLite connection with explicit transaction control

use std::ops::{Deref, DerefMut};

use async_trait::async_trait;
use sqlx::Sqlite;
use sqlx::pool::PoolConnection;
use sqlx::sqlite::SqliteConnection;
use tracing::{debug, trace};
use uuid::Uuid;

use crate::Result;
use crate::error::ProviderError;
use crate::traits::PooledConnection;

/// A connection checked out of a [`SqliteDataSource`](crate::SqliteDataSource).
///
/// SQLite has no session-level auto-commit switch, so it is emulated:
///
/// - `set_auto_commit(false)` opens a transaction
/// - `commit` / `rollback` end it and, while auto-commit stays off, open the next one
/// - `set_auto_commit(true)` commits whatever is open
/// - `close` rolls back an open transaction before the connection goes back to the pool
///
/// Transaction state is read from SQLite itself rather than tracked here, since
/// statements such as `INSERT OR ROLLBACK` or a trigger's `RAISE(ROLLBACK)` end
/// a transaction without going through this wrapper.
///
/// Only a successful [`close`](PooledConnection::close) hands the connection
/// back to the pool. Dropping it any other way closes the underlying SQLite
/// connection, so an open transaction can never leak to the next borrower.
///
/// Dereferences to [`sqlx::sqlite::SqliteConnection`] for running queries:
///
/// ```no_run
/// # async fn example(mut conn: sqlx_pool_registry::PooledSqliteConnection) -> Result<(), sqlx::Error> {
/// sqlx::query("INSERT INTO users (name) VALUES (?)")
///    .bind("Alice")
///    .execute(&mut *conn)
///    .await?;
/// # Ok(())
/// # }
/// ```
#[must_use = "if unused, the connection is immediately closed"]
pub struct PooledSqliteConnection {
   conn: PoolConnection<Sqlite>,
   id: Uuid,
   auto_commit: bool,
   reusable: bool,
}

impl PooledSqliteConnection {
   pub(crate) fn new(conn: PoolConnection<Sqlite>) -> Self {
      let id = Uuid::new_v4();
      trace!(connection_id = %id, "Checked out SQLite connection");
      Self {
         conn,
         id,
         auto_commit: true,
         reusable: false,
      }
   }

   /// Identifier used to correlate log records for this connection
   pub fn id(&self) -> Uuid {
      self.id
   }

   pub fn auto_commit(&self) -> bool {
      self.auto_commit
   }

   /// Whether SQLite currently has a transaction open on this connection
   pub async fn in_transaction(&mut self) -> Result<bool> {
      let mut handle = self.conn.lock_handle().await?;
      let db = handle.as_raw_handle().as_ptr();

      // SAFETY: the pointer is valid while the handle lock is held, and
      // sqlite3_get_autocommit only reads connection state.
      let autocommit = unsafe { libsqlite3_sys::sqlite3_get_autocommit(db) };
      Ok(autocommit == 0)
   }

   async fn run(&mut self, statement: &str) -> Result<()> {
      sqlx::query(statement).execute(&mut *self.conn).await?;
      Ok(())
   }

   /// Ends the current transaction with `statement` and opens the next one
   async fn finish(&mut self, statement: &str) -> Result<()> {
      if self.auto_commit {
         return Err(ProviderError::new(format!(
            "cannot {} while auto-commit is enabled",
            statement.to_lowercase()
         ))
         .with_code("AUTO_COMMIT_ENABLED"));
      }

      if self.in_transaction().await? {
         self.run(statement).await?;
      } else {
         debug!(
            connection_id = %self.id,
            "Transaction already ended by SQLite, skipping {}",
            statement
         );
      }

      self.run("BEGIN").await
   }
}

#[async_trait]
impl PooledConnection for PooledSqliteConnection {
   async fn set_auto_commit(&mut self, enabled: bool) -> Result<()> {
      if enabled == self.auto_commit {
         return Ok(());
      }

      if enabled {
         if self.in_transaction().await? {
            self.run("COMMIT").await?;
         }
      } else if !self.in_transaction().await? {
         self.run("BEGIN").await?;
      }

      self.auto_commit = enabled;
      debug!(connection_id = %self.id, auto_commit = enabled, "Auto-commit changed");
      Ok(())
   }

   async fn commit(&mut self) -> Result<()> {
      self.finish("COMMIT").await
   }

   async fn rollback(&mut self) -> Result<()> {
      self.finish("ROLLBACK").await
   }

   async fn close(mut self) -> Result<()> {
      if self.in_transaction().await? {
         self.run("ROLLBACK").await?;
      }
      trace!(connection_id = %self.id, "Returning SQLite connection to pool");
      self.reusable = true;
      Ok(())
   }

   async fn discard(mut self) -> Result<()> {
      trace!(connection_id = %self.id, "Discarding SQLite connection");
      self.conn.close_on_drop();
      Ok(())
   }
}

impl Drop for PooledSqliteConnection {
   fn drop(&mut self) {
      if !self.reusable {
         debug!(connection_id = %self.id, "Closing SQLite connection instead of pooling it");
         self.conn.close_on_drop();
      }
   }
}

impl Deref for PooledSqliteConnection {
   type Target = SqliteConnection;

   fn deref(&self) -> &Self::Target {
      &self.conn
   }
}

impl DerefMut for PooledSqliteConnection {
   fn deref_mut(&mut self) -> &mut Self::Target {
      &mut self.conn
   }
}
