//! Lazily resolved connection source and per-call connection lifecycle

use std::sync::Arc;

use futures::future::BoxFuture;
use sqlx_pool_registry::{
   ConnectionPool, Cursor, NoCursor, PoolRegistry, PooledConnection, ProviderError,
};
use tokio::sync::OnceCell;
use tracing::{debug, info, warn};

use crate::config::ProviderConfig;
use crate::connection::{ActiveConnection, ConnectionState};
use crate::diagnostics::{TransactionOperation, report_failure};
use crate::{Error, Result};

/// Connection type handed out by the pools of registry `R`.
pub type ConnectionOf<R> = <<R as PoolRegistry>::Pool as ConnectionPool>::Connection;

/// Shared source of database connections for data-access objects.
///
/// The provider resolves the configured pool name through its registry at
/// most once. Concurrent first callers wait on the same lookup; once the pool
/// handle is set it is never replaced and reads no longer lock. A failed
/// lookup leaves the handle unset, so the next call looks it up again.
///
/// Construct one provider at startup and share it (for example in an `Arc`)
/// with everything that needs connections.
///
/// ```no_run
/// use dao_connection_source::{ConnectionSourceProvider, ProviderConfig};
/// use sqlx_pool_registry::{NoCursor, SqlitePoolConfig, SqlitePoolRegistry};
///
/// # async fn example() -> dao_connection_source::Result<()> {
/// let registry = SqlitePoolRegistry::new();
/// # registry.bind("db/main", SqlitePoolConfig::new("app.db")).await.unwrap();
/// let provider = ConnectionSourceProvider::new(registry, ProviderConfig::default());
/// provider.initialize().await?;
///
/// let mut conn = provider.acquire().await?;
/// // ... run statements on `&mut **conn` ...
/// provider.commit(Some(&mut conn)).await;
/// provider.release(None::<NoCursor>, Some(conn)).await?;
/// # Ok(())
/// # }
/// ```
pub struct ConnectionSourceProvider<R: PoolRegistry> {
   registry: R,
   config: ProviderConfig,
   pool: OnceCell<Arc<R::Pool>>,
}

impl<R: PoolRegistry> ConnectionSourceProvider<R> {
   pub fn new(registry: R, config: ProviderConfig) -> Self {
      Self {
         registry,
         config,
         pool: OnceCell::new(),
      }
   }

   pub fn registry(&self) -> &R {
      &self.registry
   }

   pub fn pool_name(&self) -> &str {
      &self.config.pool_name
   }

   /// Whether the pool handle has been resolved
   pub fn is_initialized(&self) -> bool {
      self.pool.initialized()
   }

   /// The resolved pool handle, if resolution has happened
   pub fn pool(&self) -> Option<&Arc<R::Pool>> {
      self.pool.get()
   }

   async fn pool_handle(&self) -> Result<&Arc<R::Pool>> {
      self
         .pool
         .get_or_try_init(|| async {
            let name = self.pool_name();
            debug!(pool = %name, "Resolving connection pool");

            let pool = self
               .registry
               .resolve(name)
               .await
               .map_err(|source| Error::ConfigurationLookup {
                  name: name.to_string(),
                  source,
               })?;

            info!(pool = %name, "Connection pool resolved");
            Ok::<_, Error>(pool)
         })
         .await
   }

   /// Resolve the pool handle if that has not happened yet.
   ///
   /// Idempotent: the registry is consulted at most once per successful
   /// resolution, however many callers race here.
   pub async fn initialize(&self) -> Result<()> {
      self.pool_handle().await.map(|_| ())
   }

   /// Check out one connection with auto-commit disabled.
   ///
   /// Resolves the pool first when needed. The caller owns the returned
   /// connection and must hand it to [`release`](Self::release) on every
   /// exit path.
   pub async fn acquire(&self) -> Result<ActiveConnection<ConnectionOf<R>>> {
      let pool = self.pool_handle().await?;

      let mut conn = pool
         .get_connection()
         .await
         .map_err(|source| self.acquisition_error(source))?;

      if let Err(source) = conn.set_auto_commit(false).await {
         // State unknown after a failed switch; keep it out of the pool
         if let Err(discard_err) = conn.discard().await {
            warn!(pool = %self.pool_name(), error = %discard_err, "Discarding rejected connection failed");
         }
         return Err(self.acquisition_error(source));
      }

      let active = ActiveConnection::new(conn);
      debug!(pool = %self.pool_name(), connection_id = %active.id(), "Connection acquired");
      Ok(active)
   }

   fn acquisition_error(&self, source: ProviderError) -> Error {
      Error::ConnectionAcquisition {
         name: self.pool_name().to_string(),
         source,
      }
   }

   /// Close `cursor` and then return `connection` to its pool.
   ///
   /// Either argument may be absent. The connection close is attempted even
   /// when the cursor close fails; the first failure is returned.
   pub async fn release<K: Cursor>(
      &self,
      cursor: Option<K>,
      connection: Option<ActiveConnection<ConnectionOf<R>>>,
   ) -> Result<()> {
      let cursor_result = match cursor {
         Some(cursor) => cursor.close().await,
         None => Ok(()),
      };

      let connection_result = match connection {
         Some(active) => {
            let id = active.id();
            let result = active.into_inner().close().await;
            debug!(pool = %self.pool_name(), connection_id = %id, ok = result.is_ok(), "Connection released");
            result
         }
         None => Ok(()),
      };

      match (cursor_result, connection_result) {
         (Ok(()), Ok(())) => Ok(()),
         (Err(source), Ok(())) | (Ok(()), Err(source)) => Err(Error::ConnectionRelease { source }),
         (Err(source), Err(connection_err)) => {
            warn!(
               pool = %self.pool_name(),
               error = %connection_err,
               "Connection close also failed after cursor close failure"
            );
            Err(Error::ConnectionRelease { source })
         }
      }
   }

   /// [`release`](Self::release) without a cursor
   pub async fn release_connection(
      &self,
      connection: Option<ActiveConnection<ConnectionOf<R>>>,
   ) -> Result<()> {
      self.release(None::<NoCursor>, connection).await
   }

   /// Commit the current transaction of `connection`, if there is one.
   ///
   /// Never fails: a commit error is written to the log, one record per
   /// chained cause, and the call returns normally.
   pub async fn commit(&self, connection: Option<&mut ActiveConnection<ConnectionOf<R>>>) {
      self
         .end_transaction(TransactionOperation::Commit, connection)
         .await;
   }

   /// Roll back the current transaction of `connection`, if there is one.
   ///
   /// Never fails; errors are logged like [`commit`](Self::commit) errors.
   pub async fn rollback(&self, connection: Option<&mut ActiveConnection<ConnectionOf<R>>>) {
      self
         .end_transaction(TransactionOperation::Rollback, connection)
         .await;
   }

   async fn end_transaction(
      &self,
      operation: TransactionOperation,
      connection: Option<&mut ActiveConnection<ConnectionOf<R>>>,
   ) {
      let Some(active) = connection else {
         return;
      };

      let (result, next_state) = match operation {
         TransactionOperation::Commit => (
            active.connection_mut().commit().await,
            ConnectionState::Committed,
         ),
         TransactionOperation::Rollback => (
            active.connection_mut().rollback().await,
            ConnectionState::RolledBack,
         ),
      };

      match result {
         Ok(()) => {
            active.set_state(next_state);
            debug!(pool = %self.pool_name(), connection_id = %active.id(), "Transaction {}", operation);
         }
         Err(err) => report_failure(operation, self.pool_name(), active.id(), &err),
      }
   }

   /// Run `work` as one unit of work on a freshly acquired connection.
   ///
   /// Commits when `work` succeeds, rolls back when it fails, and releases the
   /// connection on both paths.
   ///
   /// ```no_run
   /// # use dao_connection_source::ConnectionSourceProvider;
   /// # use sqlx_pool_registry::SqlitePoolRegistry;
   /// # async fn example(provider: ConnectionSourceProvider<SqlitePoolRegistry>) {
   /// let inserted = provider
   ///    .run_in_transaction(|conn| {
   ///       Box::pin(async move {
   ///          sqlx::query("INSERT INTO users (name) VALUES ('Alice')")
   ///             .execute(&mut **conn)
   ///             .await
   ///             .map(|done| done.rows_affected())
   ///       })
   ///    })
   ///    .await;
   /// # }
   /// ```
   pub async fn run_in_transaction<T, E, F>(
      &self,
      work: F,
   ) -> std::result::Result<T, UnitOfWorkError<E>>
   where
      F: for<'c> FnOnce(&'c mut ConnectionOf<R>) -> BoxFuture<'c, std::result::Result<T, E>>,
   {
      let mut active = self.acquire().await.map_err(UnitOfWorkError::Provider)?;

      let outcome = work(active.connection_mut()).await;

      if outcome.is_ok() {
         self.commit(Some(&mut active)).await;
      } else {
         self.rollback(Some(&mut active)).await;
      }

      let released = self.release_connection(Some(active)).await;

      match (outcome, released) {
         (Ok(value), Ok(())) => Ok(value),
         (Ok(_), Err(release)) => Err(UnitOfWorkError::Provider(release)),
         (Err(work), Ok(())) => Err(UnitOfWorkError::Work(work)),
         (Err(work), Err(release)) => Err(UnitOfWorkError::ReleaseAfterFailure { work, release }),
      }
   }
}

/// Failure of [`ConnectionSourceProvider::run_in_transaction`].
#[derive(Debug, thiserror::Error)]
pub enum UnitOfWorkError<E> {
   /// Acquiring or releasing the connection failed.
   #[error(transparent)]
   Provider(Error),

   /// The unit of work itself failed; its transaction was rolled back.
   #[error("unit of work failed: {0}")]
   Work(E),

   /// The unit of work failed and the connection could not be released afterwards.
   #[error("unit of work failed: {work}; releasing the connection also failed: {release}")]
   ReleaseAfterFailure { work: E, release: Error },
}
