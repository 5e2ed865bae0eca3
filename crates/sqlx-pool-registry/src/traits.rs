//! Abstractions over an externally managed connection pool
//!
//! A [`PoolRegistry`] resolves a logical pool name to a [`ConnectionPool`],
//! which hands out [`PooledConnection`]s. Code that only needs to check
//! connections in and out depends on these traits, so test doubles can stand
//! in for a real registry.

use std::sync::Arc;

use async_trait::async_trait;

use crate::Result;

/// Resolves logical pool names to pool handles.
#[async_trait]
pub trait PoolRegistry: Send + Sync + 'static {
   /// Pool type handed back by this registry.
   type Pool: ConnectionPool;

   /// Look up the pool registered under `name`.
   async fn resolve(&self, name: &str) -> Result<Arc<Self::Pool>>;
}

/// A pool of database connections.
#[async_trait]
pub trait ConnectionPool: Send + Sync + 'static {
   /// Connection type checked out of this pool.
   type Connection: PooledConnection;

   /// Check out one connection.
   ///
   /// Fails when the pool is exhausted, the database is unreachable or the
   /// credentials are rejected.
   async fn get_connection(&self) -> Result<Self::Connection>;
}

/// A connection checked out of a [`ConnectionPool`].
///
/// Connections start in auto-commit mode. After `set_auto_commit(false)` the
/// owner marks transaction boundaries with `commit` and `rollback`.
#[async_trait]
pub trait PooledConnection: Send + 'static {
   async fn set_auto_commit(&mut self, enabled: bool) -> Result<()>;

   async fn commit(&mut self) -> Result<()>;

   async fn rollback(&mut self) -> Result<()>;

   /// Return the connection to its pool.
   async fn close(self) -> Result<()>;

   /// Close the physical connection instead of returning it to the pool.
   ///
   /// Used for connections left in an unknown state, which must not be handed
   /// to the next borrower.
   async fn discard(self) -> Result<()>;
}

/// An in-flight statement or cursor that must be closed before its
/// connection.
#[async_trait]
pub trait Cursor: Send {
   async fn close(self) -> Result<()>;
}

/// Cursor type for call sites that never hold a cursor.
///
/// The type has no values, so `None::<NoCursor>` is the only way to use it.
#[derive(Debug)]
pub enum NoCursor {}

#[async_trait]
impl Cursor for NoCursor {
   async fn close(self) -> Result<()> {
      match self {}
   }
}
