//! Exclusive ownership of one checked-out connection

use std::ops::{Deref, DerefMut};

use sqlx_pool_registry::PooledConnection;
use tracing::warn;
use uuid::Uuid;

/// Where an [`ActiveConnection`] is in its lifecycle.
///
/// Release is terminal and consumes the connection, so it has no variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
   /// Checked out with auto-commit disabled; nothing committed or rolled back yet
   Acquired,
   /// The last successful transaction boundary was a commit
   Committed,
   /// The last successful transaction boundary was a rollback
   RolledBack,
}

/// A connection owned by one unit of work.
///
/// Returned by [`ConnectionSourceProvider::acquire`](crate::ConnectionSourceProvider::acquire)
/// with auto-commit disabled. Hand it back with
/// [`release`](crate::ConnectionSourceProvider::release) on every exit path;
/// dropping it instead is logged as a leak.
#[must_use = "an acquired connection must be released"]
pub struct ActiveConnection<C: PooledConnection> {
   conn: C,
   state: ConnectionState,
   guard: LeakGuard,
}

impl<C: PooledConnection> ActiveConnection<C> {
   pub(crate) fn new(conn: C) -> Self {
      Self {
         conn,
         state: ConnectionState::Acquired,
         guard: LeakGuard {
            id: Uuid::new_v4(),
            armed: true,
         },
      }
   }

   /// Identifier used to correlate log records for this unit of work
   pub fn id(&self) -> Uuid {
      self.guard.id
   }

   pub fn state(&self) -> ConnectionState {
      self.state
   }

   pub(crate) fn set_state(&mut self, state: ConnectionState) {
      self.state = state;
   }

   pub(crate) fn connection_mut(&mut self) -> &mut C {
      &mut self.conn
   }

   /// Give up ownership without the leak warning
   pub(crate) fn into_inner(self) -> C {
      let Self { conn, mut guard, .. } = self;
      guard.armed = false;
      conn
   }
}

impl<C: PooledConnection> Deref for ActiveConnection<C> {
   type Target = C;

   fn deref(&self) -> &Self::Target {
      &self.conn
   }
}

impl<C: PooledConnection> DerefMut for ActiveConnection<C> {
   fn deref_mut(&mut self) -> &mut Self::Target {
      &mut self.conn
   }
}

/// Warns when an [`ActiveConnection`] goes away without passing through
/// `into_inner`.
struct LeakGuard {
   id: Uuid,
   armed: bool,
}

impl Drop for LeakGuard {
   fn drop(&mut self) {
      if self.armed {
         warn!(connection_id = %self.id, "Active connection dropped without being released");
      }
   }
}
