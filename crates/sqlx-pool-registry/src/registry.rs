//! Registry of named SQLite pools

use std::collections::HashMap;
use std::collections::hash_map::Entry;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;
use tracing::debug;

use crate::Result;
use crate::config::SqlitePoolConfig;
use crate::database::SqliteDataSource;
use crate::error::ProviderError;
use crate::traits::PoolRegistry;

/// Maps logical pool names to SQLite pool configurations.
///
/// Pools are opened on first resolution and cached, so every resolution of a
/// name returns the same [`SqliteDataSource`].
///
/// ```no_run
/// use sqlx_pool_registry::{PoolRegistry, SqlitePoolConfig, SqlitePoolRegistry};
///
/// # async fn example() -> sqlx_pool_registry::Result<()> {
/// let registry = SqlitePoolRegistry::new();
/// registry.bind("db/main", SqlitePoolConfig::new("app.db")).await?;
///
/// let pool = registry.resolve("db/main").await?;
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Default)]
pub struct SqlitePoolRegistry {
   bindings: RwLock<HashMap<String, SqlitePoolConfig>>,
   resolved: RwLock<HashMap<String, Arc<SqliteDataSource>>>,
}

impl SqlitePoolRegistry {
   pub fn new() -> Self {
      Self::default()
   }

   /// Register `config` under `name`.
   ///
   /// Replaces an earlier binding as long as the name has not been resolved
   /// yet; once a pool is open for the name, rebinding fails.
   pub async fn bind(&self, name: impl Into<String>, config: SqlitePoolConfig) -> Result<()> {
      let name = name.into();

      // Lock order: resolved, then bindings (same as resolve)
      let resolved = self.resolved.read().await;
      if resolved.contains_key(&name) {
         return Err(
            ProviderError::new(format!("pool '{}' is already in use and cannot be rebound", name))
               .with_code("NAME_ALREADY_RESOLVED"),
         );
      }

      debug!(pool = %name, path = %config.path.display(), "Binding pool");
      self.bindings.write().await.insert(name, config);
      Ok(())
   }

   /// Whether a configuration is bound under `name`
   pub async fn is_bound(&self, name: &str) -> bool {
      self.bindings.read().await.contains_key(name)
   }

   /// Close every pool opened through this registry
   pub async fn close_all(&self) {
      let pools: Vec<Arc<SqliteDataSource>> = {
         let mut resolved = self.resolved.write().await;
         resolved.drain().map(|(_, pool)| pool).collect()
      };
      debug!("Closing {} resolved pool(s)", pools.len());

      for pool in pools {
         pool.close().await;
      }
   }
}

#[async_trait]
impl PoolRegistry for SqlitePoolRegistry {
   type Pool = SqliteDataSource;

   async fn resolve(&self, name: &str) -> Result<Arc<SqliteDataSource>> {
      if let Some(pool) = self.resolved.read().await.get(name) {
         return Ok(Arc::clone(pool));
      }

      // Re-check under the write lock so concurrent resolvers open one pool,
      // and read the binding under it so a racing bind cannot slip in between
      let mut resolved = self.resolved.write().await;
      match resolved.entry(name.to_string()) {
         Entry::Occupied(entry) => Ok(Arc::clone(entry.get())),
         Entry::Vacant(entry) => {
            let config = self.bindings.read().await.get(name).cloned().ok_or_else(|| {
               ProviderError::new(format!("no pool is bound under the name '{}'", name))
                  .with_code("NAME_NOT_BOUND")
            })?;

            let pool = Arc::new(SqliteDataSource::connect(name, &config).await?);
            entry.insert(Arc::clone(&pool));
            Ok(pool)
         }
      }
   }
}
