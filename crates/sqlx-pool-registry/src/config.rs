//! Configuration for SQLite-backed pool registrations

use std::path::PathBuf;
use std::time::Duration;

use serde::Deserialize;

/// Configuration for one named SQLite pool registration
///
/// # Examples
///
/// ```
/// use sqlx_pool_registry::SqlitePoolConfig;
/// use std::time::Duration;
///
/// // Use defaults for everything but the file
/// let config = SqlitePoolConfig::new("app.db");
///
/// // Override specific fields
/// let config = SqlitePoolConfig {
///     max_connections: 10,
///     acquire_timeout: Duration::from_secs(5),
///     ..SqlitePoolConfig::new("app.db")
/// };
/// ```
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SqlitePoolConfig {
   /// Path to the SQLite database file
   ///
   /// Default: `database.db` in the working directory
   pub path: PathBuf,

   /// Maximum number of connections the pool will hand out at once
   ///
   /// Once reached, `get_connection` waits up to `acquire_timeout` and then
   /// fails.
   ///
   /// Default: 5
   pub max_connections: u32,

   /// Number of connections the pool keeps open while idle
   ///
   /// Default: 0
   pub min_connections: u32,

   /// Idle timeout for pooled connections
   ///
   /// Connections that remain idle for this duration will be closed automatically.
   ///
   /// Default: 30 seconds
   #[serde(with = "duration_secs")]
   pub idle_timeout: Duration,

   /// How long `get_connection` waits for a free connection
   ///
   /// Default: 30 seconds
   #[serde(with = "duration_secs")]
   pub acquire_timeout: Duration,

   /// Create the database file if it does not exist
   ///
   /// Default: true
   pub create_if_missing: bool,
}

impl SqlitePoolConfig {
   /// Default configuration pointing at the given database file.
   pub fn new(path: impl Into<PathBuf>) -> Self {
      Self {
         path: path.into(),
         ..Default::default()
      }
   }
}

impl Default for SqlitePoolConfig {
   fn default() -> Self {
      Self {
         path: PathBuf::from("database.db"),
         max_connections: 5,
         min_connections: 0,
         idle_timeout: Duration::from_secs(30),
         acquire_timeout: Duration::from_secs(30),
         create_if_missing: true,
      }
   }
}

/// Durations are written as whole seconds in configuration files.
mod duration_secs {
   use std::time::Duration;

   use serde::{Deserialize, Deserializer};

   pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
   where
      D: Deserializer<'de>,
   {
      u64::deserialize(deserializer).map(Duration::from_secs)
   }
}
