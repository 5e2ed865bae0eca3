//! Configuration for the connection source provider

use serde::Deserialize;

/// Name the provider resolves when no other name is configured.
pub const DEFAULT_POOL_NAME: &str = "db/main";

/// Configuration for [`ConnectionSourceProvider`](crate::ConnectionSourceProvider)
///
/// The pool name is fixed for the lifetime of the provider. It is usually
/// read from the host application's configuration file:
///
/// ```
/// use dao_connection_source::ProviderConfig;
///
/// let config = ProviderConfig::default();
/// assert_eq!(config.pool_name, "db/main");
///
/// let config = ProviderConfig::new("db/reporting");
/// assert_eq!(config.pool_name, "db/reporting");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ProviderConfig {
   /// Logical name of the pool registration to resolve
   ///
   /// Default: `db/main`
   pub pool_name: String,
}

impl ProviderConfig {
   pub fn new(pool_name: impl Into<String>) -> Self {
      Self {
         pool_name: pool_name.into(),
      }
   }
}

impl Default for ProviderConfig {
   fn default() -> Self {
      Self::new(DEFAULT_POOL_NAME)
   }
}
