use sqlx_pool_registry::ProviderError;

/// Result type alias for provider operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors surfaced by [`ConnectionSourceProvider`](crate::ConnectionSourceProvider).
///
/// Commit and rollback failures are never returned; they are written to the
/// log instead.
#[derive(Debug, thiserror::Error)]
pub enum Error {
   /// The registry could not resolve the configured pool name.
   ///
   /// This is a configuration problem for the whole process and is not
   /// retried.
   #[error("failed to resolve connection pool '{name}': {source}")]
   ConfigurationLookup {
      name: String,
      #[source]
      source: ProviderError,
   },

   /// The pool was resolved but did not hand back a usable connection.
   #[error("failed to acquire a connection from pool '{name}': {source}")]
   ConnectionAcquisition {
      name: String,
      #[source]
      source: ProviderError,
   },

   /// Closing a cursor or a connection failed.
   #[error("failed to release database resources: {source}")]
   ConnectionRelease {
      #[source]
      source: ProviderError,
   },
}

impl Error {
   /// Extract a structured error code from the error type.
   pub fn error_code(&self) -> &'static str {
      match self {
         Error::ConfigurationLookup { .. } => "CONFIGURATION_LOOKUP_ERROR",
         Error::ConnectionAcquisition { .. } => "CONNECTION_ACQUISITION_ERROR",
         Error::ConnectionRelease { .. } => "CONNECTION_RELEASE_ERROR",
      }
   }

   /// The provider error this error wraps.
   pub fn provider_error(&self) -> &ProviderError {
      match self {
         Error::ConfigurationLookup { source, .. }
         | Error::ConnectionAcquisition { source, .. }
         | Error::ConnectionRelease { source } => source,
      }
   }
}
