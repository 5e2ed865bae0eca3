//! Error types for sqlx-pool-registry

use std::error::Error as StdError;
use std::fmt;

/// One entry in a provider error chain.
///
/// Mirrors what a database driver reports for a single failure: an optional
/// vendor code, a human-readable message and an optional state indicator
/// (SQLSTATE or similar).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
   code: Option<String>,
   message: String,
   state: Option<String>,
}

impl Diagnostic {
   /// Create a diagnostic carrying only a message.
   pub fn new(message: impl Into<String>) -> Self {
      Self {
         code: None,
         message: message.into(),
         state: None,
      }
   }

   pub fn code(&self) -> Option<&str> {
      self.code.as_deref()
   }

   pub fn message(&self) -> &str {
      &self.message
   }

   pub fn state(&self) -> Option<&str> {
      self.state.as_deref()
   }
}

impl fmt::Display for Diagnostic {
   fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
      if let Some(code) = &self.code {
         write!(f, "[{}] ", code)?;
      }
      f.write_str(&self.message)?;
      if let Some(state) = &self.state {
         write!(f, " (state {})", state)?;
      }
      Ok(())
   }
}

/// Error reported by a pool registry, a pool, a connection or a cursor.
///
/// The error is an ordered, non-empty list of [`Diagnostic`] entries. The
/// first entry is the failure itself; every following entry is a cause that
/// the provider chained onto it, in the order the provider reported them.
///
/// ```
/// use sqlx_pool_registry::ProviderError;
///
/// let err = ProviderError::new("commit failed")
///    .with_code("17008")
///    .caused_by(ProviderError::new("connection reset by peer"));
///
/// assert_eq!(err.len(), 2);
/// assert_eq!(err.primary().code(), Some("17008"));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{}", self.primary())]
pub struct ProviderError {
   entries: Vec<Diagnostic>,
}

impl ProviderError {
   /// Create a single-entry error with the given message.
   pub fn new(message: impl Into<String>) -> Self {
      Self {
         entries: vec![Diagnostic::new(message)],
      }
   }

   /// Set the vendor code of the primary entry.
   pub fn with_code(mut self, code: impl Into<String>) -> Self {
      self.entries[0].code = Some(code.into());
      self
   }

   /// Set the state indicator of the primary entry.
   pub fn with_state(mut self, state: impl Into<String>) -> Self {
      self.entries[0].state = Some(state.into());
      self
   }

   /// Append the whole chain of `cause` after the entries of `self`.
   pub fn caused_by(mut self, cause: ProviderError) -> Self {
      self.entries.extend(cause.entries);
      self
   }

   /// The failure itself (first entry of the chain).
   pub fn primary(&self) -> &Diagnostic {
      &self.entries[0]
   }

   /// All entries, primary first.
   pub fn chain(&self) -> impl ExactSizeIterator<Item = &Diagnostic> {
      self.entries.iter()
   }

   /// Number of entries in the chain. Always at least one.
   pub fn len(&self) -> usize {
      self.entries.len()
   }

   /// Whether the primary entry carries the given vendor code.
   pub fn has_code(&self, code: &str) -> bool {
      self.primary().code() == Some(code)
   }
}

impl From<sqlx::Error> for ProviderError {
   fn from(err: sqlx::Error) -> Self {
      // Database errors carry a driver code; everything else only a message.
      let (primary, mut source) = match err.as_database_error() {
         Some(db_err) => (
            Diagnostic {
               code: db_err.code().map(|code| code.into_owned()),
               message: db_err.message().to_string(),
               state: None,
            },
            db_err.source(),
         ),
         None => (Diagnostic::new(err.to_string()), err.source()),
      };

      let mut entries = vec![primary];
      while let Some(cause) = source {
         entries.push(Diagnostic::new(cause.to_string()));
         source = cause.source();
      }

      Self { entries }
   }
}

impl From<std::io::Error> for ProviderError {
   fn from(err: std::io::Error) -> Self {
      Self::new(err.to_string()).with_code("IO_ERROR")
   }
}

/// A type alias for Results with our error type
pub type Result<T> = std::result::Result<T, ProviderError>;
