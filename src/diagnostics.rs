//! Log-only reporting for commit and rollback failures

use std::fmt;

use sqlx_pool_registry::ProviderError;
use tracing::error;
use uuid::Uuid;

/// Transaction boundary whose failure is being reported
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransactionOperation {
   Commit,
   Rollback,
}

impl TransactionOperation {
   pub fn as_str(&self) -> &'static str {
      match self {
         TransactionOperation::Commit => "commit",
         TransactionOperation::Rollback => "rollback",
      }
   }
}

impl fmt::Display for TransactionOperation {
   fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
      f.write_str(self.as_str())
   }
}

/// Emit one error record per entry of `err`, primary failure first.
pub(crate) fn report_failure(
   operation: TransactionOperation,
   pool: &str,
   connection_id: Uuid,
   err: &ProviderError,
) {
   let total = err.len();
   for (position, diagnostic) in err.chain().enumerate() {
      error!(
         operation = operation.as_str(),
         pool = %pool,
         connection_id = %connection_id,
         position,
         total,
         code = diagnostic.code().unwrap_or("-"),
         state = diagnostic.state().unwrap_or("-"),
         "{} failed: {}",
         operation,
         diagnostic.message()
      );
   }
}
