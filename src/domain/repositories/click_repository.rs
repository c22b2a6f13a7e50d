//! Repository trait for durable click storage.

use super::RepositoryError;
use crate::domain::entities::NewClick;
use async_trait::async_trait;

/// Append-only click storage used by the flush worker.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ClickRepository: Send + Sync {
    /// Inserts all clicks in a single statement.
    ///
    /// The write is all-or-nothing: on error no row of the batch is stored and
    /// the caller may retry the whole batch. Returns the number of rows written.
    ///
    /// # Errors
    ///
    /// Returns [`RepositoryError::Database`] on database errors.
    async fn batch_insert(&self, clicks: Vec<NewClick>) -> Result<u64, RepositoryError>;
}
