//! Repository trait for custom domain lookups.

use super::RepositoryError;
use crate::domain::entities::Domain;
use async_trait::async_trait;

/// Read-only access to registered custom domains.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait DomainRepository: Send + Sync {
    /// Finds a domain by its hostname (port already stripped).
    ///
    /// # Errors
    ///
    /// Returns [`RepositoryError::Database`] on database errors.
    async fn find_by_name(&self, domain: &str) -> Result<Option<Domain>, RepositoryError>;
}
