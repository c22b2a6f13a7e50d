//! Repository trait for short link lookups.

use super::RepositoryError;
use crate::domain::entities::Link;
use async_trait::async_trait;

/// Read-only access to the link table.
///
/// Link CRUD is owned by an external collaborator; the resolver only reads.
///
/// # Implementations
///
/// - [`crate::infrastructure::persistence::PgLinkRepository`] - PostgreSQL implementation
/// - Test mocks available with `cfg(test)`
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait LinkRepository: Send + Sync {
    /// Finds a link by short code within a domain scope.
    ///
    /// `domain_id = None` searches the default scope only; a code registered
    /// under a custom domain is not visible there.
    ///
    /// # Returns
    ///
    /// - `Ok(Some(Link))` if found
    /// - `Ok(None)` if not found
    ///
    /// # Errors
    ///
    /// Returns [`RepositoryError::Database`] on database errors.
    async fn find_by_scope_and_code(
        &self,
        domain_id: Option<i64>,
        code: &str,
    ) -> Result<Option<Link>, RepositoryError>;

    /// Checks that the database answers a trivial query.
    async fn ping(&self) -> Result<(), RepositoryError>;
}
