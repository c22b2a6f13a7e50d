//! Repository trait definitions for the domain layer.
//!
//! These traits abstract durable storage following the Repository pattern and
//! are implemented by `crate::infrastructure::persistence`.
//!
//! # Available Repositories
//!
//! - [`LinkRepository`] - Read-only link lookups for the resolver
//! - [`DomainRepository`] - Custom domain lookups by hostname
//! - [`ClickRepository`] - Append-only batch insert of enriched clicks
//!
//! Mock implementations are generated with `mockall` for unit tests.

pub mod click_repository;
pub mod domain_repository;
pub mod link_repository;

pub use click_repository::ClickRepository;
pub use domain_repository::DomainRepository;
pub use link_repository::LinkRepository;

#[cfg(test)]
pub use click_repository::MockClickRepository;
#[cfg(test)]
pub use domain_repository::MockDomainRepository;
#[cfg(test)]
pub use link_repository::MockLinkRepository;

use thiserror::Error;

/// Errors raised by durable storage.
#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}
