//! PostgreSQL repository implementations.
//!
//! Concrete implementations of domain repository traits using SQLx.
//!
//! # Repositories
//!
//! - [`PgLinkRepository`] - Link lookups by domain scope and code
//! - [`PgDomainRepository`] - Custom domain lookups by hostname
//! - [`PgClickRepository`] - Batch insert of enriched clicks

pub mod pg_click_repository;
pub mod pg_domain_repository;
pub mod pg_link_repository;

pub use pg_click_repository::{CLICK_COLUMNS, PgClickRepository};
pub use pg_domain_repository::PgDomainRepository;
pub use pg_link_repository::PgLinkRepository;
