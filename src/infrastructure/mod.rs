//! Infrastructure layer for external integrations.
//!
//! # Modules
//!
//! - [`cache`] - Resolution cache (Redis, in-memory and no-op implementations)
//! - [`buffer`] - Click event buffer (Redis list and in-memory queue)
//! - [`enrichment`] - GeoIP and User-Agent lookups
//! - [`persistence`] - PostgreSQL repository implementations
//! - [`redis_connection`] - Shared Redis connection setup

pub mod buffer;
pub mod cache;
pub mod enrichment;
pub mod persistence;
pub mod redis_connection;
