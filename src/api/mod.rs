//! HTTP layer: the public redirect endpoint and the health check.
//!
//! # Modules
//!
//! - [`dto`] - Request/response serialization types
//! - [`handlers`] - HTTP request handlers
//! - [`middleware`] - Request tracing

pub mod dto;
pub mod handlers;
pub mod middleware;
