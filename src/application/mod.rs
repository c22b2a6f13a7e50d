//! Application layer services implementing business logic.
//!
//! Services coordinate repositories, the cache and the event buffer, and give
//! HTTP handlers and background tasks a narrow API.
//!
//! # Available Services
//!
//! - [`services::resolve_service::ResolveService`] - Cache-aside short code resolution and invalidation
//! - [`services::click_service::ClickService`] - Click enqueue and live counters

pub mod services;
