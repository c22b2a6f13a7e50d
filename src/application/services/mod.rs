//! Business logic services for the application layer.

pub mod click_service;
pub mod resolve_service;

pub use click_service::ClickService;
pub use resolve_service::{ResolveOptions, ResolveService};
