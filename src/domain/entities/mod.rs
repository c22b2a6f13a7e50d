//! Core domain entities representing the business data model.
//!
//! # Entity Types
//!
//! - [`Link`] - A shortened URL mapping (system of record)
//! - [`Domain`] - A custom domain scoping short codes
//! - [`LinkSnapshot`] - The cached, denormalized resolution view of a link
//! - [`NewClick`] - An enriched click ready for durable storage

pub mod click;
pub mod domain;
pub mod link;
pub mod snapshot;

pub use click::NewClick;
pub use domain::Domain;
pub use link::Link;
pub use snapshot::{LinkSnapshot, Resolved};
