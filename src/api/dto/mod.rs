//! Data Transfer Objects for HTTP requests and responses.

pub mod health;
pub mod utm;
