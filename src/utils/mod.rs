//! Request helpers shared by HTTP handlers.
//!
//! - [`extract_domain`] - Raw `Host` extraction and port stripping
//! - [`client_ip`] - Client address resolution (proxy-aware)
//! - [`ip_hash`] - Salted IP hashing for stored clicks

pub mod client_ip;
pub mod extract_domain;
pub mod ip_hash;
