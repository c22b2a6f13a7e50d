//! Outcome errors of the resolution and enqueue paths.

use thiserror::Error;

/// Reasons a short code cannot be redirected.
///
/// `NotFound`, `Expired` and `Inactive` are permanent for the current state of
/// the link; `Transient` means durable storage could not answer and the caller
/// may retry.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ResolveError {
    #[error("link not found")]
    NotFound,
    #[error("link has expired")]
    Expired,
    #[error("link is not active")]
    Inactive,
    #[error("link storage unavailable: {0}")]
    Transient(String),
}

/// A click event that could not be appended to the event buffer.
///
/// Never surfaced to end users; logged and counted only.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EnqueueError {
    #[error("click event for link {link_id} dropped: {reason}")]
    Dropped { link_id: i64, reason: String },
}
