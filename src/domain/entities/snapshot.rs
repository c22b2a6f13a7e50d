//! Denormalized cache snapshot of a link's resolution fields.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::entities::Link;
use crate::domain::errors::ResolveError;

/// Point-in-time copy of the fields needed to answer a redirect.
///
/// Stored as JSON in the resolution cache. It is never the only copy and may
/// be stale for up to one TTL.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LinkSnapshot {
    pub url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expires_at: Option<DateTime<Utc>>,
    pub is_active: bool,
    pub link_id: i64,
}

/// A usable destination returned by the resolver.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolved {
    pub url: String,
    pub link_id: i64,
}

impl LinkSnapshot {
    pub fn from_link(link: &Link) -> Self {
        Self {
            url: link.long_url.clone(),
            expires_at: link.expires_at,
            is_active: link.is_active,
            link_id: link.id,
        }
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }

    /// Parses a cached payload. Corrupt payloads yield `None` and are treated
    /// as a cache miss by the caller.
    pub fn from_json(raw: &str) -> Option<Self> {
        serde_json::from_str(raw).ok()
    }

    /// Applies the redirect rules: inactive wins over expired, expired wins
    /// over success.
    pub fn validate(&self, now: DateTime<Utc>) -> Result<Resolved, ResolveError> {
        if !self.is_active {
            return Err(ResolveError::Inactive);
        }
        if self.expires_at.is_some_and(|e| e < now) {
            return Err(ResolveError::Expired);
        }
        Ok(Resolved {
            url: self.url.clone(),
            link_id: self.link_id,
        })
    }
}
