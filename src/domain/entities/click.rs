//! Click record persisted by the flush worker.

use chrono::{DateTime, Utc};

/// An enriched click ready for durable storage.
///
/// Built from a [`crate::domain::click_event::ClickEvent`] at flush time. The
/// raw client address is deliberately absent: only its salted hash and the
/// derived geography survive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewClick {
    pub link_id: i64,
    pub clicked_at: DateTime<Utc>,
    pub ip_hash: String,
    pub user_agent: String,
    pub referrer: String,
    pub country: String,
    pub city: String,
    pub device_type: String,
    pub browser: String,
    pub utm_source: Option<String>,
    pub utm_medium: Option<String>,
    pub utm_campaign: Option<String>,
}
