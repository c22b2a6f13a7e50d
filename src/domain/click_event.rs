//! Click event model for asynchronous click tracking.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A click captured on a successful redirect, awaiting durable persistence.
///
/// Serialized as JSON into the event buffer by
/// [`crate::application::services::ClickService::record`] and consumed by
/// [`crate::domain::click_worker::ClickWorker`].
///
/// # Privacy
///
/// `ip_address` is kept only so the flush worker can derive geography; it is
/// never written to the `clicks` table. `ip_hash` is what survives.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClickEvent {
    pub link_id: i64,
    pub clicked_at: DateTime<Utc>,
    pub ip_hash: String,
    #[serde(default)]
    pub ip_address: String,
    #[serde(default)]
    pub user_agent: String,
    #[serde(default)]
    pub referrer: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub utm_source: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub utm_medium: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub utm_campaign: Option<String>,
}

impl ClickEvent {
    /// Creates a click event stamped with the current time.
    ///
    /// # Examples
    ///
    /// ```ignore
    /// let event = ClickEvent::new(42, hash_ip(&salt, "203.0.113.9"), "203.0.113.9", "Mozilla/5.0", "")
    ///     .with_utm(Some("newsletter".into()), None, None);
    /// ```
    pub fn new(
        link_id: i64,
        ip_hash: String,
        ip_address: impl Into<String>,
        user_agent: impl Into<String>,
        referrer: impl Into<String>,
    ) -> Self {
        Self {
            link_id,
            clicked_at: Utc::now(),
            ip_hash,
            ip_address: ip_address.into(),
            user_agent: user_agent.into(),
            referrer: referrer.into(),
            utm_source: None,
            utm_medium: None,
            utm_campaign: None,
        }
    }

    /// Attaches UTM attribution. Empty strings are stored as absent.
    pub fn with_utm(
        mut self,
        source: Option<String>,
        medium: Option<String>,
        campaign: Option<String>,
    ) -> Self {
        self.utm_source = source.filter(|s| !s.is_empty());
        self.utm_medium = medium.filter(|s| !s.is_empty());
        self.utm_campaign = campaign.filter(|s| !s.is_empty());
        self
    }

    /// Serializes the event into its buffer payload.
    pub fn to_payload(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }

    /// Parses a buffer payload.
    pub fn from_payload(raw: &str) -> serde_json::Result<Self> {
        serde_json::from_str(raw)
    }
}
