//! Click enrichment: geography from the client address, browser and device
//! from the User-Agent.
//!
//! [`Enricher`] is the handle the flush worker receives; it owns the GeoIP
//! database for the lifetime of the worker.

mod geoip;
mod user_agent;

pub use geoip::{GeoIp, GeoLocation};
pub use user_agent::{UNKNOWN_BROWSER, UNKNOWN_DEVICE, UserAgentInfo, parse_user_agent};

use std::sync::Arc;
use thiserror::Error;

use crate::domain::click_event::ClickEvent;
use crate::domain::entities::NewClick;

/// Errors raised while loading enrichment datasets.
#[derive(Debug, Error)]
pub enum EnrichmentError {
    #[error("failed to open GeoIP database at {path}: {reason}")]
    GeoIpOpen { path: String, reason: String },
}

/// Turns buffered click events into storable click records.
pub struct Enricher {
    geoip: Arc<GeoIp>,
}

impl Enricher {
    pub fn new(geoip: Arc<GeoIp>) -> Self {
        Self { geoip }
    }

    /// An enricher without geographic data.
    pub fn without_geoip() -> Self {
        Self::new(Arc::new(GeoIp::disabled()))
    }

    pub fn geoip(&self) -> &GeoIp {
        &self.geoip
    }

    /// Derives the durable click record. The raw client address is consumed
    /// here and not carried forward.
    pub fn enrich(&self, event: ClickEvent) -> NewClick {
        let location = self.geoip.lookup(&event.ip_address);
        let agent = parse_user_agent(&event.user_agent);

        NewClick {
            link_id: event.link_id,
            clicked_at: event.clicked_at,
            ip_hash: event.ip_hash,
            user_agent: event.user_agent,
            referrer: event.referrer,
            country: location.country,
            city: location.city,
            device_type: agent.device_type,
            browser: agent.browser,
            utm_source: event.utm_source,
            utm_medium: event.utm_medium,
            utm_campaign: event.utm_campaign,
        }
    }
}
