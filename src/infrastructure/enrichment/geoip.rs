//! MaxMind GeoLite2 lookups.
//!
//! The database is opened once at startup, passed by handle into the flush
//! worker, and closed explicitly on shutdown.

use std::net::IpAddr;

use maxminddb::Reader;
use parking_lot::RwLock;
use tracing::{info, trace, warn};

use super::EnrichmentError;

/// Coarse location derived from a client address.
///
/// Both fields are empty when lookup is disabled or inconclusive.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GeoLocation {
    /// ISO 3166-1 alpha-2 country code (e.g. "US").
    pub country: String,
    /// English city name.
    pub city: String,
}

/// Handle to an optional GeoLite2-City database.
pub struct GeoIp {
    reader: RwLock<Option<Reader<Vec<u8>>>>,
}

impl GeoIp {
    /// A handle that answers every lookup with an empty location.
    pub fn disabled() -> Self {
        Self {
            reader: RwLock::new(None),
        }
    }

    /// Opens the `.mmdb` file at `path`.
    ///
    /// # Errors
    ///
    /// Returns [`EnrichmentError::GeoIpOpen`] if the file is missing or not a
    /// MaxMind database.
    pub fn open(path: &str) -> Result<Self, EnrichmentError> {
        let reader = Reader::open_readfile(path).map_err(|e| EnrichmentError::GeoIpOpen {
            path: path.to_string(),
            reason: e.to_string(),
        })?;
        info!("GeoIP: using MaxMind database at {}", path);
        Ok(Self {
            reader: RwLock::new(Some(reader)),
        })
    }

    /// Opens the database if a path is configured, otherwise returns a
    /// disabled handle.
    pub fn from_path(path: Option<&str>) -> Result<Self, EnrichmentError> {
        match path {
            Some(path) if !path.is_empty() => Self::open(path),
            _ => {
                info!("GeoIP: no database configured, geographic enrichment disabled");
                Ok(Self::disabled())
            }
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.reader.read().is_some()
    }

    /// Looks up a textual IP address.
    pub fn lookup(&self, ip: &str) -> GeoLocation {
        let guard = self.reader.read();
        let Some(reader) = guard.as_ref() else {
            return GeoLocation::default();
        };
        let Ok(ip_addr) = ip.parse::<IpAddr>() else {
            return GeoLocation::default();
        };

        let result = match reader.lookup(ip_addr) {
            Ok(result) => result,
            Err(e) => {
                warn!(ip = %ip, error = %e, "GeoIP: lookup failed");
                return GeoLocation::default();
            }
        };
        let city: maxminddb::geoip2::City = match result.decode() {
            Ok(Some(city)) => city,
            Ok(None) => return GeoLocation::default(),
            Err(e) => {
                warn!(ip = %ip, error = %e, "GeoIP: failed to decode record");
                return GeoLocation::default();
            }
        };

        let location = GeoLocation {
            country: city.country.iso_code.unwrap_or_default().to_string(),
            city: city.city.names.english.unwrap_or_default().to_string(),
        };
        trace!(
            "GeoIP lookup for {}: country={}, city={}",
            ip, location.country, location.city
        );
        location
    }

    /// Releases the database. Later lookups return empty locations.
    pub fn close(&self) {
        if self.reader.write().take().is_some() {
            info!("GeoIP: database closed");
        }
    }
}
